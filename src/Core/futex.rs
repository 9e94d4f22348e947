// Futex wait/wake on the semaphore permit word.
//
// Linux uses the futex syscall. Other targets park the thread in
// parking_lot's address-keyed queue, which gives the same contract.

use std::sync::atomic::{AtomicU32, Ordering};

/// Blocks the calling thread while `atomic` still holds `expected`.
///
/// Returns immediately if the value already differs. Spurious wake-ups are
/// possible, so callers re-check their condition in a loop.
#[cfg(target_os = "linux")]
pub fn futex_wait(atomic: &AtomicU32, expected: u32) {
    use std::ptr;

    // Check condition first to avoid syscall if possible
    if atomic.load(Ordering::Acquire) != expected {
        return;
    }

    // The kernel re-checks the word atomically before sleeping, so a release
    // that lands between the load above and the syscall is not lost.
    unsafe {
        libc::syscall(
            libc::SYS_futex,
            atomic as *const AtomicU32 as *const u32,
            libc::FUTEX_WAIT | libc::FUTEX_PRIVATE_FLAG,
            expected,
            ptr::null::<libc::timespec>(),
            ptr::null::<u32>(),
            0u32,
        );
    }
}

/// Wakes up to `waiters` threads blocked in [`futex_wait`] on `atomic`.
#[cfg(target_os = "linux")]
pub fn futex_wake(atomic: &AtomicU32, waiters: u32) {
    unsafe {
        libc::syscall(
            libc::SYS_futex,
            atomic as *const AtomicU32 as *const u32,
            libc::FUTEX_WAKE | libc::FUTEX_PRIVATE_FLAG,
            waiters.min(i32::MAX as u32) as i32,
            std::ptr::null::<libc::timespec>(),
            std::ptr::null::<u32>(),
            0u32,
        );
    }
}

#[cfg(not(target_os = "linux"))]
pub fn futex_wait(atomic: &AtomicU32, expected: u32) {
    park_wait(atomic, expected);
}

#[cfg(not(target_os = "linux"))]
pub fn futex_wake(atomic: &AtomicU32, waiters: u32) {
    park_wake(atomic, waiters);
}

/// Parks the calling thread while `atomic` still holds `expected`.
///
/// The value is checked under the queue lock for the word's address, and
/// [`park_wake`] takes the same lock, so a wake cannot slip in between the
/// check and the sleep.
pub fn park_wait(atomic: &AtomicU32, expected: u32) {
    let key = atomic as *const AtomicU32 as usize;
    // SAFETY: the closures neither panic nor call back into parking_lot_core.
    unsafe {
        parking_lot_core::park(
            key,
            || atomic.load(Ordering::Acquire) == expected,
            || {},
            |_, _| {},
            parking_lot_core::DEFAULT_PARK_TOKEN,
            None,
        );
    }
}

/// Unparks up to `waiters` threads blocked in [`park_wait`] on `atomic`.
pub fn park_wake(atomic: &AtomicU32, waiters: u32) {
    let key = atomic as *const AtomicU32 as usize;
    for _ in 0..waiters {
        // SAFETY: the callback neither panics nor calls back into parking_lot_core.
        let result = unsafe { parking_lot_core::unpark_one(key, |_| parking_lot_core::DEFAULT_UNPARK_TOKEN) };
        if result.unparked_threads == 0 {
            break;
        }
    }
}
