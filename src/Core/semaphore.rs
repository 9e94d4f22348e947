use crossbeam_utils::CachePadded;
use std::sync::atomic::AtomicU32;
use std::sync::atomic::Ordering::{AcqRel, Acquire, Relaxed, SeqCst};

use super::futex::{futex_wait, futex_wake};

/// A counting semaphore whose permit count doubles as a futex word.
///
/// `acquire` sleeps in the kernel while no permit is available; it never
/// retries on a timer. `release` publishes a permit and wakes one sleeper,
/// making the wake call only when a thread is registered as waiting.
pub struct Semaphore {
    /// Number of permits currently available. Padded so the `empty_slots`
    /// and `full_slots` counters of one buffer do not share a cache line.
    permits: CachePadded<AtomicU32>,

    /// Threads inside `acquire` that found no permit and are about to sleep
    /// or sleeping.
    waiters: AtomicU32,
}

impl Semaphore {
    pub fn new(permits: u32) -> Self {
        Self {
            permits: CachePadded::new(AtomicU32::new(permits)),
            waiters: AtomicU32::new(0),
        }
    }

    /// Takes one permit, blocking until one is available.
    pub fn acquire(&self) {
        loop {
            let current = self.permits.load(Acquire);
            if current == 0 {
                // Register before the wait re-checks the word; pairs with
                // the SeqCst add and load in `release`.
                self.waiters.fetch_add(1, SeqCst);
                if self.permits.load(SeqCst) == 0 {
                    futex_wait(&self.permits, 0);
                }
                self.waiters.fetch_sub(1, SeqCst);
                continue;
            }
            if self
                .permits
                .compare_exchange_weak(current, current - 1, AcqRel, Relaxed)
                .is_ok()
            {
                return;
            }
            std::hint::spin_loop();
        }
    }

    /// Takes one permit if one is available right now.
    pub fn try_acquire(&self) -> bool {
        let mut current = self.permits.load(Acquire);
        while current > 0 {
            match self
                .permits
                .compare_exchange_weak(current, current - 1, AcqRel, Relaxed)
            {
                Ok(_) => return true,
                Err(actual) => current = actual,
            }
        }
        false
    }

    /// Returns one permit and wakes a blocked `acquire`, if any.
    pub fn release(&self) {
        self.permits.fetch_add(1, SeqCst);
        if self.waiters.load(SeqCst) > 0 {
            futex_wake(&self.permits, 1);
        }
    }

    /// Snapshot of the available permits. Only meaningful at quiescence.
    pub fn available(&self) -> u32 {
        self.permits.load(Acquire)
    }

    /// Snapshot of the threads currently blocked in `acquire`.
    pub fn waiting(&self) -> u32 {
        self.waiters.load(Acquire)
    }
}

impl std::fmt::Debug for Semaphore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Semaphore")
            .field("permits", &self.available())
            .field("waiters", &self.waiting())
            .finish()
    }
}
