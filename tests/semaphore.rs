use dmxp_slotbuffer::Core::futex::{park_wait, park_wake};
use dmxp_slotbuffer::Core::Semaphore;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

fn wait_for_waiters(sem: &Semaphore, count: u32) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while sem.waiting() < count {
        assert!(Instant::now() < deadline, "waiters never registered");
        thread::sleep(Duration::from_millis(1));
    }
}

#[test]
fn acquire_and_release_count_permits() {
    let sem = Semaphore::new(2);
    sem.acquire();
    assert!(sem.try_acquire());
    assert!(!sem.try_acquire());
    assert_eq!(sem.available(), 0);

    sem.release();
    assert_eq!(sem.available(), 1);
    assert_eq!(sem.waiting(), 0);
}

#[test]
fn blocked_acquire_is_registered_and_woken() {
    let sem = Arc::new(Semaphore::new(0));
    let acquired = Arc::new(AtomicBool::new(false));

    let handle = {
        let sem = Arc::clone(&sem);
        let acquired = Arc::clone(&acquired);
        thread::spawn(move || {
            sem.acquire();
            acquired.store(true, Ordering::SeqCst);
        })
    };

    wait_for_waiters(&sem, 1);
    assert!(!acquired.load(Ordering::SeqCst));

    sem.release();
    handle.join().unwrap();
    assert!(acquired.load(Ordering::SeqCst));
    assert_eq!(sem.waiting(), 0);
    assert_eq!(sem.available(), 0);
}

#[test]
fn every_sleeper_gets_a_permit() {
    let sem = Arc::new(Semaphore::new(0));
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let sem = Arc::clone(&sem);
            thread::spawn(move || sem.acquire())
        })
        .collect();

    wait_for_waiters(&sem, 4);
    for _ in 0..4 {
        sem.release();
    }
    for handle in handles {
        handle.join().unwrap();
    }
    assert_eq!(sem.available(), 0);
    assert_eq!(sem.waiting(), 0);
}

#[test]
fn release_without_waiters_only_adds_permits() {
    let sem = Semaphore::new(0);
    for _ in 0..1000 {
        sem.release();
    }
    assert_eq!(sem.available(), 1000);
    assert_eq!(sem.waiting(), 0);
}

#[test]
fn ping_pong_under_contention() {
    let ping = Arc::new(Semaphore::new(0));
    let pong = Arc::new(Semaphore::new(0));
    const ROUNDS: usize = 5000;

    let handle = {
        let ping = Arc::clone(&ping);
        let pong = Arc::clone(&pong);
        thread::spawn(move || {
            for _ in 0..ROUNDS {
                ping.acquire();
                pong.release();
            }
        })
    };

    for _ in 0..ROUNDS {
        ping.release();
        pong.acquire();
    }
    handle.join().unwrap();
    assert_eq!(ping.available(), 0);
    assert_eq!(pong.available(), 0);
}

#[test]
fn park_wait_returns_when_value_differs() {
    let word = AtomicU32::new(3);
    let start = Instant::now();
    park_wait(&word, 0);
    assert!(start.elapsed() < Duration::from_secs(1));
}

#[test]
fn park_wait_sleeps_until_woken() {
    let word = Arc::new(AtomicU32::new(0));
    let woke = Arc::new(AtomicBool::new(false));

    let handle = {
        let word = Arc::clone(&word);
        let woke = Arc::clone(&woke);
        thread::spawn(move || {
            while word.load(Ordering::Acquire) == 0 {
                park_wait(&word, 0);
            }
            woke.store(true, Ordering::SeqCst);
        })
    };

    thread::sleep(Duration::from_millis(50));
    assert!(!woke.load(Ordering::SeqCst));

    word.store(1, Ordering::Release);
    park_wake(&word, 1);
    handle.join().unwrap();
    assert!(woke.load(Ordering::SeqCst));
}
