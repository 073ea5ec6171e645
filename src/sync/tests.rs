use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;
use std::vec::Vec;

use super::*;
use crate::sched;

#[test]
fn test_spinlock_mutual_exclusion() {
    const THREADS: usize = 4;
    const ITERS: usize = 20_000;

    let counter = Arc::new(Spinlock::new(0usize));
    let inside = Arc::new(AtomicBool::new(false));

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let counter = counter.clone();
            let inside = inside.clone();
            thread::spawn(move || {
                for _ in 0..ITERS {
                    let mut guard = counter.lock();
                    // Ninguém mais pode estar na seção crítica.
                    assert!(!inside.swap(true, Ordering::SeqCst));
                    *guard += 1;
                    inside.store(false, Ordering::SeqCst);
                }
            })
        })
        .collect();

    for h in handles {
        h.join().unwrap();
    }
    assert_eq!(*counter.lock(), THREADS * ITERS);
}

#[test]
fn test_raw_spinlock_acquire_release() {
    static LOCK: RawSpinlock = RawSpinlock::new();
    static mut SHARED: usize = 0;

    let handles: Vec<_> = (0..4)
        .map(|_| {
            thread::spawn(|| {
                for _ in 0..10_000 {
                    spinlock_acquire(&LOCK);
                    // SAFETY: protegido por LOCK.
                    unsafe { SHARED += 1 };
                    spinlock_release(&LOCK);
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    spinlock_acquire(&LOCK);
    // SAFETY: protegido por LOCK.
    let total = unsafe { SHARED };
    spinlock_release(&LOCK);
    assert_eq!(total, 40_000);
    assert!(!LOCK.is_locked());
}

#[test]
fn test_try_lock_fails_while_held() {
    let lock = Spinlock::new(1);
    let guard = lock.lock();
    assert!(lock.is_locked());
    assert!(lock.try_lock().is_none());
    drop(guard);
    assert!(!lock.is_locked());
    assert_eq!(*lock.try_lock().unwrap(), 1);
}

#[test]
fn test_semaphore_counts_without_blocking() {
    let sem = Semaphore::new(2);
    sem.wait();
    assert!(sem.try_wait());
    assert_eq!(sem.count(), 0);
    assert!(!sem.try_wait());

    // Sem waiters, signal apenas incrementa.
    sem.signal();
    sem.signal();
    assert_eq!(sem.count(), 2);
    assert_eq!(sem.waiters(), 0);
}

fn wait_for_waiters(sem: &Semaphore, n: usize) {
    for _ in 0..5_000 {
        if sem.waiters() == n {
            return;
        }
        thread::sleep(Duration::from_millis(1));
    }
    panic!("waiters never reached {}", n);
}

#[test]
fn test_semaphore_wait_blocks_until_signal() {
    sched::host::install();

    let sem = Arc::new(Semaphore::new(0));
    let done = Arc::new(AtomicBool::new(false));

    let waiter = {
        let sem = sem.clone();
        let done = done.clone();
        thread::spawn(move || {
            sem.wait();
            done.store(true, Ordering::SeqCst);
        })
    };

    wait_for_waiters(&sem, 1);
    assert!(!done.load(Ordering::SeqCst));

    sem.signal();
    waiter.join().unwrap();
    assert!(done.load(Ordering::SeqCst));
    // A unidade foi entregue ao waiter, não ao contador.
    assert_eq!(sem.count(), 0);
    assert_eq!(sem.waiters(), 0);
}

#[test]
fn test_semaphore_wakes_in_fifo_order() {
    sched::host::install();

    let sem = Arc::new(Semaphore::new(0));
    let order = Arc::new(Mutex::new(Vec::new()));

    let mut handles = Vec::new();
    for id in 0..3 {
        let sem_c = sem.clone();
        let order_c = order.clone();
        handles.push(thread::spawn(move || {
            sem_c.wait();
            order_c.lock().unwrap().push(id);
        }));
        // Garante a ordem de chegada na fila.
        wait_for_waiters(&sem, id + 1);
    }

    for expected in 0..3 {
        sem.signal();
        while order.lock().unwrap().len() <= expected {
            thread::sleep(Duration::from_millis(1));
        }
    }
    for h in handles {
        h.join().unwrap();
    }
    assert_eq!(*order.lock().unwrap(), [0, 1, 2]);
}

#[test]
fn test_semaphore_as_mutex() {
    sched::host::install();

    let sem = Arc::new(Semaphore::new(1));
    let inside = Arc::new(AtomicUsize::new(0));

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let sem = sem.clone();
            let inside = inside.clone();
            thread::spawn(move || {
                for _ in 0..200 {
                    sem.wait();
                    assert_eq!(inside.fetch_add(1, Ordering::SeqCst), 0);
                    inside.fetch_sub(1, Ordering::SeqCst);
                    sem.signal();
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }
    assert_eq!(sem.count(), 1);
}

#[test]
#[should_panic]
fn test_semaphore_drop_with_waiters_panics() {
    let sem = Semaphore::new(0);
    sem.enqueue_waiter(42);
    drop(sem);
}
