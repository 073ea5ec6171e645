//! # Synchronization Tests
//!
//! Self-tests single-thread das primitivas. Os testes de concorrência real
//! rodam no host (`sync/tests.rs`).

use crate::klib::test_framework::{check, TestCase, TestResult};
use crate::sync::{spinlock_acquire, spinlock_release, RawSpinlock, Semaphore, Spinlock};

pub const SYNC_TESTS: &[TestCase] = &[
    TestCase::new("spinlock_guard", test_spinlock_guard),
    TestCase::new("raw_spinlock", test_raw_spinlock),
    TestCase::new("semaphore_count", test_semaphore_count),
    TestCase::new("atomic_alignment", test_atomic_alignment),
];

fn test_spinlock_guard() -> TestResult {
    let lock = Spinlock::new(0u32);
    {
        let mut guard = lock.lock();
        *guard += 1;
        if lock.try_lock().is_some() {
            return TestResult::Failed;
        }
    }
    check(!lock.is_locked() && *lock.lock() == 1, "guard libera o lock")
}

fn test_raw_spinlock() -> TestResult {
    let lock = RawSpinlock::new();
    spinlock_acquire(&lock);
    let held = lock.is_locked() && !lock.try_acquire();
    spinlock_release(&lock);
    check(held && !lock.is_locked(), "flag adquirida e liberada")
}

fn test_semaphore_count() -> TestResult {
    let sem = Semaphore::new(1);
    sem.wait();
    let drained = !sem.try_wait();
    sem.signal();
    check(drained && sem.count() == 1, "contagem do semáforo")
}

fn test_atomic_alignment() -> TestResult {
    use core::sync::atomic::AtomicU64;

    let align = core::mem::align_of::<AtomicU64>();
    crate::ktrace!("(Sync) AtomicU64 align=", align);
    check(align == 8, "AtomicU64 alinhado naturalmente")
}
