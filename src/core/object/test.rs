//! Testes do sistema de objetos

use core::sync::atomic::{AtomicUsize, Ordering};

use super::{assign, unref, KRef, RefSlot};
use crate::klib::test_framework::{check, TestCase, TestResult};

pub const OBJECT_TESTS: &[TestCase] = &[
    TestCase::new("kref_lifecycle", test_kref_lifecycle),
    TestCase::new("kref_assign", test_kref_assign),
    TestCase::new("ref_slot", test_ref_slot),
];

static FREED: AtomicUsize = AtomicUsize::new(0);

fn mark_freed(_: &mut u32) {
    FREED.fetch_add(1, Ordering::SeqCst);
}

fn test_kref_lifecycle() -> TestResult {
    let before = FREED.load(Ordering::SeqCst);
    let Ok(obj) = KRef::alloc(7u32, mark_freed) else {
        return TestResult::Failed;
    };
    let other = obj.clone();
    if KRef::ref_count(&obj) != 2 {
        return TestResult::Failed;
    }
    unref(other);
    unref(obj);
    check(
        FREED.load(Ordering::SeqCst) == before + 1,
        "deallocator roda uma vez",
    )
}

fn test_kref_assign() -> TestResult {
    let (Ok(a), Ok(b)) = (KRef::new(1u32), KRef::new(2u32)) else {
        return TestResult::Failed;
    };
    let mut slot = None;
    assign(&mut slot, &a);
    assign(&mut slot, &b);
    check(
        KRef::ref_count(&a) == 1 && KRef::ref_count(&b) == 2 && slot.map_or(0, |r| *r) == 2,
        "assign troca o ocupante",
    )
}

fn test_ref_slot() -> TestResult {
    let slot: RefSlot<u32> = RefSlot::empty();
    let Ok(obj) = KRef::new(9u32) else {
        return TestResult::Failed;
    };
    slot.assign(&obj);
    let held = slot.ref_count() == 2;
    slot.clear();
    check(held && KRef::ref_count(&obj) == 1, "slot segura uma referência")
}
