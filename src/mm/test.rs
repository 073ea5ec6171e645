//! Testes do Heap
//!
//! Rodam no boot sobre uma arena estática própria, sem tocar o
//! `KERNEL_HEAP`.

use crate::klib::test_framework::{check, TestCase, TestResult};
use crate::mm::error::MmError;
use crate::mm::heap::Heap;
use crate::sync::Spinlock;

const ARENA_SIZE: usize = 32 * 1024;

#[repr(C, align(4096))]
struct Arena([u8; ARENA_SIZE]);

static ARENA: Spinlock<Arena> = Spinlock::new(Arena([0; ARENA_SIZE]));

/// Executa `f` com um heap recém inicializado sobre a arena.
fn with_heap(f: fn(&mut Heap) -> TestResult) -> TestResult {
    let mut arena = ARENA.lock();
    let base = arena.0.as_mut_ptr() as usize;
    let mut heap = Heap::empty();
    // SAFETY: a arena fica travada enquanto o heap existir.
    if unsafe { heap.init(base, ARENA_SIZE) }.is_err() {
        return TestResult::Failed;
    }
    f(&mut heap)
}

pub const HEAP_TESTS: &[TestCase] = &[
    TestCase::new("heap_alignment", test_alignment),
    TestCase::new("heap_coalesce", test_coalesce),
    TestCase::new("heap_realloc", test_realloc),
    TestCase::new("heap_double_free", test_double_free),
];

fn test_alignment() -> TestResult {
    with_heap(|heap| {
        for shift in 0..10 {
            let align = 1usize << shift;
            match heap.alloc_aligned(24, align) {
                Ok(p) if p.as_ptr() as usize % align == 0 => {}
                _ => return TestResult::Failed,
            }
        }
        check(heap.check().is_ok(), "heap consistente")
    })
}

fn test_coalesce() -> TestResult {
    with_heap(|heap| {
        let (Ok(a), Ok(b)) = (heap.alloc_aligned(128, 16), heap.alloc_aligned(256, 16)) else {
            return TestResult::Failed;
        };
        // SAFETY: ponteiros vindos deste heap.
        let freed = unsafe { heap.free(a.as_ptr()).and(heap.free(b.as_ptr())) };
        check(
            freed.is_ok() && heap.blocks().count() == 1,
            "blocos livres fundidos",
        )
    })
}

fn test_realloc() -> TestResult {
    with_heap(|heap| {
        let Ok(p) = heap.alloc_aligned(16, 16) else {
            return TestResult::Failed;
        };
        let p = p.as_ptr();
        // SAFETY: 16 bytes recém alocados.
        unsafe { core::ptr::write_bytes(p, 0x42, 16) };
        let _blocker = heap.alloc_aligned(16, 16);

        // SAFETY: `p` é um bloco vivo deste heap.
        let Ok(q) = (unsafe { heap.realloc(p, 512) }) else {
            return TestResult::Failed;
        };
        // SAFETY: `q` tem pelo menos 512 bytes.
        let kept = unsafe { core::slice::from_raw_parts(q, 16) }
            .iter()
            .all(|&b| b == 0x42);
        check(kept, "realloc preserva conteúdo")
    })
}

fn test_double_free() -> TestResult {
    with_heap(|heap| {
        let Ok(p) = heap.alloc_aligned(64, 16) else {
            return TestResult::Failed;
        };
        let _keep = heap.alloc_aligned(64, 16);
        // SAFETY: o segundo free é o caso testado; o heap o detecta.
        let second = unsafe {
            let _ = heap.free(p.as_ptr());
            heap.free(p.as_ptr())
        };
        check(second == Err(MmError::DoubleFree), "double free detectado")
    })
}
