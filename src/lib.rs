//! Forge Core.
//!
//! Substrato de objetos do kernel Forge. Todo o resto do kernel (processos,
//! scheduler, drivers) é cliente destes módulos.
//!
//! ```text
//! ext2 ──► VFS (vnode/mount/namei) ──► KRef (refcount) ──► Heap ──► Sync
//! ```

#![cfg_attr(not(test), no_std)]

// Habilitar alocação dinâmica (necessário para Vec/Box/Arc)
extern crate alloc;

// --- Base ---
pub mod core; // Logging, objetos com refcount
pub mod klib; // Alinhamento, framework de self-test
pub mod sys; // Erros do kernel (KError, Errno)

// --- Substrato ---
pub mod mm; // Heap do kernel + família malloc
pub mod sched; // Fronteira com o scheduler (suspend/wake)
pub mod sync; // Spinlock, Semaphore

// --- Armazenamento ---
pub mod drivers; // Dispositivos de bloco
pub mod fs; // VFS + ext2

pub use crate::sys::error::{KError, KResult};

/// Executa todas as suítes de self-test do kernel.
///
/// Retorna `(passed, failed, skipped)` somados de todas as suítes.
#[cfg(feature = "self_test")]
pub fn run_self_tests() -> (usize, usize, usize) {
    use crate::klib::test_framework::run_test_suite;

    let suites: [(&str, &[klib::test_framework::TestCase]); 4] = [
        ("sync", sync::test::SYNC_TESTS),
        ("object", crate::core::object::test::OBJECT_TESTS),
        ("heap", mm::test::HEAP_TESTS),
        ("vfs", fs::test::VFS_TESTS),
    ];

    let mut total = (0, 0, 0);
    for (name, tests) in suites {
        let (p, f, s) = run_test_suite(name, tests);
        total.0 += p;
        total.1 += f;
        total.2 += s;
    }
    total
}
