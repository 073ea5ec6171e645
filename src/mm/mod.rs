//! # Memory Management Subsystem (MM)
//!
//! Heap do kernel e família `malloc`. O gerenciador de memória física é um
//! colaborador externo: ele doa a região inicial (`init`) e, quando
//! necessário, páginas contíguas ao fim dela (`extend`).
//!
//! | Módulo   | Responsabilidade                                   |
//! |----------|----------------------------------------------------|
//! | `heap`   | First-fit com boundary tags, `GlobalAlloc`          |
//! | `libc`   | `malloc`/`calloc`/`aligned_alloc`/`valloc`/`realloc`/`free` |
//! | `config` | Constantes (alinhamento, split, magics)             |
//! | `error`  | `MmError`                                           |

pub mod config;
pub mod error;
pub mod heap;
pub mod libc;

#[cfg(feature = "self_test")]
pub mod test;


pub use error::{MmError, MmResult};
pub use heap::{Heap, HeapStats, LockedHeap, KERNEL_HEAP};

/// Inicializa o heap global do kernel.
///
/// # Safety
/// Ver [`LockedHeap::init`].
pub unsafe fn init(base: usize, size: usize) -> MmResult<()> {
    crate::kinfo!("(MM) Inicializando heap do kernel...");
    KERNEL_HEAP.init(base, size)?;
    crate::kinfo!("(MM) Heap pronto, capacidade=", KERNEL_HEAP.stats().capacity);
    Ok(())
}
