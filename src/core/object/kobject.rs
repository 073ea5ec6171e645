// Arquivo: core/object/kobject.rs
//
// Propósito: Identidade de Objetos do Kernel.
// Um `Koid` é a referência não-possessiva usada quando um objeto precisa
// apontar para outro sem mantê-lo vivo (ex.: vnode → mount).

//! Kernel Object IDs

use core::sync::atomic::{AtomicU64, Ordering};

/// Kernel Object ID
pub type Koid = u64;

/// KOID reservado: "nenhum objeto".
pub const KOID_INVALID: Koid = 0;

/// Gerador de KOIDs
static KOID_GENERATOR: AtomicU64 = AtomicU64::new(1);

/// Gera um novo KOID único
pub fn generate_koid() -> Koid {
    KOID_GENERATOR.fetch_add(1, Ordering::Relaxed)
}
