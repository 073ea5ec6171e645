//! # Synchronization Primitives
//!
//! Primitivas de sincronização do substrato.
//!
//! ## Hierarquia de Uso
//!
//! ```text
//! RawSpinlock → Flag crua (spinlock_acquire / spinlock_release)
//! Spinlock    → Seções críticas curtas (não pode dormir)
//! Semaphore   → Controle de recursos contáveis (dorme via scheduler)
//! ```
//!
//! ## Regras
//!
//! - **Spinlock**: nunca segurar durante I/O ou callbacks de driver
//! - **Semaphore**: única primitiva que bloqueia a thread
//! - **Ordem de Lock**: Sempre adquirir na mesma ordem para evitar deadlock

/// Spinlock (busy-wait, não dorme)
pub mod spinlock;

/// Semáforo (contagem de recursos)
pub mod semaphore;

#[cfg(feature = "self_test")]
pub mod test;

#[cfg(test)]
mod tests;

pub use semaphore::Semaphore;
pub use spinlock::{spinlock_acquire, spinlock_release, RawSpinlock, Spinlock, SpinlockGuard};
