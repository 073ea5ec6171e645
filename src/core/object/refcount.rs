// Arquivo: core/object/refcount.rs
//
// Propósito: Contagem de referências atômica para Objetos de Kernel.
// Base do ciclo de vida de `KRef<T>`.
//
// Detalhes de Implementação:
// - Usa `AtomicUsize`; nunca lock+modify, pode ser chamado de IRQ.
// - Semântica Acquire/Release ao decrementar a última referência.
// - Underflow é violação de invariante: panic.

//! Reference Counting

use core::sync::atomic::{AtomicUsize, Ordering};

/// Contador de referências atômico
#[derive(Debug)]
pub struct RefCount {
    count: AtomicUsize,
}

impl RefCount {
    /// Cria um novo contador com valor inicial
    pub const fn new(initial: usize) -> Self {
        Self {
            count: AtomicUsize::new(initial),
        }
    }

    /// Incrementa o contador de referências.
    /// Retorna o valor ANTERIOR.
    #[inline]
    pub fn inc(&self) -> usize {
        // Relaxed basta: quem chama inc() já segura uma referência válida.
        let prev = self.count.fetch_add(1, Ordering::Relaxed);
        if prev == 0 {
            crate::kerror!("(RefCount) inc em objeto já destruído");
            panic!("refcount: increment of a dead object");
        }
        prev
    }

    /// Decrementa o contador de referências.
    /// Retorna `true` se a contagem chegou a ZERO (o objeto deve ser destruído).
    #[inline]
    #[must_use]
    pub fn dec(&self) -> bool {
        // Release: escritas anteriores ficam visíveis para quem destruir.
        let prev = self.count.fetch_sub(1, Ordering::Release);

        if prev == 0 {
            crate::kerror!("(RefCount) underflow!");
            panic!("refcount: underflow");
        }

        if prev == 1 {
            // Acquire fence: o destrutor vê todas as modificações dos outros threads.
            core::sync::atomic::fence(Ordering::Acquire);
            true
        } else {
            false
        }
    }

    /// Retorna o valor atual (aproximado/relaxado).
    #[inline]
    pub fn get(&self) -> usize {
        self.count.load(Ordering::Relaxed)
    }
}
