//! # KRef - Referência possessiva para objetos do kernel
//!
//! O objeto vive num bloco do heap precedido por `{refcount, deallocator}`.
//! Operações: alocar (`KRef::alloc`), reassentar (`assign`) e soltar
//! (`unref`).
//!
//! ## Ciclo de Vida
//!
//! ```text
//! KRef::alloc(v, d)    refcount = 1
//! KRef::clone()        refcount += 1   (lock-free)
//! drop(KRef) / unref   refcount -= 1   → 0: d(&mut v), drop(v), free
//! ```
//!
//! ## Regras
//!
//! - O deallocator roda exatamente uma vez, no último `unref`.
//! - Underflow é fatal (ver `RefCount::dec`).
//! - `assign` incrementa o novo objeto ANTES de soltar o antigo: não existe
//!   janela em que um objeto alcançável tenha contagem zero.

use alloc::alloc::{alloc, dealloc, Layout};
use core::fmt;
use core::marker::PhantomData;
use core::ops::Deref;
use core::ptr::{self, NonNull};

use super::refcount::RefCount;
use crate::sync::Spinlock;
use crate::sys::error::{KError, KResult};

/// Callback executado quando a última referência é solta, antes do `Drop`
/// do valor e da liberação da memória.
pub type Deallocator<T> = fn(&mut T);

/// Bloco do heap que carrega o objeto.
#[repr(C)]
struct ObjectBox<T> {
    refs: RefCount,
    dealloc: Deallocator<T>,
    value: T,
}

fn no_dealloc<T>(_: &mut T) {}

/// Referência possessiva com contagem atômica.
pub struct KRef<T> {
    ptr: NonNull<ObjectBox<T>>,
    _marker: PhantomData<ObjectBox<T>>,
}

// SAFETY: o valor é compartilhado entre threads; exige as mesmas garantias
// que `Arc<T>`.
unsafe impl<T: Send + Sync> Send for KRef<T> {}
unsafe impl<T: Send + Sync> Sync for KRef<T> {}

impl<T> KRef<T> {
    /// Aloca um objeto com `refcount = 1` e o deallocator dado.
    ///
    /// Falta de memória é reportada como `KError::OutOfMemory`, nunca aborta.
    pub fn alloc(value: T, dealloc: Deallocator<T>) -> KResult<Self> {
        let layout = Layout::new::<ObjectBox<T>>();
        // SAFETY: ObjectBox nunca é ZST (contém o RefCount).
        let raw = unsafe { alloc(layout) } as *mut ObjectBox<T>;
        let ptr = match NonNull::new(raw) {
            Some(p) => p,
            None => {
                crate::kerror!("(Object) OOM ao alocar objeto, size=", layout.size());
                return Err(KError::OutOfMemory);
            }
        };

        // SAFETY: memória recém alocada com o layout de ObjectBox<T>.
        unsafe {
            ptr.as_ptr().write(ObjectBox {
                refs: RefCount::new(1),
                dealloc,
                value,
            });
        }

        Ok(Self {
            ptr,
            _marker: PhantomData,
        })
    }

    /// Aloca um objeto sem deallocator (apenas `Drop`).
    pub fn new(value: T) -> KResult<Self> {
        Self::alloc(value, no_dealloc::<T>)
    }

    /// Contagem atual de referências.
    pub fn ref_count(this: &Self) -> usize {
        this.inner().refs.get()
    }

    /// Verifica se duas referências apontam para o mesmo objeto.
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        a.ptr == b.ptr
    }

    /// Endereço do objeto (identidade estável enquanto houver referências).
    pub fn as_ptr(this: &Self) -> *const T {
        // SAFETY: o objeto está vivo enquanto `this` existir.
        unsafe { ptr::addr_of!((*this.ptr.as_ptr()).value) }
    }

    fn inner(&self) -> &ObjectBox<T> {
        // SAFETY: refcount > 0 enquanto este handle existir.
        unsafe { self.ptr.as_ref() }
    }
}

impl<T> Clone for KRef<T> {
    fn clone(&self) -> Self {
        self.inner().refs.inc();
        Self {
            ptr: self.ptr,
            _marker: PhantomData,
        }
    }
}

impl<T> Drop for KRef<T> {
    fn drop(&mut self) {
        if !self.inner().refs.dec() {
            return;
        }

        let raw = self.ptr.as_ptr();
        // SAFETY: éramos a última referência; ninguém mais acessa o bloco.
        unsafe {
            ((*raw).dealloc)(&mut (*raw).value);
            ptr::drop_in_place(raw);
            dealloc(raw as *mut u8, Layout::new::<ObjectBox<T>>());
        }
    }
}

impl<T> Deref for KRef<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.inner().value
    }
}

impl<T: fmt::Debug> fmt::Debug for KRef<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KRef")
            .field("refs", &KRef::ref_count(self))
            .field("value", &**self)
            .finish()
    }
}

/// Reassenta `slot` para `obj`.
///
/// Incrementa `obj`, troca o conteúdo e só então solta o ocupante anterior.
pub fn assign<T>(slot: &mut Option<KRef<T>>, obj: &KRef<T>) {
    let new = obj.clone();
    let old = slot.replace(new);
    drop(old);
}

/// Solta uma referência explicitamente.
#[inline]
pub fn unref<T>(obj: KRef<T>) {
    drop(obj);
}

/// Slot compartilhado que guarda no máximo uma referência.
///
/// Usado onde várias threads podem reassentar a mesma referência longa
/// (ex.: root vnode de um mount). O lock cobre apenas a troca do ponteiro;
/// o `unref` do ocupante anterior acontece fora dele, pois pode rodar o
/// deallocator de um driver.
pub struct RefSlot<T> {
    slot: Spinlock<Option<KRef<T>>>,
}

impl<T> RefSlot<T> {
    pub const fn empty() -> Self {
        Self {
            slot: Spinlock::new(None),
        }
    }

    /// Reassenta o slot para `obj`, soltando o ocupante anterior fora do lock.
    pub fn assign(&self, obj: &KRef<T>) {
        let new = obj.clone();
        let old = self.slot.lock().replace(new);
        drop(old);
    }

    /// Remove a referência do slot, transferindo-a ao chamador.
    pub fn take(&self) -> Option<KRef<T>> {
        self.slot.lock().take()
    }

    /// Solta a referência guardada, se houver.
    pub fn clear(&self) {
        let old = self.take();
        drop(old);
    }

    /// Nova referência para o ocupante atual.
    pub fn get(&self) -> Option<KRef<T>> {
        self.slot.lock().clone()
    }

    pub fn is_empty(&self) -> bool {
        self.slot.lock().is_none()
    }

    /// Contagem de referências do ocupante (0 se vazio), sem criar outra.
    pub fn ref_count(&self) -> usize {
        self.slot.lock().as_ref().map_or(0, KRef::ref_count)
    }
}

impl<T> Default for RefSlot<T> {
    fn default() -> Self {
        Self::empty()
    }
}
