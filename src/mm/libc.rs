//! Família `malloc` do kernel.
//!
//! Wrappers finos sobre `LockedHeap` com alinhamento padrão de 16 bytes.
//! Falhas devolvem null, como em C. As funções livres usam `KERNEL_HEAP`.

use core::ptr;

use crate::mm::config::{DEFAULT_ALIGN, PAGE_SIZE};
use crate::mm::heap::{report_bad_free, LockedHeap, KERNEL_HEAP};

impl LockedHeap {
    pub fn malloc(&self, size: usize) -> *mut u8 {
        self.aligned_alloc(DEFAULT_ALIGN, size)
    }

    /// `nmemb * size` bytes zerados; overflow na multiplicação devolve null.
    pub fn calloc(&self, nmemb: usize, size: usize) -> *mut u8 {
        let Some(total) = nmemb.checked_mul(size) else {
            return ptr::null_mut();
        };
        let p = self.malloc(total);
        if !p.is_null() {
            // SAFETY: bloco recém alocado com pelo menos `total` bytes.
            unsafe { ptr::write_bytes(p, 0, total) };
        }
        p
    }

    pub fn aligned_alloc(&self, align: usize, size: usize) -> *mut u8 {
        self.alloc_aligned(size, align)
            .map_or(ptr::null_mut(), |p| p.as_ptr())
    }

    /// Alocação alinhada a página.
    pub fn valloc(&self, size: usize) -> *mut u8 {
        self.aligned_alloc(PAGE_SIZE, size)
    }

    /// Em falha devolve null e o bloco original continua válido.
    ///
    /// # Safety
    /// `p` deve ser null ou vir deste heap.
    pub unsafe fn realloc_raw(&self, p: *mut u8, size: usize) -> *mut u8 {
        match self.realloc(p, size) {
            Ok(new) => new,
            Err(err) => {
                crate::kwarn!("(Heap) realloc falhou: " => err.as_str());
                ptr::null_mut()
            }
        }
    }

    /// # Safety
    /// `p` deve ser null ou vir deste heap, e não ter sido liberado.
    pub unsafe fn free_raw(&self, p: *mut u8) {
        if let Err(err) = self.free(p) {
            report_bad_free(p, err);
        }
    }
}

pub fn malloc(size: usize) -> *mut u8 {
    KERNEL_HEAP.malloc(size)
}

pub fn calloc(nmemb: usize, size: usize) -> *mut u8 {
    KERNEL_HEAP.calloc(nmemb, size)
}

pub fn aligned_alloc(align: usize, size: usize) -> *mut u8 {
    KERNEL_HEAP.aligned_alloc(align, size)
}

pub fn valloc(size: usize) -> *mut u8 {
    KERNEL_HEAP.valloc(size)
}

/// # Safety
/// `p` deve ser null ou vir de `KERNEL_HEAP`.
pub unsafe fn realloc(p: *mut u8, size: usize) -> *mut u8 {
    KERNEL_HEAP.realloc_raw(p, size)
}

/// # Safety
/// `p` deve ser null ou vir de `KERNEL_HEAP`, e não ter sido liberado.
pub unsafe fn free(p: *mut u8) {
    KERNEL_HEAP.free_raw(p)
}
