//! # Kernel Heap Allocator
//!
//! O `heap` fornece alocação dinâmica para o kernel (`Box`, `Vec`, `KRef`) e
//! para a família `malloc` (ver `mm::libc`).
//!
//! ## 🏗️ Arquitetura: First-Fit com Boundary Tags
//!
//! A região `[base, end)` é doada uma vez no boot e só cresce por `extend`
//! (nunca realoca). Ela é particionada em blocos contíguos, cada um com
//! cabeçalho e rodapé (ver `block.rs`):
//!
//! ```text
//! base                                                           end
//! │ H │ usado │ T │ H │ livre │ T │ H │ usado │ T │ H │ livre │ T │
//! ```
//!
//! - **Busca:** first-fit a partir de `base`; o menor endereço vence, o que
//!   mantém o comportamento determinístico.
//! - **Alinhamento:** se o payload alinhado não cai no início do bloco, a
//!   sobra da frente vira um bloco livre próprio.
//! - **Split:** a sobra do fim só vira bloco se couber `MIN_BLOCK_SPLIT_SIZE`.
//! - **Coalescência:** todo bloco liberado é unido aos vizinhos livres.
//!   Invariante: nunca existem dois blocos livres adjacentes.
//!
//! Tags corrompidas são reportadas como `MmError::Corrupted`, nunca
//! percorridas às cegas.

mod block;

use core::alloc::{GlobalAlloc, Layout};
use core::ptr::{self, NonNull};

use self::block::{Block, BlockFlags, HEADER_SIZE, OVERHEAD, TAIL_SIZE};
use crate::klib::align::{align_down, align_up, checked_align_up, is_aligned};
use crate::mm::config::{DEFAULT_ALIGN, MAX_ALIGN, MIN_BLOCK_SPLIT_SIZE};
use crate::mm::error::{MmError, MmResult};
use crate::sync::{Spinlock, SpinlockGuard};

/// Estatísticas do heap (bytes de payload, sem contar as tags).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HeapStats {
    /// Tamanho total da região gerenciada
    pub capacity: usize,
    /// Bytes de payload em blocos usados
    pub used: usize,
    /// Maior valor já atingido por `used`
    pub peak: usize,
    /// Alocações vivas
    pub live: usize,
    /// Total de alocações desde o boot
    pub allocs: u64,
    /// Total de liberações desde o boot
    pub frees: u64,
}

/// Descrição de um bloco, para diagnóstico.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockInfo {
    /// Endereço do payload
    pub addr: usize,
    /// Tamanho do payload
    pub size: usize,
    /// Alinhamento registrado no cabeçalho
    pub align: usize,
    pub free: bool,
}

/// Heap first-fit sobre uma região contígua.
pub struct Heap {
    base: usize,
    end: usize,
    stats: HeapStats,
}

impl Heap {
    /// Heap vazio; use `init` antes de alocar.
    pub const fn empty() -> Self {
        Self {
            base: 0,
            end: 0,
            stats: HeapStats {
                capacity: 0,
                used: 0,
                peak: 0,
                live: 0,
                allocs: 0,
                frees: 0,
            },
        }
    }

    /// Estabelece o heap sobre `[base, base + size)`.
    ///
    /// # Safety
    /// A região deve ser memória válida, exclusiva do heap, viva para sempre.
    pub unsafe fn init(&mut self, base: usize, size: usize) -> MmResult<()> {
        if self.is_initialized() {
            crate::kerror!("(Heap) init chamado duas vezes");
            return Err(MmError::InitFailed);
        }

        let start = checked_align_up(base, DEFAULT_ALIGN).ok_or(MmError::InvalidAddress)?;
        let end = align_down(base.checked_add(size).ok_or(MmError::InvalidSize)?, DEFAULT_ALIGN);
        if end <= start || end - start < OVERHEAD + MIN_BLOCK_SPLIT_SIZE {
            return Err(MmError::InvalidSize);
        }

        Block::at(start).write(end - start - OVERHEAD, BlockFlags::empty(), DEFAULT_ALIGN);
        self.base = start;
        self.end = end;
        self.stats.capacity = end - start;

        crate::kdebug!("(Heap) init: início=", start);
        crate::kdebug!("(Heap) init: tamanho=", end - start);
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.end != 0
    }

    pub fn base(&self) -> usize {
        self.base
    }

    pub fn end(&self) -> usize {
        self.end
    }

    pub fn stats(&self) -> HeapStats {
        self.stats
    }

    /// Aloca `size` bytes com `addr % align == 0`.
    pub fn alloc_aligned(&mut self, size: usize, align: usize) -> MmResult<NonNull<u8>> {
        if !self.is_initialized() {
            return Err(MmError::NotInitialized);
        }
        if !align.is_power_of_two() || align > MAX_ALIGN {
            return Err(MmError::InvalidAlignment);
        }

        let align = align.max(DEFAULT_ALIGN);
        let size = checked_align_up(size.max(1), DEFAULT_ALIGN).ok_or(MmError::OutOfMemory)?;
        if size > self.end - self.base {
            return Err(MmError::OutOfMemory);
        }

        let mut cursor = Some(Block::at(self.base));
        while let Some(block) = cursor {
            // SAFETY: `block` veio do encadeamento validado a partir de `base`.
            unsafe {
                block.validate(self.end)?;
                if block.is_free() {
                    if let Some(payload) = self.fit(block, size, align) {
                        return self.carve(block, payload, size, align);
                    }
                }
                cursor = self.next(block);
            }
        }

        crate::kwarn!("(Heap) OOM: nenhum bloco livre para size=", size);
        Err(MmError::OutOfMemory)
    }

    /// Libera um payload devolvido por `alloc_aligned`/`realloc`.
    ///
    /// `null` é ignorado. Liberar algo que não está alocado devolve erro.
    ///
    /// # Safety
    /// `ptr` deve ser null ou um endereço obtido deste heap.
    pub unsafe fn free(&mut self, ptr: *mut u8) -> MmResult<()> {
        if ptr.is_null() {
            return Ok(());
        }

        let block = self.block_of(ptr)?;
        if block.is_free() {
            crate::kerror!("(Heap) double free em ", ptr as usize);
            return Err(MmError::DoubleFree);
        }

        let size = block.size();
        block.write(size, BlockFlags::empty(), DEFAULT_ALIGN);
        self.stats.used -= size;
        self.stats.live -= 1;
        self.stats.frees += 1;

        self.coalesce(block)?;
        Ok(())
    }

    /// Redimensiona uma alocação preservando `min(antigo, novo)` bytes.
    ///
    /// - `ptr` null: equivale a `alloc_aligned(new_size, DEFAULT_ALIGN)`.
    /// - `new_size` zero: equivale a `free(ptr)` e devolve null.
    /// - Encolher e crescer sobre um vizinho livre acontecem no lugar; senão
    ///   o conteúdo é movido para um bloco novo com o mesmo alinhamento.
    ///
    /// # Safety
    /// `ptr` deve ser null ou um endereço obtido deste heap.
    pub unsafe fn realloc(&mut self, ptr: *mut u8, new_size: usize) -> MmResult<*mut u8> {
        if ptr.is_null() {
            return self.alloc_aligned(new_size, DEFAULT_ALIGN).map(NonNull::as_ptr);
        }
        if new_size == 0 {
            self.free(ptr)?;
            return Ok(ptr::null_mut());
        }

        let block = self.block_of(ptr)?;
        if block.is_free() {
            return Err(MmError::InvalidAddress);
        }

        let want = checked_align_up(new_size, DEFAULT_ALIGN).ok_or(MmError::OutOfMemory)?;
        let old = block.size();

        if want <= old {
            self.split(block, want)?;
            self.stats.used -= old - block.size();
            return Ok(ptr);
        }

        if let Some(next) = self.next(block) {
            next.validate(self.end)?;
            if next.is_free() && old + OVERHEAD + next.size() >= want {
                block.write(old + OVERHEAD + next.size(), block.flags(), block.align());
                self.split(block, want)?;
                self.account_growth(block.size() - old);
                return Ok(ptr);
            }
        }

        let new = self.alloc_aligned(new_size, block.align())?;
        ptr::copy_nonoverlapping(ptr, new.as_ptr(), old.min(new_size));
        self.free(ptr)?;
        Ok(new.as_ptr())
    }

    /// Cresce o heap com `[end, end + extra)`, unindo ao último bloco se livre.
    ///
    /// # Safety
    /// A região nova deve ser memória válida, contígua ao fim atual.
    pub unsafe fn extend(&mut self, extra: usize) -> MmResult<()> {
        if !self.is_initialized() {
            return Err(MmError::NotInitialized);
        }

        let new_end = align_down(
            self.end.checked_add(extra).ok_or(MmError::InvalidSize)?,
            DEFAULT_ALIGN,
        );
        if new_end < self.end + OVERHEAD {
            return Err(MmError::InvalidSize);
        }

        let block = Block::at(self.end);
        block.write(new_end - self.end - OVERHEAD, BlockFlags::empty(), DEFAULT_ALIGN);
        self.stats.capacity += new_end - self.end;
        self.end = new_end;
        self.coalesce(block)?;

        crate::kdebug!("(Heap) extend: novo fim=", new_end);
        Ok(())
    }

    /// Percorre os blocos em ordem de endereço.
    pub fn blocks(&self) -> Blocks<'_> {
        Blocks {
            heap: self,
            cursor: if self.is_initialized() {
                Some(Block::at(self.base))
            } else {
                None
            },
        }
    }

    /// Confere todas as tags e a invariante de coalescência.
    pub fn check(&self) -> MmResult<()> {
        if !self.is_initialized() {
            return Err(MmError::NotInitialized);
        }

        let mut cursor = Some(Block::at(self.base));
        let mut covered = 0;
        let mut live = 0;
        let mut prev_free = false;
        while let Some(block) = cursor {
            // SAFETY: cada bloco é validado antes de ser lido.
            unsafe {
                block.validate(self.end)?;
                let free = block.is_free();
                if free && prev_free {
                    return Err(MmError::Corrupted);
                }
                if !free {
                    live += 1;
                }
                prev_free = free;
                covered += OVERHEAD + block.size();
                cursor = self.next(block);
            }
        }

        if covered != self.end - self.base || live != self.stats.live {
            return Err(MmError::Corrupted);
        }
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Internos
    // -------------------------------------------------------------------------

    unsafe fn next(&self, block: Block) -> Option<Block> {
        let end = block.end();
        if end < self.end {
            Some(Block::at(end))
        } else {
            None
        }
    }

    unsafe fn block_of(&self, ptr: *mut u8) -> MmResult<Block> {
        if !self.is_initialized() {
            return Err(MmError::NotInitialized);
        }
        let addr = ptr as usize;
        if addr < self.base + HEADER_SIZE || addr >= self.end || !is_aligned(addr, DEFAULT_ALIGN)
        {
            crate::kerror!("(Heap) endereço fora do heap: ", addr);
            return Err(MmError::InvalidAddress);
        }
        let block = Block::from_payload(addr);
        block.validate(self.end)?;
        Ok(block)
    }

    /// Payload alinhado dentro de `block` que comporta `size`, se houver.
    unsafe fn fit(&self, block: Block, size: usize, align: usize) -> Option<usize> {
        let payload = block.payload();
        let mut aligned = align_up(payload, align);
        // A sobra da frente precisa comportar um bloco livre inteiro.
        if aligned != payload && aligned - payload < OVERHEAD {
            aligned = aligned.checked_add(align)?;
        }
        let needed = aligned.checked_add(size)?.checked_add(TAIL_SIZE)?;
        if needed <= block.end() {
            Some(aligned)
        } else {
            None
        }
    }

    unsafe fn carve(
        &mut self,
        block: Block,
        payload: usize,
        size: usize,
        align: usize,
    ) -> MmResult<NonNull<u8>> {
        let block_end = block.end();
        let mut used = block;

        if payload != block.payload() {
            used = Block::from_payload(payload);
            block.write(used.addr() - block.addr() - OVERHEAD, BlockFlags::empty(), DEFAULT_ALIGN);
            used.write(block_end - used.addr() - OVERHEAD, BlockFlags::empty(), DEFAULT_ALIGN);
        }

        used.write(used.size(), BlockFlags::ALLOC, align);
        self.split(used, size)?;

        self.stats.live += 1;
        self.stats.allocs += 1;
        self.account_growth(used.size());

        // SAFETY: payload está dentro do heap e nunca é zero.
        Ok(NonNull::new_unchecked(payload as *mut u8))
    }

    /// Reduz `block` para `size` se a sobra formar um bloco útil.
    unsafe fn split(&mut self, block: Block, size: usize) -> MmResult<()> {
        let total = block.size();
        if total < size + OVERHEAD + MIN_BLOCK_SPLIT_SIZE {
            return Ok(());
        }

        block.write(size, block.flags(), block.align());
        let rest = Block::at(block.end());
        rest.write(total - size - OVERHEAD, BlockFlags::empty(), DEFAULT_ALIGN);
        self.merge_next(rest)
    }

    unsafe fn merge_next(&mut self, block: Block) -> MmResult<()> {
        if let Some(next) = self.next(block) {
            next.validate(self.end)?;
            if next.is_free() {
                block.write(block.size() + OVERHEAD + next.size(), BlockFlags::empty(), DEFAULT_ALIGN);
            }
        }
        Ok(())
    }

    /// Une um bloco livre aos vizinhos livres.
    unsafe fn coalesce(&mut self, block: Block) -> MmResult<()> {
        self.merge_next(block)?;

        if block.addr() > self.base {
            let prev = block.prev()?;
            prev.validate(self.end)?;
            if prev.is_free() {
                prev.write(prev.size() + OVERHEAD + block.size(), BlockFlags::empty(), DEFAULT_ALIGN);
            }
        }
        Ok(())
    }

    fn account_growth(&mut self, bytes: usize) {
        self.stats.used += bytes;
        self.stats.peak = self.stats.peak.max(self.stats.used);
    }
}

/// Iterador sobre os blocos do heap. Para no primeiro bloco corrompido.
pub struct Blocks<'a> {
    heap: &'a Heap,
    cursor: Option<Block>,
}

impl Iterator for Blocks<'_> {
    type Item = BlockInfo;

    fn next(&mut self) -> Option<BlockInfo> {
        let block = self.cursor?;
        // SAFETY: bloco validado antes de qualquer leitura.
        unsafe {
            if block.validate(self.heap.end).is_err() {
                self.cursor = None;
                return None;
            }
            self.cursor = self.heap.next(block);
            Some(BlockInfo {
                addr: block.payload(),
                size: block.size(),
                align: block.align(),
                free: block.is_free(),
            })
        }
    }
}

/// Heap protegido pelo spinlock do kernel.
/// Acesso ao allocator deve sempre passar pelo lock.
pub struct LockedHeap {
    inner: Spinlock<Heap>,
}

impl LockedHeap {
    /// Construtor em tempo de compilação — sem heap inicializado
    pub const fn empty() -> Self {
        Self {
            inner: Spinlock::new(Heap::empty()),
        }
    }

    /// Inicializa o heap com início e tamanho fornecidos
    ///
    /// # Safety
    /// - Deve ser chamado apenas **uma vez** durante a inicialização do kernel
    /// - A região deve estar mapeada e pertencer exclusivamente ao heap
    pub unsafe fn init(&self, start: usize, size: usize) -> MmResult<()> {
        self.inner.lock().init(start, size)
    }

    pub fn alloc_aligned(&self, size: usize, align: usize) -> MmResult<NonNull<u8>> {
        self.inner.lock().alloc_aligned(size, align)
    }

    /// # Safety
    /// Ver [`Heap::free`].
    pub unsafe fn free(&self, ptr: *mut u8) -> MmResult<()> {
        self.inner.lock().free(ptr)
    }

    /// # Safety
    /// Ver [`Heap::realloc`].
    pub unsafe fn realloc(&self, ptr: *mut u8, new_size: usize) -> MmResult<*mut u8> {
        self.inner.lock().realloc(ptr, new_size)
    }

    /// Cresce o heap dinamicamente adicionando `extra` bytes
    ///
    /// # Safety
    /// Ver [`Heap::extend`].
    pub unsafe fn extend(&self, extra: usize) -> MmResult<()> {
        crate::kdebug!("(Heap) extend: extra=", extra);
        let result = self.inner.lock().extend(extra);
        if result.is_err() {
            crate::kerror!("(Heap) extend: FALHOU!");
        }
        result
    }

    pub fn stats(&self) -> HeapStats {
        self.inner.lock().stats()
    }

    /// Acesso direto ao heap (diagnóstico).
    pub fn lock(&self) -> SpinlockGuard<'_, Heap> {
        self.inner.lock()
    }
}

/// Free inválido é erro de programação: falha em debug, loga em release.
pub(crate) fn report_bad_free(ptr: *mut u8, err: MmError) {
    crate::kerror!("(Heap) free inválido em ", ptr as usize);
    crate::kerror!("(Heap) motivo: " => err.as_str());
    debug_assert!(false, "heap: invalid free ({})", err);
}

unsafe impl GlobalAlloc for LockedHeap {
    /// Retorna `null_mut` em caso de OOM.
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        match self.alloc_aligned(layout.size(), layout.align()) {
            Ok(ptr) => ptr.as_ptr(),
            Err(_) => {
                crate::kerror!("(Heap) OOM! size=", layout.size());
                ptr::null_mut()
            }
        }
    }

    unsafe fn dealloc(&self, ptr: *mut u8, _layout: Layout) {
        // Sem log aqui - muito frequente
        if let Err(err) = self.free(ptr) {
            report_bad_free(ptr, err);
        }
    }

    unsafe fn realloc(&self, ptr: *mut u8, _layout: Layout, new_size: usize) -> *mut u8 {
        // O alinhamento original fica no cabeçalho do bloco.
        self.realloc(ptr, new_size).unwrap_or(ptr::null_mut())
    }
}

/// Heap global do kernel.
#[cfg_attr(all(feature = "global_heap", not(test)), global_allocator)]
pub static KERNEL_HEAP: LockedHeap = LockedHeap::empty();
