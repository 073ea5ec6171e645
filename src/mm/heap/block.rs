//! Boundary tags do heap.
//!
//! ```text
//! ┌──────────────┬──────────────────────────┬──────────────┐
//! │ BlockHeader  │ payload (size bytes)     │ BlockTail    │
//! │ magic flags  │ alinhado a DEFAULT_ALIGN │ magic header │
//! │ size         │                          │              │
//! └──────────────┴──────────────────────────┴──────────────┘
//!    16 bytes                                   16 bytes
//! ```
//!
//! O rodapé aponta de volta para o cabeçalho, o que permite achar o vizinho
//! anterior em O(1) ao coalescer.

use bitflags::bitflags;

use crate::mm::config::{HEADER_MAGIC, TAIL_MAGIC};
use crate::mm::error::{MmError, MmResult};

bitflags! {
    /// Flags de um bloco. Bits 8..16 guardam log2 do alinhamento pedido.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct BlockFlags: u32 {
        const ALLOC = 1 << 0;
    }
}

const ALIGN_SHIFT: u32 = 8;
const ALIGN_MASK: u32 = 0xff << ALIGN_SHIFT;

#[repr(C, align(16))]
pub struct BlockHeader {
    magic: u32,
    flags: u32,
    size: u64,
}

#[repr(C, align(16))]
pub struct BlockTail {
    magic: u32,
    _reserved: u32,
    header: u64,
}

pub const HEADER_SIZE: usize = core::mem::size_of::<BlockHeader>();
pub const TAIL_SIZE: usize = core::mem::size_of::<BlockTail>();

/// Bytes de metadados por bloco.
pub const OVERHEAD: usize = HEADER_SIZE + TAIL_SIZE;

/// Visão de um bloco a partir do endereço do seu cabeçalho.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Block(usize);

impl Block {
    pub const fn at(header: usize) -> Self {
        Self(header)
    }

    /// Bloco dono de um payload.
    pub const fn from_payload(payload: usize) -> Self {
        Self(payload - HEADER_SIZE)
    }

    pub const fn addr(self) -> usize {
        self.0
    }

    pub const fn payload(self) -> usize {
        self.0 + HEADER_SIZE
    }

    fn header(self) -> *mut BlockHeader {
        self.0 as *mut BlockHeader
    }

    /// # Safety
    /// O cabeçalho deve estar dentro do heap.
    pub unsafe fn size(self) -> usize {
        (*self.header()).size as usize
    }

    /// Endereço logo após o rodapé.
    ///
    /// # Safety
    /// O cabeçalho deve estar dentro do heap.
    pub unsafe fn end(self) -> usize {
        self.0 + OVERHEAD + self.size()
    }

    unsafe fn tail(self) -> *mut BlockTail {
        (self.payload() + self.size()) as *mut BlockTail
    }

    /// # Safety
    /// O cabeçalho deve estar dentro do heap.
    pub unsafe fn flags(self) -> BlockFlags {
        BlockFlags::from_bits_truncate((*self.header()).flags)
    }

    /// # Safety
    /// O cabeçalho deve estar dentro do heap.
    pub unsafe fn is_free(self) -> bool {
        !self.flags().contains(BlockFlags::ALLOC)
    }

    /// Alinhamento com que o bloco foi alocado.
    ///
    /// # Safety
    /// O cabeçalho deve estar dentro do heap.
    pub unsafe fn align(self) -> usize {
        1 << (((*self.header()).flags & ALIGN_MASK) >> ALIGN_SHIFT)
    }

    /// Escreve cabeçalho e rodapé de um bloco.
    ///
    /// # Safety
    /// `[addr, addr + OVERHEAD + size)` deve estar dentro do heap.
    pub unsafe fn write(self, size: usize, flags: BlockFlags, align: usize) {
        let log2 = align.trailing_zeros();
        self.header().write(BlockHeader {
            magic: HEADER_MAGIC,
            flags: flags.bits() | (log2 << ALIGN_SHIFT),
            size: size as u64,
        });
        self.tail().write(BlockTail {
            magic: TAIL_MAGIC,
            _reserved: 0,
            header: self.0 as u64,
        });
    }

    /// Confere as duas tags do bloco.
    ///
    /// # Safety
    /// O cabeçalho deve estar dentro do heap; o rodapé só é lido se o
    /// tamanho couber antes de `heap_end`.
    pub unsafe fn validate(self, heap_end: usize) -> MmResult<()> {
        if (*self.header()).magic != HEADER_MAGIC {
            return Err(MmError::Corrupted);
        }
        let size = self.size();
        match OVERHEAD.checked_add(size).and_then(|n| self.0.checked_add(n)) {
            Some(end) if end <= heap_end => {}
            _ => return Err(MmError::Corrupted),
        }
        let tail = &*self.tail();
        if tail.magic != TAIL_MAGIC || tail.header != self.0 as u64 {
            return Err(MmError::Corrupted);
        }
        Ok(())
    }

    /// Bloco fisicamente anterior, lido pelo rodapé dele.
    ///
    /// # Safety
    /// `self` não pode ser o primeiro bloco do heap.
    pub unsafe fn prev(self) -> MmResult<Block> {
        let tail = &*((self.0 - TAIL_SIZE) as *const BlockTail);
        if tail.magic != TAIL_MAGIC {
            return Err(MmError::Corrupted);
        }
        Ok(Block(tail.header as usize))
    }
}
