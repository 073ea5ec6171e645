//! RamDisk - dispositivo de bloco em memória
//!
//! Imagem inteira num `Vec<u8>`. Usado para montar imagens de filesystem
//! carregadas pelo bootloader e nos testes.

use alloc::vec;
use alloc::vec::Vec;

use super::traits::{BlockDevice, BlockError};
use crate::sync::Spinlock;

pub const DEFAULT_BLOCK_SIZE: usize = 512;

/// Disco em memória
pub struct RamDisk {
    data: Spinlock<Vec<u8>>,
    block_size: usize,
    read_only: bool,
}

impl RamDisk {
    /// Disco zerado com `blocks` blocos de `block_size` bytes.
    pub fn new(block_size: usize, blocks: u64) -> Self {
        Self {
            data: Spinlock::new(vec![0u8; block_size * blocks as usize]),
            block_size,
            read_only: false,
        }
    }

    /// Disco a partir de uma imagem já pronta. Bytes finais que não
    /// completam um bloco são preenchidos com zero.
    pub fn from_image(mut image: Vec<u8>, block_size: usize) -> Self {
        let rem = image.len() % block_size;
        if rem != 0 {
            image.resize(image.len() + block_size - rem, 0);
        }
        crate::kdebug!("(RamDisk) imagem carregada, bytes=", image.len());
        Self {
            data: Spinlock::new(image),
            block_size,
            read_only: false,
        }
    }

    /// Marca o disco como somente leitura.
    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    /// Cópia do conteúdo atual.
    pub fn snapshot(&self) -> Vec<u8> {
        self.data.lock().clone()
    }

    fn range(&self, lba: u64, len: usize, total: usize) -> Result<core::ops::Range<usize>, BlockError> {
        if len != self.block_size {
            return Err(BlockError::InvalidBuffer);
        }
        let start = (lba as usize)
            .checked_mul(self.block_size)
            .ok_or(BlockError::InvalidBlock)?;
        let end = start + self.block_size;
        if end > total {
            return Err(BlockError::InvalidBlock);
        }
        Ok(start..end)
    }
}

impl BlockDevice for RamDisk {
    fn read_block(&self, lba: u64, buf: &mut [u8]) -> Result<(), BlockError> {
        let data = self.data.lock();
        let range = self.range(lba, buf.len(), data.len())?;
        buf.copy_from_slice(&data[range]);
        Ok(())
    }

    fn write_block(&self, lba: u64, buf: &[u8]) -> Result<(), BlockError> {
        if self.read_only {
            return Err(BlockError::ReadOnly);
        }
        let mut data = self.data.lock();
        let range = self.range(lba, buf.len(), data.len())?;
        data[range].copy_from_slice(buf);
        Ok(())
    }

    fn block_size(&self) -> usize {
        self.block_size
    }

    fn total_blocks(&self) -> u64 {
        (self.data.lock().len() / self.block_size) as u64
    }

    fn is_read_only(&self) -> bool {
        self.read_only
    }
}
