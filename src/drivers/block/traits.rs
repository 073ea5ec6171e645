//! # Camada de Abstração de Dispositivos de Bloco
//!
//! Fornece a trait que os filesystems usam para falar com o disco.
//!
//! ## Arquitetura
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │              FILESYSTEM (ext2)                      │
//! │   read_bytes() write_bytes()                        │
//! └─────────────────────────────────────────────────────┘
//!                          ↓
//! ┌─────────────────────────────────────────────────────┐
//! │              BlockDevice Trait                      │
//! │   read_block() write_block() block_size()           │
//! └─────────────────────────────────────────────────────┘
//!                          ↓
//! ┌─────────────────────────────────────────────────────┐
//! │              DRIVERS (RamDisk, ...)                 │
//! └─────────────────────────────────────────────────────┘
//! ```

use alloc::vec;
use core::fmt;

/// Tipos de erro para dispositivos de bloco
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockError {
    /// Endereço de bloco inválido (fora do intervalo)
    InvalidBlock,
    /// Erro de I/O durante leitura/escrita
    IoError,
    /// Dispositivo somente leitura
    ReadOnly,
    /// Tamanho do buffer incorreto
    InvalidBuffer,
}

impl fmt::Display for BlockError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockError::InvalidBlock => write!(f, "Endereço de bloco inválido"),
            BlockError::IoError => write!(f, "Erro de I/O"),
            BlockError::ReadOnly => write!(f, "Dispositivo somente leitura"),
            BlockError::InvalidBuffer => write!(f, "Tamanho do buffer inválido"),
        }
    }
}

/// Trait para dispositivos de bloco
///
/// Todos os drivers de dispositivos de bloco devem implementar esta trait.
/// Os métodos `*_bytes` já vêm prontos sobre `read_block`/`write_block`.
pub trait BlockDevice: Send + Sync {
    /// Lê um único bloco do dispositivo
    ///
    /// # Argumentos
    /// * `lba` - Endereço Lógico de Bloco (Logical Block Address)
    /// * `buf` - Buffer para armazenar os dados (exatamente block_size bytes)
    fn read_block(&self, lba: u64, buf: &mut [u8]) -> Result<(), BlockError>;

    /// Escreve um único bloco no dispositivo
    fn write_block(&self, lba: u64, buf: &[u8]) -> Result<(), BlockError>;

    /// Retorna o tamanho do bloco em bytes (normalmente 512)
    fn block_size(&self) -> usize;

    /// Retorna o número total de blocos no dispositivo
    fn total_blocks(&self) -> u64;

    /// Verifica se o dispositivo é somente leitura
    fn is_read_only(&self) -> bool {
        false
    }

    /// Força a escrita de dados em cache para o dispositivo
    fn flush(&self) -> Result<(), BlockError> {
        Ok(())
    }

    /// Tamanho do dispositivo em bytes.
    fn size_bytes(&self) -> u64 {
        self.total_blocks() * self.block_size() as u64
    }

    /// Lê múltiplos blocos contíguos
    fn read_blocks(&self, start_lba: u64, buf: &mut [u8]) -> Result<(), BlockError> {
        let block_size = self.block_size();
        if buf.len() % block_size != 0 {
            return Err(BlockError::InvalidBuffer);
        }

        for (i, chunk) in buf.chunks_exact_mut(block_size).enumerate() {
            self.read_block(start_lba + i as u64, chunk)?;
        }
        Ok(())
    }

    /// Escreve múltiplos blocos contíguos
    fn write_blocks(&self, start_lba: u64, buf: &[u8]) -> Result<(), BlockError> {
        let block_size = self.block_size();
        if buf.len() % block_size != 0 {
            return Err(BlockError::InvalidBuffer);
        }

        for (i, chunk) in buf.chunks_exact(block_size).enumerate() {
            self.write_block(start_lba + i as u64, chunk)?;
        }
        Ok(())
    }

    /// Lê `buf.len()` bytes a partir do offset absoluto `offset`.
    ///
    /// Não exige alinhamento: blocos parciais passam por um buffer
    /// temporário.
    fn read_bytes(&self, offset: u64, buf: &mut [u8]) -> Result<(), BlockError> {
        let block_size = self.block_size() as u64;
        let end = offset
            .checked_add(buf.len() as u64)
            .ok_or(BlockError::InvalidBlock)?;
        if end > self.size_bytes() {
            return Err(BlockError::InvalidBlock);
        }

        let mut scratch = vec![0u8; block_size as usize];
        let mut done = 0usize;
        while done < buf.len() {
            let pos = offset + done as u64;
            let lba = pos / block_size;
            let within = (pos % block_size) as usize;
            let n = (block_size as usize - within).min(buf.len() - done);

            self.read_block(lba, &mut scratch)?;
            buf[done..done + n].copy_from_slice(&scratch[within..within + n]);
            done += n;
        }
        Ok(())
    }

    /// Escreve `buf` no offset absoluto `offset` (read-modify-write nos
    /// blocos parciais).
    fn write_bytes(&self, offset: u64, buf: &[u8]) -> Result<(), BlockError> {
        if self.is_read_only() {
            return Err(BlockError::ReadOnly);
        }
        let block_size = self.block_size() as u64;
        let end = offset
            .checked_add(buf.len() as u64)
            .ok_or(BlockError::InvalidBlock)?;
        if end > self.size_bytes() {
            return Err(BlockError::InvalidBlock);
        }

        let mut scratch = vec![0u8; block_size as usize];
        let mut done = 0usize;
        while done < buf.len() {
            let pos = offset + done as u64;
            let lba = pos / block_size;
            let within = (pos % block_size) as usize;
            let n = (block_size as usize - within).min(buf.len() - done);

            if n != block_size as usize {
                self.read_block(lba, &mut scratch)?;
            }
            scratch[within..within + n].copy_from_slice(&buf[done..done + n]);
            self.write_block(lba, &scratch)?;
            done += n;
        }
        Ok(())
    }
}
