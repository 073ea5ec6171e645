//! # Erros do Kernel
//!
//! Dois níveis:
//! - [`KError`]: erro recuperável devolvido pelas APIs do substrato
//!   (heap, objetos, VFS, drivers). O chamador decide se tenta de novo.
//! - [`Errno`]: código POSIX/Linux equivalente, usado pela camada de syscalls.
//!
//! Violações de invariante (underflow de refcount, unmount duplo, semáforo
//! destruído com waiters) NÃO são `KError`: são `panic!`.

use core::fmt;

use crate::drivers::block::BlockError;
use crate::mm::error::MmError;

#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Errno {
    Success = 0,
    EPERM = 1,         // Operation not permitted
    ENOENT = 2,        // No such file or directory
    EIO = 5,           // I/O error
    ENOMEM = 12,       // Out of memory
    EBUSY = 16,        // Device or resource busy
    EEXIST = 17,       // File exists
    ENOTDIR = 20,      // Not a directory
    EISDIR = 21,       // Is a directory
    EINVAL = 22,       // Invalid argument
    EROFS = 30,        // Read-only file system
    ENAMETOOLONG = 36, // File name too long
    ENOTSUP = 95,      // Operation not supported
    EUCLEAN = 117,     // Structure needs cleaning
}

impl Errno {
    pub fn as_isize(self) -> isize {
        -(self as i32) as isize
    }
}

/// Erro recuperável do kernel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KError {
    /// Sem memória para a alocação
    OutOfMemory,
    /// Componente de caminho inexistente
    NoSuchEntry,
    /// Operação não implementada pelo driver
    NotSupported,
    /// Falha de I/O reportada pelo dispositivo
    IoError,
    /// Esperava um diretório
    NotDirectory,
    /// Operação de arquivo sobre um diretório
    IsDirectory,
    /// Argumento inválido
    InvalidArgument,
    /// Recurso em uso
    Busy,
    /// Entrada já existe
    AlreadyExists,
    /// Estrutura em disco/memória inconsistente
    Corrupted,
    /// Nome maior que NAME_MAX
    NameTooLong,
    /// Escrita em filesystem/dispositivo somente leitura
    ReadOnly,
}

impl KError {
    /// Retorna descrição legível do erro
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OutOfMemory => "Sem memória",
            Self::NoSuchEntry => "Entrada não encontrada",
            Self::NotSupported => "Operação não suportada",
            Self::IoError => "Erro de I/O",
            Self::NotDirectory => "Não é um diretório",
            Self::IsDirectory => "É um diretório",
            Self::InvalidArgument => "Argumento inválido",
            Self::Busy => "Recurso ocupado",
            Self::AlreadyExists => "Entrada já existe",
            Self::Corrupted => "Estrutura corrompida",
            Self::NameTooLong => "Nome muito longo",
            Self::ReadOnly => "Somente leitura",
        }
    }

    /// Código POSIX equivalente.
    pub fn errno(&self) -> Errno {
        match self {
            Self::OutOfMemory => Errno::ENOMEM,
            Self::NoSuchEntry => Errno::ENOENT,
            Self::NotSupported => Errno::ENOTSUP,
            Self::IoError => Errno::EIO,
            Self::NotDirectory => Errno::ENOTDIR,
            Self::IsDirectory => Errno::EISDIR,
            Self::InvalidArgument => Errno::EINVAL,
            Self::Busy => Errno::EBUSY,
            Self::AlreadyExists => Errno::EEXIST,
            Self::Corrupted => Errno::EUCLEAN,
            Self::NameTooLong => Errno::ENAMETOOLONG,
            Self::ReadOnly => Errno::EROFS,
        }
    }
}

impl fmt::Display for KError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl From<MmError> for KError {
    fn from(err: MmError) -> Self {
        match err {
            MmError::OutOfMemory => Self::OutOfMemory,
            MmError::Corrupted => Self::Corrupted,
            _ => Self::InvalidArgument,
        }
    }
}

impl From<BlockError> for KError {
    fn from(err: BlockError) -> Self {
        match err {
            BlockError::ReadOnly => Self::ReadOnly,
            // Bloco fora do dispositivo vem de ponteiro corrompido no disco.
            BlockError::InvalidBlock => Self::Corrupted,
            BlockError::InvalidBuffer => Self::InvalidArgument,
            BlockError::IoError => Self::IoError,
        }
    }
}

/// Tipo Result do kernel
pub type KResult<T> = Result<T, KError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_errno_mapping() {
        assert_eq!(KError::NoSuchEntry.errno(), Errno::ENOENT);
        assert_eq!(KError::NotSupported.errno().as_isize(), -95);
        assert_eq!(KError::Corrupted.errno(), Errno::EUCLEAN);
    }

    #[test]
    fn test_conversions() {
        assert_eq!(KError::from(MmError::OutOfMemory), KError::OutOfMemory);
        assert_eq!(KError::from(BlockError::IoError), KError::IoError);
        assert_eq!(KError::from(BlockError::ReadOnly), KError::ReadOnly);
        assert_eq!(KError::from(BlockError::InvalidBlock), KError::Corrupted);
        assert_eq!(KError::from(BlockError::InvalidBuffer), KError::InvalidArgument);
    }
}
