//! Multi-mount protection (MMP)
//!
//! Impede dois hosts de montarem o mesmo volume. Não implementado: as
//! chamadas falham com `NotSupported` para que uma montagem de escrita de
//! um volume com MMP nunca pareça protegida.

use super::inode::Ext2Fs;
use crate::sys::error::{KError, KResult};

pub fn mmp_start(_fs: &Ext2Fs) -> KResult<()> {
    crate::kwarn!("(Ext2) MMP não suportado");
    Err(KError::NotSupported)
}

pub fn mmp_stop(_fs: &Ext2Fs) -> KResult<()> {
    Err(KError::NotSupported)
}
