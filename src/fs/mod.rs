//! Sistema de Arquivos Virtual (VFS).
//!
//! Submódulos:
//! - `vfs`: vnodes, mounts, resolução de caminhos.
//! - `ext2`: driver ext2 (exemplo de cliente do contrato do VFS).

pub mod config;
pub mod ext2;
pub mod vfs;


#[cfg(test)]
mod tests;

use spin::Once;

use crate::sys::error::KResult;
use vfs::Vfs;

/// VFS global, criado uma única vez no boot.
static VFS: Once<Vfs> = Once::new();

/// Inicializa o subsistema de arquivos: cria o vnode raiz `/` e registra
/// os filesystems padrão. Chamadas seguintes retornam a mesma instância.
pub fn init() -> KResult<&'static Vfs> {
    VFS.try_call_once(|| {
        crate::kinfo!("(VFS) Inicializando subsistema de arquivos...");
        let vfs = Vfs::new()?;
        vfs.register_filesystem("ext2", &ext2::EXT2_MOUNT_OPS)?;
        Ok(vfs)
    })
}

/// VFS global (`None` antes de [`init`]).
pub fn vfs() -> Option<&'static Vfs> {
    VFS.get()
}
