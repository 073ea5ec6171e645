//! Testes do sistema de arquivos (host)
//!
//! - `image.rs` - Gerador de imagens ext2 mínimas
//! - `vfs.rs` - Mount, unmount e `namei` com drivers de teste
//! - `ext2.rs` - Driver ext2 sobre um `RamDisk`

mod ext2;
mod image;
