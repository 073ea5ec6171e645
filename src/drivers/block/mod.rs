//! # Dispositivos de Bloco
//!
//! Camada de abstração para dispositivos de bloco.
//!
//! ## Dispositivos Suportados
//!
//! | Driver      | Status      | Descrição                    |
//! |-------------|-------------|------------------------------|
//! | Ramdisk     | Funcional   | Disco em memória / imagens   |

pub mod ramdisk;
pub mod traits;


pub use ramdisk::RamDisk;
pub use traits::{BlockDevice, BlockError};
