//! # Kernel Driver Layer
//!
//! O substrato só conhece dispositivos de bloco: é o que os filesystems
//! montam. Drivers de hardware concretos (ATA, VirtIO, NVMe) ficam fora
//! deste crate e implementam [`block::BlockDevice`].

pub mod block;
