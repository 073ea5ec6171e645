//! Superbloco do ext2
//!
//! Mantido como imagem crua de 1024 bytes: os campos são lidos e escritos
//! em little-endian direto no buffer, então a gravação de volta preserva
//! tudo que o driver não interpreta.

use bitflags::bitflags;

use crate::drivers::block::BlockDevice;
use crate::sys::error::{KError, KResult};

/// Offset do superbloco no dispositivo.
pub const SUPERBLOCK_OFFSET: u64 = 1024;
pub const SUPERBLOCK_SIZE: usize = 1024;

pub const EXT2_MAGIC: u16 = 0xEF53;

/// Revisões suportadas
pub const GOOD_OLD_REV: u32 = 0;
pub const DYNAMIC_REV: u32 = 1;

pub const GOOD_OLD_INODE_SIZE: usize = 128;
pub const MIN_BLOCK_LOG_SIZE: u32 = 10;
pub const MAX_BLOCK_LOG_SIZE: u32 = 16;

// Offsets dos campos usados
const S_INODES_COUNT: usize = 0;
const S_BLOCKS_COUNT: usize = 4;
const S_FIRST_DATA_BLOCK: usize = 20;
const S_LOG_BLOCK_SIZE: usize = 24;
const S_BLOCKS_PER_GROUP: usize = 32;
const S_INODES_PER_GROUP: usize = 40;
const S_MNT_COUNT: usize = 52;
pub const S_MAGIC: usize = 56;
const S_STATE: usize = 58;
const S_REV_LEVEL: usize = 76;
const S_INODE_SIZE: usize = 88;
const S_FEATURE_COMPAT: usize = 92;
const S_FEATURE_INCOMPAT: usize = 96;
const S_FEATURE_RO_COMPAT: usize = 100;

bitflags! {
    /// Features incompatíveis: o driver não pode montar sem entendê-las.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Incompat: u32 {
        const COMPRESSION = 0x0001;
        const FILETYPE = 0x0002;
        const RECOVER = 0x0004;
        const JOURNAL_DEV = 0x0008;
        const META_BG = 0x0010;
        const EXTENTS = 0x0040;
        const BIT64 = 0x0080;
        const MMP = 0x0100;
        const FLEX_BG = 0x0200;
    }
}

bitflags! {
    /// Features que só impedem montagem de escrita.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct RoCompat: u32 {
        const SPARSE_SUPER = 0x0001;
        const LARGE_FILE = 0x0002;
        const BTREE_DIR = 0x0004;
    }
}

bitflags! {
    /// `s_state`
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct FsState: u16 {
        /// Desmontado de forma limpa
        const VALID = 0x0001;
        const ERROR = 0x0002;
    }
}

pub const INCOMPAT_SUPPORTED: Incompat = Incompat::FILETYPE.union(Incompat::MMP);
pub const RO_COMPAT_SUPPORTED: RoCompat = RoCompat::SPARSE_SUPER.union(RoCompat::LARGE_FILE);

pub(super) fn le16(buf: &[u8], off: usize) -> u16 {
    u16::from_le_bytes([buf[off], buf[off + 1]])
}

pub(super) fn le32(buf: &[u8], off: usize) -> u32 {
    u32::from_le_bytes([buf[off], buf[off + 1], buf[off + 2], buf[off + 3]])
}

fn put16(buf: &mut [u8], off: usize, value: u16) {
    buf[off..off + 2].copy_from_slice(&value.to_le_bytes());
}

/// Superbloco em memória
#[derive(Clone)]
pub struct Superblock {
    raw: [u8; SUPERBLOCK_SIZE],
}

impl Superblock {
    /// Lê o superbloco de `device`.
    pub fn read(device: &dyn BlockDevice) -> KResult<Self> {
        let mut raw = [0u8; SUPERBLOCK_SIZE];
        device.read_bytes(SUPERBLOCK_OFFSET, &mut raw)?;
        Ok(Self { raw })
    }

    /// Grava o superbloco de volta em `device`.
    pub fn write(&self, device: &dyn BlockDevice) -> KResult<()> {
        device.write_bytes(SUPERBLOCK_OFFSET, &self.raw)?;
        Ok(())
    }

    pub fn inodes_count(&self) -> u32 {
        le32(&self.raw, S_INODES_COUNT)
    }

    pub fn blocks_count(&self) -> u32 {
        le32(&self.raw, S_BLOCKS_COUNT)
    }

    pub fn first_data_block(&self) -> u32 {
        le32(&self.raw, S_FIRST_DATA_BLOCK)
    }

    pub fn log_block_size(&self) -> u32 {
        le32(&self.raw, S_LOG_BLOCK_SIZE)
    }

    pub fn block_size(&self) -> usize {
        1024usize << self.log_block_size()
    }

    pub fn blocks_per_group(&self) -> u32 {
        le32(&self.raw, S_BLOCKS_PER_GROUP)
    }

    pub fn inodes_per_group(&self) -> u32 {
        le32(&self.raw, S_INODES_PER_GROUP)
    }

    pub fn mnt_count(&self) -> u16 {
        le16(&self.raw, S_MNT_COUNT)
    }

    pub fn set_mnt_count(&mut self, count: u16) {
        put16(&mut self.raw, S_MNT_COUNT, count);
    }

    pub fn magic(&self) -> u16 {
        le16(&self.raw, S_MAGIC)
    }

    pub fn state(&self) -> FsState {
        FsState::from_bits_retain(le16(&self.raw, S_STATE))
    }

    pub fn set_state(&mut self, state: FsState) {
        put16(&mut self.raw, S_STATE, state.bits());
    }

    pub fn rev_level(&self) -> u32 {
        le32(&self.raw, S_REV_LEVEL)
    }

    pub fn inode_size(&self) -> usize {
        if self.rev_level() == GOOD_OLD_REV {
            GOOD_OLD_INODE_SIZE
        } else {
            le16(&self.raw, S_INODE_SIZE) as usize
        }
    }

    pub fn feature_compat(&self) -> u32 {
        le32(&self.raw, S_FEATURE_COMPAT)
    }

    pub fn incompat(&self) -> Incompat {
        Incompat::from_bits_retain(le32(&self.raw, S_FEATURE_INCOMPAT))
    }

    pub fn ro_compat(&self) -> RoCompat {
        RoCompat::from_bits_retain(le32(&self.raw, S_FEATURE_RO_COMPAT))
    }

    /// Número de grupos de blocos.
    pub fn group_count(&self) -> u32 {
        let data_blocks = self.blocks_count() - self.first_data_block();
        data_blocks.div_ceil(self.blocks_per_group())
    }

    /// Verificações de sanidade contra um dispositivo de `device_bytes`
    /// bytes. Qualquer inconsistência é `Corrupted`.
    pub fn validate(&self, device_bytes: u64) -> KResult<()> {
        if self.magic() != EXT2_MAGIC {
            crate::kerror!("(Ext2) Magic inválido: ", self.magic());
            return Err(KError::Corrupted);
        }
        if self.rev_level() > DYNAMIC_REV {
            crate::kerror!("(Ext2) Revisão não suportada: ", self.rev_level());
            return Err(KError::Corrupted);
        }
        if self.log_block_size() > MAX_BLOCK_LOG_SIZE - MIN_BLOCK_LOG_SIZE {
            crate::kerror!("(Ext2) Tamanho de bloco inválido, log=", self.log_block_size());
            return Err(KError::Corrupted);
        }

        let fs_bytes = self.blocks_count() as u64 * self.block_size() as u64;
        if fs_bytes > device_bytes {
            crate::kerror!("(Ext2) blocks_count além do fim do dispositivo: ", self.blocks_count());
            return Err(KError::Corrupted);
        }

        let inode_size = self.inode_size();
        if inode_size < GOOD_OLD_INODE_SIZE
            || inode_size > self.block_size()
            || !inode_size.is_power_of_two()
        {
            crate::kerror!("(Ext2) Tamanho de inode inválido: ", inode_size);
            return Err(KError::Corrupted);
        }

        if self.inodes_per_group() == 0
            || self.blocks_per_group() == 0
            || self.first_data_block() >= self.blocks_count()
        {
            crate::kerror!("(Ext2) Geometria de grupos inválida");
            return Err(KError::Corrupted);
        }

        let groups = self.group_count() as u64;
        if groups * self.inodes_per_group() as u64 != self.inodes_count() as u64 {
            crate::kerror!("(Ext2) inodes_count não bate com os grupos: ", self.inodes_count());
            return Err(KError::Corrupted);
        }
        Ok(())
    }

    /// Rejeita features que o driver não implementa.
    pub fn check_features(&self, read_only: bool) -> KResult<()> {
        let unknown = self.incompat().difference(INCOMPAT_SUPPORTED);
        if !unknown.is_empty() {
            crate::kerror!("(Ext2) Features incompatíveis: ", unknown.bits());
            return Err(KError::NotSupported);
        }
        let unknown_ro = self.ro_compat().difference(RO_COMPAT_SUPPORTED);
        if !read_only && !unknown_ro.is_empty() {
            crate::kerror!("(Ext2) Features ro_compat exigem montagem RO: ", unknown_ro.bits());
            return Err(KError::NotSupported);
        }
        Ok(())
    }
}
