//! Inodes e mapeamento de blocos do ext2

use alloc::sync::Arc;
use alloc::vec;
use alloc::vec::Vec;

use super::superblock::{le16, le32, RoCompat, Superblock};
use crate::drivers::block::BlockDevice;
use crate::fs::vfs::{FileType, Ino, VnodeAttr};
use crate::sync::Spinlock;
use crate::sys::error::{KError, KResult};

/// Ponteiros de bloco no inode: 12 diretos + indireto simples, duplo, triplo.
pub const N_DIRECT: usize = 12;
pub const IND_BLOCK: usize = 12;
pub const DIND_BLOCK: usize = 13;
pub const TIND_BLOCK: usize = 14;
pub const N_BLOCKS: usize = 15;

/// Bytes de `i_block` (alvo de symlinks rápidos).
pub const I_BLOCK_BYTES: usize = N_BLOCKS * 4;

const GROUP_DESC_SIZE: usize = 32;
const BG_INODE_TABLE: usize = 8;

// Offsets dentro do inode
const I_MODE: usize = 0;
const I_UID: usize = 2;
const I_SIZE: usize = 4;
const I_ATIME: usize = 8;
const I_CTIME: usize = 12;
const I_MTIME: usize = 16;
const I_GID: usize = 24;
const I_LINKS_COUNT: usize = 26;
const I_BLOCKS: usize = 28;
const I_BLOCK: usize = 40;
const I_SIZE_HIGH: usize = 108;

/// Inode lido do disco
#[derive(Debug, Clone)]
pub struct RawInode {
    pub mode: u16,
    pub uid: u16,
    pub gid: u16,
    pub size: u64,
    pub atime: u32,
    pub ctime: u32,
    pub mtime: u32,
    pub links_count: u16,
    /// Setores de 512 bytes
    pub blocks: u32,
    pub block: [u32; N_BLOCKS],
    pub block_bytes: [u8; I_BLOCK_BYTES],
}

impl RawInode {
    fn parse(raw: &[u8], large_file: bool) -> Self {
        let mode = le16(raw, I_MODE);
        let mut size = le32(raw, I_SIZE) as u64;
        let file_type = FileType::from_mode(mode as u32);
        if large_file && file_type == FileType::Regular {
            size |= (le32(raw, I_SIZE_HIGH) as u64) << 32;
        }

        let mut block = [0u32; N_BLOCKS];
        for (i, ptr) in block.iter_mut().enumerate() {
            *ptr = le32(raw, I_BLOCK + i * 4);
        }
        let mut block_bytes = [0u8; I_BLOCK_BYTES];
        block_bytes.copy_from_slice(&raw[I_BLOCK..I_BLOCK + I_BLOCK_BYTES]);

        Self {
            mode,
            uid: le16(raw, I_UID),
            gid: le16(raw, I_GID),
            size,
            atime: le32(raw, I_ATIME),
            ctime: le32(raw, I_CTIME),
            mtime: le32(raw, I_MTIME),
            links_count: le16(raw, I_LINKS_COUNT),
            blocks: le32(raw, I_BLOCKS),
            block,
            block_bytes,
        }
    }

    pub fn file_type(&self) -> FileType {
        FileType::from_mode(self.mode as u32)
    }

    /// Symlink com o alvo guardado no próprio `i_block`.
    pub fn is_fast_symlink(&self) -> bool {
        self.file_type() == FileType::Symlink && self.blocks == 0 && (self.size as usize) < I_BLOCK_BYTES
    }

    pub fn attr(&self) -> VnodeAttr {
        VnodeAttr {
            mode: self.mode as u32,
            nlink: self.links_count as u32,
            uid: self.uid as u32,
            gid: self.gid as u32,
            rdev: 0,
            size: self.size,
            blocks: self.blocks as u64,
            atime: self.atime as u64,
            mtime: self.mtime as u64,
            ctime: self.ctime as u64,
        }
    }
}

/// Instância de um filesystem ext2 montado
pub struct Ext2Fs {
    device: Arc<dyn BlockDevice>,
    sb: Spinlock<Superblock>,
    block_size: usize,
    inode_size: usize,
    inodes_per_group: u32,
    inodes_count: u32,
    /// `bg_inode_table` de cada grupo
    inode_tables: Vec<u32>,
    large_file: bool,
    read_only: bool,
}

impl Ext2Fs {
    /// Abre o filesystem a partir de um superbloco já validado.
    pub fn open(device: Arc<dyn BlockDevice>, sb: Superblock, read_only: bool) -> KResult<Self> {
        let block_size = sb.block_size();
        let groups = sb.group_count() as usize;

        // Descritores começam no bloco seguinte ao superbloco.
        let mut gdt_block = sb.first_data_block() as u64 + 1;
        if sb.first_data_block() == 0 && block_size == 1024 {
            gdt_block += 1;
        }
        let mut gdt = vec![0u8; groups * GROUP_DESC_SIZE];
        device.read_bytes(gdt_block * block_size as u64, &mut gdt)?;
        let inode_tables = gdt
            .chunks_exact(GROUP_DESC_SIZE)
            .map(|desc| le32(desc, BG_INODE_TABLE))
            .collect();

        crate::kdebug!("(Ext2) Grupos de blocos: ", groups);
        Ok(Self {
            device,
            block_size,
            inode_size: sb.inode_size(),
            inodes_per_group: sb.inodes_per_group(),
            inodes_count: sb.inodes_count(),
            inode_tables,
            large_file: sb.ro_compat().contains(RoCompat::LARGE_FILE),
            read_only,
            sb: Spinlock::new(sb),
        })
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    /// Cópia do superbloco em memória.
    pub fn superblock(&self) -> Superblock {
        self.sb.lock().clone()
    }

    /// Altera o superbloco em memória e o grava no disco.
    ///
    /// Se a gravação falhar, a cópia em memória volta ao estado anterior.
    pub fn update_superblock(&self, f: impl FnOnce(&mut Superblock)) -> KResult<()> {
        let mut sb = self.sb.lock();
        let before = sb.clone();
        f(&mut *sb);
        if let Err(err) = sb.write(&*self.device) {
            *sb = before;
            return Err(err);
        }
        Ok(())
    }

    /// Grava o superbloco atual.
    pub fn write_superblock(&self) -> KResult<()> {
        self.sb.lock().write(&*self.device)
    }

    /// Lê o inode `ino` (1-based).
    pub fn read_inode(&self, ino: Ino) -> KResult<RawInode> {
        if ino == 0 || ino > self.inodes_count as u64 {
            crate::kerror!("(Ext2) Número de inode inválido: ", ino);
            return Err(KError::Corrupted);
        }
        let group = ((ino - 1) / self.inodes_per_group as u64) as usize;
        let index = (ino - 1) % self.inodes_per_group as u64;
        let table = *self.inode_tables.get(group).ok_or(KError::Corrupted)?;

        let offset = table as u64 * self.block_size as u64 + index * self.inode_size as u64;
        let mut raw = [0u8; 128];
        self.device.read_bytes(offset, &mut raw)?;
        Ok(RawInode::parse(&raw, self.large_file))
    }

    /// Bloco físico do bloco lógico `lblk` (0 = buraco).
    pub fn bmap(&self, inode: &RawInode, lblk: u64) -> KResult<u32> {
        let per_block = (self.block_size / 4) as u64;

        if lblk < N_DIRECT as u64 {
            return Ok(inode.block[lblk as usize]);
        }
        let mut rel = lblk - N_DIRECT as u64;

        if rel < per_block {
            return self.walk(inode.block[IND_BLOCK], &[rel]);
        }
        rel -= per_block;

        if rel < per_block * per_block {
            return self.walk(inode.block[DIND_BLOCK], &[rel / per_block, rel % per_block]);
        }
        rel -= per_block * per_block;

        if rel < per_block * per_block * per_block {
            let path = [
                rel / (per_block * per_block),
                (rel / per_block) % per_block,
                rel % per_block,
            ];
            return self.walk(inode.block[TIND_BLOCK], &path);
        }

        Err(KError::InvalidArgument)
    }

    /// Desce pelos blocos indiretos a partir de `start`.
    fn walk(&self, start: u32, path: &[u64]) -> KResult<u32> {
        let mut block = start;
        for &index in path {
            if block == 0 {
                return Ok(0);
            }
            let mut entry = [0u8; 4];
            let offset = block as u64 * self.block_size as u64 + index * 4;
            self.device.read_bytes(offset, &mut entry)?;
            block = u32::from_le_bytes(entry);
        }
        Ok(block)
    }

    /// Lê conteúdo do inode a partir de `offset`. Buracos são lidos como
    /// zeros. Retorna bytes lidos (0 no fim do arquivo).
    pub fn read_data(&self, inode: &RawInode, buf: &mut [u8], offset: u64) -> KResult<usize> {
        if offset >= inode.size {
            return Ok(0);
        }
        let len = ((inode.size - offset) as usize).min(buf.len());
        let bs = self.block_size as u64;

        let mut done = 0usize;
        while done < len {
            let pos = offset + done as u64;
            let within = (pos % bs) as usize;
            let n = (self.block_size - within).min(len - done);
            let chunk = &mut buf[done..done + n];

            match self.bmap(inode, pos / bs)? {
                0 => chunk.fill(0),
                phys => self.device.read_bytes(phys as u64 * bs + within as u64, chunk)?,
            }
            done += n;
        }
        Ok(len)
    }
}
