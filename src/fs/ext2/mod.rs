//! # Ext2
//!
//! Driver ext2 (somente leitura de dados) sobre um [`BlockDevice`].
//!
//! ## Montagem
//!
//! 1. Lê e valida o superbloco (byte 1024).
//! 2. Rejeita features desconhecidas; MMP em montagem de escrita falha.
//! 3. Lê o inode raiz (2) e cria o root vnode.
//! 4. Montagem de escrita: `mnt_count += 1`, limpa VALID e grava o
//!    superbloco. Só então o root vnode é anexado ao mount.
//!
//! O `Ext2Fs` é compartilhado por `KRef` entre o mount (estado privado) e
//! cada vnode, então sobrevive enquanto houver vnodes abertos.

pub mod dir;
pub mod inode;
pub mod mmp;
pub mod superblock;

use crate::core::object::KRef;
use crate::drivers::block::BlockDevice;
use crate::fs::vfs::{DirEntry, FileType, Mount, MountFlags, MountOps, Stat, Vnode, VnodeOps};
use crate::sys::error::{KError, KResult};

use inode::{Ext2Fs, RawInode};
use superblock::{FsState, Incompat, Superblock, EXT2_MAGIC, SUPERBLOCK_OFFSET};

/// Inode do diretório raiz
pub const ROOT_INO: u64 = 2;

/// Estado por vnode
struct Ext2Node {
    fs: KRef<Ext2Fs>,
    inode: RawInode,
}

fn node(vp: &Vnode) -> KResult<&Ext2Node> {
    vp.data::<Ext2Node>().ok_or_else(|| {
        crate::kerror!("(Ext2) Vnode sem estado ext2, ino=", vp.ino());
        KError::InvalidArgument
    })
}

fn has_filetype(fs: &Ext2Fs) -> bool {
    fs.superblock().incompat().contains(Incompat::FILETYPE)
}

// =============================================================================
// MOUNT OPS
// =============================================================================

pub struct Ext2MountOps;

pub static EXT2_MOUNT_OPS: Ext2MountOps = Ext2MountOps;

impl MountOps for Ext2MountOps {
    fn mount(&self, mp: &Mount, flags: MountFlags) -> KResult<()> {
        let device = mp.device().ok_or(KError::InvalidArgument)?.clone();

        let sb = Superblock::read(&*device)?;
        sb.validate(device.size_bytes())?;
        let read_only = flags.contains(MountFlags::RDONLY) || device.is_read_only();
        sb.check_features(read_only)?;
        crate::kdebug!("(Ext2) features compat=", sb.feature_compat());

        let fs = Ext2Fs::open(device, sb, read_only)?;
        if !read_only && fs.superblock().incompat().contains(Incompat::MMP) {
            if let Err(err) = mmp::mmp_start(&fs) {
                let _ = mmp::mmp_stop(&fs);
                return Err(err);
            }
        }

        let root_inode = fs.read_inode(ROOT_INO)?;
        if root_inode.file_type() != FileType::Directory {
            crate::kerror!("(Ext2) Inode raiz não é diretório");
            return Err(KError::Corrupted);
        }

        let fs = KRef::new(fs)?;
        let root = mp
            .new_vnode(ROOT_INO, &EXT2_VNODE_OPS)
            .with_attr(root_inode.attr())
            .with_name("/")
            .with_data(Ext2Node {
                fs: fs.clone(),
                inode: root_inode,
            })
            .into_ref()?;

        if !read_only {
            fs.update_superblock(|sb| {
                sb.set_mnt_count(sb.mnt_count().wrapping_add(1));
                sb.set_state(sb.state().difference(FsState::VALID));
            })?;
        }

        crate::kinfo!("(Ext2) Montado, block_size=", fs.block_size());
        mp.set_private(fs);
        mp.set_root(&root);
        Ok(())
    }

    fn unmount(&self, mp: &Mount, _flags: MountFlags) -> KResult<()> {
        let Some(fs) = mp.private::<KRef<Ext2Fs>>() else {
            return Ok(());
        };

        if !fs.is_read_only() {
            fs.update_superblock(|sb| sb.set_state(sb.state().union(FsState::VALID)))?;
        }

        mp.clear_root();
        drop(mp.take_private());
        crate::kinfo!("(Ext2) Desmontado");
        Ok(())
    }

    fn check(&self, device: &dyn BlockDevice) -> bool {
        let mut magic = [0u8; 2];
        let offset = SUPERBLOCK_OFFSET + superblock::S_MAGIC as u64;
        device.read_bytes(offset, &mut magic).is_ok() && u16::from_le_bytes(magic) == EXT2_MAGIC
    }

    fn flush(&self, mp: &Mount) -> KResult<()> {
        match mp.private::<KRef<Ext2Fs>>() {
            Some(fs) if !fs.is_read_only() => fs.write_superblock(),
            _ => Ok(()),
        }
    }
}

// =============================================================================
// VNODE OPS
// =============================================================================

pub struct Ext2VnodeOps;

pub static EXT2_VNODE_OPS: Ext2VnodeOps = Ext2VnodeOps;

impl VnodeOps for Ext2VnodeOps {
    fn lookup(&self, dvp: &Vnode, name: &str) -> KResult<KRef<Vnode>> {
        let node = node(dvp)?;
        let fs = &node.fs;
        let ino = dir::find(fs, &node.inode, name, has_filetype(fs))?.ok_or(KError::NoSuchEntry)?;
        let inode = fs.read_inode(ino)?;

        crate::ktrace!("(Ext2) lookup ok, ino=", ino);
        Vnode::new(ino, &EXT2_VNODE_OPS)
            .with_mount(dvp.mount())
            .with_attr(inode.attr())
            .with_name(name)
            .with_data(Ext2Node {
                fs: fs.clone(),
                inode,
            })
            .into_ref()
    }

    fn read(&self, vp: &Vnode, buf: &mut [u8], offset: u64) -> KResult<usize> {
        let node = node(vp)?;
        node.fs.read_data(&node.inode, buf, offset)
    }

    fn readdir(&self, dvp: &Vnode, offset: u64) -> KResult<Option<(DirEntry, u64)>> {
        let node = node(dvp)?;
        dir::read_entry(&node.fs, &node.inode, offset, has_filetype(&node.fs))
    }

    fn readlink(&self, vp: &Vnode, buf: &mut [u8]) -> KResult<usize> {
        let node = node(vp)?;
        if node.inode.is_fast_symlink() {
            let len = (node.inode.size as usize).min(buf.len());
            buf[..len].copy_from_slice(&node.inode.block_bytes[..len]);
            return Ok(len);
        }
        node.fs.read_data(&node.inode, buf, 0)
    }

    fn getattr(&self, vp: &Vnode, stat: &mut Stat) -> KResult<()> {
        stat.blksize = node(vp)?.fs.block_size() as u32;
        Ok(())
    }
}
