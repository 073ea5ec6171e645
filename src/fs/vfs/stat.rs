//! Atributos de vnode e entradas de diretório

use alloc::string::String;

use crate::core::object::Koid;

/// Número de inode
pub type Ino = u64;

/// Máscara do tipo de arquivo dentro de `mode`.
pub const S_IFMT: u32 = 0o170000;
pub const S_IFSOCK: u32 = 0o140000;
pub const S_IFLNK: u32 = 0o120000;
pub const S_IFREG: u32 = 0o100000;
pub const S_IFBLK: u32 = 0o060000;
pub const S_IFDIR: u32 = 0o040000;
pub const S_IFCHR: u32 = 0o020000;
pub const S_IFIFO: u32 = 0o010000;

/// Tipo de arquivo
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    Regular,
    Directory,
    Symlink,
    CharDevice,
    BlockDevice,
    Fifo,
    Socket,
    Unknown,
}

impl FileType {
    /// Extrai o tipo dos bits `S_IFMT` de um `mode`.
    pub fn from_mode(mode: u32) -> Self {
        match mode & S_IFMT {
            S_IFREG => FileType::Regular,
            S_IFDIR => FileType::Directory,
            S_IFLNK => FileType::Symlink,
            S_IFCHR => FileType::CharDevice,
            S_IFBLK => FileType::BlockDevice,
            S_IFIFO => FileType::Fifo,
            S_IFSOCK => FileType::Socket,
            _ => FileType::Unknown,
        }
    }

    /// Bits `S_IFMT` correspondentes.
    pub fn mode_bits(self) -> u32 {
        match self {
            FileType::Regular => S_IFREG,
            FileType::Directory => S_IFDIR,
            FileType::Symlink => S_IFLNK,
            FileType::CharDevice => S_IFCHR,
            FileType::BlockDevice => S_IFBLK,
            FileType::Fifo => S_IFIFO,
            FileType::Socket => S_IFSOCK,
            FileType::Unknown => 0,
        }
    }
}

/// Atributos guardados no vnode (preenchidos pelo driver na criação).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VnodeAttr {
    /// Tipo + permissões
    pub mode: u32,
    pub nlink: u32,
    pub uid: u32,
    pub gid: u32,
    /// Dispositivo representado (nós de dispositivo)
    pub rdev: u64,
    /// Tamanho em bytes
    pub size: u64,
    /// Blocos de 512 bytes alocados
    pub blocks: u64,
    /// Timestamps (segundos)
    pub atime: u64,
    pub mtime: u64,
    pub ctime: u64,
}

impl VnodeAttr {
    /// Diretório vazio `rwxr-xr-x`.
    pub const fn directory() -> Self {
        Self {
            mode: S_IFDIR | 0o755,
            nlink: 2,
            uid: 0,
            gid: 0,
            rdev: 0,
            size: 0,
            blocks: 0,
            atime: 0,
            mtime: 0,
            ctime: 0,
        }
    }

    pub fn file_type(&self) -> FileType {
        FileType::from_mode(self.mode)
    }
}

/// Resultado de `getattr`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stat {
    /// Mount dono do vnode
    pub dev: Koid,
    pub ino: Ino,
    pub mode: u32,
    pub nlink: u32,
    pub uid: u32,
    pub gid: u32,
    pub rdev: u64,
    pub size: u64,
    pub blocks: u64,
    /// Tamanho de bloco preferido para I/O
    pub blksize: u32,
    pub atime: u64,
    pub mtime: u64,
    pub ctime: u64,
}

/// Tamanho de bloco reportado quando o driver não refina.
pub const DEFAULT_BLKSIZE: u32 = 512;

impl Stat {
    pub fn from_attr(dev: Koid, ino: Ino, attr: &VnodeAttr) -> Self {
        Self {
            dev,
            ino,
            mode: attr.mode,
            nlink: attr.nlink,
            uid: attr.uid,
            gid: attr.gid,
            rdev: attr.rdev,
            size: attr.size,
            blocks: attr.blocks,
            blksize: DEFAULT_BLKSIZE,
            atime: attr.atime,
            mtime: attr.mtime,
            ctime: attr.ctime,
        }
    }

    pub fn file_type(&self) -> FileType {
        FileType::from_mode(self.mode)
    }
}

/// Entrada de diretório
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub name: String,
    pub ino: Ino,
    pub file_type: FileType,
}
