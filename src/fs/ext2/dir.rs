//! Diretórios do ext2
//!
//! Registros encadeados por `rec_len` dentro de cada bloco:
//!
//! ```text
//! +0 inode (u32) | +4 rec_len (u16) | +6 name_len (u8) | +7 file_type (u8) | +8 nome
//! ```
//!
//! Sem a feature FILETYPE, `name_len` ocupa os dois bytes e o tipo vem do
//! inode. Registros com `inode == 0` são entradas apagadas.

use alloc::string::String;

use super::inode::{Ext2Fs, RawInode};
use super::superblock::{le16, le32};
use crate::fs::config::NAME_MAX;
use crate::fs::vfs::{DirEntry, FileType, Ino};
use crate::sys::error::{KError, KResult};

const DIRENT_HEADER: usize = 8;

fn file_type_of(code: u8) -> FileType {
    match code {
        1 => FileType::Regular,
        2 => FileType::Directory,
        3 => FileType::CharDevice,
        4 => FileType::BlockDevice,
        5 => FileType::Fifo,
        6 => FileType::Socket,
        7 => FileType::Symlink,
        _ => FileType::Unknown,
    }
}

/// Entrada no cursor `offset` (pulando apagadas) e o cursor da próxima.
pub fn read_entry(
    fs: &Ext2Fs,
    dir: &RawInode,
    mut offset: u64,
    has_filetype: bool,
) -> KResult<Option<(DirEntry, u64)>> {
    let bs = fs.block_size() as u64;

    while offset < dir.size {
        let within = (offset % bs) as usize;
        if fs.block_size() - within < DIRENT_HEADER {
            crate::kerror!("(Ext2) Entrada de diretório cruza o bloco, off=", offset);
            return Err(KError::Corrupted);
        }

        let mut header = [0u8; DIRENT_HEADER];
        fs.read_data(dir, &mut header, offset)?;
        let ino = le32(&header, 0);
        let rec_len = le16(&header, 4) as usize;
        let (name_len, type_code) = if has_filetype {
            (header[6] as usize, header[7])
        } else {
            (le16(&header, 6) as usize, 0)
        };

        if rec_len < DIRENT_HEADER
            || rec_len % 4 != 0
            || within + rec_len > fs.block_size()
            || DIRENT_HEADER + name_len > rec_len
            || name_len > NAME_MAX
        {
            crate::kerror!("(Ext2) rec_len inválido: ", rec_len);
            return Err(KError::Corrupted);
        }
        let next = offset + rec_len as u64;

        if ino == 0 {
            offset = next;
            continue;
        }

        let mut name = [0u8; NAME_MAX];
        let name = &mut name[..name_len];
        fs.read_data(dir, name, offset + DIRENT_HEADER as u64)?;
        let name = String::from_utf8_lossy(name).into_owned();

        let file_type = if has_filetype {
            file_type_of(type_code)
        } else {
            fs.read_inode(ino as Ino)?.file_type()
        };

        return Ok(Some((
            DirEntry {
                name,
                ino: ino as Ino,
                file_type,
            },
            next,
        )));
    }
    Ok(None)
}

/// Procura `name` no diretório. Retorna o número do inode.
pub fn find(fs: &Ext2Fs, dir: &RawInode, name: &str, has_filetype: bool) -> KResult<Option<Ino>> {
    let mut offset = 0;
    while let Some((entry, next)) = read_entry(fs, dir, offset, has_filetype)? {
        if entry.name == name {
            return Ok(Some(entry.ino));
        }
        offset = next;
    }
    Ok(None)
}
