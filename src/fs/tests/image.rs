//! Imagem ext2 mínima para testes
//!
//! ```text
//! bloco 0      boot
//! bloco 1      superbloco
//! bloco 2      descritores de grupo
//! bloco 5..6   tabela de inodes (16 x 128 bytes)
//! bloco 7      diretório raiz (inode 2)
//! bloco 8      hello.txt (inode 12)
//! bloco 9      sub/ (inode 13)
//! bloco 10..21 big.bin diretos (inode 15)
//! bloco 22     big.bin indireto simples -> 23, 24
//! ```
//!
//! `link` (inode 14) é um symlink rápido para `hello.txt`.

use std::vec;
use std::vec::Vec;

pub const BLOCK_SIZE: usize = 1024;
pub const BLOCKS: usize = 64;

pub const HELLO_INO: u32 = 12;
pub const SUB_INO: u32 = 13;
pub const LINK_INO: u32 = 14;
pub const BIG_INO: u32 = 15;

pub const HELLO: &[u8] = b"Hello, ext2!\n";
pub const LINK_TARGET: &[u8] = b"hello.txt";
pub const BIG_BLOCKS: usize = 14;

const INODE_TABLE: usize = 5;
const ROOT_BLOCK: usize = 7;
const HELLO_BLOCK: usize = 8;
const SUB_BLOCK: usize = 9;
const BIG_FIRST: usize = 10;
const BIG_INDIRECT: usize = 22;

const S_IFDIR: u16 = 0o040000;
const S_IFREG: u16 = 0o100000;
const S_IFLNK: u16 = 0o120000;

/// Byte `i` do arquivo `big.bin`: identifica o bloco lógico e a posição.
pub fn big_byte(i: usize) -> u8 {
    ((i / BLOCK_SIZE) as u8).wrapping_mul(16) ^ (i % 251) as u8
}

fn put16(img: &mut [u8], off: usize, v: u16) {
    img[off..off + 2].copy_from_slice(&v.to_le_bytes());
}

fn put32(img: &mut [u8], off: usize, v: u32) {
    img[off..off + 4].copy_from_slice(&v.to_le_bytes());
}

struct InodeDesc {
    mode: u16,
    size: u32,
    links: u16,
    sectors: u32,
    block: [u32; 15],
}

fn put_inode(img: &mut [u8], ino: u32, desc: &InodeDesc) {
    let off = INODE_TABLE * BLOCK_SIZE + (ino as usize - 1) * 128;
    put16(img, off, desc.mode);
    put32(img, off + 4, desc.size);
    put32(img, off + 8, 1_700_000_000);
    put32(img, off + 12, 1_700_000_000);
    put32(img, off + 16, 1_700_000_000);
    put16(img, off + 26, desc.links);
    put32(img, off + 28, desc.sectors);
    for (i, b) in desc.block.iter().enumerate() {
        put32(img, off + 40 + i * 4, *b);
    }
}

/// Escreve entradas de diretório; a última ocupa o resto do bloco.
fn put_dir(img: &mut [u8], block: usize, entries: &[(u32, &str, u8)]) {
    let base = block * BLOCK_SIZE;
    let mut pos = 0;
    for (i, (ino, name, ftype)) in entries.iter().enumerate() {
        let min = (8 + name.len() + 3) & !3;
        let rec_len = if i + 1 == entries.len() { BLOCK_SIZE - pos } else { min };
        let off = base + pos;
        put32(img, off, *ino);
        put16(img, off + 4, rec_len as u16);
        img[off + 6] = name.len() as u8;
        img[off + 7] = *ftype;
        img[off + 8..off + 8 + name.len()].copy_from_slice(name.as_bytes());
        pos += rec_len;
    }
}

/// Opções da imagem gerada.
pub struct Image {
    pub magic: u16,
    pub incompat: u32,
    pub ro_compat: u32,
    pub state: u16,
}

impl Default for Image {
    fn default() -> Self {
        Self {
            magic: 0xEF53,
            incompat: 0x0002,
            ro_compat: 0,
            state: 1,
        }
    }
}

impl Image {
    pub fn with_mmp(mut self) -> Self {
        self.incompat |= 0x0100;
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let mut img = vec![0u8; BLOCKS * BLOCK_SIZE];

        // Superbloco
        let sb = 1024;
        put32(&mut img, sb, 16);
        put32(&mut img, sb + 4, BLOCKS as u32);
        put32(&mut img, sb + 20, 1);
        put32(&mut img, sb + 24, 0);
        put32(&mut img, sb + 32, 8192);
        put32(&mut img, sb + 36, 8192);
        put32(&mut img, sb + 40, 16);
        put16(&mut img, sb + 52, 3);
        put16(&mut img, sb + 54, 20);
        put16(&mut img, sb + 56, self.magic);
        put16(&mut img, sb + 58, self.state);
        put32(&mut img, sb + 76, 1);
        put32(&mut img, sb + 84, 11);
        put16(&mut img, sb + 88, 128);
        put32(&mut img, sb + 96, self.incompat);
        put32(&mut img, sb + 100, self.ro_compat);

        // Descritor do grupo 0
        let gd = 2 * BLOCK_SIZE;
        put32(&mut img, gd, 3);
        put32(&mut img, gd + 4, 4);
        put32(&mut img, gd + 8, INODE_TABLE as u32);

        let dir_block = |b: usize| {
            let mut block = [0u32; 15];
            block[0] = b as u32;
            block
        };

        put_inode(
            &mut img,
            2,
            &InodeDesc {
                mode: S_IFDIR | 0o755,
                size: BLOCK_SIZE as u32,
                links: 4,
                sectors: 2,
                block: dir_block(ROOT_BLOCK),
            },
        );
        put_dir(
            &mut img,
            ROOT_BLOCK,
            &[
                (2, ".", 2),
                (2, "..", 2),
                (HELLO_INO, "hello.txt", 1),
                (SUB_INO, "sub", 2),
                (LINK_INO, "link", 7),
                (BIG_INO, "big.bin", 1),
            ],
        );

        put_inode(
            &mut img,
            HELLO_INO,
            &InodeDesc {
                mode: S_IFREG | 0o644,
                size: HELLO.len() as u32,
                links: 1,
                sectors: 2,
                block: dir_block(HELLO_BLOCK),
            },
        );
        let hello = HELLO_BLOCK * BLOCK_SIZE;
        img[hello..hello + HELLO.len()].copy_from_slice(HELLO);

        put_inode(
            &mut img,
            SUB_INO,
            &InodeDesc {
                mode: S_IFDIR | 0o755,
                size: BLOCK_SIZE as u32,
                links: 2,
                sectors: 2,
                block: dir_block(SUB_BLOCK),
            },
        );
        // Entrada apagada (inode 0) no meio do diretório.
        put_dir(
            &mut img,
            SUB_BLOCK,
            &[(SUB_INO, ".", 2), (2, "..", 2), (0, "gone", 1)],
        );

        let mut link_block = [0u32; 15];
        let mut target = [0u8; 60];
        target[..LINK_TARGET.len()].copy_from_slice(LINK_TARGET);
        for (i, chunk) in target.chunks_exact(4).enumerate() {
            link_block[i] = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        }
        put_inode(
            &mut img,
            LINK_INO,
            &InodeDesc {
                mode: S_IFLNK | 0o777,
                size: LINK_TARGET.len() as u32,
                links: 1,
                sectors: 0,
                block: link_block,
            },
        );

        let mut big_block = [0u32; 15];
        for (i, ptr) in big_block.iter_mut().take(12).enumerate() {
            *ptr = (BIG_FIRST + i) as u32;
        }
        big_block[12] = BIG_INDIRECT as u32;
        put32(&mut img, BIG_INDIRECT * BLOCK_SIZE, 23);
        put32(&mut img, BIG_INDIRECT * BLOCK_SIZE + 4, 24);
        put_inode(
            &mut img,
            BIG_INO,
            &InodeDesc {
                mode: S_IFREG | 0o644,
                size: (BIG_BLOCKS * BLOCK_SIZE) as u32,
                links: 1,
                sectors: ((BIG_BLOCKS + 1) * 2) as u32,
                block: big_block,
            },
        );
        let physical = (BIG_FIRST..BIG_FIRST + 12).chain([23, 24]);
        for (lblk, phys) in physical.enumerate() {
            for j in 0..BLOCK_SIZE {
                img[phys * BLOCK_SIZE + j] = big_byte(lblk * BLOCK_SIZE + j);
            }
        }

        img
    }
}
