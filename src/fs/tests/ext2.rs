use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::vec;
use std::vec::Vec;

use super::image::{self, Image, BLOCK_SIZE};
use crate::core::object::KRef;
use crate::drivers::block::{BlockDevice, BlockError, RamDisk};
use crate::fs::ext2::superblock::Superblock;
use crate::fs::ext2::{EXT2_MOUNT_OPS, ROOT_INO};
use crate::fs::vfs::{FileType, Mount, MountFlags, MountState, Vfs};
use crate::sys::error::{KError, KResult};

const SB_MNT_COUNT: usize = 1024 + 52;
const SB_STATE: usize = 1024 + 58;

fn vfs() -> Vfs {
    let vfs = Vfs::new().unwrap();
    vfs.register_filesystem("ext2", &EXT2_MOUNT_OPS).unwrap();
    vfs
}

fn disk(image: &Image) -> Arc<RamDisk> {
    Arc::new(RamDisk::from_image(image.build(), BLOCK_SIZE))
}

fn mount(vfs: &Vfs, disk: &Arc<RamDisk>, flags: MountFlags, path: &str) -> KResult<KRef<Mount>> {
    let device: Arc<dyn BlockDevice> = disk.clone();
    vfs.mount("ext2", Some(device), flags, path)
}

fn u16_at(bytes: &[u8], off: usize) -> u16 {
    u16::from_le_bytes([bytes[off], bytes[off + 1]])
}

/// Disco cujas escritas podem ser forçadas a falhar.
struct FailingDisk {
    inner: RamDisk,
    fail_writes: AtomicBool,
    fail_reads: AtomicBool,
}

impl FailingDisk {
    fn new(image: Vec<u8>) -> Self {
        Self {
            inner: RamDisk::from_image(image, BLOCK_SIZE),
            fail_writes: AtomicBool::new(false),
            fail_reads: AtomicBool::new(false),
        }
    }
}

impl BlockDevice for FailingDisk {
    fn read_block(&self, lba: u64, buf: &mut [u8]) -> Result<(), BlockError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(BlockError::IoError);
        }
        self.inner.read_block(lba, buf)
    }

    fn write_block(&self, lba: u64, buf: &[u8]) -> Result<(), BlockError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(BlockError::IoError);
        }
        self.inner.write_block(lba, buf)
    }

    fn block_size(&self) -> usize {
        self.inner.block_size()
    }

    fn total_blocks(&self) -> u64 {
        self.inner.total_blocks()
    }
}

// =============================================================================
// LEITURA
// =============================================================================

#[test]
fn test_mount_and_readdir() {
    let vfs = vfs();
    let disk = disk(&Image::default());
    let mp = mount(&vfs, &disk, MountFlags::RDONLY, "/mnt").unwrap();
    assert_eq!(mp.fstype(), "ext2");
    assert!(mp.is_read_only());

    let root = vfs.namei("/mnt", None).unwrap();
    assert_eq!(root.ino(), ROOT_INO);
    assert!(root.is_dir());

    let entries = root.readdir_all().unwrap();
    let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, [".", "..", "hello.txt", "sub", "link", "big.bin"]);
    assert_eq!(entries[2].ino, image::HELLO_INO as u64);
    assert_eq!(entries[3].file_type, FileType::Directory);
    assert_eq!(entries[4].file_type, FileType::Symlink);

    // Entradas apagadas são puladas.
    let sub = vfs.namei("/mnt/sub", None).unwrap();
    let names: Vec<_> = sub.readdir_all().unwrap().into_iter().map(|e| e.name).collect();
    assert_eq!(names, [".", ".."]);
    assert_eq!(sub.lookup("gone").unwrap_err(), KError::NoSuchEntry);

    drop((root, sub));
    vfs.unmount(&mp, MountFlags::empty()).unwrap();
}

#[test]
fn test_read_small_file() {
    let vfs = vfs();
    let disk = disk(&Image::default());
    let mp = mount(&vfs, &disk, MountFlags::RDONLY, "/mnt").unwrap();

    let file = vfs.namei("/mnt/hello.txt", None).unwrap();
    assert_eq!(file.file_type(), FileType::Regular);

    let mut buf = [0u8; 64];
    let n = file.read(&mut buf, 0).unwrap();
    assert_eq!(&buf[..n], image::HELLO);
    assert_eq!(file.read(&mut buf, 7).unwrap(), image::HELLO.len() - 7);
    assert_eq!(file.read(&mut buf, 100).unwrap(), 0);
    assert_eq!(file.write(b"x", 0).unwrap_err(), KError::NotSupported);

    let stat = file.getattr().unwrap();
    assert_eq!(stat.ino, image::HELLO_INO as u64);
    assert_eq!(stat.size, image::HELLO.len() as u64);
    assert_eq!(stat.blksize, BLOCK_SIZE as u32);
    assert_eq!(stat.nlink, 1);
    assert_eq!(stat.dev, mp.id());
    assert_eq!(stat.mode & 0o777, 0o644);

    drop(file);
    vfs.unmount(&mp, MountFlags::empty()).unwrap();
}

#[test]
fn test_read_through_indirect_block() {
    let vfs = vfs();
    let disk = disk(&Image::default());
    let mp = mount(&vfs, &disk, MountFlags::RDONLY, "/mnt").unwrap();
    let big = vfs.namei("/mnt/big.bin", None).unwrap();

    let size = image::BIG_BLOCKS * BLOCK_SIZE;
    let mut data = vec![0u8; size + 100];
    assert_eq!(big.read(&mut data, 0).unwrap(), size);
    assert!(data[..size]
        .iter()
        .enumerate()
        .all(|(i, b)| *b == image::big_byte(i)));

    // Atravessa a fronteira entre blocos diretos e o indireto.
    let start = 12 * BLOCK_SIZE - 10;
    let mut window = [0u8; 20];
    assert_eq!(big.read(&mut window, start as u64).unwrap(), 20);
    for (i, b) in window.iter().enumerate() {
        assert_eq!(*b, image::big_byte(start + i));
    }

    drop(big);
    vfs.unmount(&mp, MountFlags::empty()).unwrap();
}

#[test]
fn test_symlink_not_followed() {
    let vfs = vfs();
    let disk = disk(&Image::default());
    let mp = mount(&vfs, &disk, MountFlags::RDONLY, "/mnt").unwrap();

    let link = vfs.namei("/mnt/link", None).unwrap();
    assert_eq!(link.ino(), image::LINK_INO as u64);
    assert_eq!(link.file_type(), FileType::Symlink);

    let mut buf = [0u8; 64];
    let n = link.readlink(&mut buf).unwrap();
    assert_eq!(&buf[..n], image::LINK_TARGET);

    drop(link);
    vfs.unmount(&mp, MountFlags::empty()).unwrap();
}

#[test]
fn test_dotdot_inside_and_across_mount() {
    let vfs = vfs();
    let disk = disk(&Image::default());
    let mp = mount(&vfs, &disk, MountFlags::RDONLY, "/mnt").unwrap();

    let via_trail = vfs.namei("/mnt/sub/..", None).unwrap();
    assert_eq!(via_trail.ino(), ROOT_INO);

    // Sem trilha o driver resolve "..".
    let sub = vfs.namei("/mnt/sub", None).unwrap();
    let parent = vfs.namei("..", Some(&sub)).unwrap();
    assert_eq!(parent.ino(), ROOT_INO);
    assert_eq!(parent.mount(), Some(mp.id()));

    // Da raiz do mount, ".." sai para o diretório do ponto de montagem.
    let outside = vfs.namei("../..", Some(&sub)).unwrap();
    assert!(KRef::ptr_eq(&outside, vfs.bootstrap()));

    drop((via_trail, sub, parent, outside));
    vfs.unmount(&mp, MountFlags::empty()).unwrap();
}

#[test]
fn test_mount_as_root() {
    let vfs = vfs();
    let disk = disk(&Image::default());
    let mp = mount(&vfs, &disk, MountFlags::RDONLY, "/").unwrap();

    let file = vfs.namei("/sub/../hello.txt", None).unwrap();
    assert_eq!(file.ino(), image::HELLO_INO as u64);
    assert_eq!(vfs.namei("/..", None).unwrap().ino(), ROOT_INO);

    drop(file);
    vfs.unmount(&mp, MountFlags::empty()).unwrap();
    assert!(KRef::ptr_eq(&vfs.root(), vfs.bootstrap()));
}

// =============================================================================
// SUPERBLOCO
// =============================================================================

#[test]
fn test_rw_mount_updates_superblock() {
    let vfs = vfs();
    let disk = disk(&Image::default());
    let before = disk.snapshot();
    assert_eq!(u16_at(&before, SB_MNT_COUNT), 3);
    assert_eq!(u16_at(&before, SB_STATE), 1);

    let mp = mount(&vfs, &disk, MountFlags::empty(), "/mnt").unwrap();
    let mounted = disk.snapshot();
    assert_eq!(u16_at(&mounted, SB_MNT_COUNT), 4);
    assert_eq!(u16_at(&mounted, SB_STATE), 0);

    vfs.flush(&mp).unwrap();
    vfs.unmount(&mp, MountFlags::empty()).unwrap();
    let after = disk.snapshot();
    assert_eq!(u16_at(&after, SB_MNT_COUNT), 4);
    assert_eq!(u16_at(&after, SB_STATE), 1);
}

#[test]
fn test_ro_mount_leaves_disk_untouched() {
    let vfs = vfs();
    let disk = disk(&Image::default());
    let before = disk.snapshot();

    let mp = mount(&vfs, &disk, MountFlags::RDONLY, "/mnt").unwrap();
    vfs.unmount(&mp, MountFlags::empty()).unwrap();
    assert_eq!(disk.snapshot(), before);

    // Disco somente leitura força montagem RO.
    let ro: Arc<dyn BlockDevice> =
        Arc::new(RamDisk::from_image(Image::default().build(), BLOCK_SIZE).read_only());
    let mp = vfs.mount("ext2", Some(ro), MountFlags::empty(), "/mnt").unwrap();
    vfs.unmount(&mp, MountFlags::empty()).unwrap();
}

#[test]
fn test_unmount_writeback_failure_keeps_mount() {
    let vfs = vfs();
    let disk = Arc::new(FailingDisk::new(Image::default().build()));
    let device: Arc<dyn BlockDevice> = disk.clone();
    let mp = vfs.mount("ext2", Some(device), MountFlags::empty(), "/mnt").unwrap();

    disk.fail_writes.store(true, Ordering::SeqCst);
    assert_eq!(vfs.unmount(&mp, MountFlags::empty()).unwrap_err(), KError::IoError);
    assert_eq!(mp.state(), MountState::Mounted);
    assert_eq!(vfs.mounts().len(), 1);
    assert!(vfs.namei("/mnt/hello.txt", None).is_ok());

    disk.fail_writes.store(false, Ordering::SeqCst);
    vfs.unmount(&mp, MountFlags::empty()).unwrap();
    let sb = Superblock::read(&disk.inner).unwrap();
    assert_eq!(sb.state().bits(), 1);
}

#[test]
fn test_mmp_requires_read_only() {
    let vfs = vfs();
    let image = Image::default().with_mmp();

    let rw = disk(&image);
    let before = rw.snapshot();
    assert_eq!(
        mount(&vfs, &rw, MountFlags::empty(), "/mnt").unwrap_err(),
        KError::NotSupported
    );
    assert_eq!(rw.snapshot(), before);
    assert!(vfs.mounts().is_empty());

    let ro = disk(&image);
    let mp = mount(&vfs, &ro, MountFlags::RDONLY, "/mnt").unwrap();
    vfs.unmount(&mp, MountFlags::empty()).unwrap();
}

#[test]
fn test_unknown_features() {
    let vfs = vfs();

    let compressed = Image {
        incompat: 0x0002 | 0x0001,
        ..Image::default()
    };
    let d = disk(&compressed);
    assert_eq!(
        mount(&vfs, &d, MountFlags::RDONLY, "/mnt").unwrap_err(),
        KError::NotSupported
    );

    // BTREE_DIR só impede escrita.
    let btree = Image {
        ro_compat: 0x0004,
        ..Image::default()
    };
    let d = disk(&btree);
    assert_eq!(
        mount(&vfs, &d, MountFlags::empty(), "/mnt").unwrap_err(),
        KError::NotSupported
    );
    let mp = mount(&vfs, &d, MountFlags::RDONLY, "/mnt").unwrap();
    vfs.unmount(&mp, MountFlags::empty()).unwrap();
}

#[test]
fn test_corrupted_superblock() {
    let vfs = vfs();

    let bad_magic = Image {
        magic: 0x1234,
        ..Image::default()
    };
    let d = disk(&bad_magic);
    assert_eq!(
        mount(&vfs, &d, MountFlags::RDONLY, "/mnt").unwrap_err(),
        KError::Corrupted
    );

    let mut raw = Image::default().build();
    raw[1024..1028].copy_from_slice(&17u32.to_le_bytes());
    let d = Arc::new(RamDisk::from_image(raw, BLOCK_SIZE));
    assert_eq!(
        mount(&vfs, &d, MountFlags::RDONLY, "/mnt").unwrap_err(),
        KError::Corrupted
    );
    assert!(vfs.mounts().is_empty());
}

#[test]
fn test_geometry_past_device_end() {
    let vfs = vfs();

    // Geometria coerente entre si, mas muito maior que o disco de 64 KiB.
    let mut raw = Image::default().build();
    raw[1024..1028].copy_from_slice(&0xFFFF_FFFEu32.to_le_bytes());
    raw[1028..1032].copy_from_slice(&0xFFFF_FFFFu32.to_le_bytes());
    raw[1056..1060].copy_from_slice(&1u32.to_le_bytes());
    raw[1064..1068].copy_from_slice(&1u32.to_le_bytes());
    let d = Arc::new(RamDisk::from_image(raw, BLOCK_SIZE));
    assert_eq!(
        mount(&vfs, &d, MountFlags::RDONLY, "/mnt").unwrap_err(),
        KError::Corrupted
    );
    assert!(vfs.mounts().is_empty());
}

#[test]
fn test_inode_table_past_device_end() {
    let vfs = vfs();

    let mut raw = Image::default().build();
    raw[2 * BLOCK_SIZE + 8..2 * BLOCK_SIZE + 12].copy_from_slice(&1000u32.to_le_bytes());
    let d = Arc::new(RamDisk::from_image(raw, BLOCK_SIZE));
    assert_eq!(
        mount(&vfs, &d, MountFlags::RDONLY, "/mnt").unwrap_err(),
        KError::Corrupted
    );
}

#[test]
fn test_device_read_error() {
    let vfs = vfs();
    let disk = Arc::new(FailingDisk::new(Image::default().build()));
    disk.fail_reads.store(true, Ordering::SeqCst);
    let device: Arc<dyn BlockDevice> = disk;
    assert_eq!(
        vfs.mount("ext2", Some(device), MountFlags::RDONLY, "/mnt").unwrap_err(),
        KError::IoError
    );
}

#[test]
fn test_mount_without_device() {
    let vfs = vfs();
    assert_eq!(
        vfs.mount("ext2", None, MountFlags::RDONLY, "/mnt").unwrap_err(),
        KError::InvalidArgument
    );
}

#[test]
fn test_guess_filesystem_type() {
    let vfs = vfs();
    let ext2 = RamDisk::from_image(Image::default().build(), BLOCK_SIZE);
    assert_eq!(vfs.guess_filesystem_type(&ext2), Some("ext2"));

    let blank = RamDisk::new(BLOCK_SIZE, 8);
    assert_eq!(vfs.guess_filesystem_type(&blank), None);
}

#[test]
fn test_global_init() {
    let first = crate::fs::init().unwrap();
    let second = crate::fs::init().unwrap();
    assert!(core::ptr::eq(first, second));
    assert!(core::ptr::eq(crate::fs::vfs().unwrap(), first));
    assert_eq!(
        first.register_filesystem("ext2", &EXT2_MOUNT_OPS).unwrap_err(),
        KError::AlreadyExists
    );
}
