//! # Virtual File System
//!
//! Grafo de vnodes e mounts sobre drivers plugáveis.
//!
//! ## Estado Global
//!
//! ```text
//! Vfs
//!  ├── bootstrap   vnode "/" criado no boot (vive para sempre)
//!  ├── root        raiz efetiva: bootstrap ou raiz do mount em "/"
//!  ├── filesystems tabela nome → MountOps
//!  └── mounts      tabela de mounts ativos (KRef<Mount>)
//! ```
//!
//! ## Regras
//!
//! - `mount` é tudo-ou-nada: se o driver falhar, nada fica na tabela e o
//!   root vnode tentado é liberado.
//! - Callbacks de driver nunca rodam com o lock da tabela seguro.
//! - Pontos de montagem são identificados por (diretório pai, nome), então
//!   funcionam mesmo em diretórios sem a entrada correspondente.

pub mod mount;
pub mod namei;
pub mod path;
pub mod stat;
pub mod vnode;

use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;

use crate::core::object::{KRef, RefSlot};
use crate::drivers::block::BlockDevice;
use crate::sync::Spinlock;
use crate::sys::error::{KError, KResult};

pub use mount::{Mount, MountFlags, MountOps, MountState};
pub use stat::{DirEntry, FileType, Ino, Stat, VnodeAttr};
pub use vnode::{EmptyDirOps, Vnode, VnodeKey, VnodeOps, EMPTY_DIR_OPS};

/// Inode do vnode raiz de boot.
pub const BOOTSTRAP_INO: Ino = 0;

/// Entrada da tabela de filesystems
struct Filesystem {
    name: &'static str,
    ops: &'static dyn MountOps,
}

/// Instância do VFS
pub struct Vfs {
    bootstrap: KRef<Vnode>,
    root: RefSlot<Vnode>,
    filesystems: Spinlock<Vec<Filesystem>>,
    mounts: Spinlock<Vec<KRef<Mount>>>,
}

/// Onde um mount será pendurado.
enum Target {
    Root,
    Child { parent: KRef<Vnode>, name: String },
}

impl Vfs {
    /// Cria o VFS com o vnode raiz `/` sem mount.
    pub fn new() -> KResult<Self> {
        let bootstrap = Vnode::new(BOOTSTRAP_INO, &EMPTY_DIR_OPS)
            .with_attr(VnodeAttr::directory())
            .with_name("/")
            .into_ref()?;

        let root = RefSlot::empty();
        root.assign(&bootstrap);

        crate::kinfo!("(VFS) Vnode raiz criado");
        Ok(Self {
            bootstrap,
            root,
            filesystems: Spinlock::new(Vec::new()),
            mounts: Spinlock::new(Vec::new()),
        })
    }

    /// Raiz efetiva do namespace.
    pub fn root(&self) -> KRef<Vnode> {
        self.root.get().unwrap_or_else(|| self.bootstrap.clone())
    }

    /// Registra um driver de filesystem sob `name`.
    pub fn register_filesystem(&self, name: &'static str, ops: &'static dyn MountOps) -> KResult<()> {
        let mut table = self.filesystems.lock();
        if table.iter().any(|fs| fs.name == name) {
            crate::kwarn!("(VFS) Filesystem já registrado: " => name);
            return Err(KError::AlreadyExists);
        }
        table.push(Filesystem { name, ops });
        drop(table);

        crate::kinfo!("(VFS) Filesystem registrado: " => name);
        Ok(())
    }

    fn find_filesystem(&self, name: &str) -> Option<(&'static str, &'static dyn MountOps)> {
        self.filesystems
            .lock()
            .iter()
            .find(|fs| fs.name == name)
            .map(|fs| (fs.name, fs.ops))
    }

    /// Pergunta a cada driver registrado se reconhece `device`.
    pub fn guess_filesystem_type(&self, device: &dyn BlockDevice) -> Option<&'static str> {
        let candidates: Vec<(&'static str, &'static dyn MountOps)> = self
            .filesystems
            .lock()
            .iter()
            .map(|fs| (fs.name, fs.ops))
            .collect();

        candidates
            .into_iter()
            .find(|(_, ops)| ops.check(device))
            .map(|(name, _)| name)
    }

    /// Monta o filesystem registrado como `fstype` em `path`.
    pub fn mount(
        &self,
        fstype: &str,
        device: Option<Arc<dyn BlockDevice>>,
        flags: MountFlags,
        path: &str,
    ) -> KResult<KRef<Mount>> {
        let Some((name, ops)) = self.find_filesystem(fstype) else {
            crate::kerror!("(VFS) Tipo de filesystem desconhecido: " => fstype);
            return Err(KError::InvalidArgument);
        };
        self.mount_with(name, ops, device, flags, path)
    }

    /// Monta usando uma tabela de operações explícita.
    pub fn mount_with(
        &self,
        fstype: &'static str,
        ops: &'static dyn MountOps,
        device: Option<Arc<dyn BlockDevice>>,
        flags: MountFlags,
        path: &str,
    ) -> KResult<KRef<Mount>> {
        crate::kdebug!("(VFS) mount em " => path);
        let target = self.resolve_target(path)?;
        self.check_target_free(&target)?;

        let (parent, name) = match &target {
            Target::Root => (None, None),
            Target::Child { parent, name } => (Some(parent.clone()), Some(name.clone())),
        };
        let mp = KRef::new(Mount::new(fstype, ops, flags, device, parent, name))?;

        if let Err(err) = ops.mount(&mp, flags) {
            crate::kerror!("(VFS) Driver recusou o mount: " => err);
            mp.clear_root();
            return Err(err);
        }

        let Some(root) = mp.root() else {
            crate::kerror!("(VFS) Driver montou sem root vnode: " => fstype);
            return Err(KError::InvalidArgument);
        };

        // Enquanto o driver rodava, outro mount pode ter ocupado o alvo ou o
        // filesystem que contém o alvo pode ter entrado em unmount.
        let mut table = self.mounts.lock();
        if self.target_taken(&table, &target) || !Self::target_parent_mounted(&table, &target) {
            drop(table);
            crate::kwarn!("(VFS) Ponto de montagem ocupado: " => path);
            if let Err(err) = ops.unmount(&mp, flags) {
                crate::kwarn!("(VFS) Driver falhou ao desfazer o mount: " => err);
            }
            mp.clear_root();
            return Err(KError::Busy);
        }
        *mp.state.lock() = MountState::Mounted;
        table.push(mp.clone());
        if let Target::Root = target {
            self.root.assign(&root);
        }
        drop(table);

        crate::kinfo!("(VFS) Montado " => fstype);
        Ok(mp)
    }

    /// Desmonta `mp`.
    ///
    /// # Panics
    ///
    /// Se `mp` não estiver montado (ex.: unmount duplo).
    pub fn unmount(&self, mp: &KRef<Mount>, flags: MountFlags) -> KResult<()> {
        // Estado e mounts filhos são checados sob o lock da tabela, o mesmo
        // que `mount_with` segura ao inserir um filho.
        {
            let table = self.mounts.lock();
            let mut state = mp.state.lock();
            if *state != MountState::Mounted {
                drop(state);
                drop(table);
                crate::kerror!("(VFS) unmount de mount não montado, id=", mp.id());
                panic!("vfs: unmount of a mount that is not mounted");
            }
            if Self::has_child_mounts(&table, mp) {
                crate::kwarn!("(VFS) unmount: há mounts dentro deste, id=", mp.id());
                return Err(KError::Busy);
            }
            *state = MountState::Unmounting;
        }

        if let Err(err) = mp.ops().unmount(mp, flags) {
            *mp.state.lock() = MountState::Mounted;
            crate::kerror!("(VFS) Driver falhou no unmount: " => err);
            return Err(err);
        }

        let removed = {
            let mut table = self.mounts.lock();
            if Self::has_child_mounts(&table, mp) {
                drop(table);
                *mp.state.lock() = MountState::Mounted;
                crate::kerror!("(VFS) unmount: mount filho surgiu durante o unmount, id=", mp.id());
                return Err(KError::Busy);
            }
            let pos = table.iter().position(|m| KRef::ptr_eq(m, mp));
            pos.map(|i| table.remove(i))
        };
        drop(removed);
        if mp.parent().is_none() {
            self.root.assign(&self.bootstrap);
        }

        mp.clear_root();
        *mp.state.lock() = MountState::Unmounted;
        crate::kinfo!("(VFS) Desmontado " => mp.fstype());
        Ok(())
    }

    /// Grava metadados do filesystem de `mp`.
    pub fn flush(&self, mp: &Mount) -> KResult<()> {
        mp.ops().flush(mp)
    }

    /// Cópia da tabela de mounts.
    pub fn mounts(&self) -> Vec<KRef<Mount>> {
        self.mounts.lock().clone()
    }

    /// Mount dono de um vnode (resolve a back-reference por `Koid`).
    pub fn mount_of(&self, vp: &Vnode) -> Option<KRef<Mount>> {
        let id = vp.mount()?;
        self.mounts.lock().iter().find(|m| m.id() == id).cloned()
    }

    fn resolve_target(&self, path: &str) -> KResult<Target> {
        path::check_path(path)?;
        let Some((dir, name)) = path::split_last(path) else {
            return Ok(Target::Root);
        };
        path::check_name(name)?;
        if name == "." || name == ".." {
            return Err(KError::InvalidArgument);
        }

        let parent = self.namei(dir, None)?;
        if !parent.is_dir() {
            return Err(KError::NotDirectory);
        }
        // O ponto de montagem pode não existir no pai; se existir, tem
        // que ser diretório.
        match parent.lookup(name) {
            Ok(existing) if !existing.is_dir() => return Err(KError::NotDirectory),
            Ok(_) | Err(KError::NoSuchEntry) | Err(KError::NotSupported) => {}
            Err(err) => return Err(err),
        }

        Ok(Target::Child {
            parent,
            name: String::from(name),
        })
    }

    fn target_taken(&self, table: &[KRef<Mount>], target: &Target) -> bool {
        match target {
            Target::Root => table.iter().any(|m| m.parent().is_none()),
            Target::Child { parent, name } => table.iter().any(|m| m.covers(parent.key(), name)),
        }
    }

    /// Algum mount da tabela está pendurado num vnode de `mp`.
    fn has_child_mounts(table: &[KRef<Mount>], mp: &Mount) -> bool {
        table
            .iter()
            .any(|other| other.parent().is_some_and(|p| p.mount() == Some(mp.id())))
    }

    /// O filesystem dono do diretório alvo ainda está `Mounted`.
    fn target_parent_mounted(table: &[KRef<Mount>], target: &Target) -> bool {
        let Target::Child { parent, .. } = target else {
            return true;
        };
        match parent.mount() {
            None => true,
            Some(id) => table
                .iter()
                .any(|m| m.id() == id && m.state() == MountState::Mounted),
        }
    }

    fn check_target_free(&self, target: &Target) -> KResult<()> {
        let taken = self.target_taken(&self.mounts.lock(), target);
        if taken {
            return Err(KError::Busy);
        }
        Ok(())
    }
}

#[cfg(test)]
impl Vfs {
    pub(crate) fn bootstrap(&self) -> &KRef<Vnode> {
        &self.bootstrap
    }
}
