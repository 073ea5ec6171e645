//! # Mount
//!
//! Uma instância de filesystem montada num ponto do namespace.
//!
//! ## Ciclo de Vida
//!
//! ```text
//! UNMOUNTED ─► MOUNTING ─► MOUNTED ─► UNMOUNTING ─► UNMOUNTED
//!                  │                       │
//!                  └─ falha: descartado    └─ falha: volta a MOUNTED
//! ```
//!
//! ## Posse
//!
//! - O mount possui o root vnode (`RefSlot`, referência forte).
//! - O mount segura o diretório que contém o ponto de montagem (`parent`).
//! - Vnodes apontam de volta para o mount apenas pelo `Koid`.

use alloc::boxed::Box;
use alloc::string::String;
use alloc::sync::Arc;
use core::any::Any;

use bitflags::bitflags;

use super::stat::{Ino, VnodeAttr};
use super::vnode::{Vnode, VnodeKey, VnodeOps, EMPTY_DIR_OPS};
use crate::core::object::{generate_koid, KRef, Koid, RefSlot};
use crate::drivers::block::BlockDevice;
use crate::sync::Spinlock;
use crate::sys::error::KResult;

bitflags! {
    /// Opções de montagem
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct MountFlags: u32 {
        /// Somente leitura
        const RDONLY = 1 << 0;
    }
}

/// Estado de um mount
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MountState {
    Unmounted,
    Mounting,
    Mounted,
    Unmounting,
}

/// Inode usado pela raiz vazia de mounts sem raiz própria.
pub const EMPTY_ROOT_INO: Ino = 1;

/// Operações de um driver de filesystem.
pub trait MountOps: Send + Sync {
    /// Inicializa o filesystem e anexa o root vnode com [`Mount::set_root`].
    ///
    /// A implementação padrão anexa um diretório vazio.
    fn mount(&self, mp: &Mount, _flags: MountFlags) -> KResult<()> {
        let root = mp.empty_root()?;
        mp.set_root(&root);
        Ok(())
    }

    /// Solta o estado do driver. O VFS libera o root vnode depois, se o
    /// driver não o fez.
    fn unmount(&self, _mp: &Mount, _flags: MountFlags) -> KResult<()> {
        Ok(())
    }

    /// Verifica se `device` contém este filesystem.
    fn check(&self, _device: &dyn BlockDevice) -> bool {
        false
    }

    /// Grava metadados do filesystem sem desmontar.
    fn flush(&self, _mp: &Mount) -> KResult<()> {
        Ok(())
    }
}

/// Filesystem montado
pub struct Mount {
    id: Koid,
    fstype: &'static str,
    ops: &'static dyn MountOps,
    flags: MountFlags,
    device: Option<Arc<dyn BlockDevice>>,
    parent: Option<KRef<Vnode>>,
    name: Option<String>,
    pub(super) root: RefSlot<Vnode>,
    pub(super) state: Spinlock<MountState>,
    private: Spinlock<Option<Box<dyn Any + Send + Sync>>>,
}

impl Mount {
    pub(super) fn new(
        fstype: &'static str,
        ops: &'static dyn MountOps,
        flags: MountFlags,
        device: Option<Arc<dyn BlockDevice>>,
        parent: Option<KRef<Vnode>>,
        name: Option<String>,
    ) -> Self {
        Self {
            id: generate_koid(),
            fstype,
            ops,
            flags,
            device,
            parent,
            name,
            root: RefSlot::empty(),
            state: Spinlock::new(MountState::Mounting),
            private: Spinlock::new(None),
        }
    }

    pub fn id(&self) -> Koid {
        self.id
    }

    pub fn fstype(&self) -> &'static str {
        self.fstype
    }

    pub fn ops(&self) -> &'static dyn MountOps {
        self.ops
    }

    pub fn flags(&self) -> MountFlags {
        self.flags
    }

    pub fn is_read_only(&self) -> bool {
        self.flags.contains(MountFlags::RDONLY)
    }

    pub fn device(&self) -> Option<&Arc<dyn BlockDevice>> {
        self.device.as_ref()
    }

    /// Diretório que contém o ponto de montagem (`None` para a raiz).
    pub fn parent(&self) -> Option<&KRef<Vnode>> {
        self.parent.as_ref()
    }

    /// Nome do ponto de montagem dentro de `parent`.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Chave do vnode coberto: (diretório pai, nome).
    pub(super) fn covers(&self, dir: VnodeKey, name: &str) -> bool {
        match (&self.parent, &self.name) {
            (Some(parent), Some(own)) => parent.key() == dir && own == name,
            _ => false,
        }
    }

    pub fn state(&self) -> MountState {
        *self.state.lock()
    }

    /// Nova referência para o root vnode.
    pub fn root(&self) -> Option<KRef<Vnode>> {
        self.root.get()
    }

    /// Anexa `vp` como root vnode do mount.
    pub fn set_root(&self, vp: &KRef<Vnode>) {
        self.root.assign(vp);
    }

    /// Solta a referência do mount ao root vnode.
    pub fn clear_root(&self) {
        self.root.clear();
    }

    /// Referências atuais do root vnode (0 se não houver).
    pub fn root_ref_count(&self) -> usize {
        self.root.ref_count()
    }

    /// Vnode ainda não alocado pertencente a este mount.
    pub fn new_vnode(&self, ino: Ino, ops: &'static dyn VnodeOps) -> Vnode {
        Vnode::new(ino, ops).with_mount(Some(self.id))
    }

    /// Raiz de diretório vazio.
    pub fn empty_root(&self) -> KResult<KRef<Vnode>> {
        self.new_vnode(EMPTY_ROOT_INO, &EMPTY_DIR_OPS)
            .with_attr(VnodeAttr::directory())
            .with_name("/")
            .into_ref()
    }

    /// Guarda o estado privado do driver (superbloco, etc.).
    pub fn set_private<T: Any + Send + Sync>(&self, data: T) {
        let old = self.private.lock().replace(Box::new(data));
        drop(old);
    }

    /// Cópia do estado privado, se for do tipo `T`.
    pub fn private<T: Any + Clone>(&self) -> Option<T> {
        self.private.lock().as_deref()?.downcast_ref::<T>().cloned()
    }

    /// Remove o estado privado.
    pub fn take_private(&self) -> Option<Box<dyn Any + Send + Sync>> {
        self.private.lock().take()
    }
}

impl core::fmt::Debug for Mount {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Mount")
            .field("id", &self.id)
            .field("fstype", &self.fstype)
            .field("name", &self.name)
            .field("state", &self.state())
            .finish()
    }
}
