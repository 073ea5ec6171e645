//! # Vnode
//!
//! Nó do namespace unificado (arquivo, diretório, symlink, dispositivo),
//! independente do formato em disco.
//!
//! ## Posse
//!
//! - Vnodes são sempre manipulados como `KRef<Vnode>`.
//! - O vnode guarda o `Koid` do mount dono, nunca uma referência forte.
//! - A tabela de operações é escolhida pelo driver na criação e não muda.
//!
//! ## Dispatch
//!
//! Os métodos de [`Vnode`] fazem as verificações genéricas (tipo de nó,
//! tamanho zero, nome) e só então chamam o [`VnodeOps`] do driver.
//! Operações que o driver não implementa retornam `NotSupported`.

use alloc::boxed::Box;
use alloc::string::String;
use alloc::vec::Vec;
use core::any::Any;

use super::path;
use super::stat::{DirEntry, FileType, Ino, Stat, VnodeAttr};
use crate::core::object::{KRef, Koid, KOID_INVALID};
use crate::sync::Spinlock;
use crate::sys::error::{KError, KResult};

/// Identidade de um vnode: (mount dono, inode).
pub type VnodeKey = (Option<Koid>, Ino);

/// Operações de vnode implementadas por um driver.
///
/// Os métodos recebem o vnode alvo; o estado privado do driver fica em
/// [`Vnode::data`].
pub trait VnodeOps: Send + Sync {
    /// Procura `name` no diretório `dir`.
    fn lookup(&self, _dir: &Vnode, _name: &str) -> KResult<KRef<Vnode>> {
        Err(KError::NotSupported)
    }

    /// Lê a partir de `offset`. Retorna bytes lidos (0 = fim do arquivo).
    fn read(&self, _vp: &Vnode, _buf: &mut [u8], _offset: u64) -> KResult<usize> {
        Err(KError::NotSupported)
    }

    /// Escreve a partir de `offset`. Retorna bytes escritos.
    fn write(&self, _vp: &Vnode, _buf: &[u8], _offset: u64) -> KResult<usize> {
        Err(KError::NotSupported)
    }

    /// Entrada de diretório no cursor `offset` e o cursor da próxima.
    /// `None` = fim do diretório.
    fn readdir(&self, _dir: &Vnode, _offset: u64) -> KResult<Option<(DirEntry, u64)>> {
        Err(KError::NotSupported)
    }

    /// Lê o alvo de um symlink. Retorna bytes copiados.
    fn readlink(&self, _vp: &Vnode, _buf: &mut [u8]) -> KResult<usize> {
        Err(KError::NotSupported)
    }

    /// Refina o `Stat` já preenchido a partir dos atributos do vnode.
    fn getattr(&self, _vp: &Vnode, _stat: &mut Stat) -> KResult<()> {
        Ok(())
    }

    /// Grava metadados sujos do vnode.
    fn sync(&self, _vp: &Vnode) -> KResult<()> {
        Ok(())
    }

    /// Chamado quando a última referência ao vnode é solta.
    fn dealloc(&self, _vp: &mut Vnode) {}
}

/// Nó do VFS
pub struct Vnode {
    ino: Ino,
    ops: &'static dyn VnodeOps,
    mount: Option<Koid>,
    name: Spinlock<Option<String>>,
    attr: Spinlock<VnodeAttr>,
    data: Option<Box<dyn Any + Send + Sync>>,
}

fn vnode_dealloc(vp: &mut Vnode) {
    let ops = vp.ops;
    ops.dealloc(vp);
}

impl Vnode {
    /// Vnode ainda fora do heap de objetos; finalizar com [`Vnode::into_ref`].
    pub fn new(ino: Ino, ops: &'static dyn VnodeOps) -> Self {
        Self {
            ino,
            ops,
            mount: None,
            name: Spinlock::new(None),
            attr: Spinlock::new(VnodeAttr::default()),
            data: None,
        }
    }

    pub fn with_mount(mut self, mount: Option<Koid>) -> Self {
        self.mount = mount;
        self
    }

    pub fn with_attr(self, attr: VnodeAttr) -> Self {
        *self.attr.lock() = attr;
        self
    }

    pub fn with_name(self, name: &str) -> Self {
        *self.name.lock() = Some(String::from(name));
        self
    }

    pub fn with_data<T: Any + Send + Sync>(mut self, data: T) -> Self {
        self.data = Some(Box::new(data));
        self
    }

    /// Aloca o vnode como objeto com refcount (`refcount = 1`).
    pub fn into_ref(self) -> KResult<KRef<Vnode>> {
        KRef::alloc(self, vnode_dealloc)
    }

    pub fn ino(&self) -> Ino {
        self.ino
    }

    pub fn ops(&self) -> &'static dyn VnodeOps {
        self.ops
    }

    /// Back-reference (não possessiva) para o mount dono.
    pub fn mount(&self) -> Option<Koid> {
        self.mount
    }

    pub fn key(&self) -> VnodeKey {
        (self.mount, self.ino)
    }

    /// Nome em cache (último componente usado para chegar aqui).
    pub fn name(&self) -> Option<String> {
        self.name.lock().clone()
    }

    pub fn set_name(&self, name: &str) {
        *self.name.lock() = Some(String::from(name));
    }

    pub fn attr(&self) -> VnodeAttr {
        *self.attr.lock()
    }

    pub fn set_attr(&self, attr: VnodeAttr) {
        *self.attr.lock() = attr;
    }

    pub fn file_type(&self) -> FileType {
        self.attr.lock().file_type()
    }

    pub fn is_dir(&self) -> bool {
        self.file_type() == FileType::Directory
    }

    /// Estado privado do driver, se for do tipo `T`.
    pub fn data<T: Any>(&self) -> Option<&T> {
        self.data.as_deref()?.downcast_ref::<T>()
    }

    // -------------------------------------------------------------------------
    // Dispatch
    // -------------------------------------------------------------------------

    pub fn lookup(&self, name: &str) -> KResult<KRef<Vnode>> {
        if !self.is_dir() {
            return Err(KError::NotDirectory);
        }
        path::check_name(name)?;
        self.ops.lookup(self, name)
    }

    pub fn read(&self, buf: &mut [u8], offset: u64) -> KResult<usize> {
        if self.is_dir() {
            return Err(KError::IsDirectory);
        }
        if buf.is_empty() {
            return Ok(0);
        }
        self.ops.read(self, buf, offset)
    }

    pub fn write(&self, buf: &[u8], offset: u64) -> KResult<usize> {
        if self.is_dir() {
            return Err(KError::IsDirectory);
        }
        if buf.is_empty() {
            return Ok(0);
        }
        self.ops.write(self, buf, offset)
    }

    pub fn readdir(&self, offset: u64) -> KResult<Option<(DirEntry, u64)>> {
        if !self.is_dir() {
            return Err(KError::NotDirectory);
        }
        self.ops.readdir(self, offset)
    }

    /// Lê todas as entradas do diretório.
    pub fn readdir_all(&self) -> KResult<Vec<DirEntry>> {
        let mut entries = Vec::new();
        let mut offset = 0;
        while let Some((entry, next)) = self.readdir(offset)? {
            entries.push(entry);
            offset = next;
        }
        Ok(entries)
    }

    pub fn readlink(&self, buf: &mut [u8]) -> KResult<usize> {
        if self.file_type() != FileType::Symlink {
            return Err(KError::InvalidArgument);
        }
        if buf.is_empty() {
            return Ok(0);
        }
        self.ops.readlink(self, buf)
    }

    pub fn getattr(&self) -> KResult<Stat> {
        let mut stat = Stat::from_attr(self.mount.unwrap_or(KOID_INVALID), self.ino, &self.attr());
        self.ops.getattr(self, &mut stat)?;
        Ok(stat)
    }

    pub fn sync(&self) -> KResult<()> {
        self.ops.sync(self)
    }
}

impl core::fmt::Debug for Vnode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Vnode")
            .field("ino", &self.ino)
            .field("mount", &self.mount)
            .field("name", &self.name())
            .finish()
    }
}

/// Diretório sem entradas: raiz de boot do VFS e raiz de mounts cujo driver
/// não fornece uma.
pub struct EmptyDirOps;

impl VnodeOps for EmptyDirOps {
    fn lookup(&self, _dir: &Vnode, _name: &str) -> KResult<KRef<Vnode>> {
        Err(KError::NoSuchEntry)
    }

    fn readdir(&self, _dir: &Vnode, _offset: u64) -> KResult<Option<(DirEntry, u64)>> {
        Ok(None)
    }
}

pub static EMPTY_DIR_OPS: EmptyDirOps = EmptyDirOps;
