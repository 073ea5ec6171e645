//! Resolução de caminhos (`namei`)
//!
//! Percorre os componentes a partir do diretório de trabalho ou da raiz,
//! chamando `lookup` em cada diretório. Ao entrar num ponto de montagem o
//! resultado é a raiz do mount, de forma transparente.
//!
//! `..` desfaz o último passo usando a trilha do próprio percurso. No
//! início do percurso (sem trilha): a raiz global é pai de si mesma, a raiz
//! de um mount volta ao diretório que contém o ponto de montagem, e os
//! demais vnodes perguntam ao driver.
//!
//! Symlinks não são seguidos.

use alloc::vec::Vec;

use super::path::{self, PathComponents};
use super::vnode::Vnode;
use super::Vfs;
use crate::core::object::KRef;
use crate::sys::error::{KError, KResult};

impl Vfs {
    /// Resolve `path` para um vnode. Caminhos relativos partem de `cwd`
    /// (ou da raiz, se `cwd` for `None`).
    pub fn namei(&self, path: &str, cwd: Option<&KRef<Vnode>>) -> KResult<KRef<Vnode>> {
        path::check_path(path)?;

        let mut current = match cwd {
            Some(dir) if !path::is_absolute(path) => dir.clone(),
            _ => self.root(),
        };
        let mut trail: Vec<KRef<Vnode>> = Vec::new();

        for component in PathComponents::new(path) {
            path::check_name(component)?;
            match component {
                "." => {}
                ".." => {
                    current = match trail.pop() {
                        Some(prev) => prev,
                        None => self.parent_of(&current)?,
                    };
                }
                name => {
                    if !current.is_dir() {
                        return Err(KError::NotDirectory);
                    }
                    let next = self.lookup_child(&current, name)?;
                    trail.push(current);
                    current = next;
                }
            }
        }

        crate::ktrace!("(VFS) namei ok, ino=", current.ino());
        Ok(current)
    }

    /// Um passo do percurso: ponto de montagem ou `lookup` do driver.
    fn lookup_child(&self, dir: &KRef<Vnode>, name: &str) -> KResult<KRef<Vnode>> {
        let key = dir.key();
        let covered = self
            .mounts
            .lock()
            .iter()
            .find(|m| m.covers(key, name))
            .and_then(|m| m.root());
        if let Some(root) = covered {
            return Ok(root);
        }

        dir.lookup(name)
    }

    /// Pai de um vnode sem trilha de percurso.
    fn parent_of(&self, vp: &KRef<Vnode>) -> KResult<KRef<Vnode>> {
        let key = vp.key();
        let root = self.root();
        if root.key() == key {
            return Ok(root);
        }

        let covering = self.mounts.lock().iter().find_map(|m| {
            let is_root = m.root().is_some_and(|r| r.key() == key);
            if is_root {
                m.parent().cloned()
            } else {
                None
            }
        });
        if let Some(parent) = covering {
            return Ok(parent);
        }

        vp.lookup("..")
    }
}
