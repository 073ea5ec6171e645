//! # Object - Sistema de Objetos do Kernel
//!
//! Objetos compartilhados do kernel (vnodes, mounts, estado de drivers)
//! vivem em blocos do heap com um cabeçalho `{refcount, deallocator}`.
//!
//! ## Modelo de Posse
//!
//! ```text
//! exclusiva      mount ──► root vnode      (KRef dentro de RefSlot)
//! compartilhada  KRef<T> clonado           (refcount atômico)
//! fraca          vnode ──► mount           (Koid, nunca conta referência)
//! ```
//!
//! Ciclos de referências fortes são proibidos por construção: back-references
//! são sempre `Koid`.

pub mod kobject;
pub mod kref;
pub mod refcount;

#[cfg(feature = "self_test")]
pub mod test;


pub use kobject::{generate_koid, Koid, KOID_INVALID};
pub use kref::{assign, unref, Deallocator, KRef, RefSlot};
pub use refcount::RefCount;
