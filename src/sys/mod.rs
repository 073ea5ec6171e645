//! System Definitions (ABI).
//!
//! Códigos de erro do kernel e sua tradução para a ABI POSIX.

pub mod error;

pub use error::{Errno, KError, KResult};
