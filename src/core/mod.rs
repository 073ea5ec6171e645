//! Core Module
//!
//! Lógica central do kernel, independente de arquitetura: logging e o
//! modelo de objetos com contagem de referências.

pub mod logging;
pub mod object;
