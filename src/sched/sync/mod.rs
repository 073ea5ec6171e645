//! Estruturas de espera usadas pelas primitivas bloqueantes.

pub mod waitqueue;

pub use waitqueue::WaitQueue;
