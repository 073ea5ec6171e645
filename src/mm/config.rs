//! # Configuração do Módulo de Memória
//!
//! Constantes do heap do kernel e da família `malloc`.

// =============================================================================
// CONSTANTES DE TAMANHO
// =============================================================================

/// Tamanho de uma página (4 KiB)
pub const PAGE_SIZE: usize = 4096;

// =============================================================================
// CONFIGURAÇÃO DO HEAP
// =============================================================================

/// Alinhamento padrão de payloads (e de `malloc`)
pub const DEFAULT_ALIGN: usize = 16;

/// Menor payload que vale a pena separar num bloco livre próprio
pub const MIN_BLOCK_SPLIT_SIZE: usize = 32;

/// Maior alinhamento aceito por `alloc_aligned` (log2 cabe em 8 bits de flag)
pub const MAX_ALIGN: usize = 1 << 30;

// =============================================================================
// BOUNDARY TAGS
// =============================================================================

/// Magic do cabeçalho de bloco
pub const HEADER_MAGIC: u32 = 0x0724_2005;

/// Magic do rodapé de bloco
pub const TAIL_MAGIC: u32 = 0xdead_c0de;
