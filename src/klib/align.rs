//! # Funções de Alinhamento de Memória
//!
//! Funções utilitárias para alinhamento de endereços e valores.
//! `align` deve ser potência de dois.

/// Alinha um valor para cima ao próximo múltiplo de `align`.
///
/// # Exemplo
/// ```
/// assert_eq!(align_up(10, 4), 12);
/// assert_eq!(align_up(16, 4), 16);
/// ```
#[inline(always)]
pub const fn align_up(val: usize, align: usize) -> usize {
    (val + align - 1) & !(align - 1)
}

/// Alinha um valor para baixo ao múltiplo anterior de `align`.
///
/// # Exemplo
/// ```
/// assert_eq!(align_down(10, 4), 8);
/// assert_eq!(align_down(16, 4), 16);
/// ```
#[inline(always)]
pub const fn align_down(val: usize, align: usize) -> usize {
    val & !(align - 1)
}

/// Verifica se um valor está alinhado a `align`.
#[inline(always)]
pub const fn is_aligned(val: usize, align: usize) -> bool {
    val & (align - 1) == 0
}

/// `align_up` que reporta overflow em vez de dar a volta.
#[inline]
pub const fn checked_align_up(val: usize, align: usize) -> Option<usize> {
    match val.checked_add(align - 1) {
        Some(v) => Some(v & !(align - 1)),
        None => None,
    }
}
