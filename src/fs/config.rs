//! Configuração do VFS
//!
//! Limites de caminho. Constantes de formato de cada filesystem ficam no
//! próprio driver.

/// Tamanho máximo de um componente de caminho (bytes).
pub const NAME_MAX: usize = 255;

/// Tamanho máximo de um caminho completo (bytes).
pub const PATH_MAX: usize = 4096;
