//! Parsing de caminhos

use crate::fs::config::{NAME_MAX, PATH_MAX};
use crate::sys::error::{KError, KResult};

/// Iterador sobre componentes de caminho.
///
/// Barras repetidas são ignoradas: `"/a//b/"` produz `a`, `b`.
pub struct PathComponents<'a> {
    remaining: &'a str,
}

impl<'a> PathComponents<'a> {
    pub fn new(path: &'a str) -> Self {
        Self { remaining: path }
    }
}

impl<'a> Iterator for PathComponents<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        self.remaining = self.remaining.trim_start_matches('/');
        if self.remaining.is_empty() {
            return None;
        }

        match self.remaining.find('/') {
            Some(pos) => {
                let component = &self.remaining[..pos];
                self.remaining = &self.remaining[pos + 1..];
                Some(component)
            }
            None => {
                let component = self.remaining;
                self.remaining = "";
                Some(component)
            }
        }
    }
}

/// Verifica se caminho é absoluto
pub fn is_absolute(path: &str) -> bool {
    path.starts_with('/')
}

/// Valida o tamanho de um caminho inteiro.
pub fn check_path(path: &str) -> KResult<()> {
    if path.is_empty() {
        return Err(KError::NoSuchEntry);
    }
    if path.len() > PATH_MAX {
        return Err(KError::NameTooLong);
    }
    Ok(())
}

/// Valida um único componente.
pub fn check_name(name: &str) -> KResult<()> {
    if name.is_empty() || name.contains('/') {
        return Err(KError::InvalidArgument);
    }
    if name.len() > NAME_MAX {
        return Err(KError::NameTooLong);
    }
    Ok(())
}

/// Separa o último componente: `"/mnt/disk/"` → `("/mnt", "disk")`.
///
/// Retorna `None` para a raiz (`"/"`, `"//"`).
pub fn split_last(path: &str) -> Option<(&str, &str)> {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        return None;
    }
    match trimmed.rfind('/') {
        Some(0) => Some(("/", &trimmed[1..])),
        Some(pos) => Some((&trimmed[..pos], &trimmed[pos + 1..])),
        None => Some((".", trimmed)),
    }
}
