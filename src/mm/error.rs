//! Tipos de Erro do Subsistema de Memória
//!
//! Define erros estruturados para diagnóstico preciso de falhas em MM.

/// Erros do subsistema de memória
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MmError {
    /// Nenhum bloco livre comporta o pedido (OOM)
    OutOfMemory,
    /// Alinhamento não é potência de dois (ou é grande demais)
    InvalidAlignment,
    /// Tamanho inválido (zero ou muito grande)
    InvalidSize,
    /// Endereço fora do heap ou desalinhado
    InvalidAddress,
    /// Double free detectado
    DoubleFree,
    /// Boundary tag corrompida
    Corrupted,
    /// Heap usado antes de `init`
    NotInitialized,
    /// Falha na inicialização (ex.: `init` chamado duas vezes)
    InitFailed,
}

impl MmError {
    /// Retorna descrição legível do erro
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OutOfMemory => "OOM: nenhum bloco livre comporta o pedido",
            Self::InvalidAlignment => "Alinhamento inválido",
            Self::InvalidSize => "Tamanho inválido",
            Self::InvalidAddress => "Endereço inválido",
            Self::DoubleFree => "Double free detectado",
            Self::Corrupted => "Boundary tag corrompida",
            Self::NotInitialized => "Heap não inicializado",
            Self::InitFailed => "Falha na inicialização",
        }
    }
}

impl core::fmt::Display for MmError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Tipo Result específico para operações de memória
pub type MmResult<T> = Result<T, MmError>;
