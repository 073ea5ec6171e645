// =============================================================================
// KERNEL LOGGING SYSTEM - ZERO OVERHEAD
// =============================================================================
//
// Sistema de logging do Forge com custo ZERO quando desligado.
//
// ARQUITETURA:
// - Usa features do Cargo para compile-time filtering
// - Com feature "no_logs", TODOS os macros viram expressões vazias
// - O destino é a fachada `log`: o kernel hospedeiro instala o logger
//   (serial, framebuffer). Sem logger instalado nada é emitido.
//
// NÍVEIS DE LOG (do mais crítico ao menos):
// - ERROR: Erros fatais ou críticos
// - WARN:  Situações suspeitas mas recuperáveis
// - INFO:  Fluxo normal de execução
// - DEBUG: Informações de debugging
// - TRACE: Detalhes extremos (cada operação)
//
// FEATURES:
// - no_logs:   Remove 100% dos logs
// - log_error: ERROR, WARN
// - log_info:  ERROR, WARN, INFO
// - log_debug: ERROR, WARN, INFO, DEBUG
// - log_trace: Todos os níveis (padrão)
//
// COMO USAR:
//   kinfo!("(VFS) Inicializando...");          // Apenas string
//   kinfo!("(Heap) base=", 0x1000);            // String + hex
//   kinfo!("(VFS) fs=" => name);               // String + texto
//
// =============================================================================

#[doc(hidden)]
pub use log as __log;

/// Target usado em todos os registros do kernel.
pub const LOG_TARGET: &str = "forge";

/// Emissão comum a todos os níveis. Não usar diretamente.
#[doc(hidden)]
#[macro_export]
macro_rules! __kemit {
    ($lvl:ident, $msg:expr) => {{
        $crate::core::logging::__log::$lvl!(
            target: $crate::core::logging::LOG_TARGET,
            "{}",
            $msg
        );
    }};
    ($lvl:ident, $msg:expr => $text:expr) => {{
        $crate::core::logging::__log::$lvl!(
            target: $crate::core::logging::LOG_TARGET,
            "{}{}",
            $msg,
            $text
        );
    }};
    ($lvl:ident, $msg:expr, $val:expr) => {{
        $crate::core::logging::__log::$lvl!(
            target: $crate::core::logging::LOG_TARGET,
            "{}{:#x}",
            $msg,
            $val as u64
        );
    }};
}

// =============================================================================
// MACROS DE LOG - NÍVEL ERROR
// =============================================================================
//
// kerror! - Sempre ativo (exceto com no_logs)
// Usado para erros críticos que podem causar crash.
//

#[cfg(not(feature = "no_logs"))]
#[macro_export]
macro_rules! kerror {
    ($($t:tt)+) => {
        $crate::__kemit!(error, $($t)+)
    };
}

#[cfg(feature = "no_logs")]
#[macro_export]
macro_rules! kerror {
    ($($t:tt)*) => {{}};
}

// =============================================================================
// MACROS DE LOG - NÍVEL WARN
// =============================================================================

#[cfg(not(feature = "no_logs"))]
#[macro_export]
macro_rules! kwarn {
    ($($t:tt)+) => {
        $crate::__kemit!(warn, $($t)+)
    };
}

#[cfg(feature = "no_logs")]
#[macro_export]
macro_rules! kwarn {
    ($($t:tt)*) => {{}};
}

// =============================================================================
// MACROS DE LOG - NÍVEL INFO
// =============================================================================

#[cfg(all(
    not(feature = "no_logs"),
    any(feature = "log_info", feature = "log_debug", feature = "log_trace")
))]
#[macro_export]
macro_rules! kinfo {
    ($($t:tt)+) => {
        $crate::__kemit!(info, $($t)+)
    };
}

#[cfg(not(all(
    not(feature = "no_logs"),
    any(feature = "log_info", feature = "log_debug", feature = "log_trace")
)))]
#[macro_export]
macro_rules! kinfo {
    ($($t:tt)*) => {{}};
}

// =============================================================================
// MACROS DE LOG - NÍVEL DEBUG
// =============================================================================

#[cfg(all(
    not(feature = "no_logs"),
    any(feature = "log_debug", feature = "log_trace")
))]
#[macro_export]
macro_rules! kdebug {
    ($($t:tt)+) => {
        $crate::__kemit!(debug, $($t)+)
    };
}

#[cfg(not(all(
    not(feature = "no_logs"),
    any(feature = "log_debug", feature = "log_trace")
)))]
#[macro_export]
macro_rules! kdebug {
    ($($t:tt)*) => {{}};
}

// =============================================================================
// MACROS DE LOG - NÍVEL TRACE
// =============================================================================
//
// ktrace! - Ativo apenas com log_trace
// Usado para detalhes extremos de cada operação.
//

#[cfg(all(not(feature = "no_logs"), feature = "log_trace"))]
#[macro_export]
macro_rules! ktrace {
    ($($t:tt)+) => {
        $crate::__kemit!(trace, $($t)+)
    };
}

#[cfg(not(all(not(feature = "no_logs"), feature = "log_trace")))]
#[macro_export]
macro_rules! ktrace {
    ($($t:tt)*) => {{}};
}
