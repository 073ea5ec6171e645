//! # Scheduler Boundary
//!
//! O substrato não escalona threads: ele apenas precisa de um par
//! "suspender a thread atual" / "acordar a thread X" para implementar
//! primitivas bloqueantes (`Semaphore`). O scheduler real do kernel
//! implementa [`Scheduler`] e se registra uma vez no boot via [`install`].
//!
//! ## Contrato
//!
//! - `wake(t)` antes de `t` chamar `suspend_current()` NÃO pode ser perdido:
//!   o próximo `suspend_current()` de `t` retorna imediatamente (token de
//!   wakeup, como `park`/`unpark`).
//! - `suspend_current()` pode retornar espuriamente apenas se o chamador
//!   revalidar a condição; o `Semaphore` entrega o recurso junto com o wake,
//!   então cada wake corresponde a exatamente um retorno.

pub mod sync;

#[cfg(test)]
pub mod host;

use spin::Once;

use crate::sys::error::{KError, KResult};

/// Identificador de thread do kernel.
pub type ThreadId = u64;

/// Operações que o scheduler fornece ao substrato.
pub trait Scheduler: Send + Sync {
    /// Thread que está executando agora.
    fn current_thread(&self) -> ThreadId;

    /// Bloqueia a thread atual até um `wake` correspondente.
    fn suspend_current(&self);

    /// Torna `thread` executável (ou arma seu token de wakeup).
    fn wake(&self, thread: ThreadId);
}

static SCHEDULER: Once<&'static dyn Scheduler> = Once::new();

/// Registra o scheduler do kernel. Só pode ser chamado uma vez.
pub fn install(scheduler: &'static dyn Scheduler) -> KResult<()> {
    let mut installed = false;
    SCHEDULER.call_once(|| {
        installed = true;
        scheduler
    });

    if installed {
        crate::kinfo!("(Sched) Scheduler registrado");
        Ok(())
    } else {
        crate::kwarn!("(Sched) Scheduler já estava registrado");
        Err(KError::Busy)
    }
}

/// Scheduler registrado, se houver.
pub fn scheduler() -> Option<&'static dyn Scheduler> {
    SCHEDULER.get().copied()
}
