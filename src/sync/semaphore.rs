//! Semáforo de contagem com bloqueio real
//!
//! `wait` nunca faz busy-wait: sem unidades disponíveis, a thread entra na
//! `WaitQueue` e é suspensa pelo scheduler. `signal` entrega a unidade
//! diretamente ao waiter mais antigo (FIFO) sem mexer no `count`, então não
//! existe corrida entre acordar e outra thread "roubar" a unidade.

use crate::sched::{self, sync::WaitQueue};
use crate::sync::Spinlock;

struct SemState {
    count: i32,
    waiters: WaitQueue,
}

/// Semáforo de contagem
pub struct Semaphore {
    state: Spinlock<SemState>,
}

impl Semaphore {
    /// `semaphore_create(initial)`
    pub const fn new(initial: i32) -> Self {
        Self {
            state: Spinlock::new(SemState {
                count: initial,
                waiters: WaitQueue::new(),
            }),
        }
    }

    /// Decrementa (P/wait). Bloqueia a thread atual se `count == 0`.
    ///
    /// # Panics
    ///
    /// Se for preciso bloquear e nenhum scheduler estiver registrado.
    pub fn wait(&self) {
        let mut state = self.state.lock();
        if state.count > 0 {
            state.count -= 1;
            return;
        }

        let Some(scheduler) = sched::scheduler() else {
            drop(state);
            crate::kerror!("(Semaphore) wait bloqueante sem scheduler registrado");
            panic!("semaphore: blocking wait without a scheduler");
        };

        let me = scheduler.current_thread();
        state.waiters.enqueue(me);
        drop(state);

        // Um signal entre o drop e o suspend arma o token de wakeup.
        scheduler.suspend_current();
        crate::ktrace!("(Semaphore) thread acordada tid=", me);
    }

    /// Tenta decrementar sem bloquear
    pub fn try_wait(&self) -> bool {
        let mut state = self.state.lock();
        if state.count > 0 {
            state.count -= 1;
            true
        } else {
            false
        }
    }

    /// Incrementa (V/signal) ou acorda exatamente um waiter.
    pub fn signal(&self) {
        let mut state = self.state.lock();
        match state.waiters.dequeue() {
            Some(thread) => {
                drop(state);
                // Só há waiters se alguém passou pelo caminho bloqueante,
                // que exige scheduler.
                if let Some(scheduler) = sched::scheduler() {
                    scheduler.wake(thread);
                }
            }
            None => state.count += 1,
        }
    }

    /// Unidades disponíveis.
    pub fn count(&self) -> i32 {
        self.state.lock().count
    }

    /// Threads bloqueadas.
    pub fn waiters(&self) -> usize {
        self.state.lock().waiters.len()
    }

    #[cfg(test)]
    pub(crate) fn enqueue_waiter(&self, thread: sched::ThreadId) {
        self.state.lock().waiters.enqueue(thread);
    }
}

/// `semaphore_free`: destruir com threads bloqueadas é erro de programação.
impl Drop for Semaphore {
    fn drop(&mut self) {
        let waiters = self.state.get_mut().waiters.len();
        if waiters != 0 {
            crate::kerror!("(Semaphore) destruído com waiters=", waiters);
            panic!("semaphore: freed with blocked threads");
        }
    }
}
