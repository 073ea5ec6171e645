//! Wait queues para bloqueio e sincronização
//!
//! Fila FIFO de threads bloqueadas aguardando um evento. A fila não tem lock
//! próprio: o dono (ex.: `Semaphore`) a protege junto com o estado que decide
//! quem dorme, senão um wake poderia escapar entre o teste e o enqueue.

use alloc::collections::VecDeque;

use crate::sched::ThreadId;

/// Wait queue - fila de threads bloqueadas aguardando um evento.
pub struct WaitQueue {
    waiters: VecDeque<ThreadId>,
}

impl WaitQueue {
    /// Cria nova waitqueue vazia
    pub const fn new() -> Self {
        Self {
            waiters: VecDeque::new(),
        }
    }

    /// Enfileira `thread` no final da fila.
    pub fn enqueue(&mut self, thread: ThreadId) {
        self.waiters.push_back(thread);
    }

    /// Retira a thread mais antiga (FIFO).
    pub fn dequeue(&mut self) -> Option<ThreadId> {
        self.waiters.pop_front()
    }

    pub fn len(&self) -> usize {
        self.waiters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.waiters.is_empty()
    }
}

impl Default for WaitQueue {
    fn default() -> Self {
        Self::new()
    }
}
