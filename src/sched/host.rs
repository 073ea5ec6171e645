//! Scheduler de teste sobre threads do host.
//!
//! Cada thread do `std` recebe um `ThreadId` na primeira chamada de
//! `current_thread`. `suspend_current`/`wake` usam `park`/`unpark` mais um
//! token por thread, então um wake que chega antes do suspend não se perde.

use std::collections::HashMap;
use std::sync::Mutex;
use std::thread::{self, Thread};

use core::sync::atomic::{AtomicU64, Ordering};

use super::{Scheduler, ThreadId};

struct Parked {
    handle: Thread,
    token: bool,
}

pub struct HostScheduler {
    threads: Mutex<HashMap<ThreadId, Parked>>,
    next_id: AtomicU64,
}

std::thread_local! {
    static CURRENT_ID: core::cell::Cell<ThreadId> = const { core::cell::Cell::new(0) };
}

impl HostScheduler {
    pub fn new() -> Self {
        Self {
            threads: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }
}

impl Scheduler for HostScheduler {
    fn current_thread(&self) -> ThreadId {
        CURRENT_ID.with(|id| {
            if id.get() == 0 {
                let new = self.next_id.fetch_add(1, Ordering::Relaxed);
                self.threads.lock().unwrap().insert(
                    new,
                    Parked {
                        handle: thread::current(),
                        token: false,
                    },
                );
                id.set(new);
            }
            id.get()
        })
    }

    fn suspend_current(&self) {
        let me = self.current_thread();
        loop {
            {
                let mut threads = self.threads.lock().unwrap();
                let entry = threads.get_mut(&me).expect("thread not registered");
                if entry.token {
                    entry.token = false;
                    break;
                }
            }
            thread::park();
        }
    }

    fn wake(&self, thread: ThreadId) {
        let mut threads = self.threads.lock().unwrap();
        let entry = threads.get_mut(&thread).expect("waking unknown thread");
        entry.token = true;
        entry.handle.unpark();
    }
}

/// Instala (uma vez) e retorna o scheduler de teste global.
pub fn install() -> &'static HostScheduler {
    static HOST: spin::Once<HostScheduler> = spin::Once::new();
    let host = HOST.call_once(HostScheduler::new);
    let _ = super::install(host);
    host
}
