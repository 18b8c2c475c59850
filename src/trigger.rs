//! Event and timer triggers feeding `dump()`.
//!
//! Four host events (status change, idle change, sign-on, sign-off) carry no
//! payload the logger cares about; each one just means "re-sample now". The
//! hub collapses them onto a channel drained by a single worker thread that
//! calls [`CsvLogger::dump`]. A periodic timer reuses the exact same entry
//! point: the gate's minimum delay is the only throttle, the timer adds no
//! second delay mechanism of its own.

use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread::JoinHandle;
use std::time::Duration;

use tracing::{debug, info, trace};

use crate::logger::CsvLogger;
use crate::roster::RosterSource;

/// Which host event requested the dump. Informational only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerKind {
    StatusChanged,
    IdleChanged,
    SignedOn,
    SignedOff,
}

enum Message {
    Fire(TriggerKind),
    Stop,
}

/// Cloneable sender side of the hub: host callbacks hold one of these.
#[derive(Clone)]
pub struct TriggerHandle {
    tx: Sender<Message>,
}

impl TriggerHandle {
    /// Requests a dump. Never blocks and never fails; firing after the hub
    /// has stopped is a no-op.
    pub fn fire(&self, kind: TriggerKind) {
        trace!("trigger fired: {:?}", kind);
        let _ = self.tx.send(Message::Fire(kind));
    }
}

/// Owns the worker thread that turns trigger messages into dumps.
///
/// `start` is the load hook: it performs one immediate dump (creating the
/// file and header when absent) before any trigger can fire. `stop` is the
/// unload hook: it drains the worker and releases everything; it also runs
/// on drop.
pub struct TriggerHub {
    tx: Sender<Message>,
    worker: Option<JoinHandle<()>>,
}

impl TriggerHub {
    /// Dumps once, then starts the worker.
    ///
    /// With `cycle = None` the worker only wakes for trigger messages (event
    /// mode). With `cycle = Some(d)` it additionally dumps every `d` of
    /// message silence (timer mode); the gate still rate-limits the writes.
    pub fn start<S>(logger: CsvLogger<S>, cycle: Option<Duration>) -> Self
    where
        S: RosterSource + 'static,
    {
        logger.dump();

        let (tx, rx) = mpsc::channel();
        let worker = std::thread::spawn(move || {
            loop {
                let message = match cycle {
                    Some(cycle) => match rx.recv_timeout(cycle) {
                        Ok(m) => m,
                        Err(RecvTimeoutError::Timeout) => {
                            trace!("timer cycle elapsed");
                            logger.dump();
                            continue;
                        }
                        Err(RecvTimeoutError::Disconnected) => break,
                    },
                    None => match rx.recv() {
                        Ok(m) => m,
                        Err(_) => break,
                    },
                };

                match message {
                    Message::Fire(_) => logger.dump(),
                    Message::Stop => break,
                }
            }
            debug!("trigger worker stopped");
        });

        info!(
            "trigger hub started ({} mode)",
            if cycle.is_some() { "timer" } else { "event" }
        );
        Self {
            tx,
            worker: Some(worker),
        }
    }

    /// Handle for host callbacks; clone freely across threads.
    pub fn handle(&self) -> TriggerHandle {
        TriggerHandle {
            tx: self.tx.clone(),
        }
    }

    /// Stops the worker and waits for it to finish any in-flight dump.
    pub fn stop(&mut self) {
        if let Some(worker) = self.worker.take() {
            let _ = self.tx.send(Message::Stop);
            let _ = worker.join();
        }
    }
}

impl Drop for TriggerHub {
    fn drop(&mut self) {
        self.stop();
    }
}
