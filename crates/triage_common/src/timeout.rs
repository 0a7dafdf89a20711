//! Bounded execution of a single strategy on a worker thread

use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use crate::error::FactError;
use crate::executor::guarded;

/// Run `operation` on its own thread and wait at most `timeout` for it.
///
/// On timeout the worker is left to finish on its own; whatever it sends
/// afterwards goes nowhere.
pub(crate) fn run_with_timeout<T, F>(operation: F, timeout: Duration) -> Result<T, FactError>
where
    F: FnOnce() -> Result<T, FactError> + Send + 'static,
    T: Send + 'static,
{
    let (tx, rx) = mpsc::sync_channel(1);

    let spawned = thread::Builder::new()
        .name("triage-strategy".to_string())
        .spawn(move || {
            let _ = tx.send(guarded(operation));
        });

    if let Err(e) = spawned {
        return Err(FactError::new(format!("failed to start strategy worker: {}", e))
            .category("Runtime"));
    }

    match rx.recv_timeout(timeout) {
        Ok(result) => result,
        Err(RecvTimeoutError::Timeout) => Err(FactError::timeout(timeout)),
        Err(RecvTimeoutError::Disconnected) => {
            Err(FactError::new("strategy worker exited without a result").category("Runtime"))
        }
    }
}
