//! Running an engine on a dedicated worker thread.

use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};

use super::engine::{Engine, RunOutcome};
use crate::error::Result;
use crate::telemetry::Publisher;
use crate::wind::WindFeed;

/// Run-level cancellation flag, checked by the engine at tick boundaries.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests the run to stop before its next tick.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Handle to a run executing on its worker thread.
#[derive(Debug)]
pub struct RunHandle {
    join: JoinHandle<Result<RunOutcome>>,
    cancel: CancelToken,
}

impl RunHandle {
    /// Asks the worker to stop at the next tick boundary.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    /// Waits for the worker.
    ///
    /// # Returns
    ///
    /// The run outcome, or `Err` carrying the panic payload if the worker
    /// panicked.
    pub fn join(self) -> thread::Result<Result<RunOutcome>> {
        self.join.join()
    }
}

/// Starts `engine` on a new thread, streaming into `publisher`.
///
/// Attach every consumer before calling this; records pushed before a
/// consumer attaches are not replayed.
///
/// # Errors
///
/// Returns an `io::Error` if the OS refuses to spawn the thread.
pub fn spawn_run<W>(
    mut engine: Engine<W>,
    publisher: Publisher,
    cancel: CancelToken,
) -> io::Result<RunHandle>
where
    W: WindFeed + Send + 'static,
{
    let worker_cancel = cancel.clone();
    let join = thread::Builder::new()
        .name("windgrid-engine".into())
        .spawn(move || engine.run_into(publisher, &worker_cancel))?;
    Ok(RunHandle { join, cancel })
}
