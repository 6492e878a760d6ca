use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::trace;

use crate::error::{DeviceError, Result};

/// One-shot timer running its action on a dedicated thread.
///
/// Cancelling (or dropping) the timer before it fires suppresses the action.
/// Cancellation does not interrupt an action that already started.
#[derive(Debug)]
pub struct Timer {
    cancel: Sender<()>,
    thread: JoinHandle<()>,
}

impl Timer {
    /// Run `action` once `delay` has elapsed, unless cancelled first.
    pub fn start<F>(name: &str, delay: Duration, action: F) -> Result<Self>
    where
        F: FnOnce() + Send + 'static,
    {
        let (cancel, cancelled) = mpsc::channel::<()>();
        let label = name.to_string();
        let thread = thread::Builder::new()
            .name(format!("timer-{name}"))
            .spawn(move || match cancelled.recv_timeout(delay) {
                Err(RecvTimeoutError::Timeout) => {
                    trace!(timer = %label, "timer fired");
                    action();
                }
                Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                    trace!(timer = %label, "timer cancelled");
                }
            })
            .map_err(DeviceError::Spawn)?;

        Ok(Self { cancel, thread })
    }

    /// Stop the timer if it has not fired yet.
    pub fn cancel(self) {
        let _ = self.cancel.send(());
    }

    /// Whether the timer thread has finished (fired or cancelled).
    pub fn is_finished(&self) -> bool {
        self.thread.is_finished()
    }
}
