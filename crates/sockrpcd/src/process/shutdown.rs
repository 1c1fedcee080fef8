//! Shutdown notification for the daemon's main thread.

use std::io;
use std::sync::{Mutex, PoisonError};
use std::thread;
use std::time::Duration;

use signal_hook::consts::signal::{SIGHUP, SIGINT, SIGQUIT, SIGTERM};
use signal_hook::iterator::Signals;
use thiserror::Error;
use tracing::info;

use super::PROCESS_TARGET;

const SIGNAL_POLL: Duration = Duration::from_millis(50);

/// Why the daemon stopped waiting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownCause {
    /// A termination signal arrived.
    Signal(i32),
    /// The listener stopped on its own, typically after a fatal accept error.
    ListenerStopped,
}

/// Abstraction over shutdown notification mechanisms.
pub trait ShutdownSignal: Send + Sync {
    /// Blocks until shutdown should proceed or `listener_stopped` reports
    /// that there is nothing left to wait for.
    fn wait(&self, listener_stopped: &dyn Fn() -> bool) -> Result<ShutdownCause, ShutdownError>;
}

/// Errors reported by shutdown signal listeners.
#[derive(Debug, Error)]
pub enum ShutdownError {
    /// Installing signal handlers failed.
    #[error("failed to install signal handlers: {source}")]
    Install {
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
}

/// Shutdown listener that waits for termination signals.
///
/// Handlers are registered on construction so a signal delivered while the
/// daemon is still binding its socket is not lost.
pub struct SystemShutdownSignal {
    signals: Mutex<Signals>,
}

impl SystemShutdownSignal {
    /// Registers handlers for SIGTERM, SIGINT, SIGQUIT and SIGHUP.
    ///
    /// # Errors
    ///
    /// Returns [`ShutdownError::Install`] if registration fails.
    pub fn install() -> Result<Self, ShutdownError> {
        let signals = Signals::new([SIGTERM, SIGINT, SIGQUIT, SIGHUP])
            .map_err(|source| ShutdownError::Install { source })?;
        Ok(Self {
            signals: Mutex::new(signals),
        })
    }
}

impl ShutdownSignal for SystemShutdownSignal {
    fn wait(&self, listener_stopped: &dyn Fn() -> bool) -> Result<ShutdownCause, ShutdownError> {
        let mut signals = self.signals.lock().unwrap_or_else(PoisonError::into_inner);
        loop {
            if let Some(signal) = signals.pending().next() {
                info!(target: PROCESS_TARGET, signal, "shutdown signal received");
                return Ok(ShutdownCause::Signal(signal));
            }
            if listener_stopped() {
                info!(target: PROCESS_TARGET, "listener stopped without a signal");
                return Ok(ShutdownCause::ListenerStopped);
            }
            thread::sleep(SIGNAL_POLL);
        }
    }
}
