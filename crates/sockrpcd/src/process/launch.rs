//! Supervises daemon launch sequencing and runtime orchestration.

use std::sync::Arc;

use tracing::{info, warn};

use crate::bootstrap::{ConfigLoader, SystemConfigLoader, bootstrap_with};
use crate::transport::SocketListener;

use super::errors::LaunchError;
use super::shutdown::{ShutdownCause, ShutdownSignal, SystemShutdownSignal};
use super::PROCESS_TARGET;

/// Collaborators required to launch the daemon runtime.
#[derive(Debug, Clone)]
pub struct LaunchPlan<L, S> {
    /// Source of the daemon configuration.
    pub loader: L,
    /// Trigger that ends the serving phase.
    pub shutdown: S,
}

/// Runs the daemon using the production collaborators.
///
/// # Errors
///
/// Returns [`LaunchError`] when bootstrap, binding, or signal handling fails,
/// or when the accept loop stops on a fatal transport error.
pub fn run_daemon() -> Result<(), LaunchError> {
    let shutdown = SystemShutdownSignal::install()?;
    run_daemon_with(LaunchPlan {
        loader: SystemConfigLoader,
        shutdown,
    })
}

/// Runs the daemon with injected collaborators.
///
/// The listener is always shut down and joined once serving ends, so the
/// socket file is removed on every exit path after a successful bind.
///
/// # Errors
///
/// See [`run_daemon`].
pub fn run_daemon_with<L, S>(plan: LaunchPlan<L, S>) -> Result<(), LaunchError>
where
    L: ConfigLoader,
    S: ShutdownSignal,
{
    let LaunchPlan { loader, shutdown } = plan;
    info!(target: PROCESS_TARGET, "starting daemon runtime");

    let daemon = bootstrap_with(&loader)?;
    let listener = SocketListener::bind(daemon.config().socket_path())?;
    let handler = Arc::new(daemon.connection_handler());
    let listener_handle = listener.start(handler)?;
    info!(
        target: PROCESS_TARGET,
        socket = %daemon.config().socket_path(),
        "daemon ready"
    );

    let waited = shutdown.wait(&|| listener_handle.is_finished());
    if let Ok(ShutdownCause::ListenerStopped) = waited {
        warn!(target: PROCESS_TARGET, "accept loop ended unexpectedly");
    }
    listener_handle.shutdown();
    let joined = match daemon.config().io_timeout() {
        Some(drain) => listener_handle.join_within(drain),
        None => listener_handle.join(),
    };

    waited?;
    joined?;
    info!(target: PROCESS_TARGET, "shutdown sequence completed");
    Ok(())
}
