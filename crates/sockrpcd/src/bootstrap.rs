//! Daemon bootstrap orchestration.
//!
//! Bootstrapping loads configuration, initialises telemetry, and prepares the
//! socket directory. The resulting [`Daemon`] owns the server context: the
//! resolved configuration and the immutable method registry behind a
//! [`Dispatcher`].

use std::sync::Arc;

use ortho_config::{OrthoConfig, OrthoError};
use thiserror::Error;
use tracing::info;

use sockrpc_config::{Config, SocketPreparationError};

use crate::dispatch::{ConnectionLimits, DispatchConnectionHandler, Dispatcher};
use crate::telemetry::{self, TelemetryError, TelemetryHandle};

const BOOTSTRAP_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::bootstrap");

/// Trait abstracting configuration loading for testability.
pub trait ConfigLoader: Send + Sync {
    /// Loads the daemon configuration.
    fn load(&self) -> Result<Config, Arc<OrthoError>>;
}

/// Loader that delegates to [`Config::load`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemConfigLoader;

impl ConfigLoader for SystemConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Config::load()
    }
}

/// Loader that returns a pre-resolved configuration.
#[derive(Debug, Clone)]
pub struct StaticConfigLoader {
    config: Config,
}

impl StaticConfigLoader {
    /// Wraps an already loaded configuration.
    #[must_use]
    pub const fn new(config: Config) -> Self {
        Self { config }
    }
}

impl ConfigLoader for StaticConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Ok(self.config.clone())
    }
}

/// Errors surfaced during bootstrap.
#[derive(Debug, Error)]
pub enum BootstrapError {
    /// Configuration failed to load.
    #[error("failed to load configuration: {source}")]
    Configuration {
        /// Underlying loader error.
        #[source]
        source: Arc<OrthoError>,
    },
    /// Telemetry initialisation failed.
    #[error("failed to initialise telemetry: {source}")]
    Telemetry {
        /// Underlying telemetry error.
        #[source]
        source: TelemetryError,
    },
    /// Socket preparation failed.
    #[error("failed to prepare daemon socket: {source}")]
    Socket {
        /// Filesystem error reported while preparing the socket directory.
        #[source]
        source: SocketPreparationError,
    },
}

/// Result of a successful bootstrap invocation.
#[derive(Debug, Clone)]
pub struct Daemon {
    config: Config,
    dispatcher: Dispatcher,
    telemetry: TelemetryHandle,
}

impl Daemon {
    /// Accessor for the resolved configuration.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Dispatcher over the built-in registry.
    #[must_use]
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Accessor for the telemetry handle, primarily useful for testing.
    #[must_use]
    pub fn telemetry(&self) -> TelemetryHandle {
        self.telemetry
    }

    /// Builds the connection handler served by the listener.
    #[must_use]
    pub fn connection_handler(&self) -> DispatchConnectionHandler {
        DispatchConnectionHandler::new(
            self.dispatcher.clone(),
            ConnectionLimits::from_config(&self.config),
        )
    }
}

/// Bootstraps the daemon using the supplied configuration loader.
///
/// # Errors
///
/// Returns [`BootstrapError`] when configuration, telemetry, or socket
/// directory preparation fails.
pub fn bootstrap_with(loader: &dyn ConfigLoader) -> Result<Daemon, BootstrapError> {
    let config = loader
        .load()
        .map_err(|source| BootstrapError::Configuration { source })?;
    let telemetry =
        telemetry::initialise(&config).map_err(|source| BootstrapError::Telemetry { source })?;
    config
        .prepare_socket_directory()
        .map_err(|source| BootstrapError::Socket { source })?;

    let dispatcher = Dispatcher::default();
    info!(
        target: BOOTSTRAP_TARGET,
        socket = %config.socket_path(),
        methods = ?dispatcher.registry().names(),
        "daemon bootstrap completed"
    );
    Ok(Daemon {
        config,
        dispatcher,
        telemetry,
    })
}
