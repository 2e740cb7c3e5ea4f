//! Host bootstrap: configuration, telemetry and service registration.

use std::sync::Arc;

use hle_apt::{AptServices, AptState};
use hle_config::{Config, OrthoConfig};
use hle_ipc::{
    DispatchPolicy, Dispatcher, FacadeError, ModuleError, RegistryError, ResultCode,
    ServiceManager, SharedModule,
};
use ortho_config::OrthoError;
use thiserror::Error;
use tracing::{debug, info};

use crate::telemetry::{self, TelemetryError};

const BOOTSTRAP_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::bootstrap");

/// Module name of the APT state, also recorded in its snapshots.
pub const APT_MODULE: &str = "apt";

/// Abstracts configuration loading so tests can substitute it.
pub trait ConfigLoader: Send + Sync {
    /// Loads the host configuration.
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
    /// A facade could not be built.
    #[error("failed to build service facades: {source}")]
    Facade {
        /// Underlying facade error.
        #[source]
        source: FacadeError,
    },
    /// A facade could not be registered.
    #[error("failed to register service facades: {source}")]
    Registration {
        /// Underlying registry error.
        #[source]
        source: RegistryError,
    },
}

/// Dispatch policy described by `config`.
#[must_use]
pub const fn dispatch_policy(config: &Config) -> DispatchPolicy {
    DispatchPolicy::new(
        ResultCode::from_raw(config.unknown_result()),
        ResultCode::from_raw(config.stub_result()),
        ResultCode::from_raw(config.malformed_result()),
    )
}

/// The registered services and the configuration they were built from.
#[derive(Debug)]
pub struct Host {
    config: Config,
    manager: ServiceManager,
    apt: AptServices,
}

impl Host {
    /// Builds the services described by `config` and registers them.
    ///
    /// # Errors
    ///
    /// Returns [`BootstrapError`] when a facade cannot be built or
    /// registered.
    pub fn from_config(config: Config) -> Result<Self, BootstrapError> {
        let dispatcher = Dispatcher::with_policy(dispatch_policy(&config));
        let module = SharedModule::active(APT_MODULE, AptState::new(config.apt_new_3ds()));
        let apt = AptServices::new(module, config.apt_max_sessions(), &dispatcher)
            .map_err(|source| BootstrapError::Facade { source })?;
        let manager = ServiceManager::new();
        apt.register(&manager)
            .map_err(|source| BootstrapError::Registration { source })?;
        Ok(Self {
            config,
            manager,
            apt,
        })
    }

    /// Resolved configuration.
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Service manager holding every registered facade.
    #[must_use]
    pub const fn manager(&self) -> &ServiceManager {
        &self.manager
    }

    /// The APT facades and their shared module.
    #[must_use]
    pub const fn apt(&self) -> &AptServices {
        &self.apt
    }

    /// Releases the facades in reverse registration order, then tears down
    /// the modules behind them.
    ///
    /// # Errors
    ///
    /// Returns [`ModuleError`] when a module lock is poisoned.
    pub fn shutdown(&self) -> Result<(), ModuleError> {
        for port in self.manager.shutdown() {
            debug!(target: BOOTSTRAP_TARGET, service = port.name(), "facade released");
        }
        self.apt.module().tear_down()?;
        info!(target: BOOTSTRAP_TARGET, "host shut down");
        Ok(())
    }
}

/// Loads the configuration, installs telemetry and builds the host.
///
/// # Errors
///
/// Returns [`BootstrapError`] when any stage fails.
pub fn bootstrap_with(loader: &dyn ConfigLoader) -> Result<Host, BootstrapError> {
    let config = loader
        .load()
        .map_err(|source| BootstrapError::Configuration { source })?;
    telemetry::initialise(&config).map_err(|source| BootstrapError::Telemetry { source })?;
    let host = Host::from_config(config)?;
    info!(
        target: BOOTSTRAP_TARGET,
        services = ?host.manager.names(),
        max_sessions = host.config.apt_max_sessions(),
        "host bootstrapped"
    );
    Ok(host)
}
