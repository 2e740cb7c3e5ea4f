//! The `APT:U`, `APT:A` and `APT:S` facades.

use std::sync::Arc;

use hle_ipc::{
    Dispatcher, FacadeError, RegistryError, ServiceFacade, ServiceManager, ServicePort,
    SharedModule,
};
use tracing::info;

use crate::commands::apt_commands;
use crate::state::AptState;

/// User-facing facade.
pub const APT_U: &str = "APT:U";
/// Applet-facing facade.
pub const APT_A: &str = "APT:A";
/// System-facing facade.
pub const APT_S: &str = "APT:S";

/// Default session cap of each facade.
pub const MAX_APT_SESSIONS: u32 = 8;

const FACADE_NAMES: [&str; 3] = [APT_U, APT_A, APT_S];
const FACADES_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::facades");

/// The three APT facades bound to one module.
#[derive(Debug)]
pub struct AptServices {
    module: SharedModule<AptState>,
    facades: Vec<Arc<ServiceFacade<AptState>>>,
}

impl AptServices {
    /// Builds every facade over `module`.
    ///
    /// # Errors
    ///
    /// Returns [`FacadeError`] when the module is not active.
    pub fn new(
        module: SharedModule<AptState>,
        max_sessions: u32,
        dispatcher: &Dispatcher,
    ) -> Result<Self, FacadeError> {
        let facades = FACADE_NAMES
            .iter()
            .map(|name| {
                ServiceFacade::new(
                    module.clone(),
                    *name,
                    max_sessions,
                    apt_commands(),
                    dispatcher.clone(),
                )
                .map(Arc::new)
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { module, facades })
    }

    /// Shared module behind the facades.
    #[must_use]
    pub const fn module(&self) -> &SharedModule<AptState> {
        &self.module
    }

    /// Facades in registration order.
    #[must_use]
    pub fn facades(&self) -> &[Arc<ServiceFacade<AptState>>] {
        &self.facades
    }

    /// Facade registered under `name`.
    #[must_use]
    pub fn facade(&self, name: &str) -> Option<&Arc<ServiceFacade<AptState>>> {
        self.facades.iter().find(|facade| facade.name() == name)
    }

    /// Registers every facade with `manager`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError`] when a facade name is already taken.
    pub fn register(&self, manager: &ServiceManager) -> Result<(), RegistryError> {
        for facade in &self.facades {
            manager.register(Arc::clone(facade) as Arc<dyn ServicePort>)?;
        }
        info!(
            target: FACADES_TARGET,
            facades = self.facades.len(),
            "apt services registered"
        );
        Ok(())
    }
}
