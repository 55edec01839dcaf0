//! # Credential validator configuration.
//!
//! [`ValidatorConfig`] carries the facade the worker reads from, the settings of the
//! supervisor that hosts it, and the event subscribers to attach.

use std::sync::Arc;

use crate::config::SupervisorConfig;
use crate::credential::facade::FacadeRef;
use crate::error::ConfigError;
use crate::subscribers::Subscribe;

/// Configuration for a [`CredentialValidator`](crate::CredentialValidator).
#[derive(Clone)]
pub struct ValidatorConfig {
    /// Source of credential snapshots and change subscriptions. Required.
    pub facade: Option<FacadeRef>,

    /// Settings of the hosting supervisor; its name tags every event.
    pub supervisor: SupervisorConfig,

    /// Observability subscribers; empty means no event fan-out.
    pub subscribers: Vec<Arc<dyn Subscribe>>,
}

impl ValidatorConfig {
    /// Creates a config around `facade` with default supervisor settings.
    pub fn new(facade: FacadeRef) -> Self {
        Self {
            facade: Some(facade),
            ..Self::default()
        }
    }

    /// Renames the hosting supervisor.
    pub fn with_name(mut self, name: impl Into<std::borrow::Cow<'static, str>>) -> Self {
        self.supervisor.name = name.into();
        self
    }

    /// Sets event subscribers.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Returns an error if the validator cannot be started with this config.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.facade.is_none() {
            return Err(ConfigError::MissingFacade);
        }
        self.supervisor.validate()
    }
}

impl Default for ValidatorConfig {
    /// No facade; supervisor named `"credential-validator"`.
    fn default() -> Self {
        Self {
            facade: None,
            supervisor: SupervisorConfig::named("credential-validator"),
            subscribers: Vec::new(),
        }
    }
}

impl std::fmt::Debug for ValidatorConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValidatorConfig")
            .field("facade", &self.facade.as_ref().map(|_| "<facade>"))
            .field("supervisor", &self.supervisor)
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}
