//! # Supervisor configuration.
//!
//! Provides [`SupervisorConfig`], the settings shared by every supervisor instance.
//!
//! ## Sentinel values
//! - `bus_capacity = 0` → clamped to 1 by [`SupervisorConfig::bus_capacity_clamped`]

use std::borrow::Cow;

use crate::error::ConfigError;

/// Configuration for a single [`Supervisor`](crate::Supervisor).
///
/// ## Field semantics
/// - `name`: Identifies the supervisor in events and logs (must not be empty)
/// - `bus_capacity`: Event bus ring buffer size (min 1; clamped)
#[derive(Clone, Debug)]
pub struct SupervisorConfig {
    /// Name used in events, logs and errors.
    pub name: Cow<'static, str>,

    /// Capacity of the event bus broadcast channel ring buffer.
    ///
    /// Slow listeners that lag behind more than `bus_capacity` messages skip older items.
    pub bus_capacity: usize,
}

impl SupervisorConfig {
    /// Creates a config with the given name and default capacity.
    pub fn named(name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }

    /// Returns an error if the config cannot drive a functional supervisor.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::EmptyName);
        }
        Ok(())
    }
}

impl Default for SupervisorConfig {
    /// Default configuration:
    ///
    /// - `name = "supervisor"`
    /// - `bus_capacity = 1024`
    fn default() -> Self {
        Self {
            name: Cow::Borrowed("supervisor"),
            bus_capacity: 1024,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capacity_is_clamped() {
        let cfg = SupervisorConfig {
            bus_capacity: 0,
            ..SupervisorConfig::default()
        };
        assert_eq!(cfg.bus_capacity_clamped(), 1);
    }

    #[test]
    fn blank_name_is_rejected() {
        assert_eq!(
            SupervisorConfig::named("  ").validate(),
            Err(ConfigError::EmptyName)
        );
        assert!(SupervisorConfig::named("validator").validate().is_ok());
    }
}
