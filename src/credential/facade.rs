//! # Facade consumed by the credential validator.
//!
//! The facade is the worker's only window on the outside world: it reads the credential
//! bound to the unit and subscribes to changes of it. Its transport and persistence are
//! not this crate's concern.

use std::sync::Arc;

use async_trait::async_trait;

use crate::credential::snapshot::{CredentialKey, StoredCredential};
use crate::watcher::Watcher;

/// Error type returned by facade implementations.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Shared handle to a facade.
pub type FacadeRef = Arc<dyn Facade>;

/// Read and watch access to the credential a unit uses.
#[async_trait]
pub trait Facade: Send + Sync + 'static {
    /// Reads the credential bound to the unit.
    ///
    /// `Ok(None)` means the unit does not track a credential at all (e.g. it lives on a
    /// cloud that needs no authentication).
    async fn fetch_snapshot(&self) -> Result<Option<StoredCredential>, BoxError>;

    /// Subscribes to changes of the credential identified by `key`.
    async fn subscribe(&self, key: &CredentialKey) -> Result<Box<dyn Watcher>, BoxError>;
}
