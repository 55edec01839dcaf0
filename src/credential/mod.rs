//! Reactive credential validity worker.
//!
//! - [`snapshot`]: credential key/snapshot values and the drift between two reads;
//! - [`facade`]: the read/watch collaborator the worker consumes;
//! - [`error`]: stop reasons ([`ValidatorError`]) and facade failures;
//! - [`outcome`]: the launcher-facing classification of a stop;
//! - [`config`]: validator configuration;
//! - [`validator`]: the worker itself.

mod config;
mod error;
mod facade;
mod outcome;
mod snapshot;
mod validator;

pub use config::ValidatorConfig;
pub use error::{UpstreamError, UpstreamOp, ValidatorError};
pub use facade::{BoxError, Facade, FacadeRef};
pub use outcome::Outcome;
pub use snapshot::{CredentialKey, Drift, Snapshot, StoredCredential};
pub use validator::CredentialValidator;
