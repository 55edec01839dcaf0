//! Errors of the credential validator.
//!
//! [`ValidatorError`] is the reason type of the validator's supervisor. Its sentinel
//! variants are expected terminal conditions that tell the launcher *why* the worker
//! bounced; [`UpstreamError`] wraps facade failures with the operation and key involved.

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::credential::facade::BoxError;
use crate::credential::snapshot::CredentialKey;
use crate::error::{StopReason, TaskError};

/// Facade operation that failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UpstreamOp {
    /// Reading the credential snapshot.
    Fetch,
    /// Subscribing to credential changes.
    Subscribe,
}

impl fmt::Display for UpstreamOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpstreamOp::Fetch => f.write_str("fetching credential"),
            UpstreamOp::Subscribe => f.write_str("watching credential"),
        }
    }
}

/// A facade call failed. Not retried by the worker.
#[derive(Error, Debug, Clone)]
#[error("{op}{}: {source}", describe_key(.key))]
pub struct UpstreamError {
    /// Which call failed.
    pub op: UpstreamOp,
    /// Credential involved, if one was known at that point.
    pub key: Option<CredentialKey>,
    /// Underlying facade error.
    #[source]
    pub source: Arc<dyn std::error::Error + Send + Sync>,
}

fn describe_key(key: &Option<CredentialKey>) -> String {
    match key {
        Some(key) => format!(" {:?}", key.as_str()),
        None => String::new(),
    }
}

impl UpstreamError {
    pub(crate) fn new(op: UpstreamOp, key: Option<&CredentialKey>, source: BoxError) -> Self {
        Self {
            op,
            key: key.cloned(),
            source: Arc::from(source),
        }
    }
}

/// # Why a credential validator stopped.
#[non_exhaustive]
#[derive(Error, Debug, Clone)]
pub enum ValidatorError {
    /// The tracked credential became valid or invalid.
    #[error("credential validity has changed")]
    ValidityChanged,

    /// The unit now uses a different credential.
    #[error("credential has been replaced")]
    CredentialChanged,

    /// The unit does not track a credential; there is nothing to validate.
    #[error("unit does not need a credential")]
    NotApplicable,

    /// A facade call failed.
    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    /// Supervisor-level reason (dying, panic).
    #[error(transparent)]
    Task(#[from] TaskError),
}

impl ValidatorError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            ValidatorError::ValidityChanged => "validity_changed",
            ValidatorError::CredentialChanged => "credential_changed",
            ValidatorError::NotApplicable => "not_applicable",
            ValidatorError::Upstream(_) => "upstream_failure",
            ValidatorError::Task(e) => e.as_label(),
        }
    }
}

impl StopReason for ValidatorError {
    fn task_error(&self) -> Option<&TaskError> {
        match self {
            ValidatorError::Task(e) => Some(e),
            _ => None,
        }
    }

    fn is_expected(&self) -> bool {
        matches!(
            self,
            ValidatorError::ValidityChanged
                | ValidatorError::CredentialChanged
                | ValidatorError::NotApplicable
        )
    }
}
