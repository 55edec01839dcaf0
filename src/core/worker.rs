//! # Worker contract.
//!
//! The two-phase lifecycle handle every long-lived background unit exposes to the
//! process that launched it: ask it to stop, then wait for its final reason.
//!
//! [`Supervisor`](crate::Supervisor) and [`CredentialValidator`](crate::CredentialValidator)
//! implement it, and [`Supervisor::add`](crate::Supervisor::add) accepts any implementation,
//! which is how supervisors nest.

use async_trait::async_trait;

use crate::error::TaskError;

/// A running unit that can be stopped and waited for.
#[async_trait]
pub trait Worker<E = TaskError>: Send + Sync + 'static {
    /// Requests a clean stop. Idempotent and non-blocking.
    fn kill(&self);

    /// Waits until the worker has fully stopped and returns its reason (`Ok` if clean).
    async fn wait(&self) -> Result<(), E>;
}
