//! # Task abstraction.
//!
//! This module defines the [`Task`] trait (async, cancelable). The common handle type is
//! [`TaskRef`], an `Arc<dyn Task<E>>` suitable for sharing across the runtime.
//!
//! A task receives a [`CancellationToken`] and must select on it (or poll it) to
//! stop cooperatively once its supervisor starts dying.

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::TaskError;

/// Shared handle to a task object.
pub type TaskRef<E = TaskError> = Arc<dyn Task<E>>;

/// # Asynchronous, cancelable unit.
///
/// A `Task` has a stable [`name`](Task::name) and an async [`run`](Task::run) method that
/// receives the supervisor's [`CancellationToken`]. `E` is the supervisor's reason type.
///
/// # Example
/// ```
/// use tokio_util::sync::CancellationToken;
/// use async_trait::async_trait;
/// use fleetvisor::{Task, TaskError};
///
/// struct Demo;
///
/// #[async_trait]
/// impl Task for Demo {
///     fn name(&self) -> &str { "demo" }
///
///     async fn run(&self, ctx: CancellationToken) -> Result<(), TaskError> {
///         ctx.cancelled().await;
///         Err(TaskError::Dying)
///     }
/// }
/// ```
#[async_trait]
pub trait Task<E = TaskError>: Send + Sync + 'static {
    /// Returns a stable, human-readable task name.
    fn name(&self) -> &str;

    /// Executes the task until completion or cancellation.
    ///
    /// Returning `Err` stops the whole supervisor with that reason (unless an earlier
    /// reason was already recorded). A task noticing cancellation should return
    /// `Err(TaskError::Dying.into())` or `Ok(())`.
    async fn run(&self, ctx: CancellationToken) -> Result<(), E>;
}
