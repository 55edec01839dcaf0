//! Error types used by the supervisor runtime and supervised tasks.
//!
//! This module defines the supervisor-level error enums:
//!
//! - [`TaskError`] — reasons the supervisor itself can synthesize or that a generic task can return.
//! - [`RuntimeError`] — misuse of a supervisor (e.g. spawning into a dead one).
//! - [`ConfigError`] — a worker configuration that cannot drive a functional worker.
//!
//! Worker-specific reasons (such as [`ValidatorError`](crate::ValidatorError)) wrap [`TaskError`]
//! and implement [`StopReason`] so the supervisor can recognise the `Dying` acknowledgement
//! inside them.
//!
//! All types provide `as_label` for logging/metrics.

use thiserror::Error;

/// # Supervisor-level task errors.
///
/// Cloneable so that one recorded reason can be handed to every caller of
/// [`Supervisor::await_outcome`](crate::Supervisor::await_outcome).
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TaskError {
    /// The task exited because its supervisor is dying (or its input went away for good).
    ///
    /// Returned by a task while the supervisor is already dying, this only acknowledges
    /// the cancellation and never overrides the recorded reason.
    #[error("supervisor is dying")]
    Dying,

    /// The task panicked; the payload message is preserved.
    #[error("task panicked: {info}")]
    Panicked {
        /// Panic message (or `"unknown panic"` for non-string payloads).
        info: String,
    },

    /// Generic failure for ad-hoc tasks.
    #[error("execution failed: {error}")]
    Fail {
        /// The underlying error message.
        error: String,
    },
}

impl TaskError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use fleetvisor::TaskError;
    ///
    /// assert_eq!(TaskError::Dying.as_label(), "task_dying");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            TaskError::Dying => "task_dying",
            TaskError::Panicked { .. } => "task_panicked",
            TaskError::Fail { .. } => "task_failed",
        }
    }

    /// Shorthand for [`TaskError::Fail`].
    pub fn fail(error: impl Into<String>) -> Self {
        TaskError::Fail {
            error: error.into(),
        }
    }
}

/// # Reason recorded by a [`Supervisor`](crate::Supervisor).
///
/// Any worker error type can be used as the supervisor's reason as long as it can carry
/// a [`TaskError`] and report it back.
pub trait StopReason: std::error::Error + From<TaskError> + Clone + Send + Sync + 'static {
    /// Returns the supervisor-level error carried by this reason, if any.
    fn task_error(&self) -> Option<&TaskError>;

    /// True if this reason only acknowledges that the supervisor is dying.
    fn is_dying(&self) -> bool {
        matches!(self.task_error(), Some(TaskError::Dying))
    }

    /// True if this reason is an anticipated verdict rather than a fault.
    ///
    /// Expected reasons still stop the supervisor but are reported as exits, not failures.
    fn is_expected(&self) -> bool {
        false
    }
}

impl StopReason for TaskError {
    fn task_error(&self) -> Option<&TaskError> {
        Some(self)
    }
}

/// # Errors produced by the supervisor runtime.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RuntimeError {
    /// All tasks have already exited; the supervisor cannot accept new ones.
    #[error("supervisor {name:?} is dead; cannot spawn {task:?}")]
    AlreadyDead {
        /// Supervisor name.
        name: String,
        /// Name of the rejected task.
        task: String,
    },
}

impl RuntimeError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            RuntimeError::AlreadyDead { .. } => "runtime_already_dead",
        }
    }
}

/// # Invalid worker configuration.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// No facade was provided.
    #[error("nil facade not valid")]
    MissingFacade,

    /// The supervisor name is empty.
    #[error("empty supervisor name not valid")]
    EmptyName,
}

impl ConfigError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            ConfigError::MissingFacade => "config_missing_facade",
            ConfigError::EmptyName => "config_empty_name",
        }
    }
}
