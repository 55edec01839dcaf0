//! # Runtime events emitted by supervisors and reactive workers.
//!
//! The [`EventKind`] enum classifies event types across three categories:
//! - **Supervisor events**: task lifecycle and the `Alive → Dying → Dead` transitions
//! - **Worker events**: what a reactive worker observed (fetches, changes, verdicts)
//! - **Subscriber events**: delivery problems inside the fan-out itself
//!
//! The [`Event`] struct carries additional metadata such as timestamps, task name,
//! credential key and reasons.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//! Use `seq` to restore the exact order when events are delivered out of order.
//!
//! ## Example
//! ```rust
//! use fleetvisor::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::TaskFailed)
//!     .with_source("validator")
//!     .with_task("credential-validator")
//!     .with_reason("boom");
//!
//! assert_eq!(ev.kind, EventKind::TaskFailed);
//! assert_eq!(ev.task.as_deref(), Some("credential-validator"));
//! assert_eq!(ev.reason.as_deref(), Some("boom"));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::SystemTime;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Subscriber events ===
    /// Subscriber panicked during event processing.
    ///
    /// Sets `task` (subscriber name) and `reason` (panic message).
    SubscriberPanicked,

    /// Subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets `task` (subscriber name) and `reason` (`"full"` / `"closed"`).
    SubscriberOverflow,

    // === Supervisor events ===
    /// A task was registered and started.
    ///
    /// Sets `source`, `task`.
    TaskSpawned,

    /// A task was rejected because the supervisor is already dead.
    ///
    /// Sets `source`, `task`.
    SpawnRejected,

    /// A task returned without error, acknowledged a dying supervisor or stopped with an
    /// expected verdict.
    ///
    /// Sets `source`, `task`, and `reason` for a verdict.
    TaskExited,

    /// A task returned an error.
    ///
    /// Sets `source`, `task`, `reason`.
    TaskFailed,

    /// A task panicked; the panic was converted into a failure.
    ///
    /// Sets `source`, `task`, `reason`.
    TaskPanicked,

    /// The supervisor entered `Dying` (external stop or first failure).
    ///
    /// Sets `source`, and `reason` unless the stop was clean.
    StopRequested,

    /// All tasks exited; the supervisor is `Dead`.
    ///
    /// Sets `source`, and `reason` unless the stop was clean.
    SupervisorDead,

    // === Worker events ===
    /// A snapshot was fetched.
    ///
    /// Sets `source`, `key`, `valid`.
    CredentialFetched,

    /// The unit does not track a credential; the worker is not applicable.
    ///
    /// Sets `source`.
    CredentialNotSet,

    /// The worker subscribed to changes and is now watching.
    ///
    /// Sets `source`, `key`.
    WatchStarted,

    /// A change arrived but the re-fetched snapshot did not differ.
    ///
    /// Sets `source`, `key`.
    ChangeIgnored,

    /// The tracked credential was replaced by another one.
    ///
    /// Sets `source`, `key` (the new key), `reason` (the old key).
    CredentialChanged,

    /// The validity flag of the tracked credential flipped.
    ///
    /// Sets `source`, `key`, `valid` (the new value).
    ValidityChanged,

    /// The change stream closed; no further changes will be delivered.
    ///
    /// Sets `source`, `key`.
    WatchClosed,

    /// A facade call failed.
    ///
    /// Sets `source`, `reason`, and `key` if one was involved.
    UpstreamFailed,
}

/// Runtime event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Name of the supervisor (or worker) that emitted the event.
    pub source: Option<Arc<str>>,
    /// Name of the task, if applicable.
    pub task: Option<Arc<str>>,
    /// Credential key, if applicable.
    pub key: Option<Arc<str>>,
    /// Credential validity, if applicable.
    pub valid: Option<bool>,
    /// Human-readable reason (errors, overflow details, etc.).
    pub reason: Option<Arc<str>>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            source: None,
            task: None,
            key: None,
            valid: None,
            reason: None,
        }
    }

    /// Attaches the emitting supervisor/worker name.
    #[inline]
    pub fn with_source(mut self, source: impl Into<Arc<str>>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Attaches a task name.
    #[inline]
    pub fn with_task(mut self, task: impl Into<Arc<str>>) -> Self {
        self.task = Some(task.into());
        self
    }

    /// Attaches a credential key.
    #[inline]
    pub fn with_key(mut self, key: impl Into<Arc<str>>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Attaches a validity flag.
    #[inline]
    pub fn with_valid(mut self, valid: bool) -> Self {
        self.valid = Some(valid);
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attaches a reason only if one is given.
    #[inline]
    pub fn with_reason_opt(self, reason: Option<String>) -> Self {
        match reason {
            Some(r) => self.with_reason(r),
            None => self,
        }
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::SubscriberOverflow)
            .with_task(subscriber)
            .with_reason(reason)
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_task(subscriber)
            .with_reason(info)
    }

    #[inline]
    pub fn is_subscriber_overflow(&self) -> bool {
        matches!(self.kind, EventKind::SubscriberOverflow)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_is_monotonic() {
        let a = Event::new(EventKind::TaskSpawned);
        let b = Event::new(EventKind::TaskExited);
        assert!(b.seq > a.seq);
    }

    #[test]
    fn optional_reason_is_skipped_when_absent() {
        let ev = Event::new(EventKind::StopRequested).with_reason_opt(None);
        assert!(ev.reason.is_none());
        let ev = ev.with_reason_opt(Some("boom".into()));
        assert_eq!(ev.reason.as_deref(), Some("boom"));
    }
}
