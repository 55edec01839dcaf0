//! # LogWriter — renders events through `tracing`
//!
//! A subscriber that turns every [`Event`] into a structured `tracing` record.
//! Install any `tracing` subscriber (e.g. `tracing_subscriber::fmt`) to see the output.
//!
//! ## Levels
//! - `error`: task failures and panics, upstream failures
//! - `warn`: credential not set, watch closed, subscriber overflow/panic
//! - `info`: lifecycle transitions, supervisor death and worker verdicts
//! - `debug`: fetches and ignored changes

use async_trait::async_trait;
use tracing::{debug, error, info, warn};

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Event writer subscriber.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let source = e.source.as_deref().unwrap_or("-");
        let task = e.task.as_deref().unwrap_or("-");
        let key = e.key.as_deref().unwrap_or("-");
        let reason = e.reason.as_deref().unwrap_or("-");

        match e.kind {
            EventKind::TaskSpawned => debug!(seq = e.seq, source, task, "task spawned"),
            EventKind::SpawnRejected => warn!(seq = e.seq, source, task, "spawn rejected"),
            EventKind::TaskExited => debug!(seq = e.seq, source, task, reason, "task exited"),
            EventKind::TaskFailed => error!(seq = e.seq, source, task, reason, "task failed"),
            EventKind::TaskPanicked => {
                error!(seq = e.seq, source, task, reason, "task panicked")
            }
            EventKind::StopRequested => info!(seq = e.seq, source, reason, "stop requested"),
            EventKind::SupervisorDead => info!(seq = e.seq, source, reason, "supervisor dead"),
            EventKind::CredentialFetched => {
                debug!(seq = e.seq, source, key, valid = ?e.valid, "credential fetched")
            }
            EventKind::CredentialNotSet => {
                warn!(seq = e.seq, source, "credential is not set for the unit")
            }
            EventKind::WatchStarted => info!(seq = e.seq, source, key, "watching credential"),
            EventKind::ChangeIgnored => debug!(seq = e.seq, source, key, "no credential change"),
            EventKind::CredentialChanged => {
                info!(seq = e.seq, source, key, previous = reason, "credential replaced")
            }
            EventKind::ValidityChanged => {
                info!(seq = e.seq, source, key, valid = ?e.valid, "credential validity changed")
            }
            EventKind::WatchClosed => warn!(seq = e.seq, source, key, "credential watch closed"),
            EventKind::UpstreamFailed => {
                error!(seq = e.seq, source, key, reason, "upstream call failed")
            }
            EventKind::SubscriberOverflow => {
                warn!(subscriber = task, reason, "subscriber dropped event")
            }
            EventKind::SubscriberPanicked => {
                warn!(subscriber = task, reason, "subscriber panicked")
            }
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}
