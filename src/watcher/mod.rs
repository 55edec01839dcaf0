//! # Change notification contract.
//!
//! A watcher delivers payload-free [`Change`] ticks meaning "re-read the source of truth
//! now". The stream is lazy and single-use: once it closes it never reopens, and a fresh
//! stream has to be obtained by subscribing again through the originating collaborator.
//!
//! ## Architecture
//! ```text
//! producer (facade impl)                     consumer (worker loop)
//!   Notifier::notify() ──► [bounded queue] ─► Watcher::next() ─► Some(Change)
//!   drop / close()     ─────────────────────► Watcher::next() ─► None (closed forever)
//! ```
//!
//! ## Rules
//! - `notify()` never blocks; when the queue is full the tick is coalesced with the
//!   pending ones (a pending tick already forces a re-read).
//! - Deciding whether a closed stream is fatal is up to the consumer.

use async_trait::async_trait;
use tokio::sync::mpsc;

/// One change notification. Carries no payload.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Change;

/// Receiving side of a change stream.
#[derive(Debug)]
pub struct Changes {
    rx: mpsc::Receiver<Change>,
}

impl Changes {
    /// Waits for the next change. `None` means the stream is closed for good.
    pub async fn next(&mut self) -> Option<Change> {
        self.rx.recv().await
    }
}

/// Producing side of a change stream. Cloneable; the stream closes when every clone is
/// dropped or [`Notifier::close`] is called.
#[derive(Clone, Debug)]
pub struct Notifier {
    tx: mpsc::Sender<Change>,
}

impl Notifier {
    /// Signals a change without blocking.
    ///
    /// Returns `false` once the receiving side is gone.
    pub fn notify(&self) -> bool {
        match self.tx.try_send(Change) {
            Ok(()) | Err(mpsc::error::TrySendError::Full(_)) => true,
            Err(mpsc::error::TrySendError::Closed(_)) => false,
        }
    }

    /// Closes this handle. The stream ends once every clone is closed or dropped.
    pub fn close(self) {
        drop(self.tx);
    }

    /// True if the receiving side has been dropped.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Creates a change stream buffering at most `capacity` (min 1) pending ticks.
pub fn channel(capacity: usize) -> (Notifier, Changes) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (Notifier { tx }, Changes { rx })
}

/// A subscription that yields change notifications.
///
/// Implementations may sit on any transport; [`NotifyWatcher`] is the channel-backed one.
#[async_trait]
pub trait Watcher: Send + 'static {
    /// Waits for the next change. `None` means the subscription is closed for good.
    async fn next(&mut self) -> Option<Change>;
}

/// Channel-backed [`Watcher`].
#[derive(Debug)]
pub struct NotifyWatcher {
    changes: Changes,
}

impl NotifyWatcher {
    /// Wraps an existing change stream.
    pub fn new(changes: Changes) -> Self {
        Self { changes }
    }

    /// Creates a watcher and the notifier that drives it.
    pub fn channel(capacity: usize) -> (Notifier, Self) {
        let (notifier, changes) = channel(capacity);
        (notifier, Self::new(changes))
    }
}

#[async_trait]
impl Watcher for NotifyWatcher {
    async fn next(&mut self) -> Option<Change> {
        self.changes.next().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn delivers_ticks_then_closes_for_good() {
        let (notifier, mut watcher) = NotifyWatcher::channel(4);
        assert!(notifier.notify());
        assert!(notifier.notify());
        notifier.close();

        assert_eq!(watcher.next().await, Some(Change));
        assert_eq!(watcher.next().await, Some(Change));
        assert_eq!(watcher.next().await, None);
        assert_eq!(watcher.next().await, None);
    }

    #[tokio::test]
    async fn full_queue_coalesces() {
        let (notifier, mut changes) = channel(1);
        assert!(notifier.notify());
        assert!(notifier.notify());
        assert!(notifier.notify());
        drop(notifier);

        assert_eq!(changes.next().await, Some(Change));
        assert_eq!(changes.next().await, None);
    }

    #[test]
    fn notify_reports_dropped_receiver() {
        let (notifier, changes) = channel(1);
        drop(changes);
        assert!(notifier.is_closed());
        assert!(!notifier.notify());
    }
}
