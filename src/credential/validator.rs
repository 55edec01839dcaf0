//! # Credential validity worker.
//!
//! [`CredentialValidator`] reads the credential bound to a unit once, subscribes to
//! changes of it and stops itself as soon as a change makes the original read stale.
//! The stop reason tells the launcher what happened; the worker never retries, never
//! re-subscribes and never edits the credential.
//!
//! ## Loop
//! ```text
//! fetch ──► None ───────────────────────────────────────────► NotApplicable
//!   │  └──► Err ────────────────────────────────────────────► Upstream(fetch)
//!   ▼
//! subscribe(key) ──► Err ───────────────────────────────────► Upstream(subscribe)
//!   ▼
//! ┌─► select (biased) ── cancelled ─────────────────────────► Dying (ack)
//! │        │          └─ stream closed ─────────────────────► Dying
//! │        ▼ change
//! │   re-fetch ── None ─────────────────────────────────────► NotApplicable
//! │        │   └─ Err ──────────────────────────────────────► Upstream(fetch, key)
//! │        ▼
//! │   drift? ── key differs ────────────────────────────────► CredentialChanged
//! │        │ └─ validity differs ───────────────────────────► ValidityChanged
//! └────────┘ none
//! ```
//!
//! The loop runs as the root task of a [`Supervisor<ValidatorError>`], so its return
//! value becomes the validator's stop reason and an external stop is observed at the
//! next select.

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::core::{State, Supervisor, SupervisorBuilder, Worker};
use crate::credential::config::ValidatorConfig;
use crate::credential::error::{UpstreamError, UpstreamOp, ValidatorError};
use crate::credential::facade::{BoxError, FacadeRef};
use crate::credential::outcome::Outcome;
use crate::credential::snapshot::{CredentialKey, Drift, StoredCredential};
use crate::error::{ConfigError, TaskError};
use crate::events::{Bus, Event, EventKind};
use crate::tasks::{Task, TaskRef};

/// Name of the loop task inside the validator's supervisor.
const LOOP_TASK: &str = "credential-watch";

/// Handle to a running credential validity worker.
///
/// Cloning yields another handle to the same worker.
#[derive(Clone)]
pub struct CredentialValidator {
    sup: Supervisor<ValidatorError>,
}

impl CredentialValidator {
    /// Validates `cfg` and starts the worker.
    ///
    /// Must be called within a tokio runtime.
    ///
    /// # Errors
    /// [`ConfigError::MissingFacade`] without a facade; nothing is started then.
    pub fn new(cfg: ValidatorConfig) -> Result<Self, ConfigError> {
        cfg.validate()?;
        let ValidatorConfig {
            facade,
            supervisor,
            subscribers,
        } = cfg;
        let facade = facade.ok_or(ConfigError::MissingFacade)?;
        let source: Arc<str> = Arc::from(supervisor.name.as_ref());

        let sup = SupervisorBuilder::new(supervisor)
            .with_subscribers(subscribers)
            .invoke_with(|bus| {
                let root: TaskRef<ValidatorError> = Arc::new(WatchLoop {
                    facade,
                    bus: bus.clone(),
                    source,
                });
                root
            })?;
        Ok(Self { sup })
    }

    /// Asks the worker to stop without a reason. Idempotent.
    pub fn request_stop(&self) {
        self.sup.request_stop(None);
    }

    /// Asks the worker to stop, recording `reason` unless one is already recorded.
    pub fn request_stop_with(&self, reason: ValidatorError) {
        self.sup.request_stop(Some(reason));
    }

    /// Waits until the worker is dead and returns its raw stop reason.
    pub async fn wait(&self) -> Result<(), ValidatorError> {
        self.sup.await_outcome().await
    }

    /// Waits until the worker is dead and classifies why it stopped.
    pub async fn await_outcome(&self) -> Outcome {
        Outcome::from_result(self.wait().await)
    }

    /// Current lifecycle state.
    pub fn state(&self) -> State<ValidatorError> {
        self.sup.state()
    }

    /// True until a stop has been requested or the loop has exited.
    pub fn is_alive(&self) -> bool {
        self.sup.is_alive()
    }

    /// The hosting supervisor (for its bus, cancellation token or nested tasks).
    pub fn supervisor(&self) -> &Supervisor<ValidatorError> {
        &self.sup
    }
}

#[async_trait]
impl Worker<ValidatorError> for CredentialValidator {
    fn kill(&self) {
        self.request_stop();
    }

    async fn wait(&self) -> Result<(), ValidatorError> {
        CredentialValidator::wait(self).await
    }
}

/// The root task: one fetch, one subscription, then react to changes.
struct WatchLoop {
    facade: FacadeRef,
    bus: Bus,
    source: Arc<str>,
}

impl WatchLoop {
    fn event(&self, kind: EventKind) -> Event {
        Event::new(kind)
            .with_source(self.source.clone())
            .with_task(LOOP_TASK)
    }

    /// Reads the current snapshot. `known` is the key being watched, if any.
    async fn fetch(
        &self,
        known: Option<&CredentialKey>,
    ) -> Result<StoredCredential, ValidatorError> {
        match self.facade.fetch_snapshot().await {
            Ok(Some(cred)) => {
                self.bus.publish(
                    self.event(EventKind::CredentialFetched)
                        .with_key(cred.key.as_str())
                        .with_valid(cred.valid),
                );
                Ok(cred)
            }
            Ok(None) => {
                self.bus.publish(self.event(EventKind::CredentialNotSet));
                Err(ValidatorError::NotApplicable)
            }
            Err(e) => Err(self.upstream(UpstreamOp::Fetch, known, e)),
        }
    }

    fn upstream(
        &self,
        op: UpstreamOp,
        key: Option<&CredentialKey>,
        source: BoxError,
    ) -> ValidatorError {
        let err = UpstreamError::new(op, key, source);
        let mut ev = self.event(EventKind::UpstreamFailed).with_reason(err.to_string());
        if let Some(key) = key {
            ev = ev.with_key(key.as_str());
        }
        self.bus.publish(ev);
        err.into()
    }
}

#[async_trait]
impl Task<ValidatorError> for WatchLoop {
    fn name(&self) -> &str {
        LOOP_TASK
    }

    async fn run(&self, ctx: CancellationToken) -> Result<(), ValidatorError> {
        let original = self.fetch(None).await?;

        let mut watcher = self
            .facade
            .subscribe(&original.key)
            .await
            .map_err(|e| self.upstream(UpstreamOp::Subscribe, Some(&original.key), e))?;
        self.bus
            .publish(self.event(EventKind::WatchStarted).with_key(original.key.as_str()));

        loop {
            tokio::select! {
                biased;

                _ = ctx.cancelled() => {
                    return Err(TaskError::Dying.into());
                }
                change = watcher.next() => {
                    if change.is_none() {
                        self.bus.publish(
                            self.event(EventKind::WatchClosed).with_key(original.key.as_str()),
                        );
                        return Err(TaskError::Dying.into());
                    }

                    let current = self.fetch(Some(&original.key)).await?;
                    match original.drift(&current) {
                        Some(Drift::KeyChanged { from, to }) => {
                            self.bus.publish(
                                self.event(EventKind::CredentialChanged)
                                    .with_key(to.as_str())
                                    .with_reason(from.as_str()),
                            );
                            return Err(ValidatorError::CredentialChanged);
                        }
                        Some(Drift::ValidityChanged { valid }) => {
                            self.bus.publish(
                                self.event(EventKind::ValidityChanged)
                                    .with_key(original.key.as_str())
                                    .with_valid(valid),
                            );
                            return Err(ValidatorError::ValidityChanged);
                        }
                        None => {
                            self.bus.publish(
                                self.event(EventKind::ChangeIgnored).with_key(original.key.as_str()),
                            );
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use super::*;
    use crate::credential::facade::Facade;
    use crate::subscribers::Subscribe;
    use crate::tasks::TaskFn;
    use crate::watcher::{Changes, Notifier, NotifyWatcher, Watcher, channel};

    type Step = Result<Option<StoredCredential>, &'static str>;

    /// Serves scripted fetch results (the last one repeats) and one change stream.
    struct FakeFacade {
        script: Mutex<VecDeque<Step>>,
        fetches: AtomicUsize,
        subscribed: Mutex<Vec<CredentialKey>>,
        changes: Mutex<Option<Changes>>,
        subscribe_error: Option<&'static str>,
    }

    impl FakeFacade {
        fn new(script: Vec<Step>) -> (Arc<Self>, Notifier) {
            Self::build(script, None)
        }

        fn failing_subscribe(script: Vec<Step>, err: &'static str) -> (Arc<Self>, Notifier) {
            Self::build(script, Some(err))
        }

        fn build(script: Vec<Step>, subscribe_error: Option<&'static str>) -> (Arc<Self>, Notifier) {
            let (notifier, changes) = channel(8);
            let facade = Arc::new(Self {
                script: Mutex::new(script.into()),
                fetches: AtomicUsize::new(0),
                subscribed: Mutex::new(Vec::new()),
                changes: Mutex::new(Some(changes)),
                subscribe_error,
            });
            (facade, notifier)
        }

        fn fetches(&self) -> usize {
            self.fetches.load(Ordering::SeqCst)
        }

        fn subscribed(&self) -> Vec<CredentialKey> {
            self.subscribed.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Facade for FakeFacade {
        async fn fetch_snapshot(&self) -> Result<Option<StoredCredential>, BoxError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            let mut script = self.script.lock().unwrap();
            let step = if script.len() > 1 {
                script.pop_front().unwrap()
            } else {
                script.front().cloned().unwrap()
            };
            step.map_err(Into::into)
        }

        async fn subscribe(&self, key: &CredentialKey) -> Result<Box<dyn Watcher>, BoxError> {
            self.subscribed.lock().unwrap().push(key.clone());
            if let Some(err) = self.subscribe_error {
                return Err(err.into());
            }
            let changes = self.changes.lock().unwrap().take().expect("subscribed twice");
            Ok(Box::new(NotifyWatcher::new(changes)))
        }
    }

    fn cred(key: &str, valid: bool) -> Step {
        Ok(Some(StoredCredential::new(key, valid)))
    }

    fn start(facade: Arc<FakeFacade>) -> CredentialValidator {
        CredentialValidator::new(ValidatorConfig::new(facade)).unwrap()
    }

    async fn outcome(v: &CredentialValidator) -> Outcome {
        tokio::time::timeout(Duration::from_secs(2), v.await_outcome())
            .await
            .expect("validator did not stop")
    }

    async fn wait_for(mut cond: impl FnMut() -> bool) {
        let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
        while !cond() {
            assert!(tokio::time::Instant::now() < deadline, "condition not reached");
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }

    #[tokio::test]
    async fn validity_flip_stops_with_validity_changed() {
        let (facade, notifier) = FakeFacade::new(vec![cred("aws/bob", true), cred("aws/bob", false)]);
        let v = start(facade.clone());

        notifier.notify();
        assert!(matches!(outcome(&v).await, Outcome::ValidityChanged));
        assert_eq!(facade.subscribed(), vec![CredentialKey::new("aws/bob")]);
        assert_eq!(facade.fetches(), 2);
    }

    #[tokio::test]
    async fn key_change_wins_over_validity_change() {
        let (facade, notifier) = FakeFacade::new(vec![cred("a", true), cred("b", false)]);
        let v = start(facade);

        notifier.notify();
        assert!(matches!(outcome(&v).await, Outcome::KeyChanged));
    }

    #[tokio::test]
    async fn unit_without_credential_is_not_applicable() {
        let (facade, _notifier) = FakeFacade::new(vec![Ok(None)]);
        let v = start(facade.clone());

        assert!(matches!(outcome(&v).await, Outcome::NotApplicable));
        assert!(facade.subscribed().is_empty());
    }

    #[tokio::test]
    async fn fetch_error_is_reported_without_subscribing() {
        let (facade, _notifier) = FakeFacade::new(vec![Err("connection reset")]);
        let v = start(facade.clone());

        match outcome(&v).await {
            Outcome::UpstreamFailure(e) => {
                assert_eq!(e.op, UpstreamOp::Fetch);
                assert!(e.key.is_none());
                assert_eq!(e.source.to_string(), "connection reset");
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert!(facade.subscribed().is_empty());
    }

    #[tokio::test]
    async fn subscribe_error_names_the_key() {
        let (facade, _notifier) =
            FakeFacade::failing_subscribe(vec![cred("a", true)], "watcher unavailable");
        let v = start(facade);

        match outcome(&v).await {
            Outcome::UpstreamFailure(e) => {
                assert_eq!(e.op, UpstreamOp::Subscribe);
                assert_eq!(e.key, Some(CredentialKey::new("a")));
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test]
    async fn refetch_error_carries_watched_key() {
        let (facade, notifier) = FakeFacade::new(vec![cred("a", true), Err("boom")]);
        let v = start(facade);

        notifier.notify();
        match outcome(&v).await {
            Outcome::UpstreamFailure(e) => {
                assert_eq!(e.op, UpstreamOp::Fetch);
                assert_eq!(e.key, Some(CredentialKey::new("a")));
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test]
    async fn credential_removed_while_watching_is_not_applicable() {
        let (facade, notifier) = FakeFacade::new(vec![cred("a", true), Ok(None)]);
        let v = start(facade);

        notifier.notify();
        assert!(matches!(outcome(&v).await, Outcome::NotApplicable));
    }

    #[tokio::test]
    async fn unchanged_snapshots_keep_the_worker_alive() {
        let (facade, notifier) = FakeFacade::new(vec![cred("a", true)]);
        let v = start(facade.clone());

        wait_for(|| !facade.subscribed().is_empty()).await;
        for _ in 0..3 {
            notifier.notify();
            let seen = facade.fetches();
            wait_for(|| facade.fetches() > seen).await;
        }
        assert!(v.is_alive());
        assert!(
            tokio::time::timeout(Duration::from_millis(50), v.await_outcome())
                .await
                .is_err()
        );

        v.request_stop();
        assert!(matches!(outcome(&v).await, Outcome::StoppedCleanly));
        assert_eq!(facade.subscribed().len(), 1);
    }

    #[tokio::test]
    async fn closed_stream_stops_with_dying() {
        let (facade, notifier) = FakeFacade::new(vec![cred("a", true)]);
        let v = start(facade.clone());

        wait_for(|| !facade.subscribed().is_empty()).await;
        notifier.close();
        assert!(matches!(outcome(&v).await, Outcome::Dying));
    }

    #[tokio::test]
    async fn stop_before_any_change_is_clean() {
        let (facade, _notifier) = FakeFacade::new(vec![cred("a", true)]);
        let v = start(facade.clone());

        wait_for(|| !facade.subscribed().is_empty()).await;
        v.request_stop();
        v.request_stop();
        assert!(matches!(outcome(&v).await, Outcome::StoppedCleanly));
        assert!(v.state().is_dead());
    }

    #[tokio::test]
    async fn stop_reason_from_caller_is_kept() {
        let (facade, _notifier) = FakeFacade::new(vec![cred("a", true)]);
        let v = start(facade);

        v.request_stop_with(ValidatorError::CredentialChanged);
        assert!(matches!(outcome(&v).await, Outcome::KeyChanged));
    }

    #[tokio::test]
    async fn kill_through_worker_trait() {
        let (facade, _notifier) = FakeFacade::new(vec![cred("a", true)]);
        let v = start(facade);
        let worker: &dyn Worker<ValidatorError> = &v;

        worker.kill();
        assert!(Worker::wait(&v).await.is_ok());
    }

    #[tokio::test]
    async fn sidecar_failure_aborts_the_validator() {
        let (facade, _notifier) = FakeFacade::new(vec![cred("a", true)]);
        let v = start(facade);

        let sidecar: TaskRef<ValidatorError> =
            TaskFn::arc("sidecar", |_ctx: CancellationToken| async move {
                Err::<(), ValidatorError>(TaskError::fail("disk full").into())
            });
        v.supervisor().spawn(sidecar).unwrap();

        match outcome(&v).await {
            Outcome::Aborted(TaskError::Fail { error }) => assert_eq!(error, "disk full"),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test]
    async fn missing_facade_is_a_config_error() {
        let err = CredentialValidator::new(ValidatorConfig::default()).err();
        assert_eq!(err, Some(ConfigError::MissingFacade));
    }

    struct Recorder(Mutex<Vec<EventKind>>);

    #[async_trait]
    impl Subscribe for Recorder {
        async fn on_event(&self, event: &Event) {
            self.0.lock().unwrap().push(event.kind);
        }

        fn name(&self) -> &'static str {
            "recorder"
        }
    }

    #[tokio::test]
    async fn subscribers_see_the_worker_story() {
        let (facade, notifier) = FakeFacade::new(vec![
            cred("a", true),
            cred("a", true),
            cred("a", false),
        ]);
        let recorder = Arc::new(Recorder(Mutex::new(Vec::new())));
        let cfg = ValidatorConfig::new(facade)
            .with_name("unit-7")
            .with_subscribers(vec![recorder.clone()]);
        let v = CredentialValidator::new(cfg).unwrap();

        notifier.notify();
        notifier.notify();
        assert!(matches!(outcome(&v).await, Outcome::ValidityChanged));

        wait_for(|| recorder.0.lock().unwrap().contains(&EventKind::SupervisorDead)).await;
        let kinds: Vec<EventKind> = recorder
            .0
            .lock()
            .unwrap()
            .iter()
            .copied()
            .filter(|k| {
                matches!(
                    k,
                    EventKind::CredentialFetched
                        | EventKind::WatchStarted
                        | EventKind::ChangeIgnored
                        | EventKind::ValidityChanged
                )
            })
            .collect();
        assert_eq!(
            kinds,
            vec![
                EventKind::CredentialFetched,
                EventKind::WatchStarted,
                EventKind::CredentialFetched,
                EventKind::ChangeIgnored,
                EventKind::CredentialFetched,
                EventKind::ValidityChanged,
            ]
        );
    }
}
