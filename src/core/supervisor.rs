//! # Supervisor: owns a worker's tasks, their cancellation and their final outcome.
//!
//! A [`Supervisor`] owns exactly one root task plus any number of sub-tasks and nested
//! [`Worker`]s. It turns an external stop request, or the first failure of any of its
//! tasks, into a single broadcast cancellation and reports the first recorded reason
//! once every task has exited.
//!
//! ## Architecture
//! ```text
//! SupervisorBuilder::invoke(root)
//!        │
//!        ├──► Bus + SubscriberSet listener (optional, only with subscribers)
//!        └──► spawn root ─────────────┐
//!                                     ▼
//!   spawn(task) / add(worker) ──► [run_supervised] ──► result
//!                                     │                  ├─ root: request_stop(result.err())
//!                                     │                  ├─ Err(e): request_stop(Some(e))
//!                                     │                  └─ release(id)
//!                                     │                       └─ last task out while Dying → Dead
//!                                     ▼
//!   request_stop(reason) ──► State::kill ──► Entered: token.cancel() (broadcast, permanent)
//!
//!   await_outcome() ──► waits on the watch barrier until Dead ──► recorded reason
//! ```
//!
//! ## Rules
//! - `Alive → Dying` happens once; the first non-clean reason is kept (see [`State`]).
//! - `await_outcome` never returns before every registered task has exited.
//! - Tasks spawned while `Dying` start with an already cancelled token.
//! - Tasks cannot be spawned once `Dead`.
//! - A panicking task is a failure of the supervisor, never of the process.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::{
    config::SupervisorConfig,
    core::{
        builder::SupervisorBuilder,
        runner::run_supervised,
        state::{State, Transition},
        worker::Worker,
    },
    error::{RuntimeError, StopReason, TaskError},
    events::{Bus, Event, EventKind},
    tasks::{Task, TaskRef},
};

/// Mutable part of the supervisor, guarded by a short-lived lock.
struct Slot<E> {
    state: State<E>,
    /// Running tasks by registration id.
    live: BTreeMap<u64, Arc<str>>,
}

struct Inner<E> {
    name: Arc<str>,
    bus: Bus,
    token: CancellationToken,
    slot: Mutex<Slot<E>>,
    /// `None` until dead, then the final outcome.
    outcome: watch::Sender<Option<Result<(), E>>>,
    next_id: AtomicU64,
}

/// Structured-concurrency scope for one worker.
///
/// Cheap to clone; all clones control the same set of tasks.
///
/// ## Example
/// ```rust
/// use tokio_util::sync::CancellationToken;
/// use fleetvisor::{Supervisor, SupervisorConfig, TaskError, TaskFn, TaskRef};
///
/// #[tokio::main(flavor = "current_thread")]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let root: TaskRef = TaskFn::arc("loop", |ctx: CancellationToken| async move {
///         ctx.cancelled().await;
///         Err::<(), _>(TaskError::Dying)
///     });
///
///     let sup = Supervisor::builder(SupervisorConfig::named("demo")).invoke(root)?;
///     sup.request_stop(None);
///     sup.await_outcome().await?;
///     Ok(())
/// }
/// ```
pub struct Supervisor<E = TaskError> {
    inner: Arc<Inner<E>>,
}

impl<E> Clone for Supervisor<E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl Supervisor<TaskError> {
    /// Returns a builder for a supervisor.
    pub fn builder(cfg: SupervisorConfig) -> SupervisorBuilder {
        SupervisorBuilder::new(cfg)
    }
}

impl<E: StopReason> Supervisor<E> {
    /// Creates a supervisor whose only registered task is `root` (id 0), not yet running.
    pub(crate) fn with_root(name: Arc<str>, bus: Bus, root: &str) -> Self {
        let (outcome, _) = watch::channel(None);
        let live = BTreeMap::from([(0, Arc::from(root))]);
        Self {
            inner: Arc::new(Inner {
                name,
                bus,
                token: CancellationToken::new(),
                slot: Mutex::new(Slot {
                    state: State::Alive,
                    live,
                }),
                outcome,
                next_id: AtomicU64::new(1),
            }),
        }
    }

    /// Starts the root task registered by [`Supervisor::with_root`].
    pub(crate) fn launch_root(&self, root: TaskRef<E>) {
        self.launch(0, root, true);
    }

    /// Supervisor name (used as the `source` of its events).
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Event bus shared by the supervisor and its tasks.
    pub fn bus(&self) -> &Bus {
        &self.inner.bus
    }

    /// Registers and starts a sub-task.
    ///
    /// A sub-task returning `Ok(())` leaves its siblings running; returning `Err(e)` stops
    /// the supervisor with `e`. While `Dying`, the task starts with a cancelled token.
    ///
    /// # Errors
    /// [`RuntimeError::AlreadyDead`] once every task has exited.
    pub fn spawn(&self, task: TaskRef<E>) -> Result<(), RuntimeError> {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        {
            let mut slot = self.slot();
            if slot.state.is_dead() {
                drop(slot);
                self.publish(Event::new(EventKind::SpawnRejected).with_task(task.name()));
                return Err(RuntimeError::AlreadyDead {
                    name: self.name().to_string(),
                    task: task.name().to_string(),
                });
            }
            slot.live.insert(id, Arc::from(task.name()));
        }
        self.launch(id, task, false);
        Ok(())
    }

    /// Supervises an already running [`Worker`].
    ///
    /// The worker is killed when the supervisor starts dying, and its failure stops the
    /// supervisor. The supervisor's outcome is not reported before the worker finished.
    ///
    /// # Errors
    /// [`RuntimeError::AlreadyDead`] once every task has exited (the worker is killed).
    pub fn add<W: Worker<E>>(
        &self,
        name: impl Into<String>,
        worker: W,
    ) -> Result<(), RuntimeError> {
        let worker = Arc::new(worker);
        let res = self.spawn(Arc::new(Supervised {
            name: name.into(),
            worker: Arc::clone(&worker),
        }));
        if res.is_err() {
            worker.kill();
        }
        res
    }

    /// Requests a stop. Idempotent and non-blocking.
    ///
    /// `None` is a clean stop. Only the first stop cancels the tasks; see [`State`] for
    /// which reason is finally kept.
    pub fn request_stop(&self, reason: Option<E>) {
        let label = reason.as_ref().map(ToString::to_string);
        let transition = self.slot().state.kill(reason);
        if transition == Transition::Entered {
            self.inner.token.cancel();
            self.publish(Event::new(EventKind::StopRequested).with_reason_opt(label));
        }
    }

    /// The cancellation signal every task observes.
    pub fn cancellation(&self) -> CancellationToken {
        self.inner.token.clone()
    }

    /// Receiver of the final outcome; `Some` once the supervisor is dead.
    pub(crate) fn outcome_watch(&self) -> watch::Receiver<Option<Result<(), E>>> {
        self.inner.outcome.subscribe()
    }

    /// Waits until every task has exited and returns the recorded reason.
    ///
    /// `Ok(())` after a clean stop. Any number of callers may wait concurrently; all of
    /// them receive the same value.
    pub async fn await_outcome(&self) -> Result<(), E> {
        let mut outcome = self.inner.outcome.subscribe();
        match outcome.wait_for(Option::is_some).await {
            Ok(done) => (*done).clone().unwrap_or(Ok(())),
            // The sender lives in `inner`, which `self` keeps alive.
            Err(_) => Err(TaskError::Dying.into()),
        }
    }

    /// Current lifecycle state with the recorded reason.
    pub fn state(&self) -> State<E> {
        self.slot().state.clone()
    }

    /// True until the first stop request.
    pub fn is_alive(&self) -> bool {
        self.slot().state.is_alive()
    }

    /// Names of the tasks that are still running, in registration order.
    pub fn alive(&self) -> Vec<String> {
        self.slot().live.values().map(|n| n.to_string()).collect()
    }

    fn launch(&self, id: u64, task: TaskRef<E>, root: bool) {
        self.publish(Event::new(EventKind::TaskSpawned).with_task(task.name()));

        let me = self.clone();
        let ctx = self.inner.token.clone();
        tokio::spawn(async move {
            let res = run_supervised(task.as_ref(), ctx, &me.inner.bus, &me.inner.name).await;
            if root {
                me.request_stop(res.err());
            } else if let Err(e) = res {
                me.request_stop(Some(e));
            }
            me.release(id);
        });
    }

    /// Unregisters a finished task; the last one out of a dying supervisor buries it.
    fn release(&self, id: u64) {
        let outcome = {
            let mut slot = self.slot();
            slot.live.remove(&id);
            if slot.live.is_empty() {
                slot.state.bury()
            } else {
                None
            }
        };

        if let Some(outcome) = outcome {
            let label = outcome.as_ref().err().map(ToString::to_string);
            self.publish(Event::new(EventKind::SupervisorDead).with_reason_opt(label));
            self.inner.outcome.send_replace(Some(outcome));
        }
    }

    fn slot(&self) -> MutexGuard<'_, Slot<E>> {
        self.inner.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, ev: Event) {
        self.inner
            .bus
            .publish(ev.with_source(Arc::clone(&self.inner.name)));
    }
}

#[async_trait]
impl<E: StopReason> Worker<E> for Supervisor<E> {
    fn kill(&self) {
        self.request_stop(None);
    }

    async fn wait(&self) -> Result<(), E> {
        self.await_outcome().await
    }
}

/// Task adapter that ties a nested worker's lifetime to its supervisor.
struct Supervised<W> {
    name: String,
    worker: Arc<W>,
}

#[async_trait]
impl<E: StopReason, W: Worker<E>> Task<E> for Supervised<W> {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, ctx: CancellationToken) -> Result<(), E> {
        tokio::select! {
            res = self.worker.wait() => res,
            _ = ctx.cancelled() => {
                self.worker.kill();
                self.worker.wait().await
            }
        }
    }
}
