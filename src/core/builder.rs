use std::sync::Arc;

use tokio::sync::broadcast::error::{RecvError, TryRecvError};
use tokio::sync::watch;

use super::supervisor::Supervisor;
use crate::{
    config::SupervisorConfig,
    error::{ConfigError, StopReason},
    events::{Bus, EventKind},
    subscribers::{Subscribe, SubscriberSet},
    tasks::TaskRef,
};

/// Builder for constructing a [`Supervisor`] around its root task.
pub struct SupervisorBuilder {
    cfg: SupervisorConfig,
    subscribers: Vec<Arc<dyn Subscribe>>,
}

impl SupervisorBuilder {
    /// Creates a new builder with the given configuration.
    pub fn new(cfg: SupervisorConfig) -> Self {
        Self {
            cfg,
            subscribers: Vec::new(),
        }
    }

    /// Sets event subscribers for observability.
    ///
    /// Subscribers receive supervisor and worker events through dedicated workers with
    /// bounded queues.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Validates the config, creates the supervisor and starts `root`.
    ///
    /// The root task's exit (successful or not) stops the supervisor with its result.
    /// Must be called within a tokio runtime.
    ///
    /// # Errors
    /// [`ConfigError`] if the configuration is invalid; nothing is started then.
    pub fn invoke<E: StopReason>(self, root: TaskRef<E>) -> Result<Supervisor<E>, ConfigError> {
        self.invoke_with(|_| root)
    }

    /// Like [`invoke`](Self::invoke), but builds the root task from the supervisor's
    /// event bus so the task can publish its own events.
    pub fn invoke_with<E, F>(self, make_root: F) -> Result<Supervisor<E>, ConfigError>
    where
        E: StopReason,
        F: FnOnce(&Bus) -> TaskRef<E>,
    {
        self.cfg.validate()?;

        let bus = Bus::new(self.cfg.bus_capacity_clamped());
        let root = make_root(&bus);
        let name: Arc<str> = Arc::from(self.cfg.name.as_ref());
        let sup = Supervisor::with_root(name, bus.clone(), root.name());
        if !self.subscribers.is_empty() {
            subscriber_listener(&bus, self.subscribers, sup.outcome_watch());
        }
        sup.launch_root(root);
        Ok(sup)
    }
}

/// Forwards bus events to the subscriber set until the supervisor is dead.
///
/// `SupervisorDead` is the last event a supervisor publishes, but a small bus may
/// overwrite it before it is read. The outcome watch ends the loop in that case too,
/// as does dropping the last supervisor handle. Whatever is still buffered is
/// forwarded, then the set is drained and shut down.
fn subscriber_listener<E>(
    bus: &Bus,
    subscribers: Vec<Arc<dyn Subscribe>>,
    mut dead: watch::Receiver<Option<Result<(), E>>>,
) where
    E: Send + Sync + 'static,
{
    let mut rx = bus.subscribe();
    let set = SubscriberSet::new(subscribers, bus.clone());

    tokio::spawn(async move {
        loop {
            tokio::select! {
                res = rx.recv() => match res {
                    Ok(ev) => {
                        set.emit(&ev);
                        if ev.kind == EventKind::SupervisorDead {
                            break;
                        }
                    }
                    Err(RecvError::Lagged(_)) => continue,
                    Err(RecvError::Closed) => break,
                },
                _ = dead.wait_for(Option::is_some) => {
                    loop {
                        match rx.try_recv() {
                            Ok(ev) => set.emit(&ev),
                            Err(TryRecvError::Lagged(_)) => continue,
                            Err(_) => break,
                        }
                    }
                    break;
                }
            }
        }
        set.shutdown().await;
    });
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use async_trait::async_trait;
    use tokio_util::sync::CancellationToken;

    use super::*;
    use crate::error::TaskError;
    use crate::events::Event;
    use crate::tasks::TaskFn;

    struct Quiet;

    #[async_trait]
    impl Subscribe for Quiet {
        async fn on_event(&self, _event: &Event) {}

        fn name(&self) -> &'static str {
            "quiet"
        }
    }

    #[tokio::test]
    async fn listener_ends_when_dead_event_is_overwritten() {
        let sub = Arc::new(Quiet);
        let cfg = SupervisorConfig {
            bus_capacity: 1,
            ..SupervisorConfig::named("tiny-bus")
        };
        let root: TaskRef = TaskFn::arc("root", |_ctx: CancellationToken| async move {
            Ok::<(), TaskError>(())
        });
        let sup = SupervisorBuilder::new(cfg)
            .with_subscribers(vec![sub.clone() as Arc<dyn Subscribe>])
            .invoke(root)
            .expect("valid config");

        assert_eq!(sup.await_outcome().await, Ok(()));
        let late = TaskFn::arc("late", |_ctx: CancellationToken| async move {
            Ok::<(), TaskError>(())
        });
        assert!(sup.spawn(late).is_err());
        drop(sup);

        let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
        while Arc::strong_count(&sub) > 1 {
            assert!(
                tokio::time::Instant::now() < deadline,
                "subscriber still held by the listener"
            );
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }
}
