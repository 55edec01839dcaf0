//! # Run one supervised task to completion.
//!
//! Executes a [`Task`] with the supervisor's cancellation token, converts a panic into a
//! failure and publishes exactly one terminal event to the [`Bus`].
//!
//! ## Event flow
//!
//! ```text
//! Success:
//!   task.run() → Ok(())                               → publish TaskExited
//!
//! Cancellation acknowledged:
//!   task.run() → Err(Dying) with ctx cancelled       → publish TaskExited
//!
//! Expected verdict:
//!   task.run() → Err(e), e.is_expected()              → publish TaskExited{reason}
//!
//! Failure:
//!   task.run() → Err(e)                               → publish TaskFailed
//!
//! Panic:
//!   task.run() panics → caught → Err(Panicked{info})  → publish TaskPanicked
//! ```

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tokio_util::sync::CancellationToken;

use crate::{
    error::{StopReason, TaskError},
    events::{Bus, Event, EventKind},
    tasks::Task,
};

/// Runs `task` once, returning its result with panics converted to [`TaskError::Panicked`].
pub(crate) async fn run_supervised<E: StopReason>(
    task: &dyn Task<E>,
    ctx: CancellationToken,
    bus: &Bus,
    source: &Arc<str>,
) -> Result<(), E> {
    let res = match AssertUnwindSafe(task.run(ctx.clone())).catch_unwind().await {
        Ok(res) => res,
        Err(panic) => {
            let info = panic_message(panic.as_ref());
            bus.publish(
                Event::new(EventKind::TaskPanicked)
                    .with_source(Arc::clone(source))
                    .with_task(task.name())
                    .with_reason(info.as_str()),
            );
            return Err(TaskError::Panicked { info }.into());
        }
    };

    match &res {
        Err(e) if e.is_expected() => {
            bus.publish(
                Event::new(EventKind::TaskExited)
                    .with_source(Arc::clone(source))
                    .with_task(task.name())
                    .with_reason(e.to_string()),
            );
        }
        Err(e) if !(e.is_dying() && ctx.is_cancelled()) => {
            bus.publish(
                Event::new(EventKind::TaskFailed)
                    .with_source(Arc::clone(source))
                    .with_task(task.name())
                    .with_reason(e.to_string()),
            );
        }
        _ => {
            bus.publish(
                Event::new(EventKind::TaskExited)
                    .with_source(Arc::clone(source))
                    .with_task(task.name()),
            );
        }
    }
    res
}

/// Extracts a readable message from a panic payload.
pub(crate) fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(msg) = panic.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tasks::TaskFn;

    fn source() -> Arc<str> {
        Arc::from("test")
    }

    #[tokio::test]
    async fn panic_becomes_failure() {
        let bus = Bus::new(8);
        let mut rx = bus.subscribe();
        let task = TaskFn::new("boom", |_ctx: CancellationToken| async move {
            if true {
                panic!("kaboom");
            }
            Ok::<(), TaskError>(())
        });

        let res = run_supervised::<TaskError>(&task, CancellationToken::new(), &bus, &source()).await;
        assert_eq!(
            res,
            Err(TaskError::Panicked {
                info: "kaboom".into()
            })
        );
        let ev = rx.recv().await.expect("event");
        assert_eq!(ev.kind, EventKind::TaskPanicked);
        assert_eq!(ev.task.as_deref(), Some("boom"));
    }

    #[tokio::test]
    async fn acknowledged_cancellation_is_an_exit() {
        let bus = Bus::new(8);
        let mut rx = bus.subscribe();
        let ctx = CancellationToken::new();
        ctx.cancel();
        let task = TaskFn::new("quiet", |ctx: CancellationToken| async move {
            ctx.cancelled().await;
            Err::<(), _>(TaskError::Dying)
        });

        let res = run_supervised::<TaskError>(&task, ctx, &bus, &source()).await;
        assert_eq!(res, Err(TaskError::Dying));
        assert_eq!(rx.recv().await.expect("event").kind, EventKind::TaskExited);
    }

    #[tokio::test]
    async fn error_is_reported_as_failure() {
        let bus = Bus::new(8);
        let mut rx = bus.subscribe();
        let task = TaskFn::new("flaky", |_ctx: CancellationToken| async move {
            Err::<(), _>(TaskError::fail("connection refused"))
        });

        let res = run_supervised::<TaskError>(&task, CancellationToken::new(), &bus, &source()).await;
        assert!(res.is_err());
        let ev = rx.recv().await.expect("event");
        assert_eq!(ev.kind, EventKind::TaskFailed);
        assert_eq!(
            ev.reason.as_deref(),
            Some("execution failed: connection refused")
        );
    }

    #[test]
    fn panic_payloads_are_rendered() {
        assert_eq!(panic_message(&"static"), "static");
        assert_eq!(panic_message(&String::from("owned")), "owned");
        assert_eq!(panic_message(&42_u8), "unknown panic");
    }
}
