//! # fleetvisor
//!
//! **Fleetvisor** provides the structured-concurrency building blocks of a fleet
//! management agent: a [`Supervisor`] that owns a group of tasks and dies as a unit,
//! and reactive workers built on top of it, such as the [`CredentialValidator`].
//!
//! A supervisor records the *first* meaningful reason it was asked to stop, broadcasts
//! cancellation to every task it owns and becomes `Dead` only once all of them exited.
//! Workers express expected terminal conditions ("the credential changed") as stop
//! reasons so that whoever launched them can react, typically by restarting.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!                    ┌─────────────────────────────┐
//!   launcher ──────► │ CredentialValidator          │ ◄──── Facade (fetch / subscribe)
//!   (request_stop,   │  └─ Supervisor<ValidatorErr> │
//!    await_outcome)  │      ├─ root: watch loop      │
//!                    │      └─ (nested workers)      │
//!                    └──────────────┬──────────────┘
//!                                   │ publish(Event)
//!                                   ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │                        Bus (broadcast channel)                    │
//! │              (capacity: SupervisorConfig::bus_capacity)           │
//! └─────────────────────────────────┬─────────────────────────────────┘
//!                                   ▼
//!                       ┌────────────────────────┐
//!                       │  subscriber listener   │
//!                       │   (per supervisor)     │
//!                       └───────────┬────────────┘
//!                                   ▼
//!                             SubscriberSet
//!                           (per-sub queues)
//!                        ┌─────────┼─────────┐
//!                        ▼         ▼         ▼
//!                    LogWriter   sub2      subN
//! ```
//!
//! ### Lifecycle
//! ```text
//! Alive ──request_stop(reason) / first failure──► Dying(reason) ──all tasks exited──► Dead(reason)
//!
//! - the first non-empty reason wins; a clean stop may still be upgraded by a later failure
//! - a task returning `Dying` while the supervisor is dying only acknowledges the stop
//! - the root task's exit stops the supervisor with the root's result
//! - spawning into a dying supervisor works (the task sees a cancelled token); into a dead one fails
//! ```
//!
//! ## Features
//! | Area              | Description                                                      | Key types / traits                          |
//! |-------------------|------------------------------------------------------------------|---------------------------------------------|
//! | **Supervision**   | Own tasks, broadcast cancellation, record the first reason.       | [`Supervisor`], [`SupervisorBuilder`], [`Worker`] |
//! | **Tasks**         | Define tasks as trait objects or closures.                        | [`Task`], [`TaskFn`], [`TaskRef`]           |
//! | **Workers**       | React to credential changes and stop with a verdict.              | [`CredentialValidator`], [`Facade`], [`Outcome`] |
//! | **Watchers**      | Payload-free change streams.                                      | [`Watcher`], [`Notifier`], [`Changes`]      |
//! | **Subscriber API**| Observe supervisor and worker events (logging, metrics, custom).  | [`Subscribe`], [`LogWriter`]                |
//! | **Errors**        | Typed stop reasons and misuse errors.                             | [`TaskError`], [`ValidatorError`], [`RuntimeError`], [`ConfigError`] |
//! | **Configuration** | Supervisor and validator settings.                                | [`SupervisorConfig`], [`ValidatorConfig`]   |
//!
//! ## Example
//! ```rust
//! use tokio_util::sync::CancellationToken;
//! use fleetvisor::{Supervisor, SupervisorConfig, TaskError, TaskFn, TaskRef};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let root: TaskRef = TaskFn::arc("idle", |ctx: CancellationToken| async move {
//!         ctx.cancelled().await;
//!         Err::<(), _>(TaskError::Dying)
//!     });
//!     let sup = Supervisor::builder(SupervisorConfig::named("agent"))
//!         .invoke(root)
//!         .expect("valid config");
//!
//!     sup.request_stop(None);
//!     assert_eq!(sup.await_outcome().await, Ok(()));
//! }
//! ```
mod config;
mod core;
mod credential;
mod error;
mod events;
mod subscribers;
mod tasks;
mod watcher;

// ---- Public re-exports ----

pub use crate::core::{State, Supervisor, SupervisorBuilder, Worker};
pub use config::SupervisorConfig;
pub use credential::{
    BoxError, CredentialKey, CredentialValidator, Drift, Facade, FacadeRef, Outcome, Snapshot,
    StoredCredential, UpstreamError, UpstreamOp, ValidatorConfig, ValidatorError,
};
pub use error::{ConfigError, RuntimeError, StopReason, TaskError};
pub use events::{Bus, Event, EventKind};
pub use subscribers::{LogWriter, Subscribe, SubscriberSet};
pub use tasks::{Task, TaskFn, TaskRef};
pub use watcher::{Change, Changes, Notifier, NotifyWatcher, Watcher, channel};
