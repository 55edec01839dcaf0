//! Runtime core: supervision and lifecycle.
//!
//! Internal modules:
//! - [`supervisor`]: owns tasks, broadcast cancellation and the first recorded reason;
//! - [`builder`]: validates config, wires the event bus/subscribers and starts the root task;
//! - [`runner`]: runs one task with panic isolation and event publishing;
//! - [`state`]: the `Alive → Dying → Dead` state machine;
//! - [`worker`]: the kill/wait contract shared by supervisors and workers.

mod builder;
mod runner;
mod state;
mod supervisor;
mod worker;

pub use builder::SupervisorBuilder;
pub(crate) use runner::panic_message;
pub use state::State;
pub use supervisor::Supervisor;
pub use worker::Worker;
