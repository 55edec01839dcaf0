//! # Event subscribers.
//!
//! This module provides the [`Subscribe`] trait and built-in implementations
//! for handling events broadcast through the [`Bus`](crate::events::Bus).
//! Subscribers are the injected observability collaborator: they are handed to
//! a supervisor (or worker config) instead of relying on a process-wide logger.
//!
//! ## Architecture
//! ```text
//! Event flow:
//!   Supervisor / Worker ── publish(Event) ──► Bus ──► listener ──► SubscriberSet
//!                                                                      │
//!                                                            ┌─────────┼─────────┐
//!                                                            ▼         ▼         ▼
//!                                                        LogWriter  Metrics   Custom
//! ```

mod log;
mod set;
mod subscribe;

pub use log::LogWriter;
pub use set::SubscriberSet;
pub use subscribe::Subscribe;
