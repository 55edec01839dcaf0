//! # Supervisor lifecycle state.
//!
//! ```text
//!   Alive ──(first stop request / first failure)──► Dying(reason) ──(last task exits)──► Dead(reason)
//! ```
//!
//! ## Rules
//! - `Alive → Dying` happens exactly once; it is irreversible.
//! - A clean `Dying(None)` may be upgraded once by the first real failure.
//! - A `Dying` acknowledgement never overrides anything once dying.
//! - `Dead` is final and keeps the reason recorded while dying.

use crate::error::StopReason;

/// Lifecycle state of a [`Supervisor`](crate::Supervisor), with the recorded reason.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum State<E> {
    /// No stop has been requested; tasks are running.
    Alive,
    /// Stop requested; waiting for tasks to exit. `None` means a clean stop.
    Dying(Option<E>),
    /// Every task has exited. `None` means a clean stop.
    Dead(Option<E>),
}

/// Effect of a stop request on the state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Transition {
    /// `Alive → Dying`: cancellation must be broadcast.
    Entered,
    /// `Dying(None) → Dying(Some)`: a failure replaced the clean reason.
    Upgraded,
    /// Nothing changed.
    Ignored,
}

impl<E: StopReason> State<E> {
    /// Applies a stop request with the given reason.
    pub(crate) fn kill(&mut self, reason: Option<E>) -> Transition {
        match self {
            State::Alive => {
                *self = State::Dying(reason);
                Transition::Entered
            }
            State::Dying(recorded @ None) => match reason {
                Some(r) if !r.is_dying() => {
                    *recorded = Some(r);
                    Transition::Upgraded
                }
                _ => Transition::Ignored,
            },
            State::Dying(Some(_)) | State::Dead(_) => Transition::Ignored,
        }
    }

    /// Moves `Dying → Dead`, returning the final outcome. Any other state is left untouched.
    pub(crate) fn bury(&mut self) -> Option<Result<(), E>> {
        match self {
            State::Dying(reason) => {
                let reason = reason.take();
                let outcome = reason.clone().map_or(Ok(()), Err);
                *self = State::Dead(reason);
                Some(outcome)
            }
            _ => None,
        }
    }

    pub fn is_alive(&self) -> bool {
        matches!(self, State::Alive)
    }

    pub fn is_dead(&self) -> bool {
        matches!(self, State::Dead(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TaskError;

    #[test]
    fn first_failure_wins() {
        let mut state = State::<TaskError>::Alive;
        assert_eq!(state.kill(Some(TaskError::fail("first"))), Transition::Entered);
        assert_eq!(state.kill(Some(TaskError::fail("second"))), Transition::Ignored);
        assert_eq!(state.kill(None), Transition::Ignored);
        assert_eq!(state, State::Dying(Some(TaskError::fail("first"))));
    }

    #[test]
    fn clean_stop_is_upgraded_by_failure_but_not_by_dying() {
        let mut state = State::<TaskError>::Alive;
        assert_eq!(state.kill(None), Transition::Entered);
        assert_eq!(state.kill(Some(TaskError::Dying)), Transition::Ignored);
        assert_eq!(state, State::Dying(None));
        assert_eq!(state.kill(Some(TaskError::fail("late"))), Transition::Upgraded);
        assert_eq!(state.kill(Some(TaskError::fail("later"))), Transition::Ignored);
        assert_eq!(state.bury(), Some(Err(TaskError::fail("late"))));
        assert!(state.is_dead());
    }

    #[test]
    fn dying_while_alive_is_recorded() {
        let mut state = State::<TaskError>::Alive;
        assert_eq!(state.kill(Some(TaskError::Dying)), Transition::Entered);
        assert_eq!(state.bury(), Some(Err(TaskError::Dying)));
    }

    #[test]
    fn bury_requires_dying() {
        let mut state = State::<TaskError>::Alive;
        assert_eq!(state.bury(), None);
        assert!(state.is_alive());

        state.kill(None);
        assert_eq!(state.bury(), Some(Ok(())));
        assert_eq!(state.bury(), None);
        assert_eq!(state.kill(Some(TaskError::fail("too late"))), Transition::Ignored);
        assert_eq!(state, State::Dead(None));
    }
}
