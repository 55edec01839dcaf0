use crate::credential::error::{UpstreamError, ValidatorError};
use crate::error::TaskError;

/// Terminal result of a credential validator, as seen by whoever launched it.
///
/// `ValidityChanged`, `KeyChanged` and `NotApplicable` are expected terminations: the
/// launcher is meant to react (restart the worker, bounce the unit) rather than treat
/// them as faults.
#[non_exhaustive]
#[derive(Clone, Debug)]
pub enum Outcome {
    /// Stopped on request with no reason recorded.
    StoppedCleanly,
    /// The tracked credential's validity flipped.
    ValidityChanged,
    /// A different credential is bound to the unit now.
    KeyChanged,
    /// The unit does not track a credential.
    NotApplicable,
    /// The change stream closed while the worker was alive.
    Dying,
    /// A facade call failed.
    UpstreamFailure(UpstreamError),
    /// The worker panicked or was stopped with a supervisor-level failure.
    Aborted(TaskError),
}

impl Outcome {
    /// Maps a validator's final result to its outcome.
    pub fn from_result(res: Result<(), ValidatorError>) -> Self {
        match res {
            Ok(()) => Outcome::StoppedCleanly,
            Err(ValidatorError::ValidityChanged) => Outcome::ValidityChanged,
            Err(ValidatorError::CredentialChanged) => Outcome::KeyChanged,
            Err(ValidatorError::NotApplicable) => Outcome::NotApplicable,
            Err(ValidatorError::Upstream(e)) => Outcome::UpstreamFailure(e),
            Err(ValidatorError::Task(TaskError::Dying)) => Outcome::Dying,
            Err(ValidatorError::Task(e)) => Outcome::Aborted(e),
        }
    }

    /// True for outcomes the launcher should handle as normal control flow.
    pub fn is_expected(&self) -> bool {
        matches!(
            self,
            Outcome::StoppedCleanly
                | Outcome::ValidityChanged
                | Outcome::KeyChanged
                | Outcome::NotApplicable
        )
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            Outcome::StoppedCleanly => "stopped_cleanly",
            Outcome::ValidityChanged => "validity_changed",
            Outcome::KeyChanged => "key_changed",
            Outcome::NotApplicable => "not_applicable",
            Outcome::Dying => "dying",
            Outcome::UpstreamFailure(_) => "upstream_failure",
            Outcome::Aborted(_) => "aborted",
        }
    }
}

impl From<Result<(), ValidatorError>> for Outcome {
    fn from(res: Result<(), ValidatorError>) -> Self {
        Outcome::from_result(res)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinels_map_to_expected_outcomes() {
        assert!(matches!(Outcome::from_result(Ok(())), Outcome::StoppedCleanly));
        assert!(matches!(
            Outcome::from(Err(ValidatorError::CredentialChanged)),
            Outcome::KeyChanged
        ));
        assert!(Outcome::from(Err(ValidatorError::NotApplicable)).is_expected());
        assert!(Outcome::from(Err(ValidatorError::ValidityChanged)).is_expected());
    }

    #[test]
    fn task_errors_are_not_expected() {
        let dying = Outcome::from(Err(TaskError::Dying.into()));
        assert!(matches!(dying, Outcome::Dying));
        assert!(!dying.is_expected());

        let panicked = Outcome::from(Err(TaskError::Panicked { info: "boom".into() }.into()));
        assert_eq!(panicked.as_label(), "aborted");
        assert!(!panicked.is_expected());
    }
}
