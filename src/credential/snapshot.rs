//! Credential snapshot value types.

use std::fmt;

/// Opaque identifier of a stored credential.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CredentialKey(String);

impl CredentialKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CredentialKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CredentialKey {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

impl From<String> for CredentialKey {
    fn from(key: String) -> Self {
        Self(key)
    }
}

/// The credential currently bound to a managed unit, as read at one point in time.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoredCredential {
    /// Which credential is bound.
    pub key: CredentialKey,
    /// Whether that credential is currently valid.
    pub valid: bool,
}

/// Point-in-time read of the state a credential worker tracks.
pub type Snapshot = StoredCredential;

/// Observable difference between two snapshots.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Drift {
    /// A different credential is bound now.
    KeyChanged {
        from: CredentialKey,
        to: CredentialKey,
    },
    /// Same credential, validity flipped to `valid`.
    ValidityChanged { valid: bool },
}

impl StoredCredential {
    pub fn new(key: impl Into<CredentialKey>, valid: bool) -> Self {
        Self {
            key: key.into(),
            valid,
        }
    }

    /// Compares `current` against `self`.
    ///
    /// A key change is reported even if validity changed too: a watch on the old key
    /// means nothing once the key is gone.
    pub fn drift(&self, current: &StoredCredential) -> Option<Drift> {
        if self.key != current.key {
            return Some(Drift::KeyChanged {
                from: self.key.clone(),
                to: current.key.clone(),
            });
        }
        if self.valid != current.valid {
            return Some(Drift::ValidityChanged {
                valid: current.valid,
            });
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_change_beats_validity_change() {
        let before = StoredCredential::new("a", true);
        let after = StoredCredential::new("b", false);
        assert_eq!(
            before.drift(&after),
            Some(Drift::KeyChanged {
                from: "a".into(),
                to: "b".into()
            })
        );
    }

    #[test]
    fn validity_flip_is_reported() {
        let before = StoredCredential::new("a", true);
        assert_eq!(
            before.drift(&StoredCredential::new("a", false)),
            Some(Drift::ValidityChanged { valid: false })
        );
    }

    #[test]
    fn equal_snapshots_do_not_drift() {
        let before = StoredCredential::new("a", false);
        assert_eq!(before.drift(&before.clone()), None);
    }
}
