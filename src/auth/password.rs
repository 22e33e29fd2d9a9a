use std::fmt;

use thiserror::Error;
use tracing::error;

use crate::config::{DEFAULT_HASH_COST, MAX_HASH_COST, MIN_HASH_COST};

#[derive(Debug, Error)]
#[error("hashing failed: {0}")]
pub struct HashError(pub String);

/// One-way encoded password. Only a hasher or the store produces one.
#[derive(Clone, PartialEq, Eq)]
pub struct HashedPassword(String);

impl HashedPassword {
    pub(crate) fn from_encoded(encoded: String) -> Self {
        Self(encoded)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for HashedPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("HashedPassword(<redacted>)")
    }
}

pub trait CredentialHasher: Send + Sync {
    fn hash(&self, plain: &str) -> Result<HashedPassword, HashError>;

    /// A mismatch or an unreadable hash is `false`, never an error.
    fn compare(&self, hashed: &HashedPassword, plain: &str) -> bool;
}

#[derive(Debug, Clone)]
pub struct BcryptHasher {
    cost: u32,
}

impl BcryptHasher {
    pub fn new(cost: u32) -> Self {
        let cost = if (MIN_HASH_COST..=MAX_HASH_COST).contains(&cost) {
            cost
        } else {
            DEFAULT_HASH_COST
        };
        Self { cost }
    }

    pub fn cost(&self) -> u32 {
        self.cost
    }
}

impl Default for BcryptHasher {
    fn default() -> Self {
        Self::new(DEFAULT_HASH_COST)
    }
}

impl CredentialHasher for BcryptHasher {
    fn hash(&self, plain: &str) -> Result<HashedPassword, HashError> {
        bcrypt::hash(plain, self.cost)
            .map(HashedPassword::from_encoded)
            .map_err(|e| {
                error!(error = %e, "bcrypt hash error");
                HashError(e.to_string())
            })
    }

    fn compare(&self, hashed: &HashedPassword, plain: &str) -> bool {
        bcrypt::verify(plain, hashed.as_str()).unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hasher() -> BcryptHasher {
        BcryptHasher::new(MIN_HASH_COST)
    }

    #[test]
    fn hash_and_compare_roundtrip() {
        let hasher = hasher();
        let hash = hasher.hash("@Password1").expect("hashing should succeed");
        assert_ne!(hash.as_str(), "@Password1");
        assert!(hasher.compare(&hash, "@Password1"));
    }

    #[test]
    fn compare_rejects_other_plaintexts() {
        let hasher = hasher();
        let hash = hasher.hash("@Password1").expect("hashing should succeed");
        for other in ["@Password2", "@password1", "", "@Password1 "] {
            assert!(!hasher.compare(&hash, other), "{other}");
        }
    }

    #[test]
    fn compare_is_false_on_malformed_hash() {
        let bogus = HashedPassword::from_encoded("not-a-valid-hash".into());
        assert!(!hasher().compare(&bogus, "anything"));
    }

    #[test]
    fn hashes_are_salted() {
        let hasher = hasher();
        let a = hasher.hash("@Password1").unwrap();
        let b = hasher.hash("@Password1").unwrap();
        assert_ne!(a, b);
        assert!(hasher.compare(&a, "@Password1"));
        assert!(hasher.compare(&b, "@Password1"));
    }

    #[test]
    fn cost_is_embedded_and_clamped() {
        let hash = hasher().hash("@Password1").unwrap();
        assert!(hash.as_str().starts_with("$2b$04$"));
        assert_eq!(BcryptHasher::new(3).cost(), DEFAULT_HASH_COST);
        assert_eq!(BcryptHasher::new(32).cost(), DEFAULT_HASH_COST);
        assert_eq!(BcryptHasher::new(12).cost(), 12);
    }

    #[test]
    fn debug_output_is_redacted() {
        let hash = hasher().hash("@Password1").unwrap();
        assert!(!format!("{hash:?}").contains(hash.as_str()));
    }
}
