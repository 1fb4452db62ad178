//! Credential verification.
//!
//! The session handshake consults a [`CredentialStore`] exactly once per
//! connection. The store is fail-closed: an unknown identity and a
//! mismatched secret are indistinguishable to the peer, both end the
//! session with `AUTH_FAIL`.

use crate::config::AuthConfig;
use std::collections::HashMap;

/// Pluggable identity -> secret lookup.
pub trait CredentialStore: Send + Sync {
    /// Returns true only when `user` exists and `pass` matches its secret.
    fn verify(&self, user: &str, pass: &str) -> bool;
}

/// In-memory credential table, loaded from configuration.
#[derive(Debug, Clone, Default)]
pub struct StaticCredentials {
    users: HashMap<String, String>,
}

impl StaticCredentials {
    pub fn new(users: HashMap<String, String>) -> Self {
        Self { users }
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

impl From<&AuthConfig> for StaticCredentials {
    fn from(config: &AuthConfig) -> Self {
        Self {
            users: config
                .users
                .iter()
                .map(|(u, p)| (u.clone(), p.clone()))
                .collect(),
        }
    }
}

impl CredentialStore for StaticCredentials {
    fn verify(&self, user: &str, pass: &str) -> bool {
        self.users.get(user).is_some_and(|secret| secret == pass)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> StaticCredentials {
        StaticCredentials::from(&AuthConfig::default())
    }

    #[test]
    fn known_user_with_matching_secret_passes() {
        assert!(store().verify("cl1", "cl1pass"));
    }

    #[test]
    fn unknown_user_fails_closed() {
        assert!(!store().verify("mallory", "cl1pass"));
    }

    #[test]
    fn wrong_secret_fails_closed() {
        assert!(!store().verify("cl1", "cl2pass"));
        assert!(!store().verify("cl1", ""));
    }

    #[test]
    fn empty_table_rejects_everyone() {
        let empty = StaticCredentials::default();
        assert!(!empty.verify("cl1", "cl1pass"));
        assert!(!empty.verify("", ""));
    }
}
