//! Caller Identity
//!
//! Token verification is an external concern; the core only needs an
//! opaque token turned into a user ID.

use std::collections::HashMap;

use async_trait::async_trait;

/// A verified caller
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Identity {
    pub user_id: String,
}

impl Identity {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self { user_id: user_id.into() }
    }
}

/// Verifies bearer tokens
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    /// `None` for any token that is missing, malformed, expired or forged
    async fn verify(&self, token: &str) -> Option<Identity>;
}

/// Fixed token → user map, for tests and local development
#[derive(Clone, Debug, Default)]
pub struct StaticTokenVerifier {
    tokens: HashMap<String, Identity>,
}

impl StaticTokenVerifier {
    pub fn new() -> Self {
        Self::default()
    }
    
    #[must_use]
    pub fn with_user(mut self, token: impl Into<String>, user_id: impl Into<String>) -> Self {
        self.tokens.insert(token.into(), Identity::new(user_id));
        self
    }
}

#[async_trait]
impl IdentityVerifier for StaticTokenVerifier {
    async fn verify(&self, token: &str) -> Option<Identity> {
        self.tokens.get(token).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_verifier() {
        let verifier = StaticTokenVerifier::new().with_user("tok-a", "alice");
        assert_eq!(verifier.verify("tok-a").await, Some(Identity::new("alice")));
        assert_eq!(verifier.verify("tok-b").await, None);
    }
}
