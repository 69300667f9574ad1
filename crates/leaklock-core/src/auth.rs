//! Caller authentication ahead of dispatch.
//!
//! The owner of a dispatch always comes from an authenticated credential,
//! never from the event payload.

use std::collections::HashMap;

use async_trait::async_trait;
use leaklock_state::OwnerId;

use crate::domain::{DispatchError, LeakLockError, Result};

/// Resolves a bearer token to the owner it belongs to.
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Returns `DispatchError::Unauthorized` when the token is not recognised.
    async fn authenticate(&self, token: &str) -> std::result::Result<OwnerId, DispatchError>;
}

/// Extract the token from an `Authorization` header value.
///
/// Accepts both `"Bearer <token>"` and a bare token. Returns `None` when
/// nothing usable remains.
pub fn bearer_token(header: &str) -> Option<&str> {
    let trimmed = header.trim();
    let token = match trimmed.get(..6) {
        Some(scheme) if scheme.eq_ignore_ascii_case("bearer") => {
            let rest = &trimmed[6..];
            if rest.is_empty() || rest.starts_with(char::is_whitespace) {
                rest.trim()
            } else {
                trimmed
            }
        }
        _ => trimmed,
    };
    (!token.is_empty()).then_some(token)
}

/// Fixed token table, typically loaded from `LEAKLOCK_TOKENS`.
#[derive(Debug, Clone, Default)]
pub struct StaticTokenAuthenticator {
    tokens: HashMap<String, OwnerId>,
}

impl StaticTokenAuthenticator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(mut self, token: impl Into<String>, owner: OwnerId) -> Self {
        self.tokens.insert(token.into(), owner);
        self
    }

    /// Parse `"tok1=user-a,tok2=user-b"`.
    pub fn parse(spec: &str) -> Result<Self> {
        let mut auth = Self::new();
        for entry in spec.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            let (token, owner) = entry.split_once('=').ok_or_else(|| {
                LeakLockError::Config(format!("token entry {entry:?} is not of the form token=owner"))
            })?;
            let token = token.trim();
            if token.is_empty() {
                return Err(LeakLockError::Config(format!(
                    "token entry {entry:?} has an empty token"
                )));
            }
            auth = auth.with_token(token, OwnerId::parse(owner)?);
        }
        Ok(auth)
    }

    /// Create from the LEAKLOCK_TOKENS environment variable (empty table if unset)
    pub fn from_env() -> Result<Self> {
        match std::env::var("LEAKLOCK_TOKENS") {
            Ok(spec) => Self::parse(&spec),
            Err(_) => Ok(Self::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

#[async_trait]
impl Authenticator for StaticTokenAuthenticator {
    async fn authenticate(&self, token: &str) -> std::result::Result<OwnerId, DispatchError> {
        self.tokens
            .get(token)
            .cloned()
            .ok_or_else(|| DispatchError::Unauthorized("invalid bearer token".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use leaklock_state::StorageError;

    #[test]
    fn bearer_prefix_is_stripped() {
        assert_eq!(bearer_token("Bearer abc123"), Some("abc123"));
        assert_eq!(bearer_token("  Bearer   abc123 "), Some("abc123"));
        assert_eq!(bearer_token("abc123"), Some("abc123"));
        assert_eq!(bearer_token("Bearer "), None);
        assert_eq!(bearer_token(""), None);
    }

    #[test]
    fn parse_token_table() {
        let auth = StaticTokenAuthenticator::parse("tok1=user-a, tok2=user-b,").unwrap();
        assert_eq!(auth.len(), 2);
    }

    #[test]
    fn parse_rejects_malformed_entries() {
        assert!(StaticTokenAuthenticator::parse("tok1").is_err());
        assert!(StaticTokenAuthenticator::parse("=user-a").is_err());
        assert!(matches!(
            StaticTokenAuthenticator::parse("tok1=  "),
            Err(LeakLockError::Storage(StorageError::InvalidOwner))
        ));
    }

    #[tokio::test]
    async fn authenticate_known_and_unknown_tokens() {
        let auth = StaticTokenAuthenticator::parse("tok1=user-a").unwrap();

        let owner = auth.authenticate("tok1").await.unwrap();
        assert_eq!(owner.as_str(), "user-a");

        let err = auth.authenticate("nope").await.unwrap_err();
        assert!(matches!(err, DispatchError::Unauthorized(_)));
    }
}
