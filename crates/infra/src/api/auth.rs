//! Session token storage and the auth gate implementation.
//!
//! The actual login UI is out of scope here; [`LoginFlow`] is the seam the
//! application wires its identity-provider flow into. The gate only answers
//! "is there a valid session" and "run the flow and tell me if it worked".

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use fieldsync_core::AuthGate;
use parking_lot::RwLock;
use tracing::{debug, info};

/// A bearer token with its expiry.
#[derive(Debug, Clone)]
pub struct SessionToken {
    pub access_token: String,
    pub expires_at: DateTime<Utc>,
}

impl SessionToken {
    pub fn is_valid(&self) -> bool {
        Utc::now() < self.expires_at
    }
}

/// In-memory session token store shared between the API client and the
/// auth gate.
#[derive(Default)]
pub struct SessionTokenStore {
    inner: RwLock<Option<SessionToken>>,
}

impl SessionTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_session(&self, access_token: impl Into<String>, expires_at: DateTime<Utc>) {
        *self.inner.write() =
            Some(SessionToken { access_token: access_token.into(), expires_at });
    }

    pub fn clear(&self) {
        *self.inner.write() = None;
    }

    /// Whether a non-expired session exists.
    pub fn is_valid(&self) -> bool {
        self.inner.read().as_ref().is_some_and(SessionToken::is_valid)
    }

    /// The bearer token to attach to requests, if a valid session exists.
    pub fn bearer(&self) -> Option<String> {
        self.inner
            .read()
            .as_ref()
            .filter(|token| token.is_valid())
            .map(|token| token.access_token.clone())
    }
}

/// Application-provided authentication flow (interactive login).
#[async_trait]
pub trait LoginFlow: Send + Sync {
    /// Run the login flow. Returns the new session on success.
    async fn login(&self) -> Option<SessionToken>;
}

/// [`AuthGate`] implementation backed by the token store and a login flow.
pub struct SessionAuthGate {
    tokens: Arc<SessionTokenStore>,
    login: Arc<dyn LoginFlow>,
}

impl SessionAuthGate {
    pub fn new(tokens: Arc<SessionTokenStore>, login: Arc<dyn LoginFlow>) -> Self {
        Self { tokens, login }
    }
}

#[async_trait]
impl AuthGate for SessionAuthGate {
    fn is_authenticated(&self) -> bool {
        self.tokens.is_valid()
    }

    async fn request_authentication(&self) -> bool {
        debug!("Running authentication flow");
        match self.login.login().await {
            Some(token) => {
                info!("Authentication succeeded");
                self.tokens.set_session(token.access_token, token.expires_at);
                true
            }
            None => {
                info!("Authentication failed or was abandoned");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    struct FixedLogin(Option<SessionToken>);

    #[async_trait]
    impl LoginFlow for FixedLogin {
        async fn login(&self) -> Option<SessionToken> {
            self.0.clone()
        }
    }

    fn future_token() -> SessionToken {
        SessionToken { access_token: "tok".into(), expires_at: Utc::now() + Duration::hours(1) }
    }

    #[test]
    fn expired_token_is_not_a_session() {
        let store = SessionTokenStore::new();
        store.set_session("stale", Utc::now() - Duration::minutes(5));
        assert!(!store.is_valid());
        assert!(store.bearer().is_none());
    }

    #[test]
    fn clear_removes_the_session() {
        let store = SessionTokenStore::new();
        store.set_session("tok", Utc::now() + Duration::hours(1));
        assert!(store.is_valid());
        store.clear();
        assert!(!store.is_valid());
    }

    #[tokio::test]
    async fn successful_login_stores_the_session() {
        let store = Arc::new(SessionTokenStore::new());
        let gate = SessionAuthGate::new(store.clone(), Arc::new(FixedLogin(Some(future_token()))));

        assert!(!gate.is_authenticated());
        assert!(gate.request_authentication().await);
        assert!(gate.is_authenticated());
        assert_eq!(store.bearer().as_deref(), Some("tok"));
    }

    #[tokio::test]
    async fn abandoned_login_leaves_gate_unauthenticated() {
        let store = Arc::new(SessionTokenStore::new());
        let gate = SessionAuthGate::new(store.clone(), Arc::new(FixedLogin(None)));

        assert!(!gate.request_authentication().await);
        assert!(!gate.is_authenticated());
    }
}
