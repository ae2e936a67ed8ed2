// ============================
// crates/backend-lib/src/auth/session.rs
// ============================
//! Session token handling and management.
use noteapp_common::SessionIdentity;
use tokio::sync::RwLock;
use std::{collections::HashMap, sync::Arc, time::{Duration, SystemTime}};
use metrics::{counter, gauge};
use uuid::Uuid;

use crate::metrics::{SESSION_ACTIVE, SESSION_CREATED, SESSION_DESTROYED, SESSION_EXPIRED};

/// Default session TTL (time to live)
pub const SESSION_TTL: Duration = Duration::from_secs(60 * 60 * 24 * 7); // 7 days

/// A bound session: the identity projection plus its lifetime bounds.
///
/// Only the [`SessionIdentity`] projection is stored; the credential hash and
/// salt never enter the session store.
#[derive(Clone)]
pub struct Session {
    pub identity: SessionIdentity,
    pub created_at: SystemTime,
    pub expires_at: SystemTime,
}

/// Session manager for handling browser sessions
#[derive(Clone)]
pub struct SessionManager {
    sessions: Arc<RwLock<HashMap<String, Session>>>,
    ttl: Duration,
}

impl SessionManager {
    /// Create a new session manager and spawn its cleanup task
    pub fn new(ttl: Duration) -> Self {
        let manager = SessionManager {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            ttl,
        };

        let manager_clone = manager.clone();
        tokio::spawn(async move {
            manager_clone.cleanup_task().await;
        });

        manager
    }

    /// Bind an identity to a fresh session, returning the opaque token
    pub async fn bind(&self, identity: SessionIdentity) -> String {
        let token = Uuid::new_v4().to_string();
        let now = SystemTime::now();
        let session = Session {
            identity,
            created_at: now,
            expires_at: now + self.ttl,
        };

        let mut sessions = self.sessions.write().await;
        sessions.insert(token.clone(), session);

        counter!(SESSION_CREATED).increment(1);
        gauge!(SESSION_ACTIVE).set(sessions.len() as f64);

        token
    }

    /// Resolve a token to its bound identity, if the session is still live.
    ///
    /// An expired session resolves to `None`; the caller cannot tell an
    /// expired session from a missing one.
    pub async fn resolve(&self, token: &str) -> Option<SessionIdentity> {
        let sessions = self.sessions.read().await;
        let session = sessions.get(token)?;
        if SystemTime::now() < session.expires_at {
            Some(session.identity.clone())
        } else {
            None
        }
    }

    /// Destroy the session bound to a token. Idempotent.
    pub async fn unbind(&self, token: &str) {
        let mut sessions = self.sessions.write().await;
        if sessions.remove(token).is_some() {
            counter!(SESSION_DESTROYED).increment(1);
            gauge!(SESSION_ACTIVE).set(sessions.len() as f64);
        }
    }

    /// Cleanup task that runs periodically to remove expired sessions
    async fn cleanup_task(&self) {
        let cleanup_interval = Duration::from_secs(60 * 60); // 1 hour

        loop {
            tokio::time::sleep(cleanup_interval).await;

            let mut sessions = self.sessions.write().await;
            let now = SystemTime::now();
            let before_count = sessions.len();

            sessions.retain(|_, session| now < session.expires_at);

            let removed = before_count - sessions.len();
            if removed > 0 {
                counter!(SESSION_EXPIRED).increment(removed as u64);
                gauge!(SESSION_ACTIVE).set(sessions.len() as f64);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(name: &str) -> SessionIdentity {
        SessionIdentity {
            id: Uuid::new_v4(),
            username: name.to_string(),
        }
    }

    #[tokio::test]
    async fn test_bind_and_resolve() {
        let manager = SessionManager::new(SESSION_TTL);
        let alice = identity("alice1");

        let token = manager.bind(alice.clone()).await;
        let resolved = manager.resolve(&token).await;
        assert_eq!(resolved, Some(alice));
    }

    #[tokio::test]
    async fn test_resolve_unknown_token() {
        let manager = SessionManager::new(SESSION_TTL);
        assert!(manager.resolve("no-such-token").await.is_none());
    }

    #[tokio::test]
    async fn test_expired_session_resolves_to_none() {
        let manager = SessionManager::new(Duration::ZERO);
        let token = manager.bind(identity("alice1")).await;
        assert!(manager.resolve(&token).await.is_none());
    }

    #[tokio::test]
    async fn test_unbind_is_idempotent() {
        let manager = SessionManager::new(SESSION_TTL);
        let token = manager.bind(identity("alice1")).await;

        manager.unbind(&token).await;
        assert!(manager.resolve(&token).await.is_none());

        // Second unbind of the same token is not an error
        manager.unbind(&token).await;
    }

    #[tokio::test]
    async fn test_tokens_are_unique_per_bind() {
        let manager = SessionManager::new(SESSION_TTL);
        let a = manager.bind(identity("alice1")).await;
        let b = manager.bind(identity("alice1")).await;
        assert_ne!(a, b);
    }
}
