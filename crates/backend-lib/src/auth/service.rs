use async_trait::async_trait;
use noteapp_common::{CredentialRecord, SessionIdentity};
use uuid::Uuid;

use crate::error::AppError;

/// The authentication surface handed to request handlers.
///
/// One value is constructed at startup with its dependencies injected and
/// shared through `AppState`; there is no process-global registration.
#[async_trait]
pub trait AuthService: Send + Sync {
    /// Validate and persist a new credential record. Does not authenticate.
    async fn register(
        &self,
        username: &str,
        password: &str,
    ) -> Result<CredentialRecord, AppError>;

    /// Verify credentials and bind a session, returning the session token
    /// and the bound identity.
    async fn login(
        &self,
        username: &str,
        password: &str,
    ) -> Result<(String, SessionIdentity), AppError>;

    /// Destroy the session bound to a token. Idempotent.
    async fn logout(&self, token: &str);

    /// Resolve a session token to its identity, if the session is live
    async fn authenticate(&self, token: &str) -> Option<SessionIdentity>;

    /// Re-verify a password for an already-authenticated user
    async fn verify_credential(&self, id: Uuid, password: &str) -> Result<bool, AppError>;

    /// Look up the full credential record behind a session identity
    async fn resolve_from_session(
        &self,
        identity: &SessionIdentity,
    ) -> Result<Option<CredentialRecord>, AppError>;
}
