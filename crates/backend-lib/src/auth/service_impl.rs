use async_trait::async_trait;
use chrono::Utc;
use metrics::counter;
use noteapp_common::{CredentialRecord, SessionIdentity};
use uuid::Uuid;

use crate::auth::password::{
    encode_for_storage, generate_salt, hash_password, validate_password_strength, verify_password,
    PBKDF2_ITERATIONS,
};
use crate::auth::{AuthService, SessionManager};
use crate::config::PasswordRequirements;
use crate::error::AppError;
use crate::metrics::{LOGIN_FAILED, LOGIN_SUCCEEDED, USER_REGISTERED};
use crate::storage::Storage;
use crate::validation::{normalize_username, MIN_USERNAME_LENGTH};

/// Project a credential record down to its session-safe identity.
///
/// The projection is the only thing the session layer ever sees; hash and
/// salt stay behind in the store.
pub fn project_to_session(record: &CredentialRecord) -> SessionIdentity {
    SessionIdentity {
        id: record.id,
        username: record.username.clone(),
    }
}

/// Default [`AuthService`] implementation over an injected store.
pub struct DefaultAuth<S> {
    store: S,
    sessions: SessionManager,
    requirements: PasswordRequirements,
    iterations: u32,
}

impl<S: Storage> DefaultAuth<S> {
    pub fn new(store: S, sessions: SessionManager, requirements: PasswordRequirements) -> Self {
        Self {
            store,
            sessions,
            requirements,
            iterations: PBKDF2_ITERATIONS,
        }
    }

    /// Override the KDF iteration count. For test configurations only; the
    /// production count is [`PBKDF2_ITERATIONS`].
    pub fn with_iterations(mut self, iterations: u32) -> Self {
        self.iterations = iterations;
        self
    }

    /// Map a storage failure into the registrar's taxonomy, keeping the
    /// uniqueness conflict distinct from everything else.
    fn storage_error(e: AppError) -> AppError {
        match e {
            AppError::UsernameTaken => AppError::UsernameTaken,
            other => AppError::Persistence(other.to_string()),
        }
    }
}

#[async_trait]
impl<S: Storage> AuthService for DefaultAuth<S> {
    async fn register(
        &self,
        username: &str,
        password: &str,
    ) -> Result<CredentialRecord, AppError> {
        if username.trim().is_empty() {
            return Err(AppError::MissingField("username"));
        }
        if password.is_empty() {
            return Err(AppError::MissingField("password"));
        }

        let username = normalize_username(username);

        if self
            .store
            .find_user_by_username(&username)
            .await
            .map_err(Self::storage_error)?
            .is_some()
        {
            return Err(AppError::UsernameTaken);
        }

        if username.chars().count() < MIN_USERNAME_LENGTH {
            return Err(AppError::UsernameTooShort {
                min: MIN_USERNAME_LENGTH,
            });
        }
        if password.len() < self.requirements.min_length {
            return Err(AppError::PasswordTooShort {
                min: self.requirements.min_length,
            });
        }
        if !validate_password_strength(password, &self.requirements) {
            return Err(AppError::PasswordTooWeak);
        }

        // Salt generation happens-before derivation happens-before persist.
        let salt = generate_salt();
        let hash = hash_password(password, &salt, self.iterations).await?;

        let record = CredentialRecord {
            id: Uuid::new_v4(),
            username,
            hashed_password: encode_for_storage(&hash),
            password_salt: encode_for_storage(&salt),
            created_at: Utc::now(),
            last_login_at: None,
        };

        // A racing registration loses here and surfaces as UsernameTaken,
        // same as the pre-check above.
        let record = self
            .store
            .create_user(record)
            .await
            .map_err(Self::storage_error)?;

        counter!(USER_REGISTERED).increment(1);
        tracing::info!(username = %record.username, "registered new user");

        Ok(record)
    }

    async fn login(
        &self,
        username: &str,
        password: &str,
    ) -> Result<(String, SessionIdentity), AppError> {
        let username = normalize_username(username);

        let Some(record) = self
            .store
            .find_user_by_username(&username)
            .await
            .map_err(Self::storage_error)?
        else {
            // Logged distinctly, but the caller sees the same generic
            // failure as a password mismatch.
            tracing::info!(username = %username, "login failed: unknown user");
            counter!(LOGIN_FAILED).increment(1);
            return Err(AppError::InvalidCredentials);
        };

        if !verify_password(
            password,
            &record.hashed_password,
            &record.password_salt,
            self.iterations,
        )
        .await
        {
            tracing::info!(username = %username, "login failed: password mismatch");
            counter!(LOGIN_FAILED).increment(1);
            return Err(AppError::InvalidCredentials);
        }

        self.store
            .touch_last_login(record.id, Utc::now())
            .await
            .map_err(Self::storage_error)?;

        let identity = project_to_session(&record);
        let token = self.sessions.bind(identity.clone()).await;

        counter!(LOGIN_SUCCEEDED).increment(1);
        tracing::info!(username = %identity.username, "login succeeded");

        Ok((token, identity))
    }

    async fn logout(&self, token: &str) {
        self.sessions.unbind(token).await;
    }

    async fn authenticate(&self, token: &str) -> Option<SessionIdentity> {
        self.sessions.resolve(token).await
    }

    async fn verify_credential(&self, id: Uuid, password: &str) -> Result<bool, AppError> {
        let Some(record) = self
            .store
            .find_user_by_id(id)
            .await
            .map_err(Self::storage_error)?
        else {
            return Err(AppError::NotFound(format!("user {id}")));
        };

        Ok(verify_password(
            password,
            &record.hashed_password,
            &record.password_salt,
            self.iterations,
        )
        .await)
    }

    async fn resolve_from_session(
        &self,
        identity: &SessionIdentity,
    ) -> Result<Option<CredentialRecord>, AppError> {
        self.store
            .find_user_by_id(identity.id)
            .await
            .map_err(Self::storage_error)
    }
}
