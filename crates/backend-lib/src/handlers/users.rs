// ============================
// crates/backend-lib/src/handlers/users.rs
// ============================
//! Account endpoints: profile, statistics, password re-verification and
//! account deletion. JSON in and out; all behind the access gate.
use std::sync::Arc;
use axum::{
    extract::State,
    http::{header, HeaderMap},
    response::{IntoResponse, Response},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use metrics::counter;
use serde::Serialize;

use noteapp_common::{PasswordForm, SessionIdentity};

use crate::error::AppError;
use crate::metrics::USER_DELETED;
use crate::middleware::{session_token, SESSION_COOKIE};
use crate::storage::Storage;
use crate::AppState;

#[derive(Serialize)]
pub struct ProfileResponse {
    pub username: String,
    pub created_at: DateTime<Utc>,
    pub last_login_at: Option<DateTime<Utc>>,
    pub notes_count: usize,
}

#[derive(Serialize)]
pub struct StatsResponse {
    pub notes_count: usize,
    pub account_age_days: i64,
    pub created_at: DateTime<Utc>,
    pub last_login_at: Option<DateTime<Utc>>,
}

/// Get user profile information
pub async fn profile<S: Storage + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Extension(identity): Extension<SessionIdentity>,
) -> Result<Json<ProfileResponse>, AppError> {
    let record = state
        .auth
        .resolve_from_session(&identity)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
    let notes_count = state.storage.list_notes(identity.id).await?.len();

    Ok(Json(ProfileResponse {
        username: record.username,
        created_at: record.created_at,
        last_login_at: record.last_login_at,
        notes_count,
    }))
}

/// Get account statistics
pub async fn stats<S: Storage + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Extension(identity): Extension<SessionIdentity>,
) -> Result<Json<StatsResponse>, AppError> {
    let record = state
        .auth
        .resolve_from_session(&identity)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
    let notes_count = state.storage.list_notes(identity.id).await?.len();
    let account_age_days = (Utc::now() - record.created_at).num_days();

    Ok(Json(StatsResponse {
        notes_count,
        account_age_days,
        created_at: record.created_at,
        last_login_at: record.last_login_at,
    }))
}

/// Re-verify the current user's password
pub async fn verify_password<S: Storage + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Extension(identity): Extension<SessionIdentity>,
    Json(form): Json<PasswordForm>,
) -> Result<Json<serde_json::Value>, AppError> {
    if form.password.is_empty() {
        return Err(AppError::MissingField("password"));
    }

    if !state.auth.verify_credential(identity.id, &form.password).await? {
        return Err(AppError::InvalidCredentials);
    }

    Ok(Json(serde_json::json!({ "message": "Password verified" })))
}

/// Delete the user's account and all associated notes.
///
/// The password is re-verified first; on success the notes go, then the
/// credential record, then the session.
pub async fn remove_account<S: Storage + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Extension(identity): Extension<SessionIdentity>,
    headers: HeaderMap,
    Json(form): Json<PasswordForm>,
) -> Result<Response, AppError> {
    if form.password.is_empty() {
        return Err(AppError::MissingField("password"));
    }

    if !state.auth.verify_credential(identity.id, &form.password).await? {
        return Err(AppError::InvalidCredentials);
    }

    state.storage.delete_notes_for_user(identity.id).await?;
    state.storage.delete_user(identity.id).await?;

    if let Some(token) = headers
        .get(header::COOKIE)
        .and_then(|h| h.to_str().ok())
        .and_then(session_token)
    {
        state.auth.logout(&token).await;
    }

    counter!(USER_DELETED).increment(1);
    tracing::info!(username = %identity.username, "account deleted");

    let clear = format!("{SESSION_COOKIE}=; Path=/; HttpOnly; Max-Age=0");
    Ok((
        [(header::SET_COOKIE, clear)],
        Json(serde_json::json!({
            "message": "Account deleted successfully. Redirecting to home..."
        })),
    )
        .into_response())
}
