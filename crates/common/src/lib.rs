// ================
// common/src/lib.rs
// ================
//! Shared domain types for the note-taking server.
//! These records cross the boundary between the handlers, the auth core and
//! the storage backend.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A stored user credential.
///
/// `hashed_password` and `password_salt` are base64-encoded byte strings.
/// They are written together at registration and only ever change together;
/// the salt is regenerated whenever the password changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CredentialRecord {
    /// Opaque unique key, assigned at creation, immutable.
    pub id: Uuid,
    /// Normalized (trimmed, lower-cased) unique username.
    pub username: String,
    /// Derived-key bytes, base64-encoded.
    pub hashed_password: String,
    /// Per-account random salt bytes, base64-encoded.
    pub password_salt: String,
    pub created_at: DateTime<Utc>,
    pub last_login_at: Option<DateTime<Utc>>,
}

/// The minimal authenticated-user projection bound to a browser session.
///
/// Deliberately a separate type rather than a view over [`CredentialRecord`]:
/// serializing it cannot leak the hash or salt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionIdentity {
    pub id: Uuid,
    pub username: String,
}

/// A note owned by a single user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NoteRecord {
    pub id: Uuid,
    /// Owning user's id.
    pub user: Uuid,
    pub title: String,
    pub content: String,
    pub date: DateTime<Utc>,
}

/// Body of the registration and login forms.
#[derive(Debug, Clone, Deserialize)]
pub struct CredentialsForm {
    pub username: String,
    pub password: String,
}

/// Body of the note create/update forms.
#[derive(Debug, Clone, Deserialize)]
pub struct NoteForm {
    pub title: String,
    pub content: String,
}

/// Body of the password re-verification endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct PasswordForm {
    pub password: String,
}
