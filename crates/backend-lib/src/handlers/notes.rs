// ============================
// crates/backend-lib/src/handlers/notes.rs
// ============================
//! Note CRUD handlers. Every route here sits behind the access gate, so the
//! session identity is always present in request extensions.
use std::sync::Arc;
use axum::{
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
    Extension, Form, Json,
};
use chrono::Utc;
use metrics::counter;
use uuid::Uuid;

use noteapp_common::{NoteForm, NoteRecord, SessionIdentity};

use crate::error::AppError;
use crate::metrics::{NOTE_CREATED, NOTE_DELETED, NOTE_UPDATED};
use crate::storage::Storage;
use crate::AppState;

fn validated(form: &NoteForm) -> Result<(String, String), AppError> {
    let title = form.title.trim();
    let content = form.content.trim();
    if title.is_empty() || content.is_empty() {
        return Err(AppError::InvalidInput(
            "Title and content are required".to_string(),
        ));
    }
    Ok((title.to_string(), content.to_string()))
}

/// Display all notes, newest first
pub async fn list_notes<S: Storage + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Extension(identity): Extension<SessionIdentity>,
) -> Result<Json<Vec<NoteRecord>>, AppError> {
    let notes = state.storage.list_notes(identity.id).await?;
    Ok(Json(notes))
}

/// Add a new note
pub async fn create_note<S: Storage + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Extension(identity): Extension<SessionIdentity>,
    Form(form): Form<NoteForm>,
) -> Result<Response, AppError> {
    let (title, content) = validated(&form)?;

    state
        .storage
        .create_note(NoteRecord {
            id: Uuid::new_v4(),
            user: identity.id,
            title,
            content,
            date: Utc::now(),
        })
        .await?;

    counter!(NOTE_CREATED).increment(1);
    Ok(Redirect::to("/notes").into_response())
}

/// Update an existing note
pub async fn update_note<S: Storage + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Extension(identity): Extension<SessionIdentity>,
    Path(id): Path<Uuid>,
    Form(form): Form<NoteForm>,
) -> Result<Response, AppError> {
    let (title, content) = validated(&form)?;

    state
        .storage
        .update_note(identity.id, id, title, content)
        .await?
        .ok_or_else(|| AppError::NotFound("Note not found".to_string()))?;

    counter!(NOTE_UPDATED).increment(1);
    Ok(Redirect::to("/notes").into_response())
}

/// Delete a note
pub async fn remove_note<S: Storage + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Extension(identity): Extension<SessionIdentity>,
    Path(id): Path<Uuid>,
) -> Result<Response, AppError> {
    if !state.storage.delete_note(identity.id, id).await? {
        return Err(AppError::NotFound("Note not found".to_string()));
    }

    counter!(NOTE_DELETED).increment(1);
    Ok(Redirect::to("/notes").into_response())
}
