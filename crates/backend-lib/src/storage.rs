// ============================
// crates/backend-lib/src/storage.rs
// ============================
//! Storage abstraction with flat-file implementation.
use std::{fs, path::{Path, PathBuf}};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::fs as tokio_fs;
use uuid::Uuid;

use crate::error::AppError;
use noteapp_common::{CredentialRecord, NoteRecord};

/// Trait for storage backends.
///
/// Username uniqueness is enforced here, not by the callers: `create_user`
/// must fail with [`AppError::UsernameTaken`] when the normalized username is
/// already linked, including when two registrations race.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Look up a credential record by its normalized username
    async fn find_user_by_username(
        &self,
        username: &str,
    ) -> Result<Option<CredentialRecord>, AppError>;

    /// Look up a credential record by id
    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<CredentialRecord>, AppError>;

    /// Persist a new credential record
    async fn create_user(&self, record: CredentialRecord) -> Result<CredentialRecord, AppError>;

    /// Stamp the last successful login time
    async fn touch_last_login(&self, id: Uuid, when: DateTime<Utc>) -> Result<(), AppError>;

    /// Delete a user; returns whether a record existed
    async fn delete_user(&self, id: Uuid) -> Result<bool, AppError>;

    /// All notes owned by a user, newest first
    async fn list_notes(&self, user: Uuid) -> Result<Vec<NoteRecord>, AppError>;

    /// Persist a new note
    async fn create_note(&self, note: NoteRecord) -> Result<NoteRecord, AppError>;

    /// A single note, if it exists and is owned by `user`
    async fn find_note(&self, user: Uuid, id: Uuid) -> Result<Option<NoteRecord>, AppError>;

    /// Replace a note's title and content; `None` if absent or foreign
    async fn update_note(
        &self,
        user: Uuid,
        id: Uuid,
        title: String,
        content: String,
    ) -> Result<Option<NoteRecord>, AppError>;

    /// Delete a note; returns whether an owned record existed
    async fn delete_note(&self, user: Uuid, id: Uuid) -> Result<bool, AppError>;

    /// Delete every note owned by a user
    async fn delete_notes_for_user(&self, user: Uuid) -> Result<(), AppError>;
}

/// Flat-file implementation of the Storage trait.
///
/// Layout under the root:
///   users/<id>.json          credential records
///   users/by-name/<username> link file holding the owning id
///   notes/<id>.json          note records
///
/// The by-name link is created with `create_new`, so the filesystem is the
/// arbiter of username uniqueness.
#[derive(Clone)]
pub struct FlatFileStorage {
    root: PathBuf,
}

impl FlatFileStorage {
    pub fn new<P: AsRef<Path>>(root: P) -> anyhow::Result<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(root.join("users").join("by-name"))?;
        fs::create_dir_all(root.join("notes"))?;
        Ok(Self { root })
    }

    fn user_path(&self, id: Uuid) -> PathBuf {
        self.root.join("users").join(format!("{id}.json"))
    }

    fn link_path(&self, username: &str) -> PathBuf {
        self.root.join("users").join("by-name").join(username)
    }

    fn note_path(&self, id: Uuid) -> PathBuf {
        self.root.join("notes").join(format!("{id}.json"))
    }

    async fn read_user(&self, path: &Path) -> Result<Option<CredentialRecord>, AppError> {
        if !path.exists() {
            return Ok(None);
        }
        let content = tokio_fs::read_to_string(path).await?;
        Ok(Some(serde_json::from_str(&content)?))
    }

    async fn write_user(&self, record: &CredentialRecord) -> Result<(), AppError> {
        let json = serde_json::to_string_pretty(record)?;
        tokio_fs::write(self.user_path(record.id), json).await?;
        Ok(())
    }
}

#[async_trait]
impl Storage for FlatFileStorage {
    async fn find_user_by_username(
        &self,
        username: &str,
    ) -> Result<Option<CredentialRecord>, AppError> {
        let link = self.link_path(username);
        if !link.exists() {
            return Ok(None);
        }
        let id: Uuid = tokio_fs::read_to_string(&link)
            .await?
            .trim()
            .parse()
            .map_err(|_| AppError::Internal(format!("corrupt username link for {username}")))?;
        self.read_user(&self.user_path(id)).await
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<CredentialRecord>, AppError> {
        self.read_user(&self.user_path(id)).await
    }

    async fn create_user(&self, record: CredentialRecord) -> Result<CredentialRecord, AppError> {
        // The link file is the uniqueness arbiter: create_new fails for the
        // loser of a duplicate-registration race.
        let link = self.link_path(&record.username);
        let mut open = tokio_fs::OpenOptions::new();
        open.write(true).create_new(true);
        match open.open(&link).await {
            Ok(_) => {},
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                return Err(AppError::UsernameTaken);
            },
            Err(e) => return Err(e.into()),
        }
        tokio_fs::write(&link, record.id.to_string()).await?;

        if let Err(e) = self.write_user(&record).await {
            // Roll the link back so the name is not left claimed by a
            // record that was never written.
            let _ = tokio_fs::remove_file(&link).await;
            return Err(e);
        }

        Ok(record)
    }

    async fn touch_last_login(&self, id: Uuid, when: DateTime<Utc>) -> Result<(), AppError> {
        let Some(mut record) = self.find_user_by_id(id).await? else {
            return Err(AppError::NotFound(format!("user {id}")));
        };
        record.last_login_at = Some(when);
        self.write_user(&record).await
    }

    async fn delete_user(&self, id: Uuid) -> Result<bool, AppError> {
        let Some(record) = self.find_user_by_id(id).await? else {
            return Ok(false);
        };
        tokio_fs::remove_file(self.user_path(id)).await?;
        let _ = tokio_fs::remove_file(self.link_path(&record.username)).await;
        Ok(true)
    }

    async fn list_notes(&self, user: Uuid) -> Result<Vec<NoteRecord>, AppError> {
        let mut notes = Vec::new();
        let mut entries = tokio_fs::read_dir(self.root.join("notes")).await?;
        while let Some(entry) = entries.next_entry().await? {
            let content = tokio_fs::read_to_string(entry.path()).await?;
            let note: NoteRecord = serde_json::from_str(&content)?;
            if note.user == user {
                notes.push(note);
            }
        }
        notes.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(notes)
    }

    async fn create_note(&self, note: NoteRecord) -> Result<NoteRecord, AppError> {
        let json = serde_json::to_string_pretty(&note)?;
        tokio_fs::write(self.note_path(note.id), json).await?;
        Ok(note)
    }

    async fn find_note(&self, user: Uuid, id: Uuid) -> Result<Option<NoteRecord>, AppError> {
        let path = self.note_path(id);
        if !path.exists() {
            return Ok(None);
        }
        let content = tokio_fs::read_to_string(&path).await?;
        let note: NoteRecord = serde_json::from_str(&content)?;
        Ok((note.user == user).then_some(note))
    }

    async fn update_note(
        &self,
        user: Uuid,
        id: Uuid,
        title: String,
        content: String,
    ) -> Result<Option<NoteRecord>, AppError> {
        let Some(mut note) = self.find_note(user, id).await? else {
            return Ok(None);
        };
        note.title = title;
        note.content = content;
        let json = serde_json::to_string_pretty(&note)?;
        tokio_fs::write(self.note_path(id), json).await?;
        Ok(Some(note))
    }

    async fn delete_note(&self, user: Uuid, id: Uuid) -> Result<bool, AppError> {
        if self.find_note(user, id).await?.is_none() {
            return Ok(false);
        }
        tokio_fs::remove_file(self.note_path(id)).await?;
        Ok(true)
    }

    async fn delete_notes_for_user(&self, user: Uuid) -> Result<(), AppError> {
        for note in self.list_notes(user).await? {
            tokio_fs::remove_file(self.note_path(note.id)).await?;
        }
        Ok(())
    }
}
