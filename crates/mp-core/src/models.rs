//! # Domain Models
//!
//! These structs represent the core entities of the member portal.
//! We use UUID v7 for time-ordered, globally unique identification.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, Result};

/// Maximum title length in code points.
pub const MAX_TITLE_LEN: usize = 200;

/// Which content family a record belongs to. The kind selects the
/// storage subdirectory its attachment is filed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    /// Discussion-board post
    Post,
    /// Downloadable-resource library item
    Resource,
}

impl ContentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentKind::Post => "post",
            ContentKind::Resource => "resource",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "post" => Some(ContentKind::Post),
            "resource" => Some(ContentKind::Resource),
            _ => None,
        }
    }

    /// Subdirectory of the upload root this kind stores files under.
    pub fn sub_dir(&self) -> &'static str {
        match self {
            ContentKind::Post => "board",
            ContentKind::Resource => "resource",
        }
    }
}

/// Created/updated instants shared by every record type. Each record
/// embeds its own copy; the persistence boundary fills them in on
/// insert and update, application logic never touches them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timestamps {
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Timestamps {
    pub fn now() -> Self {
        let now = Utc::now();
        Self {
            created_at: now,
            updated_at: now,
        }
    }
}

/// The attachment triple. A record either has all three fields or none,
/// which the `Option<Attachment>` on [`ContentRecord`] encodes directly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    /// Opaque storage locator. Produced only by a `FileStore`, never
    /// constructed or guessed by the service layer.
    pub locator: String,
    /// User-supplied display name. Untrusted; used for the download
    /// header only, never for path construction.
    pub original_name: String,
    pub size_bytes: i64,
}

/// A stored file as reported back by `FileStore::save`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    pub locator: String,
    pub original_name: String,
    pub size_bytes: i64,
}

impl From<StoredFile> for Attachment {
    fn from(f: StoredFile) -> Self {
        Attachment {
            locator: f.locator,
            original_name: f.original_name,
            size_bytes: f.size_bytes,
        }
    }
}

/// An uploaded file as received from the transport layer.
#[derive(Debug, Clone)]
pub struct FileUpload {
    pub original_name: String,
    pub bytes: Vec<u8>,
}

/// What an update wants done with the record's attachment.
#[derive(Debug, Clone)]
pub enum AttachmentChange {
    /// Keep whatever is there
    NoChange,
    /// Store this file, replacing the current attachment if any
    Replace(FileUpload),
    /// Drop the current attachment without storing a new one
    Remove,
}

/// The persisted unit: a board post or a resource-library item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentRecord {
    pub id: Uuid,
    pub kind: ContentKind,
    /// Identity of the creating member. Immutable after creation;
    /// authorization always evaluates against this field.
    pub owner_id: Uuid,
    pub title: String,
    pub body: String,
    pub view_count: i64,
    pub attachment: Option<Attachment>,
    /// Optimistic-concurrency token, bumped by the persistence boundary
    /// on every committed update.
    pub revision: i64,
    pub timestamps: Timestamps,
}

impl ContentRecord {
    pub fn is_owner(&self, member_id: Uuid) -> bool {
        self.owner_id == member_id
    }

    pub fn has_attachment(&self) -> bool {
        self.attachment.is_some()
    }

    /// Replace title and body with the (already validated) draft.
    pub fn apply_draft(&mut self, draft: ContentDraft) {
        self.title = draft.title;
        self.body = draft.body;
    }

    pub fn set_attachment(&mut self, stored: StoredFile) {
        self.attachment = Some(stored.into());
    }

    /// Clear the attachment, handing the old triple back to the caller
    /// so its file can be released.
    pub fn take_attachment(&mut self) -> Option<Attachment> {
        self.attachment.take()
    }
}

/// A record about to be persisted for the first time. Identity and
/// timestamps are assigned by the repository.
#[derive(Debug, Clone)]
pub struct NewContentRecord {
    pub kind: ContentKind,
    pub owner_id: Uuid,
    pub title: String,
    pub body: String,
    pub attachment: Option<Attachment>,
}

/// Title and body as submitted by the member.
#[derive(Debug, Clone, Deserialize)]
pub struct ContentDraft {
    pub title: String,
    pub body: String,
}

impl ContentDraft {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(AppError::Validation("title must not be empty".into()));
        }
        if self.title.chars().count() > MAX_TITLE_LEN {
            return Err(AppError::Validation(format!(
                "title must be at most {MAX_TITLE_LEN} characters"
            )));
        }
        if self.body.trim().is_empty() {
            return Err(AppError::Validation("body must not be empty".into()));
        }
        Ok(())
    }
}

/// The owner reference eager-loading queries resolve alongside a record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Member {
    pub id: Uuid,
    pub name: String,
}

/// One row of a paged listing.
#[derive(Debug, Clone, Serialize)]
pub struct ContentSummary {
    pub id: Uuid,
    pub title: String,
    pub author_name: String,
    pub view_count: i64,
    pub has_attachment: bool,
    pub created_at: DateTime<Utc>,
}
