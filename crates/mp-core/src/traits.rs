//! # Core Traits (Ports)
//!
//! Any plugin must implement these traits to be used by the binary.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;
use crate::models::{
    ContentKind, ContentRecord, ContentSummary, FileUpload, Member, NewContentRecord, StoredFile,
};

/// Data persistence contract for content records.
///
/// Every mutating method is a single atomic unit of work: a concurrent
/// reader never observes a record with some fields updated and others
/// not.
#[async_trait]
pub trait ContentRepo: Send + Sync {
    /// Persist a new record, assigning identity and timestamps.
    /// Returns the new id.
    async fn insert(&self, new: NewContentRecord) -> Result<Uuid>;

    async fn find(&self, id: Uuid) -> Result<Option<ContentRecord>>;

    /// Lookup that eagerly loads the owning member, avoiding a second
    /// round trip for display purposes.
    async fn find_with_owner(&self, id: Uuid) -> Result<Option<(ContentRecord, Member)>>;

    /// Increment the view counter and return the fresh record with its
    /// owner, as one atomic unit. An increment is never lost and never
    /// double-applied.
    async fn fetch_incrementing_view(&self, id: Uuid) -> Result<Option<(ContentRecord, Member)>>;

    /// Write back title, body and the attachment triple together.
    /// Guarded by the record's revision: a stale revision yields
    /// `AppError::Conflict`, a vanished row `AppError::NotFound`.
    async fn update(&self, record: &ContentRecord) -> Result<()>;

    /// Remove the row. Returns `false` when it was already gone.
    async fn delete(&self, id: Uuid) -> Result<bool>;

    /// Newest-first page of summaries for one content kind.
    async fn list_page(
        &self,
        kind: ContentKind,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<ContentSummary>>;
}

/// Outcome of a best-effort file deletion. Deliberately not a `Result`:
/// deletion failure must never abort a content mutation, but callers
/// still get to see (and log) that a cleanup step failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// The file was removed
    Removed,
    /// There was nothing to remove (idempotent delete)
    Missing,
    /// An I/O error other than absence occurred
    Failed,
}

/// File persistence contract for attachments.
#[async_trait]
pub trait FileStore: Send + Sync {
    /// Store the upload under `sub_dir`, using a collision-free storage
    /// name that is independent of the user-supplied original name.
    /// Returns the attachment triple. Partial writes must not be
    /// assumed visible after a failure.
    async fn save(&self, upload: FileUpload, sub_dir: &str) -> Result<StoredFile>;

    /// Best-effort removal of a previously stored file.
    async fn delete(&self, locator: &str) -> DeleteOutcome;
}
