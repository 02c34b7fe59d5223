//! # ContentService
//!
//! Orchestrates the content lifecycle against the persistence and file
//! storage ports: authorization first, file work second, one atomic
//! record write last. The ordering rules here are what keep storage free
//! of orphaned files.

use std::sync::Arc;

use mp_core::error::{AppError, Result};
use mp_core::models::{
    AttachmentChange, ContentDraft, ContentKind, ContentSummary, FileUpload, NewContentRecord,
};
use mp_core::traits::{ContentRepo, DeleteOutcome, FileStore};
use uuid::Uuid;

use crate::authz::{self, Principal};
use crate::download::{self, DownloadOutcome};
use crate::view::ContentView;

/// Page size for listings.
const PAGE_SIZE: i64 = 10;

#[derive(Clone)]
pub struct ContentService {
    repo: Arc<dyn ContentRepo>,
    files: Arc<dyn FileStore>,
}

impl ContentService {
    pub fn new(repo: Arc<dyn ContentRepo>, files: Arc<dyn FileStore>) -> Self {
        Self { repo, files }
    }

    /// Create a record, optionally with an attachment.
    ///
    /// The file is stored first; only a successful save produces a
    /// record carrying the triple. A failed save creates nothing.
    pub async fn create(
        &self,
        principal: &Principal,
        kind: ContentKind,
        draft: ContentDraft,
        file: Option<FileUpload>,
    ) -> Result<Uuid> {
        draft.validate()?;

        let stored = match file {
            Some(upload) => Some(self.files.save(upload, kind.sub_dir()).await?),
            None => None,
        };
        let new_locator = stored.as_ref().map(|s| s.locator.clone());

        let new = NewContentRecord {
            kind,
            owner_id: principal.id,
            title: draft.title,
            body: draft.body,
            attachment: stored.map(Into::into),
        };

        match self.repo.insert(new).await {
            Ok(id) => Ok(id),
            Err(e) => {
                // The record never materialized; release the file so the
                // failed create leaves storage untouched
                if let Some(locator) = new_locator {
                    self.release_file(&locator).await;
                }
                Err(e)
            }
        }
    }

    /// Edit a record's text and attachment.
    ///
    /// Flow:
    /// 1. Load the record (`NotFound` when the id does not resolve)
    /// 2. Ownership check (`Unauthorized` for everyone but the author)
    /// 3. Apply the attachment intent:
    ///    - `Remove`: release the current file, clear the triple
    ///    - `Replace`: release the current file, then store the new one
    ///    - `NoChange`: leave the triple alone
    /// 4. Apply title/body and persist everything in one revision-guarded
    ///    write
    pub async fn update(
        &self,
        id: Uuid,
        principal: &Principal,
        draft: ContentDraft,
        change: AttachmentChange,
    ) -> Result<()> {
        draft.validate()?;

        let mut record = self
            .repo
            .find(id)
            .await?
            .ok_or_else(|| AppError::not_found("content", id))?;

        if !authz::can_edit(principal, &record) {
            return Err(AppError::Unauthorized(
                "only the author may edit this content".into(),
            ));
        }

        let mut newly_stored: Option<String> = None;
        match change {
            AttachmentChange::NoChange => {}
            AttachmentChange::Remove => {
                if let Some(old) = record.take_attachment() {
                    self.release_file(&old.locator).await;
                }
            }
            AttachmentChange::Replace(upload) => {
                if let Some(old) = record.take_attachment() {
                    self.release_file(&old.locator).await;
                }
                let stored = self.files.save(upload, record.kind.sub_dir()).await?;
                newly_stored = Some(stored.locator.clone());
                record.set_attachment(stored);
            }
        }

        record.apply_draft(draft);

        if let Err(e) = self.repo.update(&record).await {
            // The write did not commit; a replacement file stored above
            // would be an orphan, so release it before reporting
            if let Some(locator) = newly_stored {
                self.release_file(&locator).await;
            }
            return Err(e);
        }
        Ok(())
    }

    /// Remove a record and its attachment file.
    ///
    /// Deletion is the one operation where administrators override
    /// ownership. The file removal is best-effort and precedes the row
    /// removal; a second concurrent delete observes `NotFound`.
    pub async fn delete(&self, id: Uuid, principal: &Principal) -> Result<()> {
        let record = self
            .repo
            .find(id)
            .await?
            .ok_or_else(|| AppError::not_found("content", id))?;

        if !authz::can_delete(principal, &record) {
            return Err(AppError::Unauthorized(
                "only the author or an administrator may delete this content".into(),
            ));
        }

        if let Some(att) = &record.attachment {
            self.release_file(&att.locator).await;
        }

        if !self.repo.delete(id).await? {
            return Err(AppError::not_found("content", id));
        }
        Ok(())
    }

    /// Fetch a record for display.
    ///
    /// `increment` distinguishes a public page view (counted) from an
    /// internal lookup such as the pre-edit form (not counted). The
    /// counted variant reads and increments as one atomic unit at the
    /// persistence boundary.
    pub async fn view(&self, id: Uuid, increment: bool) -> Result<ContentView> {
        let found = if increment {
            self.repo.fetch_incrementing_view(id).await?
        } else {
            self.repo.find_with_owner(id).await?
        };
        let (record, owner) = found.ok_or_else(|| AppError::not_found("content", id))?;
        Ok(ContentView::from_parts(record, owner))
    }

    /// Newest-first listing page for one content kind.
    pub async fn list(&self, kind: ContentKind, page: i64) -> Result<Vec<ContentSummary>> {
        let page = page.max(0);
        self.repo.list_page(kind, PAGE_SIZE, page * PAGE_SIZE).await
    }

    /// Resolve a record's attachment for download. `NotFound` only when
    /// the record id itself does not resolve; every file-level problem
    /// degrades to `DownloadOutcome::Unavailable`.
    pub async fn prepare_download(&self, id: Uuid) -> Result<DownloadOutcome> {
        let (record, _owner) = self
            .repo
            .find_with_owner(id)
            .await?
            .ok_or_else(|| AppError::not_found("content", id))?;
        Ok(download::prepare(&record).await)
    }

    /// Best-effort file removal. The mutation that triggered the cleanup
    /// has already been decided, so a failure here is logged and
    /// swallowed rather than surfaced.
    async fn release_file(&self, locator: &str) {
        if self.files.delete(locator).await == DeleteOutcome::Failed {
            log::warn!("cleanup of stored file {locator} failed; file may linger");
        }
    }
}
