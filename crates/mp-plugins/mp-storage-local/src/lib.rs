//! # mp-storage-local
//! member-portal/crates/mp-plugins/mp-storage-local/src/lib.rs
//! Local filesystem implementation of `FileStore`.
//!
//! Storage names are freshly generated UUIDs, so two uploads can never
//! collide and a hostile original filename can never steer the write
//! path. The original name survives only as display metadata.

use async_trait::async_trait;
use mp_core::error::{AppError, Result};
use mp_core::models::{FileUpload, StoredFile};
use mp_core::traits::{DeleteOutcome, FileStore};
use std::io::ErrorKind;
use std::path::PathBuf;
use tokio::fs;
use uuid::Uuid;

pub struct LocalFileStore {
    /// Root directory for all uploads (e.g., "./data/uploads")
    root: PathBuf,
}

impl LocalFileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Generates the storage name: a UUID v4 stem plus the original
    /// extension, kept only when it is purely alphanumeric. Everything
    /// else about the user-supplied name is discarded.
    fn storage_name(original_name: &str) -> String {
        match safe_extension(original_name) {
            Some(ext) => format!("{}.{}", Uuid::new_v4(), ext),
            None => Uuid::new_v4().to_string(),
        }
    }
}

/// Extension of `name`, if it has one that is safe to keep:
/// 1 to 16 ASCII alphanumeric characters after the last dot.
fn safe_extension(name: &str) -> Option<&str> {
    let (stem, ext) = name.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() || ext.len() > 16 {
        return None;
    }
    ext.chars()
        .all(|c| c.is_ascii_alphanumeric())
        .then_some(ext)
}

fn storage_err(context: &str, err: std::io::Error) -> AppError {
    AppError::Storage(format!("{context}: {err}"))
}

#[async_trait]
impl FileStore for LocalFileStore {
    async fn save(&self, upload: FileUpload, sub_dir: &str) -> Result<StoredFile> {
        // 1. Ensure the target directory exists
        let dir = self.root.join(sub_dir);
        fs::create_dir_all(&dir)
            .await
            .map_err(|e| storage_err("could not create upload directory", e))?;

        // 2. Resolve to an absolute, normalized directory so the stored
        //    locator does not depend on the process working directory
        let dir = fs::canonicalize(&dir)
            .await
            .map_err(|e| storage_err("could not resolve upload directory", e))?;

        // 3. Write under a generated name
        let path = dir.join(Self::storage_name(&upload.original_name));
        if let Err(e) = fs::write(&path, &upload.bytes).await {
            // A torn write leaves nothing behind
            let _ = fs::remove_file(&path).await;
            return Err(storage_err("could not write upload", e));
        }

        Ok(StoredFile {
            locator: path.to_string_lossy().into_owned(),
            original_name: upload.original_name,
            size_bytes: upload.bytes.len() as i64,
        })
    }

    async fn delete(&self, locator: &str) -> DeleteOutcome {
        match fs::remove_file(locator).await {
            Ok(()) => DeleteOutcome::Removed,
            Err(e) if e.kind() == ErrorKind::NotFound => DeleteOutcome::Missing,
            Err(e) => {
                log::warn!("failed to delete stored file {locator}: {e}");
                DeleteOutcome::Failed
            }
        }
    }
}
