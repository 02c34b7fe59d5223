//! Read models handed back to the presentation layer.

use chrono::{DateTime, Utc};
use mp_core::models::{ContentKind, ContentRecord, Member};
use mp_core::util::format_file_size;
use serde::Serialize;
use uuid::Uuid;

/// Detail view of a content record with its author resolved.
///
/// The attachment locator stays server-side on purpose; clients get the
/// display name and size and fetch the bytes through the download
/// endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct ContentView {
    pub id: Uuid,
    pub kind: ContentKind,
    pub title: String,
    pub body: String,
    pub author_id: Uuid,
    pub author_name: String,
    pub view_count: i64,
    pub has_attachment: bool,
    pub attachment_name: Option<String>,
    pub attachment_size: Option<i64>,
    pub formatted_size: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ContentView {
    pub fn from_parts(record: ContentRecord, author: Member) -> Self {
        let (attachment_name, attachment_size) = match &record.attachment {
            Some(att) => (Some(att.original_name.clone()), Some(att.size_bytes)),
            None => (None, None),
        };
        Self {
            id: record.id,
            kind: record.kind,
            title: record.title,
            body: record.body,
            author_id: author.id,
            author_name: author.name,
            view_count: record.view_count,
            has_attachment: attachment_name.is_some(),
            attachment_name,
            formatted_size: format_file_size(attachment_size),
            attachment_size,
            created_at: record.timestamps.created_at,
            updated_at: record.timestamps.updated_at,
        }
    }
}
