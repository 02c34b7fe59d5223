//! Multipart form handling for create/update submissions.

use actix_multipart::{Field, Multipart};
use actix_web::error::ErrorBadRequest;
use futures_util::TryStreamExt;
use mp_core::models::{AttachmentChange, ContentDraft, FileUpload};

/// Uploads beyond this size are rejected before they reach storage.
const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// The fields a content form submits. The legacy `delete_attachment`
/// checkbox arrives separately from the file input; `into_parts`
/// collapses the combination into one attachment intent.
pub struct ContentForm {
    pub title: String,
    pub body: String,
    pub file: Option<FileUpload>,
    pub delete_attachment: bool,
}

impl ContentForm {
    pub fn into_parts(self) -> (ContentDraft, AttachmentChange) {
        let change = match (self.file, self.delete_attachment) {
            // A new file wins: removal of the old one is part of the
            // replacement either way
            (Some(upload), _) => AttachmentChange::Replace(upload),
            (None, true) => AttachmentChange::Remove,
            (None, false) => AttachmentChange::NoChange,
        };
        (ContentDraft::new(self.title, self.body), change)
    }
}

/// Reads the whole multipart payload into a [`ContentForm`].
pub async fn read_content_form(mut payload: Multipart) -> actix_web::Result<ContentForm> {
    let mut form = ContentForm {
        title: String::new(),
        body: String::new(),
        file: None,
        delete_attachment: false,
    };

    while let Some(mut field) = payload.try_next().await? {
        let name = field
            .content_disposition()
            .get_name()
            .unwrap_or_default()
            .to_string();
        match name.as_str() {
            "title" => form.title = read_text(&mut field).await?,
            "body" => form.body = read_text(&mut field).await?,
            "delete_attachment" => {
                let v = read_text(&mut field).await?;
                form.delete_attachment = v == "1" || v.eq_ignore_ascii_case("true") || v == "on";
            }
            "file" => {
                let original_name = field
                    .content_disposition()
                    .get_filename()
                    .unwrap_or_default()
                    .to_string();
                let bytes = read_bytes(&mut field).await?;
                // Browsers submit an empty file part when nothing was
                // picked; that is "no file", not an empty attachment
                if !original_name.is_empty() && !bytes.is_empty() {
                    form.file = Some(FileUpload {
                        original_name,
                        bytes,
                    });
                }
            }
            _ => {
                // Drain unknown fields so the stream can advance
                read_bytes(&mut field).await?;
            }
        }
    }

    Ok(form)
}

async fn read_bytes(field: &mut Field) -> actix_web::Result<Vec<u8>> {
    let mut out = Vec::new();
    while let Some(chunk) = field.try_next().await? {
        if out.len() + chunk.len() > MAX_UPLOAD_BYTES {
            return Err(ErrorBadRequest("upload too large"));
        }
        out.extend_from_slice(&chunk);
    }
    Ok(out)
}

async fn read_text(field: &mut Field) -> actix_web::Result<String> {
    let bytes = read_bytes(field).await?;
    String::from_utf8(bytes).map_err(|_| ErrorBadRequest("form field is not valid UTF-8"))
}
