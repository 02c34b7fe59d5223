//! Download preparation.
//!
//! A record with an attachment is turned into either an open file handle
//! plus a header-safe filename, or `Unavailable`. A file that has gone
//! missing from disk is an expected steady-state condition (out-of-band
//! deletion, disk trouble) and must degrade, never raise.

use mp_core::models::ContentRecord;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use tokio::fs;

/// Characters left verbatim in the encoded filename. Everything else,
/// including space (-> %20, never "+") and "+" itself, is percent-encoded
/// so the value fits the `filename*=UTF-8''` grammar.
const FILENAME: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'.')
    .remove(b'-')
    .remove(b'_')
    .remove(b'*');

/// What a download request resolves to.
#[derive(Debug)]
pub enum DownloadOutcome {
    /// The record has no attachment, or the file at its locator cannot
    /// be opened. The record itself is still valid.
    Unavailable,
    Ready(DownloadFile),
}

/// An attachment ready to be streamed to the client.
#[derive(Debug)]
pub struct DownloadFile {
    /// Open handle; opening it is what proved the file readable.
    pub file: fs::File,
    pub size_bytes: u64,
    /// Percent-encoded original name for
    /// `Content-Disposition: attachment; filename*=UTF-8''<this>`.
    pub encoded_filename: String,
}

/// Resolve a record's attachment to a download, degrading to
/// `Unavailable` instead of erroring.
pub async fn prepare(record: &ContentRecord) -> DownloadOutcome {
    let Some(att) = &record.attachment else {
        return DownloadOutcome::Unavailable;
    };

    let file = match fs::File::open(&att.locator).await {
        Ok(file) => file,
        Err(e) => {
            log::debug!("attachment {} not deliverable: {e}", att.locator);
            return DownloadOutcome::Unavailable;
        }
    };

    let size_bytes = match file.metadata().await {
        Ok(meta) => meta.len(),
        Err(_) => att.size_bytes.max(0) as u64,
    };

    DownloadOutcome::Ready(DownloadFile {
        file,
        size_bytes,
        encoded_filename: encode_disposition_filename(&att.original_name),
    })
}

/// Percent-encode a user-supplied filename for the `filename*` parameter.
pub fn encode_disposition_filename(name: &str) -> String {
    utf8_percent_encode(name, FILENAME).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use mp_core::models::{Attachment, ContentKind, Timestamps};
    use uuid::Uuid;

    fn record_with(attachment: Option<Attachment>) -> ContentRecord {
        ContentRecord {
            id: Uuid::now_v7(),
            kind: ContentKind::Resource,
            owner_id: Uuid::now_v7(),
            title: "t".into(),
            body: "b".into(),
            view_count: 0,
            attachment,
            revision: 0,
            timestamps: Timestamps::now(),
        }
    }

    #[test]
    fn spaces_become_percent_twenty() {
        assert_eq!(
            encode_disposition_filename("annual report 2025.pdf"),
            "annual%20report%202025.pdf"
        );
    }

    #[test]
    fn unreserved_characters_survive() {
        assert_eq!(
            encode_disposition_filename("a-b_c.d*e.txt"),
            "a-b_c.d*e.txt"
        );
    }

    #[test]
    fn plus_is_encoded_not_mistaken_for_space() {
        assert_eq!(encode_disposition_filename("a+b.txt"), "a%2Bb.txt");
    }

    #[test]
    fn multibyte_names_encode_as_utf8_octets() {
        assert_eq!(
            encode_disposition_filename("보고서.pdf"),
            "%EB%B3%B4%EA%B3%A0%EC%84%9C.pdf"
        );
    }

    #[tokio::test]
    async fn no_attachment_is_unavailable() {
        match prepare(&record_with(None)).await {
            DownloadOutcome::Unavailable => {}
            DownloadOutcome::Ready(_) => panic!("expected unavailable"),
        }
    }

    #[tokio::test]
    async fn missing_file_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let gone = dir.path().join("vanished.pdf");
        let rec = record_with(Some(Attachment {
            locator: gone.to_string_lossy().into_owned(),
            original_name: "vanished.pdf".into(),
            size_bytes: 10,
        }));

        match prepare(&rec).await {
            DownloadOutcome::Unavailable => {}
            DownloadOutcome::Ready(_) => panic!("expected unavailable"),
        }
    }

    #[tokio::test]
    async fn present_file_is_ready_with_encoded_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stored-file");
        std::fs::write(&path, b"attachment bytes").unwrap();

        let rec = record_with(Some(Attachment {
            locator: path.to_string_lossy().into_owned(),
            original_name: "제품 안내.pdf".into(),
            size_bytes: 16,
        }));

        match prepare(&rec).await {
            DownloadOutcome::Ready(dl) => {
                assert_eq!(dl.size_bytes, 16);
                assert_eq!(
                    dl.encoded_filename,
                    "%EC%A0%9C%ED%92%88%20%EC%95%88%EB%82%B4.pdf"
                );
            }
            DownloadOutcome::Unavailable => panic!("expected ready"),
        }
    }
}
