//! member-portal/crates/mp-core/src/lib.rs
//!
//! The central domain logic and interface definitions for the member
//! portal's content subsystem.

pub mod error;
pub mod models;
pub mod traits;
pub mod util;

// Re-exporting for easier access in other crates
pub use error::*;
pub use models::*;
pub use traits::*;

#[cfg(test)]
mod tests {
    use super::models::*;
    use uuid::Uuid;

    fn record() -> ContentRecord {
        ContentRecord {
            id: Uuid::now_v7(),
            kind: ContentKind::Post,
            owner_id: Uuid::now_v7(),
            title: "Hello".to_string(),
            body: "First post".to_string(),
            view_count: 0,
            attachment: None,
            revision: 0,
            timestamps: Timestamps::now(),
        }
    }

    #[test]
    fn attachment_is_all_or_nothing() {
        let mut rec = record();
        assert!(!rec.has_attachment());

        rec.set_attachment(StoredFile {
            locator: "/uploads/board/x.pdf".into(),
            original_name: "report.pdf".into(),
            size_bytes: 42,
        });
        let att = rec.attachment.as_ref().expect("attachment set");
        assert_eq!(att.original_name, "report.pdf");
        assert_eq!(att.size_bytes, 42);

        let taken = rec.take_attachment().expect("attachment taken");
        assert_eq!(taken.locator, "/uploads/board/x.pdf");
        assert!(rec.attachment.is_none());
        assert!(rec.take_attachment().is_none());
    }

    #[test]
    fn ownership_checks_current_owner() {
        let rec = record();
        assert!(rec.is_owner(rec.owner_id));
        assert!(!rec.is_owner(Uuid::now_v7()));
    }

    #[test]
    fn draft_validation_bounds() {
        assert!(ContentDraft::new("title", "body").validate().is_ok());
        assert!(ContentDraft::new("  ", "body").validate().is_err());
        assert!(ContentDraft::new("title", "").validate().is_err());

        let at_limit = "가".repeat(MAX_TITLE_LEN);
        assert!(ContentDraft::new(at_limit, "body").validate().is_ok());
        let over_limit = "가".repeat(MAX_TITLE_LEN + 1);
        assert!(ContentDraft::new(over_limit, "body").validate().is_err());
    }

    #[test]
    fn kind_round_trips_through_str() {
        for kind in [ContentKind::Post, ContentKind::Resource] {
            assert_eq!(ContentKind::from_str(kind.as_str()), Some(kind));
        }
        assert_eq!(ContentKind::from_str("notice"), None);
    }
}
