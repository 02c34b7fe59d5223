//! # mp-db-sqlite Implementation
//!
//! This module implements the data mapping between the SQLite relational
//! model and the `mp-core` domain models.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mp_core::error::{AppError, Result};
use mp_core::models::{
    Attachment, ContentKind, ContentRecord, ContentSummary, Member, NewContentRecord, Timestamps,
};
use mp_core::traits::ContentRepo;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use std::str::FromStr;
use uuid::Uuid;

/// Schema applied at startup. The CHECK keeps the attachment triple
/// all-or-nothing even if a future writer bypasses the domain types.
const SCHEMA: [&str; 3] = [
    "
CREATE TABLE IF NOT EXISTS members (
    id      BLOB PRIMARY KEY,
    name    TEXT NOT NULL
)",
    "
CREATE TABLE IF NOT EXISTS contents (
    id                  BLOB PRIMARY KEY,
    kind                TEXT NOT NULL,
    owner_id            BLOB NOT NULL REFERENCES members(id),
    title               TEXT NOT NULL,
    body                TEXT NOT NULL,
    view_count          INTEGER NOT NULL DEFAULT 0,
    attachment_locator  TEXT,
    attachment_name     TEXT,
    attachment_size     INTEGER,
    revision            INTEGER NOT NULL DEFAULT 0,
    created_at          TEXT NOT NULL,
    updated_at          TEXT NOT NULL,
    CHECK (
        (attachment_locator IS NULL AND attachment_name IS NULL AND attachment_size IS NULL)
        OR
        (attachment_locator IS NOT NULL AND attachment_name IS NOT NULL AND attachment_size IS NOT NULL)
    )
)",
    "
CREATE INDEX IF NOT EXISTS idx_contents_kind_created
    ON contents(kind, created_at DESC)",
];

pub struct SqliteContentRepo {
    pool: SqlitePool,
}

// Helpers for UUID conversion
fn uuid_to_blob(id: Uuid) -> Vec<u8> {
    id.as_bytes().to_vec()
}

fn blob_to_uuid(blob: &[u8]) -> Uuid {
    Uuid::from_slice(blob).unwrap_or_default()
}

fn db_err(e: sqlx::Error) -> AppError {
    AppError::Internal(format!("database error: {e}"))
}

impl SqliteContentRepo {
    /// Connects, creating the database file and schema when missing.
    pub async fn new(url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)
            .map_err(db_err)?
            .create_if_missing(true);

        // An in-memory database exists per connection; a larger pool
        // would hand each caller a different empty database.
        let max_connections = if url.contains(":memory:") { 1 } else { 5 };
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await
            .map_err(db_err)?;

        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&pool)
                .await
                .map_err(db_err)?;
        }
        Ok(Self { pool })
    }

    /// Insert or update a member row. Member accounts are managed by
    /// the (external) membership subsystem; this exists for wiring and
    /// tests.
    pub async fn upsert_member(&self, member: &Member) -> Result<()> {
        sqlx::query("INSERT INTO members (id, name) VALUES (?, ?) ON CONFLICT(id) DO UPDATE SET name = excluded.name")
            .bind(uuid_to_blob(member.id))
            .bind(&member.name)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(())
    }
}

fn record_from_row(row: &SqliteRow) -> ContentRecord {
    let kind = ContentKind::from_str(&row.get::<String, _>("kind")).unwrap_or(ContentKind::Post);
    let attachment = row
        .get::<Option<String>, _>("attachment_locator")
        .map(|locator| Attachment {
            locator,
            original_name: row.get("attachment_name"),
            size_bytes: row.get("attachment_size"),
        });
    ContentRecord {
        id: blob_to_uuid(row.get::<Vec<u8>, _>("id").as_slice()),
        kind,
        owner_id: blob_to_uuid(row.get::<Vec<u8>, _>("owner_id").as_slice()),
        title: row.get("title"),
        body: row.get("body"),
        view_count: row.get("view_count"),
        attachment,
        revision: row.get("revision"),
        timestamps: Timestamps {
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        },
    }
}

fn record_with_owner_from_row(row: &SqliteRow) -> (ContentRecord, Member) {
    let member = Member {
        id: blob_to_uuid(row.get::<Vec<u8>, _>("member_id").as_slice()),
        name: row.get("member_name"),
    };
    (record_from_row(row), member)
}

const SELECT_WITH_OWNER: &str = "
SELECT c.*, m.id AS member_id, m.name AS member_name
FROM contents c JOIN members m ON m.id = c.owner_id
WHERE c.id = ?";

#[async_trait]
impl ContentRepo for SqliteContentRepo {
    async fn insert(&self, new: NewContentRecord) -> Result<Uuid> {
        let id = Uuid::now_v7();
        let now: DateTime<Utc> = Utc::now();
        let (locator, name, size) = match &new.attachment {
            Some(att) => (
                Some(att.locator.as_str()),
                Some(att.original_name.as_str()),
                Some(att.size_bytes),
            ),
            None => (None, None, None),
        };

        sqlx::query(
            "INSERT INTO contents
             (id, kind, owner_id, title, body, view_count,
              attachment_locator, attachment_name, attachment_size,
              revision, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, 0, ?, ?, ?, 0, ?, ?)",
        )
        .bind(uuid_to_blob(id))
        .bind(new.kind.as_str())
        .bind(uuid_to_blob(new.owner_id))
        .bind(&new.title)
        .bind(&new.body)
        .bind(locator)
        .bind(name)
        .bind(size)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(id)
    }

    async fn find(&self, id: Uuid) -> Result<Option<ContentRecord>> {
        let row = sqlx::query("SELECT * FROM contents WHERE id = ?")
            .bind(uuid_to_blob(id))
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(row.as_ref().map(record_from_row))
    }

    async fn find_with_owner(&self, id: Uuid) -> Result<Option<(ContentRecord, Member)>> {
        let row = sqlx::query(SELECT_WITH_OWNER)
            .bind(uuid_to_blob(id))
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(row.as_ref().map(record_with_owner_from_row))
    }

    /// Increment-and-read in one transaction so a concurrent reader of
    /// the same record can neither lose nor double-count the view.
    async fn fetch_incrementing_view(&self, id: Uuid) -> Result<Option<(ContentRecord, Member)>> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        let updated = sqlx::query("UPDATE contents SET view_count = view_count + 1 WHERE id = ?")
            .bind(uuid_to_blob(id))
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;
        if updated.rows_affected() == 0 {
            return Ok(None);
        }

        let row = sqlx::query(SELECT_WITH_OWNER)
            .bind(uuid_to_blob(id))
            .fetch_optional(&mut *tx)
            .await
            .map_err(db_err)?;

        tx.commit().await.map_err(db_err)?;
        Ok(row.as_ref().map(record_with_owner_from_row))
    }

    async fn update(&self, record: &ContentRecord) -> Result<()> {
        let now: DateTime<Utc> = Utc::now();
        let (locator, name, size) = match &record.attachment {
            Some(att) => (
                Some(att.locator.as_str()),
                Some(att.original_name.as_str()),
                Some(att.size_bytes),
            ),
            None => (None, None, None),
        };

        // All mutable fields travel in one statement, guarded by the
        // revision the caller read. The loser of a concurrent update
        // matches zero rows.
        let updated = sqlx::query(
            "UPDATE contents
             SET title = ?, body = ?,
                 attachment_locator = ?, attachment_name = ?, attachment_size = ?,
                 revision = revision + 1, updated_at = ?
             WHERE id = ? AND revision = ?",
        )
        .bind(&record.title)
        .bind(&record.body)
        .bind(locator)
        .bind(name)
        .bind(size)
        .bind(now)
        .bind(uuid_to_blob(record.id))
        .bind(record.revision)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        if updated.rows_affected() > 0 {
            return Ok(());
        }

        let exists = sqlx::query("SELECT 1 FROM contents WHERE id = ?")
            .bind(uuid_to_blob(record.id))
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?
            .is_some();

        if exists {
            Err(AppError::Conflict(format!(
                "content {} was modified concurrently",
                record.id
            )))
        } else {
            Err(AppError::not_found("content", record.id))
        }
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let deleted = sqlx::query("DELETE FROM contents WHERE id = ?")
            .bind(uuid_to_blob(id))
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(deleted.rows_affected() > 0)
    }

    async fn list_page(
        &self,
        kind: ContentKind,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<ContentSummary>> {
        let rows = sqlx::query(
            "SELECT c.id, c.title, m.name AS member_name, c.view_count,
                    c.attachment_locator IS NOT NULL AS has_attachment, c.created_at
             FROM contents c JOIN members m ON m.id = c.owner_id
             WHERE c.kind = ?
             ORDER BY c.created_at DESC, c.id DESC
             LIMIT ? OFFSET ?",
        )
        .bind(kind.as_str())
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(rows
            .into_iter()
            .map(|row| ContentSummary {
                id: blob_to_uuid(row.get::<Vec<u8>, _>("id").as_slice()),
                title: row.get("title"),
                author_name: row.get("member_name"),
                view_count: row.get("view_count"),
                has_attachment: row.get("has_attachment"),
                created_at: row.get("created_at"),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mp_core::models::ContentDraft;

    async fn repo_with_member() -> (SqliteContentRepo, Member) {
        let repo = SqliteContentRepo::new("sqlite::memory:").await.unwrap();
        let member = Member {
            id: Uuid::now_v7(),
            name: "Jiyoung".to_string(),
        };
        repo.upsert_member(&member).await.unwrap();
        (repo, member)
    }

    fn new_record(owner: &Member, title: &str, attachment: Option<Attachment>) -> NewContentRecord {
        NewContentRecord {
            kind: ContentKind::Post,
            owner_id: owner.id,
            title: title.to_string(),
            body: "body text".to_string(),
            attachment,
        }
    }

    fn attachment(locator: &str) -> Attachment {
        Attachment {
            locator: locator.to_string(),
            original_name: "원본 보고서.pdf".to_string(),
            size_bytes: 2048,
        }
    }

    #[tokio::test]
    async fn insert_and_find_round_trip() {
        let (repo, member) = repo_with_member().await;

        let id = repo
            .insert(new_record(&member, "first", Some(attachment("/up/a.pdf"))))
            .await
            .unwrap();

        let rec = repo.find(id).await.unwrap().expect("record exists");
        assert_eq!(rec.id, id);
        assert_eq!(rec.owner_id, member.id);
        assert_eq!(rec.title, "first");
        assert_eq!(rec.view_count, 0);
        assert_eq!(rec.revision, 0);
        let att = rec.attachment.expect("attachment stored");
        assert_eq!(att.locator, "/up/a.pdf");
        assert_eq!(att.original_name, "원본 보고서.pdf");
        assert_eq!(att.size_bytes, 2048);
    }

    #[tokio::test]
    async fn find_with_owner_loads_member() {
        let (repo, member) = repo_with_member().await;
        let id = repo.insert(new_record(&member, "t", None)).await.unwrap();

        let (rec, owner) = repo.find_with_owner(id).await.unwrap().expect("joined row");
        assert_eq!(rec.id, id);
        assert_eq!(owner.id, member.id);
        assert_eq!(owner.name, "Jiyoung");
    }

    #[tokio::test]
    async fn view_increment_is_applied_exactly_once_per_call() {
        let (repo, member) = repo_with_member().await;
        let id = repo.insert(new_record(&member, "t", None)).await.unwrap();

        for expected in 1..=3 {
            let (rec, _) = repo
                .fetch_incrementing_view(id)
                .await
                .unwrap()
                .expect("record exists");
            assert_eq!(rec.view_count, expected);
        }

        // Plain reads leave the counter alone
        let (rec, _) = repo.find_with_owner(id).await.unwrap().unwrap();
        assert_eq!(rec.view_count, 3);

        assert!(repo
            .fetch_incrementing_view(Uuid::now_v7())
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn update_writes_all_fields_and_bumps_revision() {
        let (repo, member) = repo_with_member().await;
        let id = repo.insert(new_record(&member, "old", None)).await.unwrap();

        let mut rec = repo.find(id).await.unwrap().unwrap();
        rec.apply_draft(ContentDraft::new("new title", "new body"));
        rec.attachment = Some(attachment("/up/b.pdf"));
        repo.update(&rec).await.unwrap();

        let reloaded = repo.find(id).await.unwrap().unwrap();
        assert_eq!(reloaded.title, "new title");
        assert_eq!(reloaded.body, "new body");
        assert_eq!(reloaded.revision, 1);
        assert_eq!(reloaded.attachment.unwrap().locator, "/up/b.pdf");
    }

    #[tokio::test]
    async fn stale_revision_is_a_conflict() {
        let (repo, member) = repo_with_member().await;
        let id = repo.insert(new_record(&member, "t", None)).await.unwrap();

        let stale = repo.find(id).await.unwrap().unwrap();
        let mut winner = stale.clone();
        winner.apply_draft(ContentDraft::new("winner", "body"));
        repo.update(&winner).await.unwrap();

        let mut loser = stale;
        loser.apply_draft(ContentDraft::new("loser", "body"));
        match repo.update(&loser).await {
            Err(AppError::Conflict(_)) => {}
            other => panic!("expected conflict, got {other:?}"),
        }

        assert_eq!(repo.find(id).await.unwrap().unwrap().title, "winner");
    }

    #[tokio::test]
    async fn update_of_missing_record_is_not_found() {
        let (repo, member) = repo_with_member().await;
        let id = repo.insert(new_record(&member, "t", None)).await.unwrap();
        let rec = repo.find(id).await.unwrap().unwrap();
        assert!(repo.delete(id).await.unwrap());

        match repo.update(&rec).await {
            Err(AppError::NotFound(_, _)) => {}
            other => panic!("expected not-found, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn second_delete_reports_already_gone() {
        let (repo, member) = repo_with_member().await;
        let id = repo.insert(new_record(&member, "t", None)).await.unwrap();

        assert!(repo.delete(id).await.unwrap());
        assert!(!repo.delete(id).await.unwrap());
    }

    #[tokio::test]
    async fn listing_is_newest_first_with_attachment_flag() {
        let (repo, member) = repo_with_member().await;
        let _a = repo.insert(new_record(&member, "a", None)).await.unwrap();
        let _b = repo
            .insert(new_record(&member, "b", Some(attachment("/up/c.zip"))))
            .await
            .unwrap();

        let page = repo.list_page(ContentKind::Post, 10, 0).await.unwrap();
        assert_eq!(page.len(), 2);
        assert_eq!(page[0].title, "b");
        assert!(page[0].has_attachment);
        assert_eq!(page[0].author_name, "Jiyoung");
        assert_eq!(page[1].title, "a");
        assert!(!page[1].has_attachment);

        assert!(repo
            .list_page(ContentKind::Resource, 10, 0)
            .await
            .unwrap()
            .is_empty());
    }
}
