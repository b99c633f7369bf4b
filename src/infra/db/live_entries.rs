use async_trait::async_trait;
use time::OffsetDateTime;

use crate::{
    application::repos::{LiveEntriesRepo, RepoError},
    domain::entities::LiveEntryRecord,
};

use super::{SqliteRepositories, map_sqlx_error};

#[derive(sqlx::FromRow)]
struct LiveEntryRow {
    id: i64,
    body: String,
    pinned: bool,
    created_at: OffsetDateTime,
}

impl From<LiveEntryRow> for LiveEntryRecord {
    fn from(row: LiveEntryRow) -> Self {
        Self {
            id: row.id,
            body: row.body,
            pinned: row.pinned,
            created_at: row.created_at,
        }
    }
}

#[async_trait]
impl LiveEntriesRepo for SqliteRepositories {
    async fn create_entry(&self, body: &str, pinned: bool) -> Result<LiveEntryRecord, RepoError> {
        let row = sqlx::query_as::<_, LiveEntryRow>(
            r#"
            INSERT INTO live_entries (body, pinned, created_at)
            VALUES (?1, ?2, ?3)
            RETURNING id, body, pinned, created_at
            "#,
        )
        .bind(body)
        .bind(pinned)
        .bind(OffsetDateTime::now_utc())
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.into())
    }

    async fn list_entries(
        &self,
        limit: u32,
        offset: u64,
    ) -> Result<Vec<LiveEntryRecord>, RepoError> {
        let offset = i64::try_from(offset).map_err(|_| RepoError::InvalidInput {
            message: format!("offset {offset} out of range"),
        })?;

        let rows = sqlx::query_as::<_, LiveEntryRow>(
            r#"
            SELECT id, body, pinned, created_at
            FROM live_entries
            ORDER BY pinned DESC, created_at DESC, id DESC
            LIMIT ?1 OFFSET ?2
            "#,
        )
        .bind(i64::from(limit))
        .bind(offset)
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(LiveEntryRecord::from).collect())
    }

    async fn count_entries(&self) -> Result<u64, RepoError> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM live_entries")
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        u64::try_from(total).map_err(RepoError::from_persistence)
    }

    async fn delete_entry(&self, id: i64) -> Result<bool, RepoError> {
        let result = sqlx::query("DELETE FROM live_entries WHERE id = ?1")
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn toggle_pin(&self, id: i64) -> Result<Option<LiveEntryRecord>, RepoError> {
        let row = sqlx::query_as::<_, LiveEntryRow>(
            r#"
            UPDATE live_entries
            SET pinned = NOT pinned
            WHERE id = ?1
            RETURNING id, body, pinned, created_at
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(LiveEntryRecord::from))
    }
}
