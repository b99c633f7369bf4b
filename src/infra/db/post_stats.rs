use async_trait::async_trait;
use time::OffsetDateTime;

use crate::{
    application::repos::{PostStatsRepo, RepoError},
    domain::entities::PostStatRecord,
};

use super::{SqliteRepositories, map_sqlx_error};

const STAT_COLUMNS: &str = "id, slug, view_count, first_viewed_at, last_viewed_at";

#[derive(sqlx::FromRow)]
struct PostStatRow {
    id: i64,
    slug: String,
    view_count: i64,
    first_viewed_at: OffsetDateTime,
    last_viewed_at: OffsetDateTime,
}

impl TryFrom<PostStatRow> for PostStatRecord {
    type Error = RepoError;

    fn try_from(row: PostStatRow) -> Result<Self, Self::Error> {
        let view_count = u64::try_from(row.view_count).map_err(|_| RepoError::Integrity {
            message: format!("negative view count for `{}`", row.slug),
        })?;
        Ok(Self {
            id: row.id,
            slug: row.slug,
            view_count,
            first_viewed_at: row.first_viewed_at,
            last_viewed_at: row.last_viewed_at,
        })
    }
}

#[async_trait]
impl PostStatsRepo for SqliteRepositories {
    async fn increment_view(&self, slug: &str) -> Result<PostStatRecord, RepoError> {
        let now = OffsetDateTime::now_utc();
        let sql = format!(
            "INSERT INTO post_stats (slug, view_count, first_viewed_at, last_viewed_at) \
             VALUES (?1, 1, ?2, ?2) \
             ON CONFLICT (slug) DO UPDATE SET \
                 view_count = post_stats.view_count + 1, \
                 last_viewed_at = excluded.last_viewed_at \
             RETURNING {STAT_COLUMNS}"
        );

        let row = sqlx::query_as::<_, PostStatRow>(&sql)
            .bind(slug)
            .bind(now)
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        row.try_into()
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<PostStatRecord>, RepoError> {
        let sql = format!("SELECT {STAT_COLUMNS} FROM post_stats WHERE slug = ?1");
        let row = sqlx::query_as::<_, PostStatRow>(&sql)
            .bind(slug)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        row.map(PostStatRecord::try_from).transpose()
    }

    async fn list_all(&self) -> Result<Vec<PostStatRecord>, RepoError> {
        let sql = format!("SELECT {STAT_COLUMNS} FROM post_stats ORDER BY view_count DESC, slug ASC");
        let rows = sqlx::query_as::<_, PostStatRow>(&sql)
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        rows.into_iter().map(PostStatRecord::try_from).collect()
    }
}
