use async_trait::async_trait;
use feedstore_model::{AccountId, FeedID, Like, Page, Pagination};
use sqlx::Row;
use uuid::Uuid;

use super::{like_from_row, total_from_rows};
use crate::database::infrastructure::postgres::scope::PgScope;
use crate::database::ports::likes::LikesRepository;
use crate::error::{CoreError, Result, pg::db_error};

#[derive(Clone, Debug)]
pub struct PostgresLikesRepository {
    scope: PgScope,
}

impl PostgresLikesRepository {
    pub(crate) fn new(scope: PgScope) -> Self {
        Self { scope }
    }
}

#[async_trait]
impl LikesRepository for PostgresLikesRepository {
    async fn add(&self, like: &Like) -> Result<()> {
        let mut conn = self.scope.connection().await?;

        sqlx::query(
            r#"
            INSERT INTO likes (feed_id, account_id, liked_at)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(like.feed_id.to_uuid())
        .bind(like.account_id.as_str())
        .bind(like.liked_at)
        .execute(&mut *conn)
        .await
        .map_err(db_error("Failed to insert like"))?;

        Ok(())
    }

    async fn insert_or_get(&self, like: &Like) -> Result<(Like, bool)> {
        let mut conn = self.scope.connection().await?;

        let row = sqlx::query(
            r#"
            WITH inserted AS (
                INSERT INTO likes (feed_id, account_id, liked_at)
                VALUES ($1, $2, $3)
                ON CONFLICT (feed_id, account_id) DO NOTHING
                RETURNING feed_id, account_id, liked_at
            )
            SELECT feed_id, account_id, liked_at, true AS created
            FROM inserted
            UNION ALL
            SELECT feed_id, account_id, liked_at, false AS created
            FROM likes
            WHERE feed_id = $1 AND account_id = $2
              AND NOT EXISTS (SELECT 1 FROM inserted)
            "#,
        )
        .bind(like.feed_id.to_uuid())
        .bind(like.account_id.as_str())
        .bind(like.liked_at)
        .fetch_optional(&mut *conn)
        .await
        .map_err(db_error("Failed to upsert like"))?;

        if let Some(row) = row {
            let created: bool = row
                .try_get("created")
                .map_err(db_error("Failed to decode like"))?;
            return Ok((like_from_row(&row)?, created));
        }

        let row = sqlx::query(
            r#"
            SELECT feed_id, account_id, liked_at
            FROM likes
            WHERE feed_id = $1 AND account_id = $2
            "#,
        )
        .bind(like.feed_id.to_uuid())
        .bind(like.account_id.as_str())
        .fetch_optional(&mut *conn)
        .await
        .map_err(db_error("Failed to load like"))?;

        match row {
            Some(row) => Ok((like_from_row(&row)?, false)),
            None => Err(CoreError::Conflict(format!(
                "like of feed {} by {} changed concurrently",
                like.feed_id, like.account_id
            ))),
        }
    }

    async fn delete(
        &self,
        feed_id: FeedID,
        account_id: &AccountId,
    ) -> Result<bool> {
        let mut conn = self.scope.connection().await?;

        let result = sqlx::query(
            "DELETE FROM likes WHERE feed_id = $1 AND account_id = $2",
        )
        .bind(feed_id.to_uuid())
        .bind(account_id.as_str())
        .execute(&mut *conn)
        .await
        .map_err(db_error("Failed to delete like"))?;

        Ok(result.rows_affected() > 0)
    }

    async fn get_by_feed_id(
        &self,
        feed_id: FeedID,
        pagination: Pagination,
    ) -> Result<Page<Like>> {
        let pagination = pagination.clamped();
        let mut conn = self.scope.connection().await?;

        let rows = sqlx::query(
            r#"
            WITH total AS (
                SELECT count(*) AS total_count FROM likes WHERE feed_id = $1
            ),
            page AS (
                SELECT feed_id, account_id, liked_at
                FROM likes
                WHERE feed_id = $1
                ORDER BY liked_at DESC, account_id
                LIMIT $2 OFFSET $3
            )
            SELECT total.total_count, page.*
            FROM total
            LEFT JOIN page ON TRUE
            ORDER BY page.liked_at DESC, page.account_id
            "#,
        )
        .bind(feed_id.to_uuid())
        .bind(pagination.limit)
        .bind(pagination.offset)
        .fetch_all(&mut *conn)
        .await
        .map_err(db_error("Failed to load likes"))?;

        let total_count = total_from_rows(&rows)?;
        let mut items = Vec::with_capacity(rows.len());
        for row in &rows {
            let present: Option<Uuid> = row
                .try_get("feed_id")
                .map_err(db_error("Failed to decode like"))?;
            if present.is_some() {
                items.push(like_from_row(row)?);
            }
        }
        Ok(Page::new(items, total_count))
    }

    async fn has_like(
        &self,
        feed_id: FeedID,
        account_id: &AccountId,
    ) -> Result<bool> {
        Ok(self
            .get_by_feed_id_and_account_id(feed_id, account_id)
            .await?
            .is_some())
    }

    async fn count_by_feed_id(&self, feed_id: FeedID) -> Result<i64> {
        let mut conn = self.scope.connection().await?;

        let row =
            sqlx::query("SELECT count(*) AS count FROM likes WHERE feed_id = $1")
                .bind(feed_id.to_uuid())
                .fetch_one(&mut *conn)
                .await
                .map_err(db_error("Failed to count likes"))?;

        row.try_get("count")
            .map_err(db_error("Failed to decode like count"))
    }

    async fn get_by_feed_id_and_account_id(
        &self,
        feed_id: FeedID,
        account_id: &AccountId,
    ) -> Result<Option<Like>> {
        let mut conn = self.scope.connection().await?;

        let row = sqlx::query(
            r#"
            SELECT feed_id, account_id, liked_at
            FROM likes
            WHERE feed_id = $1 AND account_id = $2
            "#,
        )
        .bind(feed_id.to_uuid())
        .bind(account_id.as_str())
        .fetch_optional(&mut *conn)
        .await
        .map_err(db_error("Failed to load like"))?;

        row.as_ref().map(like_from_row).transpose()
    }
}
