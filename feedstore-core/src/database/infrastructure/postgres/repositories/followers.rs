use async_trait::async_trait;
use feedstore_model::{AccountId, Follower, Page, Pagination};
use sqlx::Row;
use tracing::debug;

use super::{follower_from_row, total_from_rows};
use crate::database::infrastructure::postgres::scope::PgScope;
use crate::database::ports::followers::FollowersRepository;
use crate::error::{CoreError, Result, pg::db_error};

#[derive(Clone, Debug)]
pub struct PostgresFollowersRepository {
    scope: PgScope,
}

impl PostgresFollowersRepository {
    pub(crate) fn new(scope: PgScope) -> Self {
        Self { scope }
    }

    /// `column` is the side of the edge that must equal `$1`.
    async fn page(
        &self,
        column: &'static str,
        account_id: &AccountId,
        pagination: Pagination,
    ) -> Result<Page<Follower>> {
        let pagination = pagination.clamped();
        let sql = format!(
            r#"
            WITH total AS (
                SELECT count(*) AS total_count FROM followers WHERE {column} = $1
            ),
            page AS (
                SELECT follower, follow_for, followed_at
                FROM followers
                WHERE {column} = $1
                ORDER BY followed_at DESC, follower, follow_for
                LIMIT $2 OFFSET $3
            )
            SELECT total.total_count, page.*
            FROM total
            LEFT JOIN page ON TRUE
            ORDER BY page.followed_at DESC, page.follower, page.follow_for
            "#
        );

        let mut conn = self.scope.connection().await?;
        let rows = sqlx::query(&sql)
            .bind(account_id.as_str())
            .bind(pagination.limit)
            .bind(pagination.offset)
            .fetch_all(&mut *conn)
            .await
            .map_err(db_error("Failed to load follow edges"))?;

        let total_count = total_from_rows(&rows)?;
        let mut items = Vec::with_capacity(rows.len());
        for row in &rows {
            let present: Option<String> = row
                .try_get("follower")
                .map_err(db_error("Failed to decode follow edge"))?;
            if present.is_some() {
                items.push(follower_from_row(row)?);
            }
        }
        Ok(Page::new(items, total_count))
    }

    async fn count(&self, column: &'static str, account_id: &AccountId) -> Result<i64> {
        let sql =
            format!("SELECT count(*) AS count FROM followers WHERE {column} = $1");

        let mut conn = self.scope.connection().await?;
        let row = sqlx::query(&sql)
            .bind(account_id.as_str())
            .fetch_one(&mut *conn)
            .await
            .map_err(db_error("Failed to count follow edges"))?;

        row.try_get("count")
            .map_err(db_error("Failed to decode follow count"))
    }
}

#[async_trait]
impl FollowersRepository for PostgresFollowersRepository {
    async fn add(&self, edge: &Follower) -> Result<()> {
        let mut conn = self.scope.connection().await?;

        sqlx::query(
            r#"
            INSERT INTO followers (follower, follow_for, followed_at)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(edge.follower.as_str())
        .bind(edge.follow_for.as_str())
        .bind(edge.followed_at)
        .execute(&mut *conn)
        .await
        .map_err(db_error("Failed to insert follow edge"))?;

        Ok(())
    }

    async fn insert_or_get(&self, edge: &Follower) -> Result<(Follower, bool)> {
        let mut conn = self.scope.connection().await?;

        let row = sqlx::query(
            r#"
            WITH inserted AS (
                INSERT INTO followers (follower, follow_for, followed_at)
                VALUES ($1, $2, $3)
                ON CONFLICT (follower, follow_for) DO NOTHING
                RETURNING follower, follow_for, followed_at
            )
            SELECT follower, follow_for, followed_at, true AS created
            FROM inserted
            UNION ALL
            SELECT follower, follow_for, followed_at, false AS created
            FROM followers
            WHERE follower = $1 AND follow_for = $2
              AND NOT EXISTS (SELECT 1 FROM inserted)
            "#,
        )
        .bind(edge.follower.as_str())
        .bind(edge.follow_for.as_str())
        .bind(edge.followed_at)
        .fetch_optional(&mut *conn)
        .await
        .map_err(db_error("Failed to upsert follow edge"))?;

        if let Some(row) = row {
            let created: bool = row
                .try_get("created")
                .map_err(db_error("Failed to decode follow edge"))?;
            return Ok((follower_from_row(&row)?, created));
        }

        // A concurrent writer committed the edge after this statement's
        // snapshot was taken; read it back with a fresh snapshot.
        debug!(
            "follow edge {} -> {} raced with another writer",
            edge.follower, edge.follow_for
        );
        let row = sqlx::query(
            r#"
            SELECT follower, follow_for, followed_at
            FROM followers
            WHERE follower = $1 AND follow_for = $2
            "#,
        )
        .bind(edge.follower.as_str())
        .bind(edge.follow_for.as_str())
        .fetch_optional(&mut *conn)
        .await
        .map_err(db_error("Failed to load follow edge"))?;

        match row {
            Some(row) => Ok((follower_from_row(&row)?, false)),
            None => Err(CoreError::Conflict(format!(
                "follow edge {} -> {} changed concurrently",
                edge.follower, edge.follow_for
            ))),
        }
    }

    async fn delete(
        &self,
        follower: &AccountId,
        follow_for: &AccountId,
    ) -> Result<bool> {
        let mut conn = self.scope.connection().await?;

        let result = sqlx::query(
            "DELETE FROM followers WHERE follower = $1 AND follow_for = $2",
        )
        .bind(follower.as_str())
        .bind(follow_for.as_str())
        .execute(&mut *conn)
        .await
        .map_err(db_error("Failed to delete follow edge"))?;

        Ok(result.rows_affected() > 0)
    }

    async fn has_follow(
        &self,
        follower: &AccountId,
        follow_for: &AccountId,
    ) -> Result<bool> {
        Ok(self.get_follow(follower, follow_for).await?.is_some())
    }

    async fn get_follow(
        &self,
        follower: &AccountId,
        follow_for: &AccountId,
    ) -> Result<Option<Follower>> {
        let mut conn = self.scope.connection().await?;

        let row = sqlx::query(
            r#"
            SELECT follower, follow_for, followed_at
            FROM followers
            WHERE follower = $1 AND follow_for = $2
            "#,
        )
        .bind(follower.as_str())
        .bind(follow_for.as_str())
        .fetch_optional(&mut *conn)
        .await
        .map_err(db_error("Failed to load follow edge"))?;

        row.as_ref().map(follower_from_row).transpose()
    }

    async fn get_followers(
        &self,
        account_id: &AccountId,
        pagination: Pagination,
    ) -> Result<Page<Follower>> {
        self.page("follow_for", account_id, pagination).await
    }

    async fn get_following(
        &self,
        account_id: &AccountId,
        pagination: Pagination,
    ) -> Result<Page<Follower>> {
        self.page("follower", account_id, pagination).await
    }

    async fn count_followers(&self, account_id: &AccountId) -> Result<i64> {
        self.count("follow_for", account_id).await
    }

    async fn count_following(&self, account_id: &AccountId) -> Result<i64> {
        self.count("follower", account_id).await
    }
}
