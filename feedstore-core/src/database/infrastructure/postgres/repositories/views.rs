use async_trait::async_trait;
use chrono::{DateTime, Utc};
use feedstore_model::View;
use tracing::debug;

use super::uuids;
use crate::database::infrastructure::postgres::scope::PgScope;
use crate::database::ports::views::ViewsRepository;
use crate::error::{Result, pg::db_error};

#[derive(Clone, Debug)]
pub struct PostgresViewsRepository {
    scope: PgScope,
}

impl PostgresViewsRepository {
    pub(crate) fn new(scope: PgScope) -> Self {
        Self { scope }
    }
}

#[async_trait]
impl ViewsRepository for PostgresViewsRepository {
    async fn batch_add(&self, views: &[View]) -> Result<u64> {
        if views.is_empty() {
            return Ok(0);
        }

        let feed_ids = uuids(views.iter().map(|v| v.feed_id));
        let accounts: Vec<&str> =
            views.iter().map(|v| v.account_id.as_str()).collect();
        let viewed_at: Vec<DateTime<Utc>> =
            views.iter().map(|v| v.viewed_at).collect();

        let mut conn = self.scope.connection().await?;
        // DO NOTHING also skips pairs repeated inside this batch.
        let result = sqlx::query(
            r#"
            INSERT INTO views (feed_id, account_id, viewed_at)
            SELECT * FROM unnest($1::uuid[], $2::text[], $3::timestamptz[])
            ON CONFLICT (feed_id, account_id) DO NOTHING
            "#,
        )
        .bind(&feed_ids)
        .bind(&accounts)
        .bind(&viewed_at)
        .execute(&mut *conn)
        .await
        .map_err(db_error("Failed to record views"))?;

        debug!(
            "Recorded {} of {} views",
            result.rows_affected(),
            views.len()
        );
        Ok(result.rows_affected())
    }
}
