use std::collections::HashSet;
use std::sync::LazyLock;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use feedstore_model::{
    AccountId, AccountInfoCounts, Feed, FeedID, Image, Page, Pagination,
};
use sqlx::{Row, postgres::PgRow, types::Json};
use tracing::debug;
use uuid::Uuid;

use super::{total_from_rows, uuids};
use crate::database::infrastructure::postgres::scope::PgScope;
use crate::database::ports::feeds::FeedsRepository;
use crate::error::{CoreError, Result, pg::db_error};

/// Feed columns plus viewer-relative counters and the bound images as JSON.
///
/// `$1` is always the optional viewer account.
const FEED_PROJECTION: &str = r#"
    f.feed_id,
    f.account_id,
    f.text,
    f.created_at,
    f.updated_at,
    (SELECT count(*) FROM likes l WHERE l.feed_id = f.feed_id) AS likes_count,
    (SELECT count(*) FROM views v WHERE v.feed_id = f.feed_id) AS views_count,
    CASE WHEN $1::text IS NULL THEN false
         ELSE EXISTS (
             SELECT 1 FROM followers fo
             WHERE fo.follower = $1::text AND fo.follow_for = f.account_id
         )
    END AS has_followed,
    CASE WHEN $1::text IS NULL THEN false
         ELSE EXISTS (
             SELECT 1 FROM likes l
             WHERE l.feed_id = f.feed_id AND l.account_id = $1::text
         )
    END AS has_liked,
    COALESCE(
        (
            SELECT json_agg(
                json_build_object(
                    'image_id', i.image_id,
                    'uploader', i.uploader,
                    'url', i.url,
                    'feed_id', i.feed_id,
                    'blurhash', i.blurhash,
                    'uploaded_at', i.uploaded_at,
                    'order', i."order"
                )
                ORDER BY i."order", i.image_id
            )
            FROM images i
            WHERE i.feed_id = f.feed_id
        ),
        '[]'::json
    ) AS images
"#;

static SELECT_BY_ID: LazyLock<String> = LazyLock::new(|| {
    format!("SELECT {FEED_PROJECTION} FROM feeds f WHERE f.feed_id = $2")
});

static SELECT_BY_IDS: LazyLock<String> = LazyLock::new(|| {
    format!(
        r#"
        SELECT {FEED_PROJECTION}
        FROM unnest($2::uuid[]) WITH ORDINALITY AS req(feed_id, ord)
        JOIN feeds f ON f.feed_id = req.feed_id
        ORDER BY req.ord
        "#
    )
});

static SELECT_ACCOUNT_PAGE: LazyLock<String> = LazyLock::new(|| {
    format!(
        r#"
        WITH total AS (
            SELECT count(*) AS total_count FROM feeds WHERE account_id = $2
        ),
        page AS (
            SELECT {FEED_PROJECTION}
            FROM feeds f
            WHERE f.account_id = $2
            ORDER BY f.created_at DESC, f.feed_id DESC
            LIMIT $3 OFFSET $4
        )
        SELECT total.total_count, page.*
        FROM total
        LEFT JOIN page ON TRUE
        ORDER BY page.created_at DESC, page.feed_id DESC
        "#
    )
});

/// Decodes one projected feed row, or `None` for the NULL filler row of an
/// empty page.
fn feed_from_row(row: &PgRow) -> Result<Option<Feed>> {
    let decode =
        |e: sqlx::Error| CoreError::Database(format!("Failed to decode feed: {e}"));

    let Some(feed_id) = row.try_get::<Option<Uuid>, _>("feed_id").map_err(decode)?
    else {
        return Ok(None);
    };

    let Json(images): Json<Vec<Image>> =
        row.try_get("images").map_err(decode)?;

    let feed = Feed {
        feed_id: FeedID(feed_id),
        account_id: AccountId::from_trusted(
            row.try_get("account_id").map_err(decode)?,
        ),
        text: row.try_get("text").map_err(decode)?,
        images,
        created_at: row.try_get("created_at").map_err(decode)?,
        updated_at: row.try_get("updated_at").map_err(decode)?,
        likes_count: row.try_get("likes_count").map_err(decode)?,
        views_count: row.try_get("views_count").map_err(decode)?,
        has_followed: row.try_get("has_followed").map_err(decode)?,
        has_liked: row.try_get("has_liked").map_err(decode)?,
    };

    Ok(Some(feed))
}

#[derive(Clone, Debug)]
pub struct PostgresFeedsRepository {
    scope: PgScope,
}

impl PostgresFeedsRepository {
    pub(crate) fn new(scope: PgScope) -> Self {
        Self { scope }
    }
}

#[async_trait]
impl FeedsRepository for PostgresFeedsRepository {
    async fn add(&self, feed: &Feed) -> Result<()> {
        let mut conn = self.scope.connection().await?;

        let result = sqlx::query(
            r#"
            INSERT INTO feeds (feed_id, account_id, text, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (feed_id) DO NOTHING
            "#,
        )
        .bind(feed.feed_id.to_uuid())
        .bind(feed.account_id.as_str())
        .bind(&feed.text)
        .bind(feed.created_at)
        .bind(feed.updated_at)
        .execute(&mut *conn)
        .await
        .map_err(db_error("Failed to insert feed"))?;

        if result.rows_affected() == 0 {
            return Err(CoreError::Conflict(format!(
                "feed {} already exists",
                feed.feed_id
            )));
        }
        Ok(())
    }

    async fn update(&self, feed: &Feed) -> Result<()> {
        let mut conn = self.scope.connection().await?;
        let feed_uuid = feed.feed_id.to_uuid();

        let updated = sqlx::query(
            r#"
            UPDATE feeds
            SET text = $2, created_at = $3, updated_at = $4
            WHERE feed_id = $1
            "#,
        )
        .bind(feed_uuid)
        .bind(&feed.text)
        .bind(feed.created_at)
        .bind(feed.updated_at)
        .execute(&mut *conn)
        .await
        .map_err(db_error("Failed to update feed"))?;

        if updated.rows_affected() == 0 {
            return Err(CoreError::NotFound(format!(
                "feed {} does not exist",
                feed.feed_id
            )));
        }

        let kept = uuids(feed.images.iter().map(|image| image.image_id));

        let unbound = sqlx::query(
            r#"
            UPDATE images
            SET feed_id = NULL
            WHERE feed_id = $1 AND NOT (image_id = ANY($2))
            "#,
        )
        .bind(feed_uuid)
        .bind(&kept)
        .execute(&mut *conn)
        .await
        .map_err(db_error("Failed to unbind removed images"))?;

        if !feed.images.is_empty() {
            let uploaders: Vec<&str> =
                feed.images.iter().map(|i| i.uploader.as_str()).collect();
            let urls: Vec<&str> =
                feed.images.iter().map(|i| i.url.as_str()).collect();
            let blurhashes: Vec<Option<String>> =
                feed.images.iter().map(|i| i.blurhash.clone()).collect();
            let uploaded_at: Vec<DateTime<Utc>> =
                feed.images.iter().map(|i| i.uploaded_at).collect();
            let orders: Vec<i32> =
                feed.images.iter().map(|i| i.order).collect();

            sqlx::query(
                r#"
                INSERT INTO images (
                    image_id, uploader, url, feed_id, blurhash, uploaded_at, "order"
                )
                SELECT u.image_id, u.uploader, u.url, $1::uuid, u.blurhash,
                       u.uploaded_at, u.ord
                FROM unnest(
                    $2::uuid[], $3::text[], $4::text[], $5::text[],
                    $6::timestamptz[], $7::int4[]
                ) AS u(image_id, uploader, url, blurhash, uploaded_at, ord)
                ON CONFLICT (image_id) DO UPDATE SET
                    feed_id = EXCLUDED.feed_id,
                    "order" = EXCLUDED."order"
                "#,
            )
            .bind(feed_uuid)
            .bind(&kept)
            .bind(&uploaders)
            .bind(&urls)
            .bind(&blurhashes)
            .bind(&uploaded_at)
            .bind(&orders)
            .execute(&mut *conn)
            .await
            .map_err(db_error("Failed to bind feed images"))?;
        }

        debug!(
            "Updated feed {} ({} images bound, {} unbound)",
            feed.feed_id,
            feed.images.len(),
            unbound.rows_affected()
        );
        Ok(())
    }

    async fn get_by_id(
        &self,
        feed_id: FeedID,
        viewer: Option<&AccountId>,
    ) -> Result<Option<Feed>> {
        let mut conn = self.scope.connection().await?;

        let row = sqlx::query(SELECT_BY_ID.as_str())
            .bind(viewer.map(AccountId::as_str))
            .bind(feed_id.to_uuid())
            .fetch_optional(&mut *conn)
            .await
            .map_err(db_error("Failed to load feed"))?;

        match row {
            Some(row) => feed_from_row(&row),
            None => Ok(None),
        }
    }

    async fn get_by_ids(
        &self,
        feed_ids: &[FeedID],
        viewer: Option<&AccountId>,
    ) -> Result<Vec<Feed>> {
        if feed_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut seen = HashSet::with_capacity(feed_ids.len());
        let requested: Vec<Uuid> = feed_ids
            .iter()
            .filter(|id| seen.insert(**id))
            .map(FeedID::to_uuid)
            .collect();

        let mut conn = self.scope.connection().await?;
        let rows = sqlx::query(SELECT_BY_IDS.as_str())
            .bind(viewer.map(AccountId::as_str))
            .bind(&requested)
            .fetch_all(&mut *conn)
            .await
            .map_err(db_error("Failed to load feeds"))?;

        let mut feeds = Vec::with_capacity(rows.len());
        for row in &rows {
            if let Some(feed) = feed_from_row(row)? {
                feeds.push(feed);
            }
        }
        Ok(feeds)
    }

    async fn get_account_feeds(
        &self,
        account_id: &AccountId,
        pagination: Pagination,
        viewer: Option<&AccountId>,
    ) -> Result<Page<Feed>> {
        let pagination = pagination.clamped();
        let mut conn = self.scope.connection().await?;

        let rows = sqlx::query(SELECT_ACCOUNT_PAGE.as_str())
            .bind(viewer.map(AccountId::as_str))
            .bind(account_id.as_str())
            .bind(pagination.limit)
            .bind(pagination.offset)
            .fetch_all(&mut *conn)
            .await
            .map_err(db_error("Failed to load account feeds"))?;

        let total_count = total_from_rows(&rows)?;
        let mut items = Vec::with_capacity(rows.len());
        for row in &rows {
            if let Some(feed) = feed_from_row(row)? {
                items.push(feed);
            }
        }

        Ok(Page::new(items, total_count))
    }

    async fn count_feeds(&self, account_id: &AccountId) -> Result<i64> {
        let mut conn = self.scope.connection().await?;

        let row = sqlx::query(
            "SELECT count(*) AS count FROM feeds WHERE account_id = $1",
        )
        .bind(account_id.as_str())
        .fetch_one(&mut *conn)
        .await
        .map_err(db_error("Failed to count feeds"))?;

        row.try_get("count")
            .map_err(db_error("Failed to decode feed count"))
    }

    async fn exists(&self, feed_id: FeedID) -> Result<bool> {
        let mut conn = self.scope.connection().await?;

        let row = sqlx::query(
            "SELECT EXISTS (SELECT 1 FROM feeds WHERE feed_id = $1) AS present",
        )
        .bind(feed_id.to_uuid())
        .fetch_one(&mut *conn)
        .await
        .map_err(db_error("Failed to check feed"))?;

        row.try_get("present")
            .map_err(db_error("Failed to decode feed existence"))
    }

    async fn delete(&self, feed_id: FeedID) -> Result<bool> {
        let mut conn = self.scope.connection().await?;

        // Likes and views cascade; bound images fall back to unbound.
        let result = sqlx::query("DELETE FROM feeds WHERE feed_id = $1")
            .bind(feed_id.to_uuid())
            .execute(&mut *conn)
            .await
            .map_err(db_error("Failed to delete feed"))?;

        Ok(result.rows_affected() > 0)
    }

    async fn get_account_info_counts(
        &self,
        account_id: &AccountId,
    ) -> Result<AccountInfoCounts> {
        let mut conn = self.scope.connection().await?;

        let row = sqlx::query(
            r#"
            SELECT
                (SELECT count(*) FROM followers WHERE follow_for = $1) AS followers_count,
                (SELECT count(*) FROM followers WHERE follower = $1) AS following_count,
                (SELECT count(*) FROM feeds WHERE account_id = $1) AS feeds_count
            "#,
        )
        .bind(account_id.as_str())
        .fetch_one(&mut *conn)
        .await
        .map_err(db_error("Failed to load account counts"))?;

        Ok(AccountInfoCounts {
            followers_count: row
                .try_get("followers_count")
                .map_err(db_error("Failed to decode followers count"))?,
            following_count: row
                .try_get("following_count")
                .map_err(db_error("Failed to decode following count"))?,
            feeds_count: row
                .try_get("feeds_count")
                .map_err(db_error("Failed to decode feeds count"))?,
        })
    }
}
