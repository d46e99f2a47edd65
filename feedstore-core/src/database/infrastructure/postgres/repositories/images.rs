use std::collections::HashSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use feedstore_model::{Image, ImageID};
use sqlx::Row;
use uuid::Uuid;

use super::{image_from_row, uuids};
use crate::database::infrastructure::postgres::scope::PgScope;
use crate::database::ports::images::ImagesRepository;
use crate::error::{CoreError, Result, pg::db_error};

#[derive(Clone, Debug)]
pub struct PostgresImagesRepository {
    scope: PgScope,
}

impl PostgresImagesRepository {
    pub(crate) fn new(scope: PgScope) -> Self {
        Self { scope }
    }
}

#[async_trait]
impl ImagesRepository for PostgresImagesRepository {
    async fn add(&self, image: &Image) -> Result<()> {
        let mut conn = self.scope.connection().await?;

        let result = sqlx::query(
            r#"
            INSERT INTO images (
                image_id, uploader, url, feed_id, blurhash, uploaded_at, "order"
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (image_id) DO NOTHING
            "#,
        )
        .bind(image.image_id.to_uuid())
        .bind(image.uploader.as_str())
        .bind(&image.url)
        .bind(image.feed_id.map(|id| id.to_uuid()))
        .bind(&image.blurhash)
        .bind(image.uploaded_at)
        .bind(image.order)
        .execute(&mut *conn)
        .await
        .map_err(db_error("Failed to insert image"))?;

        if result.rows_affected() == 0 {
            return Err(CoreError::Conflict(format!(
                "image {} already exists",
                image.image_id
            )));
        }
        Ok(())
    }

    async fn get_by_id(&self, image_id: ImageID) -> Result<Option<Image>> {
        let mut conn = self.scope.connection().await?;

        let row = sqlx::query(
            r#"
            SELECT image_id, uploader, url, feed_id, blurhash, uploaded_at, "order"
            FROM images
            WHERE image_id = $1
            "#,
        )
        .bind(image_id.to_uuid())
        .fetch_optional(&mut *conn)
        .await
        .map_err(db_error("Failed to load image"))?;

        row.as_ref().map(image_from_row).transpose()
    }

    async fn get_many(&self, image_ids: &[ImageID]) -> Result<Vec<Image>> {
        if image_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut conn = self.scope.connection().await?;
        let rows = sqlx::query(
            r#"
            SELECT i.image_id, i.uploader, i.url, i.feed_id, i.blurhash,
                   i.uploaded_at, i."order"
            FROM unnest($1::uuid[]) WITH ORDINALITY AS req(image_id, ord)
            JOIN images i ON i.image_id = req.image_id
            ORDER BY req.ord
            "#,
        )
        .bind(uuids(image_ids.iter().copied()))
        .fetch_all(&mut *conn)
        .await
        .map_err(db_error("Failed to load images"))?;

        rows.iter().map(image_from_row).collect()
    }

    async fn update(&self, images: &[Image]) -> Result<()> {
        if images.is_empty() {
            return Ok(());
        }

        let ids = uuids(images.iter().map(|i| i.image_id));
        let uploaders: Vec<&str> =
            images.iter().map(|i| i.uploader.as_str()).collect();
        let urls: Vec<&str> = images.iter().map(|i| i.url.as_str()).collect();
        let feed_ids: Vec<Option<Uuid>> = images
            .iter()
            .map(|i| i.feed_id.map(|id| id.to_uuid()))
            .collect();
        let blurhashes: Vec<Option<String>> =
            images.iter().map(|i| i.blurhash.clone()).collect();
        let uploaded_at: Vec<DateTime<Utc>> =
            images.iter().map(|i| i.uploaded_at).collect();
        let orders: Vec<i32> = images.iter().map(|i| i.order).collect();

        let mut conn = self.scope.connection().await?;
        let rows = sqlx::query(
            r#"
            UPDATE images AS i
            SET uploader = u.uploader,
                url = u.url,
                feed_id = u.feed_id,
                blurhash = u.blurhash,
                uploaded_at = u.uploaded_at,
                "order" = u.ord
            FROM unnest(
                $1::uuid[], $2::text[], $3::text[], $4::uuid[], $5::text[],
                $6::timestamptz[], $7::int4[]
            ) AS u(image_id, uploader, url, feed_id, blurhash, uploaded_at, ord)
            WHERE i.image_id = u.image_id
            RETURNING i.image_id
            "#,
        )
        .bind(&ids)
        .bind(&uploaders)
        .bind(&urls)
        .bind(&feed_ids)
        .bind(&blurhashes)
        .bind(&uploaded_at)
        .bind(&orders)
        .fetch_all(&mut *conn)
        .await
        .map_err(db_error("Failed to update images"))?;

        let mut updated = HashSet::with_capacity(rows.len());
        for row in &rows {
            let id: Uuid = row
                .try_get("image_id")
                .map_err(db_error("Failed to decode updated image id"))?;
            updated.insert(id);
        }

        if let Some(missing) = ids.iter().find(|id| !updated.contains(*id)) {
            return Err(CoreError::NotFound(format!(
                "image {missing} does not exist"
            )));
        }
        Ok(())
    }
}
