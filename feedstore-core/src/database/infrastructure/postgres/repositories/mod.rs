pub mod feeds;
pub mod followers;
pub mod images;
pub mod likes;
pub mod views;

pub use feeds::PostgresFeedsRepository;
pub use followers::PostgresFollowersRepository;
pub use images::PostgresImagesRepository;
pub use likes::PostgresLikesRepository;
pub use views::PostgresViewsRepository;

use chrono::{DateTime, Utc};
use feedstore_model::{AccountId, FeedID, Follower, Image, ImageID, Like};
use sqlx::{Row, postgres::PgRow};
use uuid::Uuid;

use crate::error::{CoreError, Result};

fn column<'r, T>(row: &'r PgRow, name: &str) -> Result<T>
where
    T: sqlx::Decode<'r, sqlx::Postgres> + sqlx::Type<sqlx::Postgres>,
{
    row.try_get(name).map_err(|e| {
        CoreError::Database(format!("Failed to decode column {name}: {e}"))
    })
}

pub(crate) fn image_from_row(row: &PgRow) -> Result<Image> {
    Ok(Image {
        image_id: ImageID(column::<Uuid>(row, "image_id")?),
        uploader: AccountId::from_trusted(column(row, "uploader")?),
        url: column(row, "url")?,
        feed_id: column::<Option<Uuid>>(row, "feed_id")?.map(FeedID),
        blurhash: column(row, "blurhash")?,
        uploaded_at: column::<DateTime<Utc>>(row, "uploaded_at")?,
        order: column(row, "order")?,
    })
}

pub(crate) fn follower_from_row(row: &PgRow) -> Result<Follower> {
    Ok(Follower {
        follower: AccountId::from_trusted(column(row, "follower")?),
        follow_for: AccountId::from_trusted(column(row, "follow_for")?),
        followed_at: column(row, "followed_at")?,
    })
}

pub(crate) fn like_from_row(row: &PgRow) -> Result<Like> {
    Ok(Like {
        feed_id: FeedID(column::<Uuid>(row, "feed_id")?),
        account_id: AccountId::from_trusted(column(row, "account_id")?),
        liked_at: column(row, "liked_at")?,
    })
}

/// Reads the `total_count` column of a `total LEFT JOIN page` result.
///
/// Every row carries the total; an empty page yields one row whose page
/// columns are all NULL.
pub(crate) fn total_from_rows(rows: &[PgRow]) -> Result<i64> {
    match rows.first() {
        Some(row) => column(row, "total_count"),
        None => Ok(0),
    }
}

pub(crate) fn uuids<I, T>(ids: I) -> Vec<Uuid>
where
    I: IntoIterator<Item = T>,
    T: AsRef<Uuid>,
{
    ids.into_iter().map(|id| *id.as_ref()).collect()
}
