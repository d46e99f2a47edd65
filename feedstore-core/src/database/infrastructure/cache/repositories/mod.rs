pub mod feeds;
pub mod followers;
pub mod images;
pub mod likes;
pub mod views;

pub use feeds::CacheFeedsRepository;
pub use followers::CacheFollowersRepository;
pub use images::CacheImagesRepository;
pub use likes::CacheLikesRepository;
pub use views::CacheViewsRepository;

use chrono::{DateTime, Utc};
use feedstore_model::{
    AccountId, Feed, FeedID, Image, ImageID, Page, Pagination,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::keys::CacheKeys;
use super::scope::CacheScope;
use crate::error::{CoreError, Result};

/// Stored shape of a feed. Images and counters are derived on read.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct FeedRecord {
    pub feed_id: FeedID,
    pub account_id: AccountId,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<&Feed> for FeedRecord {
    fn from(feed: &Feed) -> Self {
        Self {
            feed_id: feed.feed_id,
            account_id: feed.account_id.clone(),
            text: feed.text.clone(),
            created_at: feed.created_at,
            updated_at: feed.updated_at,
        }
    }
}

pub(crate) fn parse_uuid(key: &str, member: &str) -> Result<Uuid> {
    Uuid::parse_str(member).map_err(|e| {
        CoreError::Cache(format!("Corrupt member {member:?} in {key}: {e}"))
    })
}

pub(crate) async fn load_feed_record(
    scope: &CacheScope,
    feed_id: FeedID,
) -> Result<Option<FeedRecord>> {
    scope.get_record(&CacheKeys::feed(feed_id)).await
}

/// Builds the full read model of a stored feed for `viewer`.
pub(crate) async fn hydrate_feed(
    scope: &CacheScope,
    record: FeedRecord,
    viewer: Option<&AccountId>,
) -> Result<Feed> {
    let feed_id = record.feed_id;

    let images_key = CacheKeys::feed_images(feed_id);
    let image_keys = scope
        .smembers(&images_key)
        .await?
        .iter()
        .map(|member| {
            parse_uuid(&images_key, member)
                .map(|id| CacheKeys::image(ImageID(id)))
        })
        .collect::<Result<Vec<_>>>()?;

    // Set membership is maintained outside the image record, so only trust
    // records that still point back at this feed.
    let images = scope
        .get_records::<Image>(&image_keys)
        .await?
        .into_iter()
        .flatten()
        .filter(|image| image.feed_id == Some(feed_id))
        .collect();

    let likes_count =
        scope.smembers(&CacheKeys::feed_likes(feed_id)).await?.len();
    let views_count =
        scope.smembers(&CacheKeys::feed_views(feed_id)).await?.len();

    let (has_followed, has_liked) = match viewer {
        Some(viewer) => (
            scope
                .exists(&CacheKeys::follower(viewer, &record.account_id))
                .await?,
            scope.exists(&CacheKeys::like(feed_id, viewer)).await?,
        ),
        None => (false, false),
    };

    let mut feed = Feed::new(feed_id, record.account_id, record.text)
        .with_images(images);
    feed.created_at = record.created_at;
    feed.updated_at = record.updated_at;
    feed.likes_count = likes_count as i64;
    feed.views_count = views_count as i64;
    feed.has_followed = has_followed;
    feed.has_liked = has_liked;
    Ok(feed)
}

/// Applies the window to an already sorted list and reports its full size.
pub(crate) fn paginate<T>(items: Vec<T>, pagination: Pagination) -> Page<T> {
    let pagination = pagination.clamped();
    let total_count = items.len() as i64;
    let items = items
        .into_iter()
        .skip(pagination.offset as usize)
        .take(pagination.limit as usize)
        .collect();
    Page::new(items, total_count)
}
