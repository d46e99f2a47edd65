use async_trait::async_trait;
use feedstore_model::{AccountId, AccountInfoCounts, Feed, FeedID, Page, Pagination};

use crate::error::Result;

/// Repository port for feeds and their image bindings.
///
/// Reads compute `likes_count`, `views_count`, `has_followed` and `has_liked`
/// relative to `viewer`; with no viewer the flags are `false`.
#[async_trait]
pub trait FeedsRepository: Send + Sync {
    /// Inserts the feed row only. Fails with `Conflict` if the id exists.
    async fn add(&self, feed: &Feed) -> Result<()>;

    /// Overwrites text and timestamps, clears `feed_id` on images bound to the
    /// feed but missing from `feed.images`, and upserts the listed images as
    /// bound with their `order`. Fails with `NotFound` if the feed is absent.
    async fn update(&self, feed: &Feed) -> Result<()>;

    async fn get_by_id(
        &self,
        feed_id: FeedID,
        viewer: Option<&AccountId>,
    ) -> Result<Option<Feed>>;

    /// Results follow the requested order; unknown ids are skipped.
    async fn get_by_ids(
        &self,
        feed_ids: &[FeedID],
        viewer: Option<&AccountId>,
    ) -> Result<Vec<Feed>>;

    /// Newest first, ties broken by descending feed id.
    async fn get_account_feeds(
        &self,
        account_id: &AccountId,
        pagination: Pagination,
        viewer: Option<&AccountId>,
    ) -> Result<Page<Feed>>;

    async fn count_feeds(&self, account_id: &AccountId) -> Result<i64>;

    async fn exists(&self, feed_id: FeedID) -> Result<bool>;

    /// Removes the feed along with its likes and views and unbinds its
    /// images. Returns `false` when there was nothing to delete.
    async fn delete(&self, feed_id: FeedID) -> Result<bool>;

    async fn get_account_info_counts(
        &self,
        account_id: &AccountId,
    ) -> Result<AccountInfoCounts>;
}
