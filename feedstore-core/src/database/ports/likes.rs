use async_trait::async_trait;
use feedstore_model::{AccountId, FeedID, Like, Page, Pagination};

use crate::error::Result;

#[async_trait]
pub trait LikesRepository: Send + Sync {
    /// Fails with `Conflict` on a duplicate pair and `NotFound` when the feed
    /// does not exist.
    async fn add(&self, like: &Like) -> Result<()>;

    async fn insert_or_get(&self, like: &Like) -> Result<(Like, bool)>;

    async fn delete(&self, feed_id: FeedID, account_id: &AccountId)
    -> Result<bool>;

    /// Most recent first.
    async fn get_by_feed_id(
        &self,
        feed_id: FeedID,
        pagination: Pagination,
    ) -> Result<Page<Like>>;

    async fn has_like(&self, feed_id: FeedID, account_id: &AccountId)
    -> Result<bool>;

    async fn count_by_feed_id(&self, feed_id: FeedID) -> Result<i64>;

    async fn get_by_feed_id_and_account_id(
        &self,
        feed_id: FeedID,
        account_id: &AccountId,
    ) -> Result<Option<Like>>;
}
