use async_trait::async_trait;
use feedstore_model::View;

use crate::error::Result;

/// Append-only view log.
#[async_trait]
pub trait ViewsRepository: Send + Sync {
    /// Records each `(feed_id, account_id)` pair at most once, duplicates in
    /// the same batch included, and returns how many were new.
    ///
    /// A view of a missing feed fails the whole batch with `NotFound`.
    async fn batch_add(&self, views: &[View]) -> Result<u64>;
}
