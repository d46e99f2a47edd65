use async_trait::async_trait;
use feedstore_model::{AccountId, Follower, Page, Pagination};

use crate::error::Result;

#[async_trait]
pub trait FollowersRepository: Send + Sync {
    /// Plain insert. A duplicate `(follower, follow_for)` pair fails with
    /// `Conflict`.
    async fn add(&self, edge: &Follower) -> Result<()>;

    /// Inserts the edge unless it exists and returns the stored record along
    /// with whether this call created it.
    async fn insert_or_get(&self, edge: &Follower) -> Result<(Follower, bool)>;

    async fn delete(
        &self,
        follower: &AccountId,
        follow_for: &AccountId,
    ) -> Result<bool>;

    async fn has_follow(
        &self,
        follower: &AccountId,
        follow_for: &AccountId,
    ) -> Result<bool>;

    async fn get_follow(
        &self,
        follower: &AccountId,
        follow_for: &AccountId,
    ) -> Result<Option<Follower>>;

    /// Accounts following `account_id`, most recent first.
    async fn get_followers(
        &self,
        account_id: &AccountId,
        pagination: Pagination,
    ) -> Result<Page<Follower>>;

    /// Accounts `account_id` follows, most recent first.
    async fn get_following(
        &self,
        account_id: &AccountId,
        pagination: Pagination,
    ) -> Result<Page<Follower>>;

    async fn count_followers(&self, account_id: &AccountId) -> Result<i64>;

    async fn count_following(&self, account_id: &AccountId) -> Result<i64>;
}
