use std::sync::Arc;

use async_trait::async_trait;
use feedstore_model::{AccountId, FeedID, Like, Page, Pagination};

use super::paginate;
use crate::database::infrastructure::cache::{keys::CacheKeys, scope::CacheScope};
use crate::database::ports::likes::LikesRepository;
use crate::error::{CoreError, Result};

#[derive(Clone, Debug)]
pub struct CacheLikesRepository {
    scope: Arc<CacheScope>,
}

impl CacheLikesRepository {
    pub(crate) fn new(scope: Arc<CacheScope>) -> Self {
        Self { scope }
    }

    async fn ensure_feed(&self, feed_id: FeedID) -> Result<()> {
        if self.scope.exists(&CacheKeys::feed(feed_id)).await? {
            Ok(())
        } else {
            Err(CoreError::NotFound(format!("feed {feed_id} does not exist")))
        }
    }

    fn stage(&self, like: &Like) -> Result<()> {
        self.scope
            .put_record(CacheKeys::like(like.feed_id, &like.account_id), like)?;
        self.scope.sadd(
            CacheKeys::feed_likes(like.feed_id),
            like.account_id.to_string(),
        );
        Ok(())
    }
}

#[async_trait]
impl LikesRepository for CacheLikesRepository {
    async fn add(&self, like: &Like) -> Result<()> {
        self.ensure_feed(like.feed_id).await?;
        if self.has_like(like.feed_id, &like.account_id).await? {
            return Err(CoreError::Conflict(format!(
                "{} already liked feed {}",
                like.account_id, like.feed_id
            )));
        }
        self.stage(like)
    }

    async fn insert_or_get(&self, like: &Like) -> Result<(Like, bool)> {
        self.ensure_feed(like.feed_id).await?;
        if let Some(existing) = self
            .get_by_feed_id_and_account_id(like.feed_id, &like.account_id)
            .await?
        {
            return Ok((existing, false));
        }
        self.stage(like)?;
        Ok((like.clone(), true))
    }

    async fn delete(
        &self,
        feed_id: FeedID,
        account_id: &AccountId,
    ) -> Result<bool> {
        if !self.has_like(feed_id, account_id).await? {
            return Ok(false);
        }

        self.scope.delete(CacheKeys::like(feed_id, account_id));
        self.scope
            .srem(CacheKeys::feed_likes(feed_id), account_id.to_string());
        Ok(true)
    }

    async fn get_by_feed_id(
        &self,
        feed_id: FeedID,
        pagination: Pagination,
    ) -> Result<Page<Like>> {
        let keys: Vec<String> = self
            .scope
            .smembers(&CacheKeys::feed_likes(feed_id))
            .await?
            .into_iter()
            .map(|account| {
                CacheKeys::like(feed_id, &AccountId::from_trusted(account))
            })
            .collect();

        let mut likes: Vec<Like> = self
            .scope
            .get_records::<Like>(&keys)
            .await?
            .into_iter()
            .flatten()
            .collect();
        likes.sort_by(|a, b| {
            b.liked_at
                .cmp(&a.liked_at)
                .then_with(|| a.account_id.cmp(&b.account_id))
        });
        Ok(paginate(likes, pagination))
    }

    async fn has_like(
        &self,
        feed_id: FeedID,
        account_id: &AccountId,
    ) -> Result<bool> {
        self.scope
            .exists(&CacheKeys::like(feed_id, account_id))
            .await
    }

    async fn count_by_feed_id(&self, feed_id: FeedID) -> Result<i64> {
        let members =
            self.scope.smembers(&CacheKeys::feed_likes(feed_id)).await?;
        Ok(members.len() as i64)
    }

    async fn get_by_feed_id_and_account_id(
        &self,
        feed_id: FeedID,
        account_id: &AccountId,
    ) -> Result<Option<Like>> {
        self.scope
            .get_record(&CacheKeys::like(feed_id, account_id))
            .await
    }
}
