use std::sync::Arc;

use async_trait::async_trait;
use feedstore_model::{AccountId, Follower, Page, Pagination};

use super::paginate;
use crate::database::infrastructure::cache::{keys::CacheKeys, scope::CacheScope};
use crate::database::ports::followers::FollowersRepository;
use crate::error::{CoreError, Result};

#[derive(Clone, Debug)]
pub struct CacheFollowersRepository {
    scope: Arc<CacheScope>,
}

impl CacheFollowersRepository {
    pub(crate) fn new(scope: Arc<CacheScope>) -> Self {
        Self { scope }
    }

    fn stage(&self, edge: &Follower) -> Result<()> {
        self.scope.put_record(
            CacheKeys::follower(&edge.follower, &edge.follow_for),
            edge,
        )?;
        self.scope.sadd(
            CacheKeys::followers_set(&edge.follow_for),
            edge.follower.to_string(),
        );
        self.scope.sadd(
            CacheKeys::following_set(&edge.follower),
            edge.follow_for.to_string(),
        );
        Ok(())
    }

    async fn load_page(
        &self,
        keys: Vec<String>,
        pagination: Pagination,
    ) -> Result<Page<Follower>> {
        let mut edges: Vec<Follower> = self
            .scope
            .get_records::<Follower>(&keys)
            .await?
            .into_iter()
            .flatten()
            .collect();
        edges.sort_by(|a, b| {
            b.followed_at
                .cmp(&a.followed_at)
                .then_with(|| a.follower.cmp(&b.follower))
                .then_with(|| a.follow_for.cmp(&b.follow_for))
        });
        Ok(paginate(edges, pagination))
    }
}

#[async_trait]
impl FollowersRepository for CacheFollowersRepository {
    async fn add(&self, edge: &Follower) -> Result<()> {
        if self.has_follow(&edge.follower, &edge.follow_for).await? {
            return Err(CoreError::Conflict(format!(
                "{} already follows {}",
                edge.follower, edge.follow_for
            )));
        }
        self.stage(edge)
    }

    async fn insert_or_get(&self, edge: &Follower) -> Result<(Follower, bool)> {
        if let Some(existing) =
            self.get_follow(&edge.follower, &edge.follow_for).await?
        {
            return Ok((existing, false));
        }
        self.stage(edge)?;
        Ok((edge.clone(), true))
    }

    async fn delete(
        &self,
        follower: &AccountId,
        follow_for: &AccountId,
    ) -> Result<bool> {
        if !self.has_follow(follower, follow_for).await? {
            return Ok(false);
        }

        self.scope.delete(CacheKeys::follower(follower, follow_for));
        self.scope
            .srem(CacheKeys::followers_set(follow_for), follower.to_string());
        self.scope
            .srem(CacheKeys::following_set(follower), follow_for.to_string());
        Ok(true)
    }

    async fn has_follow(
        &self,
        follower: &AccountId,
        follow_for: &AccountId,
    ) -> Result<bool> {
        self.scope
            .exists(&CacheKeys::follower(follower, follow_for))
            .await
    }

    async fn get_follow(
        &self,
        follower: &AccountId,
        follow_for: &AccountId,
    ) -> Result<Option<Follower>> {
        self.scope
            .get_record(&CacheKeys::follower(follower, follow_for))
            .await
    }

    async fn get_followers(
        &self,
        account_id: &AccountId,
        pagination: Pagination,
    ) -> Result<Page<Follower>> {
        let keys = self
            .scope
            .smembers(&CacheKeys::followers_set(account_id))
            .await?
            .into_iter()
            .map(|follower| {
                CacheKeys::follower(&AccountId::from_trusted(follower), account_id)
            })
            .collect();
        self.load_page(keys, pagination).await
    }

    async fn get_following(
        &self,
        account_id: &AccountId,
        pagination: Pagination,
    ) -> Result<Page<Follower>> {
        let keys = self
            .scope
            .smembers(&CacheKeys::following_set(account_id))
            .await?
            .into_iter()
            .map(|follow_for| {
                CacheKeys::follower(account_id, &AccountId::from_trusted(follow_for))
            })
            .collect();
        self.load_page(keys, pagination).await
    }

    async fn count_followers(&self, account_id: &AccountId) -> Result<i64> {
        let members = self
            .scope
            .smembers(&CacheKeys::followers_set(account_id))
            .await?;
        Ok(members.len() as i64)
    }

    async fn count_following(&self, account_id: &AccountId) -> Result<i64> {
        let members = self
            .scope
            .smembers(&CacheKeys::following_set(account_id))
            .await?;
        Ok(members.len() as i64)
    }
}
