use std::sync::Arc;

use feedstore_model::{AccountId, AccountInfoCounts, Follower, Page, Pagination};
use tracing::{debug, instrument, warn};

use super::requests::{Follow, Unfollow};
use crate::database::unit_of_work::{UnitOfWorkFactory, scoped};
use crate::error::{CoreError, Result};

#[derive(Clone, Debug)]
pub struct FollowerService {
    uow: Arc<dyn UnitOfWorkFactory>,
}

impl FollowerService {
    pub fn new(uow: Arc<dyn UnitOfWorkFactory>) -> Self {
        Self { uow }
    }

    /// Creates the follow edge, or returns the existing one unchanged.
    #[instrument(skip(self))]
    pub async fn follow(&self, request: Follow) -> Result<Follower> {
        let edge = Follower::new(request.follower, request.follow_for);
        if edge.is_self_follow() {
            return Err(CoreError::InvariantViolation(format!(
                "{} cannot follow itself",
                edge.follower
            )));
        }

        let (follower, follow_for) =
            (edge.follower.clone(), edge.follow_for.clone());
        let outcome = scoped(self.uow.create(), move |uow| {
            Box::pin(async move {
                let (stored, created) =
                    uow.followers()?.insert_or_get(&edge).await?;
                if created {
                    debug!("{} now follows {}", stored.follower, stored.follow_for);
                }
                Ok::<_, CoreError>(stored)
            })
        })
        .await;

        match outcome {
            // Another writer committed the same edge first.
            Err(CoreError::Conflict(reason)) => {
                warn!("follow raced with a concurrent writer: {reason}");
                self.get_follow(follower, follow_for)
                    .await?
                    .ok_or(CoreError::Conflict(reason))
            }
            other => other,
        }
    }

    /// Removes the edge if present. Returns whether anything was removed.
    #[instrument(skip(self))]
    pub async fn unfollow(&self, request: Unfollow) -> Result<bool> {
        scoped(self.uow.create(), move |uow| {
            Box::pin(async move {
                uow.followers()?
                    .delete(&request.follower, &request.follow_for)
                    .await
            })
        })
        .await
    }

    #[instrument(skip(self))]
    pub async fn get_follow(
        &self,
        follower: AccountId,
        follow_for: AccountId,
    ) -> Result<Option<Follower>> {
        scoped(self.uow.create(), move |uow| {
            Box::pin(async move {
                uow.followers()?.get_follow(&follower, &follow_for).await
            })
        })
        .await
    }

    #[instrument(skip(self))]
    pub async fn get_followers(
        &self,
        account_id: AccountId,
        pagination: Pagination,
    ) -> Result<Page<Follower>> {
        scoped(self.uow.create(), move |uow| {
            Box::pin(async move {
                uow.followers()?.get_followers(&account_id, pagination).await
            })
        })
        .await
    }

    #[instrument(skip(self))]
    pub async fn get_following(
        &self,
        account_id: AccountId,
        pagination: Pagination,
    ) -> Result<Page<Follower>> {
        scoped(self.uow.create(), move |uow| {
            Box::pin(async move {
                uow.followers()?.get_following(&account_id, pagination).await
            })
        })
        .await
    }

    /// Follower, following and feed counts of one account.
    #[instrument(skip(self))]
    pub async fn get_account_info(
        &self,
        account_id: AccountId,
    ) -> Result<AccountInfoCounts> {
        scoped(self.uow.create(), move |uow| {
            Box::pin(async move {
                uow.feeds()?.get_account_info_counts(&account_id).await
            })
        })
        .await
    }
}
