use std::sync::Arc;

use feedstore_model::{FeedID, Like, Page, Pagination};
use tracing::{debug, instrument};

use super::requests::{LikeFeed, UnlikeFeed};
use crate::database::unit_of_work::{UnitOfWork, UnitOfWorkFactory, scoped};
use crate::error::{CoreError, Result};

async fn ensure_feed(uow: &dyn UnitOfWork, feed_id: FeedID) -> Result<()> {
    if uow.feeds()?.exists(feed_id).await? {
        Ok(())
    } else {
        Err(CoreError::NotFound(format!("feed {feed_id} not found")))
    }
}

#[derive(Clone, Debug)]
pub struct LikeService {
    uow: Arc<dyn UnitOfWorkFactory>,
}

impl LikeService {
    pub fn new(uow: Arc<dyn UnitOfWorkFactory>) -> Self {
        Self { uow }
    }

    /// Likes a feed. Liking twice returns the first like.
    #[instrument(skip(self))]
    pub async fn like(&self, request: LikeFeed) -> Result<Like> {
        scoped(self.uow.create(), move |uow| {
            Box::pin(async move {
                ensure_feed(&*uow, request.feed_id).await?;
                let like = Like::new(request.feed_id, request.account_id);
                let (stored, created) =
                    uow.likes()?.insert_or_get(&like).await?;
                if created {
                    debug!("{} liked feed {}", stored.account_id, stored.feed_id);
                }
                Ok::<_, CoreError>(stored)
            })
        })
        .await
    }

    /// Removes a like. Unliking a feed that was never liked returns `false`.
    #[instrument(skip(self))]
    pub async fn unlike(&self, request: UnlikeFeed) -> Result<bool> {
        scoped(self.uow.create(), move |uow| {
            Box::pin(async move {
                ensure_feed(&*uow, request.feed_id).await?;
                uow.likes()?
                    .delete(request.feed_id, &request.account_id)
                    .await
            })
        })
        .await
    }

    #[instrument(skip(self))]
    pub async fn get_likes(
        &self,
        feed_id: FeedID,
        pagination: Pagination,
    ) -> Result<Page<Like>> {
        scoped(self.uow.create(), move |uow| {
            Box::pin(async move {
                uow.likes()?.get_by_feed_id(feed_id, pagination).await
            })
        })
        .await
    }
}
