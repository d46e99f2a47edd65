use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use super::repositories::{
    CacheFeedsRepository, CacheFollowersRepository, CacheImagesRepository,
    CacheLikesRepository, CacheViewsRepository,
};
use super::scope::CacheScope;
use super::store::KeyValueStore;
use crate::database::ports::{
    feeds::FeedsRepository, followers::FollowersRepository,
    images::ImagesRepository, likes::LikesRepository, views::ViewsRepository,
};
use crate::database::unit_of_work::{
    Resolution, ScopeState, UnitOfWork, UnitOfWorkFactory,
};
use crate::error::Result;

#[derive(Clone)]
pub struct CacheUnitOfWorkFactory {
    store: Arc<dyn KeyValueStore>,
}

impl fmt::Debug for CacheUnitOfWorkFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheUnitOfWorkFactory")
            .field("store", &self.store)
            .finish()
    }
}

impl CacheUnitOfWorkFactory {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }
}

impl UnitOfWorkFactory for CacheUnitOfWorkFactory {
    fn create(&self) -> Box<dyn UnitOfWork> {
        Box::new(CacheUnitOfWork::new(Arc::clone(&self.store)))
    }
}

/// Unit of work over a [`KeyValueStore`].
///
/// Writes are buffered in a [`CacheScope`] and applied as one atomic batch
/// on commit. Uniqueness checks read committed state plus this scope's own
/// writes, so two concurrent scopes may both pass a check; the later commit
/// wins.
pub struct CacheUnitOfWork {
    state: ScopeState,
    scope: Arc<CacheScope>,
    feeds: CacheFeedsRepository,
    images: CacheImagesRepository,
    followers: CacheFollowersRepository,
    likes: CacheLikesRepository,
    views: CacheViewsRepository,
}

impl fmt::Debug for CacheUnitOfWork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheUnitOfWork")
            .field("state", &self.state)
            .field("scope", &self.scope)
            .finish()
    }
}

impl CacheUnitOfWork {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        let scope = Arc::new(CacheScope::new(store));
        Self {
            state: ScopeState::Idle,
            feeds: CacheFeedsRepository::new(Arc::clone(&scope)),
            images: CacheImagesRepository::new(Arc::clone(&scope)),
            followers: CacheFollowersRepository::new(Arc::clone(&scope)),
            likes: CacheLikesRepository::new(Arc::clone(&scope)),
            views: CacheViewsRepository::new(Arc::clone(&scope)),
            scope,
        }
    }

    async fn apply_staged(&mut self) -> Result<()> {
        let batch = self.scope.take_batch();
        let ops = batch.len();
        self.state = ScopeState::Committed;
        self.scope.store().apply(batch).await?;
        debug!("unit of work committed ({} operations)", ops);
        Ok(())
    }

    fn discard_staged(&mut self) {
        let dropped = self.scope.discard();
        self.state = ScopeState::RolledBack;
        debug!("unit of work rolled back ({} operations discarded)", dropped);
    }
}

#[async_trait]
impl UnitOfWork for CacheUnitOfWork {
    async fn enter(&mut self) -> Result<()> {
        self.state.ensure_can_enter()?;
        self.scope.store().ping().await?;
        self.state = ScopeState::Entered;
        debug!("unit of work entered");
        Ok(())
    }

    fn feeds(&self) -> Result<&dyn FeedsRepository> {
        self.state.ensure_active()?;
        Ok(&self.feeds)
    }

    fn images(&self) -> Result<&dyn ImagesRepository> {
        self.state.ensure_active()?;
        Ok(&self.images)
    }

    fn followers(&self) -> Result<&dyn FollowersRepository> {
        self.state.ensure_active()?;
        Ok(&self.followers)
    }

    fn likes(&self) -> Result<&dyn LikesRepository> {
        self.state.ensure_active()?;
        Ok(&self.likes)
    }

    fn views(&self) -> Result<&dyn ViewsRepository> {
        self.state.ensure_active()?;
        Ok(&self.views)
    }

    async fn commit(&mut self) -> Result<()> {
        match self.state.resolution("commit")? {
            Resolution::Apply => self.apply_staged().await,
            Resolution::AlreadyResolved => Ok(()),
        }
    }

    async fn rollback(&mut self) -> Result<()> {
        match self.state.resolution("roll back")? {
            Resolution::Apply => {
                self.discard_staged();
                Ok(())
            }
            Resolution::AlreadyResolved => Ok(()),
        }
    }

    async fn exit(&mut self, failed: bool) -> Result<()> {
        let outcome = match self.state {
            ScopeState::Idle | ScopeState::Closed => return Ok(()),
            ScopeState::Entered if failed => {
                self.discard_staged();
                Ok(())
            }
            ScopeState::Entered => self.apply_staged().await,
            ScopeState::Committed | ScopeState::RolledBack => Ok(()),
        };

        self.scope.discard();
        self.state = ScopeState::Closed;
        debug!("unit of work closed");
        outcome
    }

    fn state(&self) -> ScopeState {
        self.state
    }
}
