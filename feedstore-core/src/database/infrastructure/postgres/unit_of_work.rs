use std::fmt;

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{debug, warn};

use super::repositories::{
    PostgresFeedsRepository, PostgresFollowersRepository,
    PostgresImagesRepository, PostgresLikesRepository,
    PostgresViewsRepository,
};
use super::scope::PgScope;
use crate::database::ports::{
    feeds::FeedsRepository, followers::FollowersRepository,
    images::ImagesRepository, likes::LikesRepository, views::ViewsRepository,
};
use crate::database::unit_of_work::{
    Resolution, ScopeState, UnitOfWork, UnitOfWorkFactory,
};
use crate::error::{CoreError, Result, pg::db_error};

#[derive(Clone)]
pub struct PostgresUnitOfWorkFactory {
    pool: PgPool,
}

impl fmt::Debug for PostgresUnitOfWorkFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PostgresUnitOfWorkFactory")
            .field("pool_size", &self.pool.size())
            .finish()
    }
}

impl PostgresUnitOfWorkFactory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl UnitOfWorkFactory for PostgresUnitOfWorkFactory {
    fn create(&self) -> Box<dyn UnitOfWork> {
        Box::new(PostgresUnitOfWork::new(self.pool.clone()))
    }
}

/// Unit of work backed by one `sqlx` transaction.
///
/// The five repositories share the transaction through [`PgScope`], so
/// every statement issued between `enter` and `commit` lands in the same
/// database transaction.
pub struct PostgresUnitOfWork {
    pool: PgPool,
    state: ScopeState,
    scope: PgScope,
    feeds: PostgresFeedsRepository,
    images: PostgresImagesRepository,
    followers: PostgresFollowersRepository,
    likes: PostgresLikesRepository,
    views: PostgresViewsRepository,
}

impl fmt::Debug for PostgresUnitOfWork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PostgresUnitOfWork")
            .field("state", &self.state)
            .field("scope", &self.scope)
            .finish()
    }
}

impl PostgresUnitOfWork {
    pub fn new(pool: PgPool) -> Self {
        let scope = PgScope::default();
        Self {
            pool,
            state: ScopeState::Idle,
            feeds: PostgresFeedsRepository::new(scope.clone()),
            images: PostgresImagesRepository::new(scope.clone()),
            followers: PostgresFollowersRepository::new(scope.clone()),
            likes: PostgresLikesRepository::new(scope.clone()),
            views: PostgresViewsRepository::new(scope.clone()),
            scope,
        }
    }

    async fn finish(&mut self, commit: bool) -> Result<()> {
        let Some(tx) = self.scope.take().await else {
            return Err(CoreError::ScopeState(
                "transaction was already released".into(),
            ));
        };

        if commit {
            // Marked resolved before the await: a failed COMMIT still ends
            // the transaction server-side.
            self.state = ScopeState::Committed;
            tx.commit().await.map_err(db_error("Failed to commit"))?;
            debug!("unit of work committed");
        } else {
            self.state = ScopeState::RolledBack;
            tx.rollback()
                .await
                .map_err(db_error("Failed to roll back"))?;
            debug!("unit of work rolled back");
        }
        Ok(())
    }
}

#[async_trait]
impl UnitOfWork for PostgresUnitOfWork {
    async fn enter(&mut self) -> Result<()> {
        self.state.ensure_can_enter()?;

        let tx = self
            .pool
            .begin()
            .await
            .map_err(db_error("Failed to start transaction"))?;
        self.scope.install(tx).await;
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
            Resolution::Apply => self.finish(true).await,
            Resolution::AlreadyResolved => Ok(()),
        }
    }

    async fn rollback(&mut self) -> Result<()> {
        match self.state.resolution("roll back")? {
            Resolution::Apply => self.finish(false).await,
            Resolution::AlreadyResolved => Ok(()),
        }
    }

    async fn exit(&mut self, failed: bool) -> Result<()> {
        let outcome = match self.state {
            ScopeState::Idle | ScopeState::Closed => return Ok(()),
            ScopeState::Entered => self.finish(!failed).await,
            ScopeState::Committed | ScopeState::RolledBack => Ok(()),
        };

        // Drops any transaction a failed commit left behind.
        if self.scope.take().await.is_some() {
            warn!("unit of work closed with a live transaction; rolled back");
        }
        self.state = ScopeState::Closed;
        debug!("unit of work closed");
        outcome
    }

    fn state(&self) -> ScopeState {
        self.state
    }
}
