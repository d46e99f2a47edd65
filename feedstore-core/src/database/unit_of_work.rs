//! Transaction scope shared by every storage backend.
//!
//! A [`UnitOfWork`] binds the five repositories to one atomic scope. Callers
//! enter the scope, issue repository calls, and either commit or let
//! [`UnitOfWork::exit`] decide based on whether their work failed:
//!
//! ```text
//! Idle ──enter──▶ Entered ──commit──▶ Committed ──exit──▶ Closed
//!                    │                                    ▲
//!                    └──rollback / failed exit──▶ RolledBack
//! ```

use std::fmt;

use async_trait::async_trait;
use futures::future::BoxFuture;
use tracing::warn;

use crate::database::ports::{
    feeds::FeedsRepository, followers::FollowersRepository,
    images::ImagesRepository, likes::LikesRepository, views::ViewsRepository,
};
use crate::error::{CoreError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScopeState {
    Idle,
    Entered,
    Committed,
    RolledBack,
    Closed,
}

/// What a `commit()` or `rollback()` call should do given the current state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// The scope is entered and the outcome must be applied to storage.
    Apply,
    /// The scope already has an outcome; the call does nothing.
    AlreadyResolved,
}

impl ScopeState {
    pub fn is_resolved(self) -> bool {
        matches!(self, ScopeState::Committed | ScopeState::RolledBack)
    }

    pub fn ensure_can_enter(self) -> Result<()> {
        match self {
            ScopeState::Idle => Ok(()),
            other => Err(CoreError::ScopeState(format!(
                "cannot enter a unit of work in state {other}"
            ))),
        }
    }

    /// Repository access is only granted inside an entered, unresolved scope.
    pub fn ensure_active(self) -> Result<()> {
        match self {
            ScopeState::Entered => Ok(()),
            other => Err(CoreError::ScopeState(format!(
                "repositories are unavailable in state {other}"
            ))),
        }
    }

    pub fn resolution(self, action: &str) -> Result<Resolution> {
        match self {
            ScopeState::Entered => Ok(Resolution::Apply),
            ScopeState::Committed | ScopeState::RolledBack => {
                Ok(Resolution::AlreadyResolved)
            }
            ScopeState::Idle | ScopeState::Closed => {
                Err(CoreError::ScopeState(format!(
                    "cannot {action} a unit of work in state {self}"
                )))
            }
        }
    }
}

impl fmt::Display for ScopeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ScopeState::Idle => "idle",
            ScopeState::Entered => "entered",
            ScopeState::Committed => "committed",
            ScopeState::RolledBack => "rolled back",
            ScopeState::Closed => "closed",
        };
        f.write_str(label)
    }
}

/// One atomic transaction scope over the feed, image, follower, like and view
/// repositories.
///
/// A unit of work is single-use: once closed it cannot be entered again. Ask
/// the [`UnitOfWorkFactory`] for a fresh one per request.
#[async_trait]
pub trait UnitOfWork: Send + Sync {
    /// Acquires the underlying connection or session and opens the scope.
    ///
    /// If acquisition fails the scope stays `Idle` and holds nothing.
    async fn enter(&mut self) -> Result<()>;

    fn feeds(&self) -> Result<&dyn FeedsRepository>;
    fn images(&self) -> Result<&dyn ImagesRepository>;
    fn followers(&self) -> Result<&dyn FollowersRepository>;
    fn likes(&self) -> Result<&dyn LikesRepository>;
    fn views(&self) -> Result<&dyn ViewsRepository>;

    /// Persists every write issued since `enter`. A second call is a no-op.
    async fn commit(&mut self) -> Result<()>;

    /// Discards every write issued since `enter`. A no-op once resolved.
    async fn rollback(&mut self) -> Result<()>;

    /// Ends the scope: rolls back when `failed`, otherwise commits unless an
    /// outcome was already chosen, then releases the connection and closes.
    async fn exit(&mut self, failed: bool) -> Result<()>;

    fn state(&self) -> ScopeState;
}

pub trait UnitOfWorkFactory: Send + Sync + fmt::Debug {
    fn create(&self) -> Box<dyn UnitOfWork>;
}

/// Runs `work` inside `uow`: enters, runs, and exits with `failed` set from
/// the work's outcome.
///
/// An error from the work wins over an error raised while exiting.
pub async fn scoped<T, F>(mut uow: Box<dyn UnitOfWork>, work: F) -> Result<T>
where
    T: Send,
    F: for<'a> FnOnce(&'a mut dyn UnitOfWork) -> BoxFuture<'a, Result<T>>
        + Send,
{
    uow.enter().await?;

    let outcome = work(uow.as_mut()).await;
    let exit = uow.exit(outcome.is_err()).await;

    match (outcome, exit) {
        (Ok(value), Ok(())) => Ok(value),
        (Ok(_), Err(exit_err)) => Err(exit_err),
        (Err(err), Ok(())) => Err(err),
        (Err(err), Err(exit_err)) => {
            warn!("unit of work exit failed after error {err}: {exit_err}");
            Err(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_idle_scopes_can_be_entered() {
        assert!(ScopeState::Idle.ensure_can_enter().is_ok());
        for state in [
            ScopeState::Entered,
            ScopeState::Committed,
            ScopeState::RolledBack,
            ScopeState::Closed,
        ] {
            assert!(matches!(
                state.ensure_can_enter(),
                Err(CoreError::ScopeState(_))
            ));
        }
    }

    #[test]
    fn repositories_require_an_entered_scope() {
        assert!(ScopeState::Entered.ensure_active().is_ok());
        assert!(ScopeState::Idle.ensure_active().is_err());
        assert!(ScopeState::Committed.ensure_active().is_err());
        assert!(ScopeState::Closed.ensure_active().is_err());
    }

    #[test]
    fn resolving_twice_is_a_noop() {
        assert_eq!(
            ScopeState::Entered.resolution("commit").unwrap(),
            Resolution::Apply
        );
        assert_eq!(
            ScopeState::Committed.resolution("rollback").unwrap(),
            Resolution::AlreadyResolved
        );
        assert_eq!(
            ScopeState::RolledBack.resolution("commit").unwrap(),
            Resolution::AlreadyResolved
        );
        assert!(ScopeState::Idle.resolution("commit").is_err());
        assert!(ScopeState::Closed.resolution("rollback").is_err());
    }
}
