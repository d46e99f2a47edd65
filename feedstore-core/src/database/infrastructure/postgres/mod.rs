//! PostgreSQL infrastructure adapters implementing the database ports.

pub mod database;
pub mod repositories;
mod scope;
pub mod unit_of_work;

pub use database::{PoolSettings, PoolStats, PostgresDatabase};
pub use repositories::{
    PostgresFeedsRepository, PostgresFollowersRepository,
    PostgresImagesRepository, PostgresLikesRepository,
    PostgresViewsRepository,
};
pub use unit_of_work::{PostgresUnitOfWork, PostgresUnitOfWorkFactory};
