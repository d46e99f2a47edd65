//! # Feedstore Core
//!
//! Transactional persistence for a social feed service: feeds with ordered
//! images, follower edges, likes and views.
//!
//! ## Layout
//!
//! - [`database::ports`]: repository traits, one per entity
//! - [`database::unit_of_work`]: the scope that groups repository calls into
//!   one atomic commit
//! - [`database::infrastructure`]: the PostgreSQL backend and the key-value
//!   cache backend (Redis or in-process memory)
//! - [`application`]: command and query handlers built on a
//!   [`UnitOfWorkFactory`](database::UnitOfWorkFactory)
//!
//! ## Feature Flags
//!
//! - `postgres` (default): relational backend via SQLx
//! - `redis` (default): Redis-backed cache store
//! - `postgres-tests`: runs the `#[sqlx::test]` suites against `DATABASE_URL`
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use feedstore_core::application::{FeedService, requests::PostFeed};
//! use feedstore_core::database::{DatabaseContext, MemoryStore};
//! use feedstore_model::AccountId;
//!
//! # async fn run() -> feedstore_core::Result<()> {
//! let ctx = DatabaseContext::from_store(Arc::new(MemoryStore::new()));
//! let feeds = FeedService::new(ctx.unit_of_work_factory());
//!
//! let feed = feeds
//!     .post_feed(PostFeed {
//!         account_id: AccountId::new("alice")?,
//!         text: "hello".into(),
//!         images: Vec::new(),
//!     })
//!     .await?;
//! println!("posted {}", feed.feed_id);
//! # Ok(())
//! # }
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![allow(missing_docs)]

/// Command and query handlers
pub mod application;

/// Repository ports, unit of work and storage backends
pub mod database;

/// Error types shared by every layer
pub mod error;

pub use error::{CoreError, Result};

#[cfg(feature = "postgres")]
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");
