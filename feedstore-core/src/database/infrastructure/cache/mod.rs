//! Cache-backed infrastructure: the repositories run on a plain key-value
//! store (Redis in production, [`MemoryStore`] offline).
//!
//! Behaviour matches the PostgreSQL backend with these gaps:
//!
//! - cascades on feed delete, set maintenance and counters are computed by
//!   reading sets at call time, not by the store;
//! - uniqueness is check-then-act, so of two concurrent scopes inserting the
//!   same key the later commit wins instead of failing with `Conflict`;
//! - pagination sorts the full index in memory;
//! - `get_by_ids` and `get_account_feeds` fetch feed records in one `MGET`
//!   but hydrate each feed separately (image set, image records, like and
//!   view sets, viewer flags), so a page of N feeds costs about 5N round
//!   trips where PostgreSQL uses one statement.

pub mod keys;
pub mod memory;
#[cfg(feature = "redis")]
pub mod redis_store;
pub mod repositories;
pub mod scope;
pub mod store;
pub mod unit_of_work;

pub use keys::CacheKeys;
pub use memory::MemoryStore;
#[cfg(feature = "redis")]
pub use redis_store::RedisStore;
pub use scope::CacheScope;
pub use store::{KeyValueStore, WriteBatch, WriteOp};
pub use unit_of_work::{CacheUnitOfWork, CacheUnitOfWorkFactory};
