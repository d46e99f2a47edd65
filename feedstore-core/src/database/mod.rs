pub mod context;
pub mod infrastructure;
pub mod ports;
pub mod unit_of_work;

pub use context::{DatabaseContext, StorageBackend, StorageSettings};
pub use infrastructure::cache::{KeyValueStore, MemoryStore};
#[cfg(feature = "postgres")]
pub use infrastructure::postgres::{PoolSettings, PoolStats, PostgresDatabase};
#[cfg(feature = "redis")]
pub use infrastructure::cache::RedisStore;
pub use unit_of_work::{ScopeState, UnitOfWork, UnitOfWorkFactory, scoped};
