use std::fmt;
use std::sync::Arc;

use tracing::info;

#[cfg(feature = "postgres")]
use crate::database::infrastructure::postgres::{PoolSettings, PostgresDatabase};
#[cfg(feature = "redis")]
use crate::database::infrastructure::cache::RedisStore;
use crate::database::infrastructure::cache::{
    CacheUnitOfWorkFactory, KeyValueStore, MemoryStore,
};
use crate::database::unit_of_work::UnitOfWorkFactory;
use crate::error::Result;

/// Which backend to build and how to reach it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageSettings {
    #[cfg(feature = "postgres")]
    Postgres { url: String, pool: PoolSettings },
    #[cfg(feature = "redis")]
    Redis { url: String },
    /// Process-local store; data is lost on shutdown.
    Memory,
}

/// The live backend behind a [`DatabaseContext`].
#[derive(Clone)]
pub enum StorageBackend {
    #[cfg(feature = "postgres")]
    Postgres(Arc<PostgresDatabase>),
    KeyValue(Arc<dyn KeyValueStore>),
}

impl fmt::Debug for StorageBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            #[cfg(feature = "postgres")]
            StorageBackend::Postgres(db) => {
                f.debug_tuple("Postgres").field(db).finish()
            }
            StorageBackend::KeyValue(store) => {
                f.debug_tuple("KeyValue").field(store).finish()
            }
        }
    }
}

/// Owns the storage backend and the unit-of-work factory built on it.
///
/// Build one at startup, clone it into whatever needs a factory, and call
/// [`DatabaseContext::shutdown`] once on the way out.
#[derive(Clone)]
pub struct DatabaseContext {
    backend: StorageBackend,
    factory: Arc<dyn UnitOfWorkFactory>,
}

impl fmt::Debug for DatabaseContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseContext")
            .field("backend", &self.backend)
            .field("factory_ptr", &Arc::as_ptr(&self.factory))
            .finish()
    }
}

impl DatabaseContext {
    pub async fn connect(settings: StorageSettings) -> Result<Self> {
        match settings {
            #[cfg(feature = "postgres")]
            StorageSettings::Postgres { url, pool } => {
                let postgres = PostgresDatabase::connect(&url, pool).await?;
                Ok(Self::from_postgres(Arc::new(postgres)))
            }
            #[cfg(feature = "redis")]
            StorageSettings::Redis { url } => {
                let store = RedisStore::connect(&url).await?;
                Ok(Self::from_store(Arc::new(store)))
            }
            StorageSettings::Memory => {
                info!("Using in-memory storage");
                Ok(Self::from_store(Arc::new(MemoryStore::new())))
            }
        }
    }

    #[cfg(feature = "postgres")]
    pub fn from_postgres(postgres: Arc<PostgresDatabase>) -> Self {
        let factory = Arc::new(postgres.unit_of_work_factory());
        Self {
            backend: StorageBackend::Postgres(postgres),
            factory,
        }
    }

    pub fn from_store(store: Arc<dyn KeyValueStore>) -> Self {
        let factory = Arc::new(CacheUnitOfWorkFactory::new(Arc::clone(&store)));
        Self {
            backend: StorageBackend::KeyValue(store),
            factory,
        }
    }

    pub fn unit_of_work_factory(&self) -> Arc<dyn UnitOfWorkFactory> {
        Arc::clone(&self.factory)
    }

    pub fn backend(&self) -> &StorageBackend {
        &self.backend
    }

    pub async fn health_check(&self) -> Result<()> {
        match &self.backend {
            #[cfg(feature = "postgres")]
            StorageBackend::Postgres(db) => db.health_check().await,
            StorageBackend::KeyValue(store) => store.ping().await,
        }
    }

    /// Releases pooled connections. Units of work still in flight finish
    /// against their already acquired connections.
    pub async fn shutdown(self) {
        match self.backend {
            #[cfg(feature = "postgres")]
            StorageBackend::Postgres(db) => db.close().await,
            StorageBackend::KeyValue(_) => {
                info!("Key-value storage released");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::unit_of_work::ScopeState;

    #[tokio::test]
    async fn memory_context_hands_out_fresh_units_of_work() {
        let ctx = DatabaseContext::connect(StorageSettings::Memory)
            .await
            .unwrap();
        ctx.health_check().await.unwrap();

        let factory = ctx.unit_of_work_factory();
        let first = factory.create();
        let second = factory.create();
        assert_eq!(first.state(), ScopeState::Idle);
        assert_eq!(second.state(), ScopeState::Idle);
        assert!(matches!(ctx.backend(), StorageBackend::KeyValue(_)));

        ctx.shutdown().await;
    }
}
