use std::fmt;
use std::time::Duration;

use sqlx::{
    PgPool,
    postgres::{PgConnectOptions, PgPoolOptions},
};
use tracing::info;

use super::unit_of_work::PostgresUnitOfWorkFactory;
use crate::error::{CoreError, Result};

/// Connection pool tuning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolSettings {
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout: Duration,
    pub idle_timeout: Option<Duration>,
    pub max_lifetime: Option<Duration>,
    pub test_before_acquire: bool,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            max_connections: 20,
            min_connections: 2,
            acquire_timeout: Duration::from_secs(30),
            idle_timeout: Some(Duration::from_secs(600)),
            max_lifetime: Some(Duration::from_secs(1800)),
            test_before_acquire: true,
        }
    }
}

/// Statistics about the connection pool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStats {
    pub size: u32,
    pub idle: u32,
    pub max_size: u32,
    pub min_idle: u32,
}

/// Owns the PostgreSQL pool for the lifetime of the process.
///
/// There is no global pool: construct one `PostgresDatabase`, hand out its
/// [`PostgresUnitOfWorkFactory`], and call [`PostgresDatabase::close`] on
/// shutdown.
#[derive(Clone)]
pub struct PostgresDatabase {
    pool: PgPool,
    settings: PoolSettings,
}

impl fmt::Debug for PostgresDatabase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PostgresDatabase")
            .field("pool_size", &self.pool.size())
            .field("idle_connections", &self.pool.num_idle())
            .field("max_connections", &self.settings.max_connections)
            .field("min_connections", &self.settings.min_connections)
            .finish()
    }
}

impl PostgresDatabase {
    pub async fn connect(
        connection_string: &str,
        settings: PoolSettings,
    ) -> Result<Self> {
        let connect_options = connection_string
            .trim()
            .parse::<PgConnectOptions>()
            .map_err(|e| {
                CoreError::Database(format!(
                    "Invalid PostgreSQL connection string: {e}"
                ))
            })?;

        let pool = PgPoolOptions::new()
            .max_connections(settings.max_connections)
            .min_connections(settings.min_connections)
            .acquire_timeout(settings.acquire_timeout)
            .idle_timeout(settings.idle_timeout)
            .max_lifetime(settings.max_lifetime)
            .test_before_acquire(settings.test_before_acquire)
            .connect_with(connect_options)
            .await
            .map_err(|e| {
                CoreError::Database(format!("Database connection failed: {e}"))
            })?;

        info!(
            "Database pool initialized with max_connections={}, min_connections={}",
            settings.max_connections, settings.min_connections
        );

        Ok(Self { pool, settings })
    }

    /// Wrap an existing pool (mainly for `#[sqlx::test]` pools).
    pub fn from_pool(pool: PgPool) -> Self {
        let settings = PoolSettings {
            max_connections: pool.options().get_max_connections(),
            min_connections: pool.options().get_min_connections(),
            ..PoolSettings::default()
        };
        Self { pool, settings }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub fn unit_of_work_factory(&self) -> PostgresUnitOfWorkFactory {
        PostgresUnitOfWorkFactory::new(self.pool.clone())
    }

    /// Apply the embedded schema migrations.
    pub async fn migrate(&self) -> Result<()> {
        crate::MIGRATOR.run(&self.pool).await.map_err(|e| {
            CoreError::Database(format!("Migration failed: {e}"))
        })?;
        info!("Database migrations applied");
        Ok(())
    }

    pub async fn health_check(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| {
                CoreError::Database(format!("Health check failed: {e}"))
            })?;
        Ok(())
    }

    /// Get connection pool statistics for monitoring
    pub fn pool_stats(&self) -> PoolStats {
        PoolStats {
            size: self.pool.size(),
            idle: self.pool.num_idle() as u32,
            max_size: self.settings.max_connections,
            min_idle: self.settings.min_connections,
        }
    }

    /// Waits for checked-out connections to return and closes the pool.
    pub async fn close(&self) {
        self.pool.close().await;
        info!("Database pool closed");
    }
}
