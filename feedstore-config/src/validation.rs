use crate::models::sources::EnvConfig;
use crate::models::{Config, StorageKind};
use crate::ConfigLoadError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigWarning {
    pub message: String,
    pub hint: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ConfigWarnings {
    pub items: Vec<ConfigWarning>,
}

impl ConfigWarnings {
    pub fn push(&mut self, message: impl Into<String>, hint: Option<&str>) {
        self.items.push(ConfigWarning {
            message: message.into(),
            hint: hint.map(str::to_string),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Rejects configurations the selected backend cannot start with and
/// collects the suspicious but usable ones.
pub fn validate(
    config: &Config,
    env: &EnvConfig,
) -> Result<ConfigWarnings, ConfigLoadError> {
    config.storage_settings()?;

    let pool = &config.database.pool;
    if pool.max_connections == 0 {
        return Err(ConfigLoadError::invalid(
            "DB_MAX_CONNECTIONS",
            "0",
            "the pool needs at least one connection",
        ));
    }
    if pool.min_connections > pool.max_connections {
        return Err(ConfigLoadError::invalid(
            "DB_MIN_CONNECTIONS",
            pool.min_connections.to_string(),
            format!("exceeds DB_MAX_CONNECTIONS ({})", pool.max_connections),
        ));
    }

    let mut warnings = ConfigWarnings::default();
    match config.storage {
        StorageKind::Memory => warnings.push(
            "in-memory storage keeps no data across restarts",
            Some("set STORAGE_BACKEND=postgres for durable storage"),
        ),
        StorageKind::Redis if env.database_url.is_some() => warnings.push(
            "DATABASE_URL is set but the redis backend is selected",
            None,
        ),
        StorageKind::Postgres if env.redis_url.is_some() => warnings.push(
            "REDIS_URL is set but the postgres backend is selected",
            None,
        ),
        _ => {}
    }
    Ok(warnings)
}
