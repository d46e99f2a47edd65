pub mod sources;

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use feedstore_core::database::{PoolSettings, StorageSettings};

use crate::ConfigLoadError;

/// Fully composed configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub storage: StorageKind,
    pub database: DatabaseConfig,
    pub redis: RedisConfig,
    /// Default tracing filter; `RUST_LOG` takes precedence at runtime.
    pub log_level: String,
    pub metadata: ConfigMetadata,
}

impl Config {
    /// Builds the settings for the selected backend. Fails when that
    /// backend has no connection URL.
    pub fn storage_settings(&self) -> Result<StorageSettings, ConfigLoadError> {
        match self.storage {
            StorageKind::Postgres => {
                let url = self.database.url.clone().ok_or(
                    ConfigLoadError::MissingSetting {
                        backend: StorageKind::Postgres,
                        key: "DATABASE_URL",
                    },
                )?;
                Ok(StorageSettings::Postgres {
                    url,
                    pool: self.database.pool.clone(),
                })
            }
            StorageKind::Redis => {
                let url = self.redis.url.clone().ok_or(
                    ConfigLoadError::MissingSetting {
                        backend: StorageKind::Redis,
                        key: "REDIS_URL",
                    },
                )?;
                Ok(StorageSettings::Redis { url })
            }
            StorageKind::Memory => Ok(StorageSettings::Memory),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StorageKind {
    #[default]
    Postgres,
    Redis,
    Memory,
}

impl StorageKind {
    pub fn as_str(self) -> &'static str {
        match self {
            StorageKind::Postgres => "postgres",
            StorageKind::Redis => "redis",
            StorageKind::Memory => "memory",
        }
    }
}

impl fmt::Display for StorageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StorageKind {
    type Err = ConfigLoadError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" | "pg" => Ok(StorageKind::Postgres),
            "redis" => Ok(StorageKind::Redis),
            "memory" | "in-memory" => Ok(StorageKind::Memory),
            _ => Err(ConfigLoadError::invalid(
                "STORAGE_BACKEND",
                raw,
                "expected one of postgres, redis, memory",
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    pub url: Option<String>,
    pub pool: PoolSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RedisConfig {
    pub url: Option<String>,
}

/// Where the configuration came from.
#[derive(Debug, Clone, Default)]
pub struct ConfigMetadata {
    pub config_path: Option<PathBuf>,
    pub env_file_loaded: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_kind_accepts_aliases() {
        assert_eq!("PostgreSQL".parse::<StorageKind>().unwrap(), StorageKind::Postgres);
        assert_eq!(" redis ".parse::<StorageKind>().unwrap(), StorageKind::Redis);
        assert_eq!("in-memory".parse::<StorageKind>().unwrap(), StorageKind::Memory);
        assert!("sqlite".parse::<StorageKind>().is_err());
    }
}
