use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Raw configuration as written in a TOML file.
#[derive(Debug, Default, Clone, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct FileConfig {
    #[serde(default)]
    pub storage: FileStorageConfig,
    #[serde(default)]
    pub database: FileDatabaseConfig,
    #[serde(default)]
    pub redis: FileRedisConfig,
    #[serde(default)]
    pub logging: FileLoggingConfig,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileStorageConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backend: Option<String>,
}

/// Durations are humantime strings such as `"30s"` or `"10m"`.
#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileDatabaseConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password_file: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_connections: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_connections: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub acquire_timeout: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub idle_timeout: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_lifetime: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub test_before_acquire: Option<bool>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileRedisConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileLoggingConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
}

/// Environment-derived configuration values, kept as raw strings so the
/// loader can report which variable was malformed.
#[derive(Debug, Default, Clone)]
pub struct EnvConfig {
    pub config_path: Option<PathBuf>,
    pub storage_backend: Option<String>,
    pub database_url: Option<String>,
    pub database_host: Option<String>,
    pub database_port: Option<String>,
    pub database_user: Option<String>,
    pub database_name: Option<String>,
    pub database_password: Option<String>,
    pub database_password_file: Option<PathBuf>,
    pub db_max_connections: Option<String>,
    pub db_min_connections: Option<String>,
    pub db_acquire_timeout: Option<String>,
    pub db_idle_timeout: Option<String>,
    pub db_max_lifetime: Option<String>,
    pub db_test_before_acquire: Option<String>,
    pub redis_url: Option<String>,
    pub log_level: Option<String>,
}

impl EnvConfig {
    /// Reads the process environment.
    pub fn gather() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads variables through `lookup`. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| {
            lookup(name).filter(|value| !value.trim().is_empty())
        };

        Self {
            config_path: var("FEEDSTORE_CONFIG").map(PathBuf::from),
            storage_backend: var("STORAGE_BACKEND"),
            database_url: var("DATABASE_URL"),
            database_host: var("DATABASE_HOST"),
            database_port: var("DATABASE_PORT"),
            database_user: var("DATABASE_USER"),
            database_name: var("DATABASE_NAME"),
            database_password: var("DATABASE_PASSWORD"),
            database_password_file: var("DATABASE_PASSWORD_FILE")
                .map(PathBuf::from),
            db_max_connections: var("DB_MAX_CONNECTIONS"),
            db_min_connections: var("DB_MIN_CONNECTIONS"),
            db_acquire_timeout: var("DB_ACQUIRE_TIMEOUT"),
            db_idle_timeout: var("DB_IDLE_TIMEOUT"),
            db_max_lifetime: var("DB_MAX_LIFETIME"),
            db_test_before_acquire: var("DB_TEST_BEFORE_ACQUIRE"),
            redis_url: var("REDIS_URL"),
            log_level: var("LOG_LEVEL"),
        }
    }
}
