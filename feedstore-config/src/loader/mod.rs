pub mod db_url;
pub mod error;

use std::fs::read_to_string;
use std::path::{Path, PathBuf};

use feedstore_core::database::PoolSettings;
use tracing::debug;

use crate::models::sources::{EnvConfig, FileConfig};
use crate::models::{
    Config, ConfigMetadata, DatabaseConfig, RedisConfig, StorageKind,
};
use crate::util::{
    parse_bool_setting, parse_duration, parse_number, parse_optional_duration,
};
use crate::validation::{self, ConfigWarnings};
use error::ConfigLoadError;

const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Debug, Clone, Default)]
pub struct ConfigLoaderOptions {
    /// Overrides `FEEDSTORE_CONFIG`.
    pub config_path: Option<PathBuf>,
    /// Loaded instead of `./.env`. Unlike `./.env` it must exist.
    pub env_file: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct ConfigLoad {
    pub config: Config,
    pub warnings: ConfigWarnings,
}

#[derive(Debug, Clone, Default)]
pub struct ConfigLoader {
    options: ConfigLoaderOptions,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: ConfigLoaderOptions) -> Self {
        Self { options }
    }

    /// Loads `.env`, then composes the file and the process environment.
    pub fn load(&self) -> Result<ConfigLoad, ConfigLoadError> {
        let env_file_loaded = self.load_env_file()?;
        let mut load = self.load_from(EnvConfig::gather())?;
        load.config.metadata.env_file_loaded = env_file_loaded;
        Ok(load)
    }

    /// Composes configuration from an already gathered environment.
    /// Environment values take precedence over the file.
    pub fn load_from(&self, env: EnvConfig) -> Result<ConfigLoad, ConfigLoadError> {
        let config_path = self
            .options
            .config_path
            .clone()
            .or_else(|| env.config_path.clone());
        let file = match config_path.as_deref() {
            Some(path) => read_file_config(path)?,
            None => FileConfig::default(),
        };

        let config = compose(&file, &env, config_path)?;
        let warnings = validation::validate(&config, &env)?;
        Ok(ConfigLoad { config, warnings })
    }

    fn load_env_file(&self) -> Result<bool, ConfigLoadError> {
        match &self.options.env_file {
            Some(path) => dotenvy::from_path(path).map(|_| true).map_err(
                |source| ConfigLoadError::EnvFile {
                    path: path.clone(),
                    source,
                },
            ),
            None => match dotenvy::dotenv() {
                Ok(path) => {
                    debug!(path = %path.display(), "loaded env file");
                    Ok(true)
                }
                Err(err) if err.not_found() => Ok(false),
                Err(source) => Err(ConfigLoadError::EnvFile {
                    path: PathBuf::from(".env"),
                    source,
                }),
            },
        }
    }
}

fn read_file_config(path: &Path) -> Result<FileConfig, ConfigLoadError> {
    let raw = read_to_string(path).map_err(|source| ConfigLoadError::FileIo {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&raw).map_err(|source| ConfigLoadError::FileParse {
        path: path.to_path_buf(),
        source,
    })
}

fn compose(
    file: &FileConfig,
    env: &EnvConfig,
    config_path: Option<PathBuf>,
) -> Result<Config, ConfigLoadError> {
    let storage = match env
        .storage_backend
        .as_deref()
        .or(file.storage.backend.as_deref())
    {
        Some(raw) => raw.parse()?,
        None => StorageKind::default(),
    };

    let database = DatabaseConfig {
        url: db_url::resolve_database_url(env, &file.database)?,
        pool: pool_settings(file, env)?,
    };
    let redis = RedisConfig {
        url: env.redis_url.clone().or_else(|| {
            file.redis.url.clone().filter(|url| !url.trim().is_empty())
        }),
    };
    let log_level = env
        .log_level
        .clone()
        .or_else(|| file.logging.level.clone())
        .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string());

    Ok(Config {
        storage,
        database,
        redis,
        log_level,
        metadata: ConfigMetadata {
            config_path,
            env_file_loaded: false,
        },
    })
}

fn pool_settings(
    file: &FileConfig,
    env: &EnvConfig,
) -> Result<PoolSettings, ConfigLoadError> {
    let mut pool = PoolSettings::default();
    let db = &file.database;

    if let Some(raw) = env.db_max_connections.as_deref() {
        pool.max_connections = parse_number("DB_MAX_CONNECTIONS", raw)?;
    } else if let Some(max) = db.max_connections {
        pool.max_connections = max;
    }

    if let Some(raw) = env.db_min_connections.as_deref() {
        pool.min_connections = parse_number("DB_MIN_CONNECTIONS", raw)?;
    } else if let Some(min) = db.min_connections {
        pool.min_connections = min;
    }

    if let Some(raw) = env
        .db_acquire_timeout
        .as_deref()
        .or(db.acquire_timeout.as_deref())
    {
        pool.acquire_timeout = parse_duration("DB_ACQUIRE_TIMEOUT", raw)?;
    }
    if let Some(raw) =
        env.db_idle_timeout.as_deref().or(db.idle_timeout.as_deref())
    {
        pool.idle_timeout = parse_optional_duration("DB_IDLE_TIMEOUT", raw)?;
    }
    if let Some(raw) =
        env.db_max_lifetime.as_deref().or(db.max_lifetime.as_deref())
    {
        pool.max_lifetime = parse_optional_duration("DB_MAX_LIFETIME", raw)?;
    }

    if let Some(raw) = env.db_test_before_acquire.as_deref() {
        pool.test_before_acquire =
            parse_bool_setting("DB_TEST_BEFORE_ACQUIRE", raw)?;
    } else if let Some(flag) = db.test_before_acquire {
        pool.test_before_acquire = flag;
    }

    Ok(pool)
}
