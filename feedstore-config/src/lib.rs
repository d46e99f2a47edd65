//! Configuration for feedstore deployments.
//!
//! [`ConfigLoader`] composes an optional TOML file with the process
//! environment (after loading `.env`), validates the result and turns it
//! into the [`StorageSettings`](feedstore_core::database::StorageSettings)
//! the core crate connects with. The `feedstore-admin` binary is built on
//! top of this crate.

pub mod loader;
pub mod models;
pub mod telemetry;
pub mod util;
pub mod validation;

pub use loader::{ConfigLoad, ConfigLoader, ConfigLoaderOptions, error::ConfigLoadError};
pub use models::sources::{EnvConfig, FileConfig};
pub use models::{Config, ConfigMetadata, DatabaseConfig, RedisConfig, StorageKind};
pub use validation::{ConfigWarning, ConfigWarnings};
