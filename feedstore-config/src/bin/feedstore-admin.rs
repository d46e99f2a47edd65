use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use feedstore_config::{ConfigLoad, ConfigLoader, ConfigLoaderOptions, telemetry};
use feedstore_core::application::FollowerService;
use feedstore_core::database::{DatabaseContext, StorageBackend};
use feedstore_model::AccountId;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(
    name = "feedstore-admin",
    version,
    about = "Maintenance commands for a feedstore deployment"
)]
struct Cli {
    /// TOML config file; defaults to $FEEDSTORE_CONFIG.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Env file to load instead of ./.env.
    #[arg(long, global = true)]
    env_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Apply pending schema migrations.
    Migrate,
    /// Validate the configuration and ping the storage backend.
    Check,
    /// Print follower, following and feed counts for an account.
    Counts { account: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let ConfigLoad { config, warnings } =
        ConfigLoader::with_options(ConfigLoaderOptions {
            config_path: cli.config,
            env_file: cli.env_file,
        })
        .load()
        .context("failed to load configuration")?;

    if let Err(err) = telemetry::init_tracing(&config.log_level) {
        eprintln!("tracing already initialised: {err}");
    }
    if config.metadata.env_file_loaded {
        info!("loaded .env file");
    }
    for warning in &warnings.items {
        match &warning.hint {
            Some(hint) => {
                warn!(message = %warning.message, hint = %hint, "configuration warning")
            }
            None => warn!(message = %warning.message, "configuration warning"),
        }
    }

    let settings = config.storage_settings()?;
    let ctx = DatabaseContext::connect(settings)
        .await
        .with_context(|| format!("failed to connect to {} storage", config.storage))?;

    let outcome = run(&cli.command, &ctx).await;
    ctx.shutdown().await;
    outcome
}

async fn run(command: &Command, ctx: &DatabaseContext) -> Result<()> {
    match command {
        Command::Migrate => match ctx.backend() {
            StorageBackend::Postgres(db) => {
                db.migrate().await?;
                println!("migrations applied");
            }
            StorageBackend::KeyValue(_) => {
                println!("key-value storage has no schema; nothing to migrate");
            }
        },
        Command::Check => {
            ctx.health_check().await.context("storage health check failed")?;
            if let StorageBackend::Postgres(db) = ctx.backend() {
                let stats = db.pool_stats();
                println!(
                    "pool: {} open, {} idle, max {}",
                    stats.size, stats.idle, stats.max_size
                );
            }
            println!("storage reachable");
        }
        Command::Counts { account } => {
            let account_id = AccountId::new(account.as_str())?;
            let counts = FollowerService::new(ctx.unit_of_work_factory())
                .get_account_info(account_id)
                .await?;
            println!(
                "{account}: {} followers, {} following, {} feeds",
                counts.followers_count, counts.following_count, counts.feeds_count
            );
        }
    }
    Ok(())
}
