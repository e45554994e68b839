mod import;
mod uploads;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "geoload-cli")]
#[command(about = "Bulk location import command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Database maintenance
    Db {
        #[command(subcommand)]
        command: DbCommands,
    },
    /// Import a ZIP archive of locations for a user
    Import {
        /// Path to the .zip archive
        path: PathBuf,
        /// Owner of the imported locations
        #[arg(long, value_parser = clap::value_parser!(i64).range(1..))]
        user_id: i64,
    },
    /// Inspect the upload audit trail
    Uploads {
        #[command(subcommand)]
        command: UploadsCommands,
    },
}

#[derive(Debug, Subcommand)]
enum DbCommands {
    /// Check database connectivity
    Ping,
    /// Apply pending migrations
    Migrate,
}

#[derive(Debug, Subcommand)]
enum UploadsCommands {
    /// List a user's most recent upload attempts
    List {
        /// Owner whose uploads are listed
        #[arg(long, value_parser = clap::value_parser!(i64).range(1..))]
        user_id: i64,
        /// Maximum number of attempts to show
        #[arg(long, default_value = "20")]
        limit: u32,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let Some(command) = cli.command else {
        println!("geoload-cli ready; run with --help for commands");
        return Ok(());
    };

    let config = geoload_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let pool_config = geoload_db::PoolConfig::from_app_config(&config);
    let pool = geoload_db::connect_pool(&config.database_url, pool_config).await?;

    match command {
        Commands::Db {
            command: DbCommands::Ping,
        } => {
            geoload_db::ping(&pool).await?;
            println!("database ok");
        }
        Commands::Db {
            command: DbCommands::Migrate,
        } => {
            let applied = geoload_db::run_migrations(&pool).await?;
            println!("applied {applied} migration(s)");
        }
        Commands::Import { path, user_id } => {
            let limits = geoload_import::ImportLimits::from_app_config(&config);
            import::run_import_file(&pool, limits, &path, user_id).await?;
        }
        Commands::Uploads {
            command: UploadsCommands::List { user_id, limit },
        } => {
            uploads::run_uploads_list(&pool, user_id, i64::from(limit)).await?;
        }
    }

    Ok(())
}
