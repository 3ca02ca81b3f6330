use anyhow::{bail, Context, Result};
use chrono::{Local, NaiveDate};
use clap::Parser;
use std::path::PathBuf;

use fitbit_pull::api::FitbitApi;
use fitbit_pull::auth::AuthManager;
use fitbit_pull::config::{Config, SourceMode};
use fitbit_pull::pipeline;
use fitbit_pull::source;
use fitbit_pull::store::SqliteStore;

#[derive(Parser)]
#[command(name = "fitbit-pull")]
#[command(about = "Pull one day of Fitbit data into SQLite")]
#[command(version)]
struct Cli {
    /// Day to pull (YYYY-MM-DD), defaults to yesterday
    #[arg(short, long)]
    date: Option<NaiveDate>,

    /// Where the raw payload comes from (overrides FITBIT_SOURCE)
    #[arg(short, long, value_enum)]
    source: Option<SourceMode>,

    /// SQLite database path (overrides FITBIT_DATABASE)
    #[arg(long)]
    database: Option<PathBuf>,

    /// Authenticate with Fitbit
    #[arg(short, long)]
    auth: bool,

    /// Test API connectivity
    #[arg(long)]
    test: bool,

    /// Drop and recreate every table
    #[arg(long)]
    reset_db: bool,

    /// Confirm --reset-db
    #[arg(long, requires = "reset_db")]
    yes: bool,
}

fn init_logging() {
    let filter = std::env::var("FITBIT_PULL_LOG")
        .or_else(|_| std::env::var("RUST_LOG"))
        .unwrap_or_else(|_| "info".to_string());
    let env_filter = tracing_subscriber::EnvFilter::try_new(&filter)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .compact()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_env_filter(env_filter)
        .init();
}

/// A missing .env is fine since the environment may already be set; a
/// malformed one is an error
fn env_file_loaded<T>(result: std::result::Result<T, dotenvy::Error>) -> Result<()> {
    match result {
        Ok(_) => Ok(()),
        Err(e) if e.not_found() => Ok(()),
        Err(e) => Err(e).context("Failed to load .env"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_file_loaded(dotenvy::dotenv())?;
    init_logging();

    let cli = Cli::parse();
    let result = run(cli).await;
    if let Err(e) = &result {
        tracing::error!("failure: {:#}", e);
    }
    result
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = Config::load()?;
    if let Some(source) = cli.source {
        config.source = source;
    }
    if let Some(database) = cli.database {
        config.database = database;
    }

    if cli.auth {
        return Ok(AuthManager::new(config).authenticate().await?);
    }

    if cli.test {
        let token = AuthManager::new(config.clone()).get_access_token().await?;
        FitbitApi::new(&config.api_base)?.test_connection(&token).await?;
        println!("API test successful!");
        return Ok(());
    }

    if cli.reset_db {
        if !cli.yes {
            bail!(
                "--reset-db drops every table in {}; pass --yes to confirm",
                config.database.display()
            );
        }
        SqliteStore::open(&config.database)?.reset_schema()?;
        println!("Recreated tables in {}", config.database.display());
        return Ok(());
    }

    let date = cli
        .date
        .unwrap_or_else(|| Local::now().date_naive() - chrono::Duration::days(1));

    let source = source::from_config(&config)?;
    let mut store = SqliteStore::open(&config.database)?;
    let summary = pipeline::run_day(source.as_ref(), &mut store, date)
        .await
        .with_context(|| format!("Failed to pull {}", date))?;

    println!(
        "Stored {} rows for {} in {}",
        summary.total_rows(),
        date,
        config.database.display()
    );
    Ok(())
}
