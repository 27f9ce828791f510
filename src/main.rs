//! tunenote service binary.

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tunenote::catalog::SpotifyCatalog;
use tunenote::config::Config;
use tunenote::AppState;

#[derive(Debug, Parser)]
#[command(name = "tunenote", about = "Music review microservice")]
struct Args {
    /// Path to the TOML configuration file
    #[arg(long, env = "TUNENOTE_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    info!("Starting tunenote v{}", env!("CARGO_PKG_VERSION"));

    let args = Args::parse();
    let config = match &args.config {
        Some(path) => Config::load(path)?,
        None => {
            let default_path = PathBuf::from("tunenote.toml");
            if default_path.exists() {
                Config::load(&default_path)?
            } else {
                Config::from_env()?
            }
        }
    };

    info!("Database: {}", config.database_path.display());
    let db_pool = tunenote::db::init_database_pool(&config.database_path).await?;
    info!("Database connection established");

    let catalog = Arc::new(SpotifyCatalog::new(config.catalog.clone())?);
    info!("Catalog provider client ready ({})", config.catalog.api_url);

    let state = AppState::new(db_pool, catalog);
    let app = tunenote::build_router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    info!("Listening on http://{}", config.bind_address);
    info!("Health check: http://{}/health", config.bind_address);

    axum::serve(listener, app).await?;

    Ok(())
}
