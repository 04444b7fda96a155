use anyhow::Result;
use alephium_portfolio::config::Config;
use alephium_portfolio::explorer::ExplorerClient;
use alephium_portfolio::repository::Database;
use alephium_portfolio::watcher::Watcher;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Starting Alephium portfolio watcher");

    let config = Config::from_env()?;
    info!("Configuration loaded for {}", config.network);
    info!(
        "Explorer URLs: {} endpoint(s) configured",
        config.explorer_urls.len()
    );

    let db = Database::new(&config.database_url)?;
    info!("Database initialized");

    let client = ExplorerClient::from_config(&config)?;

    let mut watcher = Watcher::new(client, db, &config)?;

    if let Err(e) = watcher.run().await {
        error!("Watcher error: {}", e);
        return Err(e);
    }

    Ok(())
}
