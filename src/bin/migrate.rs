use anyhow::{Context, Result};
use alephium_portfolio::repository::Database;

fn main() -> Result<()> {
    tracing_subscriber::fmt().init();
    dotenv::dotenv().ok();

    let database_url = std::env::var("DATABASE_URL")
        .unwrap_or_else(|_| "sqlite:./wallet-cache.db".to_string());

    println!("Running migrations on database: {database_url}");

    let _db = Database::new(&database_url).context("Migration failed")?;

    println!("Migrations completed successfully!");

    Ok(())
}
