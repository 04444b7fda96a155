use anyhow::Result;
use alephium_portfolio::config::Config;
use alephium_portfolio::explorer::ExplorerClient;
use alephium_portfolio::feed::DEFAULT_PAGE_SIZE;
use alephium_portfolio::portfolio::PortfolioTracker;
use alephium_portfolio::query::commands::{
    BalancesQuery, TransactionsQuery, cmd_address, cmd_balances, cmd_contacts_add,
    cmd_contacts_list, cmd_contacts_remove, cmd_transactions,
};
use alephium_portfolio::query::formatters::OutputFormat;
use alephium_portfolio::repository::{CacheRepository, ContactRepository, Database};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "portfolio")]
#[command(about = "Inspect the balances and history of an Alephium wallet", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "table")]
    format: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Wallet-wide token balances and worth
    Balances {
        #[arg(long, default_value = "false")]
        show_hidden: bool,
    },
    /// Balances of a single address
    Address { address: String },
    /// Recent wallet transactions
    Transactions {
        #[arg(long, default_value = "1")]
        pages: usize,

        #[arg(long, default_value_t = DEFAULT_PAGE_SIZE)]
        limit: u32,
    },
    /// Manage saved contacts
    Contacts {
        #[command(subcommand)]
        action: ContactCommands,
    },
}

#[derive(Subcommand)]
enum ContactCommands {
    Add { name: String, address: String },
    List,
    Remove { name: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let format = OutputFormat::from(cli.format.as_str());

    let config = Config::from_env()?;
    let db = Database::new(&config.database_url)?;
    let store = CacheRepository::new(&db.conn);
    let contact_repo = ContactRepository::new(&db.conn);

    match cli.command {
        Commands::Balances { show_hidden } => {
            let client = ExplorerClient::from_config(&config)?;
            let mut tracker = PortfolioTracker::from_config(&config);
            let query = BalancesQuery {
                addresses: &config.wallet_addresses,
                show_hidden,
            };
            cmd_balances(&mut tracker, &client, &store, query, &format).await?;
        }
        Commands::Address { address } => {
            let client = ExplorerClient::from_config(&config)?;
            let mut tracker = PortfolioTracker::from_config(&config);
            cmd_address(&mut tracker, &client, &store, &address, &format).await?;
        }
        Commands::Transactions { pages, limit } => {
            let client = ExplorerClient::from_config(&config)?;
            let query = TransactionsQuery {
                addresses: &config.wallet_addresses,
                pages,
                limit,
            };
            cmd_transactions(&client, query, &format).await?;
        }
        Commands::Contacts { action } => match action {
            ContactCommands::Add { name, address } => {
                cmd_contacts_add(&contact_repo, &name, &address)?;
            }
            ContactCommands::List => cmd_contacts_list(&contact_repo, &format)?,
            ContactCommands::Remove { name } => cmd_contacts_remove(&contact_repo, &name)?,
        },
    }

    Ok(())
}
