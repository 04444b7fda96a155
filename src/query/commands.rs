use crate::addresses::is_valid_address;
use crate::explorer::ExplorerApi;
use crate::feed::{TransactionFeed, now_millis};
use crate::portfolio::PortfolioTracker;
use crate::query::formatters::{
    OutputFormat, format_contacts, format_portfolio, format_transactions,
};
use crate::repository::{CacheRepository, ContactRepository};
use crate::transactions::TransactionSummary;
use anyhow::Result;
use std::collections::HashSet;

pub struct BalancesQuery<'a> {
    pub addresses: &'a [String],
    pub show_hidden: bool,
}

pub async fn cmd_balances<A>(
    tracker: &mut PortfolioTracker,
    api: &A,
    store: &CacheRepository<'_>,
    query: BalancesQuery<'_>,
    format: &OutputFormat,
) -> Result<()>
where
    A: ExplorerApi + ?Sized,
{
    let now_secs = now_millis() / 1000;
    let portfolio = tracker
        .load(api, Some(store), query.addresses, query.show_hidden, now_secs)
        .await?;
    let output = format_portfolio(&portfolio, format);
    println!("{output}");

    Ok(())
}

pub async fn cmd_address<A>(
    tracker: &mut PortfolioTracker,
    api: &A,
    store: &CacheRepository<'_>,
    address: &str,
    format: &OutputFormat,
) -> Result<()>
where
    A: ExplorerApi + ?Sized,
{
    if !is_valid_address(address) {
        anyhow::bail!("Invalid address format: {}", address);
    }

    let addresses = [address.to_string()];
    let query = BalancesQuery {
        addresses: &addresses,
        show_hidden: true,
    };
    cmd_balances(tracker, api, store, query, format).await
}

pub struct TransactionsQuery<'a> {
    pub addresses: &'a [String],
    pub pages: usize,
    pub limit: u32,
}

/// Loads up to `pages` pages of wallet history anchored at the current time.
pub async fn load_transactions<A>(api: &A, query: &TransactionsQuery<'_>) -> Result<Vec<TransactionSummary>>
where
    A: ExplorerApi + ?Sized,
{
    let mut feed = TransactionFeed::new(query.addresses.to_vec(), query.limit, now_millis());
    feed.load_first_page(api).await?;
    while feed.pages().len() < query.pages && feed.has_more() {
        feed.load_next_page(api).await?;
    }

    let wallet: HashSet<String> = query.addresses.iter().cloned().collect();
    Ok(feed
        .confirmed()
        .map(|tx| TransactionSummary::confirmed(tx, &wallet))
        .collect())
}

pub async fn cmd_transactions<A>(
    api: &A,
    query: TransactionsQuery<'_>,
    format: &OutputFormat,
) -> Result<()>
where
    A: ExplorerApi + ?Sized,
{
    if query.pages == 0 {
        return Err(anyhow::anyhow!("--pages must be at least 1"));
    }

    let summaries = load_transactions(api, &query).await?;
    let output = format_transactions(&summaries, format);
    println!("{output}");

    Ok(())
}

pub fn cmd_contacts_add(repo: &ContactRepository, name: &str, address: &str) -> Result<()> {
    let contact = repo.insert(name, address)?;
    println!("Saved {} ({})", contact.name, contact.address);

    Ok(())
}

pub fn cmd_contacts_list(repo: &ContactRepository, format: &OutputFormat) -> Result<()> {
    let contacts = repo.list()?;
    let output = format_contacts(&contacts, format);
    println!("{output}");

    Ok(())
}

pub fn cmd_contacts_remove(repo: &ContactRepository, name: &str) -> Result<()> {
    repo.delete(name)?;
    println!("Removed {name}");

    Ok(())
}
