use crate::addresses::{Address, AddressAction, AddressesState};
use crate::balances::{AddressQuery, LatestTransactions};
use crate::config::Config;
use crate::explorer::ExplorerApi;
use crate::portfolio::{Portfolio, PortfolioTracker, probe_queries};
use crate::repository::{CacheRepository, Database};
use anyhow::Result;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{error, info, warn};

const MIN_CYCLE_SPACING_MS: u64 = 1000;

/// Polls the explorer for new transactions and refreshes the portfolio
/// whenever any wallet address moved.
pub struct Watcher<A: ExplorerApi> {
    api: A,
    db: Database,
    addresses: AddressesState,
    tracker: PortfolioTracker,
    poll_interval: Duration,
    last_seen: HashMap<String, LatestTransactions>,
    first_cycle: bool,
}

impl<A: ExplorerApi> Watcher<A> {
    pub fn new(api: A, db: Database, config: &Config) -> Result<Self> {
        let mut addresses = AddressesState::new();
        let tracked = config
            .wallet_addresses
            .iter()
            .enumerate()
            .map(|(index, hash)| Address::new(hash.clone(), index as u32))
            .collect();
        addresses.reduce(AddressAction::Added(tracked))?;

        Ok(Watcher {
            api,
            db,
            addresses,
            tracker: PortfolioTracker::from_config(config),
            poll_interval: config.poll_interval,
            last_seen: HashMap::new(),
            first_cycle: true,
        })
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn addresses(&self) -> &AddressesState {
        &self.addresses
    }

    pub fn tracker(&self) -> &PortfolioTracker {
        &self.tracker
    }

    /// Addresses whose latest-transaction pair differs from the last
    /// successful cycle.
    fn changed_addresses(&self, queries: &[AddressQuery]) -> Vec<(String, LatestTransactions)> {
        queries
            .iter()
            .filter_map(|query| {
                let latest = query.latest.as_ref()?;
                (self.last_seen.get(&query.address) != Some(latest))
                    .then(|| (query.address.clone(), latest.clone()))
            })
            .collect()
    }

    /// One polling cycle. Returns the refreshed portfolio, or `None` when
    /// nothing changed since the last cycle.
    pub async fn poll_once(&mut self, now_secs: u64) -> Result<Option<Portfolio>> {
        let hashes = self.addresses.hashes();
        let (queries, failed) = probe_queries(&self.api, &hashes).await;

        let changed = self.changed_addresses(&queries);
        if changed.is_empty() && !self.first_cycle {
            info!("No new transactions");
            return Ok(None);
        }
        for (address, _) in &changed {
            info!("New activity on {}", address);
        }

        let store = CacheRepository::new(&self.db.conn);
        let mut portfolio = self
            .tracker
            .snapshot(&self.api, Some(&store), &queries, false, now_secs)
            .await?;
        if !failed.is_empty() {
            portfolio.has_error = true;
            portfolio.failed_addresses.extend(failed);
        }

        // Failed addresses stay unseen so the next cycle retries them
        for address in &portfolio.failed_addresses {
            self.last_seen.remove(address);
        }
        self.last_seen.extend(
            changed
                .into_iter()
                .filter(|(address, _)| !portfolio.failed_addresses.contains(address)),
        );
        self.first_cycle = false;
        Ok(Some(portfolio))
    }

    pub async fn run(&mut self) -> Result<()> {
        info!(
            "Watching {} addresses every {:?}",
            self.addresses.all().len(),
            self.poll_interval
        );

        loop {
            let cycle_start = Instant::now();
            let now_secs = chrono::Utc::now().timestamp().max(0) as u64;

            match self.poll_once(now_secs).await {
                Ok(Some(portfolio)) => log_summary(&portfolio),
                Ok(None) => {}
                Err(e) => error!("Watcher cycle failed: {:#}", e),
            }

            // Keep a minimum spacing between cycles even with a tiny interval
            let target = self
                .poll_interval
                .max(Duration::from_millis(MIN_CYCLE_SPACING_MS));
            let elapsed = cycle_start.elapsed();
            if elapsed < target {
                sleep(target - elapsed).await;
            }
        }
    }
}

fn log_summary(portfolio: &Portfolio) {
    info!(
        "Total worth {:.2} {} over {} tokens",
        portfolio.total_worth,
        portfolio.currency,
        portfolio.tokens.len()
    );
    for token in portfolio.tokens.iter().take(10) {
        info!(
            "  {:<12} {:>30} {}",
            token.symbol.as_deref().unwrap_or(&token.name),
            crate::amount::format_amount(token.balance.total, token.decimals),
            token
                .worth
                .map(|w| format!("{w:.2}"))
                .unwrap_or_else(|| "-".to_string())
        );
    }
    if portfolio.is_loading {
        warn!("Some addresses are still loading");
    }
    if portfolio.has_error {
        warn!(
            "Some balances could not be loaded: {:?}",
            portfolio.failed_addresses
        );
    }
}
