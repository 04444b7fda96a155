use crate::balances::{AddressQuery, WalletAggregator, probe_latest_transactions};
use crate::config::Config;
use crate::explorer::ExplorerApi;
use crate::network::NetworkId;
use crate::repository::CacheRepository;
use crate::tokens::{Token, TokenId, TokenRegistryCache};
use crate::worth::{PriceTable, TokenWorth, attach_worth, sort_tokens, total_worth};
use anyhow::Result;
use serde::Serialize;
use std::collections::HashSet;
use tracing::{info, warn};

/// Sorted wallet holdings with their worth.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Portfolio {
    pub network: NetworkId,
    pub currency: String,
    pub tokens: Vec<TokenWorth>,
    pub total_worth: f64,
    pub is_loading: bool,
    pub has_error: bool,
    pub failed_addresses: Vec<String>,
}

/// Probes every address and builds the aggregator queries. Addresses whose
/// probe failed are queried without a key, so they show up as loading.
pub async fn probe_queries<A>(api: &A, addresses: &[String]) -> (Vec<AddressQuery>, Vec<String>)
where
    A: ExplorerApi + ?Sized,
{
    let mut failed = Vec::new();
    let queries = probe_latest_transactions(api, addresses)
        .await
        .into_iter()
        .map(|(address, result)| match result {
            Ok(latest) => AddressQuery::new(address, Some(latest)),
            Err(e) => {
                warn!("Failed to probe latest transactions of {}: {:#}", address, e);
                failed.push(address.clone());
                AddressQuery::new(address, None)
            }
        })
        .collect();
    (queries, failed)
}

/// Long-lived portfolio state: memoized balances, classifications,
/// metadata and the token list.
#[derive(Debug)]
pub struct PortfolioTracker {
    aggregator: WalletAggregator,
    registry: TokenRegistryCache,
    hidden: HashSet<TokenId>,
    currency: String,
}

impl PortfolioTracker {
    pub fn new(
        network: NetworkId,
        page_limit: u32,
        hidden: HashSet<TokenId>,
        currency: impl Into<String>,
    ) -> Self {
        Self {
            aggregator: WalletAggregator::new(network, page_limit),
            registry: TokenRegistryCache::new(network),
            hidden,
            currency: currency.into(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.network,
            config.tokens_page_limit,
            config.hidden_token_ids.clone(),
            config.fiat_currency.clone(),
        )
    }

    pub fn aggregator(&self) -> &WalletAggregator {
        &self.aggregator
    }

    /// Aggregates `queries`, resolves every token and prices the listed ones.
    /// A failed price lookup leaves worth unknown instead of failing.
    pub async fn snapshot<A>(
        &mut self,
        api: &A,
        store: Option<&CacheRepository<'_>>,
        queries: &[AddressQuery],
        show_hidden: bool,
        now_secs: u64,
    ) -> Result<Portfolio>
    where
        A: ExplorerApi + ?Sized,
    {
        let registry = self.registry.get_or_fetch(api, store, now_secs).await?;
        let hidden = (!show_hidden).then_some(&self.hidden);

        let wallet_tokens = self
            .aggregator
            .aggregate_tokens(api, registry, queries, hidden)
            .await?;
        let resolved = self
            .aggregator
            .resolve_tokens(api, registry, &wallet_tokens)
            .await;

        let symbols: Vec<String> = resolved
            .iter()
            .filter_map(|(token, _)| match token {
                Token::Listed(listed) => Some(listed.symbol.clone()),
                Token::Unlisted(_) | Token::Nft(_) | Token::NonStandard(_) => None,
            })
            .collect();
        let prices = match PriceTable::fetch(api, &symbols, &self.currency).await {
            Ok(prices) => prices,
            Err(e) => {
                warn!("Price lookup failed, worth unavailable: {:#}", e);
                PriceTable::new()
            }
        };

        let mut tokens = attach_worth(resolved, &prices);
        sort_tokens(&mut tokens);
        let total = total_worth(&tokens);

        info!(
            "Portfolio: {} tokens worth {:.2} {}",
            tokens.len(),
            total,
            self.currency
        );

        Ok(Portfolio {
            network: self.aggregator.network(),
            currency: self.currency.clone(),
            total_worth: total,
            tokens,
            is_loading: wallet_tokens.is_loading,
            has_error: wallet_tokens.has_error,
            failed_addresses: wallet_tokens.failed_addresses,
        })
    }

    /// Probes and snapshots `addresses` in one go.
    pub async fn load<A>(
        &mut self,
        api: &A,
        store: Option<&CacheRepository<'_>>,
        addresses: &[String],
        show_hidden: bool,
        now_secs: u64,
    ) -> Result<Portfolio>
    where
        A: ExplorerApi + ?Sized,
    {
        let (queries, probe_failures) = probe_queries(api, addresses).await;
        let mut portfolio = self
            .snapshot(api, store, &queries, show_hidden, now_secs)
            .await?;
        if !probe_failures.is_empty() {
            portfolio.has_error = true;
            portfolio.failed_addresses.extend(probe_failures);
        }
        Ok(portfolio)
    }
}
