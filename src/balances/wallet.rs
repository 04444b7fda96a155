use super::address::{
    AddressTokenBalance, BalanceCache, BalanceQueryKey, LatestTransactions,
    fetch_address_balances, fetch_latest_transactions,
};
use crate::amount::{Balance, sum_balances};
use crate::explorer::ExplorerApi;
use crate::network::NetworkId;
use crate::tokens::{
    ClassifiedTokenIds, ListedFt, Token, TokenClassifier, TokenId, TokenMetadataCache,
    TokenRegistry,
};
use anyhow::{Context, Result};
use futures::future::join_all;
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, info, warn};

/// One wallet address as seen by the aggregator. `latest` is `None` while the
/// latest-transaction probe for the address has not completed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressQuery {
    pub address: String,
    pub latest: Option<LatestTransactions>,
}

impl AddressQuery {
    pub fn new(address: impl Into<String>, latest: Option<LatestTransactions>) -> Self {
        Self {
            address: address.into(),
            latest,
        }
    }
}

/// Wallet-wide totals per token id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WalletBalances {
    pub balances: BTreeMap<TokenId, Balance>,
    /// Some address had no usable key yet and was skipped.
    pub is_loading: bool,
    /// Some address failed to load and contributed zero.
    pub has_error: bool,
    pub failed_addresses: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListedFtBalance {
    pub token: ListedFt,
    pub balance: Balance,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenBalance {
    pub id: TokenId,
    pub balance: Balance,
}

/// Wallet totals split by token classification.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WalletTokens {
    pub listed_fts: Vec<ListedFtBalance>,
    /// Every token that is not a listed fungible token.
    pub unlisted_tokens: Vec<TokenBalance>,
    pub unlisted_ft_ids: Vec<TokenId>,
    pub nft_ids: Vec<TokenId>,
    pub nst_ids: Vec<TokenId>,
    pub is_loading: bool,
    pub has_error: bool,
    pub failed_addresses: Vec<String>,
}

impl WalletTokens {
    pub fn balance_of(&self, id: &str) -> Option<Balance> {
        self.listed_fts
            .iter()
            .find(|t| t.token.id == id)
            .map(|t| t.balance)
            .or_else(|| {
                self.unlisted_tokens
                    .iter()
                    .find(|t| t.id == id)
                    .map(|t| t.balance)
            })
    }
}

/// Sums per-address balance lists into wallet totals. A token missing from
/// an address's list contributes zero for that address. The result does not
/// depend on the order of the lists.
pub fn fold_address_balances<'a, I>(per_address: I) -> Result<BTreeMap<TokenId, Balance>>
where
    I: IntoIterator<Item = &'a [AddressTokenBalance]>,
{
    let mut by_token: BTreeMap<&TokenId, Vec<&Balance>> = BTreeMap::new();
    for balances in per_address {
        for entry in balances {
            by_token.entry(&entry.token_id).or_default().push(&entry.balance);
        }
    }

    by_token
        .into_iter()
        .map(|(id, balances)| -> Result<(TokenId, Balance)> {
            let total = sum_balances(balances.into_iter().map(Some))
                .with_context(|| format!("Summing {id}"))?;
            Ok((id.clone(), total))
        })
        .collect()
}

/// Runs the latest-transaction probe for every address concurrently.
pub async fn probe_latest_transactions<A>(
    api: &A,
    addresses: &[String],
) -> Vec<(String, Result<LatestTransactions>)>
where
    A: ExplorerApi + ?Sized,
{
    join_all(addresses.iter().map(|address| async move {
        (address.clone(), fetch_latest_transactions(api, address).await)
    }))
    .await
}

/// Folds per-address balance queries into wallet totals, memoizing each
/// address under its [`BalanceQueryKey`].
#[derive(Debug)]
pub struct WalletAggregator {
    network: NetworkId,
    page_limit: u32,
    balance_cache: BalanceCache,
    classifier: TokenClassifier,
    metadata: TokenMetadataCache,
}

impl WalletAggregator {
    pub fn new(network: NetworkId, page_limit: u32) -> Self {
        Self {
            network,
            page_limit,
            balance_cache: BalanceCache::new(),
            classifier: TokenClassifier::new(),
            metadata: TokenMetadataCache::new(),
        }
    }

    pub fn network(&self) -> NetworkId {
        self.network
    }

    pub fn classifier(&self) -> &TokenClassifier {
        &self.classifier
    }

    pub fn balance_cache(&self) -> &BalanceCache {
        &self.balance_cache
    }

    pub async fn aggregate<A>(&mut self, api: &A, queries: &[AddressQuery]) -> Result<WalletBalances>
    where
        A: ExplorerApi + ?Sized,
    {
        let mut wallet = WalletBalances::default();
        let mut loaded: Vec<Vec<AddressTokenBalance>> = Vec::with_capacity(queries.len());
        let mut to_fetch: Vec<BalanceQueryKey> = Vec::new();
        let mut seen: HashSet<&str> = HashSet::new();

        for query in queries {
            if !seen.insert(query.address.as_str()) {
                continue;
            }
            let Some(latest) = &query.latest else {
                debug!("Skipping {} until its latest transactions are known", query.address);
                wallet.is_loading = true;
                continue;
            };

            let key = BalanceQueryKey::new(&query.address, latest, self.network);
            match self.balance_cache.get(&key) {
                Some(balances) => loaded.push(balances),
                None => to_fetch.push(key),
            }
        }

        let page_limit = self.page_limit;
        let results = join_all(to_fetch.into_iter().map(|key| async move {
            let result = fetch_address_balances(api, &key.address, page_limit).await;
            (key, result)
        }))
        .await;

        for (key, result) in results {
            match result {
                Ok(balances) => {
                    self.balance_cache.store(key, balances.clone());
                    loaded.push(balances);
                }
                Err(e) => {
                    warn!("Balance fetch failed for {}: {:#}", key.address, e);
                    wallet.has_error = true;
                    wallet.failed_addresses.push(key.address);
                }
            }
        }

        wallet.balances = fold_address_balances(loaded.iter().map(Vec::as_slice))?;
        info!(
            "Aggregated {} tokens over {} addresses (loading: {}, errors: {})",
            wallet.balances.len(),
            queries.len(),
            wallet.is_loading,
            wallet.failed_addresses.len()
        );
        Ok(wallet)
    }

    /// Aggregates and splits the totals by classification. Ids in `hidden`
    /// are removed from every bucket.
    pub async fn aggregate_tokens<A>(
        &mut self,
        api: &A,
        registry: &TokenRegistry,
        queries: &[AddressQuery],
        hidden: Option<&HashSet<TokenId>>,
    ) -> Result<WalletTokens>
    where
        A: ExplorerApi + ?Sized,
    {
        let wallet = self.aggregate(api, queries).await?;

        let ids: Vec<TokenId> = wallet
            .balances
            .keys()
            .filter(|id| hidden.is_none_or(|h| !h.contains(*id)))
            .cloned()
            .collect();

        let classified = self.classifier.classify_many(api, registry, &ids).await;
        Ok(split_by_classification(&wallet, registry, classified))
    }

    /// Full token values for every aggregated token, paired with its total.
    pub async fn resolve_tokens<A>(
        &mut self,
        api: &A,
        registry: &TokenRegistry,
        tokens: &WalletTokens,
    ) -> Vec<(Token, Balance)>
    where
        A: ExplorerApi + ?Sized,
    {
        let classified = ClassifiedTokenIds {
            listed_ft_ids: tokens.listed_fts.iter().map(|t| t.token.id.clone()).collect(),
            unlisted_ft_ids: tokens.unlisted_ft_ids.clone(),
            nft_ids: tokens.nft_ids.clone(),
            nst_ids: tokens.nst_ids.clone(),
            incomplete: false,
        };

        self.metadata
            .resolve(api, registry, &classified)
            .await
            .into_iter()
            .filter_map(|token| {
                let balance = tokens.balance_of(token.id())?;
                Some((token, balance))
            })
            .collect()
    }
}

fn split_by_classification(
    wallet: &WalletBalances,
    registry: &TokenRegistry,
    classified: ClassifiedTokenIds,
) -> WalletTokens {
    let balance = |id: &TokenId| wallet.balances.get(id).copied().unwrap_or_default();

    let mut classified = classified;
    let mut listed_fts = Vec::with_capacity(classified.listed_ft_ids.len());
    for id in std::mem::take(&mut classified.listed_ft_ids) {
        match registry.get(&id) {
            Some(token) => listed_fts.push(ListedFtBalance {
                token: token.clone(),
                balance: balance(&id),
            }),
            None => {
                debug!("{} is no longer listed, treating it as unlisted", id);
                classified.unlisted_ft_ids.push(id);
            }
        }
    }
    classified.unlisted_ft_ids.sort();

    let mut unlisted_tokens: Vec<TokenBalance> = classified
        .unlisted_ft_ids
        .iter()
        .chain(&classified.nft_ids)
        .chain(&classified.nst_ids)
        .map(|id| TokenBalance {
            id: id.clone(),
            balance: balance(id),
        })
        .collect();
    unlisted_tokens.sort_by(|a, b| a.id.cmp(&b.id));

    WalletTokens {
        listed_fts,
        unlisted_tokens,
        unlisted_ft_ids: classified.unlisted_ft_ids,
        nft_ids: classified.nft_ids,
        nst_ids: classified.nst_ids,
        is_loading: wallet.is_loading,
        has_error: wallet.has_error || classified.incomplete,
        failed_addresses: wallet.failed_addresses.clone(),
    }
}
