use crate::amount::Balance;
use crate::cache::QueryCache;
use crate::explorer::ExplorerApi;
use crate::network::NetworkId;
use crate::tokens::{ALPH_TOKEN_ID, TokenId};
use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{debug, warn};

/// Upper bound on token-balance pages read for one address.
const MAX_TOKEN_PAGES: u32 = 100;

/// Hashes of the two most recent transactions of an address.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct LatestTransactions {
    pub latest: Option<String>,
    pub previous: Option<String>,
}

/// Cache key for one address's balances. A new transaction changes the key,
/// which is what invalidates the cached balances.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BalanceQueryKey {
    pub address: String,
    pub latest_tx_hash: Option<String>,
    pub previous_tx_hash: Option<String>,
    pub network: NetworkId,
}

impl BalanceQueryKey {
    pub fn new(address: &str, latest: &LatestTransactions, network: NetworkId) -> Self {
        Self {
            address: address.to_string(),
            latest_tx_hash: latest.latest.clone(),
            previous_tx_hash: latest.previous.clone(),
            network,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AddressTokenBalance {
    pub token_id: TokenId,
    pub balance: Balance,
}

pub async fn fetch_latest_transactions<A>(api: &A, address: &str) -> Result<LatestTransactions>
where
    A: ExplorerApi + ?Sized,
{
    let txs = api
        .address_transactions(address, 1, 2)
        .await
        .with_context(|| format!("Failed to fetch latest transactions of {address}"))?;

    let mut hashes = txs.into_iter().map(|tx| tx.hash);
    Ok(LatestTransactions {
        latest: hashes.next(),
        previous: hashes.next(),
    })
}

/// ALPH balance first, then every token balance page of `address`.
pub async fn fetch_address_balances<A>(
    api: &A,
    address: &str,
    page_limit: u32,
) -> Result<Vec<AddressTokenBalance>>
where
    A: ExplorerApi + ?Sized,
{
    let alph = api
        .address_balance(address)
        .await
        .with_context(|| format!("Failed to fetch ALPH balance of {address}"))?;

    let mut balances = vec![AddressTokenBalance {
        token_id: ALPH_TOKEN_ID.to_string(),
        balance: Balance::new(alph.balance, alph.locked_balance),
    }];

    for page in 1..=MAX_TOKEN_PAGES {
        let batch = api
            .address_tokens_balance(address, page, page_limit)
            .await
            .with_context(|| format!("Failed to fetch token balances of {address} (page {page})"))?;

        let count = batch.len();
        balances.extend(batch.into_iter().map(|t| AddressTokenBalance {
            token_id: t.token_id,
            balance: Balance::new(t.balance, t.locked_balance),
        }));

        if count < page_limit as usize {
            break;
        }
        if page == MAX_TOKEN_PAGES {
            warn!("Stopped reading token balances of {} after {} pages", address, page);
        }
    }

    debug!("Fetched {} balances for {}", balances.len(), address);
    Ok(balances)
}

/// Per-address balance cache keyed by [`BalanceQueryKey`].
#[derive(Debug, Default)]
pub struct BalanceCache {
    inner: QueryCache<BalanceQueryKey, Vec<AddressTokenBalance>>,
}

impl BalanceCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&mut self, key: &BalanceQueryKey) -> Option<Vec<AddressTokenBalance>> {
        self.inner.get(key).cloned()
    }

    pub fn contains(&self, key: &BalanceQueryKey) -> bool {
        self.inner.contains(key)
    }

    /// Stores `balances` under `key`, dropping entries of the same address
    /// and network recorded under older transaction hashes.
    pub fn store(&mut self, key: BalanceQueryKey, balances: Vec<AddressTokenBalance>) {
        let evicted = self
            .inner
            .invalidate_where(|k| k.address == key.address && k.network == key.network && *k != key);
        if evicted > 0 {
            debug!("Evicted {} stale balance entries for {}", evicted, key.address);
        }
        self.inner.insert(key, balances);
    }

    pub fn invalidate_address(&mut self, address: &str) -> usize {
        self.inner.invalidate_where(|k| k.address == address)
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

/// Balances of one address, served from `cache` when the key is unchanged.
/// `skip` suppresses the fetch entirely and yields `None`.
pub async fn fetch_address_balances_cached<A>(
    cache: &mut BalanceCache,
    api: &A,
    key: &BalanceQueryKey,
    skip: bool,
    page_limit: u32,
) -> Result<Option<Vec<AddressTokenBalance>>>
where
    A: ExplorerApi + ?Sized,
{
    if skip {
        return Ok(None);
    }
    if let Some(balances) = cache.get(key) {
        return Ok(Some(balances));
    }

    let balances = fetch_address_balances(api, &key.address, page_limit).await?;
    cache.store(key.clone(), balances.clone());
    Ok(Some(balances))
}
