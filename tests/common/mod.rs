//! In-memory explorer used by the integration tests.
#![allow(dead_code)]

use alephium_portfolio::explorer::{
    AddressBalanceDto, AddressTokenBalanceDto, ExplorerApi, FungibleTokenMetadataDto,
    NftMetadataDto, TokenInfoDto, TokenListDto, TokenListEntryDto, TransactionDto,
};
use alephium_portfolio::network::NetworkId;
use alloy_primitives::U256;
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

pub const ADDR_A: &str = "1DrDyTr9RpRsQnDnXo2YRiPzPW4ooHX5LLoqXrqfMrpQH";
pub const ADDR_B: &str = "1BHSQ8HH5YpSdYmtvHgS5V6y2Uqd6zLhpYVuQ9ek1hNUC";

pub fn token_id(byte: u8) -> String {
    format!("{byte:02x}").repeat(32)
}

pub fn alph(units: u64) -> U256 {
    U256::from(units) * U256::from(10u64).pow(U256::from(18))
}

pub fn tx(hash: &str, timestamp: u64) -> TransactionDto {
    TransactionDto {
        hash: hash.to_string(),
        block_hash: format!("block-{hash}"),
        timestamp,
        inputs: vec![],
        outputs: vec![],
        gas_amount: 20_000,
        gas_price: Some(U256::from(100_000_000_000u64)),
        coinbase: false,
    }
}

#[derive(Default)]
pub struct MockState {
    pub alph: HashMap<String, (U256, U256)>,
    pub tokens: HashMap<String, Vec<(String, U256)>>,
    pub address_txs: HashMap<String, Vec<String>>,
    pub failing_addresses: HashSet<String>,
    /// Only the ALPH balance endpoint fails for these.
    pub failing_balances: HashSet<String>,
    pub interfaces: HashMap<String, String>,
    pub fungible: HashMap<String, (String, String, u8)>,
    pub prices: HashMap<String, f64>,
    pub listed: Vec<TokenListEntryDto>,
    /// Newest first.
    pub wallet_txs: Vec<TransactionDto>,
    pub fail_token_infos: bool,
    pub fail_prices: bool,
    pub failing_pages: HashSet<u32>,
}

#[derive(Default)]
pub struct MockExplorer {
    pub state: Mutex<MockState>,
    pub balance_calls: AtomicUsize,
    pub token_page_calls: AtomicUsize,
    pub latest_calls: AtomicUsize,
    pub wallet_tx_calls: AtomicUsize,
    pub token_info_calls: AtomicUsize,
    pub fungible_calls: AtomicUsize,
    pub token_list_calls: AtomicUsize,
}

impl MockExplorer {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_state(self, f: impl FnOnce(&mut MockState)) -> Self {
        f(&mut self.state.lock().unwrap());
        self
    }

    pub fn with_alph(self, address: &str, total: U256) -> Self {
        self.with_state(|s| {
            s.alph.insert(address.to_string(), (total, U256::ZERO));
        })
    }

    pub fn with_token(self, address: &str, id: &str, amount: U256) -> Self {
        self.with_state(|s| {
            s.tokens
                .entry(address.to_string())
                .or_default()
                .push((id.to_string(), amount));
        })
    }

    pub fn with_latest(self, address: &str, hashes: &[&str]) -> Self {
        self.with_state(|s| {
            s.address_txs.insert(
                address.to_string(),
                hashes.iter().map(|h| h.to_string()).collect(),
            );
        })
    }

    pub fn with_interface(self, id: &str, interface: &str) -> Self {
        self.with_state(|s| {
            s.interfaces.insert(id.to_string(), interface.to_string());
        })
    }

    pub fn with_fungible(self, id: &str, symbol: &str, name: &str, decimals: u8) -> Self {
        self.with_state(|s| {
            s.interfaces.insert(id.to_string(), "fungible".to_string());
            s.fungible
                .insert(id.to_string(), (symbol.to_string(), name.to_string(), decimals));
        })
    }

    pub fn with_listed(self, id: &str, symbol: &str, name: &str, decimals: u8) -> Self {
        self.with_state(|s| {
            s.listed.push(TokenListEntryDto {
                id: id.to_string(),
                name: name.to_string(),
                symbol: symbol.to_string(),
                decimals,
                logo_uri: None,
                description: None,
            });
        })
    }

    pub fn with_price(self, symbol: &str, price: f64) -> Self {
        self.with_state(|s| {
            s.prices.insert(symbol.to_string(), price);
        })
    }

    pub fn with_wallet_txs(self, txs: Vec<TransactionDto>) -> Self {
        self.with_state(|s| s.wallet_txs = txs)
    }

    pub fn set_latest(&self, address: &str, hashes: &[&str]) {
        self.state.lock().unwrap().address_txs.insert(
            address.to_string(),
            hashes.iter().map(|h| h.to_string()).collect(),
        );
    }

    pub fn set_alph(&self, address: &str, total: U256) {
        self.state
            .lock()
            .unwrap()
            .alph
            .insert(address.to_string(), (total, U256::ZERO));
    }

    pub fn fail_address(&self, address: &str) {
        self.state
            .lock()
            .unwrap()
            .failing_addresses
            .insert(address.to_string());
    }

    pub fn set_balance_failing(&self, address: &str, failing: bool) {
        let mut state = self.state.lock().unwrap();
        if failing {
            state.failing_balances.insert(address.to_string());
        } else {
            state.failing_balances.remove(address);
        }
    }

    pub fn set_fail_token_infos(&self, fail: bool) {
        self.state.lock().unwrap().fail_token_infos = fail;
    }

    pub fn set_fail_prices(&self, fail: bool) {
        self.state.lock().unwrap().fail_prices = fail;
    }

    pub fn fail_page(&self, page: u32) {
        self.state.lock().unwrap().failing_pages.insert(page);
    }

    pub fn push_wallet_tx(&self, tx: TransactionDto) {
        self.state.lock().unwrap().wallet_txs.insert(0, tx);
    }

    pub fn calls(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }
}

fn paginate<T: Clone>(items: &[T], page: u32, limit: u32) -> Vec<T> {
    let start = (page.saturating_sub(1) * limit) as usize;
    items.iter().skip(start).take(limit as usize).cloned().collect()
}

#[async_trait]
impl ExplorerApi for MockExplorer {
    async fn address_balance(&self, address: &str) -> Result<AddressBalanceDto> {
        self.balance_calls.fetch_add(1, Ordering::SeqCst);
        let state = self.state.lock().unwrap();
        if state.failing_addresses.contains(address) || state.failing_balances.contains(address) {
            return Err(anyhow!("HTTP 503 for {address}"));
        }
        let (balance, locked_balance) = state.alph.get(address).copied().unwrap_or_default();
        Ok(AddressBalanceDto {
            balance,
            locked_balance,
        })
    }

    async fn address_tokens_balance(
        &self,
        address: &str,
        page: u32,
        limit: u32,
    ) -> Result<Vec<AddressTokenBalanceDto>> {
        self.token_page_calls.fetch_add(1, Ordering::SeqCst);
        let state = self.state.lock().unwrap();
        if state.failing_addresses.contains(address) {
            return Err(anyhow!("HTTP 503 for {address}"));
        }
        let tokens = state.tokens.get(address).cloned().unwrap_or_default();
        Ok(paginate(&tokens, page, limit)
            .into_iter()
            .map(|(token_id, balance)| AddressTokenBalanceDto {
                token_id,
                balance,
                locked_balance: U256::ZERO,
            })
            .collect())
    }

    async fn address_transactions(
        &self,
        address: &str,
        page: u32,
        limit: u32,
    ) -> Result<Vec<TransactionDto>> {
        self.latest_calls.fetch_add(1, Ordering::SeqCst);
        let state = self.state.lock().unwrap();
        if state.failing_addresses.contains(address) {
            return Err(anyhow!("HTTP 503 for {address}"));
        }
        let hashes = state.address_txs.get(address).cloned().unwrap_or_default();
        Ok(paginate(&hashes, page, limit)
            .iter()
            .map(|hash| tx(hash, 0))
            .collect())
    }

    async fn wallet_transactions(
        &self,
        _addresses: &[String],
        page: u32,
        limit: u32,
        to_ts: Option<u64>,
    ) -> Result<Vec<TransactionDto>> {
        self.wallet_tx_calls.fetch_add(1, Ordering::SeqCst);
        let state = self.state.lock().unwrap();
        if state.failing_pages.contains(&page) {
            return Err(anyhow!("HTTP 502 on page {page}"));
        }
        let visible: Vec<TransactionDto> = state
            .wallet_txs
            .iter()
            .filter(|tx| to_ts.is_none_or(|ts| tx.timestamp <= ts))
            .cloned()
            .collect();
        Ok(paginate(&visible, page, limit))
    }

    async fn token_infos(&self, ids: &[String]) -> Result<Vec<TokenInfoDto>> {
        self.token_info_calls.fetch_add(1, Ordering::SeqCst);
        let state = self.state.lock().unwrap();
        if state.fail_token_infos {
            return Err(anyhow!("HTTP 500 on /tokens"));
        }
        Ok(ids
            .iter()
            .filter_map(|id| {
                state.interfaces.get(id).map(|interface| TokenInfoDto {
                    token: id.clone(),
                    std_interface_id: Some(interface.clone()),
                })
            })
            .collect())
    }

    async fn fungible_metadata(&self, ids: &[String]) -> Result<Vec<FungibleTokenMetadataDto>> {
        self.fungible_calls.fetch_add(1, Ordering::SeqCst);
        let state = self.state.lock().unwrap();
        Ok(ids
            .iter()
            .filter_map(|id| {
                state
                    .fungible
                    .get(id)
                    .map(|(symbol, name, decimals)| FungibleTokenMetadataDto {
                        id: id.clone(),
                        symbol: hex::encode(symbol),
                        name: hex::encode(name),
                        decimals: *decimals,
                    })
            })
            .collect())
    }

    async fn nft_metadata(&self, _ids: &[String]) -> Result<Vec<NftMetadataDto>> {
        Ok(vec![])
    }

    async fn prices(&self, symbols: &[String], _currency: &str) -> Result<Vec<Option<f64>>> {
        let state = self.state.lock().unwrap();
        if state.fail_prices {
            return Err(anyhow!("HTTP 500 on /market/prices"));
        }
        Ok(symbols.iter().map(|s| state.prices.get(s).copied()).collect())
    }

    async fn token_list(&self, network: NetworkId) -> Result<TokenListDto> {
        self.token_list_calls.fetch_add(1, Ordering::SeqCst);
        let state = self.state.lock().unwrap();
        Ok(TokenListDto {
            network_id: network.chain_id(),
            tokens: state.listed.clone(),
        })
    }
}
