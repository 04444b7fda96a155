use crate::addresses::is_valid_address;
use crate::network::NetworkId;
use crate::tokens::is_valid_token_id;
use anyhow::{Context, Result};
use std::collections::HashSet;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub network: NetworkId,
    pub explorer_urls: Vec<String>,
    pub token_list_url: String,
    pub database_url: String,
    pub wallet_addresses: Vec<String>,
    pub hidden_token_ids: HashSet<String>,
    pub fiat_currency: String,
    pub max_retries: usize,
    pub poll_interval: Duration,
    pub tokens_page_limit: u32,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let network: NetworkId = lookup("NETWORK")
            .unwrap_or_else(|| "mainnet".to_string())
            .parse()
            .context("Invalid NETWORK")?;

        let explorer_urls = lookup("EXPLORER_URLS")
            .map(|raw| split_list(&raw))
            .filter(|urls| !urls.is_empty())
            .unwrap_or_else(|| vec![network.default_explorer_url().to_string()]);

        let token_list_url =
            lookup("TOKEN_LIST_URL").unwrap_or_else(|| network.default_token_list_url());

        let database_url =
            lookup("DATABASE_URL").unwrap_or_else(|| "sqlite:./wallet-cache.db".to_string());

        let wallet_addresses = split_list(
            &lookup("WALLET_ADDRESSES").context("WALLET_ADDRESSES must be set in .env")?,
        );
        if wallet_addresses.is_empty() {
            anyhow::bail!("WALLET_ADDRESSES must contain at least one address");
        }
        if let Some(bad) = wallet_addresses.iter().find(|a| !is_valid_address(a)) {
            anyhow::bail!("Invalid address in WALLET_ADDRESSES: {}", bad);
        }

        let hidden_token_ids: HashSet<String> = lookup("HIDDEN_TOKEN_IDS")
            .map(|raw| split_list(&raw))
            .unwrap_or_default()
            .into_iter()
            .collect();
        if let Some(bad) = hidden_token_ids.iter().find(|id| !is_valid_token_id(id)) {
            anyhow::bail!("Invalid token id in HIDDEN_TOKEN_IDS: {}", bad);
        }

        let fiat_currency = lookup("FIAT_CURRENCY")
            .unwrap_or_else(|| "usd".to_string())
            .to_lowercase();

        let max_retries = parse_or(&lookup, "MAX_RETRIES", 5usize)?;
        let poll_interval = Duration::from_secs(parse_or(&lookup, "POLL_INTERVAL_SECS", 12u64)?);
        let tokens_page_limit = parse_or(&lookup, "TOKENS_PAGE_LIMIT", 100u32)?;
        if tokens_page_limit == 0 {
            anyhow::bail!("TOKENS_PAGE_LIMIT must be positive");
        }

        Ok(Config {
            network,
            explorer_urls,
            token_list_url,
            database_url,
            wallet_addresses,
            hidden_token_ids,
            fiat_currency,
            max_retries,
            poll_interval,
            tokens_page_limit,
        })
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| anyhow::anyhow!("Invalid {} value: {}", key, raw)),
        None => Ok(default),
    }
}
