use super::types::{
    AddressBalanceDto, AddressTokenBalanceDto, FungibleTokenMetadataDto, NftMetadataDto,
    TokenInfoDto, TokenListDto, TransactionDto,
};
use super::ExplorerApi;
use crate::config::Config;
use crate::network::NetworkId;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::time::timeout;
use tokio_retry::Retry;
use tokio_retry::strategy::{ExponentialBackoff, jitter};
use tracing::{debug, warn};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
struct Request {
    path: String,
    body: Option<Value>,
    // absolute URLs bypass endpoint rotation
    absolute: bool,
}

impl Request {
    fn get(path: String) -> Self {
        Self {
            path,
            body: None,
            absolute: false,
        }
    }

    fn post(path: String, body: Value) -> Self {
        Self {
            path,
            body: Some(body),
            absolute: false,
        }
    }
}

/// HTTP client for the explorer backend.
///
/// Transient failures (timeouts, connection errors, 5xx, 429) are retried with
/// exponential backoff and rotate to the next configured endpoint. Other 4xx
/// responses and undecodable bodies fail immediately.
#[derive(Clone)]
pub struct ExplorerClient {
    http: reqwest::Client,
    urls: Vec<String>,
    token_list_url: String,
    current_url: Arc<AtomicUsize>,
    max_retries: usize,
}

impl ExplorerClient {
    pub fn new(urls: &[String], token_list_url: &str, max_retries: usize) -> Result<Self> {
        if urls.is_empty() {
            return Err(anyhow::anyhow!("At least one explorer URL must be provided"));
        }

        for url in urls {
            reqwest::Url::parse(url).map_err(|_| anyhow::anyhow!("Invalid explorer URL: {}", url))?;
        }

        let http = reqwest::Client::builder()
            .build()
            .context("Failed to build HTTP client")?;

        Ok(ExplorerClient {
            http,
            urls: urls
                .iter()
                .map(|u| u.trim_end_matches('/').to_string())
                .collect(),
            token_list_url: token_list_url.to_string(),
            current_url: Arc::new(AtomicUsize::new(0)),
            max_retries,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(
            &config.explorer_urls,
            &config.token_list_url,
            config.max_retries,
        )
    }

    pub fn get_current_url(&self) -> &str {
        let index = self.current_url.load(Ordering::Relaxed) % self.urls.len();
        &self.urls[index]
    }

    pub fn rotate_endpoint(&self) {
        let current = self.current_url.load(Ordering::Relaxed);
        let next = (current + 1) % self.urls.len();
        self.current_url.store(next, Ordering::Relaxed);

        if self.urls.len() > 1 {
            debug!("Rotating to explorer endpoint #{}", next);
        }
    }

    fn get_retry_strategy(&self) -> impl Iterator<Item = Duration> {
        ExponentialBackoff::from_millis(100)
            .factor(2)
            .max_delay(Duration::from_secs(10))
            .map(jitter)
            .take(self.max_retries)
    }

    fn handle_error(&self, error_str: &str) {
        warn!(
            "Explorer error on {}: {}, rotating endpoint",
            self.get_current_url(),
            error_str
        );
        self.rotate_endpoint();
    }

    fn handle_timeout(&self) -> anyhow::Error {
        warn!(
            "Request timeout after {} seconds on {}, rotating endpoint",
            REQUEST_TIMEOUT.as_secs(),
            self.get_current_url()
        );
        self.rotate_endpoint();
        anyhow::anyhow!("Request timeout after {} seconds", REQUEST_TIMEOUT.as_secs())
    }

    fn url_for(&self, request: &Request) -> String {
        if request.absolute {
            request.path.clone()
        } else {
            format!("{}{}", self.get_current_url(), request.path)
        }
    }

    async fn execute<T: DeserializeOwned>(&self, request: Request) -> Result<T> {
        let client = self.clone();
        let path = request.path.clone();

        let value = Retry::spawn(self.get_retry_strategy(), move || {
            let client = client.clone();
            let request = request.clone();
            async move {
                let url = client.url_for(&request);
                let builder = match &request.body {
                    Some(body) => client.http.post(&url).json(body),
                    None => client.http.get(&url),
                };

                match timeout(REQUEST_TIMEOUT, builder.send()).await {
                    Ok(Ok(response)) => {
                        let status = response.status();
                        if status.is_success() {
                            match response.json::<Value>().await {
                                Ok(value) => Ok(Ok(value)),
                                Err(e) => Ok(Err(anyhow::anyhow!("Invalid JSON from {}: {}", url, e))),
                            }
                        } else if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
                            client.handle_error(&format!("HTTP {status}"));
                            Err(anyhow::anyhow!("{} returned {}", url, status))
                        } else {
                            let body = response.text().await.unwrap_or_default();
                            // client errors are not worth retrying
                            Ok(Err(anyhow::anyhow!("{} returned {}: {}", url, status, body)))
                        }
                    }
                    Ok(Err(e)) => {
                        client.handle_error(&e.to_string());
                        Err(anyhow::anyhow!("{}", e))
                    }
                    Err(_) => Err(client.handle_timeout()),
                }
            }
        })
        .await
        .and_then(|r| r)?;

        serde_json::from_value(value).with_context(|| format!("Unexpected response shape for {path}"))
    }
}

#[async_trait]
impl ExplorerApi for ExplorerClient {
    async fn address_balance(&self, address: &str) -> Result<AddressBalanceDto> {
        self.execute(Request::get(format!("/addresses/{address}/balance")))
            .await
    }

    async fn address_tokens_balance(
        &self,
        address: &str,
        page: u32,
        limit: u32,
    ) -> Result<Vec<AddressTokenBalanceDto>> {
        self.execute(Request::get(format!(
            "/addresses/{address}/tokens-balance?page={page}&limit={limit}"
        )))
        .await
    }

    async fn address_transactions(
        &self,
        address: &str,
        page: u32,
        limit: u32,
    ) -> Result<Vec<TransactionDto>> {
        self.execute(Request::get(format!(
            "/addresses/{address}/transactions?page={page}&limit={limit}"
        )))
        .await
    }

    async fn wallet_transactions(
        &self,
        addresses: &[String],
        page: u32,
        limit: u32,
        to_ts: Option<u64>,
    ) -> Result<Vec<TransactionDto>> {
        let mut path = format!("/addresses/transactions?page={page}&limit={limit}");
        if let Some(ts) = to_ts {
            path.push_str(&format!("&toTs={ts}"));
        }
        self.execute(Request::post(path, serde_json::json!(addresses)))
            .await
    }

    async fn token_infos(&self, ids: &[String]) -> Result<Vec<TokenInfoDto>> {
        self.execute(Request::post("/tokens".to_string(), serde_json::json!(ids)))
            .await
    }

    async fn fungible_metadata(&self, ids: &[String]) -> Result<Vec<FungibleTokenMetadataDto>> {
        self.execute(Request::post(
            "/tokens/fungible-metadata".to_string(),
            serde_json::json!(ids),
        ))
        .await
    }

    async fn nft_metadata(&self, ids: &[String]) -> Result<Vec<NftMetadataDto>> {
        self.execute(Request::post(
            "/tokens/nft-metadata".to_string(),
            serde_json::json!(ids),
        ))
        .await
    }

    async fn prices(&self, symbols: &[String], currency: &str) -> Result<Vec<Option<f64>>> {
        self.execute(Request::post(
            format!("/market/prices?currency={currency}"),
            serde_json::json!(symbols),
        ))
        .await
    }

    async fn token_list(&self, network: NetworkId) -> Result<TokenListDto> {
        let list: TokenListDto = self
            .execute(Request {
                path: self.token_list_url.clone(),
                body: None,
                absolute: true,
            })
            .await?;

        if list.network_id != network.chain_id() {
            warn!(
                "Token list network id {} does not match {} ({})",
                list.network_id,
                network,
                network.chain_id()
            );
        }
        Ok(list)
    }
}
