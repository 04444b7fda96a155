pub mod client;
pub mod types;

pub use client::ExplorerClient;
pub use types::{
    AddressBalanceDto, AddressTokenBalanceDto, FungibleTokenMetadataDto, InputDto,
    NftMetadataDto, OutputDto, TokenAmountDto, TokenInfoDto, TokenListDto, TokenListEntryDto,
    TransactionDto,
};

use crate::network::NetworkId;
use anyhow::Result;
use async_trait::async_trait;

/// Upper bound on ids per batched token request accepted by the explorer.
pub const TOKENS_QUERY_LIMIT: usize = 80;

/// Read-only view of the explorer backend consumed by the aggregation layer.
#[async_trait]
pub trait ExplorerApi: Send + Sync {
    async fn address_balance(&self, address: &str) -> Result<AddressBalanceDto>;

    async fn address_tokens_balance(
        &self,
        address: &str,
        page: u32,
        limit: u32,
    ) -> Result<Vec<AddressTokenBalanceDto>>;

    /// Newest first.
    async fn address_transactions(
        &self,
        address: &str,
        page: u32,
        limit: u32,
    ) -> Result<Vec<TransactionDto>>;

    /// Transactions touching any of `addresses`, newest first, optionally
    /// restricted to those not newer than `to_ts` (ms).
    async fn wallet_transactions(
        &self,
        addresses: &[String],
        page: u32,
        limit: u32,
        to_ts: Option<u64>,
    ) -> Result<Vec<TransactionDto>>;

    async fn token_infos(&self, ids: &[String]) -> Result<Vec<TokenInfoDto>>;

    async fn fungible_metadata(&self, ids: &[String]) -> Result<Vec<FungibleTokenMetadataDto>>;

    async fn nft_metadata(&self, ids: &[String]) -> Result<Vec<NftMetadataDto>>;

    /// One entry per requested symbol, `None` when the market has no price.
    async fn prices(&self, symbols: &[String], currency: &str) -> Result<Vec<Option<f64>>>;

    async fn token_list(&self, network: NetworkId) -> Result<TokenListDto>;
}
