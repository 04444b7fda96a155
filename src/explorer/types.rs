use crate::amount::u256_decimal;
use alloy_primitives::U256;
use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressBalanceDto {
    #[serde(with = "u256_decimal")]
    pub balance: U256,
    #[serde(with = "u256_decimal")]
    pub locked_balance: U256,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressTokenBalanceDto {
    pub token_id: String,
    #[serde(with = "u256_decimal")]
    pub balance: U256,
    #[serde(with = "u256_decimal")]
    pub locked_balance: U256,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenAmountDto {
    pub id: String,
    #[serde(with = "u256_decimal")]
    pub amount: U256,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputDto {
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default, with = "u256_decimal::option")]
    pub atto_alph_amount: Option<U256>,
    #[serde(default)]
    pub tokens: Option<Vec<TokenAmountDto>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputDto {
    pub address: String,
    #[serde(with = "u256_decimal")]
    pub atto_alph_amount: U256,
    #[serde(default)]
    pub tokens: Option<Vec<TokenAmountDto>>,
    #[serde(default)]
    pub lock_time: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionDto {
    pub hash: String,
    #[serde(default)]
    pub block_hash: String,
    /// Milliseconds since the unix epoch.
    pub timestamp: u64,
    #[serde(default)]
    pub inputs: Vec<InputDto>,
    #[serde(default)]
    pub outputs: Vec<OutputDto>,
    #[serde(default)]
    pub gas_amount: u64,
    #[serde(default, with = "u256_decimal::option")]
    pub gas_price: Option<U256>,
    #[serde(default)]
    pub coinbase: bool,
}

impl TransactionDto {
    pub fn fee(&self) -> U256 {
        self.gas_price
            .map(|price| price.saturating_mul(U256::from(self.gas_amount)))
            .unwrap_or(U256::ZERO)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenInfoDto {
    pub token: String,
    #[serde(default)]
    pub std_interface_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FungibleTokenMetadataDto {
    pub id: String,
    pub symbol: String,
    pub name: String,
    #[serde(deserialize_with = "lenient_u8")]
    pub decimals: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NftMetadataDto {
    pub id: String,
    pub token_uri: String,
    pub collection_id: String,
    #[serde(default)]
    pub nft_index: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenListEntryDto {
    pub id: String,
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    #[serde(default, rename = "logoURI")]
    pub logo_uri: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenListDto {
    pub network_id: u8,
    pub tokens: Vec<TokenListEntryDto>,
}

// The explorer has returned decimals both as a JSON number and as a string.
fn lenient_u8<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u8, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Num(u8),
        Str(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Num(n) => Ok(n),
        Raw::Str(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}
