pub mod classifier;
pub mod metadata;
pub mod registry;

pub use classifier::{ClassifiedTokenIds, TokenClassifier};
pub use metadata::TokenMetadataCache;
pub use registry::{TokenRegistry, TokenRegistryCache};

use crate::amount::ALPH_DECIMALS;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

pub type TokenId = String;

pub const ALPH_TOKEN_ID: &str = "0000000000000000000000000000000000000000000000000000000000000000";
pub const ALPH_SYMBOL: &str = "ALPH";
pub const ALPH_NAME: &str = "Alephium";

static TOKEN_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9a-fA-F]{64}$").expect("token id regex is valid"));

pub fn is_valid_token_id(id: &str) -> bool {
    TOKEN_ID_RE.is_match(id)
}

/// The four mutually exclusive classifications of a token id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenKind {
    ListedFt,
    UnlistedFt,
    Nft,
    NonStandard,
}

impl TokenKind {
    /// Maps the explorer's `stdInterfaceId`. Unknown or missing values are non-standard.
    pub fn from_std_interface(id: Option<&str>) -> Self {
        match id {
            Some("fungible") => TokenKind::UnlistedFt,
            Some("non-fungible") => TokenKind::Nft,
            _ => TokenKind::NonStandard,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListedFt {
    pub id: TokenId,
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    pub logo_uri: Option<String>,
    pub description: Option<String>,
}

impl ListedFt {
    pub fn alph() -> Self {
        Self {
            id: ALPH_TOKEN_ID.to_string(),
            name: ALPH_NAME.to_string(),
            symbol: ALPH_SYMBOL.to_string(),
            decimals: ALPH_DECIMALS,
            logo_uri: None,
            description: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnlistedFt {
    pub id: TokenId,
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Nft {
    pub id: TokenId,
    pub collection_id: Option<String>,
    pub token_uri: Option<String>,
    pub nft_index: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NonStandardToken {
    pub id: TokenId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Token {
    Listed(ListedFt),
    Unlisted(UnlistedFt),
    Nft(Nft),
    NonStandard(NonStandardToken),
}

impl Token {
    pub fn id(&self) -> &str {
        match self {
            Token::Listed(t) => &t.id,
            Token::Unlisted(t) => &t.id,
            Token::Nft(t) => &t.id,
            Token::NonStandard(t) => &t.id,
        }
    }

    pub fn kind(&self) -> TokenKind {
        match self {
            Token::Listed(_) => TokenKind::ListedFt,
            Token::Unlisted(_) => TokenKind::UnlistedFt,
            Token::Nft(_) => TokenKind::Nft,
            Token::NonStandard(_) => TokenKind::NonStandard,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Token::Listed(t) => &t.name,
            Token::Unlisted(t) => &t.name,
            Token::Nft(_) | Token::NonStandard(_) => "",
        }
    }

    pub fn symbol(&self) -> Option<&str> {
        match self {
            Token::Listed(t) => Some(&t.symbol),
            Token::Unlisted(t) => Some(&t.symbol),
            Token::Nft(_) | Token::NonStandard(_) => None,
        }
    }

    /// NFTs and non-standard tokens are indivisible.
    pub fn decimals(&self) -> u8 {
        match self {
            Token::Listed(t) => t.decimals,
            Token::Unlisted(t) => t.decimals,
            Token::Nft(_) | Token::NonStandard(_) => 0,
        }
    }
}
