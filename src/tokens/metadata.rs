use super::classifier::ClassifiedTokenIds;
use super::registry::TokenRegistry;
use super::{NonStandardToken, Nft, Token, TokenId, UnlistedFt};
use crate::explorer::{ExplorerApi, FungibleTokenMetadataDto, NftMetadataDto, TOKENS_QUERY_LIMIT};
use std::collections::HashMap;
use tracing::warn;

/// Resolves classified ids into full [`Token`] values, caching what the
/// explorer returned. Ids without metadata resolve to id-only values that
/// are retried on the next call.
#[derive(Debug, Default)]
pub struct TokenMetadataCache {
    tokens: HashMap<TokenId, Token>,
}

impl TokenMetadataCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &str) -> Option<&Token> {
        self.tokens.get(id)
    }

    pub async fn resolve<A>(
        &mut self,
        api: &A,
        registry: &TokenRegistry,
        classified: &ClassifiedTokenIds,
    ) -> Vec<Token>
    where
        A: ExplorerApi + ?Sized,
    {
        let mut tokens = Vec::with_capacity(classified.len());

        for id in &classified.listed_ft_ids {
            match registry.get(id) {
                Some(listed) => tokens.push(Token::Listed(listed.clone())),
                None => tokens.push(Token::NonStandard(NonStandardToken { id: id.clone() })),
            }
        }

        self.fetch_fungible(api, &classified.unlisted_ft_ids).await;
        for id in &classified.unlisted_ft_ids {
            tokens.push(self.tokens.get(id).cloned().unwrap_or_else(|| {
                Token::Unlisted(UnlistedFt {
                    id: id.clone(),
                    name: String::new(),
                    symbol: String::new(),
                    decimals: 0,
                })
            }));
        }

        self.fetch_nfts(api, &classified.nft_ids).await;
        for id in &classified.nft_ids {
            tokens.push(self.tokens.get(id).cloned().unwrap_or_else(|| {
                Token::Nft(Nft {
                    id: id.clone(),
                    collection_id: None,
                    token_uri: None,
                    nft_index: None,
                })
            }));
        }

        for id in &classified.nst_ids {
            tokens.push(Token::NonStandard(NonStandardToken { id: id.clone() }));
        }

        tokens
    }

    fn missing(&self, ids: &[TokenId]) -> Vec<TokenId> {
        ids.iter()
            .filter(|id| !self.tokens.contains_key(*id))
            .cloned()
            .collect()
    }

    async fn fetch_fungible<A>(&mut self, api: &A, ids: &[TokenId])
    where
        A: ExplorerApi + ?Sized,
    {
        for chunk in self.missing(ids).chunks(TOKENS_QUERY_LIMIT) {
            match api.fungible_metadata(chunk).await {
                Ok(metadata) => {
                    for m in metadata {
                        let token = Token::Unlisted(unlisted_from_metadata(m));
                        self.tokens.insert(token.id().to_string(), token);
                    }
                }
                Err(e) => warn!("Fungible metadata lookup failed: {}", e),
            }
        }
    }

    async fn fetch_nfts<A>(&mut self, api: &A, ids: &[TokenId])
    where
        A: ExplorerApi + ?Sized,
    {
        for chunk in self.missing(ids).chunks(TOKENS_QUERY_LIMIT) {
            match api.nft_metadata(chunk).await {
                Ok(metadata) => {
                    for m in metadata {
                        let token = Token::Nft(nft_from_metadata(m));
                        self.tokens.insert(token.id().to_string(), token);
                    }
                }
                Err(e) => warn!("NFT metadata lookup failed: {}", e),
            }
        }
    }
}

fn unlisted_from_metadata(m: FungibleTokenMetadataDto) -> UnlistedFt {
    UnlistedFt {
        id: m.id,
        name: decode_hex_string(&m.name),
        symbol: decode_hex_string(&m.symbol),
        decimals: m.decimals,
    }
}

fn nft_from_metadata(m: NftMetadataDto) -> Nft {
    Nft {
        id: m.id,
        collection_id: Some(m.collection_id),
        token_uri: Some(m.token_uri),
        nft_index: Some(m.nft_index).filter(|i| !i.is_empty()),
    }
}

/// Contract metadata strings are hex encoded UTF-8; anything else is kept as is.
pub fn decode_hex_string(raw: &str) -> String {
    hex::decode(raw)
        .ok()
        .and_then(|bytes| String::from_utf8(bytes).ok())
        .unwrap_or_else(|| raw.to_string())
}
