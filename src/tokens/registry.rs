use super::{ListedFt, TokenId};
use crate::explorer::{ExplorerApi, TokenListDto};
use crate::network::NetworkId;
use crate::repository::CacheRepository;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// How long a fetched token list stays valid, in seconds.
pub const TOKEN_LIST_TTL_SECS: u64 = 24 * 60 * 60;

/// Verified tokens of one network. ALPH is always present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenRegistry {
    network: NetworkId,
    tokens: HashMap<TokenId, ListedFt>,
    fetched_at: u64,
}

impl TokenRegistry {
    pub fn from_list(network: NetworkId, list: TokenListDto, fetched_at: u64) -> Self {
        let mut tokens: HashMap<TokenId, ListedFt> = list
            .tokens
            .into_iter()
            .map(|t| {
                (
                    t.id.clone(),
                    ListedFt {
                        id: t.id,
                        name: t.name,
                        symbol: t.symbol,
                        decimals: t.decimals,
                        logo_uri: t.logo_uri,
                        description: t.description,
                    },
                )
            })
            .collect();

        let alph = ListedFt::alph();
        tokens.entry(alph.id.clone()).or_insert(alph);

        Self {
            network,
            tokens,
            fetched_at,
        }
    }

    pub fn network(&self) -> NetworkId {
        self.network
    }

    pub fn get(&self, id: &str) -> Option<&ListedFt> {
        self.tokens.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.tokens.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn fetched_at(&self) -> u64 {
        self.fetched_at
    }

    pub fn is_fresh(&self, now: u64) -> bool {
        now.saturating_sub(self.fetched_at) < TOKEN_LIST_TTL_SECS
    }

    pub fn cache_key(network: NetworkId) -> String {
        format!("token-list:{network}")
    }
}

/// Holds the registry for a session, backed by the persistent cache when one
/// is supplied. A stale registry is served if refreshing it fails.
#[derive(Debug)]
pub struct TokenRegistryCache {
    network: NetworkId,
    current: Option<TokenRegistry>,
}

impl TokenRegistryCache {
    pub fn new(network: NetworkId) -> Self {
        Self {
            network,
            current: None,
        }
    }

    pub fn current(&self) -> Option<&TokenRegistry> {
        self.current.as_ref()
    }

    pub async fn get_or_fetch<A>(
        &mut self,
        api: &A,
        store: Option<&CacheRepository<'_>>,
        now: u64,
    ) -> Result<&TokenRegistry>
    where
        A: ExplorerApi + ?Sized,
    {
        let fresh = self.current.as_ref().is_some_and(|r| r.is_fresh(now));
        if !fresh {
            self.refresh(api, store, now).await?;
        }
        self.current
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("Token registry unavailable for {}", self.network))
    }

    async fn refresh<A>(
        &mut self,
        api: &A,
        store: Option<&CacheRepository<'_>>,
        now: u64,
    ) -> Result<()>
    where
        A: ExplorerApi + ?Sized,
    {
        let key = TokenRegistry::cache_key(self.network);

        if let Some(store) = store {
            match store.get_json::<TokenRegistry>(&key) {
                Ok(Some(stored)) if stored.is_fresh(now) && stored.network == self.network => {
                    debug!("Using stored token list for {}", self.network);
                    self.current = Some(stored);
                    return Ok(());
                }
                Ok(Some(stored)) if self.current.is_none() => {
                    // keep as fallback in case the fetch below fails
                    self.current = Some(stored);
                }
                Ok(_) => {}
                Err(e) => warn!("Failed to read stored token list: {}", e),
            }
        }

        match api.token_list(self.network).await {
            Ok(list) => {
                let registry = TokenRegistry::from_list(self.network, list, now);
                info!(
                    "Fetched token list for {} ({} tokens)",
                    self.network,
                    registry.len()
                );
                if let Some(store) = store {
                    if let Err(e) = store.put_json(&key, &registry, now) {
                        warn!("Failed to persist token list: {}", e);
                    }
                }
                self.current = Some(registry);
                Ok(())
            }
            Err(e) if self.current.is_some() => {
                warn!("Token list refresh failed, serving stale copy: {}", e);
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}
