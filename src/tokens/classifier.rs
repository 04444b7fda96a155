use super::registry::TokenRegistry;
use super::{TokenId, TokenKind};
use crate::explorer::{ExplorerApi, TOKENS_QUERY_LIMIT};
use std::collections::{BTreeSet, HashMap};
use tracing::{debug, warn};

/// Token ids split into the four classification buckets. Every input id
/// lands in exactly one bucket.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassifiedTokenIds {
    pub listed_ft_ids: Vec<TokenId>,
    pub unlisted_ft_ids: Vec<TokenId>,
    pub nft_ids: Vec<TokenId>,
    pub nst_ids: Vec<TokenId>,
    /// Set when a type lookup failed; affected ids were reported as
    /// non-standard but not cached.
    pub incomplete: bool,
}

impl ClassifiedTokenIds {
    fn push(&mut self, id: TokenId, kind: TokenKind) {
        match kind {
            TokenKind::ListedFt => self.listed_ft_ids.push(id),
            TokenKind::UnlistedFt => self.unlisted_ft_ids.push(id),
            TokenKind::Nft => self.nft_ids.push(id),
            TokenKind::NonStandard => self.nst_ids.push(id),
        }
    }

    pub fn len(&self) -> usize {
        self.listed_ft_ids.len() + self.unlisted_ft_ids.len() + self.nft_ids.len() + self.nst_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn kind_of(&self, id: &str) -> Option<TokenKind> {
        let has = |ids: &[TokenId]| ids.iter().any(|i| i == id);
        if has(&self.listed_ft_ids) {
            Some(TokenKind::ListedFt)
        } else if has(&self.unlisted_ft_ids) {
            Some(TokenKind::UnlistedFt)
        } else if has(&self.nft_ids) {
            Some(TokenKind::Nft)
        } else if has(&self.nst_ids) {
            Some(TokenKind::NonStandard)
        } else {
            None
        }
    }
}

/// Session cache of explorer-answered token classifications. Listed ids are
/// taken from the registry on every pass and never cached, so a registry
/// refresh that drops an id sends it back to the explorer.
#[derive(Debug, Default)]
pub struct TokenClassifier {
    cache: HashMap<TokenId, TokenKind>,
    lookups: usize,
}

impl TokenClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cached(&self, id: &str) -> Option<TokenKind> {
        self.cache.get(id).copied()
    }

    /// Number of type lookups issued to the explorer so far.
    pub fn lookups(&self) -> usize {
        self.lookups
    }

    pub async fn classify<A>(&mut self, api: &A, registry: &TokenRegistry, id: &str) -> TokenKind
    where
        A: ExplorerApi + ?Sized,
    {
        let classified = self.classify_many(api, registry, &[id.to_string()]).await;
        classified.kind_of(id).unwrap_or(TokenKind::NonStandard)
    }

    pub async fn classify_many<A>(
        &mut self,
        api: &A,
        registry: &TokenRegistry,
        ids: &[TokenId],
    ) -> ClassifiedTokenIds
    where
        A: ExplorerApi + ?Sized,
    {
        let mut result = ClassifiedTokenIds::default();
        let unique: BTreeSet<&TokenId> = ids.iter().collect();

        let mut unresolved: Vec<TokenId> = Vec::new();
        for id in unique {
            if registry.contains(id) {
                result.push(id.clone(), TokenKind::ListedFt);
            } else if let Some(kind) = self.cache.get(id) {
                result.push(id.clone(), *kind);
            } else {
                unresolved.push(id.clone());
            }
        }

        if unresolved.is_empty() {
            return result;
        }

        debug!(
            "Looking up types of {} tokens in chunks of {}",
            unresolved.len(),
            TOKENS_QUERY_LIMIT
        );

        for chunk in unresolved.chunks(TOKENS_QUERY_LIMIT) {
            self.lookups += 1;
            match api.token_infos(chunk).await {
                Ok(infos) => {
                    let answers: HashMap<&str, Option<&str>> = infos
                        .iter()
                        .map(|info| (info.token.as_str(), info.std_interface_id.as_deref()))
                        .collect();

                    for id in chunk {
                        // ids unknown to the explorer are non-standard
                        let kind = TokenKind::from_std_interface(
                            answers.get(id.as_str()).copied().flatten(),
                        );
                        self.cache.insert(id.clone(), kind);
                        result.push(id.clone(), kind);
                    }
                }
                Err(e) => {
                    warn!("Token type lookup failed for {} ids: {}", chunk.len(), e);
                    result.incomplete = true;
                    for id in chunk {
                        result.push(id.clone(), TokenKind::NonStandard);
                    }
                }
            }
        }

        result
    }
}
