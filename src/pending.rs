use crate::amount::u256_decimal;
use crate::tokens::TokenId;
use alloy_primitives::U256;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::debug;

/// A transaction submitted by this client that has not been seen in a
/// confirmed page yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingTransaction {
    pub hash: String,
    pub from_address: String,
    pub to_address: String,
    #[serde(with = "u256_decimal")]
    pub atto_alph_amount: U256,
    pub tokens: Vec<(TokenId, String)>,
    /// Milliseconds since the unix epoch.
    pub timestamp: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingAction {
    Submitted(PendingTransaction),
    Confirmed(Vec<String>),
    Dropped(String),
    Cleared,
}

/// Locally tracked pending transactions, newest first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PendingTransactionsState {
    entries: Vec<PendingTransaction>,
}

impl PendingTransactionsState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[PendingTransaction] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, hash: &str) -> bool {
        self.entries.iter().any(|tx| tx.hash == hash)
    }

    pub fn reduce(&mut self, action: PendingAction) {
        match action {
            PendingAction::Submitted(tx) => {
                if !self.contains(&tx.hash) {
                    self.entries.insert(0, tx);
                }
            }
            PendingAction::Confirmed(hashes) => {
                let confirmed: HashSet<&str> = hashes.iter().map(String::as_str).collect();
                let before = self.entries.len();
                self.entries.retain(|tx| !confirmed.contains(tx.hash.as_str()));
                let removed = before - self.entries.len();
                if removed > 0 {
                    debug!("{} pending transactions confirmed", removed);
                }
            }
            PendingAction::Dropped(hash) => self.entries.retain(|tx| tx.hash != hash),
            PendingAction::Cleared => self.entries.clear(),
        }
    }
}
