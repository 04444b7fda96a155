use crate::amount::{ALPH_DECIMALS, format_amount, u256_decimal};
use crate::explorer::TransactionDto;
use crate::pending::PendingTransaction;
use crate::tokens::TokenId;
use alloy_primitives::U256;
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};

/// Net movement of one asset for a set of addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "direction", content = "amount", rename_all = "lowercase")]
pub enum Delta {
    Zero,
    In(#[serde(with = "u256_decimal")] U256),
    Out(#[serde(with = "u256_decimal")] U256),
}

impl Delta {
    fn from_flows(incoming: U256, outgoing: U256) -> Self {
        match incoming.cmp(&outgoing) {
            std::cmp::Ordering::Greater => Delta::In(incoming - outgoing),
            std::cmp::Ordering::Less => Delta::Out(outgoing - incoming),
            std::cmp::Ordering::Equal => Delta::Zero,
        }
    }

    pub fn amount(&self) -> U256 {
        match self {
            Delta::Zero => U256::ZERO,
            Delta::In(amount) | Delta::Out(amount) => *amount,
        }
    }

    pub fn is_in(&self) -> bool {
        matches!(self, Delta::In(_))
    }

    pub fn is_out(&self) -> bool {
        matches!(self, Delta::Out(_))
    }

    /// Signed display form, e.g. `+1.5` or `-0.25`.
    pub fn format(&self, decimals: u8) -> String {
        match self {
            Delta::Zero => "0".to_string(),
            Delta::In(amount) => format!("+{}", format_amount(*amount, decimals)),
            Delta::Out(amount) => format!("-{}", format_amount(*amount, decimals)),
        }
    }
}

#[derive(Debug, Default)]
struct Flow {
    incoming: U256,
    outgoing: U256,
}

/// ALPH and token deltas of a transaction for `addresses`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransactionDeltas {
    pub alph: Delta,
    pub tokens: BTreeMap<TokenId, Delta>,
}

impl TransactionDeltas {
    fn any(&self, pred: impl Fn(&Delta) -> bool) -> bool {
        pred(&self.alph) || self.tokens.values().any(pred)
    }
}

/// Deltas of `tx` for the given set of addresses. When the set spends ALPH
/// the fee is added back, so the ALPH delta is what was actually moved.
pub fn wallet_deltas(tx: &TransactionDto, addresses: &HashSet<String>) -> TransactionDeltas {
    let mut alph = Flow::default();
    let mut tokens: BTreeMap<TokenId, Flow> = BTreeMap::new();

    for input in &tx.inputs {
        let Some(address) = &input.address else {
            continue;
        };
        if !addresses.contains(address) {
            continue;
        }
        alph.outgoing = alph
            .outgoing
            .saturating_add(input.atto_alph_amount.unwrap_or_default());
        for token in input.tokens.iter().flatten() {
            let flow = tokens.entry(token.id.clone()).or_default();
            flow.outgoing = flow.outgoing.saturating_add(token.amount);
        }
    }

    for output in &tx.outputs {
        if !addresses.contains(&output.address) {
            continue;
        }
        alph.incoming = alph.incoming.saturating_add(output.atto_alph_amount);
        for token in output.tokens.iter().flatten() {
            let flow = tokens.entry(token.id.clone()).or_default();
            flow.incoming = flow.incoming.saturating_add(token.amount);
        }
    }

    if alph.outgoing > alph.incoming {
        alph.incoming = alph.incoming.saturating_add(tx.fee());
    }

    TransactionDeltas {
        alph: Delta::from_flows(alph.incoming, alph.outgoing),
        tokens: tokens
            .into_iter()
            .map(|(id, flow)| (id, Delta::from_flows(flow.incoming, flow.outgoing)))
            .filter(|(_, delta)| *delta != Delta::Zero)
            .collect(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    In,
    Out,
    Both,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum TransactionInfoType {
    Incoming,
    Outgoing,
    WalletSelfTransfer,
    Swap,
    Pending,
}

impl TransactionInfoType {
    pub fn label(&self) -> &'static str {
        match self {
            TransactionInfoType::Incoming => "Received",
            TransactionInfoType::Outgoing => "Sent",
            TransactionInfoType::WalletSelfTransfer => "Moved",
            TransactionInfoType::Swap => "Swapped",
            TransactionInfoType::Pending => "Sending",
        }
    }

    pub fn direction(&self) -> Direction {
        match self {
            TransactionInfoType::Incoming => Direction::In,
            TransactionInfoType::Outgoing | TransactionInfoType::Pending => Direction::Out,
            TransactionInfoType::Swap => Direction::Both,
            TransactionInfoType::WalletSelfTransfer => Direction::None,
        }
    }
}

/// Transfers between wallet addresses only; every input and output belongs
/// to the wallet.
fn is_self_transfer(tx: &TransactionDto, addresses: &HashSet<String>) -> bool {
    !tx.inputs.is_empty()
        && tx
            .inputs
            .iter()
            .all(|i| i.address.as_ref().is_some_and(|a| addresses.contains(a)))
        && tx.outputs.iter().all(|o| addresses.contains(&o.address))
}

pub fn classify_transaction(
    tx: &TransactionDto,
    addresses: &HashSet<String>,
) -> (TransactionInfoType, TransactionDeltas) {
    let deltas = wallet_deltas(tx, addresses);

    let info_type = if is_self_transfer(tx, addresses) {
        TransactionInfoType::WalletSelfTransfer
    } else {
        match (deltas.any(Delta::is_in), deltas.any(Delta::is_out)) {
            (true, true) if !deltas.tokens.is_empty() => TransactionInfoType::Swap,
            (_, true) => TransactionInfoType::Outgoing,
            _ => TransactionInfoType::Incoming,
        }
    };

    (info_type, deltas)
}

/// One row of wallet history, confirmed or pending.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransactionSummary {
    pub hash: String,
    pub timestamp: u64,
    pub info_type: TransactionInfoType,
    pub deltas: TransactionDeltas,
}

impl TransactionSummary {
    pub fn confirmed(tx: &TransactionDto, addresses: &HashSet<String>) -> Self {
        let (info_type, deltas) = classify_transaction(tx, addresses);
        Self {
            hash: tx.hash.clone(),
            timestamp: tx.timestamp,
            info_type,
            deltas,
        }
    }

    pub fn pending(tx: &PendingTransaction) -> Self {
        let tokens = tx
            .tokens
            .iter()
            .filter_map(|(id, amount)| {
                let amount: U256 = amount.parse().ok()?;
                Some((id.clone(), Delta::Out(amount)))
            })
            .collect();
        Self {
            hash: tx.hash.clone(),
            timestamp: tx.timestamp,
            info_type: TransactionInfoType::Pending,
            deltas: TransactionDeltas {
                alph: Delta::Out(tx.atto_alph_amount),
                tokens,
            },
        }
    }

    pub fn alph_display(&self) -> String {
        self.deltas.alph.format(ALPH_DECIMALS)
    }
}
