use crate::amount::{Balance, pow10};
use crate::explorer::ExplorerApi;
use crate::tokens::{Token, TokenKind};
use alloy_primitives::U256;
use anyhow::Result;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::HashMap;
use tracing::debug;

/// Fixed-point precision applied to prices before multiplying with amounts.
const PRICE_SCALE_DECIMALS: i32 = 18;

/// Significant digits kept from prices below `10^-PRICE_SCALE_DECIMALS`.
const PRICE_SIGNIFICANT_DIGITS: i32 = 15;

const MAX_PRICE_SCALE_DECIMALS: i32 = 60;

/// Sort key of tokens without a resolvable price; below any real worth.
pub const UNKNOWN_WORTH: f64 = -1.0;

/// Fiat prices keyed by token symbol.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriceTable {
    prices: HashMap<String, f64>,
}

impl PriceTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, symbol: impl Into<String>, price: f64) {
        self.prices.insert(symbol.into(), price);
    }

    pub fn get(&self, symbol: &str) -> Option<f64> {
        self.prices.get(symbol).copied()
    }

    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }

    /// Fetches prices for `symbols`; symbols the market does not know are left out.
    pub async fn fetch<A>(api: &A, symbols: &[String], currency: &str) -> Result<Self>
    where
        A: ExplorerApi + ?Sized,
    {
        let mut table = Self::new();
        if symbols.is_empty() {
            return Ok(table);
        }

        let prices = api.prices(symbols, currency).await?;
        for (symbol, price) in symbols.iter().zip(prices) {
            if let Some(price) = price {
                table.insert(symbol.clone(), price);
            }
        }
        debug!("Resolved {} of {} prices", table.len(), symbols.len());
        Ok(table)
    }
}

impl<S: Into<String>> FromIterator<(S, f64)> for PriceTable {
    fn from_iter<I: IntoIterator<Item = (S, f64)>>(iter: I) -> Self {
        let mut table = Self::new();
        for (symbol, price) in iter {
            table.insert(symbol, price);
        }
        table
    }
}

/// `amount × price / 10^decimals`.
///
/// The price is turned into a fixed-point integer and multiplied in 256-bit
/// arithmetic, so only the final result is rounded to f64. Returns `None`
/// for unusable prices or out of range decimals.
pub fn calculate_worth(amount: U256, decimals: u8, price: f64) -> Option<f64> {
    if !price.is_finite() || price < 0.0 {
        return None;
    }

    let scale = 10f64.powi(price_scale_decimals(price));
    let scaled_price = (price * scale).round();
    if scaled_price >= u128::MAX as f64 {
        return None;
    }
    let scaled_price = U256::from(scaled_price as u128);

    let product = amount.checked_mul(scaled_price)?;
    let worth_scaled = product / pow10(decimals)?;
    let worth_scaled: f64 = worth_scaled.to_string().parse().ok()?;
    Some(worth_scaled / scale)
}

/// Scale for `price`: the default precision, widened for tiny prices so they
/// keep their significant digits instead of rounding to zero.
fn price_scale_decimals(price: f64) -> i32 {
    if price <= 0.0 {
        return PRICE_SCALE_DECIMALS;
    }
    let magnitude = -price.log10().floor() as i32;
    (magnitude + PRICE_SIGNIFICANT_DIGITS).clamp(PRICE_SCALE_DECIMALS, MAX_PRICE_SCALE_DECIMALS)
}

/// A token ready for display: totals plus worth when a price is known.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TokenWorth {
    pub id: String,
    pub kind: TokenKind,
    pub name: String,
    pub symbol: Option<String>,
    pub decimals: u8,
    pub balance: Balance,
    pub worth: Option<f64>,
}

impl TokenWorth {
    pub fn sort_key(&self) -> f64 {
        self.worth.unwrap_or(UNKNOWN_WORTH)
    }
}

/// Attaches worth to each token. Only listed tokens are priced, by symbol.
pub fn attach_worth(tokens: Vec<(Token, Balance)>, prices: &PriceTable) -> Vec<TokenWorth> {
    tokens
        .into_iter()
        .map(|(token, balance)| {
            let worth = match &token {
                Token::Listed(listed) => prices
                    .get(&listed.symbol)
                    .and_then(|price| calculate_worth(balance.total, listed.decimals, price)),
                Token::Unlisted(_) | Token::Nft(_) | Token::NonStandard(_) => None,
            };
            TokenWorth {
                id: token.id().to_string(),
                kind: token.kind(),
                name: token.name().to_string(),
                symbol: token.symbol().map(str::to_string),
                decimals: token.decimals(),
                balance,
                worth,
            }
        })
        .collect()
}

/// Worth descending, then name ascending (case-insensitive first), then id.
/// Distinct ids never compare equal.
pub fn compare_tokens(a: &TokenWorth, b: &TokenWorth) -> Ordering {
    b.sort_key()
        .total_cmp(&a.sort_key())
        .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
        .then_with(|| a.name.cmp(&b.name))
        .then_with(|| a.id.cmp(&b.id))
}

pub fn sort_tokens(tokens: &mut [TokenWorth]) {
    tokens.sort_by(compare_tokens);
}

pub fn total_worth(tokens: &[TokenWorth]) -> f64 {
    tokens.iter().filter_map(|t| t.worth).sum()
}
