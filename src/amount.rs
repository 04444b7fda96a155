use alloy_primitives::U256;
use alloy_primitives::utils::format_units;
use anyhow::Result;
use serde::{Deserialize, Serialize};

pub const ALPH_DECIMALS: u8 = 18;

/// Token holdings of one address, or the sum over several addresses.
///
/// Amounts are raw on-chain units (atto-ALPH for the native token). The
/// explorer reports `total` and `locked`; `available` is derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Balance {
    #[serde(with = "u256_decimal")]
    pub total: U256,
    #[serde(with = "u256_decimal")]
    pub locked: U256,
    #[serde(with = "u256_decimal")]
    pub available: U256,
}

impl Balance {
    pub const ZERO: Balance = Balance {
        total: U256::ZERO,
        locked: U256::ZERO,
        available: U256::ZERO,
    };

    pub fn new(total: U256, locked: U256) -> Self {
        Self {
            total,
            locked,
            available: total.saturating_sub(locked),
        }
    }

    pub fn is_zero(&self) -> bool {
        self.total.is_zero() && self.locked.is_zero() && self.available.is_zero()
    }

    pub fn checked_add(&self, other: &Balance) -> Option<Balance> {
        Some(Balance {
            total: self.total.checked_add(other.total)?,
            locked: self.locked.checked_add(other.locked)?,
            available: self.available.checked_add(other.available)?,
        })
    }
}

/// Sum balance records field by field. `None` entries mean "no data yet" and
/// count as zero. The result does not depend on the iteration order.
pub fn sum_balances<'a, I>(balances: I) -> Result<Balance>
where
    I: IntoIterator<Item = Option<&'a Balance>>,
{
    let mut total = Balance::ZERO;
    for balance in balances.into_iter().flatten() {
        total = total
            .checked_add(balance)
            .ok_or_else(|| anyhow::anyhow!("Overflow in balance sum"))?;
    }
    Ok(total)
}

/// 10^decimals, or `None` when it does not fit in 256 bits.
pub fn pow10(decimals: u8) -> Option<U256> {
    U256::from(10u64).checked_pow(U256::from(decimals))
}

/// Human readable amount, falling back to raw units when `decimals` is out of range.
pub fn format_amount(amount: U256, decimals: u8) -> String {
    if decimals == 0 {
        return amount.to_string();
    }
    format_units(amount, decimals).unwrap_or_else(|_| amount.to_string())
}

/// Serde adapter for U256 values carried as decimal strings on the wire.
pub mod u256_decimal {
    use alloy_primitives::U256;
    use serde::{Deserialize, Deserializer, Serializer, de};
    use std::str::FromStr;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Str(String),
        Num(u64),
    }

    pub fn serialize<S: Serializer>(value: &U256, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<U256, D::Error> {
        match Raw::deserialize(deserializer)? {
            Raw::Str(s) => U256::from_str(s.trim())
                .map_err(|_| de::Error::custom(format!("Invalid amount: {s}"))),
            Raw::Num(n) => Ok(U256::from(n)),
        }
    }

    pub mod option {
        use super::Raw;
        use alloy_primitives::U256;
        use serde::{Deserialize, Deserializer, Serializer, de};
        use std::str::FromStr;

        pub fn serialize<S: Serializer>(
            value: &Option<U256>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match value {
                Some(v) => serializer.serialize_str(&v.to_string()),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<U256>, D::Error> {
            match Option::<Raw>::deserialize(deserializer)? {
                Some(Raw::Str(s)) => U256::from_str(s.trim())
                    .map(Some)
                    .map_err(|_| de::Error::custom(format!("Invalid amount: {s}"))),
                Some(Raw::Num(n)) => Ok(Some(U256::from(n))),
                None => Ok(None),
            }
        }
    }
}
