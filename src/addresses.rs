use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use thiserror::Error;

static ADDRESS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[1-9A-HJ-NP-Za-km-z]{40,120}$").expect("address regex is valid")
});

/// Shape check for a base58 encoded Alephium address.
pub fn is_valid_address(address: &str) -> bool {
    ADDRESS_RE.is_match(address)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub hash: String,
    /// Derivation index within the wallet.
    pub index: u32,
    /// Shard the address belongs to.
    pub group: u8,
    pub label: Option<String>,
    pub color: String,
    pub is_default: bool,
}

impl Address {
    /// Address tracked by hash only; group and label are filled in later by settings updates.
    pub fn new(hash: impl Into<String>, index: u32) -> Self {
        Self {
            hash: hash.into(),
            index,
            group: 0,
            label: None,
            color: DEFAULT_COLOR.to_string(),
            is_default: false,
        }
    }
}

pub const DEFAULT_COLOR: &str = "#64f6c2";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddressAction {
    Added(Vec<Address>),
    Deleted(String),
    DefaultChanged(String),
    SettingsUpdated {
        hash: String,
        label: Option<String>,
        color: String,
    },
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum AddressError {
    #[error("Address not found: {0}")]
    NotFound(String),

    #[error("Address already in wallet: {0}")]
    Duplicate(String),

    #[error("The default address cannot be deleted: {0}")]
    CannotDeleteDefault(String),
}

/// Address book of one wallet. All changes go through [`AddressesState::reduce`].
///
/// Invariant: when non-empty, exactly one address is the default.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddressesState {
    addresses: Vec<Address>,
}

impl AddressesState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn all(&self) -> &[Address] {
        &self.addresses
    }

    pub fn hashes(&self) -> Vec<String> {
        self.addresses.iter().map(|a| a.hash.clone()).collect()
    }

    pub fn get(&self, hash: &str) -> Option<&Address> {
        self.addresses.iter().find(|a| a.hash == hash)
    }

    pub fn default_address(&self) -> Option<&Address> {
        self.addresses.iter().find(|a| a.is_default)
    }

    pub fn reduce(&mut self, action: AddressAction) -> Result<(), AddressError> {
        match action {
            AddressAction::Added(new) => {
                // validate the whole batch before touching state
                for (i, address) in new.iter().enumerate() {
                    let repeated = new[..i].iter().any(|a| a.hash == address.hash);
                    if repeated || self.get(&address.hash).is_some() {
                        return Err(AddressError::Duplicate(address.hash.clone()));
                    }
                }

                let wants_default = new.iter().rev().find(|a| a.is_default).map(|a| a.hash.clone());
                for mut address in new {
                    address.is_default = false;
                    self.addresses.push(address);
                }

                match wants_default {
                    Some(hash) => self.set_default(&hash),
                    None if self.default_address().is_none() => {
                        if let Some(hash) = self.addresses.first().map(|a| a.hash.clone()) {
                            self.set_default(&hash);
                        }
                    }
                    None => {}
                }
                Ok(())
            }
            AddressAction::Deleted(hash) => {
                let address = self
                    .get(&hash)
                    .ok_or_else(|| AddressError::NotFound(hash.clone()))?;
                if address.is_default {
                    return Err(AddressError::CannotDeleteDefault(hash));
                }
                self.addresses.retain(|a| a.hash != hash);
                Ok(())
            }
            AddressAction::DefaultChanged(hash) => {
                if self.get(&hash).is_none() {
                    return Err(AddressError::NotFound(hash));
                }
                self.set_default(&hash);
                Ok(())
            }
            AddressAction::SettingsUpdated { hash, label, color } => {
                let address = self
                    .addresses
                    .iter_mut()
                    .find(|a| a.hash == hash)
                    .ok_or_else(|| AddressError::NotFound(hash.clone()))?;
                address.label = label.filter(|l| !l.trim().is_empty());
                address.color = color;
                Ok(())
            }
        }
    }

    fn set_default(&mut self, hash: &str) {
        for address in &mut self.addresses {
            address.is_default = address.hash == hash;
        }
    }
}
