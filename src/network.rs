use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkId {
    Mainnet,
    Testnet,
    Devnet,
}

impl NetworkId {
    pub fn as_str(&self) -> &'static str {
        match self {
            NetworkId::Mainnet => "mainnet",
            NetworkId::Testnet => "testnet",
            NetworkId::Devnet => "devnet",
        }
    }

    /// Numeric id used by the token list documents.
    pub fn chain_id(&self) -> u8 {
        match self {
            NetworkId::Mainnet => 0,
            NetworkId::Testnet => 1,
            NetworkId::Devnet => 4,
        }
    }

    pub fn default_explorer_url(&self) -> &'static str {
        match self {
            NetworkId::Mainnet => "https://backend.mainnet.alephium.org",
            NetworkId::Testnet => "https://backend.testnet.alephium.org",
            NetworkId::Devnet => "http://127.0.0.1:9090",
        }
    }

    pub fn default_token_list_url(&self) -> String {
        format!(
            "https://raw.githubusercontent.com/alephium/token-list/master/tokens/{}.json",
            self.as_str()
        )
    }
}

impl fmt::Display for NetworkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NetworkId {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "mainnet" => Ok(NetworkId::Mainnet),
            "testnet" => Ok(NetworkId::Testnet),
            "devnet" => Ok(NetworkId::Devnet),
            other => Err(anyhow::anyhow!("Unknown network: {}", other)),
        }
    }
}
