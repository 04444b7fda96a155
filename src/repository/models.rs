use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Contact {
    pub id: i64,
    pub name: String,
    pub address: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedEntry {
    pub value: String,
    /// Seconds since the unix epoch.
    pub updated_at: u64,
}
