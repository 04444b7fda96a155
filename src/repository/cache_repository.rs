use super::models::CachedEntry;
use anyhow::{Context, Result};
use rusqlite::{Connection, OptionalExtension, params};
use serde::{Serialize, de::DeserializeOwned};
use tracing::{debug, warn};

/// Persistent key/value store behind the query caches.
pub struct CacheRepository<'a> {
    conn: &'a Connection,
}

impl<'a> CacheRepository<'a> {
    const SELECT_ENTRY: &'static str =
        "SELECT value, updated_at FROM query_cache WHERE key = ?1";

    const UPSERT_ENTRY: &'static str = "INSERT INTO query_cache (key, value, updated_at)
         VALUES (?1, ?2, ?3)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at";

    const DELETE_ENTRY: &'static str = "DELETE FROM query_cache WHERE key = ?1";

    // substr comparison so `%` and `_` in the prefix match literally
    const DELETE_PREFIX: &'static str =
        "DELETE FROM query_cache WHERE substr(key, 1, length(?1)) = ?1";

    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    pub fn get(&self, key: &str) -> Result<Option<CachedEntry>> {
        let entry = self
            .conn
            .query_row(Self::SELECT_ENTRY, params![key], |row| {
                Ok(CachedEntry {
                    value: row.get(0)?,
                    updated_at: row.get(1)?,
                })
            })
            .optional()?;
        Ok(entry)
    }

    pub fn put(&self, key: &str, value: &str, now: u64) -> Result<()> {
        self.conn
            .execute(Self::UPSERT_ENTRY, params![key, value, now])?;
        debug!("Stored cache entry {}", key);
        Ok(())
    }

    pub fn invalidate(&self, key: &str) -> Result<bool> {
        let removed = self.conn.execute(Self::DELETE_ENTRY, params![key])?;
        Ok(removed > 0)
    }

    pub fn invalidate_prefix(&self, prefix: &str) -> Result<usize> {
        let removed = self.conn.execute(Self::DELETE_PREFIX, params![prefix])?;
        debug!("Invalidated {} cache entries under {}", removed, prefix);
        Ok(removed)
    }

    /// Reads and decodes a JSON entry. Entries that no longer decode are
    /// dropped and reported as missing.
    pub fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let Some(entry) = self.get(key)? else {
            return Ok(None);
        };
        match serde_json::from_str(&entry.value) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                warn!("Discarding undecodable cache entry {}: {}", key, e);
                self.invalidate(key)?;
                Ok(None)
            }
        }
    }

    pub fn put_json<T: Serialize>(&self, key: &str, value: &T, now: u64) -> Result<()> {
        let encoded = serde_json::to_string(value)
            .with_context(|| format!("Failed to encode cache entry {key}"))?;
        self.put(key, &encoded, now)
    }
}
