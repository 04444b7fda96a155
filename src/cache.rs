use std::collections::HashMap;
use std::hash::Hash;
use tracing::debug;

/// In-memory memoizing cache with declared keys and explicit invalidation.
///
/// Entries never expire on their own: a query is refetched only when its
/// key changes or the entry is invalidated.
#[derive(Debug)]
pub struct QueryCache<K, V> {
    entries: HashMap<K, V>,
    hits: u64,
    misses: u64,
}

impl<K, V> Default for QueryCache<K, V> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
            hits: 0,
            misses: 0,
        }
    }
}

impl<K, V> QueryCache<K, V>
where
    K: Eq + Hash + std::fmt::Debug,
{
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&mut self, key: &K) -> Option<&V> {
        match self.entries.get(key) {
            Some(value) => {
                self.hits += 1;
                debug!("Query cache hit for {:?}", key);
                Some(value)
            }
            None => {
                self.misses += 1;
                debug!("Query cache miss for {:?}", key);
                None
            }
        }
    }

    pub fn contains(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        self.entries.insert(key, value)
    }

    pub fn invalidate(&mut self, key: &K) -> Option<V> {
        self.entries.remove(key)
    }

    /// Drops every entry whose key matches `predicate`; returns how many were removed.
    pub fn invalidate_where<F>(&mut self, mut predicate: F) -> usize
    where
        F: FnMut(&K) -> bool,
    {
        let before = self.entries.len();
        self.entries.retain(|k, _| !predicate(k));
        before - self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn misses(&self) -> u64 {
        self.misses
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_hits_and_misses() {
        let mut cache: QueryCache<&str, u32> = QueryCache::new();
        assert!(cache.get(&"a").is_none());
        cache.insert("a", 1);
        assert_eq!(cache.get(&"a"), Some(&1));
        assert_eq!((cache.hits(), cache.misses()), (1, 1));
    }

    #[test]
    fn invalidates_by_predicate() {
        let mut cache: QueryCache<(String, u32), ()> = QueryCache::new();
        cache.insert(("a".into(), 1), ());
        cache.insert(("a".into(), 2), ());
        cache.insert(("b".into(), 1), ());
        assert_eq!(cache.invalidate_where(|(addr, _)| addr == "a"), 2);
        assert_eq!(cache.len(), 1);
        assert!(cache.contains(&("b".into(), 1)));
    }
}
