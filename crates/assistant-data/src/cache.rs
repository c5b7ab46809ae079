//! Response Memoization
//!
//! Small async TTL cache for provider responses. Expiry is advisory:
//! entries are checked on read and overwritten on insert, with no
//! background sweeper.

use std::collections::HashMap;
use std::hash::Hash;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;

/// Default lifetime for cached provider responses
pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

struct CacheEntry<V> {
    value: V,
    expires_at: Instant,
}

impl<V> CacheEntry<V> {
    fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }
}

/// Keyed cache whose entries expire after a fixed TTL
pub struct TtlCache<K, V> {
    entries: RwLock<HashMap<K, CacheEntry<V>>>,
    ttl: Duration,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    /// Fetch a live entry; expired entries read as misses
    pub async fn get(&self, key: &K) -> Option<V> {
        let entries = self.entries.read().await;
        entries
            .get(key)
            .filter(|entry| !entry.is_expired())
            .map(|entry| entry.value.clone())
    }

    pub async fn insert(&self, key: K, value: V) {
        let mut entries = self.entries.write().await;
        entries.insert(
            key,
            CacheEntry {
                value,
                expires_at: Instant::now() + self.ttl,
            },
        );
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}

impl<K, V> Default for TtlCache<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_hit_within_ttl() {
        let cache: TtlCache<String, u32> = TtlCache::new(Duration::from_secs(60));
        cache.insert("btc".to_string(), 42).await;

        assert_eq!(cache.get(&"btc".to_string()).await, Some(42));
        assert_eq!(cache.get(&"eth".to_string()).await, None);
    }

    #[tokio::test]
    async fn test_zero_ttl_expires_immediately() {
        let cache: TtlCache<String, u32> = TtlCache::new(Duration::ZERO);
        cache.insert("btc".to_string(), 42).await;

        assert_eq!(cache.get(&"btc".to_string()).await, None);
    }

    #[tokio::test]
    async fn test_insert_overwrites() {
        let cache: TtlCache<String, u32> = TtlCache::new(Duration::from_secs(60));
        cache.insert("btc".to_string(), 1).await;
        cache.insert("btc".to_string(), 2).await;

        assert_eq!(cache.get(&"btc".to_string()).await, Some(2));
    }
}
