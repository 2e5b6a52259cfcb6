//! A small in-process TTL + capacity-bounded cache shared by the YouTube
//! search cache (§4.7), the orchestrator's search cache, and the curated
//! lists cache (§4.10). Single-process only: this is not a distributed
//! cache and is never meant to survive a restart.

use std::collections::HashMap;
use std::hash::Hash;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;

struct Entry<V> {
    value: V,
    inserted_at: Instant,
    last_used: Instant,
}

/// A TTL-bounded, capacity-bounded cache keyed by `K`. Eviction is
/// approximate LRU: when at capacity, the entry with the oldest
/// `last_used` timestamp is evicted to make room for the new one.
pub struct TtlCache<K, V> {
    entries: Mutex<HashMap<K, Entry<V>>>,
    ttl: Duration,
    capacity: usize,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        Self { entries: Mutex::new(HashMap::new()), ttl, capacity }
    }

    pub async fn get(&self, key: &K) -> Option<V> {
        let mut entries = self.entries.lock().await;
        let expired = match entries.get(key) {
            Some(entry) => entry.inserted_at.elapsed() > self.ttl,
            None => return None,
        };
        if expired {
            entries.remove(key);
            return None;
        }
        let now = Instant::now();
        entries.get_mut(key).map(|entry| {
            entry.last_used = now;
            entry.value.clone()
        })
    }

    pub async fn put(&self, key: K, value: V) {
        let mut entries = self.entries.lock().await;
        if entries.len() >= self.capacity && !entries.contains_key(&key) {
            if let Some(oldest_key) = entries.iter().min_by_key(|(_, e)| e.last_used).map(|(k, _)| k.clone()) {
                entries.remove(&oldest_key);
            }
        }
        let now = Instant::now();
        entries.insert(key, Entry { value, inserted_at: now, last_used: now });
    }

    pub async fn invalidate(&self, key: &K) {
        self.entries.lock().await.remove(key);
    }

    pub async fn clear(&self) {
        self.entries.lock().await.clear();
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_then_get() {
        let cache: TtlCache<String, i32> = TtlCache::new(Duration::from_secs(60), 10);
        cache.put("a".to_string(), 1).await;
        assert_eq!(cache.get(&"a".to_string()).await, Some(1));
    }

    #[tokio::test]
    async fn test_expired_entry_not_returned() {
        let cache: TtlCache<String, i32> = TtlCache::new(Duration::from_millis(1), 10);
        cache.put("a".to_string(), 1).await;
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(cache.get(&"a".to_string()).await, None);
    }

    #[tokio::test]
    async fn test_capacity_evicts_least_recently_used() {
        let cache: TtlCache<i32, i32> = TtlCache::new(Duration::from_secs(60), 2);
        cache.put(1, 1).await;
        cache.put(2, 2).await;
        // touch key 1 so key 2 becomes the least-recently-used entry
        cache.get(&1).await;
        cache.put(3, 3).await;
        assert_eq!(cache.len().await, 2);
        assert_eq!(cache.get(&2).await, None);
        assert_eq!(cache.get(&1).await, Some(1));
        assert_eq!(cache.get(&3).await, Some(3));
    }

    #[tokio::test]
    async fn test_invalidate_removes_entry() {
        let cache: TtlCache<String, i32> = TtlCache::new(Duration::from_secs(60), 10);
        cache.put("a".to_string(), 1).await;
        cache.invalidate(&"a".to_string()).await;
        assert_eq!(cache.get(&"a".to_string()).await, None);
    }
}
