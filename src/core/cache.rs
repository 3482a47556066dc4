use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

struct CacheEntry<T> {
    value: T,
    captured_at: Instant,
}

/// Time-bounded memoization keyed by semantic identity strings.
/// The map sits behind a mutex because the multi-crop fan-out reads and
/// writes it from worker tasks concurrently.
pub struct TtlCache<T> {
    ttl: Duration,
    capacity: usize,
    entries: Mutex<HashMap<String, CacheEntry<T>>>,
}

impl<T: Clone> TtlCache<T> {
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        Self {
            ttl,
            capacity,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Expired entries read as absent; they are swept lazily by `put`.
    pub fn get(&self, key: &str) -> Option<T> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries
            .get(key)
            .filter(|e| e.captured_at.elapsed() < self.ttl)
            .map(|e| e.value.clone())
    }

    /// Unconditionally overwrites any prior entry for the key. When the map
    /// grows past capacity, expired entries are dropped first so a
    /// long-running process does not accumulate garbage forever.
    pub fn put(&self, key: String, value: T) {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        if entries.len() >= self.capacity {
            let ttl = self.ttl;
            entries.retain(|_, e| e.captured_at.elapsed() < ttl);
        }
        entries.insert(
            key,
            CacheEntry {
                value,
                captured_at: Instant::now(),
            },
        );
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }
}

/// Normalized cache key with an hour bucket appended, so entries naturally
/// roll over when the wall-clock hour changes even before the TTL fires.
pub fn bucket_key(kind: &str, commodity: &str, region: &str, bucket: &str) -> String {
    format!(
        "{}:{}:{}:{}",
        kind,
        commodity.trim().to_lowercase(),
        region.trim().to_lowercase(),
        bucket,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;

    #[test]
    fn test_hit_within_ttl() {
        let cache = TtlCache::new(Duration::from_secs(60), 16);
        cache.put("k".to_string(), 42);
        assert_eq!(cache.get("k"), Some(42));
    }

    #[test]
    fn test_expired_entry_reads_as_miss() {
        let cache = TtlCache::new(Duration::from_millis(10), 16);
        cache.put("k".to_string(), 42);
        sleep(Duration::from_millis(25));
        assert_eq!(cache.get("k"), None);
    }

    #[test]
    fn test_put_overwrites() {
        let cache = TtlCache::new(Duration::from_secs(60), 16);
        cache.put("k".to_string(), 1);
        cache.put("k".to_string(), 2);
        assert_eq!(cache.get("k"), Some(2));
    }

    #[test]
    fn test_capacity_sweep_drops_expired() {
        let cache = TtlCache::new(Duration::from_millis(10), 2);
        cache.put("a".to_string(), 1);
        cache.put("b".to_string(), 2);
        sleep(Duration::from_millis(25));
        // At capacity: inserting sweeps the two expired entries first
        cache.put("c".to_string(), 3);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("c"), Some(3));
    }

    #[test]
    fn test_bucket_key_normalizes_casing() {
        let a = bucket_key("prices", "Rice", "Telangana", "2024011510");
        let b = bucket_key("prices", "rice", " telangana ", "2024011510");
        assert_eq!(a, b);
    }
}
