//! services/api/src/cache.rs
//!
//! A small in-process cache whose entries expire a fixed time after insertion.
//! Callers pass the current instant, so expiry follows the application clock.

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Mutex, MutexGuard};

struct Entry<V> {
    value: V,
    expires_at: DateTime<Utc>,
}

pub struct TtlCache<K, V> {
    ttl: Duration,
    entries: Mutex<HashMap<K, Entry<V>>>,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<K, Entry<V>>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Returns the live value for `key`. An expired entry is dropped on the way.
    pub fn get(&self, key: &K, now: DateTime<Utc>) -> Option<V> {
        let mut entries = self.lock();
        match entries.get(key) {
            Some(entry) if now < entry.expires_at => Some(entry.value.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    pub fn insert(&self, key: K, value: V, now: DateTime<Utc>) {
        let expires_at = now + self.ttl;
        self.lock().insert(key, Entry { value, expires_at });
    }

    /// Drops every expired entry and returns how many were removed.
    pub fn evict_expired(&self, now: DateTime<Utc>) -> usize {
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|_, entry| now < entry.expires_at);
        before - entries.len()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 10, 9, 0, 0).unwrap()
    }

    #[test]
    fn entries_live_until_the_ttl_elapses() {
        let cache = TtlCache::new(Duration::hours(1));
        cache.insert("gym".to_string(), 1, t0());

        assert_eq!(cache.get(&"gym".to_string(), t0() + Duration::minutes(59)), Some(1));
        assert_eq!(cache.get(&"gym".to_string(), t0() + Duration::hours(1)), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn reinsert_restarts_the_clock() {
        let cache = TtlCache::new(Duration::minutes(10));
        cache.insert(1, "a", t0());
        cache.insert(1, "b", t0() + Duration::minutes(8));
        assert_eq!(cache.get(&1, t0() + Duration::minutes(15)), Some("b"));
    }

    #[test]
    fn eviction_only_drops_expired_entries() {
        let cache = TtlCache::new(Duration::minutes(10));
        cache.insert(1, (), t0());
        cache.insert(2, (), t0() + Duration::minutes(5));

        assert_eq!(cache.evict_expired(t0() + Duration::minutes(12)), 1);
        assert_eq!(cache.len(), 1);
    }
}
