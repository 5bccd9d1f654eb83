//! TTL response cache
//!
//! Keyed by a deterministic hash of call parameters. Consulted before any
//! new external call. Entries live for a fixed TTL and are removed only by
//! explicit clear or periodic sweep, never invalidated early.

use crate::provider::GenerationOptions;
use dashmap::DashMap;
use std::hash::{Hash, Hasher};
use std::time::{Duration, Instant};

struct CacheEntry {
    value: String,
    inserted: Instant,
}

pub struct ResponseCache {
    entries: DashMap<u64, CacheEntry>,
    ttl: Duration,
}

impl ResponseCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
        }
    }

    /// Deterministic key over everything that shapes the response.
    pub fn key(prompt: &str, options: &GenerationOptions) -> u64 {
        let mut hasher = std::collections::hash_map::DefaultHasher::new();
        prompt.hash(&mut hasher);
        options.model.hash(&mut hasher);
        options.max_tokens.hash(&mut hasher);
        options.temperature.map(|t| t.to_bits()).hash(&mut hasher);
        hasher.finish()
    }

    pub fn get(&self, key: u64) -> Option<String> {
        let entry = self.entries.get(&key)?;
        if entry.inserted.elapsed() > self.ttl {
            drop(entry);
            self.entries.remove(&key);
            return None;
        }
        Some(entry.value.clone())
    }

    pub fn insert(&self, key: u64, value: String) {
        self.entries.insert(
            key,
            CacheEntry {
                value,
                inserted: Instant::now(),
            },
        );
    }

    /// Drop every entry past its TTL.
    pub fn sweep(&self) {
        self.entries.retain(|_, e| e.inserted.elapsed() <= self.ttl);
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_is_deterministic() {
        let opts = GenerationOptions {
            model: Some("m1".into()),
            max_tokens: Some(512),
            temperature: Some(0.2),
        };
        assert_eq!(
            ResponseCache::key("prompt", &opts),
            ResponseCache::key("prompt", &opts)
        );
        assert_ne!(
            ResponseCache::key("prompt", &opts),
            ResponseCache::key("other prompt", &opts)
        );
        let mut other = opts.clone();
        other.model = Some("m2".into());
        assert_ne!(
            ResponseCache::key("prompt", &opts),
            ResponseCache::key("prompt", &other)
        );
    }

    #[test]
    fn hit_within_ttl() {
        let cache = ResponseCache::new(Duration::from_secs(60));
        let key = ResponseCache::key("p", &GenerationOptions::default());
        cache.insert(key, "cached".into());
        assert_eq!(cache.get(key), Some("cached".into()));
    }

    #[test]
    fn miss_after_ttl() {
        let cache = ResponseCache::new(Duration::from_millis(0));
        let key = ResponseCache::key("p", &GenerationOptions::default());
        cache.insert(key, "cached".into());
        std::thread::sleep(Duration::from_millis(5));
        assert_eq!(cache.get(key), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn sweep_removes_expired_only() {
        let cache = ResponseCache::new(Duration::from_secs(60));
        cache.insert(1, "keep".into());
        cache.sweep();
        assert_eq!(cache.len(), 1);
        cache.clear();
        assert!(cache.is_empty());
    }
}
