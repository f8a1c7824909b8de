//! Size and age bounds for the in-memory lookup caches.

use dashmap::DashMap;
use std::hash::Hash;
use std::time::{Duration, Instant};

pub trait TimedEntry {
    fn stored_at(&self) -> Instant;

    fn is_fresh(&self, ttl: Duration) -> bool {
        self.stored_at().elapsed() <= ttl
    }
}

/// Drop entries older than `ttl`, then evict the oldest until at most
/// `max_entries` remain. Returns how many entries were removed.
pub fn prune<K, V>(cache: &DashMap<K, V>, max_entries: usize, ttl: Duration) -> usize
where
    K: Clone + Eq + Hash,
    V: TimedEntry,
{
    let before = cache.len();
    cache.retain(|_, entry| entry.is_fresh(ttl));

    if cache.len() > max_entries {
        let mut by_age: Vec<(K, Instant)> = cache
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().stored_at()))
            .collect();
        by_age.sort_by_key(|(_, stored_at)| *stored_at);
        let excess = cache.len() - max_entries;
        for (key, _) in by_age.into_iter().take(excess) {
            cache.remove(&key);
        }
    }

    before.saturating_sub(cache.len())
}
