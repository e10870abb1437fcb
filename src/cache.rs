use fnv::FnvHashMap;
use std::collections::hash_map::Entry;
use std::hash::Hash;

/// The current step, passed down to everything that caches.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StepContext {
    pub tick: u32,
}

impl StepContext {
    pub fn new(tick: u32) -> StepContext {
        StepContext { tick }
    }
}

struct CacheEntry<V> {
    value: V,
    expires_at: u32,
}

/// Memoization keyed by `K` with explicit expiry.
///
/// An entry inserted at tick `t` with a ttl of `n` is served through tick
/// `t + n`; a ttl of 0 keeps it for the inserting step only.
pub struct StepCache<K, V> {
    entries: FnvHashMap<K, CacheEntry<V>>,
}

impl<K, V> Default for StepCache<K, V>
where
    K: Eq + Hash,
{
    fn default() -> Self {
        StepCache {
            entries: FnvHashMap::default(),
        }
    }
}

impl<K, V> StepCache<K, V>
where
    K: Eq + Hash,
{
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, ctx: &StepContext, key: &K) -> Option<&V> {
        self.entries
            .get(key)
            .filter(|entry| entry.expires_at >= ctx.tick)
            .map(|entry| &entry.value)
    }

    pub fn insert(&mut self, ctx: &StepContext, key: K, ttl: u32, value: V) {
        let expires_at = ctx.tick.saturating_add(ttl);
        self.entries.insert(key, CacheEntry { value, expires_at });
    }

    pub fn get_or_insert_with<F>(&mut self, ctx: &StepContext, key: K, ttl: u32, fill: F) -> &V
    where
        F: FnOnce() -> V,
    {
        let expires_at = ctx.tick.saturating_add(ttl);

        match self.entries.entry(key) {
            Entry::Occupied(mut occupied) => {
                if occupied.get().expires_at < ctx.tick {
                    occupied.insert(CacheEntry { value: fill(), expires_at });
                }
                &occupied.into_mut().value
            }
            Entry::Vacant(vacant) => &vacant.insert(CacheEntry { value: fill(), expires_at }).value,
        }
    }

    pub fn invalidate(&mut self, key: &K) -> Option<V> {
        self.entries.remove(key).map(|entry| entry.value)
    }

    /// Drop every entry that has expired by `ctx`.
    pub fn purge_expired(&mut self, ctx: &StepContext) {
        self.entries.retain(|_, entry| entry.expires_at >= ctx.tick);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
