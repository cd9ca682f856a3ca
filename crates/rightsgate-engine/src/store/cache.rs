//! Per-tenant cache of compiled, ordered policy lists with a TTL.

use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;

use rightsgate_core::Policy;

#[derive(Clone)]
struct CacheEntry {
    loaded_at: Instant,
    policies: Arc<[Policy]>,
}

/// Short-lived cache in front of the policy store.
///
/// Entries are immutable snapshots; a writer that changes a tenant's policies
/// should call [`PolicyCache::invalidate`] so the next evaluation reloads.
pub struct PolicyCache {
    ttl: Option<Duration>,
    entries: DashMap<u64, CacheEntry>,
}

impl PolicyCache {
    /// `None` disables caching entirely.
    pub fn new(ttl: Option<Duration>) -> Self {
        Self {
            ttl,
            entries: DashMap::new(),
        }
    }

    pub fn disabled() -> Self {
        Self::new(None)
    }

    pub fn is_enabled(&self) -> bool {
        self.ttl.is_some()
    }

    /// Fresh snapshot for a tenant, if any. Expired entries are evicted.
    pub fn get(&self, tenant_id: u64) -> Option<Arc<[Policy]>> {
        let ttl = self.ttl?;
        let now = Instant::now();
        {
            let entry = self.entries.get(&tenant_id)?;
            if now.duration_since(entry.loaded_at) < ttl {
                return Some(Arc::clone(&entry.policies));
            }
        } // drop shard guard before removing

        self.entries
            .remove_if(&tenant_id, |_, e| now.duration_since(e.loaded_at) >= ttl);
        None
    }

    pub fn insert(&self, tenant_id: u64, policies: Arc<[Policy]>) {
        if self.ttl.is_none() {
            return;
        }
        self.entries.insert(
            tenant_id,
            CacheEntry {
                loaded_at: Instant::now(),
                policies,
            },
        );
    }

    pub fn invalidate(&self, tenant_id: u64) {
        self.entries.remove(&tenant_id);
    }

    pub fn invalidate_all(&self) {
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
    use rightsgate_core::{PolicyRecord, PolicyType};

    use super::*;

    fn snapshot() -> Arc<[Policy]> {
        let p = PolicyRecord::new(1, 1, "p", PolicyType::Allow, 0)
            .compile()
            .expect("policy");
        vec![p].into()
    }

    #[test]
    fn hit_until_invalidated() {
        let cache = PolicyCache::new(Some(Duration::from_secs(60)));
        assert!(cache.get(1).is_none());

        cache.insert(1, snapshot());
        assert_eq!(cache.get(1).expect("hit").len(), 1);
        assert!(cache.get(2).is_none());

        cache.invalidate(1);
        assert!(cache.get(1).is_none());
    }

    #[test]
    fn expired_entries_are_evicted() {
        let cache = PolicyCache::new(Some(Duration::from_millis(5)));
        cache.insert(1, snapshot());
        std::thread::sleep(Duration::from_millis(20));
        assert!(cache.get(1).is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn disabled_cache_stores_nothing() {
        let cache = PolicyCache::disabled();
        cache.insert(1, snapshot());
        assert!(cache.get(1).is_none());
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn invalidate_all_clears_every_tenant() {
        let cache = PolicyCache::new(Some(Duration::from_secs(60)));
        cache.insert(1, snapshot());
        cache.insert(2, snapshot());
        cache.invalidate_all();
        assert!(cache.is_empty());
    }
}
