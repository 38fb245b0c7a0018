//! Bounded issuer-keyed CRL cache
//!
//! Keys are the canonical DER of the issuer DN. Two expiry notions apply:
//! protocol expiry (`nextUpdate` has passed) and soft expiry (the entry has
//! sat in the cache longer than the configured TTL, forcing a refresh even
//! while `nextUpdate` is still in the future). Eviction is deterministic on
//! insertion order with a fixed capacity bound.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};
use std::time::{Duration, SystemTime};

use super::Crl;

#[derive(Debug)]
struct CacheSlot {
    crl: Arc<Crl>,
    inserted_at: SystemTime,
}

#[derive(Debug, Default)]
struct CacheInner {
    slots: HashMap<String, CacheSlot>,
    /// Keys in insertion order, oldest first
    order: VecDeque<String>,
}

/// Cache counters snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrlCacheStats {
    pub hits: usize,
    pub misses: usize,
    pub evictions: usize,
    pub size: usize,
}

/// Bounded mapping from issuer DN to the latest parsed CRL
pub struct CrlCache {
    inner: RwLock<CacheInner>,
    max_entries: usize,
    soft_ttl: Duration,
    cache_hits: AtomicUsize,
    cache_misses: AtomicUsize,
    evictions: AtomicUsize,
}

impl std::fmt::Debug for CrlCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CrlCache")
            .field("size", &self.len())
            .field("max_entries", &self.max_entries)
            .field("soft_ttl", &self.soft_ttl)
            .finish_non_exhaustive()
    }
}

fn cache_key(issuer_der: &[u8]) -> String {
    hex::encode(issuer_der)
}

impl CrlCache {
    pub fn new(max_entries: usize, soft_ttl: Duration) -> Self {
        Self {
            inner: RwLock::new(CacheInner::default()),
            max_entries,
            soft_ttl,
            cache_hits: AtomicUsize::new(0),
            cache_misses: AtomicUsize::new(0),
            evictions: AtomicUsize::new(0),
        }
    }

    /// Insert a CRL for its issuer, evicting the oldest insertion once the
    /// capacity bound is exceeded. Re-inserting a key replaces its value and
    /// refreshes its insertion position.
    pub fn put(&self, crl: Crl) {
        let key = cache_key(&crl.issuer_der);
        let issuer = crl.issuer.clone();
        let mut inner = self.write_inner();

        if inner.slots.contains_key(&key) {
            inner.order.retain(|k| k != &key);
        }
        inner.order.push_back(key.clone());
        inner.slots.insert(
            key,
            CacheSlot {
                crl: Arc::new(crl),
                inserted_at: SystemTime::now(),
            },
        );

        while inner.slots.len() > self.max_entries {
            let Some(oldest) = inner.order.pop_front() else {
                break;
            };
            if let Some(slot) = inner.slots.remove(&oldest) {
                self.evictions.fetch_add(1, Ordering::Relaxed);
                tracing::debug!("evicted CRL for issuer {} (capacity)", slot.crl.issuer);
            }
        }

        tracing::debug!("cached CRL for issuer {issuer}");
    }

    /// Fetch the cached CRL for an issuer. An entry past its soft TTL is
    /// removed and reported as absent.
    pub fn get(&self, issuer_der: &[u8]) -> Option<Arc<Crl>> {
        let key = cache_key(issuer_der);
        let now = SystemTime::now();

        let found = {
            let inner = self.read_inner();
            match inner.slots.get(&key) {
                Some(slot) if self.is_soft_expired(slot, now) => None,
                Some(slot) => Some(Arc::clone(&slot.crl)),
                None => {
                    self.cache_misses.fetch_add(1, Ordering::Relaxed);
                    return None;
                }
            }
        };

        match found {
            Some(crl) => {
                self.cache_hits.fetch_add(1, Ordering::Relaxed);
                Some(crl)
            }
            None => {
                let mut inner = self.write_inner();
                inner.slots.remove(&key);
                inner.order.retain(|k| k != &key);
                self.cache_misses.fetch_add(1, Ordering::Relaxed);
                tracing::debug!("CRL cache entry passed soft TTL, dropped");
                None
            }
        }
    }

    /// True if the issuer has no usable CRL or its authority window ends
    /// within `threshold`. Entries without `nextUpdate` always report true.
    pub fn expiring_soon(&self, issuer_der: &[u8], threshold: Duration) -> bool {
        let key = cache_key(issuer_der);
        let now = SystemTime::now();
        let inner = self.read_inner();
        match inner.slots.get(&key) {
            None => true,
            Some(slot) => match slot.crl.next_update {
                None => true,
                Some(next) => next <= now + threshold,
            },
        }
    }

    /// Evict every entry whose `nextUpdate` is absent or already passed
    pub fn remove_expired(&self) -> usize {
        let now = SystemTime::now();
        let mut inner = self.write_inner();
        let before = inner.slots.len();
        inner.slots.retain(|_, slot| !slot.crl.is_expired(now));
        let removed = before - inner.slots.len();
        let CacheInner { slots, order } = &mut *inner;
        order.retain(|k| slots.contains_key(k));
        if removed > 0 {
            self.evictions.fetch_add(removed, Ordering::Relaxed);
            tracing::debug!("removed {removed} expired CRLs from cache");
        }
        removed
    }

    pub fn clear(&self) {
        let mut inner = self.write_inner();
        inner.slots.clear();
        inner.order.clear();
    }

    /// Display names of all cached issuers
    pub fn issuers(&self) -> Vec<String> {
        let inner = self.read_inner();
        inner
            .order
            .iter()
            .filter_map(|k| inner.slots.get(k).map(|slot| slot.crl.issuer.clone()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.read_inner().slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CrlCacheStats {
        CrlCacheStats {
            hits: self.cache_hits.load(Ordering::Relaxed),
            misses: self.cache_misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            size: self.len(),
        }
    }

    fn is_soft_expired(&self, slot: &CacheSlot, now: SystemTime) -> bool {
        now.duration_since(slot.inserted_at).unwrap_or(Duration::ZERO) > self.soft_ttl
    }

    fn read_inner(&self) -> std::sync::RwLockReadGuard<'_, CacheInner> {
        match self.inner.read() {
            Ok(guard) => guard,
            Err(poisoned) => {
                tracing::warn!("CRL cache read lock poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }

    fn write_inner(&self) -> std::sync::RwLockWriteGuard<'_, CacheInner> {
        match self.inner.write() {
            Ok(guard) => guard,
            Err(poisoned) => {
                tracing::warn!("CRL cache write lock poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }
}
