// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! LRU cache for short-lived, single-use items.
//!
//! Holds passkey registration challenges and prepared signing intents
//! between the request that issues them and the request that redeems them.
//! Entries expire after a TTL and the LRU bound caps memory when clients
//! abandon flows halfway.

use std::num::NonZeroUsize;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use lru::LruCache;

/// Default capacity for pending item caches.
pub const DEFAULT_CAPACITY: usize = 1024;

/// Default lifetime of a pending item.
pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

struct CacheEntry<V> {
    value: V,
    inserted_at: Instant,
}

/// In-process LRU of pending items, each redeemable once.
pub struct PendingCache<V> {
    cache: Mutex<LruCache<String, CacheEntry<V>>>,
    ttl: Duration,
}

impl<V> PendingCache<V> {
    /// Create a new cache with the given capacity and TTL.
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self {
            cache: Mutex::new(LruCache::new(
                NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN),
            )),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Store an item, replacing any previous item under the same key.
    pub fn insert(&self, key: impl Into<String>, value: V) {
        if let Ok(mut cache) = self.cache.lock() {
            cache.put(
                key.into(),
                CacheEntry {
                    value,
                    inserted_at: Instant::now(),
                },
            );
        }
    }

    /// Remove and return the item under `key`.
    ///
    /// Returns `None` if absent, already taken, evicted or expired.
    pub fn take(&self, key: &str) -> Option<V> {
        let mut cache = self.cache.lock().ok()?;
        let entry = cache.pop(key)?;
        if entry.inserted_at.elapsed() < self.ttl {
            Some(entry.value)
        } else {
            None
        }
    }

    /// Number of cached entries, expired ones included.
    pub fn len(&self) -> usize {
        self.cache.lock().map(|c| c.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<V> Default for PendingCache<V> {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY, DEFAULT_TTL)
    }
}
