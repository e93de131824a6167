use lru::LruCache;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::CacheConfig;
use crate::error::CacheError;
use crate::models::{Embedding, FusedResult};

/// Stable digest of everything that determines a fused value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    /// Hashes the strategy tag, then per modality (sorted by tag) the tag,
    /// dimension and content hash, then the effective weights in that order.
    pub fn derive(strategy: &str, entries: &[(&Embedding, f32)]) -> Self {
        let mut sorted: Vec<&(&Embedding, f32)> = entries.iter().collect();
        sorted.sort_by(|a, b| a.0.modality.as_str().cmp(b.0.modality.as_str()));

        let mut hasher = Sha256::new();
        hasher.update(b"strategy:");
        hasher.update(strategy.as_bytes());
        for (embedding, _) in &sorted {
            hasher.update(b"|modality:");
            hasher.update(embedding.modality.as_str().as_bytes());
            hasher.update((embedding.vector.len() as u64).to_le_bytes());
            hasher.update(embedding.content_hash().as_bytes());
        }
        hasher.update(b"|weights:");
        for (_, weight) in &sorted {
            hasher.update(weight.to_le_bytes());
        }

        Self(hex::encode(hasher.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub insertions: u64,
    pub evictions: u64,
    pub expirations: u64,
    pub entries: usize,
    pub capacity: usize,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

struct CacheEntry {
    result: Arc<FusedResult>,
    inserted_at: Instant,
    last_access: Instant,
}

struct CacheInner {
    entries: Option<LruCache<CacheKey, CacheEntry>>,
    stats: CacheStats,
}

/// Bounded LRU memo of fused results.
///
/// One mutex guards both the map and the counters. Entries are stored behind
/// `Arc`, so a reader either sees a complete result or nothing.
pub struct ResultCache {
    inner: Mutex<CacheInner>,
    ttl: Option<Duration>,
    max_entry_dimension: usize,
}

impl ResultCache {
    pub fn new(capacity: usize) -> Self {
        Self::with_limits(capacity, None, usize::MAX)
    }

    pub fn from_config(config: &CacheConfig) -> Self {
        Self::with_limits(config.capacity, config.ttl(), config.max_entry_dimension)
    }

    pub fn with_limits(capacity: usize, ttl: Option<Duration>, max_entry_dimension: usize) -> Self {
        Self {
            inner: Mutex::new(CacheInner {
                entries: NonZeroUsize::new(capacity).map(LruCache::new),
                stats: CacheStats {
                    capacity,
                    ..Default::default()
                },
            }),
            ttl,
            max_entry_dimension,
        }
    }

    pub fn get(&self, key: &CacheKey) -> Option<Arc<FusedResult>> {
        let mut guard = self.inner.lock();
        let inner = &mut *guard;
        let Some(entries) = inner.entries.as_mut() else {
            inner.stats.misses += 1;
            return None;
        };

        let expired = match entries.get_mut(key) {
            None => {
                inner.stats.misses += 1;
                return None;
            }
            Some(entry) => match self.ttl {
                Some(ttl) if entry.inserted_at.elapsed() > ttl => true,
                _ => {
                    entry.last_access = Instant::now();
                    inner.stats.hits += 1;
                    return Some(Arc::clone(&entry.result));
                }
            },
        };

        if expired {
            entries.pop(key);
            inner.stats.expirations += 1;
            inner.stats.misses += 1;
        }
        None
    }

    pub fn put(&self, key: CacheKey, result: Arc<FusedResult>) -> Result<(), CacheError> {
        if result.dimension > self.max_entry_dimension {
            return Err(CacheError::EntryTooLarge {
                dimension: result.dimension,
                limit: self.max_entry_dimension,
            });
        }

        let mut guard = self.inner.lock();
        let inner = &mut *guard;
        let entries = inner.entries.as_mut().ok_or(CacheError::Disabled)?;

        let now = Instant::now();
        let entry = CacheEntry {
            result,
            inserted_at: now,
            last_access: now,
        };
        if let Some((displaced, _)) = entries.push(key.clone(), entry) {
            if displaced != key {
                inner.stats.evictions += 1;
            }
        }
        inner.stats.insertions += 1;
        Ok(())
    }

    /// Time since the entry was last read or written, if present.
    pub fn idle_time(&self, key: &CacheKey) -> Option<Duration> {
        let guard = self.inner.lock();
        guard
            .entries
            .as_ref()
            .and_then(|entries| entries.peek(key))
            .map(|entry| entry.last_access.elapsed())
    }

    pub fn len(&self) -> usize {
        self.inner
            .lock()
            .entries
            .as_ref()
            .map(|entries| entries.len())
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        if let Some(entries) = self.inner.lock().entries.as_mut() {
            entries.clear();
        }
    }

    pub fn stats(&self) -> CacheStats {
        let guard = self.inner.lock();
        CacheStats {
            entries: guard.entries.as_ref().map(|e| e.len()).unwrap_or(0),
            ..guard.stats.clone()
        }
    }
}
