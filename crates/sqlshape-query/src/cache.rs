//! Command-text caching keyed by request fingerprints.
//!
//! Generated SQL depends only on the structure of a request, never on its
//! bound values, so the text for a fingerprint is built once and shared.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use sqlshape_core::Result;

use crate::request::CacheKey;

/// Hit/miss counters of a [`CommandTextCache`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
}

/// Process-wide map from request fingerprint to generated SQL text.
///
/// Lookups take a read lock; a miss builds the text with no lock held and
/// publishes it with a short write. Two threads missing on the same key
/// may both build, and the first published text wins. Failed builds are
/// not stored. Entries are never evicted.
///
/// Every entry records the registry revision of the builder that rendered
/// it. A lookup under a different revision is a miss, and a newer revision
/// replaces the stored text, so text from a replaced builder is never
/// served.
///
/// # Example
///
/// ```
/// use sqlshape_core::Dialect;
/// use sqlshape_query::{CacheKey, CommandTextCache, Target, TruncateRequest};
///
/// let cache = CommandTextCache::new();
/// let key = CacheKey::Truncate(TruncateRequest {
///     target: Target::Table("Person".into()),
///     dialect: Dialect::Postgres,
/// });
///
/// let text = cache.get_text(&key, 1, |_| Ok("TRUNCATE TABLE \"Person\";".into())).unwrap();
/// let again = cache.get_text(&key, 1, |_| unreachable!()).unwrap();
/// assert!(std::sync::Arc::ptr_eq(&text, &again));
/// ```
#[derive(Debug, Default)]
pub struct CommandTextCache {
    entries: RwLock<HashMap<CacheKey, CachedText>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

#[derive(Debug)]
struct CachedText {
    revision: u64,
    text: Arc<str>,
}

impl CommandTextCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the text for `key` rendered by builder revision `revision`,
    /// building it with `build` on a miss.
    pub fn get_text<F>(&self, key: &CacheKey, revision: u64, build: F) -> Result<Arc<str>>
    where
        F: FnOnce(&CacheKey) -> Result<String>,
    {
        if let Some(text) = self.lookup(key, revision) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            tracing::trace!(operation = key.operation(), "command text cache hit");
            return Ok(text);
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        let built: Arc<str> = Arc::from(build(key)?);
        tracing::debug!(
            operation = key.operation(),
            dialect = %key.dialect(),
            revision,
            sql = %built,
            "built command text"
        );

        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        match entries.entry(key.clone()) {
            Entry::Vacant(slot) => {
                slot.insert(CachedText {
                    revision,
                    text: Arc::clone(&built),
                });
                Ok(built)
            }
            Entry::Occupied(mut slot) => {
                let stored = slot.get_mut();
                if stored.revision == revision {
                    return Ok(Arc::clone(&stored.text));
                }
                // Text of a newer builder stays; older text is replaced.
                if stored.revision < revision {
                    tracing::debug!(
                        operation = key.operation(),
                        stale = stored.revision,
                        revision,
                        "replaced command text of a superseded builder"
                    );
                    *stored = CachedText {
                        revision,
                        text: Arc::clone(&built),
                    };
                }
                Ok(built)
            }
        }
    }

    fn lookup(&self, key: &CacheKey, revision: u64) -> Option<Arc<str>> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries
            .get(key)
            .filter(|entry| entry.revision == revision)
            .map(|entry| Arc::clone(&entry.text))
    }

    /// Check if a fingerprint is cached.
    pub fn contains(&self, key: &CacheKey) -> bool {
        self.entries
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .contains_key(key)
    }

    /// Number of cached texts.
    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Check if cache is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every cached text and reset the counters.
    pub fn clear(&self) {
        self.entries
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
    }

    /// Get cache statistics.
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: self.len(),
        }
    }
}
