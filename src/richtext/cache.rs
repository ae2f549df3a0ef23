//! LRU cache of detected rich text, keyed by the draft text.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::RichText;

/// Maximum number of texts to keep in cache
const MAX_CACHE_SIZE: usize = 64;

struct CachedRichText {
    rich_text: RichText,
    /// Access clock value at last use (for LRU eviction)
    last_access: u64,
}

#[derive(Default)]
struct Entries {
    map: HashMap<String, CachedRichText>,
    clock: u64,
}

impl Entries {
    fn tick(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }
}

/// Thread-safe facet cache
#[derive(Clone, Default)]
pub struct FacetCache {
    entries: Arc<Mutex<Entries>>,
}

impl FacetCache {
    /// Create a new facet cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Entries> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Store detected rich text under its own text.
    pub fn insert(&self, rich_text: RichText) {
        let mut cache = self.lock();

        if cache.map.len() >= MAX_CACHE_SIZE && !cache.map.contains_key(&rich_text.text) {
            Self::evict_oldest(&mut cache.map);
        }

        let last_access = cache.tick();
        cache.map.insert(rich_text.text.clone(), CachedRichText {
            rich_text,
            last_access,
        });
    }

    /// Get the rich text detected for `text`, if any.
    pub fn get(&self, text: &str) -> Option<RichText> {
        let mut cache = self.lock();
        let now = cache.tick();
        cache.map.get_mut(text).map(|entry| {
            entry.last_access = now;
            entry.rich_text.clone()
        })
    }

    fn evict_oldest(cache: &mut HashMap<String, CachedRichText>) {
        if let Some(oldest_key) = cache
            .iter()
            .min_by_key(|(_, v)| v.last_access)
            .map(|(k, _)| k.clone())
        {
            cache.remove(&oldest_key);
        }
    }

    /// Get the number of cached texts.
    pub fn len(&self) -> usize {
        self.lock().map.len()
    }

    /// Check if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.lock().map.is_empty()
    }
}
