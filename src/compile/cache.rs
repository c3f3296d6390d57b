//! Caching of parsed template files.
//!
//! Entries are shared futures rather than finished templates. The first
//! lookup of a file writes its pending parse into the cache before awaiting
//! it, so concurrent lookups of the same file await a single read and parse.

use futures::future::{BoxFuture, Shared};
use indexmap::IndexMap;
use parking_lot::Mutex;

use crate::types::template::Template;
use crate::Result;

/// A parse of a template file that may still be in progress.
pub type CacheEntry = Shared<BoxFuture<'static, Result<Template>>>;

/// Storage for parsed template files keyed by lookup.
///
/// Failed parses are removed again so a later lookup retries.
pub trait ParseCache: Send + Sync {
    fn read(&self, key: &str) -> Option<CacheEntry>;

    fn write(&self, key: &str, entry: CacheEntry);

    fn remove(&self, key: &str);
}

/// A least recently used cache with a fixed capacity.
pub struct LruCache {
    capacity: usize,
    entries: Mutex<IndexMap<String, CacheEntry>>,
}

impl LruCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: Mutex::new(IndexMap::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ParseCache for LruCache {
    fn read(&self, key: &str) -> Option<CacheEntry> {
        let mut entries = self.entries.lock();
        // Move to the back, the most recently used end.
        let entry = entries.shift_remove(key)?;
        entries.insert(key.to_owned(), entry.clone());
        Some(entry)
    }

    fn write(&self, key: &str, entry: CacheEntry) {
        if self.capacity == 0 {
            return;
        }
        let mut entries = self.entries.lock();
        entries.shift_remove(key);
        entries.insert(key.to_owned(), entry);
        while entries.len() > self.capacity {
            entries.shift_remove_index(0);
        }
    }

    fn remove(&self, key: &str) {
        self.entries.lock().shift_remove(key);
    }
}

#[cfg(test)]
mod tests {
    use futures::FutureExt;

    use super::*;

    fn entry() -> CacheEntry {
        futures::future::ready(Ok(Template::default())).boxed().shared()
    }

    #[test]
    fn lru_evicts_least_recently_used() {
        let cache = LruCache::new(2);
        cache.write("a", entry());
        cache.write("b", entry());
        assert!(cache.read("a").is_some());
        cache.write("c", entry());
        assert!(cache.read("b").is_none());
        assert!(cache.read("a").is_some());
        assert!(cache.read("c").is_some());
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn lru_remove() {
        let cache = LruCache::new(4);
        cache.write("a", entry());
        cache.remove("a");
        assert!(cache.read("a").is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn lru_zero_capacity_stores_nothing() {
        let cache = LruCache::new(0);
        cache.write("a", entry());
        assert!(cache.read("a").is_none());
    }
}
