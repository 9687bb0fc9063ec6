use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::debug;

use crate::feed_error::{FeedError, FeedResult};
use crate::feed_loader::FeedLoader;
use crate::model::{Feed, FeedEntity};

/// Storage behind a [`FeedCache`]. Entries are immutable once inserted.
pub trait CacheStore: Send + Sync {
    fn get(&self, key: &str) -> Option<Feed>;

    fn insert(&self, key: String, feed: Feed);

    fn len(&self) -> usize;

    fn clear(&self);
}

/// In-memory store, unbounded.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: DashMap<String, Feed>,
}

impl CacheStore for MemoryStore {
    fn get(&self, key: &str) -> Option<Feed> {
        self.entries.get(key).map(|entry| entry.value().clone())
    }

    fn insert(&self, key: String, feed: Feed) {
        self.entries.entry(key).or_insert(feed);
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn clear(&self) {
        self.entries.clear()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    /// Loads started, successful or not.
    pub misses: u64,
    pub entries: usize,
}

/// Loads each URL at most once. Nothing is evicted: entries and per-URL locks
/// grow with the number of distinct URLs until [`FeedCache::clear`].
pub struct FeedCache {
    store: Arc<dyn CacheStore>,
    locks: DashMap<String, Arc<Mutex<()>>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl Default for FeedCache {
    fn default() -> Self {
        FeedCache::new()
    }
}

impl FeedCache {
    pub fn new() -> Self {
        FeedCache::with_store(Arc::new(MemoryStore::default()))
    }

    pub fn with_store(store: Arc<dyn CacheStore>) -> Self {
        FeedCache {
            store,
            locks: DashMap::new(),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Returns the entry stored under `key`, running `load` first if there is
    /// none yet. A failed load stores nothing and its error is returned as is.
    pub async fn get_or_load<F, Fut>(&self, key: &str, load: F) -> FeedResult<Feed>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = FeedResult<Feed>>,
    {
        if let Some(feed) = self.hit(key) {
            return Ok(feed);
        }

        let lock = self.lock_for(key);
        let _guard = lock.lock().await;

        // Another caller may have finished the load while we waited.
        if let Some(feed) = self.hit(key) {
            return Ok(feed);
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        debug!(key, "cache miss, loading");
        let feed = load().await?;
        self.store.insert(key.to_owned(), feed.clone());
        Ok(feed)
    }

    pub async fn fetch<T: FeedEntity>(&self, url: &str, loader: &dyn FeedLoader) -> FeedResult<Arc<T>> {
        let feed = self.get_or_load(url, || loader.load(url, T::SHAPE)).await?;
        T::from_feed(feed).ok_or_else(|| FeedError::UnexpectedEntity {
            url: url.to_owned(),
            expected: T::SHAPE,
        })
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.store.clear()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: self.store.len(),
        }
    }

    fn hit(&self, key: &str) -> Option<Feed> {
        let feed = self.store.get(key)?;
        self.hits.fetch_add(1, Ordering::Relaxed);
        debug!(key, "cache hit");
        Some(feed)
    }

    fn lock_for(&self, key: &str) -> Arc<Mutex<()>> {
        if let Some(lock) = self.locks.get(key) {
            return Arc::clone(lock.value());
        }
        let entry = self
            .locks
            .entry(key.to_owned())
            .or_insert_with(|| Arc::new(Mutex::new(())));
        Arc::clone(entry.value())
    }
}
