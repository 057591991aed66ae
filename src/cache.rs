//! Byte caches keyed by source identifier.
//!
//! The loader consults the cache held by the [`crate::context::ExecutionContext`]
//! before fetching anything. Which cache is used is the caller's choice:
//!
//! - [`NoneCache`] disables reuse; every load fetches
//! - [`MemoryCache`] keeps payloads for the lifetime of the context
//! - [`DiskCache`] persists payloads across runs

pub mod disk;

pub use disk::DiskCache;

use crate::error::Result;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Storage for fetched payloads.
///
/// Writes must be visible to subsequent reads on the same cache. Concurrent
/// writers racing on one key are not coordinated.
pub trait Cache: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    fn put(&self, key: &str, bytes: &[u8]) -> Result<()>;

    fn contains(&self, key: &str) -> bool;

    fn remove(&self, key: &str) -> Result<()>;

    fn clear(&self) -> Result<()>;
}

/// A cache that stores nothing.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoneCache;

impl Cache for NoneCache {
    fn get(&self, _key: &str) -> Result<Option<Vec<u8>>> {
        Ok(None)
    }

    fn put(&self, _key: &str, _bytes: &[u8]) -> Result<()> {
        Ok(())
    }

    fn contains(&self, _key: &str) -> bool {
        false
    }

    fn remove(&self, _key: &str) -> Result<()> {
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        Ok(())
    }
}

/// In-process cache.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // Each entry is replaced whole, so a poisoned map is still consistent.
    fn entries(&self) -> MutexGuard<'_, HashMap<String, Vec<u8>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Cache for MemoryCache {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.entries().get(key).cloned())
    }

    fn put(&self, key: &str, bytes: &[u8]) -> Result<()> {
        self.entries().insert(key.to_owned(), bytes.to_vec());
        Ok(())
    }

    fn contains(&self, key: &str) -> bool {
        self.entries().contains_key(key)
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.entries().remove(key);
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        self.entries().clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_none_cache_never_hits() {
        let cache = NoneCache;
        cache.put("k", b"v").unwrap();
        assert!(!cache.contains("k"));
        assert_eq!(cache.get("k").unwrap(), None);
    }

    #[test]
    fn test_memory_cache_read_after_write() {
        let cache = MemoryCache::new();
        assert!(cache.is_empty());

        cache.put("http://x/table.csv", b"a,b\n1,2").unwrap();
        assert!(cache.contains("http://x/table.csv"));
        assert_eq!(
            cache.get("http://x/table.csv").unwrap().as_deref(),
            Some(&b"a,b\n1,2"[..])
        );

        cache.remove("http://x/table.csv").unwrap();
        assert!(!cache.contains("http://x/table.csv"));
    }

    #[test]
    fn test_memory_cache_clear() {
        let cache = MemoryCache::new();
        cache.put("a", b"1").unwrap();
        cache.put("b", b"2").unwrap();
        assert_eq!(cache.len(), 2);
        cache.clear().unwrap();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_memory_cache_survives_poisoned_lock() {
        let cache = std::sync::Arc::new(MemoryCache::new());
        cache.put("before", b"1").unwrap();

        let poisoner = std::sync::Arc::clone(&cache);
        let joined = std::thread::spawn(move || {
            let _guard = poisoner.entries.lock().unwrap();
            panic!("writer died holding the lock");
        })
        .join();
        assert!(joined.is_err());
        assert!(cache.entries.is_poisoned());

        cache.put("after", b"2").unwrap();
        assert_eq!(cache.get("before").unwrap(), Some(b"1".to_vec()));
        assert_eq!(cache.get("after").unwrap(), Some(b"2".to_vec()));
        assert_eq!(cache.len(), 2);
    }
}
