//! The execution context threaded through every ingestion call.
//!
//! Nothing in the library reaches for process-wide state: the cache, the
//! byte fetcher, the checksum policy and an optional tracing dispatcher all
//! travel in an [`ExecutionContext`].
//!
//! ```
//! use tabsim::cache::MemoryCache;
//! use tabsim::context::{ChecksumPolicy, ExecutionContext};
//!
//! let ctx = ExecutionContext::new()
//!     .with_cache(MemoryCache::new())
//!     .with_fetcher(|_source: &str| -> tabsim::error::Result<Vec<u8>> {
//!         Ok(b"a,b\n1,x\n2,y\n".to_vec())
//!     })
//!     .with_checksum_policy(ChecksumPolicy::Skip);
//! assert_eq!(ctx.checksum_policy(), ChecksumPolicy::Skip);
//! ```

use crate::cache::{Cache, DiskCache, MemoryCache, NoneCache};
use crate::config::{CacheKind, DEFAULT_OPENML_BASE_URL, Settings};
use crate::loader::{ByteFetcher, DefaultFetcher};
use std::time::Duration;

/// Whether expected checksums are enforced.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ChecksumPolicy {
    #[default]
    Verify,
    /// Checksums are ignored with a warning.
    Skip,
}

pub struct ExecutionContext {
    cache: Box<dyn Cache>,
    fetcher: Box<dyn ByteFetcher>,
    checksum_policy: ChecksumPolicy,
    openml_base_url: String,
    dispatch: Option<tracing::Dispatch>,
}

impl Default for ExecutionContext {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ExecutionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutionContext")
            .field("checksum_policy", &self.checksum_policy)
            .field("openml_base_url", &self.openml_base_url)
            .field("has_dispatch", &self.dispatch.is_some())
            .finish_non_exhaustive()
    }
}

impl ExecutionContext {
    /// No cache, the default fetcher, checksums enforced.
    pub fn new() -> Self {
        Self {
            cache: Box::new(NoneCache),
            fetcher: Box::new(DefaultFetcher::default()),
            checksum_policy: ChecksumPolicy::Verify,
            openml_base_url: DEFAULT_OPENML_BASE_URL.to_owned(),
            dispatch: None,
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        let cache: Box<dyn Cache> = match settings.cache.kind {
            CacheKind::None => Box::new(NoneCache),
            CacheKind::Memory => Box::new(MemoryCache::new()),
            CacheKind::Disk => Box::new(DiskCache::new(settings.cache.resolved_dir())),
        };
        let fetcher = DefaultFetcher::with_timeout(Duration::from_secs(settings.http_timeout_secs));

        Self {
            cache,
            fetcher: Box::new(fetcher),
            checksum_policy: if settings.verify_checksums {
                ChecksumPolicy::Verify
            } else {
                ChecksumPolicy::Skip
            },
            openml_base_url: settings.openml_base_url.trim_end_matches('/').to_owned(),
            dispatch: None,
        }
    }

    pub fn with_cache(mut self, cache: impl Cache + 'static) -> Self {
        self.cache = Box::new(cache);
        self
    }

    pub fn with_fetcher(mut self, fetcher: impl ByteFetcher + 'static) -> Self {
        self.fetcher = Box::new(fetcher);
        self
    }

    pub fn with_checksum_policy(mut self, policy: ChecksumPolicy) -> Self {
        self.checksum_policy = policy;
        self
    }

    pub fn with_openml_base_url(mut self, url: impl Into<String>) -> Self {
        self.openml_base_url = url.into().trim_end_matches('/').to_owned();
        self
    }

    /// Route library events to `dispatch` instead of the global subscriber.
    pub fn with_dispatch(mut self, dispatch: tracing::Dispatch) -> Self {
        self.dispatch = Some(dispatch);
        self
    }

    pub fn cache(&self) -> &dyn Cache {
        self.cache.as_ref()
    }

    pub fn fetcher(&self) -> &dyn ByteFetcher {
        self.fetcher.as_ref()
    }

    pub fn checksum_policy(&self) -> ChecksumPolicy {
        self.checksum_policy
    }

    pub fn openml_base_url(&self) -> &str {
        &self.openml_base_url
    }

    /// Run `f` with this context's dispatcher, if any, as the default.
    pub fn in_scope<T>(&self, f: impl FnOnce() -> T) -> T {
        match &self.dispatch {
            Some(dispatch) => tracing::dispatcher::with_default(dispatch, f),
            None => f(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CacheSettings;

    #[test]
    fn test_from_settings() {
        let settings = Settings {
            cache: CacheSettings {
                kind: CacheKind::None,
                dir: None,
            },
            openml_base_url: "http://localhost:8080/".to_owned(),
            verify_checksums: false,
            ..Settings::default()
        };
        let ctx = ExecutionContext::from_settings(&settings);
        assert_eq!(ctx.checksum_policy(), ChecksumPolicy::Skip);
        assert_eq!(ctx.openml_base_url(), "http://localhost:8080");
        ctx.cache().put("k", b"v").unwrap();
        assert!(!ctx.cache().contains("k"));
    }

    #[test]
    fn test_in_scope_uses_dispatch() {
        let ctx = ExecutionContext::new().with_dispatch(tracing::Dispatch::none());
        let inside = ctx.in_scope(|| {
            tracing::dispatcher::get_default(|d| d.is::<tracing::subscriber::NoSubscriber>())
        });
        assert!(inside);
    }
}
