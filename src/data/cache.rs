//! Table Cache Module
//! Caller-owned memo of normalized tables keyed by fetch parameters.

use crate::data::loader::{LoadFailure, SheetKey, SheetSource};
use crate::data::processor::{Normalizer, ProcessorError};
use crate::data::NormalizedTable;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum CacheError {
    #[error(transparent)]
    Load(#[from] LoadFailure),
    #[error(transparent)]
    Normalize(#[from] ProcessorError),
}

/// Memoized normalized tables.
///
/// Entries never expire; `invalidate` is the only way to force a refetch.
/// Concurrent misses for the same key may both fetch, and the last insert wins.
#[derive(Default)]
pub struct TableCache {
    entries: RwLock<HashMap<SheetKey, Arc<NormalizedTable>>>,
}

impl TableCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached table for `key`, if any.
    pub fn get(&self, key: &SheetKey) -> Option<Arc<NormalizedTable>> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    /// Return the cached table, or fetch and normalize it through `source`.
    ///
    /// Failures are returned to the caller and never cached.
    pub fn get_or_load<S: SheetSource + ?Sized>(
        &self,
        key: &SheetKey,
        source: &S,
    ) -> Result<Arc<NormalizedTable>, CacheError> {
        if let Some(table) = self.get(key) {
            debug!(sheet_id = %key.sheet_id, sheet = %key.sheet_name, "cache hit");
            return Ok(table);
        }

        let raw = source.fetch(key)?;
        let table = Arc::new(Normalizer::try_normalize(&raw)?);

        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.clone(), Arc::clone(&table));
        debug!(sheet_id = %key.sheet_id, sheet = %key.sheet_name, "cache filled");

        Ok(table)
    }

    /// Drop every memoized table ("refresh").
    pub fn invalidate(&self) {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let dropped = entries.len();
        entries.clear();
        info!(dropped, "cache invalidated");
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::RawTable;
    use anyhow::Result;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tracing_subscriber::EnvFilter;

    fn init_test_logging() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| EnvFilter::new("info,ple_dashboard::data=debug")),
            )
            .with_test_writer()
            .try_init();
    }

    /// Serves a fixed table and counts fetches.
    struct CountingSource {
        fetches: AtomicUsize,
        fail: bool,
    }

    impl CountingSource {
        fn new(fail: bool) -> Self {
            Self {
                fetches: AtomicUsize::new(0),
                fail,
            }
        }

        fn fetches(&self) -> usize {
            self.fetches.load(Ordering::SeqCst)
        }
    }

    impl SheetSource for CountingSource {
        fn fetch(&self, _key: &SheetKey) -> Result<RawTable, LoadFailure> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(LoadFailure::MissingHeader);
            }
            RawTable::from_csv_reader("District,Div1_M,Div1_F\nGulu,2,3\n".as_bytes())
        }
    }

    #[test]
    fn repeated_requests_hit_the_cache() -> Result<()> {
        init_test_logging();
        let cache = TableCache::new();
        let source = CountingSource::new(false);
        let key = SheetKey::new("sheet", "Sheet1");

        let first = cache.get_or_load(&key, &source)?;
        let second = cache.get_or_load(&key, &source)?;

        assert_eq!(source.fetches(), 1);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.numeric_column("Registered - Total"), vec![5.0]);
        Ok(())
    }

    #[test]
    fn keys_are_independent() -> Result<()> {
        let cache = TableCache::new();
        let source = CountingSource::new(false);

        cache.get_or_load(&SheetKey::new("sheet", "Sheet1"), &source)?;
        cache.get_or_load(&SheetKey::new("sheet", "Sheet2"), &source)?;

        assert_eq!(source.fetches(), 2);
        assert_eq!(cache.len(), 2);
        Ok(())
    }

    #[test]
    fn invalidate_forces_refetch() -> Result<()> {
        init_test_logging();
        let cache = TableCache::new();
        let source = CountingSource::new(false);
        let key = SheetKey::new("sheet", "Sheet1");

        cache.get_or_load(&key, &source)?;
        cache.invalidate();
        assert!(cache.is_empty());
        assert!(cache.get(&key).is_none());

        cache.get_or_load(&key, &source)?;
        assert_eq!(source.fetches(), 2);
        Ok(())
    }

    #[test]
    fn failures_are_not_cached() {
        let cache = TableCache::new();
        let source = CountingSource::new(true);
        let key = SheetKey::new("sheet", "Sheet1");

        assert!(matches!(
            cache.get_or_load(&key, &source),
            Err(CacheError::Load(LoadFailure::MissingHeader))
        ));
        assert!(cache.get_or_load(&key, &source).is_err());
        assert_eq!(source.fetches(), 2);
        assert!(cache.is_empty());
    }

    #[test]
    fn cache_is_shareable_across_threads() -> Result<()> {
        let cache = Arc::new(TableCache::new());
        let source = Arc::new(CountingSource::new(false));
        let key = SheetKey::new("sheet", "Sheet1");

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let cache = Arc::clone(&cache);
                let source = Arc::clone(&source);
                let key = key.clone();
                std::thread::spawn(move || cache.get_or_load(&key, source.as_ref()).is_ok())
            })
            .collect();

        for handle in handles {
            assert!(handle.join().map_err(|_| anyhow::anyhow!("thread panicked"))?);
        }
        assert_eq!(cache.len(), 1);
        assert!(source.fetches() >= 1);
        Ok(())
    }
}
