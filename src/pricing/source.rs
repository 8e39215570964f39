use std::path::Path;
use std::sync::{Arc, Mutex, RwLock};
use std::time::{Duration, Instant};

use crate::error::AppError;
use crate::utils::debug_log;

use super::cache::DiskCache;
use super::provider::fetch_pricing_raw;
use super::types::{PricingDataset, RawDataset};

/// Where a returned dataset came from. `Backup` is the degraded path after a
/// failed refresh; `Network` is a completed refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DatasetOrigin {
    Memory,
    Disk,
    Network,
    Backup,
}

pub(crate) type FetchFn = Box<dyn Fn() -> Result<RawDataset, String> + Send + Sync>;

struct MemoryEntry {
    dataset: Arc<PricingDataset>,
    loaded_at: Instant,
}

/// Two-tier pricing cache: memory, then disk, then network, with a `.bkp`
/// fallback when the network refresh fails.
///
/// Fresh memory reads take only the read lock; everything touching the disk
/// files (freshness check, backup rotation, write) happens under the single
/// refresh mutex so a concurrent reader can never observe a torn file.
pub(crate) struct PricingSource {
    disk: DiskCache,
    fetch: FetchFn,
    ttl: Duration,
    offline: bool,
    memory: RwLock<Option<MemoryEntry>>,
    refresh: Mutex<()>,
}

impl PricingSource {
    pub(crate) fn new(url: &str, cache_dir: &Path, ttl: Duration, offline: bool) -> Self {
        let fetch_url = url.to_string();
        Self::with_fetcher(
            url,
            cache_dir,
            ttl,
            offline,
            Box::new(move || fetch_pricing_raw(&fetch_url)),
        )
    }

    /// Like [`PricingSource::new`] but with the network step supplied by the
    /// caller, so refresh and fallback branches are testable offline.
    pub(crate) fn with_fetcher(
        url: &str,
        cache_dir: &Path,
        ttl: Duration,
        offline: bool,
        fetch: FetchFn,
    ) -> Self {
        Self {
            disk: DiskCache::new(cache_dir, url),
            fetch,
            ttl,
            offline,
            memory: RwLock::new(None),
            refresh: Mutex::new(()),
        }
    }

    /// Return the current pricing dataset, refreshing it when stale.
    /// Idempotent and safe for concurrent callers. Errors only when a fetch
    /// fails and no backup exists.
    pub(crate) fn get_dataset(&self) -> Result<Arc<PricingDataset>, AppError> {
        Ok(self.get_dataset_traced()?.0)
    }

    /// [`PricingSource::get_dataset`] plus the origin of the returned data.
    pub(crate) fn get_dataset_traced(
        &self,
    ) -> Result<(Arc<PricingDataset>, DatasetOrigin), AppError> {
        if let Some(dataset) = self.memory_fresh() {
            return Ok((dataset, DatasetOrigin::Memory));
        }

        let _guard = self
            .refresh
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        // A concurrent caller may have refreshed while this one waited.
        if let Some(dataset) = self.memory_fresh() {
            return Ok((dataset, DatasetOrigin::Memory));
        }

        if self.offline {
            let raw = self.disk.load().ok_or(AppError::PricingFetch {
                reason: "offline mode and no cached pricing file".to_string(),
            })?;
            return Ok((self.remember(&raw), DatasetOrigin::Disk));
        }

        if let Some(raw) = self.disk.load_if_fresh(self.ttl) {
            return Ok((self.remember(&raw), DatasetOrigin::Disk));
        }

        match (self.fetch)() {
            Ok(raw) => {
                self.disk.rotate_backup();
                self.disk.store(&raw);
                Ok((self.remember(&raw), DatasetOrigin::Network))
            }
            Err(reason) => {
                eprintln!("Warning: pricing fetch failed ({reason}), trying backup");
                match self.disk.load_backup() {
                    Some(raw) => Ok((self.remember(&raw), DatasetOrigin::Backup)),
                    None => Err(AppError::PricingFetch { reason }),
                }
            }
        }
    }

    fn memory_fresh(&self) -> Option<Arc<PricingDataset>> {
        let guard = self
            .memory
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let entry = guard.as_ref()?;
        if entry.loaded_at.elapsed() > self.ttl {
            return None;
        }
        Some(Arc::clone(&entry.dataset))
    }

    fn remember(&self, raw: &RawDataset) -> Arc<PricingDataset> {
        let dataset = Arc::new(PricingDataset::from_raw(raw));
        debug_log(format!("pricing dataset loaded: {} models", dataset.len()));
        let mut guard = self
            .memory
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = Some(MemoryEntry {
            dataset: Arc::clone(&dataset),
            loaded_at: Instant::now(),
        });
        dataset
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const URL: &str = "https://example.com/prices.json";
    const TTL: Duration = Duration::from_secs(3600);

    fn raw_with(model: &str) -> RawDataset {
        let mut raw = HashMap::new();
        raw.insert(
            model.to_string(),
            serde_json::json!({"input_cost_per_token": 1e-06}),
        );
        raw
    }

    fn counting_fetcher(
        result: Result<RawDataset, String>,
    ) -> (FetchFn, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_in = Arc::clone(&calls);
        let fetch: FetchFn = Box::new(move || {
            calls_in.fetch_add(1, Ordering::SeqCst);
            result.clone()
        });
        (fetch, calls)
    }

    #[test]
    fn fetches_when_no_cache_and_writes_disk() {
        let dir = tempfile::tempdir().unwrap();
        let (fetch, calls) = counting_fetcher(Ok(raw_with("gpt-4o")));
        let source = PricingSource::with_fetcher(URL, dir.path(), TTL, false, fetch);

        let (dataset, origin) = source.get_dataset_traced().unwrap();
        assert_eq!(origin, DatasetOrigin::Network);
        assert!(dataset.get("gpt-4o").is_some());
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        // Written to disk: a fresh source with a failing fetcher reads it.
        let (fail, _) = counting_fetcher(Err("down".to_string()));
        let source2 = PricingSource::with_fetcher(URL, dir.path(), TTL, false, fail);
        let (_, origin2) = source2.get_dataset_traced().unwrap();
        assert_eq!(origin2, DatasetOrigin::Disk);
    }

    #[test]
    fn second_call_hits_memory_not_fetch() {
        let dir = tempfile::tempdir().unwrap();
        let (fetch, calls) = counting_fetcher(Ok(raw_with("gpt-4o")));
        let source = PricingSource::with_fetcher(URL, dir.path(), TTL, false, fetch);

        source.get_dataset().unwrap();
        let (_, origin) = source.get_dataset_traced().unwrap();
        assert_eq!(origin, DatasetOrigin::Memory);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn stale_disk_cache_triggers_fetch() {
        let dir = tempfile::tempdir().unwrap();
        {
            let (fetch, _) = counting_fetcher(Ok(raw_with("old-model")));
            let seed = PricingSource::with_fetcher(URL, dir.path(), TTL, false, fetch);
            seed.get_dataset().unwrap();
        }

        // Zero TTL: the file on disk is immediately stale.
        let (fetch, calls) = counting_fetcher(Ok(raw_with("new-model")));
        let source = PricingSource::with_fetcher(URL, dir.path(), Duration::ZERO, false, fetch);
        let (dataset, origin) = source.get_dataset_traced().unwrap();
        assert_eq!(origin, DatasetOrigin::Network);
        assert!(dataset.get("new-model").is_some());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn fetch_failure_serves_backup() {
        let dir = tempfile::tempdir().unwrap();
        // First refresh seeds the live file, second rotates it to .bkp.
        {
            let (fetch, _) = counting_fetcher(Ok(raw_with("backup-model")));
            let seed =
                PricingSource::with_fetcher(URL, dir.path(), Duration::ZERO, false, fetch);
            seed.get_dataset().unwrap();
            let (fetch2, _) = counting_fetcher(Ok(raw_with("live-model")));
            let seed2 =
                PricingSource::with_fetcher(URL, dir.path(), Duration::ZERO, false, fetch2);
            seed2.get_dataset().unwrap();
        }

        // Live file is stale (zero TTL) and the refresh fails.
        let (fail, _) = counting_fetcher(Err("503 service unavailable".to_string()));
        let source = PricingSource::with_fetcher(URL, dir.path(), Duration::ZERO, false, fail);
        let (dataset, origin) = source.get_dataset_traced().unwrap();
        assert_eq!(origin, DatasetOrigin::Backup);
        assert!(dataset.get("backup-model").is_some());
    }

    #[test]
    fn fetch_failure_without_backup_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let (fail, _) = counting_fetcher(Err("dns failure".to_string()));
        let source = PricingSource::with_fetcher(URL, dir.path(), TTL, false, fail);
        let err = source.get_dataset().unwrap_err();
        assert!(matches!(err, AppError::PricingFetch { .. }));
        assert!(err.to_string().contains("dns failure"));
    }

    #[test]
    fn offline_serves_stale_disk_without_fetching() {
        let dir = tempfile::tempdir().unwrap();
        {
            let (fetch, _) = counting_fetcher(Ok(raw_with("gpt-4o")));
            let seed = PricingSource::with_fetcher(URL, dir.path(), TTL, false, fetch);
            seed.get_dataset().unwrap();
        }

        let (fetch, calls) = counting_fetcher(Ok(raw_with("unused")));
        let source =
            PricingSource::with_fetcher(URL, dir.path(), Duration::ZERO, true, fetch);
        let (dataset, origin) = source.get_dataset_traced().unwrap();
        assert_eq!(origin, DatasetOrigin::Disk);
        assert!(dataset.get("gpt-4o").is_some());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn offline_without_cache_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let (fetch, _) = counting_fetcher(Ok(raw_with("unused")));
        let source = PricingSource::with_fetcher(URL, dir.path(), TTL, true, fetch);
        assert!(matches!(
            source.get_dataset(),
            Err(AppError::PricingFetch { .. })
        ));
    }
}
