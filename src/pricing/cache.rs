use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use sha2::{Digest, Sha256};

use crate::utils::debug_log;

use super::types::RawDataset;

/// Disk tier of the pricing cache: one live file and one `.bkp` sibling per
/// dataset URL, named by the SHA-256 of the URL so any source stays
/// filesystem-safe.
#[derive(Debug)]
pub(super) struct DiskCache {
    live: PathBuf,
    backup: PathBuf,
}

impl DiskCache {
    pub(super) fn new(cache_dir: &Path, url: &str) -> Self {
        let digest = Sha256::digest(url.as_bytes());
        let live = cache_dir.join(format!("{:x}.json", digest));
        let backup = live.with_extension("json.bkp");
        Self { live, backup }
    }

    /// Read the live file only if its mtime age is below the TTL.
    pub(super) fn load_if_fresh(&self, ttl: Duration) -> Option<RawDataset> {
        let meta = std::fs::metadata(&self.live).ok()?;
        let modified = meta.modified().ok()?;
        let age = SystemTime::now().duration_since(modified).ok()?;
        if age > ttl {
            return None;
        }
        debug_log(format!(
            "reading pricing cache from disk ({:.1}h old)",
            age.as_secs_f64() / 3600.0
        ));
        self.load()
    }

    /// Read the live file regardless of age (offline mode).
    pub(super) fn load(&self) -> Option<RawDataset> {
        let file = File::open(&self.live).ok()?;
        serde_json::from_reader(file).ok()
    }

    pub(super) fn load_backup(&self) -> Option<RawDataset> {
        let file = File::open(&self.backup).ok()?;
        serde_json::from_reader(file).ok()
    }

    /// Rename the live file to its `.bkp` sibling before a refresh write.
    /// Best effort: a failure is logged and the refresh continues.
    pub(super) fn rotate_backup(&self) {
        if !self.live.exists() {
            return;
        }
        if let Err(e) = std::fs::rename(&self.live, &self.backup) {
            eprintln!(
                "Warning: failed to back up pricing cache {}: {e}",
                self.live.display()
            );
        }
    }

    pub(super) fn store(&self, raw: &RawDataset) {
        if let Some(parent) = self.live.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        match File::create(&self.live) {
            Ok(mut file) => {
                if let Err(e) = serde_json::to_writer(&mut file, raw) {
                    eprintln!("Warning: failed to write pricing cache: {e}");
                }
            }
            Err(e) => eprintln!(
                "Warning: failed to create pricing cache {}: {e}",
                self.live.display()
            ),
        }
    }

    #[cfg(test)]
    pub(super) fn live_path(&self) -> &Path {
        &self.live
    }

    #[cfg(test)]
    pub(super) fn backup_path(&self) -> &Path {
        &self.backup
    }
}
