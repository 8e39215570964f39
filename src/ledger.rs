use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Datelike, Local};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// One completed request, as persisted. Immutable once written; the ledger
/// only ever appends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct UsageRecord {
    pub(crate) user: String,
    pub(crate) model: String,
    pub(crate) timestamp: String,
    pub(crate) input_tokens: u64,
    pub(crate) output_tokens: u64,
    #[serde(with = "rust_decimal::serde::str")]
    pub(crate) total_cost: Decimal,
}

impl UsageRecord {
    pub(crate) fn new(
        user: &str,
        model: &str,
        input_tokens: u64,
        output_tokens: u64,
        total_cost: Decimal,
    ) -> Self {
        Self {
            user: user.to_string(),
            model: model.to_string(),
            timestamp: Local::now().to_rfc3339(),
            input_tokens,
            output_tokens,
            total_cost,
        }
    }

    fn year(&self) -> i32 {
        DateTime::parse_from_rfc3339(&self.timestamp)
            .map(|dt| dt.year())
            .unwrap_or_else(|_| Local::now().year())
    }
}

/// Append-only usage store: one `costs-<year>.json` file per year holding a
/// JSON list in insertion order.
///
/// Appends are full read-modify-write cycles finished by a rename, which is
/// atomic enough for a single writer. Concurrent writers are not isolated;
/// the last write wins. Usage volume is assumed low relative to request
/// latency, so the lost-update window is accepted rather than paying for
/// cross-process locking.
#[derive(Debug)]
pub(crate) struct UsageLedger {
    data_dir: PathBuf,
}

impl UsageLedger {
    pub(crate) fn new(data_dir: &Path) -> Self {
        Self {
            data_dir: data_dir.to_path_buf(),
        }
    }

    fn path_for_year(&self, year: i32) -> PathBuf {
        self.data_dir.join(format!("costs-{year:04}.json"))
    }

    pub(crate) fn append(&self, record: &UsageRecord) -> Result<(), AppError> {
        fs::create_dir_all(&self.data_dir)
            .map_err(|e| AppError::ledger(&self.data_dir, e))?;

        let path = self.path_for_year(record.year());
        let mut records = read_records(&path)?;
        records.push(record.clone());
        write_records(&path, &records)
    }

    pub(crate) fn load_year(&self, year: i32) -> Result<Vec<UsageRecord>, AppError> {
        read_records(&self.path_for_year(year))
    }
}

fn read_records(path: &Path) -> Result<Vec<UsageRecord>, AppError> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(AppError::ledger(path, e)),
    };

    let value: serde_json::Value =
        serde_json::from_str(&content).map_err(|e| AppError::LedgerFormat {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

    // A non-list document (e.g. the legacy empty-object initialization) is
    // discarded and replaced by an empty list.
    match value {
        serde_json::Value::Array(_) => {
            serde_json::from_value(value).map_err(|e| AppError::LedgerFormat {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })
        }
        _ => Ok(Vec::new()),
    }
}

fn write_records(path: &Path, records: &[UsageRecord]) -> Result<(), AppError> {
    let tmp = path.with_extension("json.tmp");
    let body = serde_json::to_vec_pretty(records).map_err(|e| AppError::LedgerFormat {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    fs::write(&tmp, body).map_err(|e| AppError::ledger(&tmp, e))?;
    fs::rename(&tmp, path).map_err(|e| AppError::ledger(path, e))
}
