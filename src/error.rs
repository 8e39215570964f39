use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub(crate) enum AppError {
    #[error("Failed to fetch pricing data and no backup is available: {reason}")]
    PricingFetch { reason: String },

    #[error("Pricing dataset is not a JSON object")]
    MalformedDataset,

    #[error("Ledger I/O error at {path}: {source}")]
    Ledger {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Ledger file {path} is not valid JSON: {reason}")]
    LedgerFormat { path: PathBuf, reason: String },

    #[error("Invalid compensation factor \"{input}\" (expected a non-negative decimal)")]
    InvalidCompensation { input: String },
}

impl AppError {
    pub(crate) fn ledger(path: &std::path::Path, source: std::io::Error) -> Self {
        AppError::Ledger {
            path: path.to_path_buf(),
            source,
        }
    }
}
