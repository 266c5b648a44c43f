//! Crate-wide error taxonomy.
//!
//! Fatal variants (`ConfigMissing`, `ConfigInvalid`, `UnknownEvent`,
//! `PopulationRowInvalid`) abort the run; recoverable variants
//! (`DataTableMissing`, `DataTableRowMissing`, `InvalidWeights`,
//! `InvalidUtility`) are logged and degrade to a no-op or default.
//! [`HepceError`] is the single result type every fallible operation in
//! this crate returns.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum HepceError {
    #[error("missing required configuration key: {0}")]
    ConfigMissing(String),

    #[error("invalid configuration value for key {key}: {reason}")]
    ConfigInvalid { key: String, reason: String },

    #[error("data table missing: {0}")]
    DataTableMissing(String),

    #[error("data table row missing for key: {0}")]
    DataTableRowMissing(String),

    #[error("sampler weights sum to {sum}, which exceeds 1 + epsilon")]
    InvalidWeights { sum: f64 },

    #[error("utility value {value} for category {category} is outside [0, 1]")]
    InvalidUtility { value: f64, category: String },

    #[error("unknown event: {0}")]
    UnknownEvent(String),

    #[error("malformed population row: {0}")]
    PopulationRowInvalid(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, HepceError>;
