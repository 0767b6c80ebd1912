//! Metrics error types
//!
//! Defines all errors that can occur while recording or reading metrics.

use crate::store::StoreError;
use thiserror::Error;

/// Errors that can occur in the metrics layer
#[derive(Error, Debug)]
pub enum MetricsError {
    /// The backing store failed; passed through unchanged
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// A category's stored slug list is not valid JSON
    #[error("Corrupt slug list for category {category:?}: {source}")]
    Decode {
        category: String,
        source: serde_json::Error,
    },

    /// Encoding a slug list failed
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Granularity name not recognised
    #[error("Invalid granularity: {0:?} (expected daily, weekly, monthly or yearly)")]
    InvalidGranularity(String),

    /// A counter key holds something other than an integer
    #[error("Counter {key} holds a non-integer value: {value:?}")]
    InvalidCount { key: String, value: String },

    /// Slugs must be non-empty
    #[error("Slug must not be empty")]
    EmptySlug,
}

/// Result type alias for metrics operations
pub type MetricsResult<T> = Result<T, MetricsError>;
