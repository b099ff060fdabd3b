//! Error types for data sources

use std::path::PathBuf;

use thiserror::Error;

use super::AccessMode;
use crate::catalog::CatalogError;
use crate::connection::ConnectionError;
use crate::dictionary::DictionaryError;
use crate::location::LocationError;
use crate::models::FrameError;

/// Errors raised by data sources
#[derive(Error, Debug)]
pub enum SourceError {
    #[error(transparent)]
    Location(#[from] LocationError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Dictionary(#[from] DictionaryError),

    #[error(transparent)]
    Connection(#[from] ConnectionError),

    /// Operation not allowed in the source's access mode
    #[error("Cannot {operation} in {mode} mode")]
    AccessMode { mode: AccessMode, operation: String },

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Append and create modes need a single target
    #[error("Only a single target is supported in {mode} mode, got {targets}")]
    MultipleTargets { mode: AccessMode, targets: usize },

    /// The location does not exist
    #[error("Data location does not exist: {0}")]
    NotFound(String),

    /// Observed columns disagree with the catalog
    #[error(
        "Variable names in {address} are not consistent with metadata (missing: [{}], unexpected: [{}])",
        .missing.join(", "),
        .unexpected.join(", ")
    )]
    SchemaDrift {
        address: String,
        missing: Vec<String>,
        unexpected: Vec<String>,
    },

    /// Rows read disagree with the declared size
    #[error("Size mismatch: read {actual} rows but expected {expected}")]
    RowCountMismatch { expected: u64, actual: u64 },

    /// Histogram totals disagree with the declared size
    #[error("Inconsistent counts for {variable}: {actual} rows counted but expected {expected}")]
    Consistency {
        variable: String,
        expected: u64,
        actual: u64,
    },

    /// Rows cannot be partitioned across the target's locations
    #[error("Cannot partition rows: {0}")]
    Partition(String),

    /// Variables with no native column type
    #[error("Cannot map variables to column types: {}", .0.join(", "))]
    UnmappedVariables(Vec<String>),

    /// A freshly created target does not match its metadata
    #[error("Created target does not match metadata for variables: {}", .variables.join(", "))]
    RoundTrip { variables: Vec<String> },

    /// Row batch is malformed
    #[error("Invalid data: {0}")]
    Frame(#[from] FrameError),

    /// Rows read from a location do not form a valid batch
    #[error("Invalid data in {address}: {source}")]
    InvalidRows {
        address: String,
        #[source]
        source: FrameError,
    },

    /// IO error on a file
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Delimited file error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl SourceError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        SourceError::Io {
            path: path.into(),
            source,
        }
    }

    /// Get a user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            SourceError::Location(e) => e.user_message(),
            SourceError::Catalog(e) => e.user_message(),
            SourceError::Dictionary(e) => e.user_message(),
            SourceError::Connection(e) => e.user_message(),
            SourceError::SchemaDrift { .. } | SourceError::RowCountMismatch { .. } => format!(
                "{self}\n\nHint: The data changed since its metadata was read. Recreate the data source."
            ),
            SourceError::Consistency { .. } => format!(
                "{self}\n\nHint: The underlying store was modified concurrently. Retry once writers have finished."
            ),
            SourceError::MultipleTargets { .. } => format!(
                "{self}\n\nHint: Use a single table, or enable partitioned_target to write across several tables."
            ),
            SourceError::InvalidConfig(_) => {
                format!("{self}\n\nHint: Check your data source configuration.")
            }
            _ => self.to_string(),
        }
    }
}
