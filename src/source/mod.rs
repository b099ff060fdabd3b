//! Data sources: chunked reading and partitioned writing
//!
//! A [`DataSource`] binds one location, its metadata catalog and an access
//! mode. Rows flow through it in chunks; every chunk is checked against the
//! catalog and coerced to the declared types before a caller sees it.
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use data_source_sdk::catalog::{MetadataCatalog, VariableMetadata, VariableType};
//! use data_source_sdk::location::FilesystemLocation;
//! use data_source_sdk::source::{AccessMode, DataSource, FileOptions};
//!
//! let catalog = MetadataCatalog::new(
//!     vec![VariableMetadata::new("ID", VariableType::Integer)],
//!     false,
//! )
//! .unwrap();
//! let location = FilesystemLocation::new(["data/*.csv"]).unwrap();
//! let mut source = DataSource::file(location, FileOptions::default())
//!     .dictionary(Arc::new(catalog))
//!     .open(AccessMode::ReadOnly)
//!     .unwrap();
//! let result = source.read_all().unwrap();
//! println!("{} rows in {:?}", result.frame.num_rows(), result.elapsed);
//! ```

mod config;
mod data_source;
mod database;
mod error;
mod file;
mod partition;
mod preprocess;
mod reader;
pub mod rowcount;
mod uniques;

pub use config::{FileOptions, SourceConfig, SourceConfigBuilder};
pub use data_source::{DataSource, DataSourceBuilder};
pub use error::SourceError;
pub use partition::{Partitioning, partition_rows};
pub use preprocess::{coerce_value, preprocess_chunk, technical_preprocessing};
pub use uniques::UniqueValues;

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::models::DataFrame;

/// What a data source may do with its location
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AccessMode {
    /// Read existing data; writes are rejected
    ReadOnly,
    /// Add rows to an existing target
    Append,
    /// Drop and recreate the target from caller metadata
    Create,
}

impl AccessMode {
    /// Check if writes are accepted
    pub fn is_writable(&self) -> bool {
        !matches!(self, AccessMode::ReadOnly)
    }
}

impl fmt::Display for AccessMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccessMode::ReadOnly => write!(f, "read-only"),
            AccessMode::Append => write!(f, "append"),
            AccessMode::Create => write!(f, "create"),
        }
    }
}

impl FromStr for AccessMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "read-only" | "readonly" | "read_only" => Ok(AccessMode::ReadOnly),
            "append" => Ok(AccessMode::Append),
            "create" => Ok(AccessMode::Create),
            _ => Err(format!(
                "Invalid access mode: {}. Expected: read-only, append, create",
                s
            )),
        }
    }
}

/// Storage behind a data source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Delimited files
    File,
    /// Database tables or queries
    Database,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceKind::File => write!(f, "file"),
            SourceKind::Database => write!(f, "database"),
        }
    }
}

/// Declared size of a data source
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceShape {
    /// Data rows; `None` when counting was skipped
    pub rows: Option<u64>,
    /// Declared variables
    pub columns: usize,
}

/// Rows of a full read and the time it took
#[derive(Debug, Clone)]
pub struct ReadResult {
    pub frame: DataFrame,
    pub elapsed: Duration,
}

/// Outcome of a chunked read
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChunkSummary {
    /// Rows handed to the callback
    pub rows: u64,
    /// Chunks handed to the callback
    pub chunks: usize,
    /// Every location was read to the end
    pub drained: bool,
}

/// Rows written per location, in location order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteSummary {
    pub rows_per_location: Vec<usize>,
}

impl WriteSummary {
    /// Rows written across all locations
    pub fn total(&self) -> usize {
        self.rows_per_location.iter().sum()
    }
}

/// Histograms keyed by variable name
pub type Uniques = BTreeMap<String, UniqueValues>;
