//! Error types for dictionary adapters

use std::path::PathBuf;

use thiserror::Error;

use crate::catalog::CatalogError;
use crate::connection::ConnectionError;
use crate::location::LocationError;

/// Errors raised while reading a dictionary into a catalog
#[derive(Error, Debug)]
pub enum DictionaryError {
    /// Dictionary file does not exist
    #[error("Dictionary file does not exist: {0}")]
    FileNotFound(PathBuf),

    /// The workbook or sheet could not be read
    #[error("Cannot read dictionary {path}: {reason}")]
    Workbook { path: PathBuf, reason: String },

    /// A column letter is not a valid spreadsheet column
    #[error("Invalid column letter: {0}")]
    InvalidColumn(String),

    /// A dictionary row is malformed
    #[error("Invalid dictionary entry at row {row}: {reason}")]
    InvalidEntry { row: usize, reason: String },

    /// A datetime-like format token has no canonical translation
    #[error("Unsupported datetime format for variable {variable}: {format}")]
    UnsupportedDatetimeFormat { variable: String, format: String },

    /// Native column types with no variable type
    #[error("Unsupported native types in {table}: {}", .types.join(", "))]
    UnsupportedNativeType { table: String, types: Vec<String> },

    /// The system catalog has no columns for a table
    #[error("No metadata for table {0}")]
    TableNotFound(String),

    /// Tables of one location disagree on their schema
    #[error("Tables {first} and {other} differ on variables: {}", .variables.join(", "))]
    InconsistentTables {
        first: String,
        other: String,
        variables: Vec<String>,
    },

    /// The location cannot be described by this dictionary
    #[error("Unsupported location for this dictionary: {0}")]
    UnsupportedLocation(String),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Connection(#[from] ConnectionError),

    #[error(transparent)]
    Location(#[from] LocationError),
}

impl DictionaryError {
    /// Get a user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            DictionaryError::FileNotFound(path) => format!(
                "Dictionary file does not exist: {}\n\nHint: Check that the path is correct.",
                path.display()
            ),
            DictionaryError::UnsupportedDatetimeFormat { variable, format } => format!(
                "Unsupported datetime format for variable {variable}: {format}\n\n\
                Hint: Use one of the supported tokens such as DDMMYY10., YYMMDD10., DATETIME20. or TIME8."
            ),
            DictionaryError::UnsupportedNativeType { table, types } => format!(
                "Unsupported column types in {table}: {}\n\n\
                Hint: Cast these columns to VARCHAR, INTEGER, FLOAT, NUMERIC, BOOLEAN, DATE, TIME or TIMESTAMP.",
                types.join(", ")
            ),
            DictionaryError::Catalog(e) => e.user_message(),
            DictionaryError::Connection(e) => e.user_message(),
            DictionaryError::Location(e) => e.user_message(),
            _ => self.to_string(),
        }
    }
}
