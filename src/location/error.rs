//! Error types for data locations

use thiserror::Error;

/// Errors raised while constructing or deriving a data location
///
/// Every variant is raised at construction time: a location that exists has
/// passed all of these checks.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LocationError {
    /// No addresses supplied
    #[error("Empty data location")]
    Empty,

    /// An address is blank
    #[error("Blank address at position {0}")]
    BlankAddress(usize),

    /// Table name does not follow `schema.table`
    #[error("Invalid table name: {0}")]
    InvalidTableName(String),

    /// Query is not a `SELECT ... FROM ...` statement
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// Query uses a keyword the location model does not support
    #[error("Unsupported query (keyword {keyword}): {query}")]
    UnsupportedQuery { query: String, keyword: String },

    /// Queries held by one location project different variables
    #[error("Inconsistent variable names in queries: {first:?} vs {other:?}")]
    InconsistentProjection { first: Vec<String>, other: Vec<String> },

    /// WHERE predicates cannot be paired with the location's addresses
    #[error("Unsupported case: {locations} data location(s) and {predicates} WHERE clause(s)")]
    PredicateCountMismatch { locations: usize, predicates: usize },

    /// A glob pattern could not be parsed
    #[error("Invalid pattern: {0}")]
    InvalidPattern(String),

    /// A path could not be made absolute
    #[error("Cannot resolve path {path}: {reason}")]
    UnresolvablePath { path: String, reason: String },
}

impl LocationError {
    /// Get a user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            LocationError::InvalidTableName(name) => format!(
                "Invalid table name: {name}\n\nHint: Table names must be formatted as SCHEMA.TABLE."
            ),
            LocationError::UnsupportedQuery { query, keyword } => format!(
                "Unsupported query: {query}\n\n\
                Hint: Queries may not contain {keyword}; use a plain SELECT ... FROM ... WHERE ... statement."
            ),
            LocationError::PredicateCountMismatch {
                locations,
                predicates,
            } => format!(
                "Cannot pair {predicates} WHERE clause(s) with {locations} location(s).\n\n\
                Hint: Supply one predicate per location, or a single location with several predicates."
            ),
            _ => self.to_string(),
        }
    }
}
