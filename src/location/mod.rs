//! Data locations: where a logical dataset is stored
//!
//! A location is an ordered, immutable, non-empty list of addresses:
//!
//! - **Filesystem** - absolute file paths, expanded from glob patterns
//! - **Database table** - `SCHEMA.TABLE` identifiers
//! - **Database query** - `SELECT ... FROM SCHEMA.TABLE [WHERE ...]` statements
//!
//! Derived locations (for example after appending a WHERE predicate) are new
//! values; nothing here is mutated after construction.
//!
//! ## Example
//!
//! ```rust
//! use data_source_sdk::location::DatabaseTableLocation;
//!
//! let tables = DatabaseTableLocation::new(["s.t1", "s.t2"]).unwrap();
//! let queries = tables.append_where_clause(&["x=1", "y=2"]).unwrap();
//! assert_eq!(queries.addresses()[0], "SELECT * FROM S.T1 WHERE X=1");
//! ```

mod error;
mod filesystem;
mod query;
mod table;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use error::LocationError;
pub use filesystem::FilesystemLocation;
pub use query::DatabaseQueryLocation;
pub use table::DatabaseTableLocation;

/// Kind of addressing a location uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationKind {
    /// Files on a local filesystem
    Filesystem,
    /// Database tables
    DatabaseTable,
    /// Database queries
    DatabaseQuery,
}

impl fmt::Display for LocationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LocationKind::Filesystem => write!(f, "filesystem"),
            LocationKind::DatabaseTable => write!(f, "database table"),
            LocationKind::DatabaseQuery => write!(f, "database query"),
        }
    }
}

/// A location inside a database: tables or queries
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "addressing", rename_all = "snake_case")]
pub enum DatabaseLocation {
    /// Whole tables
    Table(DatabaseTableLocation),
    /// Queries over single tables
    Query(DatabaseQueryLocation),
}

impl DatabaseLocation {
    /// Addresses in order
    pub fn addresses(&self) -> &[String] {
        match self {
            DatabaseLocation::Table(t) => t.addresses(),
            DatabaseLocation::Query(q) => q.addresses(),
        }
    }

    /// Table name for each address
    pub fn table_names(&self) -> Vec<String> {
        match self {
            DatabaseLocation::Table(t) => t.table_names(),
            DatabaseLocation::Query(q) => q.table_names(),
        }
    }

    /// WHERE predicate for each address, empty when absent
    pub fn where_clauses(&self) -> Vec<String> {
        match self {
            DatabaseLocation::Table(t) => vec![String::new(); t.addresses().len()],
            DatabaseLocation::Query(q) => q.where_clauses(),
        }
    }

    /// Variables a query projects; empty for tables and `SELECT *`
    pub fn variable_names(&self) -> Vec<String> {
        match self {
            DatabaseLocation::Table(_) => Vec::new(),
            DatabaseLocation::Query(q) => q.variable_names(),
        }
    }

    /// Derive a query location with the predicates appended
    pub fn append_where_clause<S: AsRef<str>>(
        &self,
        predicates: &[S],
    ) -> Result<DatabaseLocation, LocationError> {
        let query = match self {
            DatabaseLocation::Table(t) => t.append_where_clause(predicates)?,
            DatabaseLocation::Query(q) => q.append_where_clause(predicates)?,
        };
        Ok(DatabaseLocation::Query(query))
    }
}

impl From<DatabaseTableLocation> for DatabaseLocation {
    fn from(location: DatabaseTableLocation) -> Self {
        DatabaseLocation::Table(location)
    }
}

impl From<DatabaseQueryLocation> for DatabaseLocation {
    fn from(location: DatabaseQueryLocation) -> Self {
        DatabaseLocation::Query(location)
    }
}

/// Where a dataset lives
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DataLocation {
    /// A collection of files
    Filesystem(FilesystemLocation),
    /// Tables or queries in a database
    Database(DatabaseLocation),
}

impl DataLocation {
    /// Addressing kind
    pub fn kind(&self) -> LocationKind {
        match self {
            DataLocation::Filesystem(_) => LocationKind::Filesystem,
            DataLocation::Database(DatabaseLocation::Table(_)) => LocationKind::DatabaseTable,
            DataLocation::Database(DatabaseLocation::Query(_)) => LocationKind::DatabaseQuery,
        }
    }

    /// Addresses in order
    pub fn addresses(&self) -> &[String] {
        match self {
            DataLocation::Filesystem(f) => f.addresses(),
            DataLocation::Database(d) => d.addresses(),
        }
    }

    /// Number of addresses
    pub fn size(&self) -> usize {
        self.addresses().len()
    }

    /// Check if the location has no address
    pub fn is_empty(&self) -> bool {
        self.addresses().is_empty()
    }

    /// Address at position `index`
    pub fn get(&self, index: usize) -> Option<&str> {
        self.addresses().get(index).map(String::as_str)
    }

    /// Iterate over addresses in order
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.addresses().iter().map(String::as_str)
    }

    /// Canonical string form of each address
    pub fn to_strings(&self) -> Vec<String> {
        self.addresses().to_vec()
    }

    /// WHERE predicate for each address, empty when absent
    pub fn where_clauses(&self) -> Vec<String> {
        match self {
            DataLocation::Filesystem(f) => vec![String::new(); f.addresses().len()],
            DataLocation::Database(d) => d.where_clauses(),
        }
    }

    /// Borrow as a database location
    pub fn as_database(&self) -> Option<&DatabaseLocation> {
        match self {
            DataLocation::Database(d) => Some(d),
            DataLocation::Filesystem(_) => None,
        }
    }

    /// Borrow as a filesystem location
    pub fn as_filesystem(&self) -> Option<&FilesystemLocation> {
        match self {
            DataLocation::Filesystem(f) => Some(f),
            DataLocation::Database(_) => None,
        }
    }
}

impl fmt::Display for DataLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.addresses().join(", "))
    }
}

impl From<FilesystemLocation> for DataLocation {
    fn from(location: FilesystemLocation) -> Self {
        DataLocation::Filesystem(location)
    }
}

impl From<DatabaseTableLocation> for DataLocation {
    fn from(location: DatabaseTableLocation) -> Self {
        DataLocation::Database(DatabaseLocation::Table(location))
    }
}

impl From<DatabaseQueryLocation> for DataLocation {
    fn from(location: DatabaseQueryLocation) -> Self {
        DataLocation::Database(DatabaseLocation::Query(location))
    }
}

impl From<DatabaseLocation> for DataLocation {
    fn from(location: DatabaseLocation) -> Self {
        DataLocation::Database(location)
    }
}

/// Trim raw input and reject blank entries
pub(crate) fn normalize_input<I, S>(input: I) -> Result<Vec<String>, LocationError>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    input
        .into_iter()
        .enumerate()
        .map(|(index, s)| {
            let s: String = s.into();
            let trimmed = s.trim();
            if trimmed.is_empty() {
                Err(LocationError::BlankAddress(index))
            } else {
                Ok(trimmed.to_string())
            }
        })
        .collect()
}

/// Table names must be `SCHEMA.TABLE` with both parts non-empty
pub(crate) fn check_table_name_syntax(name: &str) -> Result<(), LocationError> {
    match name.split('.').collect::<Vec<_>>().as_slice() {
        [schema, table] if !schema.is_empty() && !table.is_empty() => Ok(()),
        _ => Err(LocationError::InvalidTableName(name.to_string())),
    }
}

/// Split `SCHEMA.TABLE` into its parts
pub fn split_table_name(name: &str) -> Result<(String, String), LocationError> {
    check_table_name_syntax(name)?;
    let (schema, table) = name
        .split_once('.')
        .ok_or_else(|| LocationError::InvalidTableName(name.to_string()))?;
    Ok((schema.to_string(), table.to_string()))
}
