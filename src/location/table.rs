//! Data locations addressing database tables

use serde::{Deserialize, Serialize};

use super::error::LocationError;
use super::query::DatabaseQueryLocation;
use super::{check_table_name_syntax, normalize_input};

/// One or more database tables, each named `SCHEMA.TABLE`
///
/// Names are trimmed and upper-cased at construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawLocation")]
pub struct DatabaseTableLocation {
    addresses: Vec<String>,
}

#[derive(Deserialize)]
struct RawLocation {
    addresses: Vec<String>,
}

impl TryFrom<RawLocation> for DatabaseTableLocation {
    type Error = LocationError;

    fn try_from(raw: RawLocation) -> Result<Self, Self::Error> {
        DatabaseTableLocation::new(raw.addresses)
    }
}

impl DatabaseTableLocation {
    /// Construct a table location, validating every table name
    pub fn new<I, S>(tables: I) -> Result<Self, LocationError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let addresses: Vec<String> = normalize_input(tables)?
            .into_iter()
            .map(|t| t.to_uppercase())
            .collect();
        if addresses.is_empty() {
            return Err(LocationError::Empty);
        }
        for table in &addresses {
            check_table_name_syntax(table)?;
        }
        Ok(Self { addresses })
    }

    /// Table names, one per address
    pub fn addresses(&self) -> &[String] {
        &self.addresses
    }

    /// Table names, one per address
    pub fn table_names(&self) -> Vec<String> {
        self.addresses.clone()
    }

    /// Turn the tables into `SELECT * FROM <table> WHERE <predicate>` queries
    ///
    /// A single table is broadcast across several predicates; otherwise the
    /// table and predicate counts must match.
    pub fn append_where_clause<S: AsRef<str>>(
        &self,
        predicates: &[S],
    ) -> Result<DatabaseQueryLocation, LocationError> {
        let tables: Vec<&String> = if self.addresses.len() == 1 && predicates.len() > 1 {
            std::iter::repeat_n(&self.addresses[0], predicates.len()).collect()
        } else if self.addresses.len() == predicates.len() {
            self.addresses.iter().collect()
        } else {
            return Err(LocationError::PredicateCountMismatch {
                locations: self.addresses.len(),
                predicates: predicates.len(),
            });
        };

        let statements: Vec<String> = tables
            .into_iter()
            .zip(predicates)
            .map(|(table, predicate)| {
                format!(
                    "SELECT * FROM {} WHERE {}",
                    table,
                    predicate.as_ref().trim().to_uppercase()
                )
            })
            .collect();

        DatabaseQueryLocation::new(statements)
    }
}
