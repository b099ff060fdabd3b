//! Database backend

use std::sync::Arc;

use tracing::{debug, info};

use super::error::SourceError;
use super::rowcount::count_table_rows;
use crate::catalog::MetadataCatalog;
use crate::connection::{ConnectionError, ScopedSession, SessionProvider, SqlDialect};
use crate::dictionary::DatabaseDictionary;
use crate::location::DatabaseLocation;
use crate::models::DataFrame;

/// Tables reached through a session provider and a SQL dialect
#[derive(Debug, Clone)]
pub(crate) struct DatabaseBackend {
    pub(crate) provider: Arc<dyn SessionProvider>,
    pub(crate) dialect: Arc<dyn SqlDialect>,
}

impl DatabaseBackend {
    pub(crate) fn new(provider: Arc<dyn SessionProvider>, dialect: Arc<dyn SqlDialect>) -> Self {
        Self { provider, dialect }
    }

    /// Dictionary over the same database
    pub(crate) fn dictionary(&self) -> DatabaseDictionary {
        DatabaseDictionary::new(self.provider.clone(), self.dialect.clone())
    }

    pub(crate) fn session(&self) -> Result<ScopedSession, ConnectionError> {
        ScopedSession::open(self.provider.as_ref())
    }

    /// Rows across all addresses, each with its WHERE predicate applied
    pub(crate) fn count_rows(&self, location: &DatabaseLocation) -> Result<u64, SourceError> {
        let mut session = self.session()?;
        let mut total = 0u64;
        for (table, predicate) in location.table_names().iter().zip(location.where_clauses()) {
            total += count_table_rows(&mut session, self.dialect.as_ref(), table, &predicate)?;
        }
        session.close()?;
        Ok(total)
    }

    /// Every referenced table exists
    pub(crate) fn exists(&self, location: &DatabaseLocation) -> Result<bool, SourceError> {
        let dictionary = self.dictionary();
        for table in unique_tables(location) {
            let (exists, owner) = dictionary.table_exists(&table)?;
            debug!(table = %table, exists, owner = owner.as_deref().unwrap_or(""), "Checked table");
            if !exists {
                return Ok(false);
            }
        }
        Ok(true)
    }

    pub(crate) fn drop_tables(&self, tables: &[String]) -> Result<(), SourceError> {
        let mut session = self.session()?;
        for table in tables {
            info!(table = %table, "Dropping table");
            session.execute(&self.dialect.drop_table_sql(table))?;
        }
        session.close()?;
        Ok(())
    }

    /// Issue one `CREATE TABLE` per table from the catalog's native types
    pub(crate) fn create_tables(
        &self,
        tables: &[String],
        catalog: &MetadataCatalog,
    ) -> Result<(), SourceError> {
        let mut columns = Vec::with_capacity(catalog.size());
        let mut unmapped = Vec::new();
        for variable in catalog.variables() {
            match self.dialect.native_type(variable) {
                Some(native) => columns.push((variable.name.clone(), native)),
                None => unmapped.push(variable.name.clone()),
            }
        }
        if !unmapped.is_empty() {
            return Err(SourceError::UnmappedVariables(unmapped));
        }

        let mut session = self.session()?;
        for table in tables {
            let statement = self.dialect.create_table_sql(table, &columns);
            session.execute(&statement)?;
            info!(table = %table, columns = columns.len(), "Created table");
        }
        session.close()?;
        Ok(())
    }

    /// Append one partition to a table in its own session
    pub(crate) fn write_partition(&self, table: &str, frame: &DataFrame) -> Result<usize, SourceError> {
        let mut session = self.session()?;
        let rows = session.append(table, frame)?;
        session.close()?;
        debug!(table, rows, "Wrote partition");
        Ok(rows)
    }
}

/// Distinct table names of a location, in first-seen order
pub(crate) fn unique_tables(location: &DatabaseLocation) -> Vec<String> {
    let mut tables: Vec<String> = Vec::new();
    for table in location.table_names() {
        if !tables.contains(&table) {
            tables.push(table);
        }
    }
    tables
}
