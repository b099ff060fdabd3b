//! Dictionaries backed by a database's system catalog

use std::sync::Arc;

use tracing::{debug, info};

use super::Dictionary;
use super::error::DictionaryError;
use crate::catalog::formats::{
    DATABASE_DATE_FORMAT, DATABASE_TIME_FORMAT, DATABASE_TIMESTAMP_FORMAT,
};
use crate::catalog::{MetadataCatalog, TypeFlags, VariableMetadata, VariableType};
use crate::connection::{
    CatalogInspector, ScopedSession, SessionProvider, SqlCatalogInspector, SqlDialect,
};
use crate::location::{DataLocation, split_table_name};

/// Reads table metadata from the remote system catalog
///
/// Catalogs are case-insensitive: the database folds unquoted identifiers.
#[derive(Debug, Clone)]
pub struct DatabaseDictionary {
    provider: Arc<dyn SessionProvider>,
    dialect: Arc<dyn SqlDialect>,
}

impl DatabaseDictionary {
    pub fn new(provider: Arc<dyn SessionProvider>, dialect: Arc<dyn SqlDialect>) -> Self {
        Self { provider, dialect }
    }

    /// Schemas visible to the session user
    pub fn list_schemas(&self) -> Result<Vec<String>, DictionaryError> {
        let mut session = ScopedSession::open(self.provider.as_ref())?;
        let schemas = SqlCatalogInspector::new(&mut session, self.dialect.as_ref()).list_schemas()?;
        session.close()?;
        Ok(schemas)
    }

    /// Tables of one schema
    pub fn list_tables(&self, schema: &str) -> Result<Vec<String>, DictionaryError> {
        let mut session = ScopedSession::open(self.provider.as_ref())?;
        let tables =
            SqlCatalogInspector::new(&mut session, self.dialect.as_ref()).list_tables(schema)?;
        session.close()?;
        Ok(tables)
    }

    /// Existence and owner of a `SCHEMA.TABLE`
    pub fn table_exists(&self, table: &str) -> Result<(bool, Option<String>), DictionaryError> {
        let (schema, name) = split_table_name(table)?;
        let mut session = ScopedSession::open(self.provider.as_ref())?;
        let exists = SqlCatalogInspector::new(&mut session, self.dialect.as_ref())
            .table_exists(&schema, &name)?;
        session.close()?;
        Ok(exists)
    }

    /// Catalog of one `SCHEMA.TABLE`
    pub fn read_table_metadata(&self, table: &str) -> Result<MetadataCatalog, DictionaryError> {
        let mut session = ScopedSession::open(self.provider.as_ref())?;
        let catalog = self.table_metadata(&mut session, table)?;
        session.close()?;
        Ok(catalog)
    }

    fn table_metadata(
        &self,
        session: &mut ScopedSession,
        table: &str,
    ) -> Result<MetadataCatalog, DictionaryError> {
        let (schema, name) = split_table_name(table)?;
        let columns =
            SqlCatalogInspector::new(session, self.dialect.as_ref()).columns_of(&schema, &name)?;
        if columns.is_empty() {
            return Err(DictionaryError::TableNotFound(table.to_string()));
        }

        let mut unsupported: Vec<String> = Vec::new();
        let variables: Vec<VariableMetadata> = columns
            .into_iter()
            .map(|column| {
                let variable_type = self.dialect.classify_native(&column.data_type);
                let flags = variable_type.map(TypeFlags::of).unwrap_or_default();
                let mut variable = VariableMetadata::with_flags(column.name, flags)
                    .num_bytes(column.length.unwrap_or(0))
                    .type_in_source(column.data_type.clone());
                match variable_type {
                    Some(VariableType::Date) => variable = variable.datetime_format(DATABASE_DATE_FORMAT),
                    Some(VariableType::Time) => variable = variable.datetime_format(DATABASE_TIME_FORMAT),
                    Some(VariableType::Timestamp) => {
                        variable = variable.datetime_format(DATABASE_TIMESTAMP_FORMAT)
                    }
                    Some(_) => {}
                    None => {
                        if !unsupported.contains(&column.data_type) {
                            unsupported.push(column.data_type);
                        }
                    }
                }
                variable
            })
            .collect();

        if !unsupported.is_empty() {
            return Err(DictionaryError::UnsupportedNativeType {
                table: table.to_string(),
                types: unsupported,
            });
        }

        let catalog = MetadataCatalog::new(variables, false)?;
        catalog.ensure_complete()?;
        debug!(
            table,
            dialect = self.dialect.name(),
            variables = catalog.size(),
            "Read table metadata"
        );
        Ok(catalog)
    }
}

impl Dictionary for DatabaseDictionary {
    /// Catalog of the location's first table; every other table must agree
    fn read_metadata(&self, location: &DataLocation) -> Result<MetadataCatalog, DictionaryError> {
        let database = location
            .as_database()
            .ok_or_else(|| DictionaryError::UnsupportedLocation(location.to_string()))?;
        let mut tables = database.table_names();
        tables.dedup();
        let (first, others) = tables
            .split_first()
            .ok_or_else(|| DictionaryError::UnsupportedLocation(location.to_string()))?;

        let mut session = ScopedSession::open(self.provider.as_ref())?;
        let catalog = self.table_metadata(&mut session, first)?;
        for other in others {
            let variables = catalog.schema_differences(&self.table_metadata(&mut session, other)?);
            if !variables.is_empty() {
                return Err(DictionaryError::InconsistentTables {
                    first: first.clone(),
                    other: other.clone(),
                    variables,
                });
            }
        }
        session.close()?;

        info!(
            location = %location,
            variables = catalog.size(),
            "Loaded database dictionary"
        );
        Ok(catalog)
    }
}
