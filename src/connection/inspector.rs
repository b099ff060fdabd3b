//! Remote system-catalog inspection

use super::dialect::SqlDialect;
use super::error::ConnectionError;
use super::session::ScopedSession;
use crate::models::{DataFrame, Value};

/// One column as described by a database's system catalog
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnInfo {
    pub name: String,
    pub data_type: String,
    pub length: Option<u32>,
}

/// Read-only view of a database's system catalog
pub trait CatalogInspector {
    fn list_schemas(&mut self) -> Result<Vec<String>, ConnectionError>;

    fn list_tables(&mut self, schema: &str) -> Result<Vec<String>, ConnectionError>;

    /// Existence of a table, with its owner when it exists
    fn table_exists(
        &mut self,
        schema: &str,
        table: &str,
    ) -> Result<(bool, Option<String>), ConnectionError>;

    /// Columns of a table in declaration order; empty when the table is missing
    fn columns_of(&mut self, schema: &str, table: &str) -> Result<Vec<ColumnInfo>, ConnectionError>;
}

/// Catalog inspector issuing a dialect's catalog queries over a session
pub struct SqlCatalogInspector<'a> {
    session: &'a mut ScopedSession,
    dialect: &'a dyn SqlDialect,
}

impl<'a> SqlCatalogInspector<'a> {
    pub fn new(session: &'a mut ScopedSession, dialect: &'a dyn SqlDialect) -> Self {
        Self { session, dialect }
    }
}

impl CatalogInspector for SqlCatalogInspector<'_> {
    fn list_schemas(&mut self) -> Result<Vec<String>, ConnectionError> {
        let query = self.dialect.list_schemas_sql();
        let frame = self.session.fetch(&query)?;
        text_column(&frame, 0, &query)
    }

    fn list_tables(&mut self, schema: &str) -> Result<Vec<String>, ConnectionError> {
        let query = self.dialect.list_tables_sql(schema);
        let frame = self.session.fetch(&query)?;
        text_column(&frame, 0, &query)
    }

    fn table_exists(
        &mut self,
        schema: &str,
        table: &str,
    ) -> Result<(bool, Option<String>), ConnectionError> {
        let query = self.dialect.table_owner_sql(schema, table);
        let frame = self.session.fetch(&query)?;
        if frame.num_rows() == 0 {
            return Ok((false, None));
        }
        let owner = text_column(&frame, 0, &query)?.into_iter().next();
        Ok((true, owner))
    }

    fn columns_of(&mut self, schema: &str, table: &str) -> Result<Vec<ColumnInfo>, ConnectionError> {
        let query = self.dialect.columns_sql(schema, table);
        let frame = self.session.fetch(&query)?;
        if frame.num_rows() == 0 {
            return Ok(Vec::new());
        }
        if frame.num_columns() < 3 {
            return Err(ConnectionError::UnexpectedResult {
                query,
                reason: format!("expected 3 columns, got {}", frame.num_columns()),
            });
        }

        let names = text_column(&frame, 0, &query)?;
        let types = text_column(&frame, 1, &query)?;
        let lengths = &frame.columns()[2].values;
        Ok(names
            .into_iter()
            .zip(types)
            .zip(lengths)
            .map(|((name, data_type), length)| ColumnInfo {
                name,
                data_type,
                length: length.as_i64().and_then(|n| u32::try_from(n).ok()),
            })
            .collect())
    }
}

fn text_column(frame: &DataFrame, index: usize, query: &str) -> Result<Vec<String>, ConnectionError> {
    let column = frame
        .columns()
        .get(index)
        .ok_or_else(|| ConnectionError::UnexpectedResult {
            query: query.to_string(),
            reason: format!("missing column {}", index),
        })?;
    Ok(column
        .values
        .iter()
        .filter(|v| !v.is_null())
        .map(Value::to_string)
        .collect())
}
