//! SQL dialects
//!
//! A dialect renders every statement the crate sends to a database and maps
//! native column types to variable types and back. Vendor differences live
//! here rather than in the data-source code.

use std::fmt;

use crate::catalog::{VariableMetadata, VariableType};

/// Column alias used by count statements
pub const COUNT_COLUMN: &str = "NUM_ROWS";
/// Column alias used for distinct values in histogram statements
pub const VALUE_COLUMN: &str = "VALUE";

/// Statement rendering and type mapping for one database vendor
pub trait SqlDialect: Send + Sync + fmt::Debug {
    /// Vendor name, for logs
    fn name(&self) -> &'static str;

    /// Query returning one `table_schema` column
    fn list_schemas_sql(&self) -> String;

    /// Query returning one `table_name` column for a schema
    fn list_tables_sql(&self, schema: &str) -> String;

    /// Query returning one `owner_name` row when the table exists
    fn table_owner_sql(&self, schema: &str, table: &str) -> String;

    /// Query returning `column_name`, `data_type` and `data_type_length`
    fn columns_sql(&self, schema: &str, table: &str) -> String;

    /// Variable type of a native column type
    fn classify_native(&self, native_type: &str) -> Option<VariableType>;

    /// Native column type for a variable; `None` when it cannot be mapped
    ///
    /// Text columns are sized at four times the declared character length
    /// so that multi-byte encodings fit.
    fn native_type(&self, variable: &VariableMetadata) -> Option<String> {
        match variable.variable_type()? {
            VariableType::Boolean => Some("BOOLEAN".to_string()),
            VariableType::Integer => Some("INTEGER".to_string()),
            VariableType::Float => Some("FLOAT".to_string()),
            VariableType::Date => Some("DATE".to_string()),
            VariableType::Time => Some("TIME".to_string()),
            VariableType::Timestamp => Some("TIMESTAMP".to_string()),
            VariableType::Text if variable.num_bytes > 0 => {
                Some(format!("VARCHAR({})", variable.num_bytes.saturating_mul(4)))
            }
            VariableType::Text => None,
        }
    }

    /// Count rows of a table, with an optional predicate
    fn count_sql(&self, table: &str, predicate: &str) -> String {
        format!(
            "SELECT COUNT(*) AS {} FROM {}{}",
            COUNT_COLUMN,
            table,
            where_suffix(predicate)
        )
    }

    /// Page through a query in a stable row order
    ///
    /// Segmented tables return rows in no fixed order, so consecutive pages
    /// only partition the result when `order_by` names the projected columns.
    fn paginate(&self, query: &str, order_by: &[String], limit: usize, offset: u64) -> String {
        let order = if order_by.is_empty() {
            String::new()
        } else {
            format!(" ORDER BY {}", order_by.join(", "))
        };
        format!("{}{} LIMIT {} OFFSET {}", query, order, limit, offset)
    }

    /// Histogram of one variable: distinct values and their row counts
    fn histogram_sql(&self, table: &str, variable: &str, predicate: &str) -> String {
        format!(
            "SELECT {v} AS {}, COUNT(*) AS {} FROM {}{} GROUP BY {v}",
            VALUE_COLUMN,
            COUNT_COLUMN,
            table,
            where_suffix(predicate),
            v = variable
        )
    }

    fn drop_table_sql(&self, table: &str) -> String {
        format!("DROP TABLE IF EXISTS {}", table)
    }

    /// `CREATE TABLE` from `(name, native type)` pairs
    fn create_table_sql(&self, table: &str, columns: &[(String, String)]) -> String {
        let columns: Vec<String> = columns
            .iter()
            .map(|(name, native)| format!("{} {}", name, native))
            .collect();
        format!("CREATE TABLE {} ({})", table, columns.join(", "))
    }
}

fn where_suffix(predicate: &str) -> String {
    let predicate = predicate.trim();
    if predicate.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", predicate)
    }
}

fn quote(literal: &str) -> String {
    format!("'{}'", literal.replace('\'', "''"))
}

/// Vertica, reading its `v_catalog` system tables
#[derive(Debug, Clone, Copy, Default)]
pub struct VerticaDialect;

impl SqlDialect for VerticaDialect {
    fn name(&self) -> &'static str {
        "vertica"
    }

    fn list_schemas_sql(&self) -> String {
        "SELECT DISTINCT table_schema FROM v_catalog.tables".to_string()
    }

    fn list_tables_sql(&self, schema: &str) -> String {
        format!(
            "SELECT table_name FROM v_catalog.tables WHERE LOWER(table_schema) = LOWER({})",
            quote(schema)
        )
    }

    fn table_owner_sql(&self, schema: &str, table: &str) -> String {
        format!(
            "SELECT owner_name FROM v_catalog.tables \
             WHERE LOWER(table_schema) = LOWER({}) AND LOWER(table_name) = LOWER({})",
            quote(schema),
            quote(table)
        )
    }

    fn columns_sql(&self, schema: &str, table: &str) -> String {
        format!(
            "SELECT column_name, data_type, data_type_length FROM v_catalog.columns \
             WHERE LOWER(table_schema) = LOWER({}) AND LOWER(table_name) = LOWER({}) \
             ORDER BY ordinal_position",
            quote(schema),
            quote(table)
        )
    }

    fn classify_native(&self, native_type: &str) -> Option<VariableType> {
        let native = native_type.trim().to_uppercase();
        match native.as_str() {
            "BOOLEAN" => Some(VariableType::Boolean),
            "INT" | "INTEGER" => Some(VariableType::Integer),
            "FLOAT" => Some(VariableType::Float),
            "DATE" => Some(VariableType::Date),
            "TIME" => Some(VariableType::Time),
            "TIMESTAMP" => Some(VariableType::Timestamp),
            _ if native.starts_with("VARCHAR") => Some(VariableType::Text),
            _ if native.starts_with("NUMERIC") => Some(VariableType::Float),
            _ => None,
        }
    }
}

/// DuckDB, reading `information_schema`
#[derive(Debug, Clone, Copy, Default)]
pub struct DuckDbDialect;

impl SqlDialect for DuckDbDialect {
    fn name(&self) -> &'static str {
        "duckdb"
    }

    fn list_schemas_sql(&self) -> String {
        "SELECT DISTINCT table_schema FROM information_schema.tables ORDER BY table_schema"
            .to_string()
    }

    fn list_tables_sql(&self, schema: &str) -> String {
        format!(
            "SELECT table_name FROM information_schema.tables \
             WHERE UPPER(table_schema) = UPPER({}) ORDER BY table_name",
            quote(schema)
        )
    }

    fn table_owner_sql(&self, schema: &str, table: &str) -> String {
        format!(
            "SELECT table_catalog AS owner_name FROM information_schema.tables \
             WHERE UPPER(table_schema) = UPPER({}) AND UPPER(table_name) = UPPER({})",
            quote(schema),
            quote(table)
        )
    }

    fn columns_sql(&self, schema: &str, table: &str) -> String {
        format!(
            "SELECT column_name, data_type, character_maximum_length AS data_type_length \
             FROM information_schema.columns \
             WHERE UPPER(table_schema) = UPPER({}) AND UPPER(table_name) = UPPER({}) \
             ORDER BY ordinal_position",
            quote(schema),
            quote(table)
        )
    }

    fn classify_native(&self, native_type: &str) -> Option<VariableType> {
        let native = native_type.trim().to_uppercase();
        match native.as_str() {
            "BOOLEAN" | "BOOL" => Some(VariableType::Boolean),
            "TINYINT" | "SMALLINT" | "INT" | "INTEGER" | "BIGINT" | "HUGEINT" => {
                Some(VariableType::Integer)
            }
            "FLOAT" | "REAL" | "DOUBLE" => Some(VariableType::Float),
            "DATE" => Some(VariableType::Date),
            "TIME" => Some(VariableType::Time),
            "TIMESTAMP" => Some(VariableType::Timestamp),
            _ if native.starts_with("VARCHAR") => Some(VariableType::Text),
            _ if native.starts_with("DECIMAL") || native.starts_with("NUMERIC") => {
                Some(VariableType::Float)
            }
            _ => None,
        }
    }

    fn native_type(&self, variable: &VariableMetadata) -> Option<String> {
        match variable.variable_type()? {
            // FLOAT is single precision in DuckDB
            VariableType::Float => Some("DOUBLE".to_string()),
            VariableType::Text if variable.num_bytes > 0 => {
                Some(format!("VARCHAR({})", variable.num_bytes.saturating_mul(4)))
            }
            VariableType::Text => None,
            other => VerticaDialect.native_type(&VariableMetadata::new(&variable.name, other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::TypeFlags;

    #[test]
    fn test_vertica_classification() {
        let d = VerticaDialect;
        assert_eq!(d.classify_native("varchar(80)"), Some(VariableType::Text));
        assert_eq!(d.classify_native("Numeric(10,2)"), Some(VariableType::Float));
        assert_eq!(d.classify_native("INT"), Some(VariableType::Integer));
        assert_eq!(d.classify_native("timestamp"), Some(VariableType::Timestamp));
        assert_eq!(d.classify_native("LONG VARBINARY"), None);
        assert_eq!(d.classify_native("TIMESTAMPTZ"), None);
    }

    #[test]
    fn test_native_types() {
        let d = VerticaDialect;
        let text = VariableMetadata::new("NAME", VariableType::Text).num_bytes(10);
        assert_eq!(d.native_type(&text).as_deref(), Some("VARCHAR(40)"));
        assert_eq!(
            d.native_type(&VariableMetadata::new("F", VariableType::Float)).as_deref(),
            Some("FLOAT")
        );
        let unsized_text = VariableMetadata::new("T", VariableType::Text);
        assert_eq!(d.native_type(&unsized_text), None);
        let untyped = VariableMetadata::with_flags("X", TypeFlags::default());
        assert_eq!(d.native_type(&untyped), None);

        assert_eq!(
            DuckDbDialect
                .native_type(&VariableMetadata::new("F", VariableType::Float))
                .as_deref(),
            Some("DOUBLE")
        );
        assert_eq!(
            DuckDbDialect
                .native_type(&VariableMetadata::new("D", VariableType::Date))
                .as_deref(),
            Some("DATE")
        );
    }

    #[test]
    fn test_statements() {
        let d = VerticaDialect;
        assert_eq!(
            d.count_sql("S.T", "A = 1"),
            "SELECT COUNT(*) AS NUM_ROWS FROM S.T WHERE A = 1"
        );
        assert_eq!(d.count_sql("S.T", ""), "SELECT COUNT(*) AS NUM_ROWS FROM S.T");
        assert_eq!(
            d.paginate("SELECT * FROM S.T", &[], 100, 200),
            "SELECT * FROM S.T LIMIT 100 OFFSET 200"
        );
        assert_eq!(
            d.paginate("SELECT * FROM S.T", &["A".to_string(), "B".to_string()], 10, 0),
            "SELECT * FROM S.T ORDER BY A, B LIMIT 10 OFFSET 0"
        );
        assert_eq!(
            d.create_table_sql(
                "S.T",
                &[
                    ("A".to_string(), "INTEGER".to_string()),
                    ("B".to_string(), "DATE".to_string())
                ]
            ),
            "CREATE TABLE S.T (A INTEGER, B DATE)"
        );
        assert_eq!(
            d.histogram_sql("S.T", "A", ""),
            "SELECT A AS VALUE, COUNT(*) AS NUM_ROWS FROM S.T GROUP BY A"
        );
        assert!(d.table_owner_sql("s", "o'brien").contains("'o''brien'"));
    }
}
