//! Shared fixtures for integration tests
//!
//! `MockDatabase` is an in-memory `SessionProvider`. It understands the
//! pipe-separated commands rendered by `MockDialect`, so tests exercise the
//! data-source engine without a database server.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use data_source_sdk::catalog::{VariableMetadata, VariableType};
use data_source_sdk::connection::{
    COUNT_COLUMN, ConnectionError, Session, SessionProvider, SqlDialect, VALUE_COLUMN,
    VerticaDialect,
};
use data_source_sdk::models::{Column, DataFrame, Value};

/// A table held by the mock database
#[derive(Debug, Clone, Default)]
pub struct MockTable {
    /// `(name, native type)` in declaration order
    pub columns: Vec<(String, String)>,
    pub rows: Vec<Vec<Value>>,
}

impl MockTable {
    pub fn new(columns: &[(&str, &str)]) -> Self {
        Self {
            columns: columns
                .iter()
                .map(|(n, t)| (n.to_uppercase(), t.to_string()))
                .collect(),
            rows: Vec::new(),
        }
    }

    pub fn with_rows(mut self, rows: Vec<Vec<Value>>) -> Self {
        self.rows = rows;
        self
    }

    fn column_index(&self, name: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|(n, _)| n.eq_ignore_ascii_case(name.trim()))
    }

    fn matches(&self, row: &[Value], predicate: &str) -> bool {
        predicate
            .split(" AND ")
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .all(|condition| {
                let Some((column, expected)) = condition.split_once('=') else {
                    return false;
                };
                let expected = expected.trim().trim_matches('\'');
                self.column_index(column)
                    .map(|i| row[i].to_string().eq_ignore_ascii_case(expected))
                    .unwrap_or(false)
            })
    }
}

#[derive(Debug, Default)]
pub struct MockState {
    pub tables: BTreeMap<String, MockTable>,
    pub statements: Vec<String>,
    pub opened: usize,
    pub closed: usize,
}

/// In-memory database shared by every session it opens
#[derive(Debug, Clone, Default)]
pub struct MockDatabase {
    pub state: Arc<Mutex<MockState>>,
}

impl MockDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_table(&self, name: &str, table: MockTable) {
        self.state
            .lock()
            .unwrap()
            .tables
            .insert(name.to_uppercase(), table);
    }

    pub fn table(&self, name: &str) -> Option<MockTable> {
        self.state.lock().unwrap().tables.get(&name.to_uppercase()).cloned()
    }

    pub fn remove_last_row(&self, name: &str) {
        let mut state = self.state.lock().unwrap();
        if let Some(table) = state.tables.get_mut(&name.to_uppercase()) {
            table.rows.pop();
        }
    }

    /// Sessions opened and closed so far
    pub fn session_counts(&self) -> (usize, usize) {
        let state = self.state.lock().unwrap();
        (state.opened, state.closed)
    }

    pub fn statements(&self) -> Vec<String> {
        self.state.lock().unwrap().statements.clone()
    }

    pub fn provider(&self) -> Arc<dyn SessionProvider> {
        Arc::new(self.clone())
    }

    pub fn dialect() -> Arc<dyn SqlDialect> {
        Arc::new(MockDialect)
    }
}

impl SessionProvider for MockDatabase {
    fn open(&self) -> Result<Box<dyn Session>, ConnectionError> {
        self.state.lock().unwrap().opened += 1;
        Ok(Box::new(MockSession {
            state: self.state.clone(),
            open: true,
        }))
    }
}

struct MockSession {
    state: Arc<Mutex<MockState>>,
    open: bool,
}

fn frame(names: &[&str], rows: Vec<Vec<Value>>) -> DataFrame {
    let names: Vec<String> = names.iter().map(|s| s.to_string()).collect();
    DataFrame::from_rows(&names, rows).unwrap()
}

fn parse_select(query: &str) -> (Vec<String>, String, String) {
    let query = query.trim().to_uppercase();
    let rest = query.strip_prefix("SELECT ").unwrap_or(&query);
    let (projection, rest) = rest.split_once(" FROM ").unwrap_or(("*", rest));
    let (table, predicate) = match rest.split_once(" WHERE ") {
        Some((table, predicate)) => (table.trim(), predicate.trim()),
        None => (rest.trim(), ""),
    };
    let projection = if projection.trim() == "*" {
        Vec::new()
    } else {
        projection.split(',').map(|c| c.trim().to_string()).collect()
    };
    (projection, table.to_uppercase(), predicate.to_string())
}

impl Session for MockSession {
    fn execute(&mut self, statement: &str) -> Result<(), ConnectionError> {
        let mut state = self.state.lock().unwrap();
        state.statements.push(statement.to_string());
        let parts: Vec<&str> = statement.split('|').collect();
        match parts.as_slice() {
            ["DROP", table] => {
                state.tables.remove(&table.to_uppercase());
                Ok(())
            }
            ["CREATE", table, columns] => {
                let columns: Vec<(String, String)> = columns
                    .split(',')
                    .filter_map(|c| c.split_once(':'))
                    .map(|(n, t)| (n.to_uppercase(), t.to_string()))
                    .collect();
                state.tables.insert(
                    table.to_uppercase(),
                    MockTable {
                        columns,
                        rows: Vec::new(),
                    },
                );
                Ok(())
            }
            _ => Err(ConnectionError::Execute {
                statement: statement.to_string(),
                reason: "unsupported statement".to_string(),
            }),
        }
    }

    fn fetch(&mut self, query: &str) -> Result<DataFrame, ConnectionError> {
        let mut state = self.state.lock().unwrap();
        state.statements.push(query.to_string());
        let fail = |reason: &str| ConnectionError::Fetch {
            query: query.to_string(),
            reason: reason.to_string(),
        };
        let parts: Vec<&str> = query.splitn(6, '|').collect();
        match parts.as_slice() {
            ["SCHEMAS"] => {
                let mut schemas: Vec<String> = state
                    .tables
                    .keys()
                    .filter_map(|t| t.split_once('.').map(|(s, _)| s.to_string()))
                    .collect();
                schemas.dedup();
                Ok(frame(
                    &["table_schema"],
                    schemas.into_iter().map(|s| vec![Value::Text(s)]).collect(),
                ))
            }
            ["TABLES", schema] => Ok(frame(
                &["table_name"],
                state
                    .tables
                    .keys()
                    .filter_map(|t| t.split_once('.'))
                    .filter(|(s, _)| s.eq_ignore_ascii_case(schema))
                    .map(|(_, t)| vec![Value::from(t)])
                    .collect(),
            )),
            ["OWNER", schema, table] => {
                let key = format!("{}.{}", schema, table).to_uppercase();
                let rows = if state.tables.contains_key(&key) {
                    vec![vec![Value::from("dbadmin")]]
                } else {
                    Vec::new()
                };
                Ok(frame(&["owner_name"], rows))
            }
            ["COLUMNS", schema, table] => {
                let key = format!("{}.{}", schema, table).to_uppercase();
                let rows = state
                    .tables
                    .get(&key)
                    .map(|t| {
                        t.columns
                            .iter()
                            .map(|(name, native)| {
                                let length = native
                                    .split_once('(')
                                    .and_then(|(_, n)| n.trim_end_matches(')').parse::<i64>().ok());
                                vec![
                                    Value::from(name.as_str()),
                                    Value::from(native.as_str()),
                                    length.map(Value::Integer).unwrap_or(Value::Null),
                                ]
                            })
                            .collect()
                    })
                    .unwrap_or_default();
                Ok(frame(&["column_name", "data_type", "data_type_length"], rows))
            }
            ["COUNT", table, predicate] => {
                let table = state.tables.get(&table.to_uppercase()).ok_or_else(|| fail("no such table"))?;
                let count = table.rows.iter().filter(|r| table.matches(r, predicate)).count();
                Ok(frame(&[COUNT_COLUMN], vec![vec![Value::Integer(count as i64)]]))
            }
            ["PAGE", limit, offset, _order_by, statement] => {
                let limit: usize = limit.parse().map_err(|_| fail("bad limit"))?;
                let offset: usize = offset.parse().map_err(|_| fail("bad offset"))?;
                let (projection, table_name, predicate) = parse_select(statement);
                let table = state.tables.get(&table_name).ok_or_else(|| fail("no such table"))?;
                let indices: Vec<usize> = if projection.is_empty() {
                    (0..table.columns.len()).collect()
                } else {
                    projection
                        .iter()
                        .map(|c| table.column_index(c).ok_or_else(|| fail("no such column")))
                        .collect::<Result<_, _>>()?
                };
                let names: Vec<String> = indices.iter().map(|&i| table.columns[i].0.clone()).collect();
                let rows: Vec<Vec<Value>> = table
                    .rows
                    .iter()
                    .filter(|r| table.matches(r, &predicate))
                    .skip(offset)
                    .take(limit)
                    .map(|r| indices.iter().map(|&i| r[i].clone()).collect())
                    .collect();
                Ok(DataFrame::from_rows(&names, rows).unwrap())
            }
            ["HIST", table, variable, predicate] => {
                let table = state.tables.get(&table.to_uppercase()).ok_or_else(|| fail("no such table"))?;
                let index = table.column_index(variable).ok_or_else(|| fail("no such column"))?;
                let mut groups: BTreeMap<String, (Value, i64)> = BTreeMap::new();
                for row in table.rows.iter().filter(|r| table.matches(r, predicate)) {
                    groups
                        .entry(row[index].group_key())
                        .or_insert((row[index].clone(), 0))
                        .1 += 1;
                }
                Ok(frame(
                    &[VALUE_COLUMN, COUNT_COLUMN],
                    groups
                        .into_values()
                        .map(|(v, n)| vec![v, Value::Integer(n)])
                        .collect(),
                ))
            }
            _ => Err(fail("unsupported query")),
        }
    }

    fn append(&mut self, table: &str, data: &DataFrame) -> Result<usize, ConnectionError> {
        let mut state = self.state.lock().unwrap();
        let target = state
            .tables
            .get_mut(&table.to_uppercase())
            .ok_or_else(|| ConnectionError::Append {
                table: table.to_string(),
                reason: "no such table".to_string(),
            })?;
        let indices: Vec<usize> = target
            .columns
            .iter()
            .map(|(name, _)| {
                data.column_index(name).ok_or_else(|| ConnectionError::Append {
                    table: table.to_string(),
                    reason: format!("missing column {}", name),
                })
            })
            .collect::<Result<_, _>>()?;
        for row in data.rows() {
            target.rows.push(indices.iter().map(|&i| row[i].clone()).collect());
        }
        Ok(data.num_rows())
    }

    fn close(&mut self) -> Result<(), ConnectionError> {
        if self.open {
            self.open = false;
            self.state.lock().unwrap().closed += 1;
        }
        Ok(())
    }
}

/// Renders statements the mock database understands
#[derive(Debug, Clone, Copy, Default)]
pub struct MockDialect;

impl SqlDialect for MockDialect {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn list_schemas_sql(&self) -> String {
        "SCHEMAS".to_string()
    }

    fn list_tables_sql(&self, schema: &str) -> String {
        format!("TABLES|{}", schema)
    }

    fn table_owner_sql(&self, schema: &str, table: &str) -> String {
        format!("OWNER|{}|{}", schema, table)
    }

    fn columns_sql(&self, schema: &str, table: &str) -> String {
        format!("COLUMNS|{}|{}", schema, table)
    }

    fn classify_native(&self, native_type: &str) -> Option<VariableType> {
        VerticaDialect.classify_native(native_type)
    }

    fn count_sql(&self, table: &str, predicate: &str) -> String {
        format!("COUNT|{}|{}", table, predicate)
    }

    fn paginate(&self, query: &str, order_by: &[String], limit: usize, offset: u64) -> String {
        format!("PAGE|{}|{}|{}|{}", limit, offset, order_by.join(","), query)
    }

    fn histogram_sql(&self, table: &str, variable: &str, predicate: &str) -> String {
        format!("HIST|{}|{}|{}", table, variable, predicate)
    }

    fn drop_table_sql(&self, table: &str) -> String {
        format!("DROP|{}", table)
    }

    fn create_table_sql(&self, table: &str, columns: &[(String, String)]) -> String {
        let columns: Vec<String> = columns.iter().map(|(n, t)| format!("{}:{}", n, t)).collect();
        format!("CREATE|{}|{}", table, columns.join(","))
    }
}

/// Write a delimited file, creating parent directories
pub fn write_file(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("Failed to create directory");
    }
    fs::write(&path, content).expect("Failed to write test file");
    path
}

/// A text variable of `len` characters
pub fn text(name: &str, len: u32) -> VariableMetadata {
    VariableMetadata::new(name, VariableType::Text).num_bytes(len)
}

pub fn column(name: &str, values: Vec<Value>) -> Column {
    Column::new(name, values)
}
