//! DuckDB session provider

#![allow(unexpected_cfgs)]

use std::sync::Mutex;

use chrono::{DateTime, NaiveDate, NaiveTime};
use duckdb::types::{TimeUnit, Value as DuckValue};
use tracing::debug;

use super::error::ConnectionError;
use super::session::{Session, SessionProvider};
use crate::models::{Column, DataFrame, Value};

/// Sessions over one DuckDB database, in memory or on disk
///
/// Every session is a clone of a root connection, so in-memory databases are
/// shared by all sessions of a provider.
#[derive(Debug)]
pub struct DuckDbSessionProvider {
    root: Mutex<duckdb::Connection>,
    path: Option<String>,
}

impl DuckDbSessionProvider {
    /// Open or create a database file
    pub fn open(path: &str) -> Result<Self, ConnectionError> {
        let conn = duckdb::Connection::open(path)?;
        Ok(Self {
            root: Mutex::new(conn),
            path: Some(path.to_string()),
        })
    }

    /// Open an in-memory database
    pub fn memory() -> Result<Self, ConnectionError> {
        let conn = duckdb::Connection::open_in_memory()?;
        Ok(Self {
            root: Mutex::new(conn),
            path: None,
        })
    }

    /// Database path, `None` when in memory
    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }
}

impl SessionProvider for DuckDbSessionProvider {
    fn open(&self) -> Result<Box<dyn Session>, ConnectionError> {
        let root = self
            .root
            .lock()
            .map_err(|_| ConnectionError::Open("connection lock poisoned".to_string()))?;
        let conn = root.try_clone()?;
        debug!(path = self.path.as_deref().unwrap_or(":memory:"), "Opened DuckDB session");
        Ok(Box::new(DuckDbSession { conn: Some(conn) }))
    }
}

struct DuckDbSession {
    conn: Option<duckdb::Connection>,
}

impl DuckDbSession {
    fn conn(&self) -> Result<&duckdb::Connection, ConnectionError> {
        self.conn.as_ref().ok_or(ConnectionError::Closed)
    }
}

impl Session for DuckDbSession {
    fn execute(&mut self, statement: &str) -> Result<(), ConnectionError> {
        self.conn()?
            .execute_batch(statement)
            .map_err(|e| ConnectionError::Execute {
                statement: statement.to_string(),
                reason: e.to_string(),
            })
    }

    fn fetch(&mut self, query: &str) -> Result<DataFrame, ConnectionError> {
        let fetch_error = |e: duckdb::Error| ConnectionError::Fetch {
            query: query.to_string(),
            reason: e.to_string(),
        };
        let conn = self.conn()?;
        let mut stmt = conn.prepare(query).map_err(fetch_error)?;
        let mut rows = stmt.query([]).map_err(fetch_error)?;

        // Column names are only known once the query has run
        let column_count = rows.as_ref().map(|r| r.column_count()).unwrap_or(0);
        let column_names: Vec<String> = (0..column_count)
            .map(|i| {
                rows.as_ref()
                    .and_then(|r| r.column_name(i).ok())
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| format!("col{}", i))
            })
            .collect();

        let mut columns: Vec<Column> = column_names
            .iter()
            .map(|name| Column::new(name.clone(), Vec::new()))
            .collect();
        while let Some(row) = rows.next().map_err(fetch_error)? {
            for (i, column) in columns.iter_mut().enumerate() {
                let value: DuckValue = row.get(i).map_err(fetch_error)?;
                column.values.push(from_duckdb(value));
            }
        }

        DataFrame::from_columns(columns).map_err(|e| ConnectionError::Fetch {
            query: query.to_string(),
            reason: e.to_string(),
        })
    }

    fn append(&mut self, table: &str, frame: &DataFrame) -> Result<usize, ConnectionError> {
        if frame.num_rows() == 0 {
            return Ok(0);
        }
        let append_error = |e: duckdb::Error| ConnectionError::Append {
            table: table.to_string(),
            reason: e.to_string(),
        };

        let names = frame.column_names();
        let placeholders = vec!["?"; names.len()].join(", ");
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            table,
            names.join(", "),
            placeholders
        );

        let conn = self.conn()?;
        conn.execute_batch("BEGIN TRANSACTION").map_err(append_error)?;
        let inserted = (|| -> Result<usize, duckdb::Error> {
            let mut stmt = conn.prepare(&sql)?;
            let mut inserted = 0;
            for row in frame.rows() {
                inserted += stmt.execute(duckdb::params_from_iter(row.iter().map(to_duckdb)))?;
            }
            Ok(inserted)
        })();
        match inserted {
            Ok(n) => {
                conn.execute_batch("COMMIT").map_err(append_error)?;
                Ok(n)
            }
            Err(e) => {
                let _ = conn.execute_batch("ROLLBACK");
                Err(append_error(e))
            }
        }
    }

    fn close(&mut self) -> Result<(), ConnectionError> {
        if let Some(conn) = self.conn.take() {
            conn.close()
                .map_err(|(_, e)| ConnectionError::Close(e.to_string()))?;
        }
        Ok(())
    }
}

fn micros(unit: TimeUnit, value: i64) -> i64 {
    match unit {
        TimeUnit::Second => value.saturating_mul(1_000_000),
        TimeUnit::Millisecond => value.saturating_mul(1_000),
        TimeUnit::Microsecond => value,
        TimeUnit::Nanosecond => value / 1_000,
    }
}

fn from_duckdb(value: DuckValue) -> Value {
    match value {
        DuckValue::Null => Value::Null,
        DuckValue::Boolean(b) => Value::Boolean(b),
        DuckValue::TinyInt(n) => Value::Integer(n.into()),
        DuckValue::SmallInt(n) => Value::Integer(n.into()),
        DuckValue::Int(n) => Value::Integer(n.into()),
        DuckValue::BigInt(n) => Value::Integer(n),
        DuckValue::HugeInt(n) => i64::try_from(n)
            .map(Value::Integer)
            .unwrap_or(Value::Float(n as f64)),
        DuckValue::UTinyInt(n) => Value::Integer(n.into()),
        DuckValue::USmallInt(n) => Value::Integer(n.into()),
        DuckValue::UInt(n) => Value::Integer(n.into()),
        DuckValue::UBigInt(n) => i64::try_from(n)
            .map(Value::Integer)
            .unwrap_or(Value::Float(n as f64)),
        DuckValue::Float(f) => Value::Float(f as f64),
        DuckValue::Double(f) => Value::Float(f),
        DuckValue::Decimal(d) => d
            .to_string()
            .parse::<f64>()
            .map(Value::Float)
            .unwrap_or(Value::Null),
        DuckValue::Text(s) => Value::Text(s),
        DuckValue::Date32(days) => NaiveDate::from_num_days_from_ce_opt(days + 719_163)
            .map(Value::Date)
            .unwrap_or(Value::Null),
        DuckValue::Time64(unit, value) => {
            let us = micros(unit, value);
            NaiveTime::from_num_seconds_from_midnight_opt(
                (us / 1_000_000) as u32,
                ((us % 1_000_000) * 1_000) as u32,
            )
            .map(Value::Time)
            .unwrap_or(Value::Null)
        }
        DuckValue::Timestamp(unit, value) => DateTime::from_timestamp_micros(micros(unit, value))
            .map(|ts| Value::Timestamp(ts.naive_utc()))
            .unwrap_or(Value::Null),
        other => Value::Text(format!("{:?}", other)),
    }
}

fn to_duckdb(value: &Value) -> DuckValue {
    match value {
        Value::Null => DuckValue::Null,
        Value::Boolean(b) => DuckValue::Boolean(*b),
        Value::Integer(n) => DuckValue::BigInt(*n),
        Value::Float(f) => DuckValue::Double(*f),
        Value::Text(s) => DuckValue::Text(s.clone()),
        // Temporal values bind as text and are cast by the target column
        other => DuckValue::Text(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::ScopedSession;

    #[test]
    fn test_round_trip_through_memory_database() {
        let provider = DuckDbSessionProvider::memory().expect("open in-memory database");
        let mut session = ScopedSession::open(&provider).expect("open session");
        session
            .execute("CREATE SCHEMA S; CREATE TABLE S.T (A INTEGER, B VARCHAR, C DATE)")
            .expect("create table");

        let frame = DataFrame::from_rows(
            &["A".to_string(), "B".to_string(), "C".to_string()],
            vec![
                vec![Value::Integer(1), Value::from("x"), Value::from("2021-03-14")],
                vec![Value::Integer(2), Value::Null, Value::Null],
            ],
        )
        .unwrap();
        assert_eq!(session.append("S.T", &frame).expect("append"), 2);

        let fetched = session.fetch("SELECT * FROM S.T ORDER BY A").expect("fetch");
        assert_eq!(fetched.num_rows(), 2);
        assert_eq!(fetched.column("A").unwrap().values[1], Value::Integer(2));
        assert_eq!(
            fetched.column("C").unwrap().values[0],
            Value::Date(NaiveDate::from_ymd_opt(2021, 3, 14).unwrap())
        );
        assert!(fetched.column("B").unwrap().values[1].is_null());
    }

    #[test]
    fn test_sessions_share_the_memory_database() {
        let provider = DuckDbSessionProvider::memory().unwrap();
        {
            let mut first = ScopedSession::open(&provider).unwrap();
            first.execute("CREATE TABLE main.shared (X INTEGER)").unwrap();
        }
        let mut second = ScopedSession::open(&provider).unwrap();
        assert_eq!(second.fetch("SELECT * FROM main.shared").unwrap().num_rows(), 0);
        assert!(provider.test_connection());
    }
}
