//! Row counting for files and tables

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use tracing::{debug, error};

use super::error::SourceError;
use crate::connection::{COUNT_COLUMN, ConnectionError, ScopedSession, SqlDialect};

/// Total number of non-blank lines across files
pub fn count_lines<P: AsRef<Path>>(paths: &[P]) -> Result<u64, SourceError> {
    paths.iter().try_fold(0u64, |total, path| {
        Ok(total + count_file_lines(path.as_ref())?)
    })
}

/// Number of non-blank lines in one file
pub fn count_file_lines(path: &Path) -> Result<u64, SourceError> {
    let file = File::open(path).map_err(|e| {
        error!(path = %path.display(), "Could not determine number of rows: {}", e);
        SourceError::io(path, e)
    })?;
    let mut reader = BufReader::new(file);
    let mut line = Vec::new();
    let mut count = 0u64;
    loop {
        line.clear();
        let read = reader
            .read_until(b'\n', &mut line)
            .map_err(|e| SourceError::io(path, e))?;
        if read == 0 {
            break;
        }
        if line.iter().any(|b| !b.is_ascii_whitespace()) {
            count += 1;
        }
    }
    debug!(path = %path.display(), lines = count, "Counted lines");
    Ok(count)
}

/// `COUNT(*)` of a table, with an optional predicate
pub fn count_table_rows(
    session: &mut ScopedSession,
    dialect: &dyn SqlDialect,
    table: &str,
    predicate: &str,
) -> Result<u64, SourceError> {
    let query = dialect.count_sql(table, predicate);
    let frame = session.fetch(&query)?;
    let count = frame
        .column(COUNT_COLUMN)
        .or_else(|| frame.columns().first())
        .and_then(|c| c.values.first())
        .and_then(|v| v.as_i64())
        .and_then(|n| u64::try_from(n).ok())
        .ok_or_else(|| ConnectionError::UnexpectedResult {
            query: query.clone(),
            reason: "no row count returned".to_string(),
        })?;
    debug!(table, predicate, rows = count, "Counted table rows");
    Ok(count)
}
