//! Chunk iteration over the addresses of a location

use std::collections::VecDeque;

use super::error::SourceError;
use super::file::FileCursor;
use crate::connection::{ScopedSession, SqlDialect};
use crate::models::DataFrame;

/// Pages through one query with `LIMIT`/`OFFSET`, ordered by `order_by`
#[derive(Debug)]
pub(crate) struct QueryCursor {
    statement: String,
    order_by: Vec<String>,
    offset: u64,
    done: bool,
}

impl QueryCursor {
    /// Cursor over a whole table or over a query statement
    pub(crate) fn new(statement: impl Into<String>, order_by: Vec<String>) -> Self {
        Self {
            statement: statement.into(),
            order_by,
            offset: 0,
            done: false,
        }
    }

    pub(crate) fn for_table(table: &str, order_by: Vec<String>) -> Self {
        Self::new(format!("SELECT * FROM {}", table), order_by)
    }

    fn next_chunk(
        &mut self,
        session: &mut ScopedSession,
        dialect: &dyn SqlDialect,
        chunk_size: usize,
    ) -> Result<DataFrame, SourceError> {
        if self.done {
            return Ok(DataFrame::default());
        }
        let page = dialect.paginate(&self.statement, &self.order_by, chunk_size, self.offset);
        let frame = session.fetch(&page)?;
        self.offset += frame.num_rows() as u64;
        if frame.num_rows() < chunk_size {
            self.done = true;
        }
        Ok(frame)
    }
}

/// A cursor over one address
#[derive(Debug)]
pub(crate) enum Cursor {
    File(FileCursor),
    Query(QueryCursor),
}

/// A chunk together with the address it was read from
#[derive(Debug)]
pub(crate) struct Chunk {
    pub(crate) address: String,
    pub(crate) frame: DataFrame,
}

/// Drains cursors in location order
#[derive(Debug)]
pub(crate) struct ChunkReader {
    cursors: VecDeque<(String, Cursor)>,
    rows_read: u64,
    chunks_read: usize,
}

impl ChunkReader {
    pub(crate) fn new(cursors: Vec<(String, Cursor)>) -> Self {
        Self {
            cursors: cursors.into(),
            rows_read: 0,
            chunks_read: 0,
        }
    }

    /// Rows handed out so far
    pub(crate) fn rows_read(&self) -> u64 {
        self.rows_read
    }

    pub(crate) fn chunks_read(&self) -> usize {
        self.chunks_read
    }

    /// Next non-empty chunk, or `None` once every cursor is drained
    ///
    /// Query cursors need a session; file cursors ignore it.
    pub(crate) fn next_chunk(
        &mut self,
        mut session: Option<&mut ScopedSession>,
        dialect: Option<&dyn SqlDialect>,
        chunk_size: usize,
    ) -> Result<Option<Chunk>, SourceError> {
        while let Some((address, cursor)) = self.cursors.front_mut() {
            let frame = match cursor {
                Cursor::File(file) => file.next_chunk(chunk_size)?,
                Cursor::Query(query) => {
                    let (Some(session), Some(dialect)) = (session.as_deref_mut(), dialect) else {
                        return Err(SourceError::InvalidConfig(
                            "query cursor read without a session".to_string(),
                        ));
                    };
                    query.next_chunk(session, dialect, chunk_size)?
                }
            };
            if frame.is_empty() {
                self.cursors.pop_front();
                continue;
            }
            let address = address.clone();
            self.rows_read += frame.num_rows() as u64;
            self.chunks_read += 1;
            return Ok(Some(Chunk { address, frame }));
        }
        Ok(None)
    }

    /// Check if any cursor needs a session
    pub(crate) fn needs_session(&self) -> bool {
        self.cursors
            .iter()
            .any(|(_, cursor)| matches!(cursor, Cursor::Query(_)))
    }
}
