//! Error types for database connections

#![allow(unexpected_cfgs)]

use thiserror::Error;

/// Errors raised by sessions and session providers
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConnectionError {
    /// A session could not be opened
    #[error("Cannot open session: {0}")]
    Open(String),

    /// Credentials could not be resolved
    #[error("Missing credentials: {0}")]
    MissingCredentials(String),

    /// A statement failed
    #[error("Statement failed: {statement}: {reason}")]
    Execute { statement: String, reason: String },

    /// A query failed
    #[error("Query failed: {query}: {reason}")]
    Fetch { query: String, reason: String },

    /// Rows could not be appended to a table
    #[error("Cannot append to {table}: {reason}")]
    Append { table: String, reason: String },

    /// A session could not be closed cleanly
    #[error("Cannot close session: {0}")]
    Close(String),

    /// The session was already closed
    #[error("Session is closed")]
    Closed,

    /// A catalog query returned an unexpected result
    #[error("Unexpected result from {query}: {reason}")]
    UnexpectedResult { query: String, reason: String },
}

impl ConnectionError {
    /// Get a user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            ConnectionError::Open(reason) => format!(
                "Cannot open a database session: {reason}\n\n\
                Hint: Check host, port, database and credentials, and that the server is reachable."
            ),
            ConnectionError::MissingCredentials(reason) => format!(
                "Missing credentials: {reason}\n\n\
                Hint: Set the user and password environment variables or pass credentials explicitly."
            ),
            ConnectionError::Execute { statement, reason } => format!(
                "Statement failed: {reason}\nStatement: {statement}\n\n\
                Hint: Check the statement syntax and your privileges on the target table."
            ),
            _ => self.to_string(),
        }
    }
}

#[cfg(feature = "duckdb-backend")]
impl From<duckdb::Error> for ConnectionError {
    fn from(err: duckdb::Error) -> Self {
        ConnectionError::Open(err.to_string())
    }
}
