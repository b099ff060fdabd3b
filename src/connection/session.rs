//! Sessions and session providers

use std::fmt;

use tracing::{debug, error, warn};

use super::error::ConnectionError;
use crate::models::DataFrame;

/// An open connection to a database
pub trait Session: Send {
    /// Run a statement that returns no rows
    fn execute(&mut self, statement: &str) -> Result<(), ConnectionError>;

    /// Run a query and collect its rows
    fn fetch(&mut self, query: &str) -> Result<DataFrame, ConnectionError>;

    /// Append rows to a table, binding columns by name; returns rows written
    fn append(&mut self, table: &str, frame: &DataFrame) -> Result<usize, ConnectionError>;

    /// Release the connection
    fn close(&mut self) -> Result<(), ConnectionError>;
}

/// Opens sessions against one database
pub trait SessionProvider: Send + Sync + fmt::Debug {
    /// Open a new session
    fn open(&self) -> Result<Box<dyn Session>, ConnectionError>;

    /// Probe the connection; any failure yields `false`
    fn test_connection(&self) -> bool {
        match self.open() {
            Ok(mut session) => {
                if let Err(e) = session.close() {
                    debug!("Closing probe session failed: {}", e);
                }
                true
            }
            Err(e) => {
                debug!("Connection test failed: {}", e);
                false
            }
        }
    }
}

/// A session that is closed when it goes out of scope
///
/// Failures are logged with the statement or table involved before being
/// returned.
pub struct ScopedSession {
    inner: Option<Box<dyn Session>>,
}

impl ScopedSession {
    /// Open a session from a provider
    pub fn open(provider: &dyn SessionProvider) -> Result<Self, ConnectionError> {
        let session = provider.open().inspect_err(|e| {
            error!("Failed to open session: {}", e);
        })?;
        Ok(Self {
            inner: Some(session),
        })
    }

    fn session(&mut self) -> Result<&mut Box<dyn Session>, ConnectionError> {
        self.inner.as_mut().ok_or(ConnectionError::Closed)
    }

    pub fn execute(&mut self, statement: &str) -> Result<(), ConnectionError> {
        debug!(statement, "Executing statement");
        self.session()?.execute(statement).inspect_err(|e| {
            error!(statement, "Statement failed: {}", e);
        })
    }

    pub fn fetch(&mut self, query: &str) -> Result<DataFrame, ConnectionError> {
        debug!(statement = query, "Fetching rows");
        self.session()?.fetch(query).inspect_err(|e| {
            error!(statement = query, "Query failed: {}", e);
        })
    }

    pub fn append(&mut self, table: &str, frame: &DataFrame) -> Result<usize, ConnectionError> {
        self.session()?.append(table, frame).inspect_err(|e| {
            error!(table, rows = frame.num_rows(), "Append failed: {}", e);
        })
    }

    /// Close now, reporting any error
    pub fn close(mut self) -> Result<(), ConnectionError> {
        match self.inner.take() {
            Some(mut session) => session.close(),
            None => Ok(()),
        }
    }
}

impl Drop for ScopedSession {
    fn drop(&mut self) {
        if let Some(mut session) = self.inner.take() {
            if let Err(e) = session.close() {
                warn!("Failed to close session: {}", e);
            }
        }
    }
}

impl fmt::Debug for ScopedSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScopedSession")
            .field("open", &self.inner.is_some())
            .finish()
    }
}
