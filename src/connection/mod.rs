//! Database connections
//!
//! The crate never speaks a wire protocol itself. It talks to databases
//! through a [`SessionProvider`] that opens [`Session`]s, renders SQL with a
//! [`SqlDialect`], and reads system catalogs with a [`CatalogInspector`].
//! Sessions are scoped to one operation through [`ScopedSession`], which
//! closes them on every exit path.

#![allow(unexpected_cfgs)]

mod credentials;
mod dialect;
#[cfg(feature = "duckdb-backend")]
mod duckdb_backend;
mod error;
mod inspector;
mod session;

pub use credentials::{
    ConnectionParams, ConnectionSettings, CredentialProvider, Credentials, EnvCredentials,
    StaticCredentials, DEFAULT_PASSWORD_VAR, DEFAULT_USER_VAR,
};
pub use dialect::{COUNT_COLUMN, DuckDbDialect, SqlDialect, VALUE_COLUMN, VerticaDialect};
#[cfg(feature = "duckdb-backend")]
pub use duckdb_backend::DuckDbSessionProvider;
pub use error::ConnectionError;
pub use inspector::{CatalogInspector, ColumnInfo, SqlCatalogInspector};
pub use session::{ScopedSession, Session, SessionProvider};
