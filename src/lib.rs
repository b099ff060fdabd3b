//! Data Source SDK - addressing, describing and moving datasets in ETL pipelines
//!
//! Provides unified interfaces for:
//! - Data locations (files, database tables, database queries)
//! - Metadata catalogs with type classification and datetime formats
//! - Dictionaries that build catalogs from spreadsheets or database system catalogs
//! - Database sessions, SQL dialects and credential providers
//! - Data sources with chunked, schema-checked reading and partitioned writing
//! - TOML configuration

pub mod catalog;
pub mod config;
pub mod connection;
pub mod dictionary;
pub mod location;
pub mod models;
pub mod source;

// Re-export commonly used types
pub use catalog::{CatalogError, MetadataCatalog, TypeFlags, VariableMetadata, VariableType};
pub use config::{ConfigError, EtlConfig};
pub use connection::{
    ConnectionError, ConnectionParams, CredentialProvider, DuckDbDialect, EnvCredentials,
    ScopedSession, Session, SessionProvider, SqlDialect, StaticCredentials, VerticaDialect,
};
#[cfg(feature = "duckdb-backend")]
pub use connection::DuckDbSessionProvider;
pub use dictionary::{DatabaseDictionary, Dictionary, DictionaryError, ExcelDictionary};
pub use location::{
    DataLocation, DatabaseLocation, DatabaseQueryLocation, DatabaseTableLocation,
    FilesystemLocation, LocationError, LocationKind,
};
pub use models::{Column, DataFrame, Value};
pub use source::{
    AccessMode, DataSource, FileOptions, Partitioning, SourceConfig, SourceError, SourceKind,
    SourceShape,
};
