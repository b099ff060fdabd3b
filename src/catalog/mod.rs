//! Metadata catalogs and type inference
//!
//! A [`MetadataCatalog`] records, for every variable of a dataset, its type,
//! declared size, datetime format and source-system type label. Catalogs are
//! built by dictionary adapters and must pass [`MetadataCatalog::ensure_complete`]
//! before they are used for I/O.

mod error;
pub mod formats;
mod metadata;
mod types;

pub use error::CatalogError;
pub use metadata::MetadataCatalog;
pub use types::{TypeFlags, VariableMetadata, VariableType};
