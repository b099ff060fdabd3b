//! In-memory data model shared by locations, catalogs and data sources

pub mod frame;
pub mod value;

pub use frame::{Column, DataFrame, FrameError};
pub use value::Value;
