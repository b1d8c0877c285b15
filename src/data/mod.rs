//! Data module - sheet loading, normalization and caching

mod cache;
mod loader;
mod processor;
mod raw;
pub mod schema;
mod table;

pub use cache::{CacheError, TableCache};
pub use loader::{CsvFileSource, LoadFailure, SheetKey, SheetLoader, SheetSource};
pub use processor::{round2, Normalizer};
pub use raw::RawTable;
pub use table::NormalizedTable;
