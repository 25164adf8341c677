//! Input/output helpers.
//!
//! - CSV ingest + validation (`ingest`)
//! - index/path/prediction exports (CSV) (`export`)
//! - index JSON read/write (`index_file`)

pub mod export;
pub mod index_file;
pub mod ingest;

pub use export::*;
pub use index_file::*;
pub use ingest::*;
