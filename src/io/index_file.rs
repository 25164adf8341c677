//! Read/write index JSON files.
//!
//! Index JSON is the "portable" representation of a built index:
//! - configuration (horizon, outlier percentile)
//! - build diagnostics
//! - the sparse daily rate table
//! - the dense curve
//!
//! The schema is defined by `domain::IndexFile`.

use std::fs::File;
use std::io::{self, BufReader, BufWriter};
use std::path::Path;

use chrono::NaiveDate;

use crate::domain::{IndexFile, PriceIndex};
use crate::error::Result;

/// Write an index JSON file.
pub fn write_index_json(path: &Path, index: &PriceIndex, built_on: NaiveDate) -> Result<()> {
    write_index_file(path, &IndexFile::from_index(index, built_on))
}

/// Write an already assembled index file.
pub fn write_index_file(path: &Path, file: &IndexFile) -> Result<()> {
    let out = File::create(path).map_err(|e| {
        io::Error::new(e.kind(), format!("Failed to create index JSON '{}': {e}", path.display()))
    })?;
    serde_json::to_writer_pretty(BufWriter::new(out), file)?;
    Ok(())
}

/// Read an index JSON file.
pub fn read_index_json(path: &Path) -> Result<IndexFile> {
    let file = File::open(path).map_err(|e| {
        io::Error::new(e.kind(), format!("Failed to open index JSON '{}': {e}", path.display()))
    })?;
    let index: IndexFile = serde_json::from_reader(BufReader::new(file))?;
    Ok(index)
}
