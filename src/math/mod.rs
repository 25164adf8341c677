//! Mathematical utilities: geometric/arithmetic means and percentiles.

pub mod stats;

pub use stats::*;
