//! Model scoring: relative error metrics and a time-split benchmark.

pub mod benchmark;
pub mod metrics;

pub use benchmark::*;
pub use metrics::*;
