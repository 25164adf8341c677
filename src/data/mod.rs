//! Data sources: synthetic purchase histories for demos and tests.

pub mod sample;

pub use sample::*;
