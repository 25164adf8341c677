//! `price-index` library crate.
//!
//! Builds a daily price index from irregular purchase histories and predicts
//! item prices with it. The binary (`pidx`) is a thin wrapper around this
//! library so that:
//!
//! - core logic is testable without spawning processes
//! - the index, models and scoring are reusable from other front-ends

pub mod app;
pub mod cache;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod index;
pub mod io;
pub mod math;
pub mod models;
pub mod plot;
pub mod report;
pub mod scoring;
