//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - raw inputs (`Observation`) and derived change records (`ChangeRecord`)
//! - engine configuration (`IndexConfig`)
//! - build outputs (`DailyRateTable`, `IndexCurve`, `PriceIndex`, `IndexFile`)

pub mod types;

pub use types::*;
