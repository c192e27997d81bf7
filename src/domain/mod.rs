//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - the unified observation row and table (`Observation`, `Table`)
//! - derived chart inputs (`TimeSeries`, `Ranking`)
//! - shared cell coercions (`coerce_year`, `parse_number`)

pub mod types;

pub use types::*;
