//! Data acquisition and normalization.
//!
//! - transport seam (`http`) and result cache (`cache`)
//! - one adapter per upstream provider (`world_bank`, `omb`, `grapher`, `usaspending`)
//! - the source registry and the aggregator that merges selected sources

pub mod adapter;
pub mod aggregate;
pub mod cache;
pub mod columns;
pub mod grapher;
pub mod http;
pub mod omb;
pub mod registry;
pub mod usaspending;
pub mod world_bank;

pub use adapter::SourceAdapter;
pub use aggregate::{Aggregator, LoadReport, SourceOutcome, SourceStatus};
pub use cache::TtlCache;
pub use http::{Fetch, HttpFetcher};
pub use omb::{BudgetLine, BudgetTable, OmbReport};
pub use registry::Registry;
