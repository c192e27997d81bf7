//! `defense-dash` library crate.
//!
//! The binary (`dash`) is a thin wrapper around this library so that:
//!
//! - source adapters and the aggregator are testable without network access
//! - modules are reusable (e.g., a web front-end or notebook bindings)
//! - code stays easy to navigate as the project grows

pub mod app;
pub mod cli;
pub mod config;
pub mod data;
pub mod domain;
pub mod error;
pub mod io;
pub mod logging;
pub mod plot;
pub mod report;
pub mod series;
