//! The contract every upstream provider implements.

use std::time::Duration;

use crate::data::http::Fetch;
use crate::data::omb::OmbReport;
use crate::domain::Table;
use crate::error::SourceError;

/// A provider-specific fetch-and-reshape operation.
///
/// `fetch` reports failures as `Err`; the aggregator is the only place that
/// turns an error into an empty contribution.
pub trait SourceAdapter {
    /// Stable, human-readable registry name.
    fn name(&self) -> &str;

    /// Cache key: the adapter name plus every argument that changes the result.
    fn cache_key(&self) -> String;

    /// How long a successful result may be reused.
    fn ttl(&self) -> Duration;

    fn fetch(&self, http: &dyn Fetch) -> Result<Table, SourceError>;

    /// Set when the rows are a view of the OMB detail table, so the
    /// aggregator can serve them from the same cached download.
    fn budget_report(&self) -> Option<&OmbReport> {
        None
    }
}
