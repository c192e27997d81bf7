//! Aggregator: selected source names → one unified table.
//!
//! Sources run one after another. A source that fails contributes nothing;
//! there is no path by which one source stops the others.

use tracing::{debug, error, warn};

use crate::data::cache::TtlCache;
use crate::data::http::Fetch;
use crate::data::omb::{BudgetTable, OmbReport};
use crate::data::registry::Registry;
use crate::domain::Table;
use crate::error::SourceError;

/// What happened to one requested source during a load.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceStatus {
    Loaded(usize),
    Empty,
    Failed(String),
    Unknown,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SourceOutcome {
    pub name: String,
    pub status: SourceStatus,
}

/// A unified table plus per-source outcomes, for presentation.
#[derive(Debug, Clone, Default)]
pub struct LoadReport {
    pub table: Table,
    pub outcomes: Vec<SourceOutcome>,
}

impl LoadReport {
    pub fn failed(&self) -> impl Iterator<Item = &SourceOutcome> {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.status, SourceStatus::Failed(_)))
    }
}

pub struct Aggregator {
    registry: Registry,
    http: Box<dyn Fetch>,
    tables: TtlCache<Table>,
    budgets: TtlCache<BudgetTable>,
}

impl Aggregator {
    pub fn new(registry: Registry, http: Box<dyn Fetch>) -> Self {
        Self {
            registry,
            http,
            tables: TtlCache::default(),
            budgets: TtlCache::default(),
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Load and merge the named sources. Never fails; see [`Aggregator::load_report`].
    pub fn load_selected<S: AsRef<str>>(&mut self, names: &[S]) -> Table {
        self.load_report(names).table
    }

    /// Load and merge the named sources, keeping per-source outcomes.
    ///
    /// Unknown names are skipped, failing sources contribute no rows, rows
    /// without a finite value or with an empty source/metric are dropped, and
    /// row order follows `names` then each adapter's own order.
    pub fn load_report<S: AsRef<str>>(&mut self, names: &[S]) -> LoadReport {
        let mut report = LoadReport::default();

        for name in names.iter().map(|n| n.as_ref()) {
            let Some(adapter) = self.registry.get(name) else {
                debug!(source = name, "unknown source skipped");
                report.outcomes.push(SourceOutcome {
                    name: name.to_string(),
                    status: SourceStatus::Unknown,
                });
                continue;
            };

            let result = match adapter.budget_report() {
                Some(budget) => self.budget_table(budget).map(|b| b.to_table()),
                None => {
                    let http = self.http.as_ref();
                    self.tables
                        .get_or_try_insert_with(&adapter.cache_key(), adapter.ttl(), || adapter.fetch(http))
                }
            };

            let status = match result {
                Ok(table) if table.is_empty() => SourceStatus::Empty,
                Ok(table) => {
                    let n = table.len();
                    report.table.extend(table);
                    SourceStatus::Loaded(n)
                }
                Err(e) => {
                    if e.is_transient() {
                        warn!(source = name, error = %e, "source unreachable; contributing no rows");
                    } else {
                        error!(source = name, error = %e, "source returned unusable data; contributing no rows");
                    }
                    SourceStatus::Failed(e.to_string())
                }
            };
            report.outcomes.push(SourceOutcome {
                name: name.to_string(),
                status,
            });
        }

        clean(&mut report.table);
        report
    }

    /// The OMB detail table (with `line` labels). Prefix selection needs the
    /// raw classification lines, and adapters backed by this table read their
    /// unified rows from the same cache entry.
    pub fn budget_table(&self, report: &OmbReport) -> Result<BudgetTable, SourceError> {
        let http = self.http.as_ref();
        self.budgets
            .get_or_try_insert_with(&report.cache_key(), report.ttl, || report.fetch_detail(http))
    }
}

fn clean(table: &mut Table) {
    let before = table.len();
    table.retain(|r| {
        r.value.is_finite() && !r.source.trim().is_empty() && !r.metric.trim().is_empty()
    });
    let dropped = before - table.len();
    if dropped > 0 {
        debug!(dropped, "rows removed during final cleaning");
    }
}
