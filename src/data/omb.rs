//! OMB Historical Table 3.2: outlays by function and subfunction.
//!
//! The table ships as a legacy workbook laid out wide (one column per fiscal
//! year) under a few title rows. It is reshaped into [`BudgetLine`]s, one per
//! (classification line, year), which keep the raw `line` text (`"051 Department
//! of Defense-Military"`) for prefix selection downstream.

use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use serde::Serialize;
use tracing::{info, warn};

use crate::data::adapter::SourceAdapter;
use crate::data::http::Fetch;
use crate::domain::{Observation, Table, parse_number};
use crate::error::SourceError;
use crate::io::sheet::read_workbook_rows;

pub const SOURCE: &str = "OMB";
pub const UNIT: &str = "USD millions";

const HEADER_LABEL: &str = "function and subfunction";
const HEADER_SCAN_ROWS: usize = 20;
const FALLBACK_HEADER_ROW: usize = 2;

static YEAR_HEADER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d{4}$").expect("valid year regex"));
static LEADING_CODE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\s*\d+\s+").expect("valid code regex"));

/// One classification line in one fiscal year.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BudgetLine {
    /// Raw label cell, leading classification code included.
    pub line: String,
    /// `line` without its leading code.
    pub label: String,
    pub year: i32,
    pub outlays: Option<f64>,
}

/// The long-form detail table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BudgetTable {
    pub lines: Vec<BudgetLine>,
}

impl BudgetTable {
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Unified rows: one per line and year with a reported outlay.
    pub fn to_table(&self) -> Table {
        self.lines
            .iter()
            .filter(|l| !l.line.trim().is_empty())
            .filter_map(|l| {
                let value = l.outlays?;
                Some(Observation::new(
                    SOURCE,
                    "United States",
                    Some(l.year),
                    l.line.trim(),
                    value,
                    UNIT,
                ))
            })
            .collect()
    }
}

/// Download location and cache window for the historical table.
#[derive(Debug, Clone)]
pub struct OmbReport {
    pub url: String,
    pub ttl: Duration,
}

impl OmbReport {
    pub fn new(url: impl Into<String>, ttl: Duration) -> Self {
        Self { url: url.into(), ttl }
    }

    pub fn cache_key(&self) -> String {
        format!("omb-table-3.2|{}", self.url)
    }

    /// Download and reshape the workbook.
    pub fn fetch_detail(&self, http: &dyn Fetch) -> Result<BudgetTable, SourceError> {
        let bytes = http.get(&self.url)?;
        let grid = read_workbook_rows(bytes)?;
        let table = parse_outlays_grid(&grid)?;
        info!(url = %self.url, lines = table.len(), "OMB table parsed");
        Ok(table)
    }
}

/// Registry adapter exposing the OMB table as unified rows.
#[derive(Debug, Clone)]
pub struct OmbOutlays {
    pub report: OmbReport,
}

impl OmbOutlays {
    pub const NAME: &'static str = "OMB: outlays by function";

    pub fn new(report: OmbReport) -> Self {
        Self { report }
    }
}

impl SourceAdapter for OmbOutlays {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn cache_key(&self) -> String {
        format!("{}|{}", Self::NAME, self.report.url)
    }

    fn ttl(&self) -> Duration {
        self.report.ttl
    }

    fn fetch(&self, http: &dyn Fetch) -> Result<Table, SourceError> {
        Ok(self.report.fetch_detail(http)?.to_table())
    }

    fn budget_report(&self) -> Option<&OmbReport> {
        Some(&self.report)
    }
}

/// Locate the header row, keep four-digit year columns, and un-pivot.
pub fn parse_outlays_grid(grid: &[Vec<String>]) -> Result<BudgetTable, SourceError> {
    let header_idx = find_header_row(grid);
    let header = grid
        .get(header_idx)
        .ok_or_else(|| SourceError::shape(format!("sheet has no row {header_idx} to use as header")))?;

    let year_cols: Vec<(usize, i32)> = header
        .iter()
        .enumerate()
        .skip(1)
        .filter_map(|(idx, cell)| {
            let cell = cell.trim();
            if !YEAR_HEADER.is_match(cell) {
                return None;
            }
            cell.parse::<i32>().ok().map(|y| (idx, y))
        })
        .collect();

    if year_cols.is_empty() {
        return Err(SourceError::shape("header row has no four-digit year columns"));
    }

    let data: Vec<&Vec<String>> = grid[header_idx + 1..]
        .iter()
        .filter(|row| {
            year_cols
                .iter()
                .any(|(idx, _)| row.get(*idx).is_some_and(|c| !c.trim().is_empty()))
        })
        .collect();

    let mut lines = Vec::with_capacity(data.len() * year_cols.len());
    for &(idx, year) in &year_cols {
        for row in &data {
            let line = row.first().cloned().unwrap_or_default();
            let label = strip_code(&line);
            let outlays = row.get(idx).and_then(|c| parse_number(c));
            lines.push(BudgetLine {
                line,
                label,
                year,
                outlays,
            });
        }
    }

    Ok(BudgetTable { lines })
}

fn find_header_row(grid: &[Vec<String>]) -> usize {
    let found = grid.iter().take(HEADER_SCAN_ROWS).position(|row| {
        row.first()
            .is_some_and(|c| c.trim().to_lowercase().starts_with(HEADER_LABEL))
    });
    match found {
        Some(idx) => idx,
        None => {
            warn!(fallback = FALLBACK_HEADER_ROW, "OMB header row not found; using fallback");
            FALLBACK_HEADER_ROW
        }
    }
}

fn strip_code(line: &str) -> String {
    LEADING_CODE.replace(line, "").into_owned()
}
