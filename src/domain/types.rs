//! Shared domain types.
//!
//! Every source adapter normalizes into [`Observation`] rows collected in a
//! [`Table`]. Derived chart inputs ([`TimeSeries`], [`Ranking`]) are projections
//! of a table and are recomputed per chart.

use serde::{Deserialize, Serialize};

/// One normalized observation: the canonical six-field row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// Human-readable provider name, e.g. "World Bank".
    pub source: String,
    /// Entity name as given by the provider (not harmonized across providers).
    pub country: String,
    /// Calendar or fiscal year.
    pub year: Option<i32>,
    /// Human-readable indicator name.
    pub metric: String,
    pub value: f64,
    /// Unit label, e.g. "percent", "USD", "personnel".
    pub unit: String,
}

impl Observation {
    pub fn new(
        source: impl Into<String>,
        country: impl Into<String>,
        year: Option<i32>,
        metric: impl Into<String>,
        value: f64,
        unit: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            country: country.into(),
            year,
            metric: metric.into(),
            value,
            unit: unit.into(),
        }
    }
}

/// An ordered, column-homogeneous collection of observations.
///
/// Duplicate `(source, country, year, metric)` tuples are kept as-is; upstream
/// revisions are not reconciled.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    rows: Vec<Observation>,
}

impl Table {
    /// Canonical column set, present even when the table has no rows.
    pub const COLUMNS: [&'static str; 6] = ["source", "country", "year", "metric", "value", "unit"];

    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_rows(rows: Vec<Observation>) -> Self {
        Self { rows }
    }

    pub fn columns(&self) -> &'static [&'static str] {
        &Self::COLUMNS
    }

    pub fn push(&mut self, row: Observation) {
        self.rows.push(row);
    }

    pub fn extend(&mut self, other: Table) {
        self.rows.extend(other.rows);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[Observation] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<Observation> {
        self.rows
    }

    pub fn retain(&mut self, keep: impl FnMut(&Observation) -> bool) {
        self.rows.retain(keep);
    }

    /// Rows whose metric equals `metric` (exact match).
    pub fn filter_metric(&self, metric: &str) -> Table {
        self.filter(|r| r.metric == metric)
    }

    /// Rows whose source equals `source` (exact match).
    pub fn filter_source(&self, source: &str) -> Table {
        self.filter(|r| r.source == source)
    }

    pub fn filter(&self, mut keep: impl FnMut(&Observation) -> bool) -> Table {
        Table {
            rows: self.rows.iter().filter(|r| keep(r)).cloned().collect(),
        }
    }

    /// Distinct metrics in first-seen order.
    pub fn metrics(&self) -> Vec<&str> {
        distinct(self.rows.iter().map(|r| r.metric.as_str()))
    }

    /// Distinct sources in first-seen order.
    pub fn sources(&self) -> Vec<&str> {
        distinct(self.rows.iter().map(|r| r.source.as_str()))
    }

    pub fn latest_year(&self) -> Option<i32> {
        self.rows.iter().filter_map(|r| r.year).max()
    }
}

impl FromIterator<Observation> for Table {
    fn from_iter<I: IntoIterator<Item = Observation>>(iter: I) -> Self {
        Self {
            rows: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for Table {
    type Item = Observation;
    type IntoIter = std::vec::IntoIter<Observation>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.into_iter()
    }
}

fn distinct<'a>(values: impl Iterator<Item = &'a str>) -> Vec<&'a str> {
    let mut out: Vec<&str> = Vec::new();
    for v in values {
        if !out.contains(&v) {
            out.push(v);
        }
    }
    out
}

/// A year-indexed series ready for a line chart.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TimeSeries {
    pub label: String,
    /// `(year, value)` pairs, ascending by year.
    pub points: Vec<(i32, f64)>,
}

impl TimeSeries {
    pub fn empty(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            points: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// One bar of a [`Ranking`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedEntry {
    pub country: String,
    pub value: f64,
}

/// Top-N entities for one metric in a single year, for a horizontal bar chart.
///
/// Entries are sorted ascending by value so the largest renders last (on top).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Ranking {
    pub metric: String,
    pub year: Option<i32>,
    pub unit: String,
    pub entries: Vec<RankedEntry>,
}

impl Ranking {
    pub fn empty(metric: impl Into<String>) -> Self {
        Self {
            metric: metric.into(),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Coerce a raw year cell to an integer.
///
/// Accepts surrounding whitespace and integral decimal renderings ("2020.0"),
/// which is how spreadsheet exports commonly store years. Anything else is `None`.
pub fn coerce_year(raw: &str) -> Option<i32> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(y) = trimmed.parse::<i32>() {
        return Some(y);
    }
    let f = trimmed.parse::<f64>().ok()?;
    if f.is_finite() && f.fract() == 0.0 && f.abs() < i32::MAX as f64 {
        Some(f as i32)
    } else {
        None
    }
}

/// Coerce a raw numeric cell to a finite float.
///
/// Thousands separators are stripped. Placeholder cells used by statistical
/// publications (`.`, `..`, `-`, `n/a`) parse as `None`.
pub fn parse_number(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.chars().all(|c| matches!(c, '.' | '-' | '…')) {
        return None;
    }
    let cleaned: String = trimmed.chars().filter(|c| *c != ',' && *c != '_').collect();
    let v = cleaned.parse::<f64>().ok()?;
    if v.is_finite() { Some(v) } else { None }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_table_keeps_canonical_columns() {
        let table = Table::new();
        assert!(table.is_empty());
        assert_eq!(table.columns(), &["source", "country", "year", "metric", "value", "unit"]);
    }

    #[test]
    fn coerce_year_accepts_integral_floats() {
        assert_eq!(coerce_year("2020"), Some(2020));
        assert_eq!(coerce_year(" 1999 "), Some(1999));
        assert_eq!(coerce_year("2020.0"), Some(2020));
        assert_eq!(coerce_year("2020.5"), None);
        assert_eq!(coerce_year("TQ"), None);
        assert_eq!(coerce_year(""), None);
    }

    #[test]
    fn parse_number_handles_placeholders_and_separators() {
        assert_eq!(parse_number("1,234.5"), Some(1234.5));
        assert_eq!(parse_number(" 42 "), Some(42.0));
        assert_eq!(parse_number(".........."), None);
        assert_eq!(parse_number("-"), None);
        assert_eq!(parse_number("-3"), Some(-3.0));
        assert_eq!(parse_number("NaN"), None);
        assert_eq!(parse_number("abc"), None);
    }

    #[test]
    fn metrics_are_distinct_in_first_seen_order() {
        let table = Table::from_rows(vec![
            Observation::new("A", "X", Some(2020), "m2", 1.0, "u"),
            Observation::new("A", "Y", Some(2020), "m1", 1.0, "u"),
            Observation::new("B", "X", Some(2021), "m2", 1.0, "u"),
        ]);
        assert_eq!(table.metrics(), vec!["m2", "m1"]);
        assert_eq!(table.sources(), vec!["A", "B"]);
        assert_eq!(table.latest_year(), Some(2021));
    }
}
