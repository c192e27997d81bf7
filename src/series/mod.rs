//! Derived-series selection: slices of a table shaped for one chart.
//!
//! All selectors return an empty series rather than an error when nothing
//! matches; charts downstream render empty input as "no data".

use std::collections::BTreeMap;

use crate::data::omb::BudgetTable;
use crate::domain::{RankedEntry, Ranking, Table, TimeSeries};

/// Sum outlays of every line whose code starts with `prefix`, per year.
///
/// A line matches when its trimmed text starts with `prefix` followed by a
/// space, so `"051"` matches `"051 Department of Defense-Military"` but neither
/// `"0510 ..."` nor `"052 ..."`. Missing outlays count as zero.
pub fn prefix_series(table: &BudgetTable, prefix: &str) -> TimeSeries {
    let prefix = prefix.trim();
    let needle = format!("{prefix} ");

    let mut by_year: BTreeMap<i32, f64> = BTreeMap::new();
    let mut label: Option<&str> = None;

    for line in &table.lines {
        if !line.line.trim().starts_with(&needle) {
            continue;
        }
        if label.is_none() {
            label = Some(line.label.trim().trim_end_matches(':'));
        }
        *by_year.entry(line.year).or_insert(0.0) += line.outlays.unwrap_or(0.0);
    }

    let label = match label.filter(|l| !l.is_empty()) {
        Some(l) => format!("{l} ({prefix}*)"),
        None => format!("({prefix}*)"),
    };

    TimeSeries {
        label,
        points: by_year.into_iter().collect(),
    }
}

/// The `n` largest values of `metric` in the latest year present.
///
/// Entries come back ascending by value so the largest bar is drawn last.
/// Rows without a year are ignored when picking the latest year.
pub fn top_n_latest_year(table: &Table, metric: &str, n: usize) -> Ranking {
    let rows = table.filter_metric(metric);
    let Some(year) = rows.latest_year() else {
        return Ranking::empty(metric);
    };

    let mut latest: Vec<_> = rows.rows().iter().filter(|r| r.year == Some(year)).collect();
    latest.sort_by(|a, b| b.value.partial_cmp(&a.value).unwrap_or(std::cmp::Ordering::Equal));
    latest.truncate(n);
    latest.reverse();

    Ranking {
        metric: metric.to_string(),
        year: Some(year),
        unit: latest.first().map(|r| r.unit.clone()).unwrap_or_default(),
        entries: latest
            .into_iter()
            .map(|r| RankedEntry {
                country: r.country.clone(),
                value: r.value,
            })
            .collect(),
    }
}

/// Yearly totals of `metric`, optionally restricted to one country
/// (case-insensitive). Rows without a year are skipped.
pub fn metric_series(table: &Table, metric: &str, country: Option<&str>) -> TimeSeries {
    let mut by_year: BTreeMap<i32, f64> = BTreeMap::new();
    for r in table.rows() {
        if r.metric != metric {
            continue;
        }
        if let Some(c) = country {
            if !r.country.trim().eq_ignore_ascii_case(c.trim()) {
                continue;
            }
        }
        let Some(year) = r.year else { continue };
        *by_year.entry(year).or_insert(0.0) += r.value;
    }

    let label = match country {
        Some(c) => format!("{metric} ({})", c.trim()),
        None => metric.to_string(),
    };

    TimeSeries {
        label,
        points: by_year.into_iter().collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::omb::BudgetLine;
    use crate::domain::Observation;

    fn budget(lines: &[(&str, i32, Option<f64>)]) -> BudgetTable {
        BudgetTable {
            lines: lines
                .iter()
                .map(|(line, year, outlays)| BudgetLine {
                    line: line.to_string(),
                    label: line.trim().split_once(' ').map(|(_, l)| l.to_string()).unwrap_or_default(),
                    year: *year,
                    outlays: *outlays,
                })
                .collect(),
        }
    }

    #[test]
    fn prefix_selects_only_matching_lines() {
        let table = budget(&[
            ("051 Department of Defense", 2020, Some(100.0)),
            ("052 Other", 2020, Some(50.0)),
        ]);
        let s = prefix_series(&table, "051");
        assert_eq!(s.points, vec![(2020, 100.0)]);
        assert_eq!(s.label, "Department of Defense (051*)");
    }

    #[test]
    fn prefix_sums_per_year_and_sorts_ascending() {
        let table = budget(&[
            ("  050 National defense:", 2021, Some(10.0)),
            ("050 National defense:", 2020, Some(5.0)),
            ("050 National defense:", 2020, None),
            ("0501 Not a match", 2020, Some(1000.0)),
            ("050 National defense:", 2019, Some(1.0)),
        ]);
        let s = prefix_series(&table, "050");
        assert_eq!(s.points, vec![(2019, 1.0), (2020, 5.0), (2021, 10.0)]);
        assert_eq!(s.label, "National defense (050*)");
    }

    #[test]
    fn prefix_without_matches_is_empty() {
        let table = budget(&[("051 DoD", 2020, Some(1.0))]);
        let s = prefix_series(&table, "999");
        assert!(s.is_empty());
        assert_eq!(s.label, "(999*)");
    }

    fn pko(country: &str, year: i32, value: f64) -> Observation {
        Observation::new("UN Peacekeeping", country, Some(year), "Troops contributed to UN PKO", value, "personnel")
    }

    #[test]
    fn top_n_uses_latest_year_only_sorted_ascending() {
        let table = Table::from_rows(vec![
            pko("Nepal", 2019, 9000.0),
            pko("Nepal", 2020, 5000.0),
            pko("India", 2020, 6000.0),
            pko("Fiji", 2020, 300.0),
            Observation::new("World Bank", "Nepal", Some(2021), "Other metric", 1.0, "percent"),
        ]);
        let r = top_n_latest_year(&table, "Troops contributed to UN PKO", 2);
        assert_eq!(r.year, Some(2020));
        assert_eq!(r.unit, "personnel");
        let got: Vec<(&str, f64)> = r.entries.iter().map(|e| (e.country.as_str(), e.value)).collect();
        assert_eq!(got, vec![("Nepal", 5000.0), ("India", 6000.0)]);
    }

    #[test]
    fn top_n_with_unknown_metric_is_empty() {
        let table = Table::from_rows(vec![pko("Nepal", 2020, 1.0)]);
        let r = top_n_latest_year(&table, "nope", 5);
        assert!(r.is_empty());
        assert_eq!(r.year, None);
    }

    #[test]
    fn top_n_larger_than_available_returns_all() {
        let table = Table::from_rows(vec![pko("Nepal", 2020, 2.0), pko("Fiji", 2020, 1.0)]);
        let r = top_n_latest_year(&table, "Troops contributed to UN PKO", 30);
        assert_eq!(r.entries.len(), 2);
        assert_eq!(r.entries[1].country, "Nepal");
    }

    #[test]
    fn metric_series_filters_country_and_sums_by_year() {
        let table = Table::from_rows(vec![
            pko("Nepal", 2020, 1.0),
            pko("nepal", 2020, 2.0),
            pko("Nepal", 2019, 4.0),
            pko("Fiji", 2020, 8.0),
            Observation::new("UN Peacekeeping", "Nepal", None, "Troops contributed to UN PKO", 16.0, "personnel"),
        ]);
        let s = metric_series(&table, "Troops contributed to UN PKO", Some("Nepal"));
        assert_eq!(s.points, vec![(2019, 4.0), (2020, 3.0)]);

        let all = metric_series(&table, "Troops contributed to UN PKO", None);
        assert_eq!(all.points, vec![(2019, 4.0), (2020, 11.0)]);
    }
}
