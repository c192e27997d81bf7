//! Formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - data/selection code stays clean and testable
//! - output changes are localized (important for snapshot tests)

use crate::data::{LoadReport, SourceStatus};
use crate::domain::{Ranking, Table, TimeSeries};
use crate::io::upload::{Deployment, InstallationUpload};

/// Registered source names, one per line.
pub fn format_sources(names: &[&str]) -> String {
    let mut out = String::from("Available sources:\n");
    for name in names {
        out.push_str(&format!("  {name}\n"));
    }
    out
}

/// One line per requested source saying what it contributed.
pub fn format_outcomes(report: &LoadReport) -> String {
    let mut out = String::from("Sources:\n");
    if report.outcomes.is_empty() {
        out.push_str("  (none selected)\n");
        return out;
    }
    let width = report
        .outcomes
        .iter()
        .map(|o| o.name.chars().count())
        .max()
        .unwrap_or(0)
        .min(40);
    for o in &report.outcomes {
        let status = match &o.status {
            SourceStatus::Loaded(n) => format!("ok ({n} rows)"),
            SourceStatus::Empty => "empty".to_string(),
            SourceStatus::Failed(msg) => format!("FAILED: {}", truncate(msg, 80)),
            SourceStatus::Unknown => "unknown source".to_string(),
        };
        out.push_str(&format!("  {:<width$}  {status}\n", truncate(&o.name, 40)));
    }
    out
}

/// The first `limit` rows of a unified table.
pub fn format_table_preview(table: &Table, limit: usize) -> String {
    let mut out = String::new();
    out.push_str(&format!("Rows: {}\n", table.len()));
    push_line(
        &mut out,
        format!(
            "{:<20} {:<24} {:>6} {:<32} {:>14} {:<12}",
            "source", "country", "year", "metric", "value", "unit"
        ),
    );
    push_line(
        &mut out,
        format!(
            "{:-<20} {:-<24} {:-<6} {:-<32} {:-<14} {:-<12}",
            "", "", "", "", "", ""
        ),
    );
    for r in table.rows().iter().take(limit) {
        push_line(
            &mut out,
            format!(
                "{:<20} {:<24} {:>6} {:<32} {:>14} {:<12}",
                truncate(&r.source, 20),
                truncate(&r.country, 24),
                r.year.map(|y| y.to_string()).unwrap_or_default(),
                truncate(&r.metric, 32),
                fmt_value(r.value),
                truncate(&r.unit, 12),
            ),
        );
    }
    if table.len() > limit {
        out.push_str(&format!("... {} more rows\n", table.len() - limit));
    }
    out
}

pub fn format_series(series: &TimeSeries) -> String {
    let mut out = format!("{}\n", series.label);
    if series.is_empty() {
        out.push_str("  (no data)\n");
        return out;
    }
    push_line(&mut out, format!("{:>6} {:>16}", "year", "value"));
    push_line(&mut out, format!("{:->6} {:->16}", "", ""));
    for (year, value) in &series.points {
        push_line(&mut out, format!("{year:>6} {:>16}", fmt_value(*value)));
    }
    out
}

/// Largest first, the way a reader scans a ranking.
pub fn format_ranking(ranking: &Ranking) -> String {
    let mut out = match ranking.year {
        Some(year) => format!("{} ({year})\n", ranking.metric),
        None => format!("{}\n", ranking.metric),
    };
    if ranking.is_empty() {
        out.push_str("  (no data)\n");
        return out;
    }
    push_line(&mut out, format!("{:>4} {:<32} {:>14}", "#", "country", "value"));
    push_line(&mut out, format!("{:->4} {:-<32} {:->14}", "", "", ""));
    for (i, e) in ranking.entries.iter().rev().enumerate() {
        push_line(
            &mut out,
            format!("{:>4} {:<32} {:>14}", i + 1, truncate(&e.country, 32), fmt_value(e.value)),
        );
    }
    out
}

pub fn format_deployments(rows: &[Deployment]) -> String {
    let mut out = format!("Deployments: {} rows", rows.len());
    let unmapped = rows.iter().filter(|d| d.iso3.is_none()).count();
    if unmapped > 0 {
        out.push_str(&format!(" ({unmapped} without ISO code)"));
    }
    out.push('\n');
    push_line(&mut out, format!("{:<32} {:<5} {:>12}", "country", "iso3", "personnel"));
    push_line(&mut out, format!("{:-<32} {:-<5} {:->12}", "", "", ""));
    for d in rows {
        push_line(
            &mut out,
            format!(
                "{:<32} {:<5} {:>12}",
                truncate(&d.country, 32),
                d.iso3.as_deref().unwrap_or(""),
                d.personnel
            ),
        );
    }
    out
}

pub fn format_installations(upload: &InstallationUpload, limit: usize) -> String {
    let mut out = format!("Installations: {}\n", upload.installations.len());
    push_line(
        &mut out,
        format!("{:<32} {:>10} {:>11} {:<12}", "name", "lat", "lon", "service"),
    );
    push_line(&mut out, format!("{:-<32} {:->10} {:->11} {:-<12}", "", "", "", ""));
    for i in upload.installations.iter().take(limit) {
        push_line(
            &mut out,
            format!(
                "{:<32} {:>10.4} {:>11.4} {:<12}",
                truncate(&i.name, 32),
                i.lat,
                i.lon,
                truncate(i.service.as_deref().unwrap_or(""), 12),
            ),
        );
    }
    if upload.installations.len() > limit {
        out.push_str(&format!("... {} more\n", upload.installations.len() - limit));
    }
    if !upload.row_errors.is_empty() {
        out.push_str(&format!("Skipped rows: {}\n", upload.row_errors.len()));
        for e in &upload.row_errors {
            out.push_str(&format!("  line {}: {}\n", e.line, e.message));
        }
    }
    out
}

/// Integral values print without a fraction; everything else with two decimals.
pub fn fmt_value(v: f64) -> String {
    if v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{v:.0}")
    } else {
        format!("{v:.2}")
    }
}

fn push_line(out: &mut String, line: String) {
    out.push_str(line.trim_end());
    out.push('\n');
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out = String::new();
    for (i, ch) in s.chars().enumerate() {
        if i + 1 >= max {
            break;
        }
        out.push(ch);
    }
    out.push('.');
    out
}
