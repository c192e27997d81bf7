//! Header resolution for sources whose column names drift between releases.
//!
//! Policy (shared by source adapters and the upload converters):
//!
//! 1. an exact, case-insensitive match against each candidate in priority order
//! 2. a substring match against each candidate in priority order, skipping
//!    headers that contain an excluded word
//! 3. a positional fallback chosen by the caller (first column, last numeric
//!    column), or "not found"

use crate::domain::parse_number;

/// An ordered list of header candidates for one logical column.
#[derive(Debug, Clone, Copy)]
pub struct ColumnSpec {
    pub candidates: &'static [&'static str],
    /// Headers containing any of these words never match in the substring pass.
    pub exclude: &'static [&'static str],
    /// Whether the substring pass runs at all.
    pub substring: bool,
}

impl ColumnSpec {
    pub const fn exact(candidates: &'static [&'static str]) -> Self {
        Self {
            candidates,
            exclude: &[],
            substring: false,
        }
    }

    pub const fn fuzzy(candidates: &'static [&'static str], exclude: &'static [&'static str]) -> Self {
        Self {
            candidates,
            exclude,
            substring: true,
        }
    }
}

pub fn normalize_header(name: &str) -> String {
    name.trim().trim_start_matches('\u{feff}').trim().to_lowercase()
}

/// Resolve `column` against `headers`, returning the column index.
pub fn find_column(headers: &[String], column: &ColumnSpec) -> Option<usize> {
    let normalized: Vec<String> = headers.iter().map(|h| normalize_header(h)).collect();

    for cand in column.candidates {
        if let Some(idx) = normalized.iter().position(|h| h == cand) {
            return Some(idx);
        }
    }

    if !column.substring {
        return None;
    }

    for cand in column.candidates {
        let found = normalized.iter().position(|h| {
            h.contains(cand) && !column.exclude.iter().any(|word| h.contains(word))
        });
        if found.is_some() {
            return found;
        }
    }

    None
}

/// `true` when every non-empty cell of column `idx` parses as a number and at
/// least one cell is non-empty.
pub fn is_numeric_column(rows: &[Vec<String>], idx: usize) -> bool {
    let mut seen = false;
    for row in rows {
        let Some(cell) = row.get(idx).map(|c| c.trim()) else {
            continue;
        };
        if cell.is_empty() {
            continue;
        }
        if parse_number(cell).is_none() {
            return false;
        }
        seen = true;
    }
    seen
}

/// Last numeric column not listed in `skip`.
pub fn last_numeric_column(headers: &[String], rows: &[Vec<String>], skip: &[usize]) -> Option<usize> {
    (0..headers.len())
        .rev()
        .filter(|idx| !skip.contains(idx))
        .find(|&idx| is_numeric_column(rows, idx))
}

/// First numeric column not listed in `skip`.
pub fn first_numeric_column(headers: &[String], rows: &[Vec<String>], skip: &[usize]) -> Option<usize> {
    (0..headers.len())
        .filter(|idx| !skip.contains(idx))
        .find(|&idx| is_numeric_column(rows, idx))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn exact_match_beats_substring_and_follows_priority() {
        let h = headers(&["Contributing Country", "Country", "Year"]);
        let col = ColumnSpec::fuzzy(&["country", "entity"], &[]);
        assert_eq!(find_column(&h, &col), Some(1));

        let h = headers(&["Entity", "Country Code"]);
        let col = ColumnSpec::fuzzy(&["entity", "country"], &[]);
        assert_eq!(find_column(&h, &col), Some(0));
    }

    #[test]
    fn substring_pass_honors_exclusions() {
        let h = headers(&["Country", "Individual Police", "Formed Police Units", "Troops Total"]);
        let col = ColumnSpec::fuzzy(&["troops", "troop"], &["police"]);
        assert_eq!(find_column(&h, &col), Some(3));
    }

    #[test]
    fn exact_specs_skip_the_substring_pass() {
        let h = headers(&["Fiscal Year"]);
        assert_eq!(find_column(&h, &ColumnSpec::exact(&["year"])), None);
        assert_eq!(find_column(&h, &ColumnSpec::fuzzy(&["year"], &[])), Some(0));
    }

    #[test]
    fn headers_are_trimmed_and_bom_stripped() {
        let h = headers(&["\u{feff}Country ", " YEAR"]);
        assert_eq!(find_column(&h, &ColumnSpec::exact(&["country"])), Some(0));
        assert_eq!(find_column(&h, &ColumnSpec::exact(&["year"])), Some(1));
    }

    #[test]
    fn numeric_column_fallbacks() {
        let h = headers(&["Country", "Code", "Troops", "Notes"]);
        let rows = vec![
            vec!["Nepal".into(), "NPL".into(), "5,000".into(), "".into()],
            vec!["Ghana".into(), "GHA".into(), "".into(), "".into()],
        ];
        assert_eq!(last_numeric_column(&h, &rows, &[0]), Some(2));
        assert_eq!(first_numeric_column(&h, &rows, &[0]), Some(2));
        assert_eq!(last_numeric_column(&h, &rows, &[0, 2]), None);
    }
}
