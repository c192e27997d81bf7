//! Spreadsheet and CSV bytes → string grids.
//!
//! Everything downstream (header detection, column matching, numeric coercion)
//! works on plain strings, so workbooks and CSV files share one code path.

use std::io::Cursor;

use calamine::{Data, Reader, open_workbook_auto_from_rs};

use crate::data::columns::normalize_header;
use crate::error::SourceError;

/// A header row plus data rows, all as strings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Frame {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Frame {
    /// Use row `header_idx` of `grid` as headers and everything below as data.
    pub fn from_grid(mut grid: Vec<Vec<String>>, header_idx: usize) -> Option<Self> {
        if header_idx >= grid.len() {
            return None;
        }
        let rows = grid.split_off(header_idx + 1);
        let headers = grid.pop()?;
        Some(Self { headers, rows })
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<&str> {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .map(|c| c.trim())
            .filter(|c| !c.is_empty())
    }

    /// Index of the first header equal (case-insensitively) to `name`.
    pub fn column(&self, name: &str) -> Option<usize> {
        let name = normalize_header(name);
        self.headers.iter().position(|h| normalize_header(h) == name)
    }
}

/// Read the first worksheet of an `.xls`/`.xlsx`/`.ods` workbook.
pub fn read_workbook_rows(bytes: Vec<u8>) -> Result<Vec<Vec<String>>, SourceError> {
    let mut workbook =
        open_workbook_auto_from_rs(Cursor::new(bytes)).map_err(|e| SourceError::Workbook(e.to_string()))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| SourceError::Workbook("workbook has no sheets".to_string()))?
        .map_err(|e| SourceError::Workbook(e.to_string()))?;

    Ok(range
        .rows()
        .map(|row| row.iter().map(render_cell).collect())
        .collect())
}

/// Read CSV bytes into rows (header row included).
pub fn read_csv_rows(bytes: &[u8]) -> Result<Vec<Vec<String>>, SourceError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(bytes);

    let mut rows: Vec<Vec<String>> = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| SourceError::Shape(format!("CSV parse error: {e}")))?;
        rows.push(record.iter().map(str::to_string).collect());
    }

    if let Some(first) = rows.first_mut().and_then(|r| r.first_mut()) {
        *first = first.trim_start_matches('\u{feff}').to_string();
    }

    Ok(rows)
}

/// Read CSV bytes into a [`Frame`] using the first row as headers.
pub fn read_csv_frame(bytes: &[u8]) -> Result<Frame, SourceError> {
    let rows = read_csv_rows(bytes)?;
    Frame::from_grid(rows, 0).ok_or_else(|| SourceError::shape("CSV has no header row"))
}

fn render_cell(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => render_float(*f),
        Data::Bool(b) => b.to_string(),
        other => other.to_string(),
    }
}

/// Integral floats render without a fraction so year headers read "1962", not "1962.0".
fn render_float(f: f64) -> String {
    if f.is_finite() && f.fract() == 0.0 && f.abs() < 1e15 {
        format!("{}", f as i64)
    } else {
        f.to_string()
    }
}
