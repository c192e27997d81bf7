//! User-supplied deployment and installation files.
//!
//! These converters sit beside the source adapters rather than inside them: the
//! user hands over a file path, and a bad file is an input error (exit code 2)
//! instead of a degraded source.

use std::fs;
use std::path::Path;

use serde::Serialize;
use tracing::debug;

use crate::data::columns::{ColumnSpec, find_column, first_numeric_column, normalize_header};
use crate::domain::parse_number;
use crate::error::AppError;
use crate::io::countries::to_iso3;
use crate::io::sheet::{Frame, read_csv_rows, read_workbook_rows};

const DEPLOYMENT_COUNTRY: ColumnSpec =
    ColumnSpec::exact(&["country", "location", "country/territory", "duty location"]);

/// One row of a troop-deployment upload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Deployment {
    pub country: String,
    pub personnel: i64,
    pub iso3: Option<String>,
}

/// One row of an installations upload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Installation {
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    pub service: Option<String>,
}

/// A row-level error encountered while reading an upload.
#[derive(Debug, Clone, PartialEq)]
pub struct RowError {
    pub line: usize,
    pub message: String,
}

#[derive(Debug, Clone, Default)]
pub struct InstallationUpload {
    pub installations: Vec<Installation>,
    pub row_errors: Vec<RowError>,
}

/// Load a deployment table from `.xlsx`/`.xls` or CSV.
pub fn load_deployments(path: &Path) -> Result<Vec<Deployment>, AppError> {
    let frame = read_frame(path)?;
    parse_deployments(&frame)
        .map_err(|e| AppError::new(2, format!("Deployment file '{}': {e}", path.display())))
}

/// Resolve the country and personnel columns of `frame` and convert each row.
///
/// Country falls back to the first column. Personnel is the first numeric
/// column other than country, else the last column with values coerced.
/// Rows whose personnel cell does not parse as a number are dropped.
pub fn parse_deployments(frame: &Frame) -> Result<Vec<Deployment>, String> {
    if frame.headers.is_empty() {
        return Err("no header row".to_string());
    }

    let country_idx = find_column(&frame.headers, &DEPLOYMENT_COUNTRY).unwrap_or(0);
    let personnel_idx = first_numeric_column(&frame.headers, &frame.rows, &[country_idx])
        .unwrap_or(frame.headers.len() - 1);
    if personnel_idx == country_idx {
        return Err("need a country column and a personnel column".to_string());
    }

    let mut out = Vec::new();
    for row in 0..frame.rows.len() {
        let (Some(country), Some(raw)) = (frame.cell(row, country_idx), frame.cell(row, personnel_idx)) else {
            continue;
        };
        let Some(personnel) = parse_number(raw) else {
            continue;
        };
        out.push(Deployment {
            country: country.to_string(),
            personnel: personnel.trunc() as i64,
            iso3: to_iso3(country).map(str::to_string),
        });
    }

    debug!(rows = out.len(), unmapped = out.iter().filter(|d| d.iso3.is_none()).count(), "deployments parsed");
    Ok(out)
}

/// Load an installations CSV with at least `name`, `lat` and `lon` columns.
pub fn load_installations(path: &Path) -> Result<InstallationUpload, AppError> {
    let frame = read_frame(path)?;
    parse_installations(&frame)
}

pub fn parse_installations(frame: &Frame) -> Result<InstallationUpload, AppError> {
    let name_idx = renamed_column(&frame.headers, &["name", "installation", "base"]);
    let lat_idx = renamed_column(&frame.headers, &["lat", "latitude"]);
    let lon_idx = renamed_column(&frame.headers, &["lon", "lng", "longitude"]);
    let service_idx = renamed_column(&frame.headers, &["service", "branch"]);

    let (Some(name_idx), Some(lat_idx), Some(lon_idx)) = (name_idx, lat_idx, lon_idx) else {
        return Err(AppError::new(2, "Installations CSV must have at least: name, lat, lon"));
    };

    let mut upload = InstallationUpload::default();
    for row in 0..frame.rows.len() {
        // +2: one header line, 1-based lines
        let line = row + 2;
        let Some(name) = frame.cell(row, name_idx) else {
            upload.row_errors.push(RowError {
                line,
                message: "Missing installation name.".to_string(),
            });
            continue;
        };
        let coords = (
            frame.cell(row, lat_idx).and_then(parse_number),
            frame.cell(row, lon_idx).and_then(parse_number),
        );
        let (Some(lat), Some(lon)) = coords else {
            upload.row_errors.push(RowError {
                line,
                message: format!("Invalid coordinates for '{name}'."),
            });
            continue;
        };
        upload.installations.push(Installation {
            name: name.to_string(),
            lat,
            lon,
            service: service_idx.and_then(|i| frame.cell(row, i)).map(str::to_string),
        });
    }
    Ok(upload)
}

/// The `n` largest deployments, descending by personnel.
pub fn top_deployments(rows: &[Deployment], n: usize) -> Vec<Deployment> {
    let mut sorted = rows.to_vec();
    sorted.sort_by(|a, b| b.personnel.cmp(&a.personnel));
    sorted.truncate(n);
    sorted
}

fn renamed_column(headers: &[String], names: &[&str]) -> Option<usize> {
    headers.iter().position(|h| names.contains(&normalize_header(h).as_str()))
}

fn read_frame(path: &Path) -> Result<Frame, AppError> {
    let bytes = fs::read(path)
        .map_err(|e| AppError::new(2, format!("Failed to open '{}': {e}", path.display())))?;

    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    let grid = match ext.as_str() {
        "xlsx" | "xls" => read_workbook_rows(bytes),
        _ => read_csv_rows(&bytes),
    }
    .map_err(|e| AppError::new(2, format!("Failed to read '{}': {e}", path.display())))?;

    Frame::from_grid(grid, 0).ok_or_else(|| AppError::new(2, format!("'{}' is empty", path.display())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::sheet::read_csv_frame;

    fn frame(csv: &str) -> Frame {
        read_csv_frame(csv.as_bytes()).unwrap()
    }

    #[test]
    fn deployments_resolve_columns_and_iso3() {
        let rows = parse_deployments(&frame(
            "Country,Personnel\nGermany,35000\n\"Korea, South\",28500\nJapan,54000.9\n",
        ))
        .unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].iso3.as_deref(), Some("DEU"));
        assert_eq!(rows[1].iso3.as_deref(), Some("KOR"));
        assert_eq!(rows[2].personnel, 54000);
    }

    #[test]
    fn deployments_drop_empty_and_non_numeric_rows() {
        let rows = parse_deployments(&frame(
            "Location,Branch,Troops\nItaly,Army,12000\n,Navy,5\nSpain,Navy,\nAfloat,Navy,n/a\n",
        ))
        .unwrap();
        // "n/a" makes the troops column non-numeric, so it is the last-column fallback
        let got: Vec<(&str, i64)> = rows.iter().map(|d| (d.country.as_str(), d.personnel)).collect();
        assert_eq!(got, vec![("Italy", 12000)]);
    }

    #[test]
    fn classified_personnel_rows_are_dropped() {
        let rows = parse_deployments(&frame("Country,Personnel\nItaly,12000\nAfloat,classified\n")).unwrap();
        let got: Vec<(&str, i64)> = rows.iter().map(|d| (d.country.as_str(), d.personnel)).collect();
        assert_eq!(got, vec![("Italy", 12000)]);
    }

    #[test]
    fn deployments_fall_back_to_first_column_for_country() {
        let rows = parse_deployments(&frame("Host,Strength\nQatar,8000\n")).unwrap();
        assert_eq!(rows[0].country, "Qatar");
        assert_eq!(rows[0].personnel, 8000);
    }

    #[test]
    fn single_column_file_is_rejected() {
        assert!(parse_deployments(&frame("Country\nQatar\n")).is_err());
    }

    #[test]
    fn top_deployments_sorts_descending() {
        let rows = parse_deployments(&frame("Country,Personnel\nA,1\nB,3\nC,2\n")).unwrap();
        let top: Vec<String> = top_deployments(&rows, 2).into_iter().map(|d| d.country).collect();
        assert_eq!(top, vec!["B", "C"]);
    }

    #[test]
    fn installations_rename_headers_and_report_bad_rows() {
        let upload = parse_installations(&frame(
            "Base,Latitude,Lng,Branch\nRamstein,49.43,7.6,Air Force\nBad,north,7.0,Army\nYokosuka,35.28,139.67,\n",
        ))
        .unwrap();
        assert_eq!(upload.installations.len(), 2);
        assert_eq!(upload.installations[0].service.as_deref(), Some("Air Force"));
        assert_eq!(upload.installations[1].service, None);
        assert_eq!(upload.row_errors.len(), 1);
        assert_eq!(upload.row_errors[0].line, 3);
    }

    #[test]
    fn installations_require_name_lat_lon() {
        let err = parse_installations(&frame("name,lat\nX,1\n")).unwrap_err();
        assert_eq!(err.exit_code(), 2);
        assert_eq!(err.message(), "Installations CSV must have at least: name, lat, lon");
    }

    #[test]
    fn missing_file_is_an_input_error() {
        let err = load_deployments(Path::new("/nonexistent/deployments.csv")).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }
}
