//! Export tables, series and deployments to CSV.
//!
//! The export is meant to be easy to consume in spreadsheets or downstream scripts.
//! A header row is always written, even for empty input.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::domain::{Ranking, Table, TimeSeries};
use crate::error::AppError;
use crate::io::upload::Deployment;

/// Unified rows in canonical column order. Missing years are empty cells.
pub fn table_to_csv<W: Write>(table: &Table, out: W) -> csv::Result<()> {
    let mut w = csv::WriterBuilder::new().has_headers(false).from_writer(out);
    w.write_record(table.columns())?;
    for r in table.rows() {
        w.serialize(r)?;
    }
    w.flush()?;
    Ok(())
}

pub fn deployments_to_csv<W: Write>(rows: &[Deployment], out: W) -> csv::Result<()> {
    let mut w = csv::WriterBuilder::new().has_headers(false).from_writer(out);
    w.write_record(["country", "personnel", "iso3"])?;
    for d in rows {
        w.serialize(d)?;
    }
    w.flush()?;
    Ok(())
}

pub fn series_to_csv<W: Write>(series: &TimeSeries, out: W) -> csv::Result<()> {
    let mut w = csv::Writer::from_writer(out);
    w.write_record(["year", "value"])?;
    for (year, value) in &series.points {
        w.write_record([year.to_string(), value.to_string()])?;
    }
    w.flush()?;
    Ok(())
}

pub fn ranking_to_csv<W: Write>(ranking: &Ranking, out: W) -> csv::Result<()> {
    let mut w = csv::Writer::from_writer(out);
    w.write_record(["country", "year", "value", "unit"])?;
    let year = ranking.year.map(|y| y.to_string()).unwrap_or_default();
    // Largest first on disk; the in-memory order is chart order.
    for e in ranking.entries.iter().rev() {
        let value = e.value.to_string();
        w.write_record([e.country.as_str(), year.as_str(), value.as_str(), ranking.unit.as_str()])?;
    }
    w.flush()?;
    Ok(())
}

/// Write any of the exporters above to `path`.
pub fn write_csv_file<F>(path: &Path, export: F) -> Result<(), AppError>
where
    F: FnOnce(File) -> csv::Result<()>,
{
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create export CSV '{}': {e}", path.display())))?;
    export(file).map_err(|e| AppError::new(2, format!("Failed to write export CSV '{}': {e}", path.display())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Observation, RankedEntry};
    use crate::io::sheet::read_csv_frame;
    use crate::io::upload::parse_deployments;

    fn render(f: impl FnOnce(&mut Vec<u8>) -> csv::Result<()>) -> String {
        let mut buf = Vec::new();
        f(&mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn empty_table_still_has_header() {
        let out = render(|b| table_to_csv(&Table::new(), b));
        assert_eq!(out, "source,country,year,metric,value,unit\n");
    }

    #[test]
    fn table_rows_follow_canonical_columns() {
        let table = Table::from_rows(vec![
            Observation::new("World Bank", "France", Some(2022), "Military Expenditure (% GDP)", 1.9, "percent"),
            Observation::new("OMB", "United States", None, "050 National defense", 10.0, "USD millions"),
        ]);
        let out = render(|b| table_to_csv(&table, b));
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[1], "World Bank,France,2022,Military Expenditure (% GDP),1.9,percent");
        assert_eq!(lines[2], "OMB,United States,,050 National defense,10.0,USD millions");
    }

    #[test]
    fn deployments_round_trip_preserves_country_and_personnel() {
        let input = "Country,Personnel\nGermany,35000\n\"Korea, South\",28500\nAtlantis,7\n";
        let original = parse_deployments(&read_csv_frame(input.as_bytes()).unwrap()).unwrap();

        let out = render(|b| deployments_to_csv(&original, b));
        let again = parse_deployments(&read_csv_frame(out.as_bytes()).unwrap()).unwrap();

        let pairs = |rows: &[Deployment]| -> Vec<(String, i64)> {
            rows.iter().map(|d| (d.country.clone(), d.personnel)).collect()
        };
        assert_eq!(pairs(&original), pairs(&again));
        assert!(out.contains("Atlantis,7,\n"));
    }

    #[test]
    fn series_and_ranking_exports() {
        let series = TimeSeries {
            label: "x".into(),
            points: vec![(2020, 1.5), (2021, 2.0)],
        };
        assert_eq!(render(|b| series_to_csv(&series, b)), "year,value\n2020,1.5\n2021,2\n");

        let ranking = Ranking {
            metric: "troops".into(),
            year: Some(2020),
            unit: "personnel".into(),
            entries: vec![
                RankedEntry { country: "Fiji".into(), value: 300.0 },
                RankedEntry { country: "Nepal".into(), value: 5000.0 },
            ],
        };
        let out = render(|b| ranking_to_csv(&ranking, b));
        assert_eq!(out, "country,year,value,unit\nNepal,2020,5000,personnel\nFiji,2020,300,personnel\n");
    }
}
