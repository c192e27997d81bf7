//! CSV exports with drifting column names (UN Peacekeeping, OWID grapher).
//!
//! Columns are resolved through [`crate::data::columns`]; rows are summed per
//! (country, year) because contribution files are reported monthly and per
//! mission.

use std::collections::BTreeMap;
use std::time::Duration;

use tracing::info;

use crate::data::adapter::SourceAdapter;
use crate::data::columns::{ColumnSpec, find_column, last_numeric_column};
use crate::data::http::Fetch;
use crate::domain::{Observation, Table, coerce_year, parse_number};
use crate::error::SourceError;
use crate::io::sheet::{Frame, read_csv_frame};

pub const PKO_CSV_URL: &str =
    "https://peacekeeping.un.org/sites/default/files/mission_contributions_by_country_month_0.csv";
pub const OWID_MILEX_URL: &str = "https://ourworldindata.org/grapher/military-expenditure-share-gdp.csv";

pub const PKO_METRIC: &str = "Troops contributed to UN PKO";

const COUNTRY_COLUMN: ColumnSpec = ColumnSpec::fuzzy(&["country", "entity", "contributor"], &["code"]);
const YEAR_COLUMN: ColumnSpec = ColumnSpec::exact(&["year", "fiscal year", "calendar year"]);

/// One CSV source and how to read its value column.
#[derive(Debug, Clone)]
pub struct GrapherCsv {
    pub name: String,
    pub source: String,
    pub url: String,
    pub metric: String,
    pub unit: String,
    pub value_column: ColumnSpec,
    pub ttl: Duration,
}

impl GrapherCsv {
    pub fn un_peacekeeping(ttl: Duration) -> Self {
        Self {
            name: "UN Peacekeeping: contributors".to_string(),
            source: "UN Peacekeeping".to_string(),
            url: PKO_CSV_URL.to_string(),
            metric: PKO_METRIC.to_string(),
            unit: "personnel".to_string(),
            value_column: ColumnSpec::fuzzy(&["troops", "troop"], &["police"]),
            ttl,
        }
    }

    pub fn owid_military_expenditure(ttl: Duration) -> Self {
        Self {
            name: "OWID: military expenditure share of GDP".to_string(),
            source: "Our World in Data".to_string(),
            url: OWID_MILEX_URL.to_string(),
            metric: "Military Expenditure (% GDP, SIPRI)".to_string(),
            unit: "percent".to_string(),
            value_column: ColumnSpec::fuzzy(&["military expenditure", "milex", "value"], &[]),
            ttl,
        }
    }

    /// Reshape an already-downloaded CSV body.
    pub fn parse(&self, body: &[u8]) -> Result<Table, SourceError> {
        let frame = read_csv_frame(body)?;
        self.reshape(&frame)
    }

    fn reshape(&self, frame: &Frame) -> Result<Table, SourceError> {
        if frame.headers.is_empty() {
            return Err(SourceError::shape(format!("{}: CSV has no columns", self.name)));
        }

        let country_idx = find_column(&frame.headers, &COUNTRY_COLUMN).unwrap_or(0);
        let year_idx = find_column(&frame.headers, &YEAR_COLUMN)
            .ok_or_else(|| SourceError::shape(format!("{}: no year column", self.name)))?;
        let value_idx = find_column(&frame.headers, &self.value_column)
            .or_else(|| last_numeric_column(&frame.headers, &frame.rows, &[country_idx, year_idx]))
            .ok_or_else(|| SourceError::shape(format!("{}: no numeric value column", self.name)))?;

        // (country, year) -> sum of present values; None when every value was missing.
        let mut groups: BTreeMap<(String, i32), Option<f64>> = BTreeMap::new();
        for row in 0..frame.rows.len() {
            let Some(country) = frame.cell(row, country_idx) else {
                continue;
            };
            let Some(year) = frame.cell(row, year_idx).and_then(coerce_year) else {
                continue;
            };
            let value = frame.cell(row, value_idx).and_then(parse_number);
            let slot = groups.entry((country.to_string(), year)).or_insert(None);
            if let Some(v) = value {
                *slot = Some(slot.unwrap_or(0.0) + v);
            }
        }

        Ok(groups
            .into_iter()
            .filter_map(|((country, year), sum)| {
                Some(Observation::new(
                    self.source.as_str(),
                    country,
                    Some(year),
                    self.metric.as_str(),
                    sum?,
                    self.unit.as_str(),
                ))
            })
            .collect())
    }
}

impl SourceAdapter for GrapherCsv {
    fn name(&self) -> &str {
        &self.name
    }

    fn cache_key(&self) -> String {
        format!("{}|{}", self.name, self.url)
    }

    fn ttl(&self) -> Duration {
        self.ttl
    }

    fn fetch(&self, http: &dyn Fetch) -> Result<Table, SourceError> {
        let body = http.get(&self.url)?;
        let table = self.parse(&body)?;
        info!(source = %self.name, rows = table.len(), "CSV source reshaped");
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::http::stub::StubFetch;

    const HOUR: Duration = Duration::from_secs(3600);

    const PKO_CSV: &str = "\
Contributing_Country,Mission_Acronym,Year,Month,Individual Police,Formed Police Units,Troops,Staff Officers
Nepal,UNIFIL,2020,1,0,0,870,12
Nepal,UNMISS,2020,1,10,0,1700,20
Nepal,UNIFIL,2021,1,0,0,880,12
Ghana,UNIFIL,2020,2,5,0,,3
Ghana,UNIFIL,2021,2,5,0,870,3
,UNIFIL,2021,2,5,0,99,3
Rwanda,UNMISS,n/a,2,5,0,99,3
";

    #[test]
    fn troops_are_summed_per_country_and_year() {
        let table = GrapherCsv::un_peacekeeping(HOUR).parse(PKO_CSV.as_bytes()).unwrap();
        let rows: Vec<(&str, Option<i32>, f64)> = table
            .rows()
            .iter()
            .map(|r| (r.country.as_str(), r.year, r.value))
            .collect();
        // Ghana 2020 has only a missing troop value and is dropped; blank country
        // and non-numeric year rows never form groups.
        assert_eq!(
            rows,
            vec![
                ("Ghana", Some(2021), 870.0),
                ("Nepal", Some(2020), 2570.0),
                ("Nepal", Some(2021), 880.0),
            ]
        );
        assert!(table.rows().iter().all(|r| r.metric == PKO_METRIC && r.unit == "personnel"));
    }

    #[test]
    fn grapher_export_uses_entity_and_value_columns() {
        let csv = "Entity,Code,Year,Military expenditure (% of GDP)\nFrance,FRA,2022,1.9\nWorld,OWID_WRL,2022,2.2\n";
        let table = GrapherCsv::owid_military_expenditure(HOUR).parse(csv.as_bytes()).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows()[0].country, "France");
        assert!((table.rows()[0].value - 1.9).abs() < 1e-12);
    }

    #[test]
    fn value_falls_back_to_last_numeric_column() {
        let csv = "Name,Year,Count,Remark\nFiji,2019,10,ok\nFiji,2019,5,ok\n";
        let table = GrapherCsv::un_peacekeeping(HOUR).parse(csv.as_bytes()).unwrap();
        // "Name" is not a country candidate, so the first column is used.
        assert_eq!(table.rows()[0].country, "Fiji");
        assert!((table.rows()[0].value - 15.0).abs() < 1e-12);
    }

    #[test]
    fn missing_year_column_is_a_shape_error() {
        let csv = "Country,Troops\nNepal,5\n";
        let err = GrapherCsv::un_peacekeeping(HOUR).parse(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, SourceError::Shape(_)));
    }

    #[test]
    fn http_status_errors_surface_from_fetch() {
        let fetch = StubFetch::new().status("peacekeeping.un.org", 503);
        let err = GrapherCsv::un_peacekeeping(HOUR).fetch(&fetch).unwrap_err();
        assert!(matches!(err, SourceError::Status { status: 503, .. }));
    }
}
