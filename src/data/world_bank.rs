//! World Bank indicator API: military expenditure as a share of GDP.

use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;
use tracing::info;

use crate::data::adapter::SourceAdapter;
use crate::data::http::{Fetch, get_json};
use crate::domain::{Observation, Table, coerce_year};
use crate::error::SourceError;

const BASE_URL: &str = "https://api.worldbank.org/v2/country";
const PER_PAGE: u32 = 20_000;

pub const MILEX_GDP_CODE: &str = "MS.MIL.XPND.GD.ZS";
pub const SOURCE: &str = "World Bank";
pub const MILEX_GDP_METRIC: &str = "Military Expenditure (% GDP)";

#[derive(Debug, Clone)]
pub struct WorldBankIndicator {
    pub name: String,
    pub code: String,
    pub metric: String,
    pub unit: String,
    /// `all`, or `;`-separated ISO codes.
    pub countries: String,
    pub start: i32,
    pub end: i32,
    pub ttl: Duration,
}

impl WorldBankIndicator {
    pub fn military_expenditure_gdp(countries: &str, start: i32, end: i32, ttl: Duration) -> Self {
        Self {
            name: "World Bank: mil exp %GDP".to_string(),
            code: MILEX_GDP_CODE.to_string(),
            metric: MILEX_GDP_METRIC.to_string(),
            unit: "percent".to_string(),
            countries: countries.to_string(),
            start,
            end,
            ttl,
        }
    }

    pub fn url(&self) -> String {
        format!(
            "{BASE_URL}/{}/indicator/{}?format=json&per_page={PER_PAGE}&date={}:{}",
            self.countries, self.code, self.start, self.end
        )
    }
}

impl SourceAdapter for WorldBankIndicator {
    fn name(&self) -> &str {
        &self.name
    }

    fn cache_key(&self) -> String {
        format!("{}|{}|{}|{}:{}", self.name, self.code, self.countries, self.start, self.end)
    }

    fn ttl(&self) -> Duration {
        self.ttl
    }

    fn fetch(&self, http: &dyn Fetch) -> Result<Table, SourceError> {
        let body: Value = get_json(http, &self.url())?;
        let table = parse_indicator_response(body, &self.metric, &self.unit)?;
        info!(source = %self.name, rows = table.len(), "indicator fetched");
        Ok(table)
    }
}

#[derive(Debug, Deserialize)]
struct IndicatorRecord {
    value: Option<f64>,
    country: Labelled,
    date: String,
}

#[derive(Debug, Deserialize)]
struct Labelled {
    value: String,
}

/// Reshape an indicator response: `[paging, [records...]]`.
///
/// The API answers errors with a one-element `[{"message": [...]}]` envelope,
/// which is reported as a shape error. A `null` record list means "no data".
pub fn parse_indicator_response(body: Value, metric: &str, unit: &str) -> Result<Table, SourceError> {
    let Value::Array(mut parts) = body else {
        return Err(SourceError::shape("indicator response is not a JSON array"));
    };
    if parts.len() < 2 {
        return Err(SourceError::shape(format!(
            "indicator response has {} element(s), expected 2",
            parts.len()
        )));
    }

    let records = parts.swap_remove(1);
    if records.is_null() {
        return Ok(Table::new());
    }
    let records: Vec<IndicatorRecord> = serde_json::from_value(records)
        .map_err(|e| SourceError::shape(format!("indicator records: {e}")))?;

    Ok(records
        .into_iter()
        .filter_map(|rec| {
            let value = rec.value.filter(|v| v.is_finite())?;
            Some(Observation::new(
                SOURCE,
                rec.country.value,
                coerce_year(&rec.date),
                metric,
                value,
                unit,
            ))
        })
        .collect())
}
