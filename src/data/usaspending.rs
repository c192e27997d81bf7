//! USAspending financial balances: Department of Defense obligations per fiscal year.

use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::data::adapter::SourceAdapter;
use crate::data::http::{Fetch, get_json};
use crate::domain::{Observation, Table};
use crate::error::SourceError;

const BASE_URL: &str = "https://api.usaspending.gov/api/v2/financial_balances/agencies/";

/// Toptier agency code of the Department of Defense.
pub const DOD_TOPTIER_CODE: &str = "097";
pub const METRIC: &str = "DoD Obligations";

#[derive(Debug, Clone)]
pub struct AgencyObligations {
    pub name: String,
    pub toptier_code: String,
    pub start_fy: i32,
    pub end_fy: i32,
    pub ttl: Duration,
}

impl AgencyObligations {
    pub fn department_of_defense(start_fy: i32, end_fy: i32, ttl: Duration) -> Self {
        Self {
            name: "USAspending: DoD obligations".to_string(),
            toptier_code: DOD_TOPTIER_CODE.to_string(),
            start_fy,
            end_fy,
            ttl,
        }
    }

    pub fn url(fiscal_year: i32) -> String {
        format!("{BASE_URL}?fiscal_year={fiscal_year}")
    }

    fn fetch_year(&self, http: &dyn Fetch, fy: i32) -> Result<Option<Observation>, SourceError> {
        let body: BalancesResponse = get_json(http, &Self::url(fy))?;
        let Some(agency) = body
            .results
            .into_iter()
            .find(|r| r.toptier_code.as_deref() == Some(self.toptier_code.as_str()))
        else {
            return Ok(None);
        };

        // An absent field counts as zero; an explicit null means no usable figure.
        let value = match agency.obligations {
            Missing::Absent => 0.0,
            Missing::Null => return Ok(None),
            Missing::Value(v) => v,
        };

        Ok(Some(Observation::new(
            "USAspending",
            "United States",
            Some(fy),
            METRIC,
            value,
            "USD",
        )))
    }
}

impl SourceAdapter for AgencyObligations {
    fn name(&self) -> &str {
        &self.name
    }

    fn cache_key(&self) -> String {
        format!("{}|{}|{}:{}", self.name, self.toptier_code, self.start_fy, self.end_fy)
    }

    fn ttl(&self) -> Duration {
        self.ttl
    }

    /// One request per fiscal year; a failing year is skipped. The adapter only
    /// fails as a whole when every year failed.
    fn fetch(&self, http: &dyn Fetch) -> Result<Table, SourceError> {
        let mut table = Table::new();
        let mut last_err = None;
        let mut attempted = 0usize;
        let mut failed = 0usize;

        for fy in self.start_fy..=self.end_fy {
            attempted += 1;
            match self.fetch_year(http, fy) {
                Ok(Some(row)) => table.push(row),
                Ok(None) => debug!(fiscal_year = fy, "no matching agency record"),
                Err(e) => {
                    warn!(fiscal_year = fy, error = %e, "fiscal year skipped");
                    failed += 1;
                    last_err = Some(e);
                }
            }
        }

        if attempted > 0 && failed == attempted {
            if let Some(e) = last_err {
                return Err(e);
            }
        }

        info!(source = %self.name, rows = table.len(), "obligations fetched");
        Ok(table)
    }
}

#[derive(Debug, Deserialize)]
struct BalancesResponse {
    #[serde(default)]
    results: Vec<AgencyBalance>,
}

#[derive(Debug, Deserialize)]
struct AgencyBalance {
    #[serde(default)]
    toptier_code: Option<String>,
    #[serde(default)]
    obligations: Missing,
}

/// Distinguishes an absent field from an explicit `null`.
#[derive(Debug, Default)]
enum Missing {
    #[default]
    Absent,
    Null,
    Value(f64),
}

impl<'de> Deserialize<'de> for Missing {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match Option::<f64>::deserialize(deserializer)? {
            Some(v) if v.is_finite() => Missing::Value(v),
            _ => Missing::Null,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::http::stub::StubFetch;

    const HOUR: Duration = Duration::from_secs(3600);

    fn body(obligations: &str) -> String {
        format!(
            r#"{{"page_metadata": {{"page": 1}}, "results": [
                {{"toptier_code": "012", "obligations": 5.0}},
                {{"toptier_code": "097", "obligations": {obligations}, "budget_authority_amount": 1.0}}
            ]}}"#
        )
    }

    #[test]
    fn emits_one_row_per_year_with_a_match() {
        let fetch = StubFetch::new()
            .route("fiscal_year=2019", body("700000000000.5"))
            .route("fiscal_year=2020", r#"{"results": [{"toptier_code": "012", "obligations": 5.0}]}"#)
            .route("fiscal_year=2021", body("800000000000.0"));
        let adapter = AgencyObligations::department_of_defense(2019, 2021, HOUR);
        let table = adapter.fetch(&fetch).unwrap();

        assert_eq!(fetch.calls().len(), 3);
        let years: Vec<Option<i32>> = table.rows().iter().map(|r| r.year).collect();
        assert_eq!(years, vec![Some(2019), Some(2021)]);
        assert_eq!(table.rows()[0].metric, METRIC);
        assert_eq!(table.rows()[0].unit, "USD");
        assert!((table.rows()[1].value - 8.0e11).abs() < 1.0);
    }

    #[test]
    fn failing_years_are_skipped() {
        let fetch = StubFetch::new().route("fiscal_year=2020", body("1.0"));
        let table = AgencyObligations::department_of_defense(2019, 2021, HOUR)
            .fetch(&fetch)
            .unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.rows()[0].year, Some(2020));
    }

    #[test]
    fn absent_obligations_count_as_zero_and_null_is_skipped() {
        let fetch = StubFetch::new()
            .route("fiscal_year=2020", r#"{"results": [{"toptier_code": "097"}]}"#)
            .route("fiscal_year=2021", body("null"));
        let table = AgencyObligations::department_of_defense(2020, 2021, HOUR)
            .fetch(&fetch)
            .unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.rows()[0].value, 0.0);
    }

    #[test]
    fn every_year_failing_is_an_error() {
        let err = AgencyObligations::department_of_defense(2019, 2020, HOUR)
            .fetch(&StubFetch::new())
            .unwrap_err();
        assert!(err.is_transient());
    }
}
