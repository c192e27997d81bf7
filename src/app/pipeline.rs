//! Shared loading logic used by every subcommand.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! settings -> transport -> registry -> aggregator -> derived series
//!
//! The subcommands can then focus on presentation (tables, charts, exports).

use tracing::{info, warn};

use crate::config::Settings;
use crate::data::grapher::PKO_METRIC;
use crate::data::world_bank::MILEX_GDP_METRIC;
use crate::data::{Aggregator, Fetch, HttpFetcher, LoadReport, OmbReport, Registry};
use crate::domain::{Ranking, TimeSeries};
use crate::error::AppError;
use crate::io::upload::{Deployment, InstallationUpload, load_deployments, load_installations};
use crate::series::{metric_series, prefix_series, top_n_latest_year};

/// One aggregator (and its cache) plus the settings it was built from.
pub struct Session {
    pub settings: Settings,
    pub aggregator: Aggregator,
}

impl Session {
    /// Build a session that talks to the real upstream services.
    pub fn connect(settings: Settings) -> Result<Self, AppError> {
        let http = HttpFetcher::new(&settings)?;
        Ok(Self::with_fetcher(settings, Box::new(http)))
    }

    pub fn with_fetcher(settings: Settings, http: Box<dyn Fetch>) -> Self {
        let registry = Registry::standard(&settings);
        Self {
            aggregator: Aggregator::new(registry, http),
            settings,
        }
    }

    /// Resolve a user selection; empty means every registered source.
    pub fn selection(&self, requested: &[String]) -> Vec<String> {
        if requested.is_empty() {
            return self
                .aggregator
                .registry()
                .names()
                .into_iter()
                .map(str::to_string)
                .collect();
        }
        for name in requested {
            if !self.aggregator.registry().contains(name) {
                warn!(source = %name, "not a registered source; see `dash sources`");
            }
        }
        requested.to_vec()
    }

    pub fn load(&mut self, requested: &[String]) -> LoadReport {
        let names = self.selection(requested);
        let report = self.aggregator.load_report(&names);
        info!(rows = report.table.len(), sources = names.len(), "unified table loaded");
        report
    }

    /// Budget outlays for `prefix`. Unlike the unified load, a failure here is
    /// fatal because the command has nothing else to show.
    pub fn budget_series(&mut self, prefix: &str) -> Result<TimeSeries, AppError> {
        let report = OmbReport::new(&self.settings.omb_url, self.settings.history_ttl);
        let table = self
            .aggregator
            .budget_table(&report)
            .map_err(|e| AppError::new(4, format!("Could not fetch budget table: {e}")))?;
        Ok(prefix_series(&table, prefix))
    }
}

/// Everything the dashboard renders in one cycle.
#[derive(Debug, Clone)]
pub struct DashboardOutput {
    pub load: LoadReport,
    /// Budget series, or the reason it could not be fetched.
    pub budget: Result<TimeSeries, String>,
    pub peacekeeping: Ranking,
    pub expenditure: TimeSeries,
    pub deployments: Option<Result<Vec<Deployment>, String>>,
    pub installations: Option<Result<InstallationUpload, String>>,
}

#[derive(Debug, Clone, Default)]
pub struct DashboardRequest<'a> {
    pub prefix: &'a str,
    pub top: usize,
    pub country: &'a str,
    pub deployments: Option<&'a std::path::Path>,
    pub installations: Option<&'a std::path::Path>,
}

/// Build every panel. Panel failures are captured, never propagated.
pub fn build_dashboard(session: &mut Session, req: &DashboardRequest<'_>) -> DashboardOutput {
    let load = session.load(&[]);
    let budget = session.budget_series(req.prefix).map_err(|e| e.message().to_string());
    let peacekeeping = top_n_latest_year(&load.table, PKO_METRIC, req.top);
    let expenditure = metric_series(&load.table, MILEX_GDP_METRIC, Some(req.country));

    let deployments = req
        .deployments
        .map(|p| load_deployments(p).map_err(|e| e.message().to_string()));
    let installations = req
        .installations
        .map(|p| load_installations(p).map_err(|e| e.message().to_string()));

    DashboardOutput {
        load,
        budget,
        peacekeeping,
        expenditure,
        deployments,
        installations,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::http::stub::StubFetch;
    use crate::data::omb::fixtures::outlays_workbook;

    fn settings() -> Settings {
        Settings {
            start_year: 2020,
            end_year: 2021,
            fy_start: 2021,
            ..Settings::default()
        }
    }

    #[test]
    fn empty_selection_means_all_sources() {
        let session = Session::with_fetcher(settings(), Box::new(StubFetch::new()));
        assert_eq!(session.selection(&[]).len(), 5);
        assert_eq!(session.selection(&["x".to_string()]), vec!["x"]);
    }

    #[test]
    fn budget_failure_is_a_runtime_error() {
        let mut session = Session::with_fetcher(settings(), Box::new(StubFetch::new()));
        let err = session.budget_series("050").unwrap_err();
        assert_eq!(err.exit_code(), 4);
    }

    #[test]
    fn dashboard_survives_every_source_failing() {
        let mut session = Session::with_fetcher(settings(), Box::new(StubFetch::new()));
        let out = build_dashboard(
            &mut session,
            &DashboardRequest {
                prefix: "050",
                top: 15,
                country: "United States",
                ..DashboardRequest::default()
            },
        );
        assert!(out.load.table.is_empty());
        assert!(out.budget.is_err());
        assert!(out.peacekeeping.is_empty());
        assert!(out.expenditure.is_empty());
        assert!(out.deployments.is_none());
    }

    #[test]
    fn dashboard_panels_use_the_shared_table() {
        let wb = r#"[{"page": 1}, [
            {"country": {"value": "United States"}, "date": "2021", "value": 3.5},
            {"country": {"value": "United States"}, "date": "2020", "value": 3.7},
            {"country": {"value": "France"}, "date": "2021", "value": 1.9}
        ]]"#;
        let pko = "Country,Year,Troops\nNepal,2021,5000\nFiji,2021,300\nNepal,2020,9000\n";
        let fetch = StubFetch::new()
            .route("api.worldbank.org", wb)
            .route("peacekeeping.un.org", pko);
        let mut session = Session::with_fetcher(settings(), Box::new(fetch));

        let out = build_dashboard(
            &mut session,
            &DashboardRequest {
                prefix: "051",
                top: 1,
                country: "united states",
                deployments: Some(std::path::Path::new("/nonexistent/dep.csv")),
                installations: None,
            },
        );
        assert_eq!(out.peacekeeping.entries.len(), 1);
        assert_eq!(out.peacekeeping.entries[0].country, "Nepal");
        assert_eq!(out.expenditure.points, vec![(2020, 3.7), (2021, 3.5)]);
        assert!(matches!(out.deployments, Some(Err(_))));
    }

    #[test]
    fn dashboard_downloads_budget_workbook_once() {
        let fetch = StubFetch::new().route("hist03z2", outlays_workbook());
        let log = fetch.call_log();
        let mut session = Session::with_fetcher(settings(), Box::new(fetch));

        let out = build_dashboard(
            &mut session,
            &DashboardRequest {
                prefix: "051",
                top: 5,
                country: "United States",
                ..DashboardRequest::default()
            },
        );
        let budget = out.budget.unwrap();
        assert_eq!(budget.points, vec![(2019, 654_000.0), (2020, 690_420.5)]);
        assert!(out.load.table.rows().iter().any(|r| r.source == "OMB"));

        let omb_calls = log.borrow().iter().filter(|url| url.contains("hist03z2")).count();
        assert_eq!(omb_calls, 1);
    }
}
