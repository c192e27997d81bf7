//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments and resolves settings
//! - loads sources through one shared aggregator
//! - prints reports/charts
//! - writes optional exports

use clap::Parser;

use crate::cli::{
    BudgetArgs, Cli, Command, DashboardArgs, DeploymentArgs, InstallationArgs, LoadArgs, Overrides, TopArgs,
    TrendArgs,
};
use crate::config::Settings;
use crate::data::{LoadReport, Registry};
use crate::domain::{RankedEntry, Ranking};
use crate::error::AppError;
use crate::io::export::{deployments_to_csv, ranking_to_csv, series_to_csv, table_to_csv, write_csv_file};
use crate::io::upload::{Deployment, load_deployments, load_installations, top_deployments};
use crate::plot::{render_bar_chart, render_line_chart};
use crate::report;
use crate::series::{metric_series, top_n_latest_year};

pub mod pipeline;

use pipeline::{DashboardRequest, Session, build_dashboard};

/// Entry point for the `dash` binary.
pub fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    crate::logging::init(cli.verbose);

    let settings = settings_from(&cli.overrides)?;

    match cli.command {
        Command::Sources => handle_sources(settings),
        Command::Load(args) => handle_load(settings, args),
        Command::Budget(args) => handle_budget(settings, args),
        Command::Top(args) => handle_top(settings, args),
        Command::Trend(args) => handle_trend(settings, args),
        Command::Deployments(args) => handle_deployments(args),
        Command::Installations(args) => handle_installations(args),
        Command::Dashboard(args) => handle_dashboard(settings, args),
    }
}

/// Environment settings with CLI overrides applied, then re-validated.
pub fn settings_from(overrides: &Overrides) -> Result<Settings, AppError> {
    let mut settings = Settings::from_env()?;
    apply_overrides(&mut settings, overrides);
    settings.validate()?;
    Ok(settings)
}

pub fn apply_overrides(settings: &mut Settings, o: &Overrides) {
    if let Some(c) = o.countries.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
        settings.wb_countries = c.to_string();
    }
    if let Some(y) = o.start_year {
        settings.start_year = y;
    }
    if let Some(y) = o.end_year {
        settings.end_year = y;
    }
    if let Some(y) = o.fy_start {
        settings.fy_start = y;
    }
    if let Some(secs) = o.timeout {
        settings.timeout = std::time::Duration::from_secs(secs);
    }
    if let Some(url) = o.omb_url.as_deref().map(str::trim).filter(|u| !u.is_empty()) {
        settings.omb_url = url.to_string();
    }
}

fn handle_sources(settings: Settings) -> Result<(), AppError> {
    let registry = Registry::standard(&settings);
    print!("{}", report::format_sources(&registry.names()));
    Ok(())
}

fn handle_load(settings: Settings, args: LoadArgs) -> Result<(), AppError> {
    let mut session = Session::connect(settings)?;
    let load = session.load(&args.selection.sources);

    println!("{}", report::format_outcomes(&load));
    print!("{}", report::format_table_preview(&load.table, args.limit));

    if let Some(path) = &args.export {
        write_csv_file(path, |f| table_to_csv(&load.table, f))?;
    }
    Ok(())
}

fn handle_budget(settings: Settings, args: BudgetArgs) -> Result<(), AppError> {
    let mut session = Session::connect(settings)?;
    let series = session.budget_series(&args.prefix)?;

    if args.chart.enabled() {
        println!("{}", render_line_chart(&series, args.chart.width, args.chart.height));
    }
    print!("{}", report::format_series(&series));

    if let Some(path) = &args.export {
        write_csv_file(path, |f| series_to_csv(&series, f))?;
    }
    Ok(())
}

fn handle_top(settings: Settings, args: TopArgs) -> Result<(), AppError> {
    let mut session = Session::connect(settings)?;
    let load = session.load(&args.selection.sources);
    let ranking = top_n_latest_year(&load.table, &args.metric, args.top);

    print_failures(&load);
    if args.chart.enabled() {
        println!("{}", render_bar_chart(&ranking, args.chart.width));
    }
    print!("{}", report::format_ranking(&ranking));

    if let Some(path) = &args.export {
        write_csv_file(path, |f| ranking_to_csv(&ranking, f))?;
    }
    Ok(())
}

fn handle_trend(settings: Settings, args: TrendArgs) -> Result<(), AppError> {
    let mut session = Session::connect(settings)?;
    let load = session.load(&args.selection.sources);
    let series = metric_series(&load.table, &args.metric, args.country.as_deref());

    print_failures(&load);
    if args.chart.enabled() {
        println!("{}", render_line_chart(&series, args.chart.width, args.chart.height));
    }
    print!("{}", report::format_series(&series));

    if let Some(path) = &args.export {
        write_csv_file(path, |f| series_to_csv(&series, f))?;
    }
    Ok(())
}

fn handle_deployments(args: DeploymentArgs) -> Result<(), AppError> {
    let rows = load_deployments(&args.path)?;
    let top = top_deployments(&rows, args.top);

    println!("{}", render_bar_chart(&deployment_ranking(&top), args.width));
    print!("{}", report::format_deployments(&rows));

    if let Some(path) = &args.export {
        write_csv_file(path, |f| deployments_to_csv(&rows, f))?;
    }
    Ok(())
}

fn handle_installations(args: InstallationArgs) -> Result<(), AppError> {
    let upload = load_installations(&args.path)?;
    print!("{}", report::format_installations(&upload, args.limit));
    Ok(())
}

fn handle_dashboard(settings: Settings, args: DashboardArgs) -> Result<(), AppError> {
    let mut session = Session::connect(settings)?;
    let out = build_dashboard(
        &mut session,
        &DashboardRequest {
            prefix: &args.prefix,
            top: args.top,
            country: &args.country,
            deployments: args.deployments.as_deref(),
            installations: args.installations.as_deref(),
        },
    );

    println!("=== Defense data dashboard ===\n");
    println!("{}", report::format_outcomes(&out.load));

    println!("1) Budget outlays");
    match &out.budget {
        Ok(series) => println!("{}", render_line_chart(series, args.width, args.height)),
        Err(e) => println!("{e}\n"),
    }

    println!("2) Peacekeeping contributors");
    println!("{}", render_bar_chart(&out.peacekeeping, args.width));

    println!("3) Military expenditure");
    println!("{}", render_line_chart(&out.expenditure, args.width, args.height));

    if let Some(deployments) = &out.deployments {
        println!("4) Deployments");
        match deployments {
            Ok(rows) => {
                let top = top_deployments(rows, args.top);
                println!("{}", render_bar_chart(&deployment_ranking(&top), args.width));
            }
            Err(e) => println!("Could not parse the deployments file: {e}\n"),
        }
    }

    if let Some(installations) = &out.installations {
        println!("5) Installations");
        match installations {
            Ok(upload) => print!("{}", report::format_installations(upload, 50)),
            Err(e) => println!("Could not parse the installations file: {e}"),
        }
    }
    Ok(())
}

fn print_failures(load: &LoadReport) {
    if load.failed().next().is_some() {
        println!("{}", report::format_outcomes(load));
    }
}

/// Deployments as a chart-ready ranking (ascending, largest drawn on top).
fn deployment_ranking(top: &[Deployment]) -> Ranking {
    let mut ranking = Ranking {
        metric: "Personnel by country".to_string(),
        year: None,
        unit: "personnel".to_string(),
        entries: top
            .iter()
            .map(|d| RankedEntry {
                country: d.country.clone(),
                value: d.personnel as f64,
            })
            .collect(),
    };
    ranking.entries.reverse();
    ranking
}
