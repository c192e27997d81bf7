//! Command-line parsing for the defense data dashboard.
//!
//! The goal of this module is to keep **argument parsing** separate from data
//! loading and presentation. Source-window overrides are global so every
//! subcommand accepts them.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::data::grapher::PKO_METRIC;
use crate::data::world_bank::MILEX_GDP_METRIC;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "dash", version, about = "Defense data dashboard: budgets, expenditure, peacekeeping, deployments")]
pub struct Cli {
    /// Raise log verbosity (-v info, -vv debug). `RUST_LOG` overrides.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(flatten)]
    pub overrides: Overrides,

    #[command(subcommand)]
    pub command: Command,
}

/// Settings overrides; unset flags keep the environment/default value.
#[derive(Debug, Clone, Default, Args)]
pub struct Overrides {
    /// World Bank country selector (`all`, or `;`-separated ISO codes).
    #[arg(long, global = true)]
    pub countries: Option<String>,

    /// First calendar year for indicator sources.
    #[arg(long, global = true)]
    pub start_year: Option<i32>,

    /// Last calendar/fiscal year for all sources.
    #[arg(long, global = true)]
    pub end_year: Option<i32>,

    /// First fiscal year for obligations.
    #[arg(long, global = true)]
    pub fy_start: Option<i32>,

    /// HTTP timeout in seconds.
    #[arg(long, global = true)]
    pub timeout: Option<u64>,

    /// Budget history workbook URL.
    #[arg(long, global = true)]
    pub omb_url: Option<String>,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// List the registered source names.
    Sources,
    /// Load sources into the unified table and print (or export) it.
    Load(LoadArgs),
    /// Budget outlays for one function/subfunction code over time.
    Budget(BudgetArgs),
    /// Top-N countries for a metric in its latest year.
    Top(TopArgs),
    /// Yearly trend of a metric, optionally for one country.
    Trend(TrendArgs),
    /// Parse a deployments spreadsheet (country + personnel).
    Deployments(DeploymentArgs),
    /// Parse an installations CSV (name, lat, lon, service).
    Installations(InstallationArgs),
    /// Render every panel in one pass over a shared cache.
    Dashboard(DashboardArgs),
}

/// Which sources to load. Empty means every registered source.
#[derive(Debug, Clone, Default, Args)]
pub struct SourceSelection {
    /// Source name as listed by `dash sources` (repeatable).
    #[arg(short, long = "source", value_name = "NAME")]
    pub sources: Vec<String>,
}

#[derive(Debug, Clone, Args)]
pub struct ChartArgs {
    /// Render a terminal chart (enabled by default).
    #[arg(long, default_value_t = true)]
    pub plot: bool,

    /// Disable the terminal chart.
    #[arg(long)]
    pub no_plot: bool,

    /// Chart width (columns).
    #[arg(long, default_value_t = 72)]
    pub width: usize,

    /// Chart height (rows).
    #[arg(long, default_value_t = 16)]
    pub height: usize,
}

impl ChartArgs {
    pub fn enabled(&self) -> bool {
        self.plot && !self.no_plot
    }
}

#[derive(Debug, Clone, Args)]
pub struct LoadArgs {
    #[command(flatten)]
    pub selection: SourceSelection,

    /// Rows to preview.
    #[arg(long, default_value_t = 20)]
    pub limit: usize,

    /// Export the full unified table to CSV.
    #[arg(long)]
    pub export: Option<PathBuf>,
}

#[derive(Debug, Clone, Args)]
pub struct BudgetArgs {
    /// Classification code prefix (050 national defense, 051 DoD-Military).
    #[arg(long, default_value = "050")]
    pub prefix: String,

    #[command(flatten)]
    pub chart: ChartArgs,

    /// Export the series to CSV.
    #[arg(long)]
    pub export: Option<PathBuf>,
}

#[derive(Debug, Clone, Args)]
pub struct TopArgs {
    #[command(flatten)]
    pub selection: SourceSelection,

    /// Metric name as it appears in the unified table.
    #[arg(long, default_value = PKO_METRIC)]
    pub metric: String,

    /// Number of countries.
    #[arg(short = 'n', long, default_value_t = 15)]
    pub top: usize,

    #[command(flatten)]
    pub chart: ChartArgs,

    /// Export the ranking to CSV.
    #[arg(long)]
    pub export: Option<PathBuf>,
}

#[derive(Debug, Clone, Args)]
pub struct TrendArgs {
    #[command(flatten)]
    pub selection: SourceSelection,

    /// Metric name as it appears in the unified table.
    #[arg(long, default_value = MILEX_GDP_METRIC)]
    pub metric: String,

    /// Restrict to one country (case-insensitive).
    #[arg(long)]
    pub country: Option<String>,

    #[command(flatten)]
    pub chart: ChartArgs,

    /// Export the series to CSV.
    #[arg(long)]
    pub export: Option<PathBuf>,
}

#[derive(Debug, Clone, Args)]
pub struct DeploymentArgs {
    /// `.xlsx`, `.xls` or `.csv` file.
    #[arg(value_name = "FILE")]
    pub path: PathBuf,

    /// Number of countries in the bar chart.
    #[arg(short = 'n', long, default_value_t = 10)]
    pub top: usize,

    /// Bar chart width (columns).
    #[arg(long, default_value_t = 50)]
    pub width: usize,

    /// Export the cleaned deployments to CSV.
    #[arg(long)]
    pub export: Option<PathBuf>,
}

#[derive(Debug, Clone, Args)]
pub struct InstallationArgs {
    #[arg(value_name = "FILE")]
    pub path: PathBuf,

    /// Rows to print.
    #[arg(long, default_value_t = 50)]
    pub limit: usize,
}

#[derive(Debug, Clone, Args)]
pub struct DashboardArgs {
    /// Budget classification prefix.
    #[arg(long, default_value = "050")]
    pub prefix: String,

    /// Peacekeeping contributors to rank.
    #[arg(short = 'n', long, default_value_t = 15)]
    pub top: usize,

    /// Country for the military expenditure trend.
    #[arg(long, default_value = "United States")]
    pub country: String,

    /// Optional deployments file.
    #[arg(long)]
    pub deployments: Option<PathBuf>,

    /// Optional installations CSV.
    #[arg(long)]
    pub installations: Option<PathBuf>,

    /// Chart width (columns).
    #[arg(long, default_value_t = 72)]
    pub width: usize,

    /// Chart height (rows).
    #[arg(long, default_value_t = 12)]
    pub height: usize,
}
