//! Runtime settings.
//!
//! Settings come from the environment (a `.env` file is honored via `dotenvy`),
//! and CLI flags override individual fields afterwards. Parsing is split from the
//! environment lookup so tests never have to mutate process state.

use std::time::Duration;

use chrono::{Datelike, Local};

use crate::error::AppError;

pub const DEFAULT_USER_AGENT: &str = concat!("defense-dash/", env!("CARGO_PKG_VERSION"));
pub const DEFAULT_OMB_URL: &str =
    "https://obamawhitehouse.archives.gov/sites/default/files/omb/budget/fy2016/assets/hist03z2.xls";

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub user_agent: String,
    pub timeout: Duration,
    /// Cache window for indicator and report sources.
    pub cache_ttl: Duration,
    /// Cache window for the large historical budget table.
    pub history_ttl: Duration,
    /// World Bank country selector (`all`, or `;`-separated ISO codes).
    pub wb_countries: String,
    pub start_year: i32,
    pub end_year: i32,
    pub fy_start: i32,
    pub omb_url: String,
}

impl Default for Settings {
    fn default() -> Self {
        let current_year = Local::now().year();
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: Duration::from_secs(30),
            cache_ttl: Duration::from_secs(60 * 60),
            history_ttl: Duration::from_secs(24 * 60 * 60),
            wb_countries: "all".to_string(),
            start_year: 1990,
            end_year: current_year,
            fy_start: 2016,
            omb_url: DEFAULT_OMB_URL.to_string(),
        }
    }
}

impl Settings {
    /// Load settings from the process environment (and `.env`).
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from an arbitrary key lookup; unset keys keep defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let mut s = Self::default();

        if let Some(v) = lookup("DASH_USER_AGENT").filter(|v| !v.trim().is_empty()) {
            s.user_agent = v.trim().to_string();
        }
        if let Some(v) = lookup("DASH_TIMEOUT_SECS") {
            s.timeout = Duration::from_secs(parse_u64("DASH_TIMEOUT_SECS", &v)?);
        }
        if let Some(v) = lookup("DASH_CACHE_TTL_SECS") {
            s.cache_ttl = Duration::from_secs(parse_u64("DASH_CACHE_TTL_SECS", &v)?);
        }
        if let Some(v) = lookup("DASH_HISTORY_TTL_SECS") {
            s.history_ttl = Duration::from_secs(parse_u64("DASH_HISTORY_TTL_SECS", &v)?);
        }
        if let Some(v) = lookup("DASH_WB_COUNTRIES").filter(|v| !v.trim().is_empty()) {
            s.wb_countries = v.trim().to_string();
        }
        if let Some(v) = lookup("DASH_START_YEAR") {
            s.start_year = parse_year("DASH_START_YEAR", &v)?;
        }
        if let Some(v) = lookup("DASH_END_YEAR") {
            s.end_year = parse_year("DASH_END_YEAR", &v)?;
        }
        if let Some(v) = lookup("DASH_FY_START") {
            s.fy_start = parse_year("DASH_FY_START", &v)?;
        }
        if let Some(v) = lookup("DASH_OMB_URL").filter(|v| !v.trim().is_empty()) {
            s.omb_url = v.trim().to_string();
        }

        s.validate()?;
        Ok(s)
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.timeout.is_zero() {
            return Err(AppError::new(2, "Timeout must be > 0 seconds."));
        }
        if self.start_year > self.end_year {
            return Err(AppError::new(
                2,
                format!(
                    "Invalid year range: start {} is after end {}.",
                    self.start_year, self.end_year
                ),
            ));
        }
        if self.fy_start > self.end_year {
            return Err(AppError::new(
                2,
                format!(
                    "Invalid fiscal year range: start {} is after end {}.",
                    self.fy_start, self.end_year
                ),
            ));
        }
        Ok(())
    }
}

fn parse_u64(key: &str, raw: &str) -> Result<u64, AppError> {
    raw.trim()
        .parse::<u64>()
        .map_err(|_| AppError::new(2, format!("Invalid {key} '{raw}': expected a whole number.")))
}

fn parse_year(key: &str, raw: &str) -> Result<i32, AppError> {
    raw.trim()
        .parse::<i32>()
        .ok()
        .filter(|y| (1900..=2200).contains(y))
        .ok_or_else(|| AppError::new(2, format!("Invalid {key} '{raw}': expected a four-digit year.")))
}
