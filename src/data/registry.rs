//! Source Registry: stable names → adapters.
//!
//! The registry is fixed once built; adding a source means adding it to
//! [`Registry::standard`] and shipping a new build.

use crate::config::Settings;
use crate::data::adapter::SourceAdapter;
use crate::data::grapher::GrapherCsv;
use crate::data::omb::{OmbOutlays, OmbReport};
use crate::data::usaspending::AgencyObligations;
use crate::data::world_bank::WorldBankIndicator;

pub struct Registry {
    adapters: Vec<Box<dyn SourceAdapter>>,
}

impl Registry {
    /// Production sources, in display order.
    pub fn standard(settings: &Settings) -> Self {
        Self::from_adapters(vec![
            Box::new(WorldBankIndicator::military_expenditure_gdp(
                &settings.wb_countries,
                settings.start_year,
                settings.end_year,
                settings.cache_ttl,
            )),
            Box::new(GrapherCsv::un_peacekeeping(settings.cache_ttl)),
            Box::new(AgencyObligations::department_of_defense(
                settings.fy_start,
                settings.end_year,
                settings.cache_ttl,
            )),
            Box::new(OmbOutlays::new(OmbReport::new(&settings.omb_url, settings.history_ttl))),
            Box::new(GrapherCsv::owid_military_expenditure(settings.cache_ttl)),
        ])
    }

    /// Build a registry from an explicit adapter list. Later duplicates of a
    /// name are unreachable; the first registration wins.
    pub fn from_adapters(adapters: Vec<Box<dyn SourceAdapter>>) -> Self {
        Self { adapters }
    }

    pub fn get(&self, name: &str) -> Option<&dyn SourceAdapter> {
        self.adapters
            .iter()
            .find(|a| a.name() == name)
            .map(|a| a.as_ref())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn names(&self) -> Vec<&str> {
        self.adapters.iter().map(|a| a.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_registry_exposes_stable_names() {
        let registry = Registry::standard(&Settings::default());
        assert_eq!(
            registry.names(),
            vec![
                "World Bank: mil exp %GDP",
                "UN Peacekeeping: contributors",
                "USAspending: DoD obligations",
                "OMB: outlays by function",
                "OWID: military expenditure share of GDP",
            ]
        );
    }

    #[test]
    fn unknown_names_are_not_found() {
        let registry = Registry::standard(&Settings::default());
        assert!(registry.get("unknown-name").is_none());
        assert!(!registry.contains("world bank: mil exp %gdp"));
        assert!(registry.contains("World Bank: mil exp %GDP"));
    }

    #[test]
    fn cache_keys_carry_arguments() {
        let mut settings = Settings::default();
        settings.wb_countries = "USA".to_string();
        settings.start_year = 2000;
        settings.end_year = 2010;
        let registry = Registry::standard(&settings);
        let key = registry.get("World Bank: mil exp %GDP").unwrap().cache_key();
        assert!(key.contains("USA") && key.contains("2000:2010"));
    }
}
