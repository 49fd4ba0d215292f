use std::{env, fmt::Display, path::PathBuf, str::FromStr};

use anyhow::{Context, Result};

use crate::aggregate::AggregateOptions;
use crate::aggregate::views::{DEFAULT_PREVIEW_ROWS, DEFAULT_TOP_TOPICS};

/// Settings read from the environment. Command-line flags override them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardConfig {
    /// `DASHBOARD_DATA`: dataset file to load.
    pub data_path: Option<PathBuf>,
    /// `DASHBOARD_TOP_TOPICS`
    pub top_topics: usize,
    /// `DASHBOARD_PREVIEW_ROWS`
    pub preview_rows: usize,
}

impl DashboardConfig {
    pub fn load() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        Ok(Self {
            data_path: lookup("DASHBOARD_DATA").map(PathBuf::from),
            top_topics: try_load(&lookup, "DASHBOARD_TOP_TOPICS", DEFAULT_TOP_TOPICS)?,
            preview_rows: try_load(&lookup, "DASHBOARD_PREVIEW_ROWS", DEFAULT_PREVIEW_ROWS)?,
        })
    }

    pub fn aggregate_options(&self) -> AggregateOptions {
        AggregateOptions {
            top_topics: self.top_topics,
            preview_rows: self.preview_rows,
        }
    }
}

fn try_load<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr + Display,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("Invalid {key} value: {raw:?}")),
        None => {
            log::debug!("{key} not set, using default: {default}");
            Ok(default)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = DashboardConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(
            config,
            DashboardConfig {
                data_path: None,
                top_topics: 10,
                preview_rows: 5,
            }
        );
        assert_eq!(config.aggregate_options(), AggregateOptions::default());
    }

    #[test]
    fn values_are_read_from_the_environment() {
        let config = DashboardConfig::from_lookup(lookup(&[
            ("DASHBOARD_DATA", "data/jsondata.json"),
            ("DASHBOARD_TOP_TOPICS", " 3 "),
        ]))
        .unwrap();
        assert_eq!(config.data_path, Some(PathBuf::from("data/jsondata.json")));
        assert_eq!(config.top_topics, 3);
        assert_eq!(config.preview_rows, 5);
    }

    #[test]
    fn invalid_numbers_are_errors() {
        let err = DashboardConfig::from_lookup(lookup(&[("DASHBOARD_PREVIEW_ROWS", "many")]))
            .unwrap_err();
        assert!(err.to_string().contains("DASHBOARD_PREVIEW_ROWS"));
    }
}
