//! Query parameters and the optional `shoeboard.toml` config file.
//!
//! Parameters are layered: built-in defaults, then the `[query]` table of
//! the config file, then whatever the caller (usually the CLI) overrides.
//! Each layer is a [`QueryOverrides`] applied on top of the previous
//! [`QueryParams`].
//!
//! # Config file format (`shoeboard.toml`)
//!
//! ```toml
//! [data]
//! path = "marathon_shoe_data.json"
//!
//! [query]
//! events = ["厦门马拉松", "上海马拉松"]
//! min_year = 2022
//! max_year = 2025
//! cohort = "elite"
//! aggregate_events = true
//! selected_brands = ["乔丹", "特步"]
//! focus_brand = "乔丹"
//! top_n = 20
//! ```

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::dataset::{Cohort, Dataset, UnknownCohort};
use crate::filter::{Filter, YearRange};
use crate::rank::LEADERBOARD_SIZE;

/// File name looked up by [`Config::discover`].
pub const CONFIG_FILE_NAME: &str = "shoeboard.toml";

/// Brand whose rank trajectory gets its own panel unless overridden.
pub const DEFAULT_FOCUS_BRAND: &str = "乔丹";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Toml(#[from] toml::de::Error),
    #[error(transparent)]
    Cohort(#[from] UnknownCohort),
    #[error("year range {min}..={max} is empty after clamping")]
    InvertedYears { min: i32, max: i32 },
}

/// Everything a dashboard query needs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryParams {
    /// `None` selects every event in the dataset.
    pub events: Option<BTreeSet<String>>,
    pub years: YearRange,
    pub cohort: Cohort,
    pub aggregate_events: bool,
    /// `None` derives a default selection from the filtered data.
    pub selected_brands: Option<Vec<String>>,
    pub focus_brand: String,
    pub top_n: usize,
}

impl Default for QueryParams {
    fn default() -> Self {
        Self {
            events: None,
            years: YearRange::default(),
            cohort: Cohort::General,
            aggregate_events: true,
            selected_brands: None,
            focus_brand: DEFAULT_FOCUS_BRAND.to_string(),
            top_n: LEADERBOARD_SIZE,
        }
    }
}

impl QueryParams {
    /// Build the row filter for `dataset`.
    pub fn filter(&self, dataset: &Dataset) -> Filter {
        match &self.events {
            Some(events) => Filter::new(events.clone(), self.years, self.cohort),
            None => Filter::all_events(dataset, self.years, self.cohort),
        }
    }
}

/// A partial set of query parameters. Unset fields leave the base value
/// untouched.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct QueryOverrides {
    pub events: Option<Vec<String>>,
    pub min_year: Option<i32>,
    pub max_year: Option<i32>,
    pub cohort: Option<String>,
    pub aggregate_events: Option<bool>,
    pub selected_brands: Option<Vec<String>>,
    pub focus_brand: Option<String>,
    pub top_n: Option<usize>,
}

impl QueryOverrides {
    pub fn apply(&self, base: QueryParams) -> Result<QueryParams, ConfigError> {
        let mut params = base;

        if let Some(ref events) = self.events {
            params.events = Some(events.iter().cloned().collect());
        }
        if self.min_year.is_some() || self.max_year.is_some() {
            let min = self.min_year.unwrap_or(params.years.min());
            let max = self.max_year.unwrap_or(params.years.max());
            params.years =
                YearRange::clamped(min, max).ok_or(ConfigError::InvertedYears { min, max })?;
        }
        if let Some(ref cohort) = self.cohort {
            params.cohort = cohort.parse()?;
        }
        if let Some(aggregate) = self.aggregate_events {
            params.aggregate_events = aggregate;
        }
        if let Some(ref brands) = self.selected_brands {
            params.selected_brands = Some(brands.clone());
        }
        if let Some(ref focus) = self.focus_brand {
            params.focus_brand = focus.clone();
        }
        if let Some(top_n) = self.top_n {
            params.top_n = top_n;
        }

        Ok(params)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DataSection {
    pub path: Option<PathBuf>,
}

/// Parsed `shoeboard.toml`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub data: DataSection,
    #[serde(default)]
    pub query: QueryOverrides,
}

impl Config {
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::parse(&text)?;
        // Relative data paths resolve against the config file's directory.
        if let (Some(data), Some(dir)) = (config.data.path.as_mut(), path.parent()) {
            if data.is_relative() {
                *data = dir.join(&*data);
            }
        }
        Ok(config)
    }

    /// Load `dir/shoeboard.toml` if it exists.
    pub fn discover(dir: &Path) -> Result<Option<Self>, ConfigError> {
        let candidate = dir.join(CONFIG_FILE_NAME);
        if candidate.is_file() {
            Self::load(&candidate).map(Some)
        } else {
            Ok(None)
        }
    }

    /// Defaults with this file's `[query]` table applied.
    pub fn query_params(&self) -> Result<QueryParams, ConfigError> {
        self.query.apply(QueryParams::default())
    }
}
