//! Serializable analysis configuration.
//!
//! Stored as TOML; every field has a default so an empty file (or no file)
//! gives the stock analysis of `data/amazon_sales.csv` into `graphs/`.

use std::path::{Path, PathBuf};

use salescope_core::data::{AnomalyPolicy, LoadOptions};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::aggregator::AggregateOptions;

/// Upper bound for `price_bins` and `chart_top_k`.
pub const MAX_CHART_ITEMS: usize = 10_000;

/// Errors from loading or validating a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config value for '{field}': {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Everything needed to reproduce one analysis run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalysisConfig {
    /// Dataset path.
    pub input: PathBuf,

    /// Directory for charts and `summary.json`.
    pub output_dir: PathBuf,

    /// Single ASCII field delimiter.
    pub delimiter: String,

    /// Products listed in the "most reviewed" report section.
    pub top_n: usize,

    /// Bars per chart and categories per report table.
    pub chart_top_k: usize,

    /// Buckets in the price histogram.
    pub price_bins: usize,

    /// Multiplier from the dataset currency to the display currency.
    pub conversion_rate: f64,

    pub currency_symbol: String,

    pub anomaly_policy: AnomalyPolicy,

    pub render_charts: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::from("data/amazon_sales.csv"),
            output_dir: PathBuf::from("graphs"),
            delimiter: ",".into(),
            top_n: 5,
            chart_top_k: 15,
            price_bins: 50,
            // INR → EUR
            conversion_rate: 0.011,
            currency_symbol: "€".into(),
            anomaly_policy: AnomalyPolicy::Drop,
            render_charts: true,
        }
    }
}

impl AnalysisConfig {
    /// Load and validate a config from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate a config from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |field: &'static str, reason: &str| ConfigError::Invalid {
            field,
            reason: reason.to_string(),
        };

        if self.top_n == 0 {
            return Err(invalid("top_n", "must be at least 1"));
        }
        if !(1..=MAX_CHART_ITEMS).contains(&self.chart_top_k) {
            return Err(invalid("chart_top_k", &format!("must be between 1 and {MAX_CHART_ITEMS}")));
        }
        if !(1..=MAX_CHART_ITEMS).contains(&self.price_bins) {
            return Err(invalid("price_bins", &format!("must be between 1 and {MAX_CHART_ITEMS}")));
        }
        if !(self.conversion_rate.is_finite() && self.conversion_rate > 0.0) {
            return Err(invalid("conversion_rate", "must be a positive number"));
        }
        if self.delimiter.len() != 1 || !self.delimiter.is_ascii() {
            return Err(invalid("delimiter", "must be a single ASCII character"));
        }
        Ok(())
    }

    /// Loader options derived from this config. Call after `validate()`.
    pub fn load_options(&self) -> LoadOptions {
        LoadOptions {
            delimiter: self.delimiter.bytes().next().unwrap_or(b','),
        }
    }

    pub fn aggregate_options(&self) -> AggregateOptions {
        AggregateOptions {
            top_n: self.top_n,
            chart_top_k: self.chart_top_k,
            price_bins: self.price_bins,
            conversion_rate: self.conversion_rate,
        }
    }
}
