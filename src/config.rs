use std::path::Path;

use error_stack::{Report, ResultExt};
use serde::Deserialize;

use crate::error::ConfigError;
use crate::model::Interval;

const API_KEY_ENV: &str = "POLYGON_API_KEY";

fn default_log_level() -> String {
    "info".into()
}

fn default_log_format() -> String {
    "text".into()
}

fn default_base_url() -> String {
    "https://api.polygon.io".into()
}

fn default_history_days() -> i64 {
    7
}

fn default_requests_per_minute() -> u32 {
    5
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_lookback() -> usize {
    100
}

fn default_chart_points() -> usize {
    crate::chart::DEFAULT_MAX_POINTS
}

fn default_pip_size() -> f64 {
    0.0001
}

fn default_target_pips() -> f64 {
    50.0
}

fn default_pairs() -> Vec<String> {
    ["EUR/USD", "GBP/USD", "USD/JPY", "AUD/USD", "USD/CAD"]
        .into_iter()
        .map(String::from)
        .collect()
}

#[derive(Debug, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default = "default_pairs")]
    pub pairs: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct GeneralConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Accepted values: `"text"` | `"json"`
    #[serde(default = "default_log_format")]
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: default_log_format(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ProviderConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Falls back to the `POLYGON_API_KEY` environment variable.
    pub api_key: Option<String>,
    #[serde(default = "default_history_days")]
    pub history_days: i64,
    #[serde(default = "default_requests_per_minute")]
    pub requests_per_minute: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: None,
            history_days: default_history_days(),
            requests_per_minute: default_requests_per_minute(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Parameters of the prediction pipeline.
#[derive(Debug, Clone, Deserialize)]
pub struct AnalysisConfig {
    /// Number of trailing bars the indicators are computed over.
    #[serde(default = "default_lookback")]
    pub lookback: usize,
    #[serde(default = "default_chart_points")]
    pub chart_points: usize,
    #[serde(default = "default_pip_size")]
    pub pip_size: f64,
    #[serde(default = "default_target_pips")]
    pub target_pips: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            lookback: default_lookback(),
            chart_points: default_chart_points(),
            pip_size: default_pip_size(),
            target_pips: default_target_pips(),
        }
    }
}

/// Load and validate an `AppConfig` from a TOML file at `path`.
pub fn load(path: &Path) -> Result<AppConfig, Report<ConfigError>> {
    let content = std::fs::read_to_string(path)
        .change_context(ConfigError::ReadFile)
        .attach_with(|| format!("path: {}", path.display()))?;

    let mut config: AppConfig = toml::from_str(&content).change_context(ConfigError::Parse {
        reason: "invalid TOML syntax or schema mismatch".into(),
    })?;

    if config.provider.api_key.is_none() {
        config.provider.api_key = std::env::var(API_KEY_ENV).ok();
    }

    validate(&config)?;

    Ok(config)
}

/// Upper bound on `provider.history_days`.
pub const MAX_HISTORY_DAYS: i64 = 3650;

/// Smallest lookback that still covers every indicator in the composite set.
pub const MIN_LOOKBACK: usize = 28;

fn validate(config: &AppConfig) -> Result<(), Report<ConfigError>> {
    validate_general(config)?;
    validate_provider(config)?;
    validate_analysis(config)?;
    validate_pairs(config)?;
    Ok(())
}

fn validate_general(config: &AppConfig) -> Result<(), Report<ConfigError>> {
    if !matches!(config.general.log_format.as_str(), "text" | "json") {
        return Err(Report::new(ConfigError::Validation {
            field: format!(
                "general.log_format \"{}\" must be \"text\" or \"json\"",
                config.general.log_format
            ),
        }));
    }
    Ok(())
}

fn validate_provider(config: &AppConfig) -> Result<(), Report<ConfigError>> {
    let provider = &config.provider;
    if provider.api_key.as_deref().is_none_or(str::is_empty) {
        return Err(Report::new(ConfigError::Validation {
            field: format!("provider.api_key is required (or set {API_KEY_ENV})"),
        }));
    }
    if !(1..=MAX_HISTORY_DAYS).contains(&provider.history_days) {
        return Err(Report::new(ConfigError::Validation {
            field: format!(
                "provider.history_days {} must be between 1 and {MAX_HISTORY_DAYS}",
                provider.history_days
            ),
        }));
    }
    if provider.requests_per_minute == 0 {
        return Err(Report::new(ConfigError::Validation {
            field: "provider.requests_per_minute must be > 0".into(),
        }));
    }
    Ok(())
}

fn validate_analysis(config: &AppConfig) -> Result<(), Report<ConfigError>> {
    let analysis = &config.analysis;
    if analysis.lookback < MIN_LOOKBACK {
        return Err(Report::new(ConfigError::Validation {
            field: format!(
                "analysis.lookback {} is below the minimum of {MIN_LOOKBACK}",
                analysis.lookback
            ),
        }));
    }
    if analysis.chart_points == 0 {
        return Err(Report::new(ConfigError::Validation {
            field: "analysis.chart_points must be > 0".into(),
        }));
    }
    if analysis.pip_size <= 0.0 || analysis.target_pips <= 0.0 {
        return Err(Report::new(ConfigError::Validation {
            field: "analysis.pip_size and analysis.target_pips must be > 0".into(),
        }));
    }
    Ok(())
}

fn validate_pairs(config: &AppConfig) -> Result<(), Report<ConfigError>> {
    let mut seen = std::collections::HashSet::new();
    for pair in &config.pairs {
        if !is_valid_pair(pair) {
            return Err(Report::new(ConfigError::Validation {
                field: format!("pairs: \"{pair}\" is not of the form AAA/BBB"),
            }));
        }
        if !seen.insert(pair.as_str()) {
            return Err(Report::new(ConfigError::Validation {
                field: format!("pairs: duplicate pair \"{pair}\""),
            }));
        }
    }
    Ok(())
}

/// A currency pair is two three-letter uppercase codes joined by `/`.
pub fn is_valid_pair(pair: &str) -> bool {
    match pair.split_once('/') {
        Some((base, quote)) => [base, quote]
            .iter()
            .all(|code| code.len() == 3 && code.chars().all(|c| c.is_ascii_uppercase())),
        None => false,
    }
}

/// Parse an interval given in minutes, rejecting unsupported values.
pub fn parse_interval(minutes: u32) -> Result<Interval, Report<ConfigError>> {
    Interval::from_minutes(minutes).ok_or_else(|| {
        Report::new(ConfigError::Validation {
            field: format!("interval {minutes} is not one of 5, 15, 60, 240"),
        })
    })
}
