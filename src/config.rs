use std::str::FromStr;

use crate::models::{Dimension, ForecastConfig, ForecastMethod, LstmConfig, RecencyWindow, DEFAULT_SEED};
use crate::services::record_set::LoadOptions;

/// Longest accepted day window, roughly 2700 years.
pub const MAX_RISK_WINDOW_DAYS: i64 = 1_000_000;

/// Settings for one analysis pass.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisConfig {
    pub max_dropped_fraction: f64,
    pub risk_window: RecencyWindow,
    pub forecast_methods: Vec<ForecastMethod>,
    pub seed: u64,
    pub lstm: LstmConfig,
    /// Periods spanned by the recent-growth figure
    pub growth_window: usize,
    pub top_n: usize,
    pub dimensions: Vec<Dimension>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            max_dropped_fraction: LoadOptions::default().max_dropped_fraction,
            risk_window: RecencyWindow::Days(90),
            forecast_methods: ForecastMethod::ALL.to_vec(),
            seed: DEFAULT_SEED,
            lstm: LstmConfig::default(),
            growth_window: 3,
            top_n: 5,
            dimensions: vec![Dimension::ProductLine, Dimension::Country],
        }
    }
}

impl AnalysisConfig {
    /// Read settings from the environment, falling back to defaults for
    /// anything unset. Malformed values are reported rather than ignored.
    pub fn from_env() -> Result<Self, String> {
        let defaults = Self::default();

        let risk_window = match env_parse::<u32>("RISK_WINDOW_MONTHS")? {
            Some(months) => RecencyWindow::Months(months),
            None => env_parse::<i64>("RISK_WINDOW_DAYS")?
                .map(RecencyWindow::Days)
                .unwrap_or(defaults.risk_window),
        };

        let config = Self {
            max_dropped_fraction: env_parse("MAX_DROPPED_FRACTION")?
                .unwrap_or(defaults.max_dropped_fraction),
            risk_window,
            forecast_methods: env_list("FORECAST_METHODS")?.unwrap_or(defaults.forecast_methods),
            seed: env_parse("FORECAST_SEED")?.unwrap_or(defaults.seed),
            lstm: LstmConfig {
                hidden_size: env_parse("LSTM_HIDDEN_SIZE")?.unwrap_or(defaults.lstm.hidden_size),
                epochs: env_parse("LSTM_EPOCHS")?.unwrap_or(defaults.lstm.epochs),
                learning_rate: env_parse("LSTM_LEARNING_RATE")?
                    .unwrap_or(defaults.lstm.learning_rate),
            },
            growth_window: env_parse("GROWTH_WINDOW")?.unwrap_or(defaults.growth_window),
            top_n: env_parse("TOP_N")?.unwrap_or(defaults.top_n),
            dimensions: env_list("AGGREGATE_DIMENSIONS")?.unwrap_or(defaults.dimensions),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), String> {
        if !(0.0..=1.0).contains(&self.max_dropped_fraction) {
            return Err(format!(
                "MAX_DROPPED_FRACTION must be between 0 and 1, got {}",
                self.max_dropped_fraction
            ));
        }
        if let RecencyWindow::Days(days) = self.risk_window {
            if days < 0 {
                return Err(format!("RISK_WINDOW_DAYS must not be negative, got {}", days));
            }
            if days > MAX_RISK_WINDOW_DAYS {
                return Err(format!(
                    "RISK_WINDOW_DAYS must not exceed {}, got {}",
                    MAX_RISK_WINDOW_DAYS, days
                ));
            }
        }
        if self.forecast_methods.is_empty() {
            return Err("FORECAST_METHODS must name at least one method".to_string());
        }
        if self.lstm.hidden_size == 0 || self.lstm.epochs == 0 {
            return Err("LSTM_HIDDEN_SIZE and LSTM_EPOCHS must be at least 1".to_string());
        }
        if !(self.lstm.learning_rate.is_finite() && self.lstm.learning_rate > 0.0) {
            return Err(format!(
                "LSTM_LEARNING_RATE must be positive, got {}",
                self.lstm.learning_rate
            ));
        }
        if self.growth_window < 2 {
            return Err(format!(
                "GROWTH_WINDOW must be at least 2, got {}",
                self.growth_window
            ));
        }
        Ok(())
    }

    pub fn load_options(&self) -> LoadOptions {
        LoadOptions {
            max_dropped_fraction: self.max_dropped_fraction,
        }
    }

    pub fn forecast_config(&self) -> ForecastConfig {
        ForecastConfig {
            seed: self.seed,
            lstm: self.lstm.clone(),
        }
    }
}

fn env_parse<T>(key: &str) -> Result<Option<T>, String>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| format!("Invalid {} '{}': {}", key, raw, e)),
        _ => Ok(None),
    }
}

fn env_list<T>(key: &str) -> Result<Option<Vec<T>>, String>
where
    T: FromStr<Err = String>,
{
    match std::env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => parse_list(&raw)
            .map(Some)
            .map_err(|e| format!("Invalid {}: {}", key, e)),
        _ => Ok(None),
    }
}

fn parse_list<T: FromStr<Err = String>>(raw: &str) -> Result<Vec<T>, String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(T::from_str)
        .collect()
}
