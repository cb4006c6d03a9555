use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::Period;

/// One next-period prediction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastResult {
    /// Period being predicted, one after the last observed period
    pub target_period: Period,
    pub point_estimate: BigDecimal,
    pub method: ForecastMethod,
    pub confidence_note: Option<String>,
}

/// Forecasting methodology used
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ForecastMethod {
    NaiveAverage,
    LinearTrend,
    Arima,
    Lstm,
    AverageGrowth, // last value projected by mean realized growth
}

impl ForecastMethod {
    pub const ALL: [ForecastMethod; 5] = [
        ForecastMethod::NaiveAverage,
        ForecastMethod::LinearTrend,
        ForecastMethod::Arima,
        ForecastMethod::Lstm,
        ForecastMethod::AverageGrowth,
    ];

    /// Fewest observed periods the method will forecast from.
    pub fn min_periods(&self) -> usize {
        match self {
            ForecastMethod::NaiveAverage => 1,
            ForecastMethod::LinearTrend => 2,
            ForecastMethod::Arima => 3,
            ForecastMethod::Lstm => 3,
            ForecastMethod::AverageGrowth => 2,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            ForecastMethod::NaiveAverage => "Arithmetic mean of all observed periods",
            ForecastMethod::LinearTrend => {
                "Ordinary least squares trend extrapolated one period ahead"
            }
            ForecastMethod::Arima => {
                "ARIMA(1,1,1) fitted by conditional sum of squares, one step ahead"
            }
            ForecastMethod::Lstm => "Single-layer LSTM trained on one-step lag pairs",
            ForecastMethod::AverageGrowth => {
                "Last period scaled by the mean period-over-period growth rate"
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ForecastMethod::NaiveAverage => "naive_average",
            ForecastMethod::LinearTrend => "linear_trend",
            ForecastMethod::Arima => "arima",
            ForecastMethod::Lstm => "lstm",
            ForecastMethod::AverageGrowth => "average_growth",
        }
    }
}

impl fmt::Display for ForecastMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ForecastMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase().replace(['-', ' '], "_");
        ForecastMethod::ALL
            .into_iter()
            .find(|m| m.as_str() == wanted)
            .ok_or_else(|| format!("Unknown forecast method: {}", s))
    }
}

/// LSTM training hyperparameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LstmConfig {
    pub hidden_size: usize,
    pub epochs: usize,
    pub learning_rate: f64,
}

impl Default for LstmConfig {
    fn default() -> Self {
        Self {
            hidden_size: 8,
            epochs: 300,
            learning_rate: 0.01,
        }
    }
}

pub const DEFAULT_SEED: u64 = 42;

/// Per-call forecasting options. The seed is always explicit so neural
/// forecasts are reproducible from (series, method, config).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastConfig {
    pub seed: u64,
    pub lstm: LstmConfig,
}

impl ForecastConfig {
    pub fn with_seed(seed: u64) -> Self {
        Self {
            seed,
            lstm: LstmConfig::default(),
        }
    }
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self::with_seed(DEFAULT_SEED)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_round_trips_through_str() {
        for method in ForecastMethod::ALL {
            assert_eq!(method.as_str().parse::<ForecastMethod>().unwrap(), method);
        }
        assert_eq!("Linear-Trend".parse::<ForecastMethod>().unwrap(), ForecastMethod::LinearTrend);
        assert!("prophet".parse::<ForecastMethod>().is_err());
    }

    #[test]
    fn test_min_periods() {
        assert_eq!(ForecastMethod::NaiveAverage.min_periods(), 1);
        assert_eq!(ForecastMethod::LinearTrend.min_periods(), 2);
        assert_eq!(ForecastMethod::Arima.min_periods(), 3);
        assert_eq!(ForecastMethod::Lstm.min_periods(), 3);
    }
}
