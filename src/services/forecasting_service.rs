use bigdecimal::BigDecimal;
use tracing::{debug, info};

use crate::errors::AnalyticsError;
use crate::models::{ForecastConfig, ForecastMethod, ForecastResult, Period};
use crate::services::growth_service;
use crate::services::indicators::{self, from_f64, sum_decimals, to_f64, ESTIMATE_SCALE};
use crate::services::lstm;

/// Grid resolution for ARIMA coefficient search (coefficients are `step * GRID_STEP`).
const ARIMA_GRID_STEP: f64 = 0.05;
const ARIMA_GRID_LIMIT: i32 = 19; // ±0.95, keeps the fit stationary and invertible

/// Produce a next-period point estimate for an ordered (period, value) series.
///
/// # Arguments
/// * `series` - strictly period-ascending observations of one dimension value
/// * `method` - forecasting strategy
/// * `config` - seed and LSTM hyperparameters; the seed is used per call, never drawn globally
///
/// Fails with `InsufficientData` below the method's minimum observation
/// count rather than falling back to a simpler method.
pub fn forecast(
    series: &[(Period, BigDecimal)],
    method: ForecastMethod,
    config: &ForecastConfig,
) -> Result<ForecastResult, AnalyticsError> {
    ensure_ordered(series)?;

    let required = method.min_periods();
    let insufficient = || AnalyticsError::InsufficientData {
        method,
        required,
        available: series.len(),
    };
    if series.len() < required {
        return Err(insufficient());
    }
    let (last_period, _) = series.last().ok_or_else(insufficient)?;

    let (point_estimate, confidence_note) = match method {
        ForecastMethod::NaiveAverage => naive_average_forecast(series),
        ForecastMethod::LinearTrend => linear_trend_forecast(series)?,
        ForecastMethod::Arima => arima_forecast(series)?,
        ForecastMethod::Lstm => lstm_forecast(series, config)?,
        ForecastMethod::AverageGrowth => average_growth_forecast(series)?,
    };

    info!(
        "{} forecast for {}: {} ({} periods observed)",
        method,
        last_period.next(),
        point_estimate,
        series.len()
    );

    Ok(ForecastResult {
        target_period: last_period.next(),
        point_estimate,
        method,
        confidence_note: Some(confidence_note),
    })
}

fn ensure_ordered(series: &[(Period, BigDecimal)]) -> Result<(), AnalyticsError> {
    match series.windows(2).find(|w| w[0].0 >= w[1].0) {
        Some(w) => Err(AnalyticsError::InvalidParameter(format!(
            "series periods must be strictly increasing ({} is followed by {})",
            w[0].0, w[1].0
        ))),
        None => Ok(()),
    }
}

fn values_f64(series: &[(Period, BigDecimal)]) -> Result<Vec<f64>, AnalyticsError> {
    series
        .iter()
        .map(|(period, value)| {
            to_f64(value).ok_or_else(|| {
                AnalyticsError::InvalidParameter(format!(
                    "value for {} is not representable as a float",
                    period
                ))
            })
        })
        .collect()
}

fn to_estimate(value: f64, method: ForecastMethod) -> Result<BigDecimal, AnalyticsError> {
    from_f64(value, ESTIMATE_SCALE).ok_or_else(|| {
        AnalyticsError::InvalidParameter(format!("{} produced a non-finite estimate", method))
    })
}

/// Mean of all observations, computed in exact decimal arithmetic.
fn naive_average_forecast(series: &[(Period, BigDecimal)]) -> (BigDecimal, String) {
    let total = sum_decimals(series.iter().map(|(_, v)| v));
    let mean = (total / BigDecimal::from(series.len() as u64)).round(ESTIMATE_SCALE);
    (mean, format!("mean of {} periods", series.len()))
}

/// Ordinary least squares on (index, value), evaluated at the next index.
fn linear_trend_forecast(
    series: &[(Period, BigDecimal)],
) -> Result<(BigDecimal, String), AnalyticsError> {
    let values = values_f64(series)?;
    let (slope, intercept) = indicators::regression_trend(&values);
    let predicted = slope * values.len() as f64 + intercept;

    Ok((
        to_estimate(predicted, ForecastMethod::LinearTrend)?,
        format!("trend of {:.2} per period", slope),
    ))
}

/// Last observation scaled by the mean realized period-over-period growth.
///
/// Zero baselines leave growth undefined; if no change in the series is
/// defined the forecast fails with `InsufficientData`, where `available`
/// counts the periods that take part in a defined change.
fn average_growth_forecast(
    series: &[(Period, BigDecimal)],
) -> Result<(BigDecimal, String), AnalyticsError> {
    let growth = growth_service::mean_growth(series).ok_or(AnalyticsError::InsufficientData {
        method: ForecastMethod::AverageGrowth,
        required: ForecastMethod::AverageGrowth.min_periods(),
        available: 0,
    })?;

    let (_, last) = &series[series.len() - 1];
    let estimate = (last * (BigDecimal::from(1) + &growth)).round(ESTIMATE_SCALE);
    let pct = to_f64(&growth).unwrap_or(0.0) * 100.0;

    Ok((
        estimate,
        format!("average period-over-period growth of {:.2}%", pct),
    ))
}

/// Fitted ARIMA(1,1,1) on first differences:
/// `z_t = φ·z_{t-1} + ε_t + θ·ε_{t-1}`, with `z_t = Δy_t - μ`.
#[derive(Debug, Clone, PartialEq)]
pub struct ArimaFit {
    pub phi: f64,
    pub theta: f64,
    /// Mean first difference (drift)
    pub mu: f64,
    pub sse: f64,
    last_z: f64,
    last_residual: f64,
}

impl ArimaFit {
    /// One-step-ahead level forecast given the last observed level.
    pub fn predict_next(&self, last_value: f64) -> f64 {
        let z_next = self.phi * self.last_z + self.theta * self.last_residual;
        last_value + self.mu + z_next
    }
}

/// Fit ARIMA(1,1,1) by conditional sum of squares over a coefficient grid.
///
/// Requires at least three observations (two differences). Ties are broken
/// toward the smaller |φ| + |θ|, so a pure drift series fits φ = θ = 0.
pub fn fit_arima_111(values: &[f64]) -> Result<ArimaFit, AnalyticsError> {
    if values.len() < ForecastMethod::Arima.min_periods() {
        return Err(AnalyticsError::InsufficientData {
            method: ForecastMethod::Arima,
            required: ForecastMethod::Arima.min_periods(),
            available: values.len(),
        });
    }

    let diffs: Vec<f64> = values.windows(2).map(|w| w[1] - w[0]).collect();
    let mu = indicators::mean(&diffs).unwrap_or(0.0);
    let z: Vec<f64> = diffs.iter().map(|d| d - mu).collect();

    let mut best: Option<ArimaFit> = None;

    for phi_step in -ARIMA_GRID_LIMIT..=ARIMA_GRID_LIMIT {
        for theta_step in -ARIMA_GRID_LIMIT..=ARIMA_GRID_LIMIT {
            let phi = phi_step as f64 * ARIMA_GRID_STEP;
            let theta = theta_step as f64 * ARIMA_GRID_STEP;

            let Some((sse, last_residual)) = conditional_sum_of_squares(&z, phi, theta) else {
                continue;
            };

            let better = match &best {
                None => true,
                Some(current) => {
                    let tolerance = 1e-12 * (1.0 + current.sse);
                    sse < current.sse - tolerance
                        || ((sse - current.sse).abs() <= tolerance
                            && phi.abs() + theta.abs() < current.phi.abs() + current.theta.abs())
                }
            };

            if better {
                best = Some(ArimaFit {
                    phi,
                    theta,
                    mu,
                    sse,
                    last_z: z[z.len() - 1],
                    last_residual,
                });
            }
        }
    }

    let fit = best.ok_or_else(|| {
        AnalyticsError::InvalidParameter("ARIMA fit did not converge on any coefficient pair".to_string())
    })?;
    debug!(
        "ARIMA(1,1,1) fit: phi={:.2} theta={:.2} mu={:.4} sse={:.4}",
        fit.phi, fit.theta, fit.mu, fit.sse
    );
    Ok(fit)
}

/// Residual sum of squares conditioned on ε_0 = 0. Returns the last residual too.
fn conditional_sum_of_squares(z: &[f64], phi: f64, theta: f64) -> Option<(f64, f64)> {
    let mut sse = 0.0;
    let mut residual = 0.0;

    for t in 1..z.len() {
        residual = z[t] - phi * z[t - 1] - theta * residual;
        sse += residual * residual;
    }

    if sse.is_finite() {
        Some((sse, residual))
    } else {
        None
    }
}

fn arima_forecast(series: &[(Period, BigDecimal)]) -> Result<(BigDecimal, String), AnalyticsError> {
    let values = values_f64(series)?;
    let fit = fit_arima_111(&values)?;
    let predicted = fit.predict_next(values[values.len() - 1]);

    Ok((
        to_estimate(predicted, ForecastMethod::Arima)?,
        format!(
            "ARIMA(1,1,1) phi={:.2} theta={:.2} drift={:.2}",
            fit.phi, fit.theta, fit.mu
        ),
    ))
}

fn lstm_forecast(
    series: &[(Period, BigDecimal)],
    config: &ForecastConfig,
) -> Result<(BigDecimal, String), AnalyticsError> {
    let values = values_f64(series)?;
    let fit = lstm::forecast_next(&values, &config.lstm, config.seed)?;

    Ok((
        to_estimate(fit.prediction, ForecastMethod::Lstm)?,
        format!(
            "LSTM hidden={} epochs={} seed={} training_mse={:.6}",
            config.lstm.hidden_size, config.lstm.epochs, config.seed, fit.final_loss
        ),
    ))
}
