use thiserror::Error;

use crate::models::ForecastMethod;

#[derive(Debug, Error)]
pub enum AnalyticsError {
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Validation error: row {row} is missing required field '{field}'")]
    MissingField { row: usize, field: String },
    #[error(
        "Validation error: {dropped} of {total} rows were unusable (more than {:.0}% allowed)",
        .max_fraction * 100.0
    )]
    TooManyDroppedRows {
        dropped: usize,
        total: usize,
        max_fraction: f64,
    },
    #[error("Insufficient data for {method} forecast: need at least {required} periods, got {available}")]
    InsufficientData {
        method: ForecastMethod,
        required: usize,
        available: usize,
    },
    #[error("Insufficient periods: need {required}, got {available}")]
    InsufficientPeriods { required: usize, available: usize },
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

impl AnalyticsError {
    /// True for the family of errors meaning the input data is structurally unusable.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            AnalyticsError::Validation(_)
                | AnalyticsError::MissingField { .. }
                | AnalyticsError::TooManyDroppedRows { .. }
        )
    }
}
