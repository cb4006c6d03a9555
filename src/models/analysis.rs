use serde::{Deserialize, Serialize};

use super::{
    Dimension, DimensionTotal, DroppedRow, ForecastMethod, ForecastResult, Growth, GrowthSeries,
    MonthlyAggregate, OverallTotals, RiskFlag,
};
use crate::errors::AnalyticsError;

/// Outcome of one report section. A failed section carries its error
/// message; the rest of the report is unaffected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Section<T> {
    Ok { value: T },
    Failed { error: String },
}

impl<T> Section<T> {
    pub fn is_ok(&self) -> bool {
        matches!(self, Section::Ok { .. })
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            Section::Ok { value } => Some(value),
            Section::Failed { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Section::Ok { .. } => None,
            Section::Failed { error } => Some(error),
        }
    }
}

impl<T> From<Result<T, AnalyticsError>> for Section<T> {
    fn from(result: Result<T, AnalyticsError>) -> Self {
        match result {
            Ok(value) => Section::Ok { value },
            Err(e) => Section::Failed {
                error: e.to_string(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionAggregates {
    pub dimension: Dimension,
    pub aggregates: Vec<MonthlyAggregate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionRanking {
    pub dimension: Dimension,
    pub top: Vec<DimensionTotal>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecentGrowth {
    pub periods: usize,
    pub growth: Growth,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastSection {
    pub method: ForecastMethod,
    pub description: String,
    pub result: Section<ForecastResult>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostics {
    pub row_count: usize,
    pub dropped_row_count: usize,
    pub dropped_rows: Vec<DroppedRow>,
}

/// Everything one analysis pass produces, ready for a presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub overall_totals: OverallTotals,
    pub monthly_revenue: Vec<MonthlyAggregate>,
    pub per_dimension_aggregates: Vec<DimensionAggregates>,
    pub dimension_rankings: Vec<DimensionRanking>,
    pub growth: GrowthSeries,
    pub recent_growth: Section<RecentGrowth>,
    pub forecasts: Vec<ForecastSection>,
    pub risk_flags: Vec<RiskFlag>,
    pub diagnostics: Diagnostics,
}
