use tracing::{info, warn};

use crate::config::AnalysisConfig;
use crate::models::{
    AnalysisReport, Diagnostics, Dimension, DimensionAggregates, DimensionRanking, EntityType,
    ForecastSection, Granularity, RecentGrowth, Section,
};
use crate::services::record_set::RecordSet;
use crate::services::{aggregation_service, forecasting_service, growth_service, risk_service};

/// Run every analytic over one record set.
///
/// Fallible parts (recent growth and each forecast) are reported as
/// `Section::Failed` with the error message, so one short series never
/// hides the rest of the report.
pub fn run_analysis(record_set: &RecordSet, config: &AnalysisConfig) -> AnalysisReport {
    info!(
        "Running analysis over {} rows ({} dropped)",
        record_set.row_count(),
        record_set.dropped_row_count()
    );

    let monthly_revenue = aggregation_service::aggregate(record_set, None, Granularity::Month);
    let revenue_series = aggregation_service::series_for(&monthly_revenue, None);

    let per_dimension_aggregates = config
        .dimensions
        .iter()
        .map(|&dimension| DimensionAggregates {
            dimension,
            aggregates: aggregation_service::aggregate(record_set, Some(dimension), Granularity::Month),
        })
        .collect();

    // customers are always ranked
    let mut ranking_dimensions = config.dimensions.clone();
    if !ranking_dimensions.contains(&Dimension::Customer) {
        ranking_dimensions.push(Dimension::Customer);
    }
    let dimension_rankings = ranking_dimensions
        .into_iter()
        .map(|dimension| DimensionRanking {
            dimension,
            top: aggregation_service::top_n(record_set, dimension, config.top_n),
        })
        .collect();

    let recent_growth = Section::from(
        growth_service::last_n_growth(&revenue_series, config.growth_window).map(|growth| {
            RecentGrowth {
                periods: config.growth_window,
                growth,
            }
        }),
    );
    if let Some(error) = recent_growth.error() {
        warn!("Recent growth unavailable: {}", error);
    }

    let forecast_config = config.forecast_config();
    let forecasts = config
        .forecast_methods
        .iter()
        .map(|&method| {
            let result = Section::from(forecasting_service::forecast(
                &revenue_series,
                method,
                &forecast_config,
            ));
            if let Some(error) = result.error() {
                warn!("{} forecast failed: {}", method, error);
            }
            ForecastSection {
                method,
                description: method.description().to_string(),
                result,
            }
        })
        .collect();

    let customers = risk_service::entity_ids(record_set, EntityType::Customer);
    let risk_flags = risk_service::classify(record_set, &customers, EntityType::Customer, config.risk_window);

    AnalysisReport {
        overall_totals: aggregation_service::overall_totals(record_set),
        growth: growth_service::compute_growth(&revenue_series),
        monthly_revenue,
        per_dimension_aggregates,
        dimension_rankings,
        recent_growth,
        forecasts,
        risk_flags,
        diagnostics: Diagnostics {
            row_count: record_set.row_count(),
            dropped_row_count: record_set.dropped_row_count(),
            dropped_rows: record_set.dropped_rows().to_vec(),
        },
    }
}
