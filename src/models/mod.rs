mod aggregate;
mod analysis;
mod growth;
mod period;
mod sales;
pub mod forecast;
pub mod risk;

pub use aggregate::{Dimension, DimensionTotal, Granularity, MonthlyAggregate, OverallTotals};
pub use analysis::{
    AnalysisReport, Diagnostics, DimensionAggregates, DimensionRanking, ForecastSection,
    RecentGrowth, Section,
};
pub use forecast::{ForecastConfig, ForecastMethod, ForecastResult, LstmConfig, DEFAULT_SEED};
pub use growth::{Growth, GrowthPoint, GrowthSeries};
pub use period::Period;
pub use risk::{EntityType, RecencyWindow, RiskFlag, RiskReason};
pub use sales::{estimated_profit, DealSize, DroppedRow, OrderStatus, SalesRecord};
