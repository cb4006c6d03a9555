pub mod config;
pub mod errors;
pub mod logging;
pub mod models;
pub mod services;

pub use config::AnalysisConfig;
pub use errors::AnalyticsError;
pub use services::analytics_service::run_analysis;
pub use services::record_set::{LoadOptions, RawRow, RecordFilter, RecordSet};
