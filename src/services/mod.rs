pub mod aggregation_service;
pub mod analytics_service;
pub mod csv_import_service;
pub mod forecasting_service;
pub mod growth_service;
pub mod indicators;
pub mod lstm;
pub mod record_set;
pub mod risk_service;
