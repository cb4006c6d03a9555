use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub service_name: String,
    pub environment: String,
    pub log_level: String,
}

impl LoggingConfig {
    pub fn from_env() -> Self {
        Self {
            service_name: std::env::var("SERVICE_NAME")
                .unwrap_or_else(|_| "sales-analytics".to_string()),
            environment: std::env::var("ENVIRONMENT")
                .unwrap_or_else(|_| "development".to_string()),
            log_level: std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "info".to_string()),
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.service_name.trim().is_empty() {
            return Err("SERVICE_NAME must not be empty".to_string());
        }
        tracing_subscriber::EnvFilter::try_new(&self.log_level)
            .map_err(|e| format!("Invalid RUST_LOG '{}': {}", self.log_level, e))?;
        Ok(())
    }
}

/// Install the global subscriber. Logs go to stderr so stdout carries only
/// the JSON report.
pub fn init_logging(config: LoggingConfig) -> Result<(), Box<dyn std::error::Error>> {
    config.validate()?;

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(&config.log_level))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init()?;

    tracing::info!(
        service = %config.service_name,
        environment = %config.environment,
        "📊 Console logging initialized"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(level: &str) -> LoggingConfig {
        LoggingConfig {
            service_name: "sales-analytics".to_string(),
            environment: "test".to_string(),
            log_level: level.to_string(),
        }
    }

    #[test]
    fn test_validate() {
        assert!(config("info").validate().is_ok());
        assert!(config("sales_analytics=debug,warn").validate().is_ok());
        assert!(config("sales_analytics=loud").validate().is_err());

        let mut unnamed = config("info");
        unnamed.service_name = " ".to_string();
        assert!(unnamed.validate().is_err());
    }
}
