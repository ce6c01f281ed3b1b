use crate::backoff::RetryPolicy;
use crate::rate_limiter::RateLimitConfig;
use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::env;

/// Application configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    /// Send-rate admission configuration
    pub rate_limit: RateLimitConfig,
    /// Retry backoff configuration
    pub retry: RetryPolicy,
    /// Phone validation configuration
    pub phone: PhoneConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Phone validation configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct PhoneConfig {
    /// Region assumed for numbers without a country code (default: US)
    pub default_region: String,
}

/// Logging configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    /// Log level (default: info)
    pub level: String,
    /// Log format: json or pretty (default: json)
    pub format: String,
}

impl Default for PhoneConfig {
    fn default() -> Self {
        Self {
            default_region: "US".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "json".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = Config::builder()
            // Start with default configuration
            .add_source(Config::try_from(&AppConfig::default())?)
            // Add configuration file based on environment
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Add local configuration file (gitignored)
            .add_source(File::with_name("config/local").required(false))
            // Add environment variables (prefixed with SMSGUARD_)
            .add_source(Environment::with_prefix("SMSGUARD").separator("__"))
            .build()?;

        let config: AppConfig = s.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the components cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.rate_limit.validate().map_err(ConfigError::Message)?;
        self.retry.backoff.validate().map_err(ConfigError::Message)?;
        if self.phone.default_region.trim().is_empty() {
            return Err(ConfigError::Message(
                "phone.default_region must not be empty".into(),
            ));
        }
        Ok(())
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            rate_limit: RateLimitConfig::default(),
            retry: RetryPolicy::default(),
            phone: PhoneConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}
