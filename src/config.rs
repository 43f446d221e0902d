use crate::error::ConfigError;
use crate::validation::dnsmx::DEFAULT_DNS_TIMEOUT;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_RATE_LIMIT: i64 = 50;
pub const DEFAULT_LOG_LEVEL: &str = "warn";

const RATE_LIMIT_VAR: &str = "EMAIL_CHECKER_RATE_LIMIT";
const DNS_TIMEOUT_VAR: &str = "EMAIL_CHECKER_DNS_TIMEOUT_SECS";
const DB_VAR: &str = "EMAIL_CHECKER_DB";
const LOG_LEVEL_VAR: &str = "EMAIL_CHECKER_LOG_LEVEL";

/// Environment-driven defaults. Command-line flags override these.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub rate_limit: i64,
    pub dns_timeout: Duration,
    pub db_path: Option<PathBuf>,
    pub log_level: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            rate_limit: DEFAULT_RATE_LIMIT,
            dns_timeout: DEFAULT_DNS_TIMEOUT,
            db_path: None,
            log_level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

impl Settings {
    /// Loads `.env` (if present) and reads settings from the process
    /// environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads settings through `lookup`; unset or blank keys keep defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let mut settings = Settings::default();

        if let Some(value) = get(RATE_LIMIT_VAR) {
            settings.rate_limit = match value.parse::<i64>() {
                Ok(limit) if limit >= 0 => limit,
                _ => return Err(invalid(RATE_LIMIT_VAR, value, "a non-negative integer")),
            };
        }

        if let Some(value) = get(DNS_TIMEOUT_VAR) {
            settings.dns_timeout = match value.parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => return Err(invalid(DNS_TIMEOUT_VAR, value, "a positive number of seconds")),
            };
        }

        settings.db_path = get(DB_VAR).map(PathBuf::from);

        if let Some(value) = get(LOG_LEVEL_VAR) {
            settings.log_level = value;
        }

        Ok(settings)
    }
}

fn invalid(key: &'static str, value: String, expected: &'static str) -> ConfigError {
    ConfigError::Invalid {
        key,
        value,
        expected,
    }
}
