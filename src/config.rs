use thiserror::Error;

use crate::domain::aggregates::ReviewStatus;
use crate::domain::services::ReviewPolicy;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("{key} must be {expected}, got {value:?}")]
pub struct ConfigError {
    pub key: &'static str,
    pub expected: &'static str,
    pub value: String,
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Server host to bind to.
    pub host: String,
    /// Server port to bind to.
    pub port: u16,
    /// PostgreSQL connection URL. Without one the service keeps data in memory.
    pub database_url: Option<String>,
    /// Maximum database connections in the pool.
    pub db_max_connections: u32,
    /// NATS server URL for domain events.
    pub nats_url: Option<String>,
    /// Prefix for published event subjects.
    pub nats_subject_prefix: String,
    /// Log level used when `RUST_LOG` is unset.
    pub log_level: String,
    pub review_policy: ReviewPolicy,
}

impl AppConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through `lookup`, which returns the raw value for a key.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        Ok(Self {
            host: get("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse_or(get("PORT"), "PORT", "a port number", 8083)?,
            database_url: get("DATABASE_URL"),
            db_max_connections: parse_or(get("DB_MAX_CONNECTIONS"), "DB_MAX_CONNECTIONS", "a positive integer", 10)?,
            nats_url: get("NATS_URL"),
            nats_subject_prefix: get("NATS_SUBJECT_PREFIX").unwrap_or_else(|| "marketplace".to_string()),
            log_level: get("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
            review_policy: ReviewPolicy {
                require_purchase: flag(get("REVIEWS_REQUIRE_PURCHASE"), "REVIEWS_REQUIRE_PURCHASE", false)?,
                auto_approve: flag(get("REVIEWS_AUTO_APPROVE"), "REVIEWS_AUTO_APPROVE", false)?,
                missing_status: match get("REVIEWS_MISSING_STATUS") {
                    None => ReviewStatus::Approved,
                    Some(raw) => ReviewStatus::parse(&raw).ok_or(ConfigError {
                        key: "REVIEWS_MISSING_STATUS",
                        expected: "a review status",
                        value: raw,
                    })?,
                },
            },
        })
    }

    /// Build the socket address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_or<T: std::str::FromStr>(raw: Option<String>, key: &'static str, expected: &'static str, default: T) -> Result<T, ConfigError> {
    match raw {
        None => Ok(default),
        Some(value) => value.parse().map_err(|_| ConfigError { key, expected, value }),
    }
}

fn flag(raw: Option<String>, key: &'static str, default: bool) -> Result<bool, ConfigError> {
    match raw.as_deref().map(str::to_ascii_lowercase).as_deref() {
        None => Ok(default),
        Some("1" | "true" | "yes" | "on") => Ok(true),
        Some("0" | "false" | "no" | "off") => Ok(false),
        Some(_) => Err(ConfigError { key, expected: "a boolean", value: raw.unwrap_or_default() }),
    }
}
