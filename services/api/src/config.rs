//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use chrono::FixedOffset;
use duotrack_core::Calendar;
use std::net::SocketAddr;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    /// Without a database URL the server keeps everything in memory.
    pub database_url: Option<String>,
    pub log_level: Level,
    /// Offset that defines where calendar days begin and end.
    pub utc_offset: FixedOffset,
    pub openai_api_key: Option<String>,
    pub classifier_model: String,
    pub frontend_url: String,
    pub cors_origin: String,
    pub session_ttl_days: i64,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination.
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        // --- Load Server and Database Settings ---
        let bind_address_str =
            std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
        let bind_address = bind_address_str.parse::<SocketAddr>().map_err(|e| {
            ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string())
        })?;

        let database_url = std::env::var("DATABASE_URL")
            .ok()
            .filter(|url| !url.trim().is_empty());

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        let offset_str = std::env::var("UTC_OFFSET").unwrap_or_else(|_| "+00:00".to_string());
        let utc_offset = Calendar::parse_offset(&offset_str).ok_or_else(|| {
            ConfigError::InvalidValue(
                "UTC_OFFSET".to_string(),
                format!("'{}' is not an offset like +05:30", offset_str),
            )
        })?;

        // --- Load API Keys (as optional) ---
        let openai_api_key = std::env::var("OPENAI_API_KEY").ok();

        // --- Load Adapter-specific Settings ---
        let classifier_model =
            std::env::var("CLASSIFIER_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string());
        let frontend_url = std::env::var("FRONTEND_URL")
            .unwrap_or_else(|_| "http://localhost:5173".to_string());
        let cors_origin =
            std::env::var("CORS_ORIGIN").unwrap_or_else(|_| frontend_url.clone());

        let session_ttl_days = match std::env::var("SESSION_TTL_DAYS") {
            Ok(value) => value.parse::<i64>().ok().filter(|d| *d > 0).ok_or_else(|| {
                ConfigError::InvalidValue(
                    "SESSION_TTL_DAYS".to_string(),
                    format!("'{}' is not a positive number of days", value),
                )
            })?,
            Err(_) => 30,
        };

        Ok(Self {
            bind_address,
            database_url,
            log_level,
            utc_offset,
            openai_api_key,
            classifier_model,
            frontend_url,
            cors_origin,
            session_ttl_days,
        })
    }

    /// A configuration suitable for tests and local experiments.
    pub fn local() -> Self {
        Self {
            bind_address: SocketAddr::from(([127, 0, 0, 1], 3000)),
            database_url: None,
            log_level: Level::INFO,
            utc_offset: Calendar::utc().offset(),
            openai_api_key: None,
            classifier_model: "gpt-4o-mini".to_string(),
            frontend_url: "http://localhost:5173".to_string(),
            cors_origin: "http://localhost:5173".to_string(),
            session_ttl_days: 30,
        }
    }

    pub fn calendar(&self) -> Calendar {
        Calendar::new(self.utc_offset)
    }
}
