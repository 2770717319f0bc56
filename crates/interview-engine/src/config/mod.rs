use std::env;
use std::fmt;
use std::path::PathBuf;

use crate::workflows::interview::{DailyLimit, SessionConfig};

/// Distinguishes runtime behavior for different stages of the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub session: SessionConfig,
    pub storage: StorageConfig,
    pub telemetry: TelemetryConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let defaults = SessionConfig::default();

        let max_questions = match env::var("INTERVIEW_MAX_QUESTIONS") {
            Ok(raw) => raw
                .trim()
                .parse::<usize>()
                .ok()
                .filter(|count| *count > 0)
                .ok_or(ConfigError::InvalidMaxQuestions)?,
            Err(_) => defaults.max_questions,
        };

        let max_warnings = match env::var("INTERVIEW_MAX_WARNINGS") {
            Ok(raw) => raw
                .trim()
                .parse::<u32>()
                .ok()
                .filter(|count| *count > 0)
                .ok_or(ConfigError::InvalidMaxWarnings)?,
            Err(_) => defaults.max_warnings,
        };

        let daily_limit = match env::var("INTERVIEW_DAILY_LIMIT") {
            Ok(raw) => raw
                .parse::<DailyLimit>()
                .map_err(|_| ConfigError::InvalidDailyLimit { value: raw })?,
            Err(_) => defaults.daily_limit,
        };

        let store_path = PathBuf::from(
            env::var("INTERVIEW_STORE_PATH").unwrap_or_else(|_| "interview-store.json".to_string()),
        );

        let history_retention_days = env::var("INTERVIEW_HISTORY_RETENTION_DAYS")
            .unwrap_or_else(|_| "90".to_string())
            .trim()
            .parse::<u32>()
            .map_err(|_| ConfigError::InvalidRetention)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            environment,
            session: SessionConfig {
                max_questions,
                max_warnings,
                daily_limit,
            },
            storage: StorageConfig {
                store_path,
                history_retention_days,
            },
            telemetry: TelemetryConfig { log_level },
        })
    }
}

/// Where persisted reports, attempts, and question history live.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub store_path: PathBuf,
    pub history_retention_days: u32,
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidMaxQuestions,
    InvalidMaxWarnings,
    InvalidDailyLimit { value: String },
    InvalidRetention,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidMaxQuestions => {
                write!(f, "INTERVIEW_MAX_QUESTIONS must be a positive integer")
            }
            ConfigError::InvalidMaxWarnings => {
                write!(f, "INTERVIEW_MAX_WARNINGS must be a positive integer")
            }
            ConfigError::InvalidDailyLimit { value } => write!(
                f,
                "INTERVIEW_DAILY_LIMIT must be 'unlimited' or a non-negative integer, found '{value}'"
            ),
            ConfigError::InvalidRetention => {
                write!(f, "INTERVIEW_HISTORY_RETENTION_DAYS must be a valid u32")
            }
        }
    }
}

impl std::error::Error for ConfigError {}
