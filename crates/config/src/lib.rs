//! Environment-driven settings for the user registry.
//!
//! Values come from the process environment, optionally seeded from a `.env`
//! file. [`Config::from_lookup`] takes any key lookup so the parsing rules can
//! be exercised without touching the real environment.

use std::env;
use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_LOG_FILTER: &str =
    "api_server=info,application=info,infrastructure=info,tower_http=debug";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Failed to load .env file from path {path}: {reason}")]
    EnvFile { path: String, reason: String },

    #[error("Invalid {key}: {reason}")]
    InvalidValue { key: &'static str, reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    pub fn is_development(self) -> bool {
        matches!(self, Environment::Development)
    }
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" | "local" => Ok(Environment::Development),
            "production" | "prod" | "staging" => Ok(Environment::Production),
            other => Err(format!("unknown environment '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    pub connection_string: String,
    pub max_retry_count: u32,
    pub command_timeout: Duration,
    pub max_pool_size: u32,
    pub enable_detailed_errors: bool,
    pub enable_sensitive_data_logging: bool,
}

impl DatabaseConfig {
    /// A private in-memory SQLite database. Mostly useful for tests.
    pub fn in_memory() -> Self {
        Self {
            connection_string: ":memory:".to_string(),
            ..Self::default()
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            connection_string: "users.db".to_string(),
            max_retry_count: 3,
            command_timeout: Duration::from_secs(30),
            max_pool_size: 8,
            enable_detailed_errors: true,
            enable_sensitive_data_logging: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub api_host: String,
    pub api_port: u16,
}

impl ServerConfig {
    pub fn api_address(&self) -> String {
        format!("{}:{}", self.api_host, self.api_port)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub environment: Environment,
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub log_filter: String,
}

impl Config {
    /// Load configuration from a specified `.env` file path or default to the root `.env` file.
    pub fn from_env(env_path: Option<&str>) -> Result<Self, ConfigError> {
        if let Some(path) = env_path {
            dotenv::from_path(path).map_err(|e| ConfigError::EnvFile {
                path: path.to_string(),
                reason: e.to_string(),
            })?;
        } else {
            // A missing root `.env` is fine
            dotenv::dotenv().ok();
        }

        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment = parse_var(&lookup, "APP_ENV", Environment::Development)?;
        let development = environment.is_development();

        // Detailed errors and sensitive logging are development-only switches
        let enable_detailed_errors =
            development && parse_flag(&lookup, "DATABASE_ENABLE_DETAILED_ERRORS", true)?;
        let enable_sensitive_data_logging =
            development && parse_flag(&lookup, "DATABASE_ENABLE_SENSITIVE_DATA_LOGGING", false)?;

        let command_timeout_secs: u64 = parse_var(&lookup, "DATABASE_COMMAND_TIMEOUT", 30)?;
        if command_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "DATABASE_COMMAND_TIMEOUT",
                reason: "must be at least one second".to_string(),
            });
        }

        let max_pool_size: u32 = parse_var(&lookup, "DATABASE_MAX_POOL_SIZE", 8)?;
        if max_pool_size == 0 {
            return Err(ConfigError::InvalidValue {
                key: "DATABASE_MAX_POOL_SIZE",
                reason: "must be greater than zero".to_string(),
            });
        }

        let database = DatabaseConfig {
            connection_string: non_empty(&lookup, "DATABASE_URL")
                .unwrap_or_else(|| "users.db".to_string()),
            max_retry_count: parse_var(&lookup, "DATABASE_MAX_RETRY_COUNT", 3)?,
            command_timeout: Duration::from_secs(command_timeout_secs),
            max_pool_size,
            enable_detailed_errors,
            enable_sensitive_data_logging,
        };

        let server = ServerConfig {
            api_host: non_empty(&lookup, "API_HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            api_port: parse_var(&lookup, "API_PORT", 8080)?,
        };

        Ok(Self {
            environment,
            database,
            server,
            log_filter: non_empty(&lookup, "RUST_LOG")
                .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string()),
        })
    }
}

fn non_empty<F>(lookup: &F, key: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key).filter(|value| !value.trim().is_empty())
}

fn parse_var<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: Display,
{
    match non_empty(lookup, key) {
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::InvalidValue {
            key,
            reason: e.to_string(),
        }),
        None => Ok(default),
    }
}

fn parse_flag<F>(lookup: &F, key: &'static str, default: bool) -> Result<bool, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match non_empty(lookup, key) {
        Some(raw) => match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            other => Err(ConfigError::InvalidValue {
                key,
                reason: format!("expected a boolean, got '{other}'"),
            }),
        },
        None => Ok(default),
    }
}
