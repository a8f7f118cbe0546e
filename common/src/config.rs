//! Configuration management.
//!
//! All settings come from environment variables. Loading goes through a
//! lookup function so tests can supply their own variables.

use std::str::FromStr;

use crate::errors::{AppError, AppResult};
use crate::models::connection::{ConnectionConfig, DbType};

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 5;

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per event.
    Json,
}

impl FromStr for LogFormat {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "pretty" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => Err(AppError::Config(format!("unknown LOG_FORMAT: {}", other))),
        }
    }
}

/// Service configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Service name, used in logs and the health endpoint.
    pub service_name: String,
    /// Listen address.
    pub host: String,
    /// Listen port.
    pub port: u16,
    /// Log output format.
    pub log_format: LogFormat,
    /// Database the notebook table lives in.
    pub database: ConnectionConfig,
}

impl AppConfig {
    /// Loads the configuration for `service` from the process environment.
    pub fn load_with_service(service: &str) -> AppResult<Self> {
        Self::from_lookup(service, |key| std::env::var(key).ok())
    }

    /// Loads the configuration using `lookup` to resolve variables.
    pub fn from_lookup<F>(service: &str, lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let db_type = match non_empty(&lookup, "DB_TYPE") {
            Some(v) => v.parse::<DbType>()?,
            None => DbType::MySQL,
        };

        let database = ConnectionConfig {
            db_type,
            host: non_empty(&lookup, "DB_HOST"),
            port: parse_var(&lookup, "DB_PORT")?,
            username: non_empty(&lookup, "DB_USERNAME"),
            password: lookup("DB_PASSWORD"),
            database: non_empty(&lookup, "DB_DATABASE"),
            file_path: non_empty(&lookup, "DB_FILE_PATH"),
            connect_timeout_secs: parse_var(&lookup, "DB_CONNECT_TIMEOUT_SECS")?
                .unwrap_or(DEFAULT_CONNECT_TIMEOUT_SECS),
        };

        Ok(Self {
            service_name: service.to_string(),
            host: non_empty(&lookup, "SERVER_HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: parse_var(&lookup, "SERVER_PORT")?.unwrap_or(DEFAULT_PORT),
            log_format: match non_empty(&lookup, "LOG_FORMAT") {
                Some(v) => v.parse()?,
                None => LogFormat::default(),
            },
            database,
        })
    }

    /// Socket address string to bind.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn non_empty<F>(lookup: &F, key: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_var<F, T>(lookup: &F, key: &str) -> AppResult<Option<T>>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    non_empty(lookup, key)
        .map(|v| {
            v.parse::<T>()
                .map_err(|e| AppError::Config(format!("{}={}: {}", key, v, e)))
        })
        .transpose()
}
