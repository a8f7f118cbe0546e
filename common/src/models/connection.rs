//! Connection configuration models.
//!
//! Describes where the notebook table lives and how to reach it.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::errors::AppError;

/// Database type enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DbType {
    /// MySQL / MariaDB server.
    MySQL,
    /// SQLite database file.
    SQLite,
}

impl DbType {
    /// Returns the default port for this database type.
    pub fn default_port(&self) -> Option<u16> {
        match self {
            DbType::MySQL => Some(3306),
            DbType::SQLite => None,
        }
    }
}

impl fmt::Display for DbType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DbType::MySQL => write!(f, "mysql"),
            DbType::SQLite => write!(f, "sqlite"),
        }
    }
}

impl FromStr for DbType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mysql" | "mariadb" => Ok(DbType::MySQL),
            "sqlite" => Ok(DbType::SQLite),
            other => Err(AppError::Config(format!("unsupported DB_TYPE: {}", other))),
        }
    }
}

/// Connection parameters for the notebook database.
///
/// Built once at startup and handed to the handler; each request opens its
/// own connection from it.
#[derive(Clone)]
pub struct ConnectionConfig {
    /// Database type.
    pub db_type: DbType,
    /// Database host (network databases).
    pub host: Option<String>,
    /// Database port; the type's default port when absent.
    pub port: Option<u16>,
    /// Database username.
    pub username: Option<String>,
    /// Database password.
    pub password: Option<String>,
    /// Database (schema) name.
    pub database: Option<String>,
    /// SQLite file path.
    pub file_path: Option<String>,
    /// Upper bound on establishing a connection, in seconds.
    pub connect_timeout_secs: u64,
}

impl ConnectionConfig {
    /// Configuration for a MySQL server.
    pub fn mysql(
        host: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
        database: impl Into<String>,
    ) -> Self {
        Self {
            db_type: DbType::MySQL,
            host: Some(host.into()),
            port: None,
            username: Some(username.into()),
            password: Some(password.into()),
            database: Some(database.into()),
            file_path: None,
            connect_timeout_secs: 5,
        }
    }

    /// Configuration for a SQLite file.
    pub fn sqlite(file_path: impl Into<String>) -> Self {
        Self {
            db_type: DbType::SQLite,
            host: None,
            port: None,
            username: None,
            password: None,
            database: None,
            file_path: Some(file_path.into()),
            connect_timeout_secs: 5,
        }
    }

    /// Sets the port.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Sets the connect timeout.
    pub fn with_connect_timeout_secs(mut self, secs: u64) -> Self {
        self.connect_timeout_secs = secs;
        self
    }

    /// Port to connect to, falling back to the type's default.
    pub fn effective_port(&self) -> Option<u16> {
        self.port.or_else(|| self.db_type.default_port())
    }

    /// Connect timeout as a [`Duration`].
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// Human-readable connection target, safe to log.
    pub fn target(&self) -> String {
        match self.db_type {
            DbType::MySQL => format!(
                "mysql://{}@{}:{}/{}",
                self.username.as_deref().unwrap_or("root"),
                self.host.as_deref().unwrap_or("localhost"),
                self.effective_port().unwrap_or_default(),
                self.database.as_deref().unwrap_or(""),
            ),
            DbType::SQLite => format!("sqlite:{}", self.file_path.as_deref().unwrap_or("")),
        }
    }
}

impl fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("db_type", &self.db_type)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "********"))
            .field("database", &self.database)
            .field("file_path", &self.file_path)
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .finish()
    }
}
