//! Configuration management for the read-only SQL guard.
//!
//! Configuration is loaded from environment variables following the 12-factor app pattern.

use crate::constants::{
    DEFAULT_MAX_QUERY_LENGTH, DEFAULT_MAX_RESULT_ROWS, DEFAULT_QUERY_TIMEOUT,
    DEFAULT_QUERY_TIMEOUT_SECS,
};
use crate::database::dsn::optional_var;
use crate::dialect::Dialect;
use crate::error::ServerError;
use crate::security::QueryGatekeeper;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;
use tracing::warn;

/// Configuration loaded from environment variables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Target database dialect
    pub dialect: Dialect,

    /// Explicit connection string, used instead of the per-dialect variables
    pub dsn_override: Option<String>,

    /// Query validation configuration
    pub security: SecurityConfig,

    /// Query execution limits
    pub execution: ExecutionConfig,
}

/// Query validation configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    /// Maximum query length (bytes)
    pub max_query_length: usize,
}

/// Limits applied when executing an accepted query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionConfig {
    /// Per-query timeout
    pub query_timeout: Duration,

    /// Maximum result rows returned per query
    pub max_rows: usize,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `MCP_DB_DRIVER`: `mysql` (default), `postgres`/`postgresql`, `sqlite`/`sqlite3`
    /// - `MCP_DSN`: Connection string override
    /// - `MCP_QUERY_TIMEOUT`: Query timeout in seconds (default: 30)
    /// - `MCP_MAX_ROWS`: Maximum result rows (default: 10000)
    /// - `MCP_MAX_QUERY_LENGTH`: Maximum query length in bytes (default: 1000000)
    ///
    /// Connection variables (`MCP_MYSQL_*`, `MCP_PG_*`, `MCP_SQLITE_PATH`) are only
    /// read by [`connection_string`](Self::connection_string).
    pub fn from_env() -> Result<Self, ServerError> {
        Self::from_lookup(env_lookup)
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ServerError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let dialect: Dialect = lookup("MCP_DB_DRIVER").unwrap_or_default().parse()?;

        let dsn_override = optional_var(&lookup, "MCP_DSN");

        let query_timeout_secs =
            parse_positive(&lookup, "MCP_QUERY_TIMEOUT", DEFAULT_QUERY_TIMEOUT_SECS);

        let max_rows = parse_positive(&lookup, "MCP_MAX_ROWS", DEFAULT_MAX_RESULT_ROWS);

        let max_query_length =
            parse_positive(&lookup, "MCP_MAX_QUERY_LENGTH", DEFAULT_MAX_QUERY_LENGTH);

        Ok(Config {
            dialect,
            dsn_override,
            security: SecurityConfig { max_query_length },
            execution: ExecutionConfig {
                query_timeout: Duration::from_secs(query_timeout_secs),
                max_rows,
            },
        })
    }

    /// Resolve the connection string from the process environment.
    pub fn connection_string(&self) -> Result<String, ServerError> {
        self.connection_string_from(env_lookup)
    }

    /// Resolve the connection string: the override if set, otherwise built by
    /// the dialect from `lookup`.
    pub fn connection_string_from<F>(&self, lookup: F) -> Result<String, ServerError>
    where
        F: Fn(&str) -> Option<String>,
    {
        match &self.dsn_override {
            Some(dsn) => Ok(dsn.clone()),
            None => self.dialect.build_connection_string(lookup),
        }
    }

    /// Build the gatekeeper for this configuration.
    pub fn gatekeeper(&self) -> QueryGatekeeper {
        QueryGatekeeper::new(self.dialect, self.security.max_query_length)
    }
}

fn env_lookup(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Parse a strictly positive number, keeping `default` (with a warning) when
/// the value is malformed or not positive.
fn parse_positive<F, T>(lookup: &F, name: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr + PartialOrd + Default + Display + Copy,
{
    let Some(raw) = optional_var(lookup, name) else {
        return default;
    };
    match raw.trim().parse::<T>() {
        Ok(value) if value > T::default() => value,
        _ => {
            warn!("Invalid {}={:?}, using default {}", name, raw, default);
            default
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            dialect: Dialect::default(),
            dsn_override: None,
            security: SecurityConfig::default(),
            execution: ExecutionConfig::default(),
        }
    }
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            max_query_length: DEFAULT_MAX_QUERY_LENGTH,
        }
    }
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            query_timeout: DEFAULT_QUERY_TIMEOUT,
            max_rows: DEFAULT_MAX_RESULT_ROWS,
        }
    }
}
