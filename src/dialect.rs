//! Supported SQL dialects.
//!
//! A [`Dialect`] bundles everything that differs between database engines: the
//! lexical rules used to strip literals and comments, the dialect policy layered
//! on top of the common read-only rules, and the adapter metadata (connection
//! strings, catalog queries, schema resource URIs).

mod mysql;
mod postgres;
mod sqlite;

use crate::database::{CatalogQuery, ColumnInfo, SchemaRow};
use crate::error::ServerError;
use crate::security::{
    check_common, escape_identifier, strip, validate_identifier, DialectPolicy, IdentifierQuote,
    LexicalRules, Rejection,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A database engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    #[default]
    MySql,
    Postgres,
    Sqlite,
}

impl Dialect {
    /// Every supported dialect.
    pub const ALL: [Dialect; 3] = [Dialect::MySql, Dialect::Postgres, Dialect::Sqlite];

    /// Lexical conventions used by [`strip`](Self::strip).
    pub fn lexical_rules(&self) -> &'static LexicalRules {
        match self {
            Dialect::MySql => &mysql::LEXICAL_RULES,
            Dialect::Postgres => &postgres::LEXICAL_RULES,
            Dialect::Sqlite => &sqlite::LEXICAL_RULES,
        }
    }

    /// Dialect-specific rules.
    pub fn policy(&self) -> &'static DialectPolicy {
        match self {
            Dialect::MySql => &*mysql::POLICY,
            Dialect::Postgres => &*postgres::POLICY,
            Dialect::Sqlite => &*sqlite::POLICY,
        }
    }

    /// Replace literals and comments so keyword checks only see code.
    pub fn strip(&self, sql: &str) -> String {
        strip(sql, self.lexical_rules())
    }

    /// Run only the dialect-specific rules.
    pub fn check_dialect(&self, raw: &str, cleaned: &str) -> Result<(), Rejection> {
        self.policy().check(raw, cleaned)
    }

    /// Validate a query: strip, then common rules, then dialect rules.
    ///
    /// ```
    /// use sql_readonly_guard::Dialect;
    ///
    /// assert!(Dialect::Postgres.validate("SELECT * FROM users").is_ok());
    /// assert!(Dialect::Postgres.validate("SELECT pg_sleep(10)").is_err());
    /// assert!(Dialect::MySql.validate("SELECT pg_sleep(10)").is_ok());
    /// ```
    pub fn validate(&self, raw: &str) -> Result<(), Rejection> {
        let cleaned = self.strip(raw);
        check_common(raw, &cleaned)?;
        self.check_dialect(raw, &cleaned)
    }

    /// Driver name, also accepted by [`FromStr`].
    pub fn driver_name(&self) -> &'static str {
        match self {
            Dialect::MySql => "mysql",
            Dialect::Postgres => "postgres",
            Dialect::Sqlite => "sqlite",
        }
    }

    /// Name the server announces for this dialect.
    pub fn server_name(&self) -> &'static str {
        match self {
            Dialect::MySql => "mysql-readonly-mcp-server",
            Dialect::Postgres => "postgres-readonly-mcp-server",
            Dialect::Sqlite => "sqlite-readonly-mcp-server",
        }
    }

    /// Scheme of schema resource URIs.
    pub fn uri_scheme(&self) -> &'static str {
        self.driver_name()
    }

    pub fn identifier_quote(&self) -> IdentifierQuote {
        match self {
            Dialect::MySql => IdentifierQuote::Backtick,
            Dialect::Postgres | Dialect::Sqlite => IdentifierQuote::DoubleQuote,
        }
    }

    /// Quote an identifier in this dialect's style.
    pub fn quote_identifier(&self, name: &str) -> Result<String, ServerError> {
        escape_identifier(name, self.identifier_quote())
    }

    /// Whether backslash escapes inside ordinary string literals.
    pub fn backslash_escapes(&self) -> bool {
        self.lexical_rules().backslash_escapes
    }

    /// Build a connection string from environment-style variables.
    ///
    /// All missing required variables are reported in a single error.
    pub fn build_connection_string<F>(&self, lookup: F) -> Result<String, ServerError>
    where
        F: Fn(&str) -> Option<String>,
    {
        match self {
            Dialect::MySql => mysql::build_connection_string(&lookup),
            Dialect::Postgres => postgres::build_connection_string(&lookup),
            Dialect::Sqlite => sqlite::build_connection_string(&lookup),
        }
    }

    /// Database (or file) name shown in resource URIs.
    pub fn database_name(&self, dsn: &str) -> String {
        match self {
            Dialect::MySql => mysql::database_name(dsn),
            Dialect::Postgres => postgres::database_name(dsn),
            Dialect::Sqlite => sqlite::database_name(dsn),
        }
    }

    /// Statement that puts a fresh session into read-only mode.
    pub fn read_only_session_statement(&self) -> &'static str {
        match self {
            Dialect::MySql => mysql::READ_ONLY_SESSION,
            Dialect::Postgres => postgres::READ_ONLY_SESSION,
            Dialect::Sqlite => sqlite::READ_ONLY_SESSION,
        }
    }

    pub fn list_tables_query(&self, database: &str) -> CatalogQuery {
        match self {
            Dialect::MySql => mysql::list_tables_query(database),
            Dialect::Postgres => postgres::list_tables_query(database),
            Dialect::Sqlite => sqlite::list_tables_query(),
        }
    }

    pub fn describe_table_query(&self, database: &str, table: &str) -> CatalogQuery {
        match self {
            Dialect::MySql => mysql::describe_table_query(database, table),
            Dialect::Postgres => postgres::describe_table_query(database, table),
            Dialect::Sqlite => sqlite::describe_table_query(table),
        }
    }

    /// Normalize one row of [`describe_table_query`](Self::describe_table_query).
    pub fn scan_schema_row(&self, row: &SchemaRow) -> Result<ColumnInfo, ServerError> {
        match self {
            Dialect::MySql => mysql::scan_schema_row(row),
            Dialect::Postgres => postgres::scan_schema_row(row),
            Dialect::Sqlite => sqlite::scan_schema_row(row),
        }
    }

    /// `<scheme>://<db>/<table>/schema`
    pub fn schema_resource_uri(&self, database: &str, table: &str) -> String {
        format!("{}://{}/{}/schema", self.uri_scheme(), database, table)
    }

    /// Split a schema resource URI into `(database, table)`.
    pub fn parse_schema_resource_uri(&self, uri: &str) -> Result<(String, String), ServerError> {
        let scheme = self.uri_scheme();
        let Some(rest) = uri
            .strip_prefix(scheme)
            .and_then(|rest| rest.strip_prefix("://"))
        else {
            return Err(ServerError::invalid_input(format!(
                "Invalid resource URI: must start with {}://",
                scheme
            )));
        };

        let format_error = || {
            ServerError::invalid_input(format!(
                "Invalid resource URI format: expected {}://dbname/tablename/schema",
                scheme
            ))
        };

        let parts: Vec<&str> = rest.split('/').collect();
        let [database, table, "schema"] = parts.as_slice() else {
            return Err(format_error());
        };
        if database.is_empty() || table.is_empty() {
            return Err(format_error());
        }
        validate_identifier(table)?;

        Ok((database.to_string(), table.to_string()))
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.driver_name())
    }
}

impl FromStr for Dialect {
    type Err = ServerError;

    /// Parse a driver name. Empty selects MySQL.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let driver = s.trim().to_lowercase();
        match driver.as_str() {
            "" | "mysql" => Ok(Dialect::MySql),
            "postgres" | "postgresql" => Ok(Dialect::Postgres),
            "sqlite" | "sqlite3" => Ok(Dialect::Sqlite),
            _ => Err(ServerError::config(format!(
                "unsupported database driver: {} (supported: mysql, postgres, sqlite)",
                driver
            ))),
        }
    }
}
