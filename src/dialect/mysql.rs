//! MySQL rules and metadata.

use crate::database::dsn::require_vars;
use crate::database::metadata::{
    expect_arity, extract_optional_string, extract_string, CatalogQuery, ColumnInfo, SchemaRow,
};
use crate::error::ServerError;
use crate::security::{DialectPolicy, DoubleQuote, LexicalRules, PatternRule};
use once_cell::sync::Lazy;

pub(super) const LEXICAL_RULES: LexicalRules = LexicalRules {
    hash_comments: true,
    dash_comment_needs_space: true,
    nested_block_comments: false,
    executable_comments: true,
    dollar_quoting: false,
    backslash_escapes: true,
    escape_string_prefix: false,
    double_quote: DoubleQuote::Literal,
    backtick_identifiers: true,
    bracket_identifiers: false,
};

/// Sleep, lock and replication-wait functions.
const DOS_FUNCTIONS: &[(&str, &str)] = &[
    ("SLEEP", "SLEEP()"),
    ("BENCHMARK", "BENCHMARK()"),
    ("GET_LOCK", "GET_LOCK()"),
    ("RELEASE_LOCK", "RELEASE_LOCK()"),
    ("IS_FREE_LOCK", "IS_FREE_LOCK()"),
    ("IS_USED_LOCK", "IS_USED_LOCK()"),
    ("WAIT_FOR_EXECUTED_GTID_SET", "WAIT_FOR_EXECUTED_GTID_SET()"),
    (
        "WAIT_UNTIL_SQL_THREAD_AFTER_GTIDS",
        "WAIT_UNTIL_SQL_THREAD_AFTER_GTIDS()",
    ),
    ("MASTER_POS_WAIT", "MASTER_POS_WAIT()"),
    ("SOURCE_POS_WAIT", "SOURCE_POS_WAIT()"),
];

const EXTRA_KEYWORDS: &[&str] = &["CALL", "EXEC", "EXECUTE", "REPLACE", "LOAD", "HANDLER", "RENAME"];

pub(super) static POLICY: Lazy<DialectPolicy> = Lazy::new(|| {
    DialectPolicy::new(
        vec![
            PatternRule::new(r"(?i)\bINTO\s+OUTFILE\b", "INTO OUTFILE"),
            PatternRule::new(r"(?i)\bINTO\s+DUMPFILE\b", "INTO DUMPFILE"),
            PatternRule::function("LOAD_FILE", "LOAD_FILE()"),
            PatternRule::new(r"(?i)\bINTO\s+@", "INTO @variable"),
        ],
        DOS_FUNCTIONS
            .iter()
            .map(|&(name, description)| PatternRule::function(name, description))
            .collect(),
        EXTRA_KEYWORDS,
        false,
    )
});

pub(super) const READ_ONLY_SESSION: &str = "SET SESSION TRANSACTION READ ONLY";

const ENV_VARS: &[&str] = &[
    "MCP_MYSQL_HOST",
    "MCP_MYSQL_PORT",
    "MCP_MYSQL_DB",
    "MCP_MYSQL_USER",
    "MCP_MYSQL_PASSWORD",
];

/// `user:password@tcp(host:port)/db`
pub(super) fn build_connection_string<F>(lookup: &F) -> Result<String, ServerError>
where
    F: Fn(&str) -> Option<String>,
{
    let values = require_vars(lookup, ENV_VARS)?;
    let [host, port, db, user, password] = values.as_slice() else {
        return Err(ServerError::config("MySQL connection settings are incomplete"));
    };
    Ok(format!("{user}:{password}@tcp({host}:{port})/{db}"))
}

/// The path segment after the last `/`, without parameters.
pub(super) fn database_name(dsn: &str) -> String {
    let without_params = dsn.split_once('?').map_or(dsn, |(head, _)| head);
    without_params
        .rsplit_once('/')
        .map(|(_, db)| db.to_string())
        .unwrap_or_default()
}

pub(super) fn list_tables_query(database: &str) -> CatalogQuery {
    CatalogQuery::new(
        "SELECT table_name FROM information_schema.tables WHERE table_schema = ?",
        vec![database.to_string()],
    )
}

pub(super) fn describe_table_query(database: &str, table: &str) -> CatalogQuery {
    CatalogQuery::new(
        "SELECT column_name, data_type, is_nullable, column_key, column_default, extra \
         FROM information_schema.columns \
         WHERE table_schema = ? AND table_name = ? \
         ORDER BY ordinal_position",
        vec![database.to_string(), table.to_string()],
    )
}

/// Row layout: column_name, data_type, is_nullable, column_key, column_default, extra.
pub(super) fn scan_schema_row(row: &SchemaRow) -> Result<ColumnInfo, ServerError> {
    expect_arity(row, 6)?;
    Ok(ColumnInfo {
        column_name: extract_string(row, 0, "column_name")?,
        data_type: extract_string(row, 1, "data_type")?,
        is_nullable: extract_string(row, 2, "is_nullable")?,
        column_key: Some(extract_optional_string(row, 3, "column_key")?.unwrap_or_default()),
        column_default: extract_optional_string(row, 4, "column_default")?,
        extra: extract_optional_string(row, 5, "extra")?.filter(|e| !e.is_empty()),
    })
}
