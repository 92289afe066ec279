//! SQLite rules and metadata.

use crate::database::dsn::require_vars;
use crate::database::metadata::{
    expect_arity, extract_i64, extract_optional_string, extract_string, CatalogQuery, ColumnInfo,
    SchemaRow,
};
use crate::error::ServerError;
use crate::security::{escape_string_literal, DialectPolicy, DoubleQuote, LexicalRules, PatternRule};
use once_cell::sync::Lazy;

pub(super) const LEXICAL_RULES: LexicalRules = LexicalRules {
    hash_comments: false,
    dash_comment_needs_space: false,
    nested_block_comments: false,
    executable_comments: false,
    dollar_quoting: false,
    backslash_escapes: false,
    escape_string_prefix: false,
    double_quote: DoubleQuote::Identifier,
    backtick_identifiers: true,
    bracket_identifiers: true,
};

/// Extension loading and file-writing functions.
const FORBIDDEN_FUNCTIONS: &[(&str, &str)] = &[
    ("load_extension", "load_extension()"),
    ("writefile", "writefile()"),
    ("edit", "edit()"),
    ("fts3_tokenizer", "fts3_tokenizer()"),
];

const EXTRA_KEYWORDS: &[&str] = &["REPLACE", "ATTACH", "DETACH", "REINDEX", "VACUUM"];

pub(super) static POLICY: Lazy<DialectPolicy> = Lazy::new(|| {
    DialectPolicy::new(
        FORBIDDEN_FUNCTIONS
            .iter()
            .map(|&(name, description)| PatternRule::function(name, description))
            .collect(),
        Vec::new(),
        EXTRA_KEYWORDS,
        true,
    )
});

pub(super) const READ_ONLY_SESSION: &str = "PRAGMA query_only = ON";

/// Suffixes dropped from the file name when deriving a display name.
const FILE_SUFFIXES: &[&str] = &[".sqlite3", ".sqlite", ".db"];

/// The database path with `mode=ro` forced unless a mode is already given.
pub(super) fn build_connection_string<F>(lookup: &F) -> Result<String, ServerError>
where
    F: Fn(&str) -> Option<String>,
{
    let values = require_vars(lookup, &["MCP_SQLITE_PATH"])?;
    let [path] = values.as_slice() else {
        return Err(ServerError::config("SQLite connection settings are incomplete"));
    };

    Ok(match path.split_once('?') {
        None => format!("{path}?mode=ro"),
        Some((_, query)) if !query.contains("mode=") => format!("{path}&mode=ro"),
        Some(_) => path.clone(),
    })
}

/// The file name without directory, parameters or a known suffix.
pub(super) fn database_name(dsn: &str) -> String {
    let path = dsn.split_once('?').map_or(dsn, |(head, _)| head);
    let file = path.rsplit_once('/').map_or(path, |(_, file)| file);
    FILE_SUFFIXES
        .iter()
        .find_map(|suffix| file.strip_suffix(suffix))
        .unwrap_or(file)
        .to_string()
}

/// One database per file, so the database name is not used.
pub(super) fn list_tables_query() -> CatalogQuery {
    CatalogQuery::unbound(
        "SELECT name FROM sqlite_master \
         WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
    )
}

/// `PRAGMA table_info` takes no bound parameters; the name is embedded as a
/// quoted literal.
pub(super) fn describe_table_query(table: &str) -> CatalogQuery {
    CatalogQuery::unbound(format!("PRAGMA table_info({})", escape_string_literal(table)))
}

/// Row layout: cid, name, type, notnull, dflt_value, pk.
pub(super) fn scan_schema_row(row: &SchemaRow) -> Result<ColumnInfo, ServerError> {
    expect_arity(row, 6)?;
    let not_null = extract_i64(row, 3, "notnull")?;
    let pk = extract_i64(row, 5, "pk")?;

    Ok(ColumnInfo {
        column_name: extract_string(row, 1, "name")?,
        data_type: extract_string(row, 2, "type")?,
        is_nullable: if not_null == 1 { "NO" } else { "YES" }.to_string(),
        column_key: (pk > 0).then(|| "PRI".to_string()),
        column_default: extract_optional_string(row, 4, "dflt_value")?,
        extra: None,
    })
}
