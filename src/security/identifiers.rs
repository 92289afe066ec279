//! Identifier and literal quoting for generated catalog SQL.

use crate::error::ServerError;

/// Maximum accepted identifier length.
pub const MAX_IDENTIFIER_LENGTH: usize = 128;

/// Delimiter a dialect uses for quoted identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentifierQuote {
    /// `` `name` `` (MySQL).
    Backtick,
    /// `"name"` (PostgreSQL, SQLite).
    DoubleQuote,
}

impl IdentifierQuote {
    /// The delimiter character.
    pub fn delimiter(self) -> char {
        match self {
            IdentifierQuote::Backtick => '`',
            IdentifierQuote::DoubleQuote => '"',
        }
    }
}

/// Quote an identifier, escaping embedded delimiters by doubling them.
///
/// Schema-qualified names are quoted part by part:
///
/// ```
/// use sql_readonly_guard::security::{escape_identifier, IdentifierQuote};
///
/// assert_eq!(escape_identifier("users", IdentifierQuote::Backtick).unwrap(), "`users`");
/// assert_eq!(
///     escape_identifier("public.users", IdentifierQuote::DoubleQuote).unwrap(),
///     "\"public\".\"users\""
/// );
/// ```
pub fn escape_identifier(identifier: &str, quote: IdentifierQuote) -> Result<String, ServerError> {
    validate_identifier(identifier)?;

    if let Some((schema, name)) = identifier.split_once('.') {
        if !schema.is_empty() && !name.is_empty() {
            return Ok(format!(
                "{}.{}",
                escape_single_identifier(schema, quote),
                escape_single_identifier(name, quote)
            ));
        }
    }

    Ok(escape_single_identifier(identifier, quote))
}

fn escape_single_identifier(identifier: &str, quote: IdentifierQuote) -> String {
    let delimiter = quote.delimiter();
    let escaped = identifier.replace(delimiter, &format!("{delimiter}{delimiter}"));
    format!("{delimiter}{escaped}{delimiter}")
}

/// Validate an identifier taken from untrusted input.
pub fn validate_identifier(identifier: &str) -> Result<(), ServerError> {
    if identifier.trim().is_empty() {
        return Err(ServerError::invalid_input("Identifier cannot be empty"));
    }

    if identifier.len() > MAX_IDENTIFIER_LENGTH {
        return Err(ServerError::invalid_input(format!(
            "Identifier exceeds maximum length of {} characters",
            MAX_IDENTIFIER_LENGTH
        )));
    }

    if identifier.chars().any(char::is_control) {
        return Err(ServerError::invalid_input(
            "Identifier contains control characters",
        ));
    }

    Ok(())
}

/// Quote a value as a single-quoted SQL literal.
pub fn escape_string_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}
