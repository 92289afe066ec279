//! Validation outcomes.

use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// The policy rule that rejected a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleKind {
    /// Query is empty or whitespace only.
    EmptyQuery,
    /// Query is longer than the configured limit.
    QueryTooLong,
    /// Query does not start with an allowed leading keyword.
    DisallowedPrefix,
    /// Something other than whitespace follows the first statement terminator.
    MultipleStatements,
    /// A blocked statement keyword appears outside literals and comments.
    ForbiddenKeyword,
    /// A `SET` statement.
    SetStatement,
    /// A file or privileged I/O construct.
    ForbiddenPattern,
    /// A sleep, lock or replication-wait function call.
    ForbiddenFunction,
    /// A `PRAGMA name = value` write.
    PragmaWrite,
}

impl RuleKind {
    /// Stable snake_case name, used in logs and CLI output.
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleKind::EmptyQuery => "empty_query",
            RuleKind::QueryTooLong => "query_too_long",
            RuleKind::DisallowedPrefix => "disallowed_prefix",
            RuleKind::MultipleStatements => "multiple_statements",
            RuleKind::ForbiddenKeyword => "forbidden_keyword",
            RuleKind::SetStatement => "set_statement",
            RuleKind::ForbiddenPattern => "forbidden_pattern",
            RuleKind::ForbiddenFunction => "forbidden_function",
            RuleKind::PragmaWrite => "pragma_write",
        }
    }
}

impl fmt::Display for RuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A query rejection.
///
/// Displays as the human-readable reason, which callers surface verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{reason}")]
pub struct Rejection {
    rule: RuleKind,
    reason: String,
}

impl Rejection {
    pub(crate) fn new(rule: RuleKind, reason: impl Into<String>) -> Self {
        Self {
            rule,
            reason: reason.into(),
        }
    }

    /// The rule that fired.
    pub fn rule(&self) -> RuleKind {
        self.rule
    }

    /// The reason, e.g. `query contains forbidden keyword: DROP`.
    pub fn reason(&self) -> &str {
        &self.reason
    }

    /// Text for a tool-error payload.
    pub fn tool_message(&self) -> String {
        format!("Query rejected: {}", self.reason)
    }
}

/// Final outcome of validating one query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Allowed,
    Rejected(Rejection),
}

impl Verdict {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Verdict::Allowed)
    }

    /// The rejection, if any.
    pub fn rejection(&self) -> Option<&Rejection> {
        match self {
            Verdict::Allowed => None,
            Verdict::Rejected(rejection) => Some(rejection),
        }
    }

    pub fn into_result(self) -> Result<(), Rejection> {
        match self {
            Verdict::Allowed => Ok(()),
            Verdict::Rejected(rejection) => Err(rejection),
        }
    }
}

impl From<Result<(), Rejection>> for Verdict {
    fn from(result: Result<(), Rejection>) -> Self {
        match result {
            Ok(()) => Verdict::Allowed,
            Err(rejection) => Verdict::Rejected(rejection),
        }
    }
}
