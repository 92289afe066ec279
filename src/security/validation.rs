//! Query gatekeeper: the single validation entry point.

use super::verdict::{Rejection, RuleKind, Verdict};
use crate::constants::{DEFAULT_MAX_QUERY_LENGTH, LOG_QUERY_TRUNCATE_LENGTH};
use crate::dialect::Dialect;
use tracing::{debug, warn};

/// Validates untrusted queries for one dialect.
///
/// Stateless apart from its configuration, so one instance can be shared across
/// threads and called concurrently.
#[derive(Debug, Clone)]
pub struct QueryGatekeeper {
    dialect: Dialect,
    max_length: usize,
}

impl QueryGatekeeper {
    /// Create a gatekeeper with an explicit query length limit in bytes.
    pub fn new(dialect: Dialect, max_length: usize) -> Self {
        Self {
            dialect,
            max_length,
        }
    }

    /// Create a gatekeeper with the default length limit.
    pub fn for_dialect(dialect: Dialect) -> Self {
        Self::new(dialect, DEFAULT_MAX_QUERY_LENGTH)
    }

    /// Decide whether `query` is read-only and safe to execute.
    ///
    /// On rejection the query must not be executed; the rejection's reason is
    /// meant to be shown to the caller verbatim.
    pub fn validate(&self, query: &str) -> Result<(), Rejection> {
        debug!(
            dialect = %self.dialect,
            "Validating query: {}",
            truncate_for_log(query, LOG_QUERY_TRUNCATE_LENGTH)
        );

        let result = self.check(query);
        if let Err(rejection) = &result {
            warn!(
                dialect = %self.dialect,
                rule = rejection.rule().as_str(),
                "Query rejected: {}",
                rejection
            );
        }
        result
    }

    /// Same as [`validate`](Self::validate), as a [`Verdict`].
    pub fn verdict(&self, query: &str) -> Verdict {
        self.validate(query).into()
    }

    fn check(&self, query: &str) -> Result<(), Rejection> {
        if query.len() > self.max_length {
            return Err(Rejection::new(
                RuleKind::QueryTooLong,
                format!("query exceeds maximum length of {} bytes", self.max_length),
            ));
        }
        self.dialect.validate(query)
    }

    /// The dialect this gatekeeper validates for.
    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Maximum accepted query length in bytes.
    pub fn max_length(&self) -> usize {
        self.max_length
    }
}

/// Truncate a string for logging, on a character boundary.
pub fn truncate_for_log(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        return s.to_string();
    }
    let mut end = max_len;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &s[..end])
}
