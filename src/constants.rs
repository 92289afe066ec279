//! Centralized constants for the read-only SQL guard.
//!
//! Default values used throughout the codebase, kept in one place so they are
//! easy to find and change.

use std::time::Duration;

// =============================================================================
// Execution Constants
// =============================================================================

/// Default query timeout in seconds.
pub const DEFAULT_QUERY_TIMEOUT_SECS: u64 = 30;

/// Default query timeout as Duration.
pub const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(DEFAULT_QUERY_TIMEOUT_SECS);

/// Default maximum result rows.
pub const DEFAULT_MAX_RESULT_ROWS: usize = 10_000;

// =============================================================================
// Validation Constants
// =============================================================================

/// Default maximum query length in bytes.
pub const DEFAULT_MAX_QUERY_LENGTH: usize = 1_000_000;

// =============================================================================
// Connection Constants
// =============================================================================

/// Default PostgreSQL `sslmode` when `MCP_PG_SSLMODE` is unset.
pub const DEFAULT_PG_SSLMODE: &str = "prefer";

// =============================================================================
// Logging Constants
// =============================================================================

/// Default truncation length for query logging.
pub const LOG_QUERY_TRUNCATE_LENGTH: usize = 100;
