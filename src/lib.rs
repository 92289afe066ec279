//! # SQL Read-Only Guard
//!
//! A read-only SQL statement gatekeeper for MySQL, PostgreSQL and SQLite.
//!
//! Given an untrusted SQL string and a target dialect, the gatekeeper decides
//! before anything reaches a connection whether the statement is a single
//! read-only query free of file access and sleep/lock functions. It is a
//! lexical filter, not a parser: anything it cannot show to be safe is rejected.
//!
//! ## Architecture
//!
//! - [`security`]: literal/comment stripping, common and dialect policies, the
//!   [`QueryGatekeeper`] entry point
//! - [`dialect`]: per-engine lexical rules, rule tables and adapter metadata
//! - [`database`]: catalog queries and schema row normalization
//! - [`config`]: environment-driven configuration
//!
//! ```
//! use sql_readonly_guard::{Dialect, QueryGatekeeper};
//!
//! let gatekeeper = QueryGatekeeper::for_dialect(Dialect::MySql);
//! assert!(gatekeeper.validate("SELECT * FROM users WHERE name = 'DROP TABLE'").is_ok());
//!
//! let rejection = gatekeeper.validate("SELECT 1; DROP TABLE users").unwrap_err();
//! assert_eq!(rejection.reason(), "multiple statements are not allowed");
//! ```

pub mod config;
pub mod constants;
pub mod database;
pub mod dialect;
pub mod error;
pub mod security;

pub use config::{Config, ExecutionConfig};
pub use dialect::Dialect;
pub use error::ServerError;
pub use security::{QueryGatekeeper, Rejection, RuleKind, Verdict};
