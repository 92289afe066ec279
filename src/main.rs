//! SQL read-only guard entry point.
//!
//! Validates each query given on the command line, or each non-empty line of
//! stdin when there are no arguments, and writes one JSON object per query to
//! stdout. Exits with status 1 if any query was rejected.

use anyhow::{Context, Result};
use serde::Serialize;
use sql_readonly_guard::{Config, QueryGatekeeper, RuleKind};
use std::io::{BufRead, Write};
use std::process::ExitCode;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// One line of output.
#[derive(Debug, Serialize)]
struct Report<'a> {
    query: &'a str,
    allowed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    rule: Option<RuleKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<String>,
}

impl<'a> Report<'a> {
    fn new(gatekeeper: &QueryGatekeeper, query: &'a str) -> Self {
        match gatekeeper.validate(query) {
            Ok(()) => Self {
                query,
                allowed: true,
                rule: None,
                reason: None,
            },
            Err(rejection) => Self {
                query,
                allowed: false,
                rule: Some(rejection.rule()),
                reason: Some(rejection.reason().to_string()),
            },
        }
    }
}

fn main() -> Result<ExitCode> {
    // stdout carries the reports; logs go to stderr
    init_logging();

    let config = Config::from_env()?;
    let gatekeeper = config.gatekeeper();
    info!(
        version = env!("CARGO_PKG_VERSION"),
        dialect = %config.dialect,
        "{} validating queries",
        config.dialect.server_name()
    );

    let args: Vec<String> = std::env::args().skip(1).collect();
    let queries = if args.is_empty() {
        read_stdin_queries()?
    } else {
        args
    };

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let mut rejected = 0usize;

    for query in &queries {
        let report = Report::new(&gatekeeper, query);
        if !report.allowed {
            rejected += 1;
        }
        serde_json::to_writer(&mut out, &report).context("Failed to write report")?;
        writeln!(out)?;
    }
    out.flush()?;

    info!(total = queries.len(), rejected, "Validation complete");

    Ok(if rejected > 0 {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

/// Non-empty stdin lines, trimmed.
fn read_stdin_queries() -> Result<Vec<String>> {
    let mut queries = Vec::new();
    for line in std::io::stdin().lock().lines() {
        let line = line.context("Failed to read stdin")?;
        let trimmed = line.trim();
        if !trimmed.is_empty() {
            queries.push(trimmed.to_string());
        }
    }
    Ok(queries)
}

/// Initialize tracing subscriber with stderr output.
fn init_logging() {
    let filter = std::env::var("RUST_LOG")
        .map(EnvFilter::new)
        .unwrap_or_else(|_| EnvFilter::new("warn,sql_readonly_guard=info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use sql_readonly_guard::Dialect;

    #[test]
    fn test_report_json() {
        let gatekeeper = QueryGatekeeper::for_dialect(Dialect::Sqlite);

        let report = Report::new(&gatekeeper, "SELECT 1");
        assert_eq!(
            serde_json::to_string(&report).unwrap(),
            r#"{"query":"SELECT 1","allowed":true}"#
        );

        let report = Report::new(&gatekeeper, "PRAGMA journal_mode = WAL");
        assert_eq!(
            serde_json::to_value(&report).unwrap(),
            serde_json::json!({
                "query": "PRAGMA journal_mode = WAL",
                "allowed": false,
                "rule": "disallowed_prefix",
                "reason": "only SELECT, SHOW, DESCRIBE, and EXPLAIN queries are allowed"
            })
        );
    }
}
