//! Read-only policy rules.
//!
//! Every rule is a pure predicate over the raw query and its stripped form.
//! Function-call and clause shapes are matched on both texts, so neither a
//! literal nor a comment between the tokens hides them. Bare keywords are
//! matched on the stripped text only so literals cannot trigger them.

use super::verdict::{Rejection, RuleKind};
use once_cell::sync::Lazy;
use regex::Regex;

/// Leading keywords a read-only query may start with.
const ALLOWED_PREFIXES: &[&str] = &["SELECT", "SHOW", "DESCRIBE", "DESC", "EXPLAIN"];

/// Statement keywords blocked in every dialect.
const COMMON_DANGEROUS_KEYWORDS: &[&str] = &[
    "INSERT", "UPDATE", "DELETE", "DROP", "CREATE", "ALTER", "TRUNCATE", "GRANT", "REVOKE",
];

/// Compile a hardcoded pattern.
///
/// Patterns are constants covered by tests, so failure is a programming error.
fn compile(pattern: &str) -> Regex {
    Regex::new(pattern)
        .unwrap_or_else(|e| panic!("Internal error: invalid regex pattern '{}': {}", pattern, e))
}

static COMMON_KEYWORDS: Lazy<Vec<KeywordRule>> =
    Lazy::new(|| COMMON_DANGEROUS_KEYWORDS.iter().copied().map(KeywordRule::new).collect());

/// `SET` as a statement: at the start or right after a terminator.
static SET_STATEMENT: Lazy<Regex> = Lazy::new(|| compile(r"(?i)(?:^|;)\s*SET\b"));

/// `PRAGMA name = value`.
static PRAGMA_WRITE: Lazy<Regex> = Lazy::new(|| compile(r"(?i)\bPRAGMA\s+\w+\s*="));

/// A keyword matched as a whole word.
///
/// Word boundaries are anything other than ASCII letters and underscore, so
/// `created_at` does not match `CREATE` while `x.drop` still matches `DROP`.
#[derive(Debug)]
pub(crate) struct KeywordRule {
    keyword: &'static str,
    pattern: Regex,
}

impl KeywordRule {
    pub(crate) fn new(keyword: &'static str) -> Self {
        Self {
            keyword,
            pattern: compile(&format!(
                r"(?i)(?:^|[^a-zA-Z_]){}(?:[^a-zA-Z_]|$)",
                regex::escape(keyword)
            )),
        }
    }

    fn check(&self, cleaned: &str) -> Result<(), Rejection> {
        if self.pattern.is_match(cleaned) {
            return Err(Rejection::new(
                RuleKind::ForbiddenKeyword,
                format!("query contains forbidden keyword: {}", self.keyword),
            ));
        }
        Ok(())
    }
}

/// A case-insensitive pattern with the name it is reported under.
#[derive(Debug)]
pub(crate) struct PatternRule {
    description: &'static str,
    pattern: Regex,
}

impl PatternRule {
    pub(crate) fn new(pattern: &str, description: &'static str) -> Self {
        Self {
            description,
            pattern: compile(pattern),
        }
    }

    /// A call to `name(...)`, reported as `name()`. The name may be quoted.
    pub(crate) fn function(name: &'static str, description: &'static str) -> Self {
        Self::new(
            &format!(r#"(?i)\b{}["`\]]?\s*\("#, regex::escape(name)),
            description,
        )
    }

    fn is_match(&self, text: &str) -> bool {
        self.pattern.is_match(text)
    }

    /// Match either form of the query. The stripped form turns comments into
    /// spaces; the raw form still sees calls spelled inside literals.
    fn matches_either(&self, raw: &str, cleaned: &str) -> bool {
        self.is_match(raw) || self.is_match(cleaned)
    }
}

/// Run the dialect-independent rules. First failure wins.
pub fn check_common(raw: &str, cleaned: &str) -> Result<(), Rejection> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(Rejection::new(RuleKind::EmptyQuery, "empty query"));
    }

    if !has_allowed_prefix(trimmed) {
        return Err(Rejection::new(
            RuleKind::DisallowedPrefix,
            "only SELECT, SHOW, DESCRIBE, and EXPLAIN queries are allowed",
        ));
    }

    if has_stacked_statement(cleaned) {
        return Err(Rejection::new(
            RuleKind::MultipleStatements,
            "multiple statements are not allowed",
        ));
    }

    for rule in COMMON_KEYWORDS.iter() {
        rule.check(cleaned)?;
    }

    if is_set_statement(cleaned) {
        return Err(Rejection::new(
            RuleKind::SetStatement,
            "SET statements are not allowed",
        ));
    }

    Ok(())
}

/// Whether `trimmed` starts with an allowed keyword followed by whitespace, or
/// is exactly that keyword.
fn has_allowed_prefix(trimmed: &str) -> bool {
    ALLOWED_PREFIXES.iter().any(|keyword| {
        let Some(head) = trimmed.get(..keyword.len()) else {
            return false;
        };
        if !head.eq_ignore_ascii_case(keyword) {
            return false;
        }
        trimmed[keyword.len()..]
            .chars()
            .next()
            .is_none_or(char::is_whitespace)
    })
}

/// Anything but whitespace after the first `;`.
fn has_stacked_statement(cleaned: &str) -> bool {
    cleaned
        .split_once(';')
        .is_some_and(|(_, rest)| !rest.trim().is_empty())
}

fn is_set_statement(cleaned: &str) -> bool {
    SET_STATEMENT.is_match(cleaned)
}

/// Dialect-specific rules layered on top of [`check_common`].
#[derive(Debug)]
pub struct DialectPolicy {
    patterns: Vec<PatternRule>,
    functions: Vec<PatternRule>,
    keywords: Vec<KeywordRule>,
    block_pragma_writes: bool,
}

impl DialectPolicy {
    pub(crate) fn new(
        patterns: Vec<PatternRule>,
        functions: Vec<PatternRule>,
        keywords: &[&'static str],
        block_pragma_writes: bool,
    ) -> Self {
        Self {
            patterns,
            functions,
            keywords: keywords.iter().copied().map(KeywordRule::new).collect(),
            block_pragma_writes,
        }
    }

    /// Check forbidden patterns, then DoS functions, then extra keywords, then
    /// pragma writes.
    pub fn check(&self, raw: &str, cleaned: &str) -> Result<(), Rejection> {
        if let Some(rule) = self
            .patterns
            .iter()
            .find(|rule| rule.matches_either(raw, cleaned))
        {
            return Err(Rejection::new(
                RuleKind::ForbiddenPattern,
                format!("query contains forbidden pattern: {}", rule.description),
            ));
        }

        if let Some(rule) = self
            .functions
            .iter()
            .find(|rule| rule.matches_either(raw, cleaned))
        {
            return Err(Rejection::new(
                RuleKind::ForbiddenFunction,
                format!("query contains forbidden function: {}", rule.description),
            ));
        }

        for rule in &self.keywords {
            rule.check(cleaned)?;
        }

        if self.block_pragma_writes && PRAGMA_WRITE.is_match(cleaned) {
            return Err(Rejection::new(
                RuleKind::PragmaWrite,
                "PRAGMA writes are not allowed",
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn common(sql: &str) -> Result<(), Rejection> {
        // Plain queries without literals or comments strip to themselves.
        check_common(sql, sql)
    }

    #[test]
    fn test_empty_query() {
        assert_eq!(common("").unwrap_err().rule(), RuleKind::EmptyQuery);
        assert_eq!(common(" \n\t ").unwrap_err().reason(), "empty query");
    }

    #[test]
    fn test_allowed_prefixes() {
        for sql in [
            "SELECT 1",
            "select * from t",
            "  SHOW TABLES",
            "DESCRIBE users",
            "DESC users",
            "desc",
            "DESCRIBE",
            "EXPLAIN SELECT 1",
            "SELECT\n*\nFROM t",
        ] {
            assert!(common(sql).is_ok(), "{sql:?}");
        }
    }

    #[test]
    fn test_disallowed_prefixes() {
        for sql in [
            "UPDATE t SET x = 1",
            "SELECTX FROM t",
            "DESCRIPTION",
            "WITH x AS (SELECT 1) SELECT * FROM x",
            "(SELECT 1)",
            "VALUES (1)",
        ] {
            let err = common(sql).unwrap_err();
            assert_eq!(err.rule(), RuleKind::DisallowedPrefix, "{sql:?}");
            assert_eq!(
                err.reason(),
                "only SELECT, SHOW, DESCRIBE, and EXPLAIN queries are allowed"
            );
        }
    }

    #[test]
    fn test_prefix_ignores_unicode_case_folding() {
        // U+017F folds to 'S' under full Unicode uppercasing.
        assert!(common("\u{17f}ELECT 1").is_err());
    }

    #[test]
    fn test_multiple_statements() {
        let err = common("SELECT 1; SELECT 2").unwrap_err();
        assert_eq!(err.rule(), RuleKind::MultipleStatements);
        assert_eq!(err.reason(), "multiple statements are not allowed");

        assert!(common("SELECT 1;").is_ok());
        assert!(common("SELECT 1;  \n\t").is_ok());
        assert!(common("SELECT 1;;").is_err());
    }

    #[test]
    fn test_common_keywords() {
        let err = common("SELECT 1 FROM t WHERE x IN (DELETE)").unwrap_err();
        assert_eq!(err.reason(), "query contains forbidden keyword: DELETE");

        assert!(common("SELECT created_at, updated_at, deleted FROM orders").is_ok());
        assert!(common("SELECT * FROM user_grants").is_ok());
        assert!(common("EXPLAIN drop").is_err());
    }

    #[test]
    fn test_first_listed_keyword_is_reported() {
        let err = common("SELECT drop, insert FROM t").unwrap_err();
        assert_eq!(err.reason(), "query contains forbidden keyword: INSERT");
    }

    #[test]
    fn test_set_statement_detection() {
        assert!(is_set_statement("SET @a = 1"));
        assert!(is_set_statement("SELECT 1; set x = 2"));
        assert!(!is_set_statement("SELECT * FROM settings"));
        assert!(!is_set_statement("SELECT offset FROM t"));
    }

    #[test]
    fn test_dialect_policy_order() {
        let policy = DialectPolicy::new(
            vec![PatternRule::new(r"(?i)\bINTO\s+OUTFILE\b", "INTO OUTFILE")],
            vec![PatternRule::function("SLEEP", "SLEEP()")],
            &["CALL"],
            true,
        );

        let err = policy
            .check("SELECT SLEEP(1) INTO OUTFILE 'x'", "SELECT SLEEP(1) INTO OUTFILE ''")
            .unwrap_err();
        assert_eq!(err.rule(), RuleKind::ForbiddenPattern);

        let err = policy
            .check("SELECT sleep (1), call", "SELECT sleep (1), call")
            .unwrap_err();
        assert_eq!(err.reason(), "query contains forbidden function: SLEEP()");

        let err = policy.check("SELECT call", "SELECT call").unwrap_err();
        assert_eq!(err.reason(), "query contains forbidden keyword: CALL");

        let err = policy
            .check("EXPLAIN PRAGMA cache_size=0", "EXPLAIN PRAGMA cache_size=0")
            .unwrap_err();
        assert_eq!(err.rule(), RuleKind::PragmaWrite);
        assert!(policy.check("EXPLAIN PRAGMA table_info('t')", "EXPLAIN PRAGMA table_info('')").is_ok());
    }

    #[test]
    fn test_function_pattern_needs_call() {
        let rule = PatternRule::function("SLEEP", "SLEEP()");
        assert!(rule.is_match("SELECT sleep(1)"));
        assert!(rule.is_match("SELECT SLEEP \n (1)"));
        assert!(!rule.is_match("SELECT sleep FROM t"));
        assert!(!rule.is_match("SELECT deep_sleep(1)"));
    }

    #[test]
    fn test_function_pattern_allows_quoted_name() {
        let rule = PatternRule::function("pg_sleep", "pg_sleep()");
        assert!(rule.is_match(r#"SELECT "pg_sleep"(1)"#));
        assert!(rule.is_match("SELECT `pg_sleep` (1)"));
        assert!(rule.is_match("SELECT [pg_sleep](1)"));
        assert!(!rule.is_match(r#"SELECT "pg_sleeper"(1)"#));
    }

    #[test]
    fn test_dialect_policy_checks_cleaned_text() {
        let policy = DialectPolicy::new(
            vec![PatternRule::new(r"(?i)\bINTO\s+OUTFILE\b", "INTO OUTFILE")],
            vec![PatternRule::function("SLEEP", "SLEEP()")],
            &[],
            false,
        );

        let err = policy
            .check("SELECT SLEEP/**/(1)", "SELECT SLEEP (1)")
            .unwrap_err();
        assert_eq!(err.reason(), "query contains forbidden function: SLEEP()");

        let err = policy
            .check("SELECT 1 INTO/**/OUTFILE 'x'", "SELECT 1 INTO OUTFILE ''")
            .unwrap_err();
        assert_eq!(err.reason(), "query contains forbidden pattern: INTO OUTFILE");
    }
}
