//! Security module: lexical stripping and read-only query validation.

mod identifiers;
mod lexer;
mod policy;
mod validation;
mod verdict;

pub use identifiers::{
    escape_identifier, escape_string_literal, validate_identifier, IdentifierQuote,
    MAX_IDENTIFIER_LENGTH,
};
pub use lexer::{strip, DoubleQuote, LexicalRules};
pub use policy::{check_common, DialectPolicy};
pub(crate) use policy::PatternRule;
pub use validation::{truncate_for_log, QueryGatekeeper};
pub use verdict::{Rejection, RuleKind, Verdict};
