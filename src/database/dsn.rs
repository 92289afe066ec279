//! Environment-driven connection string helpers.

use crate::error::ServerError;

/// Read every variable in `names`, reporting all missing ones together.
///
/// Empty values count as missing.
pub(crate) fn require_vars<F>(lookup: &F, names: &[&str]) -> Result<Vec<String>, ServerError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut values = Vec::with_capacity(names.len());
    let mut missing = Vec::new();

    for name in names {
        match lookup(name).filter(|v| !v.is_empty()) {
            Some(value) => values.push(value),
            None => missing.push(*name),
        }
    }

    if !missing.is_empty() {
        return Err(ServerError::config(format!(
            "missing required environment variables: [{}]",
            missing.join(" ")
        )));
    }

    Ok(values)
}

/// Read an optional variable, treating empty as unset.
pub(crate) fn optional_var<F>(lookup: &F, name: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_require_vars_present() {
        let lookup = lookup_from(&[("A", "1"), ("B", "2")]);
        assert_eq!(require_vars(&lookup, &["A", "B"]).unwrap(), vec!["1", "2"]);
    }

    #[test]
    fn test_require_vars_reports_all_missing() {
        let lookup = lookup_from(&[("A", "1"), ("C", "")]);
        let err = require_vars(&lookup, &["A", "B", "C"]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Configuration error: missing required environment variables: [B C]"
        );
    }

    #[test]
    fn test_optional_var() {
        let lookup = lookup_from(&[("A", ""), ("B", "x")]);
        assert_eq!(optional_var(&lookup, "A"), None);
        assert_eq!(optional_var(&lookup, "B").as_deref(), Some("x"));
        assert_eq!(optional_var(&lookup, "C"), None);
    }
}
