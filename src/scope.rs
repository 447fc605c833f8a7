//! Scope resolution - names that are never model roots
//!
//! Three sources feed the exclusion set:
//! - Declared fragment parameters (supplied by the caller)
//! - `th:with` local bindings found in the template
//! - Reserved roots (literals, context objects, textual operators)
//!
//! Loop aliases are not part of the scope: paths rooted at an
//! alias are kept and redirected under the iterable during synthesis.

use std::collections::HashSet;

use indexmap::IndexSet;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::scan::{attribute_regex, attribute_values, is_valid_identifier, split_top_level};

/// Roots that never denote model data
pub const RESERVED_ROOTS: &[&str] = &[
    // literals
    "true", "false", "null",
    // context objects
    "param", "session", "application", "request", "response", "this",
    // textual operators
    "and", "or", "not", "gt", "lt", "ge", "le", "eq", "ne", "div", "mod",
    // SpEL keywords
    "matches", "instanceof", "new", "between",
];

static WITH_RE: Lazy<Regex> = Lazy::new(|| attribute_regex("with"));

/// Exclusion set for one template analysis
#[derive(Debug, Clone, Default)]
pub struct Scope {
    /// Parameters and local bindings
    excluded: HashSet<String>,
    /// Reserved roots on top of [`RESERVED_ROOTS`] (from configuration)
    extra_reserved: HashSet<String>,
}

impl Scope {
    /// Scope with only the built-in reserved roots
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the full scope of a template: parameters plus `th:with` locals
    pub fn resolve<I, S>(html: &str, parameter_names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new()
            .with_parameters(parameter_names)
            .with_parameters(extract_local_variables(html))
    }

    /// Add caller-declared names (fragment parameters, locals)
    pub fn with_parameters<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.excluded.extend(names.into_iter().map(Into::into));
        self
    }

    /// Add reserved roots beyond the built-in ones
    pub fn with_reserved_roots<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extra_reserved.extend(names.into_iter().map(Into::into));
        self
    }

    /// Same reserved roots, no parameters or locals
    pub fn reserved_only(&self) -> Self {
        Self {
            excluded: HashSet::new(),
            extra_reserved: self.extra_reserved.clone(),
        }
    }

    pub fn is_reserved(&self, name: &str) -> bool {
        RESERVED_ROOTS.contains(&name) || self.extra_reserved.contains(name)
    }

    pub fn is_excluded(&self, name: &str) -> bool {
        self.is_reserved(name) || self.excluded.contains(name)
    }
}

/// Names bound by every `th:with` attribute in the template
///
/// Each top-level comma segment is either `name = expression` or a bare
/// `name`; anything that is not a valid identifier is ignored.
pub fn extract_local_variables(html: &str) -> IndexSet<String> {
    let mut locals = IndexSet::new();
    for raw in attribute_values(&WITH_RE, html) {
        if raw.trim().is_empty() {
            continue;
        }
        for assignment in split_top_level(raw, ',') {
            let candidate = match assignment.find('=') {
                Some(0) => continue,
                Some(eq) => assignment[..eq].trim(),
                None => assignment,
            };
            if is_valid_identifier(candidate) {
                locals.insert(candidate.to_string());
            }
        }
    }
    locals
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reserved_roots_are_always_excluded() {
        let scope = Scope::new();
        for name in ["true", "false", "null", "param", "session", "and", "matches", "instanceof", "new", "between"] {
            assert!(scope.is_excluded(name), "{name}");
        }
        assert!(!scope.is_excluded("user"));
    }

    #[test]
    fn parameters_and_extra_reserved() {
        let scope = Scope::new()
            .with_parameters(["label", "styleType"])
            .with_reserved_roots(["messages"]);
        assert!(scope.is_excluded("label"));
        assert!(scope.is_excluded("styleType"));
        assert!(scope.is_reserved("messages"));
        assert!(!scope.is_reserved("label"));

        let reserved = scope.reserved_only();
        assert!(!reserved.is_excluded("label"));
        assert!(reserved.is_excluded("messages"));
    }

    #[test]
    fn with_assignments() {
        let html = r#"<div th:with="localText='hello', total=${a + b}, fn=${f(x, y)}">"#;
        let locals = extract_local_variables(html);
        assert_eq!(
            locals.into_iter().collect::<Vec<_>>(),
            vec!["localText", "total", "fn"]
        );
    }

    #[test]
    fn with_bare_names_and_garbage() {
        let html = r#"<div th:with="flag, =oops, 1bad = 2, ok = 1"></div><p th:with=''></p>"#;
        let locals = extract_local_variables(html);
        assert!(locals.contains("flag"));
        assert!(locals.contains("ok"));
        assert!(!locals.contains("1bad"));
        assert_eq!(locals.len(), 2);
    }

    #[test]
    fn with_single_quoted_and_data_attribute() {
        let html = r#"<a th:with='x = ${y}'></a><b data-th-with="z=1"></b>"#;
        let locals = extract_local_variables(html);
        assert!(locals.contains("x"));
        assert!(locals.contains("z"));
    }

    #[test]
    fn resolve_combines_parameters_and_locals() {
        let html = r#"<section th:with="localText='hello'"><p th:text="${localText}"></p></section>"#;
        let scope = Scope::resolve(html, ["label"]);
        assert!(scope.is_excluded("label"));
        assert!(scope.is_excluded("localText"));
        assert!(!scope.is_excluded("member"));
    }
}
