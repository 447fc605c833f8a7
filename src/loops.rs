//! Loop binding extraction - `th:each` alias → iterable path
//!
//! Accepted value shapes:
//! - `item : ${items}`
//! - `item, stat : ${page.rows}` (every alias binds to the same iterable)
//! - `(key, value) : ${map}`
//!
//! The iterable is resolved with the same path extractor used for
//! expressions (no exclusions beyond reserved roots); only its first path is
//! used. Constructs without a resolvable iterable are skipped.

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::expression::extract_model_paths;
use crate::model_path::ModelPath;
use crate::scan::{
    attribute_regex, attribute_values, find_top_level, is_valid_identifier,
    neutralize_string_literals, split_top_level,
};
use crate::scope::Scope;

static EACH_RE: Lazy<Regex> = Lazy::new(|| attribute_regex("each"));

/// Alias → iterable path, in declaration order
pub type LoopBindings = IndexMap<String, ModelPath>;

/// Extract every loop binding declared in the template
pub fn extract_loop_variable_paths(html: &str, scope: &Scope) -> LoopBindings {
    let mut bindings = LoopBindings::new();
    for raw in attribute_values(&EACH_RE, html) {
        let Some((aliases, iterable)) = parse_each(raw, scope) else {
            tracing::trace!(value = raw, "skipping unresolvable th:each");
            continue;
        };
        for alias in aliases {
            bindings.entry(alias).or_insert_with(|| iterable.clone());
        }
    }
    bindings
}

/// Split one `th:each` value into its aliases and iterable path
fn parse_each(raw: &str, scope: &Scope) -> Option<(Vec<String>, ModelPath)> {
    let raw = raw.trim();
    let separator = find_top_level(raw, ':')?;
    if separator == 0 || separator + 1 >= raw.len() {
        return None;
    }

    let aliases = extract_loop_aliases(&raw[..separator]);
    if aliases.is_empty() {
        return None;
    }

    let iterable = raw[separator + 1..].trim();
    let iterable = iterable
        .strip_prefix("${")
        .and_then(|rest| rest.strip_suffix('}'))
        .unwrap_or(iterable);
    let iterable_path = extract_model_paths(
        &neutralize_string_literals(iterable),
        &scope.reserved_only(),
    )
    .into_iter()
    .next()?;

    Some((aliases, iterable_path))
}

/// Alias names from the variable part (`item`, `item, stat`, `(k, v)`)
fn extract_loop_aliases(variable_part: &str) -> Vec<String> {
    let mut normalized = variable_part.trim();
    if normalized.len() > 2 && normalized.starts_with('(') && normalized.ends_with(')') {
        normalized = &normalized[1..normalized.len() - 1];
    }
    if normalized.is_empty() {
        return Vec::new();
    }

    split_top_level(normalized, ',')
        .into_iter()
        .filter(|token| !token.is_empty())
        .map(|token| match token.find('=') {
            Some(eq) if eq > 0 => token[..eq].trim(),
            _ => token,
        })
        .filter(|alias| is_valid_identifier(alias))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bindings(html: &str) -> Vec<(String, String)> {
        extract_loop_variable_paths(html, &Scope::new())
            .into_iter()
            .map(|(alias, path)| (alias, path.to_string()))
            .collect()
    }

    fn pair(alias: &str, path: &str) -> (String, String) {
        (alias.to_string(), path.to_string())
    }

    #[test]
    fn simple_alias() {
        let html = r#"<article th:each="row : ${pointPage.items}"></article>"#;
        assert_eq!(bindings(html), vec![pair("row", "pointPage.items")]);
    }

    #[test]
    fn status_variable_binds_to_same_iterable() {
        let html = r#"<li th:each="item, iterStat : ${items}"></li>"#;
        assert_eq!(
            bindings(html),
            vec![pair("item", "items"), pair("iterStat", "items")]
        );
    }

    #[test]
    fn parenthesized_aliases_and_assignments() {
        let html = r#"<li th:each="(entry, s = x) : ${settings.entries}"></li>"#;
        assert_eq!(
            bindings(html),
            vec![pair("entry", "settings.entries"), pair("s", "settings.entries")]
        );
    }

    #[test]
    fn iterable_without_wrapper_and_with_calls() {
        let html = r#"<li th:each="tag : ${#lists.sort(post.tags)}"></li><li th:each='x : items'></li>"#;
        assert_eq!(
            bindings(html),
            vec![pair("tag", "post.tags"), pair("x", "items")]
        );
    }

    #[test]
    fn first_declaration_wins() {
        let html = r#"<li th:each="item : ${first}"></li><li th:each="item : ${second}"></li>"#;
        assert_eq!(bindings(html), vec![pair("item", "first")]);
    }

    #[test]
    fn malformed_constructs_are_ignored() {
        let html = concat!(
            r#"<li th:each=""></li>"#,
            r#"<li th:each="noSeparator"></li>"#,
            r#"<li th:each=": ${items}"></li>"#,
            r#"<li th:each="item :"></li>"#,
            r#"<li th:each="1bad : ${items}"></li>"#,
        );
        assert!(bindings(html).is_empty());
    }

    #[test]
    fn unresolvable_iterable_is_skipped() {
        let html = r#"<li th:each="n : ${#numbers.sequence(1, 5)}"></li>"#;
        assert!(bindings(html).is_empty());
    }

    #[test]
    fn ternary_inside_iterable_uses_top_level_separator() {
        let html = r#"<li th:each="r : ${flag ? left : right}"></li>"#;
        assert_eq!(bindings(html), vec![pair("r", "flag")]);
    }

    #[test]
    fn parameters_do_not_block_iterables() {
        // Iterables resolve without the caller's exclusions
        let scope = Scope::new().with_parameters(["items"]);
        let found = extract_loop_variable_paths(r#"<li th:each="i : ${items}"></li>"#, &scope);
        assert_eq!(found.get("i").map(ToString::to_string).as_deref(), Some("items"));
    }
}
