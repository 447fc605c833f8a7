//! Static fragment references (`th:replace`, `th:insert`, `th:include`)
//!
//! Only literal targets are collected: any value containing `${` is dynamic
//! and cannot be resolved without rendering. Local references (`this :: x`,
//! `:: x`) and `#`-prefixed selectors are not template paths either.

use indexmap::IndexSet;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::scan::{attribute_regex, attribute_values};

static FRAGMENT_RE: Lazy<Regex> = Lazy::new(|| attribute_regex("replace|insert|include"));

/// Template paths referenced by fragment insertion attributes, in document order
pub fn extract_referenced_template_paths(html: &str) -> IndexSet<String> {
    attribute_values(&FRAGMENT_RE, html)
        .filter_map(referenced_template_path)
        .collect()
}

/// Normalize one attribute value to a template path
///
/// `~{/fragments/card :: card(x)}` → `fragments/card`
pub fn referenced_template_path(raw: &str) -> Option<String> {
    let mut expression = raw.trim();
    if expression.is_empty() || expression.contains("${") {
        return None;
    }
    if let Some(inner) = expression
        .strip_prefix("~{")
        .and_then(|rest| rest.strip_suffix('}'))
    {
        expression = inner.trim();
    }

    let separator = expression.find("::")?;
    if separator == 0 {
        return None;
    }
    let mut candidate = expression[..separator].trim();
    if candidate.is_empty() || candidate.starts_with('#') || candidate.starts_with("this") {
        return None;
    }

    for quote in ['\'', '"'] {
        if candidate.len() >= 2 && candidate.starts_with(quote) && candidate.ends_with(quote) {
            candidate = &candidate[1..candidate.len() - 1];
            break;
        }
    }
    let candidate = candidate.strip_prefix('/').unwrap_or(candidate);

    (!candidate.is_empty()).then(|| candidate.to_string())
}
