//! Expression path extractor
//!
//! Single left-to-right scan over one `${...}` expression body that collects
//! every model access chain (`order?.customer['name']`) without parsing the
//! expression language itself:
//!
//! - Roots are identifiers not preceded by `.`, `#`, `@` or a quote
//! - Chains continue through `.`, `?.` and quoted `[...]` keys
//! - Function/method calls end a chain (`fmt(x)`, `a.b.size()`)
//! - Reserved and excluded names never start a chain
//! - Type references (`T(java.lang.Math)`) and constructor class names
//!   (`new java.util.Date()`) are skipped whole
//!
//! Malformed input never errors; the scan recovers locally and keeps going.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::model_path::ModelPath;
use crate::scan::{
    find_literal_end, is_identifier_part, is_identifier_start, is_quote,
    neutralize_string_literals, skip_whitespace,
};
use crate::scope::Scope;

/// `${...}` occurrences in template text (body captured, no nested braces)
static EXPRESSION_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\$\{([^}]*)\}").unwrap());

/// Bodies of every `${...}` expression in `text`, in document order
pub fn expression_bodies(text: &str) -> impl Iterator<Item = &str> {
    EXPRESSION_RE
        .captures_iter(text)
        .filter_map(|cap| cap.get(1))
        .map(|m| m.as_str())
}

/// Extract model paths from every `${...}` expression in template text
///
/// String literals are neutralized before scanning, so quoted text can never
/// masquerade as an identifier.
pub fn extract_expression_paths(text: &str, scope: &Scope) -> Vec<ModelPath> {
    expression_bodies(text)
        .flat_map(|body| extract_model_paths(&neutralize_string_literals(body), scope))
        .collect()
}

/// Extract model paths from one expression body
///
/// `expression` is expected to be literal-neutralized already (see
/// [`neutralize_string_literals`]); bracket-key literals survive that step.
pub fn extract_model_paths(expression: &str, scope: &Scope) -> Vec<ModelPath> {
    let chars: Vec<char> = expression.chars().collect();
    let len = chars.len();
    let mut paths = Vec::new();
    let mut i = 0;

    while i < len {
        let current = chars[i];
        if is_quote(current) {
            i = find_literal_end(&chars, i).map_or(len, |end| end + 1);
            continue;
        }
        if !is_identifier_start(current) || is_invalid_root_start(&chars, i) {
            i += 1;
            continue;
        }

        let start = i;
        i = consume_identifier(&chars, i);
        let root: String = chars[start..i].iter().collect();
        if root == "new" {
            i = skip_qualified_name(&chars, i);
            continue;
        }
        if root == "T" && is_function_call(&chars, i) {
            i = skip_parenthesized(&chars, skip_whitespace(&chars, i));
            continue;
        }
        if scope.is_excluded(&root) || is_function_call(&chars, i) {
            continue;
        }

        let mut segments = vec![root];
        while i < len {
            if chars[i] == '?' && chars.get(i + 1) == Some(&'.') {
                i += 2;
            } else if chars[i] == '.' {
                i += 1;
            } else if chars[i] == '[' {
                // Unbalanced: keep what we have, rescan from the bracket
                let Some(end) = consume_bracket_accessor(&chars, i) else {
                    break;
                };
                let key = bracket_key(&chars[i + 1..end]);
                i = end + 1;
                if let Some(key) = key {
                    segments.push(key);
                }
                continue;
            } else {
                break;
            }

            if i >= len || !is_identifier_start(chars[i]) {
                break;
            }
            let segment_start = i;
            i = consume_identifier(&chars, i);
            if is_function_call(&chars, i) {
                break;
            }
            segments.push(chars[segment_start..i].iter().collect());
        }

        if let Some(path) = ModelPath::new(segments) {
            paths.push(path);
        }
    }

    paths
}

fn consume_identifier(chars: &[char], start: usize) -> usize {
    let mut i = start + 1;
    while i < chars.len() && is_identifier_part(chars[i]) {
        i += 1;
    }
    i
}

/// An identifier at `index` cannot be a root when it continues a longer token
/// or follows a member/utility/link marker.
fn is_invalid_root_start(chars: &[char], index: usize) -> bool {
    if index == 0 {
        return false;
    }
    if is_identifier_part(chars[index - 1]) {
        return true;
    }
    let previous = chars[..index].iter().rev().find(|c| !c.is_whitespace());
    matches!(previous, Some('.' | '#' | '@' | '\'' | '"'))
}

/// End of the dotted class name following `new`
fn skip_qualified_name(chars: &[char], from: usize) -> usize {
    let mut i = skip_whitespace(chars, from);
    while i < chars.len() && (is_identifier_part(chars[i]) || chars[i] == '.') {
        i += 1;
    }
    i
}

/// Position after the `)` balancing the `(` at `open` (end of input if unbalanced)
fn skip_parenthesized(chars: &[char], open: usize) -> usize {
    let mut depth = 0usize;
    for (offset, c) in chars[open..].iter().enumerate() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return open + offset + 1;
                }
            }
            _ => {}
        }
    }
    chars.len()
}

fn is_function_call(chars: &[char], identifier_end: usize) -> bool {
    let next = skip_whitespace(chars, identifier_end);
    next < chars.len() && chars[next] == '('
}

/// Index of the `]` balancing the `[` at `start`; quoted keys may contain brackets
fn consume_bracket_accessor(chars: &[char], start: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut i = start;
    while i < chars.len() {
        match chars[i] {
            '[' => depth += 1,
            ']' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            c if is_quote(c) => i = find_literal_end(chars, i)?,
            _ => {}
        }
        i += 1;
    }
    None
}

/// The key of a `['key']` / `["key"]` accessor; anything else has no key
fn bracket_key(inner: &[char]) -> Option<String> {
    let first = inner.iter().position(|c| !c.is_whitespace())?;
    let last = inner.iter().rposition(|c| !c.is_whitespace())?;
    let trimmed = &inner[first..=last];
    if trimmed.len() < 2 || !is_quote(trimmed[0]) {
        return None;
    }
    // The opening quote must close exactly at the end: `'a' + 'b'` is not a key
    (find_literal_end(trimmed, 0) == Some(trimmed.len() - 1))
        .then(|| trimmed[1..trimmed.len() - 1].iter().collect())
}
