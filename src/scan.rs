//! Scanning utilities shared by every extractor
//!
//! Identifier classes, quote-aware top-level splitting, string-literal
//! neutralization and attribute value matching. Everything here is a pure
//! function over its input; scan positions are locals, never struct fields.

use regex::Regex;

/// Start of an identifier: any letter or `_`
#[inline]
pub fn is_identifier_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

/// Identifier continuation: letters, digits, `_` and `-`
///
/// Dashes are accepted because template models routinely use kebab-case keys.
#[inline]
pub fn is_identifier_part(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '-'
}

#[inline]
pub fn is_quote(c: char) -> bool {
    c == '\'' || c == '"'
}

/// Whole-string identifier check (`name`, `_tmp`, `page-size`)
pub fn is_valid_identifier(candidate: &str) -> bool {
    let mut chars = candidate.chars();
    match chars.next() {
        Some(first) if is_identifier_start(first) => chars.all(is_identifier_part),
        _ => false,
    }
}

/// Index of the quote closing the literal opened at `open`, skipping escaped quotes
pub fn find_literal_end(chars: &[char], open: usize) -> Option<usize> {
    let quote = chars[open];
    (open + 1..chars.len()).find(|&k| chars[k] == quote && chars[k - 1] != '\\')
}

/// First non-whitespace position at or after `from`
pub fn skip_whitespace(chars: &[char], from: usize) -> usize {
    let mut i = from;
    while i < chars.len() && chars[i].is_whitespace() {
        i += 1;
    }
    i
}

/// Replace string literal contents (quotes included) with spaces
///
/// A literal that is the whole content of a bracket accessor (`map['key']`)
/// is kept verbatim so the key can still become a path segment. An
/// unterminated literal blanks out the rest of the input.
pub fn neutralize_string_literals(expression: &str) -> String {
    let chars: Vec<char> = expression.chars().collect();
    let mut sanitized = String::with_capacity(expression.len());
    let mut last_significant: Option<char> = None;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        let escaped = i > 0 && chars[i - 1] == '\\';
        if !is_quote(c) || escaped {
            sanitized.push(c);
            if !c.is_whitespace() {
                last_significant = Some(c);
            }
            i += 1;
            continue;
        }

        let Some(end) = find_literal_end(&chars, i) else {
            sanitized.extend(std::iter::repeat(' ').take(chars.len() - i));
            break;
        };

        let closes_bracket = {
            let next = skip_whitespace(&chars, end + 1);
            next < chars.len() && chars[next] == ']'
        };
        if last_significant == Some('[') && closes_bracket {
            sanitized.extend(&chars[i..=end]);
            last_significant = Some(c);
        } else {
            sanitized.extend(std::iter::repeat(' ').take(end - i + 1));
        }
        i = end + 1;
    }

    sanitized
}

/// Split on `separator` at nesting depth zero, outside quotes
///
/// Segments are trimmed. The trailing segment is always returned, so an
/// input without separators yields exactly one segment.
pub fn split_top_level(value: &str, separator: char) -> Vec<&str> {
    let mut segments = Vec::new();
    let mut depth_paren = 0usize;
    let mut depth_bracket = 0usize;
    let mut depth_brace = 0usize;
    let mut in_single = false;
    let mut in_double = false;
    let mut segment_start = 0;
    let mut previous = '\0';

    for (i, c) in value.char_indices() {
        let escaped = previous == '\\';
        previous = c;

        if c == '\'' && !in_double && !escaped {
            in_single = !in_single;
            continue;
        }
        if c == '"' && !in_single && !escaped {
            in_double = !in_double;
            continue;
        }
        if in_single || in_double {
            continue;
        }

        match c {
            '(' => depth_paren += 1,
            ')' => depth_paren = depth_paren.saturating_sub(1),
            '[' => depth_bracket += 1,
            ']' => depth_bracket = depth_bracket.saturating_sub(1),
            '{' => depth_brace += 1,
            '}' => depth_brace = depth_brace.saturating_sub(1),
            c if c == separator && depth_paren == 0 && depth_bracket == 0 && depth_brace == 0 => {
                segments.push(value[segment_start..i].trim());
                segment_start = i + c.len_utf8();
            }
            _ => {}
        }
    }
    segments.push(value[segment_start..].trim());
    segments
}

/// Byte offset of the first `separator` at nesting depth zero, outside quotes
pub fn find_top_level(value: &str, separator: char) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_single = false;
    let mut in_double = false;
    let mut previous = '\0';

    for (i, c) in value.char_indices() {
        let escaped = previous == '\\';
        previous = c;
        match c {
            '\'' if !in_double && !escaped => in_single = !in_single,
            '"' if !in_single && !escaped => in_double = !in_double,
            _ if in_single || in_double => {}
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => depth = depth.saturating_sub(1),
            c if c == separator && depth == 0 => return Some(i),
            _ => {}
        }
    }
    None
}

/// Build the matcher for a Thymeleaf attribute in both `th:name` and
/// `data-th-name` spellings, capturing a double- or single-quoted value.
pub fn attribute_regex(names: &str) -> Regex {
    let pattern = format!(
        r#"(?:\bth:|\bdata-th-)(?:{names})\s*=\s*(?:"([^"]*)"|'([^']*)')"#
    );
    Regex::new(&pattern).unwrap()
}

/// Raw values of every attribute matched by `re`
pub fn attribute_values<'a>(re: &'a Regex, html: &'a str) -> impl Iterator<Item = &'a str> + 'a {
    re.captures_iter(html)
        .filter_map(|cap| cap.get(1).or_else(|| cap.get(2)))
        .map(|m| m.as_str())
}
