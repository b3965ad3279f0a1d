//! Small string helpers shared by the classifiers and the evaluator.

use crate::classify::{Awaited, track_nesting};

/// Returns true if the trimmed input is wrapped in a matching pair of `'` or `"`.
pub fn is_quote_wrapped(input: &str) -> bool {
    let input = input.trim();
    input.len() >= 2
        && ((input.starts_with('"') && input.ends_with('"'))
            || (input.starts_with('\'') && input.ends_with('\'')))
}

/// Removes one layer of enclosing quotes, if present. The result is trimmed
/// on the outside only.
pub fn strip_quotes(input: &str) -> &str {
    let input = input.trim();
    if is_quote_wrapped(input) {
        &input[1..input.len() - 1]
    } else {
        input
    }
}

/// Removes one layer of enclosing parentheses, if present.
pub fn strip_parens(input: &str) -> &str {
    let input = input.trim();
    if input.len() >= 2 && input.starts_with('(') && input.ends_with(')') {
        &input[1..input.len() - 1]
    } else {
        input
    }
}

/// Quotes first, then parentheses, then surrounding whitespace.
pub fn strip(input: &str) -> &str {
    strip_parens(strip_quotes(input)).trim()
}

/// Returns true for names shaped like `page.title` or `site.posts.first`:
/// lowercase identifier segments joined by at least one dot.
pub fn is_dotted_name(input: &str) -> bool {
    let mut segments = 0;
    for segment in input.split('.') {
        if !is_identifier(segment) {
            return false;
        }
        segments += 1;
    }
    segments > 1
}

/// A lowercase identifier: `[a-z_][a-z0-9_]*`.
pub fn is_identifier(input: &str) -> bool {
    let mut chars = input.chars();
    match chars.next() {
        Some(c) if c.is_ascii_lowercase() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}

/// Lowercase, keeping only ASCII letters and digits and turning spaces into
/// dashes. Used for post slugs.
pub fn url_safe(input: &str) -> String {
    input
        .trim()
        .to_lowercase()
        .chars()
        .filter_map(|c| match c {
            'a'..='z' | '0'..='9' => Some(c),
            ' ' => Some('-'),
            _ => None,
        })
        .collect()
}

/// Split `input` on every `separator` that is not inside quotes or
/// parentheses. Parts are returned untrimmed.
pub fn split_top_level(input: &str, separator: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut awaited: Vec<Awaited> = Vec::new();
    let mut previous = None;
    let mut start = 0;

    for (index, current) in input.char_indices() {
        let escaped = previous == Some('\\');
        if !awaited.is_empty() {
            track_nesting(&mut awaited, current, escaped);
        } else if let Some(opened) = Awaited::opened_by(current).filter(|_| !escaped) {
            awaited.push(opened);
        } else if current == separator {
            parts.push(&input[start..index]);
            start = index + current.len_utf8();
        }
        previous = Some(current);
    }
    parts.push(&input[start..]);
    parts
}
