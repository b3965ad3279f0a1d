//! Line-level directive syntax: block markers (`{% ... %}`) and inline print
//! tags (`{{ ... }}`).

mod print_tag;

use std::ops::Range;

use crate::text::strip;

pub use print_tag::{PrintTag, SpecialCall, find_print_tags, parse_special_call};

pub const MARKER_OPEN: &str = "{%";
pub const MARKER_CLOSE: &str = "%}";

/// A recognized block marker line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Marker<'a> {
    /// `{% include <path> %}`, path stripped of quotes and parentheses.
    Include(&'a str),
    /// `{% <keyword> <condition...> %}`.
    Open { keyword: &'a str, condition: &'a str },
    /// `{% end <keyword> %}`.
    Close(&'a str),
    /// `{% else %}`.
    Else,
    /// A marker whose body fits none of the shapes above.
    Malformed(&'a str),
}

impl Marker<'_> {
    pub fn is_include(&self) -> bool {
        matches!(self, Marker::Include(_))
    }
}

/// Parse a whole line as a block marker. Lines that are not markers at all
/// return `None`.
pub fn parse_marker(line: &str) -> Option<Marker<'_>> {
    let line = line.trim();
    if line.len() < MARKER_OPEN.len() + MARKER_CLOSE.len()
        || !line.starts_with(MARKER_OPEN)
        || !line.ends_with(MARKER_CLOSE)
    {
        return None;
    }

    let body = line[MARKER_OPEN.len()..line.len() - MARKER_CLOSE.len()].trim();
    if body.contains(MARKER_OPEN) || body.contains(MARKER_CLOSE) {
        return Some(Marker::Malformed(body));
    }
    let mut words = body.split_whitespace();
    let Some(keyword) = words.next() else {
        return Some(Marker::Malformed(body));
    };
    let rest = body[keyword.len()..].trim();

    let marker = match keyword {
        "else" if rest.is_empty() => Marker::Else,
        "include" if !rest.is_empty() => Marker::Include(strip(rest)),
        "end" => match (words.next(), words.next()) {
            (Some(closed), None) => Marker::Close(closed),
            _ => Marker::Malformed(body),
        },
        _ if rest.is_empty() => Marker::Malformed(body),
        _ => Marker::Open {
            keyword,
            condition: rest,
        },
    };
    Some(marker)
}

/// Byte ranges of the complete `{% ... %}` markers on `line`, in order.
fn marker_spans(line: &str) -> Vec<Range<usize>> {
    let mut spans = Vec::new();
    let mut from = 0;
    while let Some(open) = line[from..].find(MARKER_OPEN) {
        let start = from + open;
        let body = start + MARKER_OPEN.len();
        let Some(close) = line[body..].find(MARKER_CLOSE) else {
            break;
        };
        let end = body + close + MARKER_CLOSE.len();
        spans.push(start..end);
        from = end;
    }
    spans
}

/// Break a line holding two or more markers into one piece per marker, with
/// the text between them as pieces of their own. Blank text is dropped.
/// `None` when the line has fewer than two markers.
///
/// `{% foreach site.posts as p %}{{ p.title }} {% end foreach %}` becomes the
/// opener, `{{ p.title }} ` and the close.
pub fn split_markers(line: &str) -> Option<Vec<&str>> {
    let spans = marker_spans(line);
    if spans.len() < 2 {
        return None;
    }

    let mut pieces = Vec::with_capacity(spans.len() * 2 + 1);
    let mut last = 0;
    for span in spans {
        let text = &line[last..span.start];
        if !text.trim().is_empty() {
            pieces.push(text);
        }
        last = span.end;
        pieces.push(&line[span]);
    }
    let tail = &line[last..];
    if !tail.trim().is_empty() {
        pieces.push(tail);
    }
    Some(pieces)
}
