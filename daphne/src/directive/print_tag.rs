use std::ops::Range;

use crate::text::is_identifier;

pub const TAG_OPEN: &str = "{{";
pub const TAG_CLOSE: &str = "}}";

/// One `{{ ... }}` occurrence inside a line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrintTag<'a> {
    /// Byte range of the whole tag, delimiters included.
    pub span: Range<usize>,
    pub text: &'a str,
}

impl<'a> PrintTag<'a> {
    /// The tag body with delimiters removed and whitespace trimmed.
    pub fn body(&self) -> &'a str {
        self.text[TAG_OPEN.len()..self.text.len() - TAG_CLOSE.len()].trim()
    }
}

/// Every complete print tag in `line`, left to right. An unterminated `{{`
/// is not a tag.
pub fn find_print_tags(line: &str) -> Vec<PrintTag<'_>> {
    let mut tags = Vec::new();
    let mut start: Option<usize> = None;
    let mut previous: Option<char> = None;

    for (index, current) in line.char_indices() {
        match start {
            None => {
                if current == '{' && previous == Some('{') {
                    start = Some(index - 1);
                    previous = None;
                    continue;
                }
            }
            Some(opened) => {
                if current == '}' && previous == Some('}') {
                    let end = index + 1;
                    tags.push(PrintTag {
                        span: opened..end,
                        text: &line[opened..end],
                    });
                    start = None;
                    previous = None;
                    continue;
                }
            }
        }
        previous = Some(current);
    }
    tags
}

/// `name(arg, ...)` inside a print tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecialCall<'a> {
    pub name: &'a str,
    pub args: Vec<&'a str>,
}

/// Parse a print-tag body as a function call. Whether `name` is a known
/// function is up to the caller.
pub fn parse_special_call(body: &str) -> Option<SpecialCall<'_>> {
    let body = body.trim();
    let open = body.find('(')?;
    if !body.ends_with(')') {
        return None;
    }
    let name = body[..open].trim_end();
    if !is_identifier(name) {
        return None;
    }

    let inner = body[open + 1..body.len() - 1].trim();
    let args = if inner.is_empty() {
        Vec::new()
    } else {
        inner.split(',').map(str::trim).collect()
    };
    Some(SpecialCall { name, args })
}
