//! Character-level recognizers for the expression forms the directive
//! language understands.
//!
//! None of these build a tree. Each one answers "is this text a comparison /
//! logical composition / ternary, and if so what are its parts", tracking quote
//! and parenthesis nesting so that operators inside them are never mistaken for
//! the top-level one.

mod ternary;

use std::fmt;

use crate::text::{is_quote_wrapped, strip_parens, strip_quotes};

pub use ternary::{Ternary, classify_ternary};

// ---------------------------------------------------------------------------
// Nesting
// ---------------------------------------------------------------------------

/// A closer the scanner is waiting for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Awaited {
    Quote(char),
    Paren,
    TernaryColon,
}

impl Awaited {
    /// The construct opened by `ch`, if any.
    pub fn opened_by(ch: char) -> Option<Awaited> {
        match ch {
            '"' | '\'' => Some(Awaited::Quote(ch)),
            '(' => Some(Awaited::Paren),
            _ => None,
        }
    }

    pub fn closer(self) -> char {
        match self {
            Awaited::Quote(q) => q,
            Awaited::Paren => ')',
            Awaited::TernaryColon => ':',
        }
    }
}

/// Advance the awaited-closer stack by one character while inside a nested
/// construct. Inside a quote nothing nests; elsewhere quotes and parentheses do.
pub(crate) fn track_nesting(awaited: &mut Vec<Awaited>, ch: char, escaped: bool) {
    let Some(&top) = awaited.last() else {
        return;
    };
    if escaped {
        return;
    }
    if ch == top.closer() {
        awaited.pop();
        return;
    }
    if matches!(top, Awaited::Quote(_)) {
        return;
    }
    if let Some(opened) = Awaited::opened_by(ch) {
        awaited.push(opened);
    }
}

// ---------------------------------------------------------------------------
// Operators
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonOp {
    Equal,
    NotEqual,
    Greater,
    GreaterOrEqual,
    Less,
    LessOrEqual,
}

impl ComparisonOp {
    pub fn symbol(self) -> &'static str {
        match self {
            ComparisonOp::Equal => "==",
            ComparisonOp::NotEqual => "!=",
            ComparisonOp::Greater => ">",
            ComparisonOp::GreaterOrEqual => ">=",
            ComparisonOp::Less => "<",
            ComparisonOp::LessOrEqual => "<=",
        }
    }

    /// Lexicographic string comparison. No numeric coercion.
    pub fn apply(self, lhs: &str, rhs: &str) -> bool {
        match self {
            ComparisonOp::Equal => lhs == rhs,
            ComparisonOp::NotEqual => lhs != rhs,
            ComparisonOp::Greater => lhs > rhs,
            ComparisonOp::GreaterOrEqual => lhs >= rhs,
            ComparisonOp::Less => lhs < rhs,
            ComparisonOp::LessOrEqual => lhs <= rhs,
        }
    }

    fn at(current: char, next: Option<char>) -> Option<(Self, usize)> {
        match (current, next) {
            ('=', Some('=')) => Some((ComparisonOp::Equal, 2)),
            ('!', Some('=')) => Some((ComparisonOp::NotEqual, 2)),
            ('>', Some('=')) => Some((ComparisonOp::GreaterOrEqual, 2)),
            ('<', Some('=')) => Some((ComparisonOp::LessOrEqual, 2)),
            ('>', _) => Some((ComparisonOp::Greater, 1)),
            ('<', _) => Some((ComparisonOp::Less, 1)),
            _ => None,
        }
    }
}

impl fmt::Display for ComparisonOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
    And,
    Or,
}

impl LogicalOp {
    pub fn symbol(self) -> &'static str {
        match self {
            LogicalOp::And => "&&",
            LogicalOp::Or => "||",
        }
    }

    pub fn apply(self, lhs: bool, rhs: bool) -> bool {
        match self {
            LogicalOp::And => lhs && rhs,
            LogicalOp::Or => lhs || rhs,
        }
    }

    fn at(current: char, next: Option<char>) -> Option<(Self, usize)> {
        match (current, next) {
            ('&', Some('&')) => Some((LogicalOp::And, 2)),
            ('|', Some('|')) => Some((LogicalOp::Or, 2)),
            _ => None,
        }
    }
}

impl fmt::Display for LogicalOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// `lhs op rhs`, with both operands unwrapped by [`strip_operand`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binary<Op> {
    pub lhs: String,
    pub op: Op,
    pub rhs: String,
}

// ---------------------------------------------------------------------------
// Binary scan
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Lhs,
    Rhs,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    Side(Side),
    Nested(Side),
}

fn split_binary<Op: Copy>(
    input: &str,
    operator_at: fn(char, Option<char>) -> Option<(Op, usize)>,
) -> Option<Binary<Op>> {
    let chars: Vec<char> = input.chars().collect();
    if chars.len() < 2 {
        return None;
    }

    let mut state = ScanState::Side(Side::Lhs);
    let mut awaited: Vec<Awaited> = Vec::new();
    let mut lhs = String::new();
    let mut rhs = String::new();
    let mut op = None;
    let mut previous: Option<char> = None;
    let mut index = 0;

    while index < chars.len() {
        let current = chars[index];
        let escaped = previous == Some('\\');

        let side = match state {
            ScanState::Side(side) => {
                if let Some(opened) = Awaited::opened_by(current).filter(|_| !escaped) {
                    awaited.push(opened);
                    state = ScanState::Nested(side);
                } else if side == Side::Lhs {
                    if let Some((found, width)) = operator_at(current, chars.get(index + 1).copied()) {
                        op = Some(found);
                        state = ScanState::Side(Side::Rhs);
                        previous = Some(chars[index + width - 1]);
                        index += width;
                        continue;
                    }
                }
                side
            }
            ScanState::Nested(side) => {
                track_nesting(&mut awaited, current, escaped);
                if awaited.is_empty() {
                    state = ScanState::Side(side);
                }
                side
            }
        };

        match side {
            Side::Lhs => lhs.push(current),
            Side::Rhs => rhs.push(current),
        }
        previous = Some(current);
        index += 1;
    }

    match (state, op) {
        (ScanState::Side(Side::Rhs), Some(op)) if awaited.is_empty() => Some(Binary {
            lhs: strip_operand(&lhs).to_string(),
            op,
            rhs: strip_operand(&rhs).to_string(),
        }),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// True iff `input` is wrapped in matching quotes with no unescaped instance of
/// that quote before the closing one.
pub fn is_string_literal(input: &str) -> bool {
    let input = input.trim();
    if !is_quote_wrapped(input) {
        return false;
    }
    let Some(quote) = input.chars().next() else {
        return false;
    };

    let mut previous = None;
    for current in strip_quotes(input).chars() {
        if current == quote && previous != Some('\\') {
            return false;
        }
        previous = Some(current);
    }
    true
}

/// Unquote a whole string literal, otherwise drop one layer of parentheses.
/// `"a" + "b"` is not a literal and keeps its quotes.
pub fn strip_operand(input: &str) -> &str {
    let input = input.trim();
    if is_string_literal(input) {
        strip_quotes(input)
    } else {
        strip_parens(input).trim()
    }
}

/// Split on the first top-level `== != >= <= > <`.
pub fn classify_comparison(input: &str) -> Option<Binary<ComparisonOp>> {
    split_binary(input, ComparisonOp::at)
}

/// Split on the first top-level `&&` or `||`.
pub fn classify_logical(input: &str) -> Option<Binary<LogicalOp>> {
    split_binary(input, LogicalOp::at)
}

/// What a condition expression is, in the order the evaluator tries them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    Logical(Binary<LogicalOp>),
    Comparison(Binary<ComparisonOp>),
    Literal(String),
    Name(String),
}

pub fn classify_condition(input: &str) -> Condition {
    let input = input.trim();
    if let Some(logical) = classify_logical(input) {
        Condition::Logical(logical)
    } else if let Some(comparison) = classify_comparison(input) {
        Condition::Comparison(comparison)
    } else if is_string_literal(input) {
        Condition::Literal(strip_quotes(input).to_string())
    } else {
        Condition::Name(input.to_string())
    }
}
