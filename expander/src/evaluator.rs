//! Turns classified expressions into values against a [`Scope`].
//!
//! Evaluation never fails: anything that does not parse as a richer form is
//! treated as a name, and an unset name that does not look like a variable is
//! taken literally.

use daphne::classify::{
    Condition, classify_comparison, classify_condition, classify_logical, classify_ternary,
    is_string_literal,
};
use daphne::directive::parse_special_call;
use daphne::text::{is_dotted_name, split_top_level, strip_parens, strip_quotes};

use crate::scope::Scope;
use crate::special::{self, DeferredAction};

fn is_truthy(value: &str) -> bool {
    let value = value.trim().to_lowercase();
    !(value.is_empty() || value == "0" || value == "false")
}

/// Truthiness of a condition expression.
pub fn is_true(expr: &str, scope: &Scope<'_>) -> bool {
    let expr = expr.trim().to_lowercase();
    let value = match classify_condition(&expr) {
        Condition::Logical(logical) => {
            return logical.op.apply(is_true(&logical.lhs, scope), is_true(&logical.rhs, scope));
        }
        Condition::Comparison(_) => return evaluate_comparison(&expr, scope),
        Condition::Literal(text) => text,
        Condition::Name(name) => match scope.get(&name) {
            Some(value) => value.to_string(),
            None if is_dotted_name(&name) => return false,
            None => {
                let inner = strip_parens(&name);
                if inner.len() < name.len() {
                    return is_true(inner, scope);
                }
                name
            }
        },
    };
    is_truthy(&value)
}

/// Compare both sides as lowercase strings. Logical compositions are handed
/// to [`evaluate_logical`]; anything else is false.
pub fn evaluate_comparison(expr: &str, scope: &Scope<'_>) -> bool {
    if classify_logical(expr).is_some() {
        return evaluate_logical(expr, scope);
    }
    let Some(comparison) = classify_comparison(expr) else {
        return false;
    };
    let lhs = resolve_variable(&comparison.lhs, scope).to_lowercase();
    let rhs = resolve_variable(&comparison.rhs, scope).to_lowercase();
    comparison.op.apply(&lhs, &rhs)
}

pub fn evaluate_logical(expr: &str, scope: &Scope<'_>) -> bool {
    match classify_logical(expr) {
        Some(logical) => logical.op.apply(is_true(&logical.lhs, scope), is_true(&logical.rhs, scope)),
        None => false,
    }
}

/// The printable value of `name`: a scope value, a `+` concatenation, an
/// unquoted string literal, `""` for an unset variable, or the text itself.
pub fn resolve_variable(name: &str, scope: &Scope<'_>) -> String {
    let name = name.trim();
    if let Some(value) = scope.get(name) {
        return value.to_string();
    }

    let parts = split_top_level(name, '+');
    if parts.len() > 1 {
        return parts.into_iter().map(|part| resolve_variable(part, scope)).collect();
    }

    if is_string_literal(name) {
        strip_quotes(name).to_string()
    } else if is_dotted_name(&name.to_lowercase()) {
        String::new()
    } else {
        name.to_string()
    }
}

/// Pick a branch of `condition ? a : b`, resolving nested ternaries in the
/// false branch, the true branch and the condition first. Non-ternaries come
/// back unchanged.
pub fn evaluate_ternary(expr: &str, scope: &Scope<'_>) -> String {
    let expr = expr.trim();
    let Some(ternary) = classify_ternary(expr) else {
        return expr.to_string();
    };

    let if_false = evaluate_ternary(&ternary.if_false, scope);
    let if_true = evaluate_ternary(&ternary.if_true, scope);
    let condition = evaluate_ternary(&ternary.condition, scope);

    if is_true(&condition, scope) { if_true } else { if_false }
}

/// Evaluate a whole `{{ ... }}` tag to the text that replaces it.
pub fn evaluate_print_tag(
    tag: &str,
    scope: &Scope<'_>,
    deferred: &mut Vec<DeferredAction>,
) -> String {
    let tag = tag.trim();
    let body = tag
        .strip_prefix("{{")
        .and_then(|rest| rest.strip_suffix("}}"))
        .unwrap_or(tag)
        .trim();
    if body.is_empty() {
        return String::new();
    }

    if let Some(call) = parse_special_call(body).filter(|call| special::is_special_function(call.name)) {
        if let Some(value) = special::call(&call, deferred) {
            return value;
        }
    }

    resolve_variable(&evaluate_ternary(body, scope), scope)
}
