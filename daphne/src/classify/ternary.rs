use std::sync::LazyLock;

use crate::classify::{Awaited, strip_operand, track_nesting};
use crate::fsm::{Outcome, StateMachine, Step};

/// `condition ? if_true : if_false`, each part unwrapped by
/// [`strip_operand`](crate::classify::strip_operand).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ternary {
    pub condition: String,
    pub if_true: String,
    pub if_false: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
enum TernaryState {
    #[default]
    Condition,
    Nested,
    IfTrue,
    IfFalse,
}

#[derive(Debug, Default)]
struct TernaryScan {
    condition: String,
    if_true: String,
    if_false: String,
    /// The state that entered `Nested`, and that it returns to.
    owner: TernaryState,
}

impl TernaryScan {
    fn branch(&mut self, state: TernaryState) -> &mut String {
        match state {
            TernaryState::IfTrue => &mut self.if_true,
            TernaryState::IfFalse => &mut self.if_false,
            TernaryState::Condition | TernaryState::Nested => &mut self.condition,
        }
    }
}

static TERNARY: LazyLock<StateMachine<TernaryState, Awaited, TernaryScan>> = LazyLock::new(|| {
    StateMachine::new(TernaryState::Condition)
        .state(TernaryState::Condition, condition)
        .state(TernaryState::Nested, nested)
        .state(TernaryState::IfTrue, if_true)
        .final_state(TernaryState::IfFalse, if_false)
});

fn condition(scan: &mut TernaryScan, step: Step, stack: &mut Vec<Awaited>) -> TernaryState {
    scan.owner = TernaryState::Condition;
    if !step.is_escaped() {
        if let Some(opened) = Awaited::opened_by(step.current) {
            stack.push(opened);
            scan.condition.push(step.current);
            return TernaryState::Nested;
        }
        if step.current == '?' {
            return TernaryState::IfTrue;
        }
    }
    scan.condition.push(step.current);
    TernaryState::Condition
}

fn nested(scan: &mut TernaryScan, step: Step, stack: &mut Vec<Awaited>) -> TernaryState {
    let owner = scan.owner;
    scan.branch(owner).push(step.current);

    let awaiting_colon = stack.last() == Some(&Awaited::TernaryColon);
    track_nesting(stack, step.current, step.is_escaped());
    if awaiting_colon && step.current == '?' && !step.is_escaped() {
        stack.push(Awaited::TernaryColon);
    }

    if stack.is_empty() {
        owner
    } else {
        TernaryState::Nested
    }
}

fn if_true(scan: &mut TernaryScan, step: Step, stack: &mut Vec<Awaited>) -> TernaryState {
    scan.owner = TernaryState::IfTrue;
    if !step.is_escaped() {
        if step.current == ':' {
            return TernaryState::IfFalse;
        }
        let opened = match step.current {
            '?' => Some(Awaited::TernaryColon),
            other => Awaited::opened_by(other),
        };
        if let Some(opened) = opened {
            stack.push(opened);
            scan.if_true.push(step.current);
            return TernaryState::Nested;
        }
    }
    scan.if_true.push(step.current);
    TernaryState::IfTrue
}

fn if_false(scan: &mut TernaryScan, step: Step, stack: &mut Vec<Awaited>) -> TernaryState {
    scan.owner = TernaryState::IfFalse;
    scan.if_false.push(step.current);
    if !step.is_escaped() {
        if let Some(opened) = Awaited::opened_by(step.current) {
            stack.push(opened);
            return TernaryState::Nested;
        }
    }
    TernaryState::IfFalse
}

/// Recognize `condition ? if_true : if_false`. Nested ternaries in either
/// branch are kept whole in that branch. Unclosed nesting is never a match.
pub fn classify_ternary(input: &str) -> Option<Ternary> {
    let mut scan = TernaryScan::default();
    match TERNARY.run(input, &mut scan) {
        Ok(Outcome::Accepted) => Some(Ternary {
            condition: strip_operand(&scan.condition).to_string(),
            if_true: strip_operand(&scan.if_true).to_string(),
            if_false: strip_operand(&scan.if_false).to_string(),
        }),
        _ => None,
    }
}
