//! A small table-driven finite-state machine.
//!
//! States are identified by a caller-chosen tag. Each state owns a plain
//! transition function that receives the caller's scratch context, the current
//! input step and a shared auxiliary stack, and returns the next state. The
//! machine itself knows nothing about what the states mean.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::hash::Hash;

use tracing::warn;

/// One input character together with the character before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    pub current: char,
    pub previous: Option<char>,
}

impl Step {
    /// True when the current character is preceded by a backslash.
    pub fn is_escaped(&self) -> bool {
        self.previous == Some('\\')
    }
}

/// Transition function for one state.
pub type Transition<S, T, C> = fn(&mut C, Step, &mut Vec<T>) -> S;

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Accepted,
    /// Ended in a final state, but the auxiliary stack still held this many items.
    AcceptedWithLeftover(usize),
    Rejected,
}

impl Outcome {
    pub fn is_accepted(&self) -> bool {
        !matches!(self, Outcome::Rejected)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FsmError<S> {
    NoFinalStates,
    UnregisteredState { state: S, previous: S },
}

impl<S: fmt::Debug> fmt::Display for FsmError<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FsmError::NoFinalStates => write!(f, "state machine has no final states"),
            FsmError::UnregisteredState { state, previous } => write!(
                f,
                "state machine reached unregistered state {:?} (previous state was {:?})",
                state, previous
            ),
        }
    }
}

impl<S: fmt::Debug> std::error::Error for FsmError<S> {}

pub struct StateMachine<S, T, C> {
    initial: S,
    transitions: HashMap<S, Transition<S, T, C>>,
    finals: HashSet<S>,
    quick_exits: HashSet<S>,
}

impl<S, T, C> StateMachine<S, T, C>
where
    S: Copy + Eq + Hash + fmt::Debug,
{
    pub fn new(initial: S) -> Self {
        StateMachine {
            initial,
            transitions: HashMap::new(),
            finals: HashSet::new(),
            quick_exits: HashSet::new(),
        }
    }

    /// Register a state and its transition function.
    pub fn state(mut self, state: S, transition: Transition<S, T, C>) -> Self {
        self.transitions.insert(state, transition);
        self
    }

    /// Register an accepting state.
    pub fn final_state(mut self, state: S, transition: Transition<S, T, C>) -> Self {
        self.finals.insert(state);
        self.state(state, transition)
    }

    /// Mark a state that accepts immediately when reached without a transition.
    pub fn quick_exit(mut self, state: S) -> Self {
        self.quick_exits.insert(state);
        self
    }

    /// Feed `input` through the machine, one character at a time.
    pub fn run(&self, input: &str, ctx: &mut C) -> Result<Outcome, FsmError<S>> {
        if self.finals.is_empty() {
            return Err(FsmError::NoFinalStates);
        }

        let mut stack: Vec<T> = Vec::new();
        let mut state = self.initial;
        let mut previous_state = self.initial;
        let mut previous = None;

        for current in input.chars() {
            let Some(transition) = self.transitions.get(&state) else {
                if self.quick_exits.contains(&state) {
                    return Ok(Outcome::Accepted);
                }
                return Err(FsmError::UnregisteredState {
                    state,
                    previous: previous_state,
                });
            };
            previous_state = state;
            state = transition(ctx, Step { current, previous }, &mut stack);
            previous = Some(current);
        }

        if !self.finals.contains(&state) {
            return Ok(Outcome::Rejected);
        }
        if stack.is_empty() {
            Ok(Outcome::Accepted)
        } else {
            warn!(
                input,
                depth = stack.len(),
                "state machine ended in a final state with unclosed nesting"
            );
            Ok(Outcome::AcceptedWithLeftover(stack.len()))
        }
    }
}
