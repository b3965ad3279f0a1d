use daphne::fsm::{FsmError, Outcome, StateMachine, Step};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Parens {
    Outside,
    Inside,
    Done,
}

/// Collects the text inside `[...]`, nesting on `[`.
fn outside(_seen: &mut String, step: Step, stack: &mut Vec<()>) -> Parens {
    if step.current == '[' {
        stack.push(());
        return Parens::Inside;
    }
    Parens::Outside
}

fn inside(seen: &mut String, step: Step, stack: &mut Vec<()>) -> Parens {
    match step.current {
        '[' => stack.push(()),
        ']' => {
            stack.pop();
            if stack.is_empty() {
                return Parens::Outside;
            }
        }
        '!' => return Parens::Done,
        _ => {}
    }
    seen.push(step.current);
    Parens::Inside
}

fn brackets() -> StateMachine<Parens, (), String> {
    StateMachine::new(Parens::Outside)
        .final_state(Parens::Outside, outside)
        .state(Parens::Inside, inside)
}

#[test]
fn accepts_balanced_input() {
    let mut seen = String::new();
    assert_eq!(brackets().run("a[b[c]]d", &mut seen), Ok(Outcome::Accepted));
    assert_eq!(seen, "b[c]");
}

#[test]
fn rejects_when_not_in_final_state() {
    let mut seen = String::new();
    assert_eq!(brackets().run("a[b", &mut seen), Ok(Outcome::Rejected));
}

#[test]
fn empty_input_in_final_state() {
    let mut seen = String::new();
    assert_eq!(brackets().run("", &mut seen), Ok(Outcome::Accepted));
}

#[test]
fn leftover_stack_is_reported() {
    fn push_everything(_: &mut (), _: Step, stack: &mut Vec<char>) -> Parens {
        stack.push('x');
        Parens::Outside
    }
    let machine: StateMachine<Parens, char, ()> =
        StateMachine::new(Parens::Outside).final_state(Parens::Outside, push_everything);
    let outcome = machine.run("abc", &mut ()).unwrap();
    assert_eq!(outcome, Outcome::AcceptedWithLeftover(3));
    assert!(outcome.is_accepted());
}

#[test]
fn missing_final_states_is_an_error() {
    let machine: StateMachine<Parens, (), String> =
        StateMachine::new(Parens::Outside).state(Parens::Outside, outside);
    assert_eq!(
        machine.run("abc", &mut String::new()),
        Err(FsmError::NoFinalStates)
    );
}

#[test]
fn unregistered_state_is_an_error() {
    let mut seen = String::new();
    assert_eq!(
        brackets().run("[!x", &mut seen),
        Err(FsmError::UnregisteredState {
            state: Parens::Done,
            previous: Parens::Inside,
        })
    );
}

#[test]
fn quick_exit_accepts_immediately() {
    let mut seen = String::new();
    let machine = brackets().quick_exit(Parens::Done);
    assert_eq!(machine.run("[ab!cd", &mut seen), Ok(Outcome::Accepted));
    assert_eq!(seen, "ab");
}

#[test]
fn escaped_steps() {
    let step = Step {
        current: '"',
        previous: Some('\\'),
    };
    assert!(step.is_escaped());
    assert!(!Step {
        current: '"',
        previous: None
    }
    .is_escaped());
}
