//! The compiled automaton.
//!
//! A Thompson NFA with one start state and one accepting state. Byte and
//! set states consume input; every other state is an epsilon transition.
//! Capture states record the current position for a group as a side effect.

use std::fmt;

use crate::ast::Anchor;
use crate::class::ByteSet;

pub type StateId = usize;

/// Placeholder target for transitions that have not been patched yet.
pub(crate) const UNPATCHED: StateId = usize::MAX;

#[derive(Clone, PartialEq, Eq)]
pub enum State {
    Byte { byte: u8, next: StateId },
    Set { set: ByteSet, next: StateId },
    /// Epsilon fan-out. Earlier alternates are preferred on ties.
    Union { alternates: Vec<StateId> },
    /// Entering group `group`. Also resets groups `group + 1..=last_nested`,
    /// which sit inside it, so an iteration never reports stale spans.
    CaptureStart {
        group: usize,
        last_nested: usize,
        next: StateId,
    },
    CaptureEnd { group: usize, next: StateId },
    Look { anchor: Anchor, next: StateId },
    Empty { next: StateId },
    Match,
}

impl fmt::Debug for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            State::Byte { byte, next } => {
                write!(f, "{:?} => {next}", byte.escape_ascii().to_string())
            }
            State::Set { set, next } => write!(f, "{set:?} => {next}"),
            State::Union { alternates } => write!(f, "union {alternates:?}"),
            State::CaptureStart {
                group,
                last_nested,
                next,
            } => write!(f, "start({group}..={last_nested}) => {next}"),
            State::CaptureEnd { group, next } => write!(f, "end({group}) => {next}"),
            State::Look { anchor, next } => write!(f, "{anchor:?} => {next}"),
            State::Empty { next } => write!(f, "empty => {next}"),
            State::Match => write!(f, "MATCH"),
        }
    }
}

/// An immutable automaton ready for matching.
pub struct Nfa {
    pub(crate) states: Vec<State>,
    pub(crate) start: StateId,
    pub(crate) accept: StateId,
    pub(crate) captures: usize,
}

impl Nfa {
    pub fn states(&self) -> &[State] {
        &self.states
    }

    pub fn state(&self, id: StateId) -> &State {
        &self.states[id]
    }

    pub fn start(&self) -> StateId {
        self.start
    }

    pub fn accept(&self) -> StateId {
        self.accept
    }

    /// Number of capturing groups, not counting the implicit group 0.
    pub fn captures_len(&self) -> usize {
        self.captures
    }

    /// Slots needed to hold group 0 and every capturing group.
    pub fn slots_len(&self) -> usize {
        2 * (self.captures + 1)
    }

    /// Ids of the states reachable from the start state.
    pub fn reachable(&self) -> Vec<bool> {
        let mut seen = vec![false; self.states.len()];
        let mut stack = vec![self.start];
        while let Some(id) = stack.pop() {
            if std::mem::replace(&mut seen[id], true) {
                continue;
            }
            match &self.states[id] {
                State::Union { alternates } => stack.extend(alternates),
                State::Byte { next, .. }
                | State::Set { next, .. }
                | State::CaptureStart { next, .. }
                | State::CaptureEnd { next, .. }
                | State::Look { next, .. }
                | State::Empty { next } => stack.push(*next),
                State::Match => {}
            }
        }
        seen
    }
}

impl fmt::Debug for Nfa {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Nfa(start: {}, accept: {}, captures: {})",
            self.start, self.accept, self.captures
        )?;
        for (id, state) in self.states.iter().enumerate() {
            writeln!(f, "{id:06}: {state:?}")?;
        }
        Ok(())
    }
}
