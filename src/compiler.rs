//! Lowering of the pattern AST into a Thompson NFA.

use log::debug;

use crate::ast::RegexNode;
use crate::class::ByteSet;
use crate::error::RegexError;
use crate::nfa::{Nfa, State, StateId, UNPATCHED};
use crate::regex::Config;

/// A compiled pattern, ready to be executed any number of times.
#[derive(Debug)]
pub(crate) enum Program {
    /// Run by the Pike VM in time linear in the input.
    PikeVm(Nfa),
    /// Patterns with back-references are not regular and are run by the
    /// set-enumerating matcher in `backref.rs`.
    Backref { root: RegexNode, captures: usize },
}

impl Program {
    pub(crate) fn captures_len(&self) -> usize {
        match self {
            Program::PikeVm(nfa) => nfa.captures_len(),
            Program::Backref { captures, .. } => *captures,
        }
    }
}

pub(crate) fn compile(ast: &RegexNode, config: &Config) -> Result<Program, RegexError> {
    let captures = ast.capture_count();
    if ast.has_backref() {
        debug!("pattern has back-references, {captures} capture groups");
        return Ok(Program::Backref {
            root: ast.clone(),
            captures,
        });
    }
    let nfa = Compiler::new(config).compile(ast)?;
    debug!(
        "compiled pattern into {} states, {} capture groups",
        nfa.states.len(),
        nfa.captures
    );
    Ok(Program::PikeVm(nfa))
}

/// The bytes a single-byte node accepts under the given configuration.
///
/// Returns `None` for nodes that are not leaves.
pub(crate) fn leaf_set(node: &RegexNode, config: &Config) -> Option<ByteSet> {
    let (set, line_bound) = match node {
        RegexNode::Literal(byte) => (ByteSet::single(*byte), false),
        RegexNode::Any => (ByteSet::full(), true),
        RegexNode::Set { set, negated } => (*set, *negated),
        RegexNode::Class { class, negated } => (class.to_set(), *negated),
        _ => return None,
    };
    let mut set = if config.case_insensitive { set.case_folded() } else { set };
    if let RegexNode::Set { negated: true, .. } | RegexNode::Class { negated: true, .. } = node {
        set = set.negated();
    }
    // `.` and negated brackets stop at line ends in newline mode.
    if line_bound && config.newline {
        set.remove(b'\n');
    }
    Some(set)
}

/// A fragment under construction. `end` still has a dangling transition
/// that gets patched to whatever follows.
#[derive(Debug, Clone, Copy)]
struct ThompsonRef {
    start: StateId,
    end: StateId,
}

struct Compiler<'c> {
    config: &'c Config,
    states: Vec<State>,
}

impl<'c> Compiler<'c> {
    fn new(config: &'c Config) -> Self {
        Self {
            config,
            states: Vec::new(),
        }
    }

    fn compile(mut self, ast: &RegexNode) -> Result<Nfa, RegexError> {
        let frag = self.c(ast)?;
        let accept = self.add(State::Match)?;
        self.patch(frag.end, accept);
        Ok(Nfa {
            states: self.states,
            start: frag.start,
            accept,
            captures: ast.capture_count(),
        })
    }

    fn add(&mut self, state: State) -> Result<StateId, RegexError> {
        if self.states.len() >= self.config.size_limit {
            return Err(RegexError::ExpressionTooComplex);
        }
        self.states.try_reserve(1)?;
        self.states.push(state);
        Ok(self.states.len() - 1)
    }

    fn patch(&mut self, from: StateId, to: StateId) {
        match &mut self.states[from] {
            State::Union { alternates } => alternates.push(to),
            State::Byte { next, .. }
            | State::Set { next, .. }
            | State::CaptureStart { next, .. }
            | State::CaptureEnd { next, .. }
            | State::Look { next, .. }
            | State::Empty { next } => *next = to,
            State::Match => {}
        }
    }

    fn c(&mut self, node: &RegexNode) -> Result<ThompsonRef, RegexError> {
        match node {
            leaf if leaf.is_leaf() => self.c_leaf(leaf),
            RegexNode::Empty => self.c_empty(),
            RegexNode::Concat(nodes) => self.c_concat(nodes),
            RegexNode::Alternation(alternates) => self.c_alternation(alternates),
            RegexNode::Repeat { node, min, max } => self.c_repeat(node, *min, *max),
            RegexNode::Group { index, node } => self.c_group(*index, node),
            RegexNode::Anchor(anchor) => {
                let id = self.add(State::Look {
                    anchor: *anchor,
                    next: UNPATCHED,
                })?;
                Ok(ThompsonRef { start: id, end: id })
            }
            // Leaves are taken by the first arm; back-references are routed
            // to the back-reference matcher before compilation.
            RegexNode::BackRef(_)
            | RegexNode::Literal(_)
            | RegexNode::Any
            | RegexNode::Set { .. }
            | RegexNode::Class { .. } => Err(RegexError::BadPattern),
        }
    }

    fn c_empty(&mut self) -> Result<ThompsonRef, RegexError> {
        let id = self.add(State::Empty { next: UNPATCHED })?;
        Ok(ThompsonRef { start: id, end: id })
    }

    fn c_leaf(&mut self, node: &RegexNode) -> Result<ThompsonRef, RegexError> {
        let set = leaf_set(node, self.config).ok_or(RegexError::BadPattern)?;
        let state = match set.ranges().as_slice() {
            [(lo, hi)] if lo == hi => State::Byte {
                byte: *lo,
                next: UNPATCHED,
            },
            _ => State::Set {
                set,
                next: UNPATCHED,
            },
        };
        let id = self.add(state)?;
        Ok(ThompsonRef { start: id, end: id })
    }

    fn c_concat(&mut self, nodes: &[RegexNode]) -> Result<ThompsonRef, RegexError> {
        let Some((first, rest)) = nodes.split_first() else {
            return self.c_empty();
        };
        let first = self.c(first)?;
        let mut end = first.end;
        for node in rest {
            let next = self.c(node)?;
            self.patch(end, next.start);
            end = next.end;
        }
        Ok(ThompsonRef {
            start: first.start,
            end,
        })
    }

    fn c_alternation(&mut self, alternates: &[RegexNode]) -> Result<ThompsonRef, RegexError> {
        let union = self.add(State::Union {
            alternates: Vec::with_capacity(alternates.len()),
        })?;
        let end = self.add(State::Empty { next: UNPATCHED })?;
        for alternate in alternates {
            let frag = self.c(alternate)?;
            self.patch(union, frag.start);
            self.patch(frag.end, end);
        }
        Ok(ThompsonRef { start: union, end })
    }

    fn c_group(&mut self, group: usize, node: &RegexNode) -> Result<ThompsonRef, RegexError> {
        let start = self.add(State::CaptureStart {
            group,
            last_nested: group + node.capture_count(),
            next: UNPATCHED,
        })?;
        let inner = self.c(node)?;
        let end = self.add(State::CaptureEnd {
            group,
            next: UNPATCHED,
        })?;
        self.patch(start, inner.start);
        self.patch(inner.end, end);
        Ok(ThompsonRef { start, end })
    }

    /// `x{min,max}` becomes `min` chained copies of `x` followed by
    /// `max - min` nested optional copies. `x{min,}` becomes `min - 1`
    /// copies followed by `x+`, or `x*` when `min` is zero.
    fn c_repeat(
        &mut self,
        node: &RegexNode,
        min: u32,
        max: Option<u32>,
    ) -> Result<ThompsonRef, RegexError> {
        let entry = self.c_empty()?;
        let mut end = entry.end;
        let mandatory = match max {
            None if min > 0 => min - 1,
            _ => min,
        };
        for _ in 0..mandatory {
            let copy = self.c(node)?;
            self.patch(end, copy.start);
            end = copy.end;
        }
        match max {
            None if min == 0 => {
                let union = self.add(State::Union { alternates: vec![] })?;
                self.patch(end, union);
                let body = self.c(node)?;
                self.patch(union, body.start);
                self.patch(body.end, union);
                end = union;
            }
            None => {
                let body = self.c(node)?;
                self.patch(end, body.start);
                let union = self.add(State::Union { alternates: vec![] })?;
                self.patch(body.end, union);
                self.patch(union, body.start);
                end = union;
            }
            Some(max) => {
                if max > min {
                    let exit = self.add(State::Empty { next: UNPATCHED })?;
                    for _ in min..max {
                        let union = self.add(State::Union { alternates: vec![] })?;
                        self.patch(end, union);
                        let copy = self.c(node)?;
                        self.patch(union, copy.start);
                        self.patch(union, exit);
                        end = copy.end;
                    }
                    self.patch(end, exit);
                    end = exit;
                }
            }
        }
        Ok(ThompsonRef {
            start: entry.start,
            end,
        })
    }
}
