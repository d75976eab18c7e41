//! Tagged Pike VM: a lockstep NFA simulation with capture slots per thread.
//!
//! Every live thread advances over each input byte together, so matching
//! takes time proportional to the input length times the automaton size and
//! never backtracks. When two threads reach the same state at the same
//! position they have identical futures, so only the one whose slots rank
//! higher under [`posix_order`] survives, and on a tie the one that got there
//! first, i.e. the earlier alternative. That ranking puts the earliest start
//! first, which yields the leftmost match; the accepting state is then
//! recorded at every position it is reached, which yields the longest.

use std::cmp::Ordering;

use crate::ast::Anchor;
use crate::captures::{entered_groups, posix_order, Slot};
use crate::error::RegexError;
use crate::nfa::{Nfa, State, StateId};
use crate::regex::{Config, ExecFlags};

/// Whether a `^` or `$` holds at `at`.
pub(crate) fn anchor_holds(
    anchor: Anchor,
    haystack: &[u8],
    at: usize,
    config: &Config,
    flags: ExecFlags,
) -> bool {
    match anchor {
        Anchor::Start => {
            (at == 0 && !flags.not_bol) || (config.newline && at > 0 && haystack[at - 1] == b'\n')
        }
        Anchor::End => {
            (at == haystack.len() && !flags.not_eol)
                || (config.newline && at < haystack.len() && haystack[at] == b'\n')
        }
    }
}

/// Search `haystack` from `start` and return the slots of the leftmost-longest
/// match, or `None` when there is none.
pub(crate) fn exec(
    nfa: &Nfa,
    config: &Config,
    haystack: &[u8],
    start: usize,
    flags: ExecFlags,
) -> Result<Option<Vec<Slot>>, RegexError> {
    if start > haystack.len() {
        return Ok(None);
    }
    PikeVm::new(nfa, config, haystack, flags)?.run(start)
}

/// A set of states, each with its own slot vector.
///
/// Membership uses the sparse/dense trick so clearing is constant time.
struct Threads {
    dense: Vec<StateId>,
    sparse: Vec<usize>,
    slots: Vec<Slot>,
    stride: usize,
}

impl Threads {
    fn new(states: usize, stride: usize) -> Result<Self, RegexError> {
        let total = states.checked_mul(stride).ok_or(RegexError::OutOfMemory)?;
        let mut dense = Vec::new();
        dense.try_reserve_exact(states)?;
        let mut sparse = Vec::new();
        sparse.try_reserve_exact(states)?;
        sparse.resize(states, 0);
        let mut slots = Vec::new();
        slots.try_reserve_exact(total)?;
        slots.resize(total, None);
        Ok(Self {
            dense,
            sparse,
            slots,
            stride,
        })
    }

    fn contains(&self, id: StateId) -> bool {
        let index = self.sparse[id];
        index < self.dense.len() && self.dense[index] == id
    }

    fn insert(&mut self, id: StateId) {
        self.sparse[id] = self.dense.len();
        self.dense.push(id);
    }

    fn clear(&mut self) {
        self.dense.clear();
    }

    fn is_empty(&self) -> bool {
        self.dense.is_empty()
    }

    fn slots(&self, id: StateId) -> &[Slot] {
        &self.slots[id * self.stride..(id + 1) * self.stride]
    }

    fn slots_mut(&mut self, id: StateId) -> &mut [Slot] {
        &mut self.slots[id * self.stride..(id + 1) * self.stride]
    }
}

/// Work item of the epsilon closure. `Restore` undoes a capture once the
/// states behind it have been explored; `Leave` marks a state as no longer
/// on the current path.
enum Frame {
    Explore(StateId),
    Restore { slot: usize, value: Slot },
    Leave(StateId),
}

struct PikeVm<'a> {
    nfa: &'a Nfa,
    config: &'a Config,
    haystack: &'a [u8],
    flags: ExecFlags,
    stack: Vec<Frame>,
    scratch: Vec<Slot>,
    // How many times each state is open on the closure path.
    on_path: Vec<u32>,
}

impl<'a> PikeVm<'a> {
    fn new(
        nfa: &'a Nfa,
        config: &'a Config,
        haystack: &'a [u8],
        flags: ExecFlags,
    ) -> Result<Self, RegexError> {
        let mut scratch = Vec::new();
        scratch.try_reserve_exact(nfa.slots_len())?;
        scratch.resize(nfa.slots_len(), None);
        let mut on_path = Vec::new();
        on_path.try_reserve_exact(nfa.states().len())?;
        on_path.resize(nfa.states().len(), 0);
        Ok(Self {
            nfa,
            config,
            haystack,
            flags,
            stack: Vec::new(),
            scratch,
            on_path,
        })
    }

    fn run(mut self, start: usize) -> Result<Option<Vec<Slot>>, RegexError> {
        let nfa = self.nfa;
        let states = nfa.states().len();
        let mut clist = Threads::new(states, nfa.slots_len())?;
        let mut nlist = Threads::new(states, nfa.slots_len())?;
        let mut best: Option<Vec<Slot>> = None;
        let mut at = start;
        loop {
            // New threads only start until some match is known; any later
            // start would lose to it.
            if best.is_none() {
                self.scratch.fill(None);
                self.scratch[0] = Some(at);
                self.add(&mut clist, nfa.start(), at);
            }
            if clist.contains(nfa.accept()) {
                let mut candidate = clist.slots(nfa.accept()).to_vec();
                candidate[1] = Some(at);
                let better = best
                    .as_ref()
                    .map_or(true, |best| posix_order(&candidate, best) == Ordering::Greater);
                if better {
                    best = Some(candidate);
                }
            }
            if at >= self.haystack.len() || (clist.is_empty() && best.is_some()) {
                break;
            }
            let byte = self.haystack[at];
            let best_start = best.as_ref().and_then(|best| best[0]);
            for index in 0..clist.dense.len() {
                let id = clist.dense[index];
                let next = match nfa.state(id) {
                    State::Byte { byte: b, next } if *b == byte => *next,
                    State::Set { set, next } if set.contains(byte) => *next,
                    _ => continue,
                };
                let slots = clist.slots(id);
                if let (Some(best_start), Some(thread_start)) = (best_start, slots[0]) {
                    if thread_start > best_start {
                        continue;
                    }
                }
                self.scratch.copy_from_slice(slots);
                self.add(&mut nlist, next, at + 1);
            }
            std::mem::swap(&mut clist, &mut nlist);
            nlist.clear();
            at += 1;
        }
        Ok(best)
    }

    /// Follow epsilon transitions from `id` at position `at`, carrying the
    /// slots in `scratch`, and record every state reached in `list`.
    fn add(&mut self, list: &mut Threads, id: StateId, at: usize) {
        self.stack.push(Frame::Explore(id));
        while let Some(frame) = self.stack.pop() {
            match frame {
                Frame::Explore(id) => self.explore(list, id, at),
                Frame::Restore { slot, value } => self.scratch[slot] = value,
                Frame::Leave(id) => self.on_path[id] -= 1,
            }
        }
    }

    fn explore(&mut self, list: &mut Threads, id: StateId, at: usize) {
        if list.contains(id) {
            // Reached again: keep the better ranked thread and, if that is
            // the new one, propagate its slots past this state again. A tie
            // keeps the earlier arrival, unless the new thread looped back
            // into a state still being explored after an empty iteration
            // that entered more groups.
            let stored = list.slots(id);
            let replace = match posix_order(&self.scratch, stored) {
                Ordering::Greater => true,
                Ordering::Equal => {
                    self.on_path[id] > 0 && entered_groups(&self.scratch) > entered_groups(stored)
                }
                Ordering::Less => false,
            };
            if !replace {
                return;
            }
        } else {
            list.insert(id);
        }
        list.slots_mut(id).copy_from_slice(&self.scratch);
        self.on_path[id] += 1;
        self.stack.push(Frame::Leave(id));

        let nfa = self.nfa;
        match nfa.state(id) {
            State::Byte { .. } | State::Set { .. } | State::Match => {}
            State::Empty { next } => self.stack.push(Frame::Explore(*next)),
            State::Union { alternates } => {
                self.stack.extend(alternates.iter().rev().map(|&alt| Frame::Explore(alt)));
            }
            State::Look { anchor, next } => {
                if anchor_holds(*anchor, self.haystack, at, self.config, self.flags) {
                    self.stack.push(Frame::Explore(*next));
                }
            }
            State::CaptureStart {
                group,
                last_nested,
                next,
            } => {
                let first = group * 2;
                for slot in first..(last_nested + 1) * 2 {
                    self.stack.push(Frame::Restore {
                        slot,
                        value: self.scratch[slot],
                    });
                    self.scratch[slot] = None;
                }
                self.scratch[first] = Some(at);
                self.stack.push(Frame::Explore(*next));
            }
            State::CaptureEnd { group, next } => {
                let slot = group * 2 + 1;
                self.stack.push(Frame::Restore {
                    slot,
                    value: self.scratch[slot],
                });
                self.scratch[slot] = Some(at);
                self.stack.push(Frame::Explore(*next));
            }
        }
    }
}
