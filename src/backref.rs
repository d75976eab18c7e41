//! Matcher for patterns that contain back-references.
//!
//! Back-references make a pattern non-regular, so these patterns are run
//! over the AST instead of the automaton. Each node returns every way it can
//! match at a position, as `(end, slots)` pairs, and the caller keeps the
//! leftmost-longest one under the usual POSIX group ranking, ties going to
//! the candidate produced first. The number of candidates produced from each
//! start position is capped by `Config::backref_limit`.

use std::collections::HashSet;
use std::ops::Range;

use log::trace;

use crate::ast::RegexNode;
use crate::captures::{posix_order, Slot};
use crate::compiler::leaf_set;
use crate::error::RegexError;
use crate::pikevm::anchor_holds;
use crate::regex::{Config, ExecFlags};

type Candidate = (usize, Vec<Slot>);

/// Search `haystack` from `start` and return the slots of the leftmost-longest
/// match, or `None` when there is none.
pub(crate) fn exec(
    root: &RegexNode,
    captures: usize,
    config: &Config,
    haystack: &[u8],
    start: usize,
    flags: ExecFlags,
) -> Result<Option<Vec<Slot>>, RegexError> {
    let mut matcher = Matcher {
        input: haystack,
        config,
        flags,
        budget: config.backref_limit,
    };
    for at in start..=haystack.len() {
        matcher.budget = config.backref_limit;
        let mut slots = vec![None; 2 * (captures + 1)];
        slots[0] = Some(at);
        let mut best: Option<Vec<Slot>> = None;
        for (end, mut slots) in matcher.match_node(root, at, &slots)? {
            slots[1] = Some(end);
            if best.as_ref().map_or(true, |best| posix_order(&slots, best).is_gt()) {
                best = Some(slots);
            }
        }
        if let Some(best) = best {
            trace!(
                "back-reference match at {:?}, {} candidates left",
                best[0]..best[1],
                matcher.budget
            );
            return Ok(Some(best));
        }
    }
    Ok(None)
}

struct Matcher<'a> {
    input: &'a [u8],
    config: &'a Config,
    flags: ExecFlags,
    budget: usize,
}

impl Matcher<'_> {
    fn charge(&mut self, produced: usize) -> Result<(), RegexError> {
        self.budget = self
            .budget
            .checked_sub(produced)
            .ok_or(RegexError::OutOfMemory)?;
        Ok(())
    }

    // Return every (end, slots) reachable by matching `node` at `pos`.
    fn match_node(
        &mut self,
        node: &RegexNode,
        pos: usize,
        slots: &[Slot],
    ) -> Result<Vec<Candidate>, RegexError> {
        let found = match node {
            RegexNode::Empty => vec![(pos, slots.to_vec())],
            leaf if leaf.is_leaf() => match (leaf_set(leaf, self.config), self.input.get(pos)) {
                (Some(set), Some(&byte)) if set.contains(byte) => {
                    vec![(pos + 1, slots.to_vec())]
                }
                _ => vec![],
            },
            RegexNode::Anchor(anchor) => {
                if anchor_holds(*anchor, self.input, pos, self.config, self.flags) {
                    vec![(pos, slots.to_vec())]
                } else {
                    vec![]
                }
            }
            RegexNode::BackRef(index) => match (slots[index * 2], slots[index * 2 + 1]) {
                (Some(start), Some(end)) if self.backref_matches(start..end, pos) => {
                    vec![(pos + end - start, slots.to_vec())]
                }
                // A reference to a group that did not participate fails.
                _ => vec![],
            },
            RegexNode::Concat(nodes) => {
                let mut positions = vec![(pos, slots.to_vec())];
                for n in nodes {
                    let mut next_positions = Vec::new();
                    for (p, s) in &positions {
                        next_positions.extend(self.match_node(n, *p, s)?);
                    }
                    if next_positions.is_empty() {
                        return Ok(vec![]);
                    }
                    dedup(&mut next_positions);
                    positions = next_positions;
                }
                positions
            }
            RegexNode::Alternation(branches) => {
                let mut all_positions = Vec::new();
                for br in branches {
                    all_positions.extend(self.match_node(br, pos, slots)?);
                }
                dedup(&mut all_positions);
                all_positions
            }
            RegexNode::Group { index, node: inner } => {
                let first = index * 2;
                let last = (index + inner.capture_count() + 1) * 2;
                let mut entry = slots.to_vec();
                entry[first..last].fill(None);
                entry[first] = Some(pos);
                let mut found = self.match_node(inner, pos, &entry)?;
                for (end, s) in &mut found {
                    s[first + 1] = Some(*end);
                }
                found
            }
            RegexNode::Repeat { node: inner, min, max } => {
                self.match_repeat(inner, *min, *max, pos, slots)?
            }
            // Taken by the `is_leaf` arm.
            RegexNode::Literal(_)
            | RegexNode::Any
            | RegexNode::Set { .. }
            | RegexNode::Class { .. } => vec![],
        };
        self.charge(found.len())?;
        Ok(found)
    }

    fn match_repeat(
        &mut self,
        inner: &RegexNode,
        min: u32,
        max: Option<u32>,
        pos: usize,
        slots: &[Slot],
    ) -> Result<Vec<Candidate>, RegexError> {
        let mut results = Vec::new();
        let mut frontier = vec![(pos, slots.to_vec())];
        let mut count = 0;
        while !frontier.is_empty() && max.map_or(true, |max| count < max) {
            count += 1;
            let mut next = Vec::new();
            for (p, s) in &frontier {
                for (end, s) in self.match_node(inner, *p, s)? {
                    // An empty iteration past the minimum can end the loop
                    // but never feeds another iteration.
                    if count > min && end == *p {
                        results.push((end, s));
                    } else {
                        next.push((end, s));
                    }
                }
            }
            dedup(&mut next);
            if count >= min {
                results.extend(next.iter().cloned());
            }
            frontier = next;
        }
        // Taking no iteration is the last choice, after any empty one.
        if min == 0 {
            results.push((pos, slots.to_vec()));
        }
        dedup(&mut results);
        Ok(results)
    }

    fn backref_matches(&self, captured: Range<usize>, pos: usize) -> bool {
        let len = captured.len();
        let Some(candidate) = self.input.get(pos..pos + len) else {
            return false;
        };
        let captured = &self.input[captured];
        if self.config.case_insensitive {
            candidate.eq_ignore_ascii_case(captured)
        } else {
            candidate == captured
        }
    }
}

/// Drop repeated candidates, keeping the first occurrence of each.
fn dedup(candidates: &mut Vec<Candidate>) {
    let mut seen = HashSet::with_capacity(candidates.len());
    candidates.retain(|candidate| seen.insert(candidate.clone()));
}
