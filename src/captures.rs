//! Match spans and per-group results.

use std::cmp::Ordering;
use std::fmt;
use std::ops::Range;

/// A recorded position, or `None` when the group did not participate.
pub(crate) type Slot = Option<usize>;

/// Rank two slot vectors by POSIX preference.
///
/// Groups are compared in order, group 0 (the whole match) first. For each
/// group an earlier start wins, then a later end. Returns `Greater` when `a`
/// is preferred. A group that is unset on either side does not decide, nor
/// does an open group (start set, end unset) decide on its end; such ties go
/// to whichever alternative the caller met first.
pub(crate) fn posix_order(a: &[Slot], b: &[Slot]) -> Ordering {
    for (a, b) in a.chunks_exact(2).zip(b.chunks_exact(2)) {
        let by_start = match (a[0], b[0]) {
            (Some(x), Some(y)) => y.cmp(&x),
            _ => Ordering::Equal,
        };
        let by_end = match (a[1], b[1]) {
            (Some(x), Some(y)) => x.cmp(&y),
            _ => Ordering::Equal,
        };
        match by_start.then(by_end) {
            Ordering::Equal => continue,
            decided => return decided,
        }
    }
    Ordering::Equal
}

/// Number of groups that have been entered.
pub(crate) fn entered_groups(slots: &[Slot]) -> usize {
    slots.iter().step_by(2).filter(|start| start.is_some()).count()
}

/// A half-open byte range `[start, end)` of a haystack.
#[derive(Copy, Clone, Eq, PartialEq)]
pub struct Match<'h> {
    haystack: &'h [u8],
    start: usize,
    end: usize,
}

impl<'h> Match<'h> {
    pub(crate) fn new(haystack: &'h [u8], start: usize, end: usize) -> Self {
        debug_assert!(start <= end && end <= haystack.len());
        Self { haystack, start, end }
    }

    /// Byte offset of the start of the match.
    #[inline]
    pub fn start(&self) -> usize {
        self.start
    }

    /// Byte offset just past the end of the match.
    #[inline]
    pub fn end(&self) -> usize {
        self.end
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    #[inline]
    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    /// The matched bytes.
    #[inline]
    pub fn as_bytes(&self) -> &'h [u8] {
        &self.haystack[self.range()]
    }

    /// The matched text, if it is valid UTF-8.
    pub fn as_str(&self) -> Option<&'h str> {
        std::str::from_utf8(self.as_bytes()).ok()
    }
}

impl fmt::Debug for Match<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut fmt = f.debug_struct("Match");
        fmt.field("start", &self.start).field("end", &self.end);
        if let Some(text) = self.as_str() {
            fmt.field("text", &text);
        } else {
            fmt.field("bytes", &self.as_bytes());
        }
        fmt.finish()
    }
}

impl From<Match<'_>> for Range<usize> {
    fn from(m: Match<'_>) -> Range<usize> {
        m.range()
    }
}

/// The outcome of one successful search: the whole match plus one optional
/// span per capturing group.
///
/// Index 0 is the whole match and is always set. Groups that did not take
/// part in the match are `None`, which is distinct from an empty match.
#[derive(Clone, PartialEq, Eq)]
pub struct Captures<'h> {
    haystack: &'h [u8],
    slots: Box<[Slot]>,
}

impl<'h> Captures<'h> {
    pub(crate) fn new(haystack: &'h [u8], slots: Vec<Slot>) -> Self {
        Self {
            haystack,
            slots: slots.into_boxed_slice(),
        }
    }

    /// The span of group `index`, or `None` when it is unset or out of range.
    pub fn get(&self, index: usize) -> Option<Match<'h>> {
        let start = (*self.slots.get(index * 2)?)?;
        let end = (*self.slots.get(index * 2 + 1)?)?;
        Some(Match::new(self.haystack, start, end))
    }

    /// The span of the whole match.
    pub fn get_match(&self) -> Match<'h> {
        match (self.slots[0], self.slots[1]) {
            (Some(start), Some(end)) => Match::new(self.haystack, start, end),
            _ => unreachable!("group 0 is always set in a successful match"),
        }
    }

    /// Number of groups, including group 0.
    pub fn len(&self) -> usize {
        self.slots.len() / 2
    }

    /// Always false: group 0 is always present.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Spans of every group in index order, starting with group 0.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = Option<Match<'h>>> + '_ {
        (0..self.len()).map(move |index| self.get(index))
    }
}

impl fmt::Debug for Captures<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter().enumerate()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leftmost_then_longest() {
        let a = [Some(0), Some(3)];
        let b = [Some(1), Some(5)];
        let c = [Some(0), Some(2)];
        assert_eq!(posix_order(&a, &b), Ordering::Greater);
        assert_eq!(posix_order(&a, &c), Ordering::Greater);
        assert_eq!(posix_order(&c, &a), Ordering::Less);
        assert_eq!(posix_order(&a, &a), Ordering::Equal);
    }

    #[test]
    fn groups_break_ties_in_order() {
        // (a|ab)(c|bcd) on "abcd": group 1 "ab" beats group 1 "a".
        let short_first = [Some(0), Some(4), Some(0), Some(1), Some(1), Some(4)];
        let long_first = [Some(0), Some(4), Some(0), Some(2), Some(2), Some(3)];
        assert_eq!(posix_order(&long_first, &short_first), Ordering::Greater);
    }

    #[test]
    fn unset_and_open_groups_tie() {
        let set = [Some(0), None, Some(0), Some(0)];
        let unset = [Some(0), None, None, None];
        assert_eq!(posix_order(&set, &unset), Ordering::Equal);
        assert_eq!(posix_order(&unset, &set), Ordering::Equal);
        let open = [Some(0), None, Some(1), None];
        assert_eq!(posix_order(&open, &open), Ordering::Equal);
        assert_eq!(entered_groups(&set), 2);
        assert_eq!(entered_groups(&unset), 1);
    }

    #[test]
    fn captures_accessors() {
        let haystack = b"xabc";
        let caps = Captures::new(haystack, vec![Some(1), Some(4), Some(1), Some(2), None, None]);
        assert_eq!(caps.len(), 3);
        assert_eq!(caps.get_match().as_bytes(), b"abc");
        assert_eq!(caps.get(1).map(|m| m.range()), Some(1..2));
        assert_eq!(caps.get(2), None);
        assert_eq!(caps.get(3), None);
        let spans: Vec<Option<Range<usize>>> = caps.iter().map(|m| m.map(Range::from)).collect();
        assert_eq!(spans, vec![Some(1..4), Some(1..2), None]);
    }

    #[test]
    fn match_text() {
        let m = Match::new(b"a\xffb", 0, 3);
        assert_eq!(m.len(), 3);
        assert_eq!(m.as_str(), None);
        let m = Match::new(b"hello", 1, 1);
        assert!(m.is_empty());
        assert_eq!(m.as_str(), Some(""));
        assert_eq!(format!("{m:?}"), r#"Match { start: 1, end: 1, text: "" }"#);
    }
}
