//! Iteration over successive non-overlapping matches.

use std::iter::FusedIterator;

use crate::captures::{Captures, Match};
use crate::error::RegexError;
use crate::regex::{ExecFlags, Regex};

/// Iterator over the groups of successive matches, created by
/// [`Regex::captures_iter`].
///
/// After a non-empty match the next search starts at its end; after an empty
/// match it starts one byte further. Anchors are always judged against the
/// whole haystack. The iterator ends after the first error.
#[derive(Debug)]
pub struct CaptureMatches<'r, 'h> {
    regex: &'r Regex,
    haystack: &'h [u8],
    cursor: Option<usize>,
}

impl<'r, 'h> CaptureMatches<'r, 'h> {
    pub(crate) fn new(regex: &'r Regex, haystack: &'h [u8]) -> Self {
        Self {
            regex,
            haystack,
            cursor: Some(0),
        }
    }
}

impl<'h> Iterator for CaptureMatches<'_, 'h> {
    type Item = Result<Captures<'h>, RegexError>;

    fn next(&mut self) -> Option<Self::Item> {
        let at = self.cursor.take()?;
        match self.regex.exec(self.haystack, at, ExecFlags::default()) {
            Ok(Some(caps)) => {
                let m = caps.get_match();
                let next = if m.is_empty() { m.end() + 1 } else { m.end() };
                if next <= self.haystack.len() {
                    self.cursor = Some(next);
                }
                Some(Ok(caps))
            }
            Ok(None) => None,
            Err(err) => Some(Err(err)),
        }
    }
}

impl FusedIterator for CaptureMatches<'_, '_> {}

/// Iterator over the spans of successive matches, created by
/// [`Regex::find_iter`].
#[derive(Debug)]
pub struct Matches<'r, 'h>(CaptureMatches<'r, 'h>);

impl<'r, 'h> Matches<'r, 'h> {
    pub(crate) fn new(regex: &'r Regex, haystack: &'h [u8]) -> Self {
        Self(CaptureMatches::new(regex, haystack))
    }
}

impl<'h> Iterator for Matches<'_, 'h> {
    type Item = Result<Match<'h>, RegexError>;

    fn next(&mut self) -> Option<Self::Item> {
        Some(self.0.next()?.map(|caps| caps.get_match()))
    }
}

impl FusedIterator for Matches<'_, '_> {}
