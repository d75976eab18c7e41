use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::backref;
use crate::captures::{Captures, Match};
use crate::compiler::{compile, Program};
use crate::error::RegexError;
use crate::iter::{CaptureMatches, Matches};
use crate::nfa::Nfa;
use crate::parser::parse;
use crate::pikevm;

/// Default ceiling on automaton states.
pub const DEFAULT_SIZE_LIMIT: usize = 100_000;

/// Default number of candidates the back-reference matcher may produce
/// from one start position.
pub const DEFAULT_BACKREF_LIMIT: usize = 1_000_000;

/// Compile-time options, the counterpart of `regcomp` flags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Config {
    pub(crate) case_insensitive: bool,
    pub(crate) newline: bool,
    pub(crate) size_limit: usize,
    pub(crate) backref_limit: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            case_insensitive: false,
            newline: false,
            size_limit: DEFAULT_SIZE_LIMIT,
            backref_limit: DEFAULT_BACKREF_LIMIT,
        }
    }
}

/// Per-search options, the counterpart of `regexec` flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ExecFlags {
    /// The haystack start is not the start of a line, so `^` does not
    /// match there.
    pub not_bol: bool,
    /// The haystack end is not the end of a line, so `$` does not match
    /// there.
    pub not_eol: bool,
}

/// Builds a [`Regex`] with non-default options.
///
/// ```
/// use ere::RegexBuilder;
///
/// let re = RegexBuilder::new("^hello").case_insensitive(true).newline(true).build()?;
/// assert!(re.is_match(b"say\nHELLO")?);
/// # Ok::<(), ere::RegexError>(())
/// ```
#[derive(Debug, Clone)]
pub struct RegexBuilder {
    pattern: Vec<u8>,
    config: Config,
}

impl RegexBuilder {
    pub fn new(pattern: &str) -> Self {
        Self::from_bytes(pattern.as_bytes())
    }

    pub fn from_bytes(pattern: &[u8]) -> Self {
        Self {
            pattern: pattern.to_vec(),
            config: Config::default(),
        }
    }

    /// Ignore ASCII case in literals, bracket expressions and
    /// back-references.
    pub fn case_insensitive(&mut self, yes: bool) -> &mut Self {
        self.config.case_insensitive = yes;
        self
    }

    /// Treat `\n` as a line separator: `.` and negated bracket expressions
    /// do not match it, `^` matches after it and `$` before it.
    pub fn newline(&mut self, yes: bool) -> &mut Self {
        self.config.newline = yes;
        self
    }

    /// Maximum number of automaton states. Larger patterns fail with
    /// [`RegexError::ExpressionTooComplex`].
    pub fn size_limit(&mut self, states: usize) -> &mut Self {
        self.config.size_limit = states;
        self
    }

    /// Maximum number of partial matches the back-reference matcher may
    /// produce while trying one start position before failing with
    /// [`RegexError::OutOfMemory`]. The count starts afresh at each start
    /// position, so long haystacks are not penalized.
    pub fn backref_limit(&mut self, candidates: usize) -> &mut Self {
        self.config.backref_limit = candidates;
        self
    }

    pub fn build(&self) -> Result<Regex, RegexError> {
        let ast = parse(&self.pattern)?;
        let program = compile(&ast, &self.config)?;
        Ok(Regex {
            inner: Arc::new(Inner {
                pattern: self.pattern.clone().into_boxed_slice(),
                config: self.config.clone(),
                program,
            }),
        })
    }
}

/// A compiled POSIX extended regular expression.
///
/// Compiling is the expensive step; a `Regex` is immutable afterwards and
/// can be cloned cheaply and shared between threads. Every search allocates
/// its own working memory.
///
/// ```
/// use ere::Regex;
///
/// let re = Regex::new("(a|ab)(c|bcd)(d*)")?;
/// let caps = re.captures(b"abcd")?.unwrap();
/// assert_eq!(caps.get(0).unwrap().as_bytes(), b"abcd");
/// assert_eq!(caps.get(1).unwrap().as_bytes(), b"ab");
/// # Ok::<(), ere::RegexError>(())
/// ```
#[derive(Clone)]
pub struct Regex {
    inner: Arc<Inner>,
}

struct Inner {
    pattern: Box<[u8]>,
    config: Config,
    program: Program,
}

impl Regex {
    pub fn new(pattern: &str) -> Result<Self, RegexError> {
        RegexBuilder::new(pattern).build()
    }

    pub fn from_bytes(pattern: &[u8]) -> Result<Self, RegexError> {
        RegexBuilder::from_bytes(pattern).build()
    }

    /// The pattern this regex was compiled from.
    pub fn as_bytes(&self) -> &[u8] {
        &self.inner.pattern
    }

    /// Number of capturing groups, not counting the whole match.
    pub fn captures_len(&self) -> usize {
        self.inner.program.captures_len()
    }

    /// The compiled automaton, or `None` for patterns with back-references.
    pub fn nfa(&self) -> Option<&Nfa> {
        match &self.inner.program {
            Program::PikeVm(nfa) => Some(nfa),
            Program::Backref { .. } => None,
        }
    }

    /// Search `haystack[start..]` for the leftmost-longest match.
    ///
    /// Offsets in the result are relative to the whole `haystack`, and `^`
    /// and `$` are judged against the whole `haystack`, so a search can
    /// resume where an earlier one stopped. Returns `Ok(None)` when there
    /// is no match and also when `start` is past the end.
    pub fn exec<'h>(
        &self,
        haystack: &'h [u8],
        start: usize,
        flags: ExecFlags,
    ) -> Result<Option<Captures<'h>>, RegexError> {
        let config = &self.inner.config;
        let slots = match &self.inner.program {
            Program::PikeVm(nfa) => pikevm::exec(nfa, config, haystack, start, flags)?,
            Program::Backref { root, captures } => {
                if start > haystack.len() {
                    return Ok(None);
                }
                backref::exec(root, *captures, config, haystack, start, flags)?
            }
        };
        Ok(slots.map(|slots| Captures::new(haystack, slots)))
    }

    pub fn captures_at<'h>(
        &self,
        haystack: &'h [u8],
        start: usize,
    ) -> Result<Option<Captures<'h>>, RegexError> {
        self.exec(haystack, start, ExecFlags::default())
    }

    pub fn captures<'h>(&self, haystack: &'h [u8]) -> Result<Option<Captures<'h>>, RegexError> {
        self.captures_at(haystack, 0)
    }

    pub fn find<'h>(&self, haystack: &'h [u8]) -> Result<Option<Match<'h>>, RegexError> {
        Ok(self.captures(haystack)?.map(|caps| caps.get_match()))
    }

    pub fn is_match(&self, haystack: &[u8]) -> Result<bool, RegexError> {
        Ok(self.captures(haystack)?.is_some())
    }

    /// Iterate over successive non-overlapping matches.
    pub fn find_iter<'r, 'h>(&'r self, haystack: &'h [u8]) -> Matches<'r, 'h> {
        Matches::new(self, haystack)
    }

    /// Iterate over the groups of successive non-overlapping matches.
    pub fn captures_iter<'r, 'h>(&'r self, haystack: &'h [u8]) -> CaptureMatches<'r, 'h> {
        CaptureMatches::new(self, haystack)
    }
}

impl FromStr for Regex {
    type Err = RegexError;

    fn from_str(pattern: &str) -> Result<Self, Self::Err> {
        Regex::new(pattern)
    }
}

impl fmt::Display for Regex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(self.as_bytes()))
    }
}

impl fmt::Debug for Regex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Regex").field(&self.to_string()).finish()
    }
}
