//! A POSIX extended regular expression engine.
//!
//! Patterns follow the ERE grammar of POSIX.1 (`regcomp` with
//! `REG_EXTENDED`), matched over bytes with leftmost-longest semantics and
//! POSIX subexpression rules. Patterns without back-references run on a
//! Pike VM in time linear in the haystack.
//!
//! ```
//! use ere::Regex;
//!
//! let re = Regex::new("(a*)(b|abc)")?;
//! let caps = re.captures(b"xaabc")?.unwrap();
//! assert_eq!(caps.get_match().range(), 1..5);
//! assert_eq!(caps.get(1).unwrap().as_bytes(), b"a");
//! assert_eq!(caps.get(2).unwrap().as_bytes(), b"abc");
//! # Ok::<(), ere::RegexError>(())
//! ```

pub mod ast;
mod backref;
mod captures;
pub mod class;
mod compiler;
mod error;
mod iter;
pub mod nfa;
pub mod parser;
mod pikevm;
mod regex;

pub use crate::captures::{Captures, Match};
pub use crate::error::RegexError;
pub use crate::iter::{CaptureMatches, Matches};
pub use crate::nfa::Nfa;
pub use crate::parser::parse;
pub use crate::regex::{ExecFlags, Regex, RegexBuilder, DEFAULT_BACKREF_LIMIT, DEFAULT_SIZE_LIMIT};

/// Compile `pattern` and report whether it matches anywhere in `haystack`.
pub fn is_match(pattern: &str, haystack: &[u8]) -> Result<bool, RegexError> {
    Regex::new(pattern)?.is_match(haystack)
}
