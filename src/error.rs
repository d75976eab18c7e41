use std::collections::TryReserveError;

use thiserror::Error;

/// Errors reported while compiling or executing a pattern.
///
/// The set is closed: every failure the engine can produce maps to one of
/// these variants. Parse and compile errors are deterministic for a given
/// pattern and configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum RegexError {
    #[error("invalid regular expression")]
    BadPattern,
    #[error("invalid collation character")]
    Collation,
    #[error("invalid character class name")]
    CharacterClass,
    #[error("invalid escape sequence")]
    Escape,
    #[error("invalid back reference")]
    SubExpression,
    #[error("unmatched [ or [^")]
    BracketBalance,
    #[error("unmatched ( or )")]
    ParenthesesBalance,
    #[error("unmatched {{")]
    BraceBalance,
    #[error("invalid range end")]
    Range,
    #[error("invalid repetition")]
    Repeat,
    #[error("memory exhausted")]
    OutOfMemory,
    #[error("regular expression too big")]
    ExpressionTooComplex,
    #[error("unknown regex error (code {0})")]
    ErrorNotInSpecification(i32),
}

// Numbering follows glibc's <regex.h>.
const REG_BADPAT: i32 = 2;
const REG_ECOLLATE: i32 = 3;
const REG_ECTYPE: i32 = 4;
const REG_EESCAPE: i32 = 5;
const REG_ESUBREG: i32 = 6;
const REG_EBRACK: i32 = 7;
const REG_EPAREN: i32 = 8;
const REG_EBRACE: i32 = 9;
const REG_BADBR: i32 = 10;
const REG_ERANGE: i32 = 11;
const REG_ESPACE: i32 = 12;
const REG_BADRPT: i32 = 13;
const REG_ESIZE: i32 = 15;

impl RegexError {
    /// The POSIX error code for this error.
    pub fn code(&self) -> i32 {
        match self {
            Self::BadPattern => REG_BADPAT,
            Self::Collation => REG_ECOLLATE,
            Self::CharacterClass => REG_ECTYPE,
            Self::Escape => REG_EESCAPE,
            Self::SubExpression => REG_ESUBREG,
            Self::BracketBalance => REG_EBRACK,
            Self::ParenthesesBalance => REG_EPAREN,
            Self::BraceBalance => REG_EBRACE,
            Self::Range => REG_ERANGE,
            Self::Repeat => REG_BADRPT,
            Self::OutOfMemory => REG_ESPACE,
            Self::ExpressionTooComplex => REG_ESIZE,
            Self::ErrorNotInSpecification(code) => *code,
        }
    }

    /// Translate a POSIX error code reported by a platform regex library.
    ///
    /// `REG_BADBR` (bad `{m,n}` content) folds into [`RegexError::Repeat`].
    /// Codes without a named variant are preserved in
    /// [`RegexError::ErrorNotInSpecification`].
    pub fn from_code(code: i32) -> Self {
        match code {
            REG_BADPAT => Self::BadPattern,
            REG_ECOLLATE => Self::Collation,
            REG_ECTYPE => Self::CharacterClass,
            REG_EESCAPE => Self::Escape,
            REG_ESUBREG => Self::SubExpression,
            REG_EBRACK => Self::BracketBalance,
            REG_EPAREN => Self::ParenthesesBalance,
            REG_EBRACE => Self::BraceBalance,
            REG_BADBR | REG_BADRPT => Self::Repeat,
            REG_ERANGE => Self::Range,
            REG_ESPACE => Self::OutOfMemory,
            REG_ESIZE => Self::ExpressionTooComplex,
            other => Self::ErrorNotInSpecification(other),
        }
    }
}

impl From<TryReserveError> for RegexError {
    fn from(_: TryReserveError) -> Self {
        Self::OutOfMemory
    }
}
