//! Byte sets and POSIX named character classes.
//!
//! Classes are ASCII-only; bytes above 0x7F never belong to a named class.

use std::fmt;

/// A set of byte values, one bit per byte.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ByteSet([u64; 4]);

impl ByteSet {
    pub const fn empty() -> Self {
        Self([0; 4])
    }

    pub const fn full() -> Self {
        Self([u64::MAX; 4])
    }

    pub fn single(byte: u8) -> Self {
        let mut set = Self::empty();
        set.insert(byte);
        set
    }

    pub fn insert(&mut self, byte: u8) {
        self.0[usize::from(byte >> 6)] |= 1 << (byte & 63);
    }

    pub fn remove(&mut self, byte: u8) {
        self.0[usize::from(byte >> 6)] &= !(1 << (byte & 63));
    }

    /// Insert every byte in `lo..=hi`. Does nothing when `lo > hi`.
    pub fn insert_range(&mut self, lo: u8, hi: u8) {
        for byte in lo..=hi {
            self.insert(byte);
        }
    }

    pub fn contains(&self, byte: u8) -> bool {
        self.0[usize::from(byte >> 6)] & (1 << (byte & 63)) != 0
    }

    pub fn union(&mut self, other: &ByteSet) {
        for (word, other) in self.0.iter_mut().zip(other.0) {
            *word |= other;
        }
    }

    pub fn negated(&self) -> Self {
        Self(self.0.map(|word| !word))
    }

    pub fn len(&self) -> usize {
        self.0.iter().map(|word| word.count_ones() as usize).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.0 == [0; 4]
    }

    /// Add the other-case counterpart of every ASCII letter in the set.
    pub fn case_folded(&self) -> Self {
        let mut folded = *self;
        for byte in self.iter().filter(u8::is_ascii_alphabetic) {
            folded.insert(byte.to_ascii_lowercase());
            folded.insert(byte.to_ascii_uppercase());
        }
        folded
    }

    pub fn iter(&self) -> impl Iterator<Item = u8> + '_ {
        (0..=u8::MAX).filter(move |&byte| self.contains(byte))
    }

    /// Collapse the set into inclusive ranges, in ascending order.
    pub fn ranges(&self) -> Vec<(u8, u8)> {
        let mut ranges: Vec<(u8, u8)> = Vec::new();
        for byte in self.iter() {
            match ranges.last_mut() {
                Some((_, hi)) if hi.checked_add(1) == Some(byte) => *hi = byte,
                _ => ranges.push((byte, byte)),
            }
        }
        ranges
    }
}

impl fmt::Debug for ByteSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (lo, hi) in self.ranges() {
            if lo == hi {
                write!(f, "{}", lo.escape_ascii())?;
            } else {
                write!(f, "{}-{}", lo.escape_ascii(), hi.escape_ascii())?;
            }
        }
        write!(f, "]")
    }
}

/// A POSIX named class usable inside bracket expressions, e.g. `[:alpha:]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NamedClass {
    Alnum,
    Alpha,
    Blank,
    Cntrl,
    Digit,
    Graph,
    Lower,
    Print,
    Punct,
    Space,
    Upper,
    Xdigit,
}

impl NamedClass {
    pub fn from_name(name: &[u8]) -> Option<Self> {
        let class = match name {
            b"alnum" => Self::Alnum,
            b"alpha" => Self::Alpha,
            b"blank" => Self::Blank,
            b"cntrl" => Self::Cntrl,
            b"digit" => Self::Digit,
            b"graph" => Self::Graph,
            b"lower" => Self::Lower,
            b"print" => Self::Print,
            b"punct" => Self::Punct,
            b"space" => Self::Space,
            b"upper" => Self::Upper,
            b"xdigit" => Self::Xdigit,
            _ => return None,
        };
        Some(class)
    }

    pub fn matches(&self, byte: u8) -> bool {
        match self {
            Self::Alnum => byte.is_ascii_alphanumeric(),
            Self::Alpha => byte.is_ascii_alphabetic(),
            Self::Blank => byte == b' ' || byte == b'\t',
            Self::Cntrl => byte.is_ascii_control(),
            Self::Digit => byte.is_ascii_digit(),
            Self::Graph => byte.is_ascii_graphic(),
            Self::Lower => byte.is_ascii_lowercase(),
            Self::Print => byte.is_ascii_graphic() || byte == b' ',
            Self::Punct => byte.is_ascii_punctuation(),
            // is_ascii_whitespace leaves out vertical tab.
            Self::Space => byte.is_ascii_whitespace() || byte == 0x0b,
            Self::Upper => byte.is_ascii_uppercase(),
            Self::Xdigit => byte.is_ascii_hexdigit(),
        }
    }

    pub fn to_set(&self) -> ByteSet {
        let mut set = ByteSet::empty();
        for byte in (0..=0x7f).filter(|&b| self.matches(b)) {
            set.insert(byte);
        }
        set
    }
}

/// Resolve the name inside a collating symbol such as `[.hyphen.]`.
///
/// Single bytes stand for themselves. Multi-byte names are looked up in the
/// portable character set names that POSIX requires.
pub fn collating_element(name: &[u8]) -> Option<u8> {
    if let [byte] = name {
        return Some(*byte);
    }
    let byte = match name {
        b"NUL" => 0x00,
        b"tab" => b'\t',
        b"newline" => b'\n',
        b"vertical-tab" => 0x0b,
        b"form-feed" => 0x0c,
        b"carriage-return" => b'\r',
        b"space" => b' ',
        b"exclamation-mark" => b'!',
        b"quotation-mark" => b'"',
        b"number-sign" => b'#',
        b"dollar-sign" => b'$',
        b"percent-sign" => b'%',
        b"ampersand" => b'&',
        b"apostrophe" => b'\'',
        b"left-parenthesis" => b'(',
        b"right-parenthesis" => b')',
        b"asterisk" => b'*',
        b"plus-sign" => b'+',
        b"comma" => b',',
        b"hyphen" | b"hyphen-minus" => b'-',
        b"period" | b"full-stop" => b'.',
        b"slash" | b"solidus" => b'/',
        b"colon" => b':',
        b"semicolon" => b';',
        b"less-than-sign" => b'<',
        b"equals-sign" => b'=',
        b"greater-than-sign" => b'>',
        b"question-mark" => b'?',
        b"commercial-at" => b'@',
        b"left-square-bracket" => b'[',
        b"backslash" | b"reverse-solidus" => b'\\',
        b"right-square-bracket" => b']',
        b"circumflex" | b"circumflex-accent" => b'^',
        b"underscore" | b"low-line" => b'_',
        b"grave-accent" => b'`',
        b"left-brace" | b"left-curly-bracket" => b'{',
        b"vertical-line" => b'|',
        b"right-brace" | b"right-curly-bracket" => b'}',
        b"tilde" => b'~',
        _ => return None,
    };
    Some(byte)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn insert_and_contains() {
        let mut set = ByteSet::empty();
        set.insert(b'a');
        set.insert(0xff);
        assert!(set.contains(b'a'));
        assert!(set.contains(0xff));
        assert!(!set.contains(b'b'));
        assert_eq!(set.len(), 2);
        set.remove(b'a');
        assert!(!set.contains(b'a'));
    }

    #[test]
    fn negation_flips_every_byte() {
        let set = ByteSet::single(b'\n').negated();
        assert!(!set.contains(b'\n'));
        assert_eq!(set.len(), 255);
        assert!(ByteSet::full().negated().is_empty());
    }

    #[test]
    fn case_folding_only_touches_letters() {
        let mut set = ByteSet::empty();
        set.insert_range(b'a', b'c');
        set.insert(b'1');
        let folded = set.case_folded();
        assert!(folded.contains(b'B'));
        assert!(folded.contains(b'1'));
        assert_eq!(folded.len(), 7);
    }

    #[test]
    fn ranges_collapse_runs() {
        let mut set = ByteSet::empty();
        set.insert_range(b'a', b'f');
        set.insert(b'x');
        set.insert(0xff);
        assert_eq!(set.ranges(), vec![(b'a', b'f'), (b'x', b'x'), (0xff, 0xff)]);
        assert_eq!(format!("{set:?}"), r"[a-fx\xff]");
    }

    #[test]
    fn named_classes() {
        assert!(NamedClass::Alpha.matches(b'Q'));
        assert!(!NamedClass::Alpha.matches(b'1'));
        assert!(NamedClass::Space.matches(0x0b));
        assert!(NamedClass::Blank.matches(b'\t'));
        assert!(!NamedClass::Blank.matches(b'\n'));
        assert!(NamedClass::Print.matches(b' '));
        assert!(!NamedClass::Graph.matches(b' '));
        assert!(NamedClass::Xdigit.matches(b'F'));
        assert!(!NamedClass::Punct.matches(0xa1));
        assert_eq!(NamedClass::Digit.to_set().len(), 10);
    }

    #[test]
    fn class_names() {
        let names = [
            "alnum", "alpha", "blank", "cntrl", "digit", "graph", "lower", "print", "punct",
            "space", "upper", "xdigit",
        ];
        let classes: HashSet<NamedClass> = names
            .iter()
            .map(|name| NamedClass::from_name(name.as_bytes()).unwrap())
            .collect();
        assert_eq!(classes.len(), names.len());
        assert_eq!(NamedClass::from_name(b"word"), None);
        assert_eq!(NamedClass::from_name(b"ALPHA"), None);
    }

    #[test]
    fn collating_names() {
        assert_eq!(collating_element(b"x"), Some(b'x'));
        assert_eq!(collating_element(b"hyphen"), Some(b'-'));
        assert_eq!(collating_element(b"ch"), None);
    }
}
