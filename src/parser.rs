use crate::ast::{Anchor, RegexNode};
use crate::class::{collating_element, ByteSet, NamedClass};
use crate::error::RegexError;

/// Largest count accepted in a bounded repeat, as POSIX `RE_DUP_MAX`.
pub const DUP_MAX: u32 = 255;

/// Deepest group nesting accepted. Every later pass over the tree recurses
/// once per level.
pub const NEST_LIMIT: usize = 250;

/// Bytes that a backslash turns back into literals.
const ESCAPABLE: &[u8] = b".[]()*+?{}|^$\\";

/// Parse a POSIX extended regular expression.
///
/// Parsing stops at the first error; no partial tree is returned.
pub fn parse(pattern: &[u8]) -> Result<RegexNode, RegexError> {
    Parser::new(pattern).parse()
}

/// Parser for regular expressions.
///
/// The `Parser` struct holds the pattern and the current position.
/// It also manages group IDs for capturing groups.
pub struct Parser<'a> {
    pattern: &'a [u8],
    pos: usize,
    depth: usize,
    next_group_id: usize,
    /// `closed[id]` is set once the `)` of group `id` has been parsed.
    closed: Vec<bool>,
}

/// One element of a bracket expression before it is folded into a set.
enum BracketItem {
    Byte(u8),
    Class(NamedClass),
}

impl<'a> Parser<'a> {
    /// Create a new parser for the given pattern.
    pub fn new(pattern: &'a [u8]) -> Self {
        Self {
            pattern,
            pos: 0,
            depth: 0,
            next_group_id: 1,
            closed: vec![false],
        }
    }

    /// Allocate a new group ID for capturing groups.
    fn alloc_group_id(&mut self) -> usize {
        let id = self.next_group_id;
        self.next_group_id += 1;
        self.closed.push(false);
        id
    }

    fn peek(&self) -> Option<u8> {
        self.pattern.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.pattern.get(self.pos + offset).copied()
    }

    fn advance(&mut self) -> Option<u8> {
        let byte = self.peek()?;
        self.pos += 1;
        Some(byte)
    }

    fn expect(&mut self, expected: u8) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    /// Entry point for parsing a regex pattern.
    ///
    /// Example:
    /// - Pattern: `a|b` → Alternation([Literal('a'), Literal('b')])
    pub fn parse(&mut self) -> Result<RegexNode, RegexError> {
        let node = self.parse_alt()?;
        if self.pos < self.pattern.len() {
            // parse_seq only stops early at a `)` with nothing open.
            return Err(RegexError::ParenthesesBalance);
        }
        Ok(node)
    }

    /// Parse alternation (`|`), the lowest precedence operator.
    ///
    /// Example:
    /// - Pattern: `a|b|c` → Alternation([Literal('a'), Literal('b'), Literal('c')])
    /// - Pattern: `a|`    → Alternation([Literal('a'), Empty])
    fn parse_alt(&mut self) -> Result<RegexNode, RegexError> {
        let mut branches = vec![self.parse_seq()?];
        while self.expect(b'|') {
            branches.push(self.parse_seq()?);
        }
        if branches.len() == 1 {
            Ok(branches.remove(0))
        } else {
            Ok(RegexNode::Alternation(branches))
        }
    }

    /// Parse a sequence of atoms (concatenation).
    ///
    /// Example:
    /// - Pattern: `abc`     → Concat([Literal('a'), Literal('b'), Literal('c')])
    /// - Pattern: `a(b|c)d` → Concat([Literal('a'), Group, Literal('d')])
    fn parse_seq(&mut self) -> Result<RegexNode, RegexError> {
        let mut nodes = Vec::new();
        while let Some(byte) = self.peek() {
            match byte {
                b'|' => break,
                b')' if self.depth > 0 => break,
                b')' => return Err(RegexError::ParenthesesBalance),
                _ => nodes.push(self.parse_repeat()?),
            }
        }
        Ok(match nodes.len() {
            0 => RegexNode::Empty,
            1 => nodes.remove(0),
            _ => RegexNode::Concat(nodes),
        })
    }

    /// Parse an atom followed by at most one repetition operator.
    ///
    /// Example:
    /// - Pattern: `a?`     → Repeat { Literal('a'), min: 0, max: Some(1) }
    /// - Pattern: `b{2,}`  → Repeat { Literal('b'), min: 2, max: None }
    /// - Pattern: `a**`    → Err(Repeat)
    fn parse_repeat(&mut self) -> Result<RegexNode, RegexError> {
        let atom = self.parse_atom()?;
        let Some((min, max)) = self.parse_quantifier()? else {
            return Ok(atom);
        };
        if matches!(self.peek(), Some(b'*' | b'+' | b'?' | b'{')) {
            return Err(RegexError::Repeat);
        }
        Ok(RegexNode::Repeat {
            node: Box::new(atom),
            min,
            max,
        })
    }

    fn parse_quantifier(&mut self) -> Result<Option<(u32, Option<u32>)>, RegexError> {
        let bounds = match self.peek() {
            Some(b'*') => (0, None),
            Some(b'+') => (1, None),
            Some(b'?') => (0, Some(1)),
            Some(b'{') => {
                self.advance();
                return self.parse_bounds().map(Some);
            }
            _ => return Ok(None),
        };
        self.advance();
        Ok(Some(bounds))
    }

    /// Parse the inside of `{m}`, `{m,}`, `{m,n}` or `{,n}`; the `{` is
    /// already consumed.
    fn parse_bounds(&mut self) -> Result<(u32, Option<u32>), RegexError> {
        if !self.pattern[self.pos..].contains(&b'}') {
            return Err(RegexError::BraceBalance);
        }
        let min = self.parse_count()?;
        let max = if self.expect(b',') {
            self.parse_count()?
        } else {
            Some(min.ok_or(RegexError::Repeat)?)
        };
        if !self.expect(b'}') {
            return Err(RegexError::Repeat);
        }
        let min = min.unwrap_or(0);
        if max.is_some_and(|max| max < min) {
            return Err(RegexError::Repeat);
        }
        Ok((min, max))
    }

    /// Parse an optional decimal count no larger than [`DUP_MAX`].
    fn parse_count(&mut self) -> Result<Option<u32>, RegexError> {
        let mut value: Option<u32> = None;
        while let Some(digit @ b'0'..=b'9') = self.peek() {
            self.advance();
            let next = value.unwrap_or(0) * 10 + u32::from(digit - b'0');
            if next > DUP_MAX {
                return Err(RegexError::Repeat);
            }
            value = Some(next);
        }
        Ok(value)
    }

    /// Parse a single atom: group, bracket expression, escape, `.`, anchor,
    /// or literal byte.
    ///
    /// Examples:
    /// - Pattern: `(abc)` → Group { index, node: Concat(...) }
    /// - Pattern: `[abc]` → Set { set: {a,b,c}, negated: false }
    /// - Pattern: `\1`    → BackRef(1)
    /// - Pattern: `\.`    → Literal('.')
    /// - Pattern: `^`     → Anchor(Start)
    fn parse_atom(&mut self) -> Result<RegexNode, RegexError> {
        let Some(byte) = self.advance() else {
            return Ok(RegexNode::Empty);
        };
        let node = match byte {
            b'(' => {
                if self.depth >= NEST_LIMIT {
                    return Err(RegexError::ExpressionTooComplex);
                }
                let index = self.alloc_group_id();
                self.depth += 1;
                let node = self.parse_alt()?;
                if !self.expect(b')') {
                    return Err(RegexError::ParenthesesBalance);
                }
                self.depth -= 1;
                self.closed[index] = true;
                RegexNode::Group {
                    index,
                    node: Box::new(node),
                }
            }
            b'*' | b'+' | b'?' | b'{' => return Err(RegexError::Repeat),
            b'[' => self.parse_char_class()?,
            b'\\' => self.parse_escape()?,
            b'.' => RegexNode::Any,
            b'^' => RegexNode::Anchor(Anchor::Start),
            b'$' => RegexNode::Anchor(Anchor::End),
            other => RegexNode::Literal(other),
        };
        Ok(node)
    }

    /// Parse the byte after a backslash.
    fn parse_escape(&mut self) -> Result<RegexNode, RegexError> {
        match self.advance() {
            Some(digit @ b'1'..=b'9') => {
                let index = usize::from(digit - b'0');
                if self.closed.get(index) == Some(&true) {
                    Ok(RegexNode::BackRef(index))
                } else {
                    Err(RegexError::SubExpression)
                }
            }
            Some(byte) if ESCAPABLE.contains(&byte) => Ok(RegexNode::Literal(byte)),
            _ => Err(RegexError::Escape),
        }
    }

    /// Parse a bracket expression; the `[` is already consumed.
    ///
    /// Examples:
    /// - Pattern: `[abc]`         → Set { {a,b,c}, negated: false }
    /// - Pattern: `[^a-z]`        → Set { {a..z}, negated: true }
    /// - Pattern: `[[:digit:]]`   → Class { Digit, negated: false }
    /// - Pattern: `[]a]`          → Set { {],a}, negated: false }
    fn parse_char_class(&mut self) -> Result<RegexNode, RegexError> {
        let negated = self.expect(b'^');
        let mut set = ByteSet::empty();
        let mut classes = Vec::new();
        let mut bytes = 0usize;
        let mut first = true;
        loop {
            let Some(byte) = self.advance() else {
                return Err(RegexError::BracketBalance);
            };
            if byte == b']' && !first {
                break;
            }
            first = false;
            let item = self.parse_bracket_item(byte)?;
            let is_range =
                self.peek() == Some(b'-') && !matches!(self.peek_at(1), Some(b']') | None);
            if is_range {
                self.advance();
                let Some(next) = self.advance() else {
                    return Err(RegexError::BracketBalance);
                };
                let hi = self.parse_bracket_item(next)?;
                let (BracketItem::Byte(lo), BracketItem::Byte(hi)) = (item, hi) else {
                    return Err(RegexError::Range);
                };
                if lo > hi {
                    return Err(RegexError::Range);
                }
                set.insert_range(lo, hi);
                bytes += 1;
                continue;
            }
            match item {
                BracketItem::Byte(byte) => {
                    set.insert(byte);
                    bytes += 1;
                }
                BracketItem::Class(class) => {
                    set.union(&class.to_set());
                    classes.push(class);
                }
            }
        }
        if let ([class], 0) = (classes.as_slice(), bytes) {
            return Ok(RegexNode::Class {
                class: *class,
                negated,
            });
        }
        Ok(RegexNode::Set { set, negated })
    }

    /// Parse one bracket element starting with the already consumed `byte`.
    ///
    /// Handles `[:name:]`, `[.name.]` and `[=x=]`; anything else is the byte
    /// itself. Backslash has no special meaning inside brackets.
    fn parse_bracket_item(&mut self, byte: u8) -> Result<BracketItem, RegexError> {
        let delimiter = match (byte, self.peek()) {
            (b'[', Some(d @ (b':' | b'.' | b'='))) => d,
            _ => return Ok(BracketItem::Byte(byte)),
        };
        self.advance();
        let rest = &self.pattern[self.pos..];
        let Some(len) = rest.windows(2).position(|w| w == [delimiter, b']']) else {
            return Err(RegexError::BracketBalance);
        };
        let name = &rest[..len];
        self.pos += len + 2;
        match delimiter {
            b':' => NamedClass::from_name(name)
                .map(BracketItem::Class)
                .ok_or(RegexError::CharacterClass),
            b'.' => collating_element(name)
                .map(BracketItem::Byte)
                .ok_or(RegexError::Collation),
            _ => match name {
                [byte] => Ok(BracketItem::Byte(*byte)),
                _ => Err(RegexError::Collation),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lit(byte: u8) -> RegexNode {
        RegexNode::Literal(byte)
    }

    fn set_of(bytes: &[u8]) -> ByteSet {
        let mut set = ByteSet::empty();
        for &byte in bytes {
            set.insert(byte);
        }
        set
    }

    #[test]
    fn concatenation_and_alternation() {
        assert_eq!(
            parse(b"ab|c").unwrap(),
            RegexNode::Alternation(vec![RegexNode::Concat(vec![lit(b'a'), lit(b'b')]), lit(b'c')])
        );
    }

    #[test]
    fn empty_alternatives_are_legal() {
        assert_eq!(
            parse(b"a|").unwrap(),
            RegexNode::Alternation(vec![lit(b'a'), RegexNode::Empty])
        );
        assert_eq!(parse(b"").unwrap(), RegexNode::Empty);
        assert!(parse(b"(|a)").is_ok());
        assert!(parse(b"()").is_ok());
    }

    #[test]
    fn groups_are_numbered_by_opening_paren() {
        let ast = parse(b"(a)(b(c))").unwrap();
        let RegexNode::Concat(nodes) = ast else {
            panic!("expected concat");
        };
        assert!(matches!(nodes[0], RegexNode::Group { index: 1, .. }));
        let RegexNode::Group { index: 2, node } = &nodes[1] else {
            panic!("expected group 2");
        };
        let RegexNode::Concat(inner) = node.as_ref() else {
            panic!("expected concat");
        };
        assert!(matches!(inner[1], RegexNode::Group { index: 3, .. }));
    }

    #[test]
    fn quantifiers() {
        let repeat = |min, max| RegexNode::Repeat {
            node: Box::new(lit(b'a')),
            min,
            max,
        };
        assert_eq!(parse(b"a*").unwrap(), repeat(0, None));
        assert_eq!(parse(b"a+").unwrap(), repeat(1, None));
        assert_eq!(parse(b"a?").unwrap(), repeat(0, Some(1)));
        assert_eq!(parse(b"a{3}").unwrap(), repeat(3, Some(3)));
        assert_eq!(parse(b"a{2,}").unwrap(), repeat(2, None));
        assert_eq!(parse(b"a{2,5}").unwrap(), repeat(2, Some(5)));
        assert_eq!(parse(b"a{,5}").unwrap(), repeat(0, Some(5)));
    }

    #[test]
    fn repeat_errors() {
        let patterns = [
            "*a", "a**", "a+*", "a*{2}", "(*a)", "a|*b", "a{3,2}", "a{x}", "a{}", "a{256}", "{1}",
        ];
        for pattern in patterns {
            assert_eq!(parse(pattern.as_bytes()), Err(RegexError::Repeat), "{pattern}");
        }
    }

    #[test]
    fn balance_errors() {
        assert_eq!(parse(b"("), Err(RegexError::ParenthesesBalance));
        assert_eq!(parse(b"(a(b)"), Err(RegexError::ParenthesesBalance));
        assert_eq!(parse(b"a)"), Err(RegexError::ParenthesesBalance));
        assert_eq!(parse(b"[abc"), Err(RegexError::BracketBalance));
        assert_eq!(parse(b"[a-"), Err(RegexError::BracketBalance));
        assert_eq!(parse(b"[[:alpha:"), Err(RegexError::BracketBalance));
        assert_eq!(parse(b"a{2"), Err(RegexError::BraceBalance));
        assert_eq!(parse(b"a{2,"), Err(RegexError::BraceBalance));
    }

    #[test]
    fn nesting_limit() {
        let nested = |depth: usize| format!("{}a{}", "(".repeat(depth), ")".repeat(depth));
        let ast = parse(nested(NEST_LIMIT).as_bytes()).unwrap();
        assert_eq!(ast.capture_count(), NEST_LIMIT);
        assert_eq!(
            parse(nested(NEST_LIMIT + 1).as_bytes()),
            Err(RegexError::ExpressionTooComplex)
        );
        assert_eq!(parse(nested(50_000).as_bytes()), Err(RegexError::ExpressionTooComplex));
        assert_eq!(parse("(".repeat(50_000).as_bytes()), Err(RegexError::ExpressionTooComplex));
    }

    #[test]
    fn escapes() {
        assert_eq!(parse(b"\\.").unwrap(), lit(b'.'));
        assert_eq!(parse(b"\\\\").unwrap(), lit(b'\\'));
        assert_eq!(parse(b"\\{").unwrap(), lit(b'{'));
        assert_eq!(parse(b"\\d"), Err(RegexError::Escape));
        assert_eq!(parse(b"a\\"), Err(RegexError::Escape));
        assert_eq!(parse(b"\\0"), Err(RegexError::Escape));
    }

    #[test]
    fn backrefs_need_a_closed_group() {
        assert_eq!(
            parse(b"(a)\\1").unwrap(),
            RegexNode::Concat(vec![
                RegexNode::Group {
                    index: 1,
                    node: Box::new(lit(b'a')),
                },
                RegexNode::BackRef(1),
            ])
        );
        assert_eq!(parse(b"\\1"), Err(RegexError::SubExpression));
        assert_eq!(parse(b"(a\\1)"), Err(RegexError::SubExpression));
        assert_eq!(parse(b"(a)\\2"), Err(RegexError::SubExpression));
    }

    #[test]
    fn bracket_expressions() {
        assert_eq!(
            parse(b"[]a]").unwrap(),
            RegexNode::Set {
                set: set_of(b"]a"),
                negated: false,
            }
        );
        assert_eq!(
            parse(b"[^]a-]").unwrap(),
            RegexNode::Set {
                set: set_of(b"]a-"),
                negated: true,
            }
        );
        assert_eq!(
            parse(b"[\\n]").unwrap(),
            RegexNode::Set {
                set: set_of(b"\\n"),
                negated: false,
            }
        );
        let RegexNode::Set { set, .. } = parse(b"[a-c[:digit:]]").unwrap() else {
            panic!("expected set");
        };
        assert_eq!(set.len(), 13);
    }

    #[test]
    fn single_named_class() {
        assert_eq!(
            parse(b"[^[:space:]]").unwrap(),
            RegexNode::Class {
                class: NamedClass::Space,
                negated: true,
            }
        );
    }

    #[test]
    fn bracket_errors() {
        assert_eq!(parse(b"[z-a]"), Err(RegexError::Range));
        assert_eq!(parse(b"[[:alpha:]-z]"), Err(RegexError::Range));
        assert_eq!(parse(b"[[:word:]]"), Err(RegexError::CharacterClass));
        assert_eq!(parse(b"[[.ch.]]"), Err(RegexError::Collation));
        assert_eq!(parse(b"[[=ab=]]"), Err(RegexError::Collation));
    }

    #[test]
    fn collating_symbols_and_equivalence_classes() {
        assert_eq!(
            parse(b"[[.hyphen.][=x=]]").unwrap(),
            RegexNode::Set {
                set: set_of(b"-x"),
                negated: false,
            }
        );
        assert_eq!(
            parse(b"[[.a.]-c]").unwrap(),
            RegexNode::Set {
                set: set_of(b"abc"),
                negated: false,
            }
        );
    }

    #[test]
    fn anchors_and_dot() {
        assert_eq!(
            parse(b"^.$").unwrap(),
            RegexNode::Concat(vec![
                RegexNode::Anchor(Anchor::Start),
                RegexNode::Any,
                RegexNode::Anchor(Anchor::End),
            ])
        );
    }
}
