use crate::class::{ByteSet, NamedClass};

/// A parsed POSIX extended regular expression.
///
/// Capturing groups are numbered 1..=N in the order their opening
/// parenthesis appears in the pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegexNode {
    /// Matches the empty string, e.g. `()` or an empty alternative in `a|`.
    Empty,
    Literal(u8),
    /// `.`
    Any,
    /// A bracket expression. Negation is kept apart from the set so that
    /// case folding and newline handling can be applied before it.
    Set {
        set: ByteSet,
        negated: bool,
    },
    /// A bracket expression holding a single named class, e.g. `[[:digit:]]`.
    Class {
        class: NamedClass,
        negated: bool,
    },
    Concat(Vec<RegexNode>),
    Alternation(Vec<RegexNode>),
    /// `max` is `None` for an unbounded repeat.
    Repeat {
        node: Box<RegexNode>,
        min: u32,
        max: Option<u32>,
    },
    Group {
        index: usize,
        node: Box<RegexNode>,
    },
    Anchor(Anchor),
    BackRef(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Anchor {
    /// `^`
    Start,
    /// `$`
    End,
}

impl RegexNode {
    /// Number of capturing groups in this subtree.
    pub fn capture_count(&self) -> usize {
        match self {
            RegexNode::Group { node, .. } => 1 + node.capture_count(),
            RegexNode::Concat(nodes) | RegexNode::Alternation(nodes) => {
                nodes.iter().map(RegexNode::capture_count).sum()
            }
            RegexNode::Repeat { node, .. } => node.capture_count(),
            _ => 0,
        }
    }

    pub fn has_backref(&self) -> bool {
        match self {
            RegexNode::BackRef(_) => true,
            RegexNode::Group { node, .. } | RegexNode::Repeat { node, .. } => node.has_backref(),
            RegexNode::Concat(nodes) | RegexNode::Alternation(nodes) => {
                nodes.iter().any(RegexNode::has_backref)
            }
            _ => false,
        }
    }

    /// True for nodes that consume exactly one byte.
    pub fn is_leaf(&self) -> bool {
        matches!(
            self,
            RegexNode::Literal(_) | RegexNode::Any | RegexNode::Set { .. } | RegexNode::Class { .. }
        )
    }
}
