use std::ops::Range;
use std::thread;

use ere::{ExecFlags, Regex, RegexBuilder, RegexError};

fn groups(pattern: &str, haystack: &str) -> Option<Vec<Option<Range<usize>>>> {
    let re = Regex::new(pattern).unwrap();
    let caps = re.captures(haystack.as_bytes()).unwrap()?;
    Some(caps.iter().map(|m| m.map(|m| m.range())).collect())
}

fn spans(pattern: &str, haystack: &str) -> Vec<Range<usize>> {
    let re = Regex::new(pattern).unwrap();
    re.find_iter(haystack.as_bytes()).map(|m| m.unwrap().range()).collect()
}

#[test]
fn leftmost_longest() {
    assert_eq!(groups("a|ab|abc", "xabcd"), Some(vec![Some(1..4)]));
    assert_eq!(
        groups("(wee|week)(knights|night)", "weeknights"),
        Some(vec![Some(0..10), Some(0..3), Some(3..10)])
    );
    assert_eq!(groups("b+|a+b*", "aabbb"), Some(vec![Some(0..5)]));
}

#[test]
fn nested_groups() {
    assert_eq!(
        groups("(a)(b(c))", "abc"),
        Some(vec![Some(0..3), Some(0..1), Some(1..3), Some(2..3)])
    );
}

#[test]
fn unset_groups() {
    assert_eq!(groups("(a)|(b)", "b"), Some(vec![Some(0..1), None, Some(0..1)]));
    assert_eq!(groups("(a)*", "b"), Some(vec![Some(0..0), None]));
}

#[test]
fn earlier_alternative_wins_ties() {
    assert_eq!(groups("(a|(a))", "a"), Some(vec![Some(0..1), Some(0..1), None]));
    assert_eq!(groups("(a|(a))\\1", "aa"), Some(vec![Some(0..2), Some(0..1), None]));
}

#[test]
fn last_iteration_wins() {
    assert_eq!(groups("(a|b)*", "ab"), Some(vec![Some(0..2), Some(1..2)]));
    assert_eq!(groups("((a)|b)+", "ab"), Some(vec![Some(0..2), Some(1..2), None]));
}

#[test]
fn no_match() {
    assert_eq!(groups("xyz", "abc"), None);
    assert_eq!(groups("a{3}", "aa"), None);
}

#[test]
fn anchors() {
    assert_eq!(groups("^$", ""), Some(vec![Some(0..0)]));
    assert_eq!(groups("^$", "a"), None);
    assert_eq!(groups("a$", "aa"), Some(vec![Some(1..2)]));
    let re = Regex::new("^a").unwrap();
    let flags = ExecFlags {
        not_bol: true,
        ..ExecFlags::default()
    };
    assert!(re.exec(b"a", 0, flags).unwrap().is_none());
}

#[test]
fn zero_length_iteration() {
    assert_eq!(spans("x*", "aaa"), vec![0..0, 1..1, 2..2, 3..3]);
    assert_eq!(spans("a*", "baaac"), vec![0..0, 1..4, 4..4, 5..5]);
}

#[test]
fn compile_errors() {
    let cases = [
        ("(", RegexError::ParenthesesBalance),
        ("a)", RegexError::ParenthesesBalance),
        ("a**", RegexError::Repeat),
        ("*a", RegexError::Repeat),
        ("[z-a]", RegexError::Range),
        ("[abc", RegexError::BracketBalance),
        ("a{1", RegexError::BraceBalance),
        ("a{2,1}", RegexError::Repeat),
        ("[[:nope:]]", RegexError::CharacterClass),
        ("a\\", RegexError::Escape),
        ("(a)\\2", RegexError::SubExpression),
    ];
    for (pattern, expected) in cases {
        assert_eq!(Regex::new(pattern).unwrap_err(), expected, "pattern {pattern:?}");
    }
}

#[test]
fn error_codes() {
    let errors = [
        RegexError::BadPattern,
        RegexError::Repeat,
        RegexError::OutOfMemory,
        RegexError::ExpressionTooComplex,
    ];
    for err in errors {
        assert_eq!(RegexError::from_code(err.code()), err);
    }
}

#[test]
fn state_ceiling() {
    assert_eq!(Regex::new("((a{255}){255}){2}").unwrap_err(), RegexError::ExpressionTooComplex);
}

#[test]
fn deep_nesting_is_rejected() {
    let pattern = format!("{}a{}", "(".repeat(50_000), ")".repeat(50_000));
    assert_eq!(Regex::new(&pattern).unwrap_err(), RegexError::ExpressionTooComplex);
    let pattern = format!("{}a{}", "(".repeat(100), ")".repeat(100));
    assert!(Regex::new(&pattern).unwrap().is_match(b"xa").unwrap());
}

#[test]
fn backref_search_over_long_haystack() {
    let mut haystack = b"ab".repeat(300_000);
    haystack.extend_from_slice(b"zz");
    let re = Regex::new("(.)\\1").unwrap();
    let found = re.find(&haystack).unwrap().map(|m| m.range());
    assert_eq!(found, Some(600_000..600_002));
}

#[test]
fn deterministic_and_reproducible() {
    let haystack = b"xx aab abbb ab aaab";
    let first = Regex::new("(a+|b)(b*)").unwrap();
    let second = Regex::new("(a+|b)(b*)").unwrap();
    let expected: Vec<_> = first
        .captures_iter(haystack)
        .map(|caps| format!("{:?}", caps.unwrap()))
        .collect();
    for re in [&first, &second, &first] {
        let got: Vec<_> = re
            .captures_iter(haystack)
            .map(|caps| format!("{:?}", caps.unwrap()))
            .collect();
        assert_eq!(got, expected);
    }
}

#[test]
fn shared_across_threads() {
    let re = Regex::new("([a-z]+)@([a-z]+)").unwrap();
    let inputs = ["me@host", "x you@there y", "nobody", "a@b"];
    thread::scope(|scope| {
        let handles: Vec<_> = inputs
            .iter()
            .map(|input| {
                let re = &re;
                scope.spawn(move || {
                    let caps = re.captures(input.as_bytes()).unwrap()?;
                    Some(caps.get(2).unwrap().range())
                })
            })
            .collect();
        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(results, vec![Some(3..7), Some(6..11), None, Some(2..3)]);
    });
}

#[test]
fn builder_modes() {
    let re = RegexBuilder::new("a.c").newline(true).build().unwrap();
    assert!(!re.is_match(b"a\nc").unwrap());
    let re = Regex::new("a.c").unwrap();
    assert!(re.is_match(b"a\nc").unwrap());

    let re = RegexBuilder::new("x$").newline(true).build().unwrap();
    assert_eq!(re.find(b"ax\nb").unwrap().map(|m| m.range()), Some(1..2));

    let re = RegexBuilder::new("[[:upper:]]+").case_insensitive(true).build().unwrap();
    assert_eq!(re.find(b"12abC").unwrap().map(|m| m.range()), Some(2..5));
}

#[test]
fn bytes_beyond_ascii() {
    let re = Regex::from_bytes(b"\xff+").unwrap();
    assert_eq!(re.find(b"a\xff\xffb").unwrap().map(|m| m.range()), Some(1..3));
    assert!(Regex::new(".").unwrap().is_match(b"\x80").unwrap());
}

#[test]
fn convenience_function() {
    assert!(ere::is_match("b+", b"abbc").unwrap());
    assert_eq!(ere::is_match("(", b""), Err(RegexError::ParenthesesBalance));
}
