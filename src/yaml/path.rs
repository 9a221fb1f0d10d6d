//! Key path grammar.
//!
//! A key path is a dot separated list of segments. Each segment is an
//! identifier, optionally followed by a single sequence index:
//!
//! ```text
//! spec.template.containers[0].image
//! ```
//!
//! Identifiers may not carry YAML indicator characters (see [`FORBIDDEN`]).
//! Bad segments do not abort parsing: they are collected as diagnostics on
//! the returned [`KeyPath`] and the segment itself never matches a key.

use super::error::Error;
use regex::Regex;
use std::fmt;
use std::sync::OnceLock;

/// Characters an identifier may not contain.
pub const FORBIDDEN: &str = "_?:,[]{}#&*!|>`\"%";

fn index_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r##"^([^_?:,\[\]{}#&*!|>`"%]*)\[([0-9]+)\]$"##)
            .expect("index pattern is a valid regex")
    })
}

/// One step of a key path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub name: String,
    pub index: Option<usize>,
    valid: bool,
}

impl Segment {
    pub fn new(name: &str, index: Option<usize>) -> Self {
        Segment {
            name: name.to_string(),
            index,
            valid: true,
        }
    }

    fn invalid(token: &str) -> Self {
        Segment {
            name: token.to_string(),
            index: None,
            valid: false,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Whether this segment names the given mapping key.
    pub fn matches(&self, key: &str) -> bool {
        self.is_valid() && self.name == key
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.index {
            Some(idx) => write!(f, "{}[{}]", self.name, idx),
            None => write!(f, "{}", self.name),
        }
    }
}

/// A parsed key path together with the problems found while parsing it.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyPath {
    segments: Vec<Segment>,
    diagnostics: Vec<Error>,
}

impl KeyPath {
    /// Parse a dotted key path, collecting segment errors instead of failing.
    pub fn parse(path: &str) -> KeyPath {
        let mut segments = Vec::new();
        let mut diagnostics = Vec::new();

        for token in path.split('.') {
            let (segment, problem) = parse_segment(token);
            diagnostics.extend(problem);
            segments.push(segment);
        }

        KeyPath {
            segments,
            diagnostics,
        }
    }

    /// Parse a dotted key path, failing on the first bad segment.
    pub fn parse_strict(path: &str) -> Result<KeyPath, Error> {
        let parsed = KeyPath::parse(path);
        if parsed.is_clean() {
            return Ok(parsed);
        }
        Err(parsed.diagnostics[0].clone())
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn diagnostics(&self) -> &[Error] {
        &self.diagnostics
    }

    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }
}

impl fmt::Display for KeyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                write!(f, ".")?;
            }
            write!(f, "{}", segment)?;
        }
        Ok(())
    }
}

fn parse_segment(token: &str) -> (Segment, Option<Error>) {
    if let Some(caps) = index_pattern().captures(token) {
        let name = &caps[1];
        return match caps[2].parse::<usize>() {
            Ok(idx) => (Segment::new(name, Some(idx)), None),
            // Fall back to the bare name so the rest of the path still resolves
            Err(e) => (
                Segment::new(name, None),
                Some(Error::InvalidSegment(format!(
                    "key '{}' has an unusable index '{}': {}",
                    token, &caps[2], e
                ))),
            ),
        };
    }

    if token.contains(|c: char| FORBIDDEN.contains(c)) {
        return (
            Segment::invalid(token),
            Some(Error::InvalidSegment(format!(
                "key '{}' cannot contain yaml special characters",
                token
            ))),
        );
    }

    (Segment::new(token, None), None)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn names(path: &KeyPath) -> Vec<String> {
        path.segments().iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_simple() {
        let path = KeyPath::parse("a.b.c");
        assert_eq!(names(&path), vec!["a", "b", "c"]);
        assert!(path.is_clean());
        assert!(path.segments().iter().all(|s| s.index.is_none()));
    }

    #[test]
    fn test_parse_single_segment() {
        let path = KeyPath::parse("version");
        assert_eq!(path.segments(), &[Segment::new("version", None)]);
    }

    #[test]
    fn test_parse_indexed_segment() {
        let path = KeyPath::parse("list[1].version");
        assert_eq!(path.segments()[0], Segment::new("list", Some(1)));
        assert_eq!(path.segments()[1], Segment::new("version", None));
        assert!(path.is_clean());
    }

    #[test]
    fn test_parse_root_index_without_name() {
        // Addresses an element of a document whose root is a sequence
        let path = KeyPath::parse("[2].name");
        assert_eq!(path.segments()[0], Segment::new("", Some(2)));
    }

    #[test]
    fn test_parse_hyphenated_identifiers() {
        let path = KeyPath::parse("image-tag.sub-chart[0]");
        assert!(path.is_clean());
        assert_eq!(path.segments()[1], Segment::new("sub-chart", Some(0)));
    }

    #[test]
    fn test_pipe_is_invalid_segment() {
        let path = KeyPath::parse("a|b");
        assert_eq!(path.diagnostics().len(), 1);
        match &path.diagnostics()[0] {
            Error::InvalidSegment(msg) => assert!(msg.contains("a|b")),
            other => panic!("Expected Error::InvalidSegment, got {:?}", other),
        }
        assert!(!path.segments()[0].is_valid());
        assert!(!path.segments()[0].matches("a|b"));
    }

    #[test]
    fn test_invalid_segment_does_not_stop_parsing() {
        let path = KeyPath::parse("first.bad#key.last[3]");
        assert_eq!(path.segments().len(), 3);
        assert_eq!(path.diagnostics().len(), 1);
        assert!(path.segments()[0].is_valid());
        assert!(!path.segments()[1].is_valid());
        assert_eq!(path.segments()[2], Segment::new("last", Some(3)));
    }

    #[test]
    fn test_every_forbidden_character_is_rejected() {
        for c in FORBIDDEN.chars() {
            let token = format!("ab{}cd", c);
            let path = KeyPath::parse(&token);
            assert_eq!(
                path.diagnostics().len(),
                1,
                "'{}' should be rejected",
                token
            );
        }
    }

    #[test]
    fn test_underscore_is_forbidden() {
        assert!(!KeyPath::parse("my_key").is_clean());
    }

    #[test]
    fn test_malformed_brackets_are_invalid() {
        for token in ["list[]", "list[a]", "list[0][1]", "list[-1]", "li[0]st"] {
            let path = KeyPath::parse(token);
            assert!(!path.is_clean(), "'{}' should be rejected", token);
        }
    }

    #[test]
    fn test_index_overflow_keeps_name() {
        let path = KeyPath::parse("list[99999999999999999999999999].name");
        assert_eq!(path.diagnostics().len(), 1);
        assert_eq!(path.segments()[0], Segment::new("list", None));
        assert!(path.segments()[0].matches("list"));
    }

    #[test]
    fn test_parse_strict() {
        assert!(KeyPath::parse_strict("a.b[0].c").is_ok());
        let err = KeyPath::parse_strict("a.b>c").unwrap_err();
        assert!(matches!(err, Error::InvalidSegment(_)));
    }

    #[test]
    fn test_empty_tokens_are_kept() {
        let path = KeyPath::parse("a..b");
        assert_eq!(names(&path), vec!["a", "", "b"]);
        assert!(path.is_clean());
    }

    #[test]
    fn test_display_round_trip() {
        let path = KeyPath::parse("spec.containers[0].image");
        assert_eq!(path.to_string(), "spec.containers[0].image");
    }
}
