//! Arena backed document tree.
//!
//! The tree is built from the `saphyr-parser` event stream of the first
//! document in the source. Every node remembers where it came from (line,
//! column, byte span) so that a value can later be rewritten in place
//! without disturbing the rest of the text.

use super::error::Error;
use saphyr_parser::{Event, Parser, ScalarStyle, Span};

/// Stable handle to a node inside a [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

const ROOT: NodeId = NodeId(0);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Document,
    Mapping,
    Sequence,
    Scalar,
    Alias,
}

/// Presentation style of a scalar in the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Style {
    Plain,
    SingleQuoted,
    DoubleQuoted,
    Literal,
    Folded,
}

impl From<ScalarStyle> for Style {
    fn from(style: ScalarStyle) -> Self {
        match style {
            ScalarStyle::SingleQuoted => Style::SingleQuoted,
            ScalarStyle::DoubleQuoted => Style::DoubleQuoted,
            ScalarStyle::Literal => Style::Literal,
            ScalarStyle::Folded => Style::Folded,
            _ => Style::Plain,
        }
    }
}

/// Half-open byte range into the document source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteSpan {
    pub start: usize,
    pub end: usize,
}

#[derive(Debug, Clone)]
pub struct Node {
    pub kind: NodeKind,
    /// Scalar text, or the alias name for aliases. Empty for collections.
    pub value: String,
    /// Mapping children alternate key, value.
    pub children: Vec<NodeId>,
    /// 1-based source line.
    pub line: usize,
    /// 1-based source column.
    pub column: usize,
    /// Nesting depth: a collection shares the depth of its own entries.
    pub depth: usize,
    /// Column of the key or sequence entry this node hangs off.
    pub owner_column: usize,
    pub style: Style,
    /// Extent of the scalar token, when it can be rewritten.
    pub span: Option<ByteSpan>,
    /// Inside a flow (`{}` / `[]`) collection.
    pub flow: bool,
    pub(crate) dirty: bool,
}

impl Node {
    fn new(kind: NodeKind, line: usize, column: usize, depth: usize) -> Self {
        Node {
            kind,
            value: String::new(),
            children: Vec::new(),
            line,
            column,
            depth,
            owner_column: 1,
            style: Style::Plain,
            span: None,
            flow: false,
            dirty: false,
        }
    }

    pub fn is_scalar(&self) -> bool {
        self.kind == NodeKind::Scalar
    }

    pub fn is_mapping(&self) -> bool {
        self.kind == NodeKind::Mapping
    }

    pub fn is_sequence(&self) -> bool {
        self.kind == NodeKind::Sequence
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }
}

/// A parsed document: its source text plus the node arena.
#[derive(Debug, Clone)]
pub struct Document {
    source: String,
    nodes: Vec<Node>,
}

impl Document {
    /// Parse the first document found in `source`.
    pub fn parse(source: &str) -> Result<Document, Error> {
        let mut builder = Builder::new(source);
        for result in Parser::new_from_str(source) {
            let (event, span) = result?;
            if !builder.feed(event, span) {
                break;
            }
        }
        log::trace!("parsed {} nodes", builder.nodes.len());
        Ok(Document {
            source: source.to_string(),
            nodes: builder.nodes,
        })
    }

    pub fn root(&self) -> NodeId {
        ROOT
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    /// The top level node of the document, if it has content.
    pub fn content(&self) -> Option<NodeId> {
        self.children(ROOT).first().copied()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.content().is_none()
    }

    pub fn is_dirty(&self) -> bool {
        self.nodes.iter().any(Node::is_dirty)
    }

    /// Scalar nodes changed since parsing, in source order.
    pub(crate) fn dirty_nodes(&self) -> Vec<NodeId> {
        let mut ids: Vec<NodeId> = (0..self.len())
            .map(NodeId)
            .filter(|id| self.node(*id).is_dirty())
            .collect();
        ids.sort_by_key(|id| self.node(*id).span.map(|s| s.start));
        ids
    }
}

// =============================================================================
// Builder
// =============================================================================

struct Builder<'a> {
    source: &'a str,
    /// Char index (as reported by parser markers) to byte offset.
    char_to_byte: Vec<usize>,
    nodes: Vec<Node>,
    stack: Vec<NodeId>,
}

impl<'a> Builder<'a> {
    fn new(source: &'a str) -> Self {
        let mut char_to_byte: Vec<usize> = source.char_indices().map(|(b, _)| b).collect();
        char_to_byte.push(source.len());
        Builder {
            source,
            char_to_byte,
            nodes: vec![Node::new(NodeKind::Document, 1, 1, 0)],
            stack: Vec::new(),
        }
    }

    fn to_byte(&self, char_idx: usize) -> usize {
        self.char_to_byte
            .get(char_idx)
            .copied()
            .unwrap_or(self.source.len())
    }

    /// Returns false once the first document is complete.
    fn feed(&mut self, event: Event<'_>, span: Span) -> bool {
        match event {
            Event::DocumentEnd | Event::StreamEnd => return false,
            Event::Scalar(value, style, _, _) => self.add_scalar(&value, style.into(), span),
            Event::Alias(_) => self.add_alias(span),
            Event::SequenceStart(_, _) => {
                let id = self.add_collection(NodeKind::Sequence, span);
                self.stack.push(id);
            }
            Event::MappingStart(_, _) => {
                let id = self.add_collection(NodeKind::Mapping, span);
                self.stack.push(id);
            }
            Event::SequenceEnd | Event::MappingEnd => {
                self.stack.pop();
            }
            _ => {}
        }
        true
    }

    fn parent(&self) -> NodeId {
        self.stack.last().copied().unwrap_or(ROOT)
    }

    /// Create a node positioned at `span.start` and attach it to the open
    /// collection.
    fn attach(&mut self, kind: NodeKind, span: &Span) -> NodeId {
        let parent_id = self.parent();
        let parent = &self.nodes[parent_id.0];
        let position = parent.children.len();

        let depth = match (parent.kind, kind) {
            (NodeKind::Document, _) => 1,
            (_, NodeKind::Mapping | NodeKind::Sequence) => parent.depth + 1,
            _ => parent.depth,
        };
        let owner_column = match parent.kind {
            NodeKind::Mapping if position % 2 == 1 => self.nodes[parent.children[position - 1].0].column,
            NodeKind::Document => 1,
            _ => parent.column,
        };
        let flow = parent.flow;

        let mut node = Node::new(kind, span.start.line(), span.start.col() + 1, depth);
        node.owner_column = owner_column;
        node.flow = flow;

        let id = NodeId(self.nodes.len());
        self.nodes.push(node);
        self.nodes[parent_id.0].children.push(id);
        id
    }

    fn add_collection(&mut self, kind: NodeKind, span: Span) -> NodeId {
        let id = self.attach(kind, &span);
        let start = self.to_byte(span.start.index());
        if matches!(self.source.as_bytes().get(start), Some(b'{') | Some(b'[')) {
            self.nodes[id.0].flow = true;
        }
        id
    }

    fn add_alias(&mut self, span: Span) {
        let id = self.attach(NodeKind::Alias, &span);
        let start = self.to_byte(span.start.index());
        let name: String = self.source[start..]
            .trim_start_matches('*')
            .chars()
            .take_while(|c| !c.is_whitespace() && !",[]{}".contains(*c))
            .collect();
        self.nodes[id.0].value = name;
    }

    fn add_scalar(&mut self, value: &str, style: Style, span: Span) {
        let parent_id = self.parent();
        let position = self.nodes[parent_id.0].children.len();
        let id = self.attach(NodeKind::Scalar, &span);
        let mut start = self.to_byte(span.start.index());

        // Block scalars are reported from their first body line
        if matches!(style, Style::Literal | Style::Folded) {
            if let Some(indicator) = self.block_indicator(start) {
                start = indicator;
                let (line, column) = self.position(start);
                let node = &mut self.nodes[id.0];
                node.line = line;
                node.column = column;
            }
        }

        // The parser reports an empty value as a plain `~` positioned on
        // whatever token follows
        let implicit_null = style == Style::Plain
            && (value == "~" || value.is_empty())
            && !self.source[start..].starts_with('~');

        let (text, extent) = if implicit_null {
            (String::new(), self.implicit_value_slot(parent_id, position))
        } else {
            let node = &self.nodes[id.0];
            let end = self.scalar_end(start, style, node.flow, node.owner_column, &span);
            (value.to_string(), end.map(|end| ByteSpan { start, end }))
        };

        let node = &mut self.nodes[id.0];
        node.value = text;
        node.style = style;
        node.span = extent;
    }

    /// 1-based line and column of a byte offset.
    fn position(&self, offset: usize) -> (usize, usize) {
        let before = &self.source[..offset];
        let line_start = before.rfind('\n').map_or(0, |i| i + 1);
        (
            before.matches('\n').count() + 1,
            before[line_start..].chars().count() + 1,
        )
    }

    /// Offset of the `|` or `>` heading the block scalar whose body the
    /// parser placed at `start`.
    fn block_indicator(&self, start: usize) -> Option<usize> {
        let src = self.source;
        if matches!(src.as_bytes().get(start), Some(b'|') | Some(b'>')) {
            return Some(start);
        }

        let mut end = start;
        loop {
            let line_start = src[..end].rfind('\n').map_or(0, |i| i + 1);
            let line = strip_comment(&src[line_start..end]).trim_end();
            if !line.is_empty() {
                let head = line.trim_end_matches(|c: char| c == '-' || c == '+' || c.is_ascii_digit());
                let before = head.strip_suffix(['|', '>'])?;
                if !before.is_empty() && !before.ends_with([' ', '\t']) {
                    return None;
                }
                return Some(line_start + before.len());
            }
            if line_start == 0 {
                return None;
            }
            end = line_start - 1;
        }
    }

    /// Insertion point for a value that is absent from the text (`key:`).
    fn implicit_value_slot(&self, parent: NodeId, position: usize) -> Option<ByteSpan> {
        let parent = &self.nodes[parent.0];
        if parent.kind != NodeKind::Mapping || position % 2 == 0 {
            return None;
        }
        let key = &self.nodes[parent.children[position - 1].0];
        let key_end = key.span?.end;
        let colon = key_end + self.source[key_end..].find(':')?;
        Some(ByteSpan {
            start: colon + 1,
            end: colon + 1,
        })
    }

    fn scalar_end(
        &self,
        start: usize,
        style: Style,
        flow: bool,
        owner_column: usize,
        span: &Span,
    ) -> Option<usize> {
        match style {
            Style::SingleQuoted => Some(self.quoted_end(start, b'\'')),
            Style::DoubleQuoted => Some(self.quoted_end(start, b'"')),
            Style::Literal | Style::Folded => self.block_end(start, owner_column),
            Style::Plain if span.end.line() > span.start.line() => {
                let end = self.to_byte(span.end.index()).max(start);
                Some(start + self.source[start..end].trim_end().len())
            }
            Style::Plain => Some(self.plain_end(start, flow)),
        }
    }

    fn quoted_end(&self, start: usize, quote: u8) -> usize {
        let bytes = self.source.as_bytes();
        let mut i = start + 1;
        while i < bytes.len() {
            let b = bytes[i];
            if quote == b'"' && b == b'\\' {
                i += 2;
                continue;
            }
            if b == quote {
                if quote == b'\'' && bytes.get(i + 1).copied() == Some(b'\'') {
                    i += 2;
                    continue;
                }
                return i + 1;
            }
            i += 1;
        }
        bytes.len()
    }

    fn plain_end(&self, start: usize, flow: bool) -> usize {
        let bytes = self.source.as_bytes();
        let mut end = start;
        let mut i = start;
        while i < bytes.len() {
            let b = bytes[i];
            let next = bytes.get(i + 1).copied();
            let stop = match b {
                b'\n' | b'\r' => true,
                b'#' => i > start && matches!(bytes[i - 1], b' ' | b'\t'),
                b':' => match next {
                    None | Some(b' ' | b'\t' | b'\n' | b'\r') => true,
                    Some(b',' | b'[' | b']' | b'{' | b'}') => flow,
                    _ => false,
                },
                b',' | b'[' | b']' | b'{' | b'}' => flow,
                _ => false,
            };
            if stop {
                break;
            }
            if b != b' ' && b != b'\t' {
                end = i + 1;
            }
            i += 1;
        }
        end
    }

    /// End of a block scalar: its indicator line plus every following line
    /// indented deeper than its owner, trailing blank lines excluded.
    fn block_end(&self, start: usize, owner_column: usize) -> Option<usize> {
        let src = self.source;
        if !matches!(src.as_bytes().get(start), Some(b'|') | Some(b'>')) {
            return None;
        }
        let owner_indent = owner_column.saturating_sub(1);
        let floor = if self.stack.is_empty() { None } else { Some(owner_indent) };

        let mut pos = src[start..].find('\n').map_or(src.len(), |o| start + o);
        let mut end = pos;
        let mut body_indent: Option<usize> = None;

        while pos < src.len() {
            let line_start = pos + 1;
            let line_end = src[line_start..]
                .find('\n')
                .map_or(src.len(), |o| line_start + o);
            let line = src[line_start..line_end].trim_end_matches('\r');
            pos = line_end;

            if line.trim().is_empty() {
                continue;
            }
            let indent = line.len() - line.trim_start_matches(' ').len();
            if floor.is_some_and(|f| indent <= f) || indent < body_indent.unwrap_or(0) {
                break;
            }
            body_indent.get_or_insert(indent);
            end = line_start + line.len();
        }
        Some(end)
    }
}

/// The part of a line before any `#` comment.
fn strip_comment(line: &str) -> &str {
    let bytes = line.as_bytes();
    let cut = (0..bytes.len())
        .find(|&i| bytes[i] == b'#' && (i == 0 || matches!(bytes[i - 1], b' ' | b'\t')))
        .unwrap_or(bytes.len());
    &line[..cut]
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn find_key(doc: &Document, key: &str) -> NodeId {
        (0..doc.len())
            .map(NodeId)
            .find(|id| doc.node(*id).is_scalar() && doc.node(*id).value == key)
            .unwrap_or_else(|| panic!("no scalar '{}'", key))
    }

    fn text_of(doc: &Document, id: NodeId) -> &str {
        let span = doc.node(id).span.expect("node has a span");
        &doc.source()[span.start..span.end]
    }

    #[test]
    fn test_parse_nested_mapping_columns() {
        let doc = Document::parse("a:\n  b: 1\n  c:\n    d: 2\n").unwrap();
        let root = doc.content().unwrap();
        assert!(doc.node(root).is_mapping());
        assert_eq!(doc.node(root).column, 1);

        assert_eq!(doc.node(find_key(&doc, "a")).column, 1);
        assert_eq!(doc.node(find_key(&doc, "b")).column, 3);
        assert_eq!(doc.node(find_key(&doc, "c")).column, 3);
        assert_eq!(doc.node(find_key(&doc, "d")).column, 5);
        assert_eq!(doc.node(find_key(&doc, "2")).column, 8);
        assert_eq!(doc.node(find_key(&doc, "d")).line, 4);
    }

    #[test]
    fn test_mapping_children_alternate() {
        let doc = Document::parse("x: 1\ny: two\n").unwrap();
        let root = doc.content().unwrap();
        let values: Vec<&str> = doc
            .children(root)
            .iter()
            .map(|id| doc.node(*id).value.as_str())
            .collect();
        assert_eq!(values, vec!["x", "1", "y", "two"]);
    }

    #[test]
    fn test_depth_of_collections_and_entries() {
        let doc = Document::parse("a:\n  b:\n    c: 1\n").unwrap();
        assert_eq!(doc.node(doc.content().unwrap()).depth, 1);
        assert_eq!(doc.node(find_key(&doc, "a")).depth, 1);
        assert_eq!(doc.node(find_key(&doc, "b")).depth, 2);
        assert_eq!(doc.node(find_key(&doc, "c")).depth, 3);
        assert_eq!(doc.node(find_key(&doc, "1")).depth, 3);
    }

    #[test]
    fn test_sequence_of_mappings() {
        let doc = Document::parse("list:\n  - name: x\n  - name: y\n").unwrap();
        let root = doc.content().unwrap();
        let seq = doc.children(root)[1];
        assert!(doc.node(seq).is_sequence());
        assert_eq!(doc.node(seq).column, 3);
        assert_eq!(doc.children(seq).len(), 2);
        let second = doc.children(seq)[1];
        assert!(doc.node(second).is_mapping());
        assert_eq!(doc.node(second).column, 5);
    }

    #[test]
    fn test_scalar_spans() {
        let doc = Document::parse(
            "plain: some text # note\nsingle: 'it''s'\ndouble: \"a \\\" b\"\n",
        )
        .unwrap();
        assert_eq!(text_of(&doc, find_key(&doc, "some text")), "some text");
        assert_eq!(text_of(&doc, find_key(&doc, "it's")), "'it''s'");
        assert_eq!(text_of(&doc, find_key(&doc, "a \" b")), "\"a \\\" b\"");
        assert_eq!(doc.node(find_key(&doc, "it's")).style, Style::SingleQuoted);
    }

    #[test]
    fn test_flow_scalar_spans() {
        let doc = Document::parse("tags: [one, two]\nmap: {k: v}\n").unwrap();
        assert_eq!(text_of(&doc, find_key(&doc, "one")), "one");
        assert_eq!(text_of(&doc, find_key(&doc, "two")), "two");
        assert_eq!(text_of(&doc, find_key(&doc, "v")), "v");
        assert!(doc.node(find_key(&doc, "v")).flow);
        assert!(!doc.node(find_key(&doc, "tags")).flow);
    }

    #[test]
    fn test_block_scalar_span() {
        let src = "script: |\n  echo one\n\n  echo two\n\nnext: 1\n";
        let doc = Document::parse(src).unwrap();
        let script = find_key(&doc, "echo one\n\necho two\n");
        assert_eq!(doc.node(script).style, Style::Literal);
        assert_eq!(text_of(&doc, script), "|\n  echo one\n\n  echo two");
    }

    #[test]
    fn test_block_scalar_starts_at_indicator() {
        let src = "script: |- # keep it\n  echo one\nnext: 1\n";
        let doc = Document::parse(src).unwrap();
        let script = find_key(&doc, "echo one");
        assert_eq!(doc.node(script).line, 1);
        assert_eq!(doc.node(script).column, 9);
        assert_eq!(text_of(&doc, script), "|- # keep it\n  echo one");
    }

    #[test]
    fn test_block_scalar_in_sequence() {
        let doc = Document::parse("l:\n  - >\n    folded\n  - plain\n").unwrap();
        let item = find_key(&doc, "folded\n");
        assert_eq!(doc.node(item).style, Style::Folded);
        assert_eq!((doc.node(item).line, doc.node(item).column), (2, 5));
        assert_eq!(text_of(&doc, item), ">\n    folded");
    }

    #[test]
    fn test_strip_comment() {
        assert_eq!(strip_comment("a: | # note"), "a: | ");
        assert_eq!(strip_comment("a#b: >"), "a#b: >");
        assert_eq!(strip_comment("# only"), "");
    }

    #[test]
    fn test_implicit_null_value() {
        let doc = Document::parse("empty:\nfull: 1\n").unwrap();
        let root = doc.content().unwrap();
        let empty_value = doc.children(root)[1];
        let node = doc.node(empty_value);
        assert_eq!(node.value, "");
        assert_eq!(node.span, Some(ByteSpan { start: 6, end: 6 }));
    }

    #[test]
    fn test_explicit_tilde_is_kept() {
        let doc = Document::parse("value: ~\n").unwrap();
        let root = doc.content().unwrap();
        assert_eq!(doc.node(doc.children(root)[1]).value, "~");
    }

    #[test]
    fn test_alias_node() {
        let doc = Document::parse("base: &b 1\ncopy: *b\n").unwrap();
        let root = doc.content().unwrap();
        let copy = doc.node(doc.children(root)[3]);
        assert_eq!(copy.kind, NodeKind::Alias);
        assert_eq!(copy.value, "b");
    }

    #[test]
    fn test_only_first_document_is_built() {
        let doc = Document::parse("a: 1\n---\nb: 2\n").unwrap();
        let root = doc.content().unwrap();
        assert_eq!(doc.children(root).len(), 2);
        assert!(doc.source().contains("b: 2"));
    }

    #[test]
    fn test_empty_source() {
        let doc = Document::parse("").unwrap();
        assert!(doc.is_empty());
        assert!(!doc.is_dirty());
    }

    #[test]
    fn test_parse_error() {
        let err = Document::parse("a: [1, 2\n").unwrap_err();
        assert!(matches!(err, Error::Parse(_)));
        let err = Document::parse("a: b: c\n").unwrap_err();
        assert!(matches!(err, Error::Parse(_)));
    }

    #[test]
    fn test_multibyte_offsets() {
        let doc = Document::parse("név: \"héllo\"\nnext: ü\n").unwrap();
        assert_eq!(text_of(&doc, find_key(&doc, "héllo")), "\"héllo\"");
        assert_eq!(text_of(&doc, find_key(&doc, "ü")), "ü");
    }
}
