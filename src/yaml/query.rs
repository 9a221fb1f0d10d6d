//! Key path resolution.
//!
//! Walks a [`Document`] one path segment per mapping level. A key only
//! matches when both its text and its scope value equal the reference of the
//! level being searched, so that identically named keys living at other
//! nesting levels are never picked up by mistake.

use super::path::{KeyPath, Segment};
use super::tree::{Document, Node, NodeId, NodeKind};
use std::fmt;

/// How the matcher tells nesting levels apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Scope {
    /// Source column of the key (top level keys sit at column 1).
    #[default]
    Column,
    /// Structural nesting depth recorded while parsing.
    Depth,
}

impl Scope {
    fn of(self, node: &Node) -> usize {
        match self {
            Scope::Column => node.column,
            Scope::Depth => node.depth,
        }
    }

    /// Reference value for the top level of a document.
    fn top(self) -> usize {
        1
    }
}

impl std::str::FromStr for Scope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "column" => Ok(Scope::Column),
            "depth" => Ok(Scope::Depth),
            _ => Err(format!(
                "Invalid scope '{}': expected column or depth",
                s
            )),
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Column => write!(f, "column"),
            Scope::Depth => write!(f, "depth"),
        }
    }
}

/// Outcome of resolving a key path.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Match {
    pub found: bool,
    /// Scalar text at the resolved node, empty when not found.
    pub previous: String,
    /// Column of the resolved node, 0 when not found.
    pub column: usize,
    pub node: Option<NodeId>,
}

impl Match {
    fn at(doc: &Document, id: NodeId) -> Self {
        let node = doc.node(id);
        Match {
            found: true,
            previous: node.value.clone(),
            column: node.column,
            node: Some(id),
        }
    }
}

/// Locate the scalar a key path denotes. Never fails: anything that does
/// not lead to a scalar yields a `found == false` match.
pub fn resolve(doc: &Document, path: &KeyPath, scope: Scope) -> Match {
    if doc.is_empty() {
        log::debug!("document is empty, nothing to resolve '{}' against", path);
        return Match::default();
    }
    let matcher = Matcher { doc, scope };
    match matcher.walk(doc.root(), path.segments(), scope.top()) {
        Some(found) => {
            log::debug!(
                "resolved '{}' at line {} column {}",
                path,
                doc.node(found.node.unwrap_or(doc.root())).line,
                found.column
            );
            found
        }
        None => {
            log::debug!("'{}' does not resolve to a scalar", path);
            Match::default()
        }
    }
}

struct Matcher<'a> {
    doc: &'a Document,
    scope: Scope,
}

impl Matcher<'_> {
    fn walk(&self, id: NodeId, segments: &[Segment], reference: usize) -> Option<Match> {
        let (segment, rest) = segments.split_first()?;
        let node = self.doc.node(id);

        // A document whose root is a sequence is addressed by index directly
        if node.kind == NodeKind::Document {
            if let (Some(seq), Some(index)) = (self.root_sequence(), segment.index) {
                return self.enter_item(seq, index, rest);
            }
        }

        let is_mapping = node.is_mapping();
        let children = self.doc.children(id);
        for (i, &child_id) in children.iter().enumerate() {
            let child = self.doc.node(child_id);
            log::trace!(
                "visit '{}' ({:?}) at {}:{} looking for '{}' at {} {}",
                child.value,
                child.kind,
                child.line,
                child.column,
                segment,
                self.scope,
                reference
            );

            if is_mapping
                && i % 2 == 0
                && child.is_scalar()
                && segment.matches(&child.value)
                && self.scope.of(child) == reference
            {
                if let Some(&value_id) = children.get(i + 1) {
                    if let Some(found) = self.matched(value_id, segment, rest) {
                        return Some(found);
                    }
                }
                continue;
            }

            if child.is_mapping() {
                if let Some(found) = self.walk(child_id, segments, reference) {
                    return Some(found);
                }
            }

            if self.scope.of(child) < reference {
                break;
            }
        }
        None
    }

    /// Continue from the value of a key that matched `segment`.
    fn matched(&self, value_id: NodeId, segment: &Segment, rest: &[Segment]) -> Option<Match> {
        let value = self.doc.node(value_id);
        match (value.kind, segment.index) {
            (NodeKind::Sequence, Some(index)) => self.enter_item(value_id, index, rest),
            (NodeKind::Scalar, _) if rest.is_empty() => self.terminal(value_id),
            (NodeKind::Mapping, _) if !rest.is_empty() => {
                self.walk(value_id, rest, self.scope.of(value))
            }
            _ => None,
        }
    }

    /// Step into item `index` of a sequence, then resolve what remains.
    fn enter_item(&self, seq: NodeId, index: usize, rest: &[Segment]) -> Option<Match> {
        let items = self.doc.children(seq);
        let Some(&item_id) = items.get(index) else {
            log::debug!(
                "index {} is out of range ({} elements in sequence)",
                index,
                items.len()
            );
            return None;
        };
        let item = self.doc.node(item_id);

        if rest.is_empty() {
            return self.terminal(item_id);
        }
        if item.is_mapping() {
            return self.walk(item_id, rest, self.scope.of(item));
        }
        None
    }

    fn terminal(&self, id: NodeId) -> Option<Match> {
        let node = self.doc.node(id);
        if node.is_scalar() {
            Some(Match::at(self.doc, id))
        } else {
            log::debug!(
                "path ends on a {:?} at {}:{}, not a scalar",
                node.kind,
                node.line,
                node.column
            );
            None
        }
    }

    fn root_sequence(&self) -> Option<NodeId> {
        let content = self.doc.content()?;
        self.doc.node(content).is_sequence().then_some(content)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
