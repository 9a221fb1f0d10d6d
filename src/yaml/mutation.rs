//! Mutation operations for YAML documents.
//!
//! Only scalar text is ever changed. Style, anchors, tags and the text
//! around the node are left alone; the serializer takes care of writing the
//! new value back in the node's original style.

use super::error::Error;
use super::path::KeyPath;
use super::query::{resolve, Match, Scope};
use super::tree::{Document, NodeId, NodeKind};

/// Replace the text of a scalar node.
pub fn set_scalar(doc: &mut Document, id: NodeId, text: &str) -> Result<(), Error> {
    let node = doc.node_mut(id);
    if node.kind != NodeKind::Scalar {
        return Err(Error::Type(format!(
            "cannot set a value on {:?} at line {}, column {}",
            node.kind, node.line, node.column
        )));
    }
    if node.value != text {
        node.value = text.to_string();
        node.dirty = true;
    }
    Ok(())
}

/// Resolve `path` and, when `new_value` is given, overwrite what it points at.
///
/// The returned match always carries the value found *before* any change.
pub fn replace(
    doc: &mut Document,
    path: &KeyPath,
    new_value: Option<&str>,
    scope: Scope,
) -> Result<Match, Error> {
    let found = resolve(doc, path, scope);
    if let (Some(id), Some(text)) = (found.node, new_value) {
        set_scalar(doc, id, text)?;
    }
    Ok(found)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_scalar_marks_dirty() {
        let mut doc = Document::parse("a: 1\n").unwrap();
        let value = doc.children(doc.content().unwrap())[1];
        set_scalar(&mut doc, value, "2").unwrap();
        assert_eq!(doc.node(value).value, "2");
        assert!(doc.node(value).is_dirty());
        assert!(doc.is_dirty());
    }

    #[test]
    fn test_set_same_value_is_clean() {
        let mut doc = Document::parse("a: 1\n").unwrap();
        let value = doc.children(doc.content().unwrap())[1];
        set_scalar(&mut doc, value, "1").unwrap();
        assert!(!doc.is_dirty());
    }

    #[test]
    fn test_set_keeps_style() {
        let mut doc = Document::parse("a: 'quoted'\n").unwrap();
        let value = doc.children(doc.content().unwrap())[1];
        let style = doc.node(value).style;
        set_scalar(&mut doc, value, "other").unwrap();
        assert_eq!(doc.node(value).style, style);
    }

    #[test]
    fn test_set_on_mapping_fails() {
        let mut doc = Document::parse("a:\n  b: 1\n").unwrap();
        let mapping = doc.children(doc.content().unwrap())[1];
        let err = set_scalar(&mut doc, mapping, "x").unwrap_err();
        assert!(matches!(err, Error::Type(_)));
        assert!(!doc.is_dirty());
    }

    #[test]
    fn test_replace_reports_previous_value() {
        let mut doc = Document::parse("a:\n  b: 1\n  c:\n    d: 2\n").unwrap();
        let found = replace(&mut doc, &KeyPath::parse("a.c.d"), Some("3"), Scope::Column).unwrap();
        assert!(found.found);
        assert_eq!(found.previous, "2");
        assert_eq!(doc.node(found.node.unwrap()).value, "3");
    }

    #[test]
    fn test_replace_without_value_is_read_only() {
        let mut doc = Document::parse("a: 1\n").unwrap();
        let found = replace(&mut doc, &KeyPath::parse("a"), None, Scope::Column).unwrap();
        assert_eq!(found.previous, "1");
        assert!(!doc.is_dirty());
    }

    #[test]
    fn test_replace_missing_key_changes_nothing() {
        let mut doc = Document::parse("a: 1\n").unwrap();
        let found = replace(&mut doc, &KeyPath::parse("b"), Some("2"), Scope::Column).unwrap();
        assert!(!found.found);
        assert!(!doc.is_dirty());
    }
}
