//! Serialization of a (possibly mutated) document back to text.
//!
//! The source text is the template: everything outside of the changed
//! scalars is copied verbatim, so comments, anchors, blank lines and key
//! order survive untouched. A changed scalar is written in the style it
//! had, falling back to double quotes or a literal block when its new text
//! cannot be expressed that way.

use super::error::Error;
use super::tree::{ByteSpan, Document, Node, Style};

/// Indentation width used for re-rendered block scalars.
pub const DEFAULT_INDENT: usize = 2;

/// Encode the document, rewriting every changed scalar in place.
pub fn encode(doc: &Document, indent: usize) -> Result<String, Error> {
    let source = doc.source();
    let mut out = String::with_capacity(source.len() + 32);
    let mut cursor = 0;

    for id in doc.dirty_nodes() {
        let node = doc.node(id);
        let span = node.span.ok_or_else(|| {
            Error::Encode(format!(
                "value at line {}, column {} cannot be rewritten in place",
                node.line, node.column
            ))
        })?;
        if span.start < cursor || span.end > source.len() {
            return Err(Error::Encode(format!(
                "overlapping edit at line {}, column {}",
                node.line, node.column
            )));
        }
        out.push_str(&source[cursor..span.start]);
        out.push_str(&render(source, node, span, indent));
        cursor = span.end;
    }

    out.push_str(&source[cursor..]);
    Ok(out)
}

fn render(source: &str, node: &Node, span: ByteSpan, indent: usize) -> String {
    let text = node.value.as_str();
    let original = &source[span.start..span.end];
    let base = node.owner_column.saturating_sub(1) + indent;

    let rendered = match node.style {
        Style::Literal | Style::Folded if !node.flow => {
            let header = original.lines().next().unwrap_or_default();
            let body_indent = original
                .lines()
                .skip(1)
                .find(|l| !l.trim().is_empty())
                .map_or(base, |l| l.len() - l.trim_start_matches(' ').len());
            block(text, header_comment(header), body_indent)
        }
        Style::DoubleQuoted => double_quoted(text),
        Style::SingleQuoted if !text.contains('\n') => single_quoted(text),
        _ if text.contains('\n') && !node.flow => block(text, "", base),
        Style::Plain if is_plain_safe(text, node.flow) => text.to_string(),
        _ => double_quoted(text),
    };

    // An absent value is inserted right after its `:`
    if span.start == span.end {
        format!(" {}", rendered)
    } else {
        rendered
    }
}

/// Whatever follows the block indicator on its line (usually a comment).
fn header_comment(header: &str) -> &str {
    let after = header.trim_start_matches(['|', '>']);
    after.trim_start_matches(|c: char| c == '-' || c == '+' || c.is_ascii_digit())
}

/// Literal block scalar. Text that a literal block cannot carry faithfully
/// is double-quoted instead.
fn block(text: &str, header_rest: &str, body_indent: usize) -> String {
    if text.starts_with([' ', '\t'])
        || text.contains('\r')
        || text.chars().any(|c| c.is_control() && c != '\n' && c != '\t')
    {
        return double_quoted(text);
    }

    let (chomp, body) = match text.strip_suffix('\n') {
        Some(stripped) => ("", stripped),
        None => ("-", text),
    };

    let pad = " ".repeat(body_indent);
    let mut out = format!("|{}{}", chomp, header_rest);
    for line in body.split('\n') {
        out.push('\n');
        if !line.is_empty() {
            out.push_str(&pad);
            out.push_str(line);
        }
    }
    out
}

fn is_plain_safe(text: &str, flow: bool) -> bool {
    let Some(first) = text.chars().next() else {
        return false;
    };
    if text.trim() != text || text.chars().any(char::is_control) {
        return false;
    }
    if "[]{},#&*!|>'\"%@`".contains(first) {
        return false;
    }
    if "-?:".contains(first) && text[1..].chars().next().map_or(true, |c| c == ' ') {
        return false;
    }
    if text.contains(": ") || text.contains(" #") || text.ends_with(':') {
        return false;
    }
    !(flow && text.contains([',', '[', ']', '{', '}']))
}

fn single_quoted(text: &str) -> String {
    if text.chars().any(char::is_control) {
        return double_quoted(text);
    }
    format!("'{}'", text.replace('\'', "''"))
}

fn double_quoted(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for c in text.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            c if c.is_control() => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

// =============================================================================
// Unit Tests
// =============================================================================
