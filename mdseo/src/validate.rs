//! Lint pass over a parsed [`Document`].
//!
//! Reports what the renderer will silently do to the tree: drop node kinds it
//! has no tag for, clamp deep headings, and pass raw markup through. Returns a
//! list of `Diagnostic` items (non-fatal).

use crate::error::{Diagnostic, Severity};
use crate::render_html::MAX_HEADING_LEVEL;
use crate::types::{Document, DocumentNode};

const RAW_MARKUP: [char; 4] = ['<', '>', '&', '"'];

/// Validate a parsed `Document` and return any diagnostics.
///
/// Walks the whole tree. It never modifies the document.
pub fn validate(doc: &Document) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    for node in &doc.children {
        validate_node(node, &mut diagnostics);
    }
    diagnostics
}

fn validate_node(node: &DocumentNode, diagnostics: &mut Vec<Diagnostic>) {
    match node {
        DocumentNode::Heading { level, .. } if *level > MAX_HEADING_LEVEL => {
            diagnostics.push(Diagnostic::new(
                Severity::Warning,
                "V002",
                format!("Heading level {level} is rendered as h{MAX_HEADING_LEVEL}"),
            ));
        }

        DocumentNode::Link { url, .. } => {
            if url.is_empty() {
                diagnostics.push(Diagnostic::new(
                    Severity::Warning,
                    "V004",
                    "Link has an empty URL",
                ));
            } else if url.contains(RAW_MARKUP) {
                diagnostics.push(raw_markup("link URL", url));
            }
        }

        DocumentNode::Text { value } if value.contains(RAW_MARKUP) => {
            diagnostics.push(raw_markup("text", value));
        }

        DocumentNode::InlineCode { value } | DocumentNode::Code { value, .. }
            if value.contains(RAW_MARKUP) =>
        {
            diagnostics.push(raw_markup("code", value));
        }

        DocumentNode::Delete { .. }
        | DocumentNode::Break
        | DocumentNode::Image { .. }
        | DocumentNode::Html { .. }
        | DocumentNode::Math { .. }
        | DocumentNode::InlineMath { .. }
        | DocumentNode::FootnoteReference { .. }
        | DocumentNode::FootnoteDefinition { .. }
        | DocumentNode::Unknown { .. } => {
            diagnostics.push(Diagnostic::new(
                Severity::Warning,
                "V001",
                format!("Node kind '{}' has no HTML output and is dropped", node.kind()),
            ));
            // Dropped subtrees are not rendered, so there is nothing more to report.
            return;
        }

        _ => {}
    }

    for child in node.children() {
        validate_node(child, diagnostics);
    }
}

fn raw_markup(what: &str, value: &str) -> Diagnostic {
    let preview: String = value.chars().take(40).collect();
    Diagnostic::new(
        Severity::Info,
        "V003",
        format!("Raw markup in {what} is inserted unescaped: {preview:?}"),
    )
}
