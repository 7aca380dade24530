//! Restricted HTML renderer.
//!
//! Maps each [`DocumentNode`] kind to a small set of semantic tags that search
//! engines index well (`h1`-`h6`, `p`, `ul`/`ol`, `table`, ...). Sibling nodes
//! are joined with a single newline at every level, without indentation.
//!
//! Nothing is escaped: text, code and link URLs are inserted exactly as they
//! appear in the tree. The renderer is meant for trusted content; run
//! untrusted input through an escaping layer first.

use crate::error::{Diagnostic, Severity};
use crate::parse::{DocumentParser, MarkdownParser};
use crate::types::{Document, DocumentNode};

/// Highest heading level with an HTML tag.
pub const MAX_HEADING_LEVEL: u8 = 6;

/// Output of [`render_with`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderResult {
    /// The rendered fragment; empty when parsing failed.
    pub html: String,
    /// Parse failures, reported instead of raised.
    pub diagnostics: Vec<Diagnostic>,
}

impl RenderResult {
    pub fn is_ok(&self) -> bool {
        !self
            .diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }
}

/// Render markdown source to restricted HTML with the default parser.
///
/// Never fails: if parsing fails the error is logged and the result is the
/// empty string.
pub fn render(source: &str) -> String {
    let result = render_with(&MarkdownParser::default(), source);
    for diag in &result.diagnostics {
        log::error!("SEO markdown to HTML failed: {}", diag.message);
    }
    result.html
}

/// Render markdown source with the given parser.
///
/// Parse failures become an `E001` error diagnostic and an empty `html`
/// string. Nothing is logged.
pub fn render_with(parser: &dyn DocumentParser, source: &str) -> RenderResult {
    match parser.parse(source) {
        Ok(doc) => RenderResult {
            html: render_document(&doc),
            diagnostics: Vec::new(),
        },
        Err(e) => RenderResult {
            html: String::new(),
            diagnostics: vec![Diagnostic::new(Severity::Error, "E001", e.to_string())],
        },
    }
}

/// Render an already-parsed document.
pub fn render_document(doc: &Document) -> String {
    render_nodes(&doc.children)
}

/// Render a sequence of sibling nodes, joined by `\n`.
pub fn render_nodes(nodes: &[DocumentNode]) -> String {
    nodes.iter().map(render_node).collect::<Vec<_>>().join("\n")
}

/// Render a single node.
///
/// Total over every kind: kinds without an HTML mapping render to the empty
/// string. Heading levels are clamped to 6 on the upper end only.
pub fn render_node(node: &DocumentNode) -> String {
    match node {
        DocumentNode::Heading { level, children } => {
            let level = (*level).min(MAX_HEADING_LEVEL);
            format!("<h{level}>{}</h{level}>", render_nodes(children))
        }
        DocumentNode::Paragraph { children } => wrap("p", children),
        DocumentNode::List {
            ordered, children, ..
        } => wrap(if *ordered { "ol" } else { "ul" }, children),
        DocumentNode::ListItem { children, .. } => wrap("li", children),
        DocumentNode::Table { children } => wrap("table", children),
        DocumentNode::TableRow { children } => wrap("tr", children),
        DocumentNode::TableCell { children } => wrap("td", children),
        DocumentNode::Strong { children } => wrap("strong", children),
        DocumentNode::Emphasis { children } => wrap("em", children),
        DocumentNode::Link { url, children, .. } => {
            format!("<a href=\"{url}\">{}</a>", render_nodes(children))
        }
        DocumentNode::Text { value } => value.clone(),
        DocumentNode::InlineCode { value } => format!("<code>{value}</code>"),
        DocumentNode::Code { value, .. } => format!("<pre><code>{value}</code></pre>"),
        DocumentNode::Blockquote { children } => wrap("blockquote", children),
        DocumentNode::ThematicBreak => "<hr />".to_string(),
        _ => String::new(),
    }
}

fn wrap(tag: &str, children: &[DocumentNode]) -> String {
    format!("<{tag}>{}</{tag}>", render_nodes(children))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ParseError;
    use pretty_assertions::assert_eq;

    fn text(value: &str) -> DocumentNode {
        DocumentNode::text(value)
    }

    fn texts(values: &[&str]) -> Vec<DocumentNode> {
        values.iter().map(|v| text(v)).collect()
    }

    // -- One assertion per kind ---------------------------------------

    #[test]
    fn html_heading() {
        let node = DocumentNode::Heading {
            level: 2,
            children: texts(&["Title"]),
        };
        assert_eq!(render_node(&node), "<h2>Title</h2>");
    }

    #[test]
    fn html_paragraph() {
        let node = DocumentNode::Paragraph {
            children: texts(&["Hello"]),
        };
        assert_eq!(render_node(&node), "<p>Hello</p>");
    }

    #[test]
    fn html_unordered_list() {
        let node = DocumentNode::List {
            ordered: false,
            start: None,
            children: vec![DocumentNode::ListItem {
                checked: None,
                children: texts(&["a"]),
            }],
        };
        assert_eq!(render_node(&node), "<ul><li>a</li></ul>");
    }

    #[test]
    fn html_ordered_list() {
        let node = DocumentNode::List {
            ordered: true,
            start: Some(1),
            children: vec![DocumentNode::ListItem {
                checked: None,
                children: texts(&["a"]),
            }],
        };
        assert_eq!(render_node(&node), "<ol><li>a</li></ol>");
    }

    #[test]
    fn html_list_item() {
        let node = DocumentNode::ListItem {
            checked: Some(true),
            children: texts(&["done"]),
        };
        assert_eq!(render_node(&node), "<li>done</li>");
    }

    #[test]
    fn html_table() {
        let node = DocumentNode::Table {
            children: vec![
                DocumentNode::TableRow {
                    children: vec![
                        DocumentNode::TableCell {
                            children: texts(&["a"]),
                        },
                        DocumentNode::TableCell {
                            children: texts(&["b"]),
                        },
                    ],
                },
                DocumentNode::TableRow {
                    children: vec![DocumentNode::TableCell {
                        children: texts(&["1"]),
                    }],
                },
            ],
        };
        assert_eq!(
            render_node(&node),
            "<table><tr><td>a</td>\n<td>b</td></tr>\n<tr><td>1</td></tr></table>"
        );
    }

    #[test]
    fn html_table_row() {
        let node = DocumentNode::TableRow {
            children: vec![DocumentNode::TableCell {
                children: texts(&["x"]),
            }],
        };
        assert_eq!(render_node(&node), "<tr><td>x</td></tr>");
    }

    #[test]
    fn html_table_cell() {
        let node = DocumentNode::TableCell {
            children: texts(&["x"]),
        };
        assert_eq!(render_node(&node), "<td>x</td>");
    }

    #[test]
    fn html_strong() {
        let node = DocumentNode::Strong {
            children: texts(&["bold"]),
        };
        assert_eq!(render_node(&node), "<strong>bold</strong>");
    }

    #[test]
    fn html_emphasis() {
        let node = DocumentNode::Emphasis {
            children: texts(&["it"]),
        };
        assert_eq!(render_node(&node), "<em>it</em>");
    }

    #[test]
    fn html_link() {
        let node = DocumentNode::Link {
            url: "https://example.com/?a=1&b=2".into(),
            title: Some("ignored".into()),
            children: texts(&["site"]),
        };
        assert_eq!(
            render_node(&node),
            "<a href=\"https://example.com/?a=1&b=2\">site</a>"
        );
    }

    #[test]
    fn html_text() {
        assert_eq!(render_node(&text("plain words")), "plain words");
    }

    #[test]
    fn html_inline_code() {
        let node = DocumentNode::InlineCode {
            value: "a < b".into(),
        };
        assert_eq!(render_node(&node), "<code>a < b</code>");
    }

    #[test]
    fn html_code() {
        let node = DocumentNode::Code {
            lang: Some("rust".into()),
            value: "fn main() {\n    println!(\"<hi>\");\n}".into(),
        };
        assert_eq!(
            render_node(&node),
            "<pre><code>fn main() {\n    println!(\"<hi>\");\n}</code></pre>"
        );
    }

    #[test]
    fn html_blockquote() {
        let node = DocumentNode::Blockquote {
            children: vec![DocumentNode::Paragraph {
                children: texts(&["quoted"]),
            }],
        };
        assert_eq!(render_node(&node), "<blockquote><p>quoted</p></blockquote>");
    }

    #[test]
    fn html_thematic_break() {
        assert_eq!(render_node(&DocumentNode::ThematicBreak), "<hr />");
    }

    #[test]
    fn html_unmapped_kinds_are_empty() {
        let nodes = [
            DocumentNode::Delete {
                children: texts(&["gone"]),
            },
            DocumentNode::Image {
                url: "/a.png".into(),
                alt: "a".into(),
                title: None,
            },
            DocumentNode::Break,
            DocumentNode::Html {
                value: "<div>".into(),
            },
            DocumentNode::Math {
                value: "x^2".into(),
            },
            DocumentNode::InlineMath { value: "x".into() },
            DocumentNode::FootnoteReference { label: "1".into() },
            DocumentNode::FootnoteDefinition {
                label: "1".into(),
                children: texts(&["note"]),
            },
            DocumentNode::Unknown {
                name: "yaml".into(),
            },
        ];
        for node in &nodes {
            assert_eq!(render_node(node), "", "{} should render empty", node.kind());
        }
    }

    // -- Edge cases ---------------------------------------------------

    #[test]
    fn heading_clamps_upper_bound_only() {
        for level in 6..=u8::MAX {
            let node = DocumentNode::Heading {
                level,
                children: texts(&["x"]),
            };
            assert_eq!(render_node(&node), "<h6>x</h6>");
        }
        let zero = DocumentNode::Heading {
            level: 0,
            children: texts(&["x"]),
        };
        assert_eq!(render_node(&zero), "<h0>x</h0>");
    }

    #[test]
    fn unknown_node_does_not_disturb_siblings() {
        let nodes = vec![
            DocumentNode::Paragraph {
                children: texts(&["before"]),
            },
            DocumentNode::Unknown {
                name: "mystery".into(),
            },
            DocumentNode::Paragraph {
                children: texts(&["after"]),
            },
        ];
        assert_eq!(render_nodes(&nodes), "<p>before</p>\n\n<p>after</p>");
    }

    #[test]
    fn inline_children_are_newline_joined() {
        let node = DocumentNode::Paragraph {
            children: vec![
                text("Hello "),
                DocumentNode::Strong {
                    children: texts(&["world"]),
                },
            ],
        };
        assert_eq!(render_node(&node), "<p>Hello \n<strong>world</strong></p>");
    }

    #[test]
    fn markup_passes_through_unescaped() {
        let node = DocumentNode::Paragraph {
            children: texts(&["<script>alert(1)</script>"]),
        };
        assert_eq!(render_node(&node), "<p><script>alert(1)</script></p>");
    }

    #[test]
    fn empty_containers() {
        assert_eq!(render_nodes(&[]), "");
        let node = DocumentNode::Paragraph { children: vec![] };
        assert_eq!(render_node(&node), "<p></p>");
    }

    #[test]
    fn deep_nesting_renders() {
        let mut node = text("core");
        for _ in 0..200 {
            node = DocumentNode::Blockquote {
                children: vec![node],
            };
        }
        let html = render_node(&node);
        assert!(html.starts_with("<blockquote><blockquote>"));
        assert_eq!(html.matches("</blockquote>").count(), 200);
    }

    // -- Entry points -------------------------------------------------

    #[test]
    fn render_uses_default_parser() {
        assert_eq!(render("# Title"), "<h1>Title</h1>");
        assert_eq!(render(""), "");
    }

    #[test]
    fn render_with_reports_parse_failure() {
        let failing = |_: &str| -> Result<Document, ParseError> {
            Err(ParseError::Custom {
                message: "boom".into(),
            })
        };
        let result = render_with(&failing, "# Title");
        assert_eq!(result.html, "");
        assert!(!result.is_ok());
        assert_eq!(result.diagnostics.len(), 1);
        assert_eq!(result.diagnostics[0].code.as_deref(), Some("E001"));
        assert!(result.diagnostics[0].message.contains("boom"));
    }

    #[test]
    fn render_with_success_has_no_diagnostics() {
        let result = render_with(&MarkdownParser::default(), "text");
        assert!(result.is_ok());
        assert_eq!(result.html, "<p>text</p>");
    }
}
