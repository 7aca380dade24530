use serde::{Deserialize, Serialize};

/// A parsed markdown document: the root of the node tree.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Ordered top-level nodes.
    pub children: Vec<DocumentNode>,
}

impl Document {
    pub fn new(children: Vec<DocumentNode>) -> Self {
        Self { children }
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }
}

/// A node in the document tree.
///
/// Serialized with the mdast node names in a `kind` field, so a tree dumped
/// with `mdseo tree` reads like the syntax tree other markdown tooling emits.
/// Every container owns its children by value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum DocumentNode {
    /// ATX or setext heading. `level` is not clamped here.
    Heading {
        level: u8,
        children: Vec<DocumentNode>,
    },
    Paragraph {
        children: Vec<DocumentNode>,
    },
    Blockquote {
        children: Vec<DocumentNode>,
    },
    /// Ordered or bullet list; children are `ListItem`s.
    List {
        ordered: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        start: Option<u64>,
        children: Vec<DocumentNode>,
    },
    ListItem {
        /// Set for GFM task list items.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        checked: Option<bool>,
        children: Vec<DocumentNode>,
    },
    /// GFM table; the header row is the first child.
    Table {
        children: Vec<DocumentNode>,
    },
    TableRow {
        children: Vec<DocumentNode>,
    },
    TableCell {
        children: Vec<DocumentNode>,
    },
    Strong {
        children: Vec<DocumentNode>,
    },
    Emphasis {
        children: Vec<DocumentNode>,
    },
    Link {
        url: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        title: Option<String>,
        children: Vec<DocumentNode>,
    },
    Text {
        value: String,
    },
    InlineCode {
        value: String,
    },
    /// Fenced or indented code block.
    Code {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        lang: Option<String>,
        value: String,
    },
    ThematicBreak,

    // Kinds below are produced by the parser but have no HTML rendering.
    /// GFM strikethrough.
    Delete {
        children: Vec<DocumentNode>,
    },
    Image {
        url: String,
        alt: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        title: Option<String>,
    },
    /// Hard line break.
    Break,
    /// Raw block or inline HTML.
    Html {
        value: String,
    },
    Math {
        value: String,
    },
    InlineMath {
        value: String,
    },
    FootnoteReference {
        label: String,
    },
    FootnoteDefinition {
        label: String,
        children: Vec<DocumentNode>,
    },
    /// Any node kind this crate does not model.
    Unknown {
        name: String,
    },
}

impl DocumentNode {
    /// The mdast name of this node's kind.
    pub fn kind(&self) -> &str {
        match self {
            DocumentNode::Heading { .. } => "heading",
            DocumentNode::Paragraph { .. } => "paragraph",
            DocumentNode::Blockquote { .. } => "blockquote",
            DocumentNode::List { .. } => "list",
            DocumentNode::ListItem { .. } => "listItem",
            DocumentNode::Table { .. } => "table",
            DocumentNode::TableRow { .. } => "tableRow",
            DocumentNode::TableCell { .. } => "tableCell",
            DocumentNode::Strong { .. } => "strong",
            DocumentNode::Emphasis { .. } => "emphasis",
            DocumentNode::Link { .. } => "link",
            DocumentNode::Text { .. } => "text",
            DocumentNode::InlineCode { .. } => "inlineCode",
            DocumentNode::Code { .. } => "code",
            DocumentNode::ThematicBreak => "thematicBreak",
            DocumentNode::Delete { .. } => "delete",
            DocumentNode::Image { .. } => "image",
            DocumentNode::Break => "break",
            DocumentNode::Html { .. } => "html",
            DocumentNode::Math { .. } => "math",
            DocumentNode::InlineMath { .. } => "inlineMath",
            DocumentNode::FootnoteReference { .. } => "footnoteReference",
            DocumentNode::FootnoteDefinition { .. } => "footnoteDefinition",
            DocumentNode::Unknown { name } => name,
        }
    }

    /// Child nodes, or an empty slice for leaves.
    pub fn children(&self) -> &[DocumentNode] {
        match self {
            DocumentNode::Heading { children, .. }
            | DocumentNode::Paragraph { children }
            | DocumentNode::Blockquote { children }
            | DocumentNode::List { children, .. }
            | DocumentNode::ListItem { children, .. }
            | DocumentNode::Table { children }
            | DocumentNode::TableRow { children }
            | DocumentNode::TableCell { children }
            | DocumentNode::Strong { children }
            | DocumentNode::Emphasis { children }
            | DocumentNode::Link { children, .. }
            | DocumentNode::Delete { children }
            | DocumentNode::FootnoteDefinition { children, .. } => children,
            _ => &[],
        }
    }

    /// Concatenated text of this node and its descendants, without markup.
    pub fn plain_text(&self) -> String {
        match self {
            DocumentNode::Text { value } | DocumentNode::InlineCode { value } => value.clone(),
            DocumentNode::Image { alt, .. } => alt.clone(),
            _ => self.children().iter().map(|c| c.plain_text()).collect(),
        }
    }

    pub fn text(value: impl Into<String>) -> Self {
        DocumentNode::Text {
            value: value.into(),
        }
    }
}
