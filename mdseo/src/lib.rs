//! `mdseo`: Restricted HTML from markdown, for search engines.
//!
//! Markdown source is parsed into a [`Document`] tree of [`DocumentNode`]s
//! (mdast-shaped, built on `pulldown-cmark`), and the tree is rendered to a
//! small set of semantic tags. Rendering is total: unsupported node kinds
//! produce nothing, and a parse failure produces an empty string.
//!
//! # Quick start
//!
//! ```
//! assert_eq!(mdseo::render("# Hello"), "<h1>Hello</h1>");
//! assert_eq!(
//!     mdseo::render("- a\n- b"),
//!     "<ul><li>a</li>\n<li>b</li></ul>"
//! );
//! ```
//!
//! Output is not escaped. Only feed it content you trust.

pub mod diagram;
pub mod error;
pub mod page;
pub mod parse;
pub mod render_html;
pub mod storage;
pub mod types;
pub mod validate;

pub use error::*;
pub use page::PageConfig;
pub use parse::{DocumentParser, MarkdownParser, ParseOptions, parse};
pub use render_html::{
    RenderResult, render, render_document, render_node, render_nodes, render_with,
};
pub use types::*;

#[cfg(doctest)]
#[doc = include_str!("../README.md")]
struct ReadmeDoctests;

impl Document {
    /// Render this document as a restricted HTML fragment.
    pub fn to_html(&self) -> String {
        render_html::render_document(self)
    }

    /// Render this document as a complete HTML page.
    pub fn to_html_page(&self, config: &PageConfig) -> String {
        page::to_html_page(self, config)
    }

    /// Validate this document and return any diagnostics.
    pub fn validate(&self) -> Vec<Diagnostic> {
        validate::validate(self)
    }
}
