//! Full-page wrapper around the restricted fragment.
//!
//! The fragment from [`render_document`](crate::render_document) is embedded
//! verbatim; only the page metadata supplied by the caller is escaped.

use crate::render_html::render_document;
use crate::types::{Document, DocumentNode};

/// Configuration for full-page HTML rendering.
#[derive(Debug, Clone, Default)]
pub struct PageConfig {
    /// Page title. Falls back to the first heading, then "Document".
    pub title: Option<String>,
    /// Optional canonical URL for `<link rel="canonical">`.
    pub canonical_url: Option<String>,
    /// Optional meta description.
    pub description: Option<String>,
    /// Optional language code (default: "en").
    pub lang: Option<String>,
}

/// Render a `Document` as a complete HTML page.
///
/// Produces a `<!DOCTYPE html>` document with charset, viewport and generator
/// meta tags, the resolved title, optional description and canonical link,
/// and the fragment inside `<article class="mdseo">`.
pub fn to_html_page(doc: &Document, config: &PageConfig) -> String {
    let body = render_document(doc);
    let lang = config.lang.as_deref().unwrap_or("en");

    // Resolve title: explicit config > first heading > fallback
    let title = config
        .title
        .clone()
        .or_else(|| first_heading(doc))
        .unwrap_or_else(|| "Document".to_string());

    let mut meta_extra = String::new();
    if let Some(desc) = &config.description {
        meta_extra.push_str(&format!(
            "\n    <meta name=\"description\" content=\"{}\">",
            escape_html(desc)
        ));
    }
    if let Some(url) = &config.canonical_url {
        meta_extra.push_str(&format!(
            "\n    <link rel=\"canonical\" href=\"{}\">",
            escape_html(url)
        ));
    }

    format!(
        r#"<!DOCTYPE html>
<html lang="{lang}">
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <meta name="generator" content="mdseo {version}">
    <title>{title}</title>{meta_extra}
</head>
<body>
<article class="mdseo">
{body}
</article>
</body>
</html>"#,
        lang = escape_html(lang),
        version = env!("CARGO_PKG_VERSION"),
        title = escape_html(&title),
        meta_extra = meta_extra,
        body = body,
    )
}

fn first_heading(doc: &Document) -> Option<String> {
    doc.children.iter().find_map(|node| match node {
        DocumentNode::Heading { .. } => {
            let text = node.plain_text();
            let text = text.trim();
            (!text.is_empty()).then(|| text.to_string())
        }
        _ => None,
    })
}

/// Escape HTML special characters in attribute and title text.
fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
