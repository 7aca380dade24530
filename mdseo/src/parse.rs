use std::ops::Range;

use linkify::{LinkFinder, LinkKind};
use pulldown_cmark::{CodeBlockKind, Event, LinkType, Options, Parser, Tag};

use crate::error::ParseError;
use crate::types::{Document, DocumentNode};

/// Anything that can turn markdown source into a [`Document`].
///
/// The renderer only depends on this seam, so callers can swap in another
/// parser (or a failing one in tests) without touching the render rules.
pub trait DocumentParser {
    fn parse(&self, source: &str) -> Result<Document, ParseError>;
}

impl<F> DocumentParser for F
where
    F: Fn(&str) -> Result<Document, ParseError>,
{
    fn parse(&self, source: &str) -> Result<Document, ParseError> {
        self(source)
    }
}

/// Knobs for [`MarkdownParser`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseOptions {
    /// GFM tables, strikethrough, task lists and footnotes.
    pub gfm: bool,
    /// `$inline$` and `$$display$$` math.
    pub math: bool,
    /// Reject inputs longer than this many bytes.
    pub max_input_bytes: Option<usize>,
    /// Lift `####### text` lines (seven or more markers) to headings.
    pub deep_headings: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            gfm: true,
            math: true,
            max_input_bytes: None,
            deep_headings: true,
        }
    }
}

/// Default parser: CommonMark via `pulldown-cmark`, folded into an
/// mdast-shaped tree.
#[derive(Debug, Clone, Default)]
pub struct MarkdownParser {
    options: ParseOptions,
}

impl MarkdownParser {
    pub fn new(options: ParseOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ParseOptions {
        &self.options
    }

    fn cmark_options(&self) -> Options {
        let mut options = Options::empty();
        if self.options.gfm {
            options.insert(Options::ENABLE_TABLES);
            options.insert(Options::ENABLE_STRIKETHROUGH);
            options.insert(Options::ENABLE_TASKLISTS);
            options.insert(Options::ENABLE_FOOTNOTES);
        }
        if self.options.math {
            options.insert(Options::ENABLE_MATH);
        }
        options
    }
}

impl DocumentParser for MarkdownParser {
    fn parse(&self, source: &str) -> Result<Document, ParseError> {
        if let Some(limit) = self.options.max_input_bytes {
            if source.len() > limit {
                return Err(ParseError::InputTooLarge {
                    len: source.len(),
                    limit,
                });
            }
        }

        let mut builder = TreeBuilder::new(source, &self.options);
        for (event, range) in Parser::new_ext(source, self.cmark_options()).into_offset_iter() {
            builder.push_event(event, range)?;
        }
        let doc = builder.finish()?;
        log::debug!("parsed {} top-level nodes", doc.children.len());
        Ok(doc)
    }
}

/// Parse markdown with the default options.
pub fn parse(source: &str) -> Result<Document, ParseError> {
    MarkdownParser::default().parse(source)
}

// ------------------------------------------------------------------
// Event stream -> tree
// ------------------------------------------------------------------

/// A container that has been opened but not yet closed.
enum Open {
    Heading(u8),
    Paragraph,
    Blockquote,
    List { ordered: bool, start: Option<u64> },
    ListItem { checked: Option<bool> },
    Table,
    TableRow,
    TableCell,
    Strong,
    Emphasis,
    Delete,
    Link { url: String, title: Option<String> },
    Image { url: String, title: Option<String> },
    Code { lang: Option<String> },
    HtmlBlock,
    FootnoteDefinition { label: String },
    Unsupported,
}

struct Frame {
    open: Open,
    children: Vec<DocumentNode>,
    /// Raw content for code and HTML blocks.
    literal: String,
    /// Byte offset in the source where the container starts.
    start: usize,
}

struct TreeBuilder<'a> {
    source: &'a str,
    stack: Vec<Frame>,
    root: Vec<DocumentNode>,
    deep_headings: bool,
    autolink: bool,
}

impl<'a> TreeBuilder<'a> {
    fn new(source: &'a str, options: &ParseOptions) -> Self {
        Self {
            source,
            stack: Vec::new(),
            root: Vec::new(),
            deep_headings: options.deep_headings,
            autolink: options.gfm,
        }
    }

    fn push_event(&mut self, event: Event<'_>, range: Range<usize>) -> Result<(), ParseError> {
        match event {
            Event::Start(tag) => {
                self.stack.push(Frame {
                    open: open_for(tag),
                    children: Vec::new(),
                    literal: String::new(),
                    start: range.start,
                });
            }
            Event::End(_) => {
                let frame = self.stack.pop().ok_or_else(|| ParseError::Unbalanced {
                    detail: "container closed before it was opened".into(),
                })?;
                let node = self.close(frame);
                self.push_node(node);
            }
            Event::Text(text) => {
                if let Some(frame) = self.literal_frame() {
                    frame.literal.push_str(&text);
                } else {
                    self.push_text(&text);
                }
            }
            Event::Code(code) => self.push_node(DocumentNode::InlineCode {
                value: code.into_string(),
            }),
            Event::InlineMath(math) => self.push_node(DocumentNode::InlineMath {
                value: math.into_string(),
            }),
            Event::DisplayMath(math) => self.push_node(DocumentNode::Math {
                value: math.into_string(),
            }),
            Event::Html(html) => {
                if let Some(frame) = self.literal_frame() {
                    frame.literal.push_str(&html);
                } else {
                    self.push_node(DocumentNode::Html {
                        value: html.into_string(),
                    });
                }
            }
            Event::InlineHtml(html) => self.push_node(DocumentNode::Html {
                value: html.into_string(),
            }),
            Event::FootnoteReference(label) => self.push_node(DocumentNode::FootnoteReference {
                label: label.into_string(),
            }),
            Event::SoftBreak => self.push_text("\n"),
            Event::HardBreak => self.push_node(DocumentNode::Break),
            Event::Rule => self.push_node(DocumentNode::ThematicBreak),
            Event::TaskListMarker(done) => {
                let item = self
                    .stack
                    .iter_mut()
                    .rev()
                    .find(|f| matches!(f.open, Open::ListItem { .. }));
                if let Some(Frame {
                    open: Open::ListItem { checked },
                    ..
                }) = item
                {
                    *checked = Some(done);
                }
            }
        }
        Ok(())
    }

    fn finish(self) -> Result<Document, ParseError> {
        if let Some(frame) = self.stack.last() {
            return Err(ParseError::Unbalanced {
                detail: format!(
                    "{} container(s) still open at end of input (innermost: {})",
                    self.stack.len(),
                    open_name(&frame.open)
                ),
            });
        }
        Ok(Document::new(self.root))
    }

    fn literal_frame(&mut self) -> Option<&mut Frame> {
        self.stack
            .last_mut()
            .filter(|f| matches!(f.open, Open::Code { .. } | Open::HtmlBlock))
    }

    fn siblings(&mut self) -> &mut Vec<DocumentNode> {
        match self.stack.last_mut() {
            Some(frame) => &mut frame.children,
            None => &mut self.root,
        }
    }

    fn push_node(&mut self, node: DocumentNode) {
        self.siblings().push(node);
    }

    /// Adjacent text (including soft breaks) collapses into one node.
    fn push_text(&mut self, text: &str) {
        let siblings = self.siblings();
        if let Some(DocumentNode::Text { value }) = siblings.last_mut() {
            value.push_str(text);
        } else {
            siblings.push(DocumentNode::text(text));
        }
    }

    fn close(&self, frame: Frame) -> DocumentNode {
        let Frame {
            open,
            children,
            literal,
            start,
        } = frame;
        let children = if self.autolink && !matches!(open, Open::Link { .. }) {
            autolink_literals(children)
        } else {
            children
        };
        match open {
            Open::Heading(level) => DocumentNode::Heading { level, children },
            Open::Paragraph => {
                let raw = self.source.get(start..).unwrap_or("");
                if self.deep_headings && opens_with_deep_marker(raw) {
                    lift_deep_heading(children)
                } else {
                    DocumentNode::Paragraph { children }
                }
            }
            Open::Blockquote => DocumentNode::Blockquote { children },
            Open::List { ordered, start } => DocumentNode::List {
                ordered,
                start,
                children,
            },
            Open::ListItem { checked } => DocumentNode::ListItem { checked, children },
            Open::Table => DocumentNode::Table { children },
            Open::TableRow => DocumentNode::TableRow { children },
            Open::TableCell => DocumentNode::TableCell { children },
            Open::Strong => DocumentNode::Strong { children },
            Open::Emphasis => DocumentNode::Emphasis { children },
            Open::Delete => DocumentNode::Delete { children },
            Open::Link { url, title } => DocumentNode::Link {
                url,
                title,
                children,
            },
            Open::Image { url, title } => DocumentNode::Image {
                url,
                alt: children.iter().map(|c| c.plain_text()).collect(),
                title,
            },
            Open::Code { lang } => {
                let value = literal.strip_suffix('\n').unwrap_or(&literal).to_string();
                DocumentNode::Code { lang, value }
            }
            Open::HtmlBlock => DocumentNode::Html {
                value: literal.trim_end_matches('\n').to_string(),
            },
            Open::FootnoteDefinition { label } => {
                DocumentNode::FootnoteDefinition { label, children }
            }
            Open::Unsupported => DocumentNode::Unknown {
                name: "unsupported".into(),
            },
        }
    }
}

fn open_for(tag: Tag<'_>) -> Open {
    match tag {
        Tag::Paragraph => Open::Paragraph,
        Tag::Heading { level, .. } => Open::Heading(level as u8),
        Tag::BlockQuote(_) => Open::Blockquote,
        Tag::CodeBlock(kind) => Open::Code {
            lang: match kind {
                CodeBlockKind::Fenced(info) => info
                    .split_whitespace()
                    .next()
                    .map(|lang| lang.to_string()),
                CodeBlockKind::Indented => None,
            },
        },
        Tag::HtmlBlock => Open::HtmlBlock,
        Tag::List(start) => Open::List {
            ordered: start.is_some(),
            start,
        },
        Tag::Item => Open::ListItem { checked: None },
        Tag::FootnoteDefinition(label) => Open::FootnoteDefinition {
            label: label.into_string(),
        },
        Tag::Table(_) => Open::Table,
        // Header cells sit directly under the head; it becomes the first row.
        Tag::TableHead | Tag::TableRow => Open::TableRow,
        Tag::TableCell => Open::TableCell,
        Tag::Emphasis => Open::Emphasis,
        Tag::Strong => Open::Strong,
        Tag::Strikethrough => Open::Delete,
        Tag::Link {
            link_type,
            dest_url,
            title,
            ..
        } => {
            let mut url = dest_url.into_string();
            if link_type == LinkType::Email && !url.starts_with("mailto:") {
                url.insert_str(0, "mailto:");
            }
            Open::Link {
                url,
                title: non_empty(title.into_string()),
            }
        }
        Tag::Image {
            dest_url, title, ..
        } => Open::Image {
            url: dest_url.into_string(),
            title: non_empty(title.into_string()),
        },
        _ => Open::Unsupported,
    }
}

fn open_name(open: &Open) -> &'static str {
    match open {
        Open::Heading(_) => "heading",
        Open::Paragraph => "paragraph",
        Open::Blockquote => "blockquote",
        Open::List { .. } => "list",
        Open::ListItem { .. } => "listItem",
        Open::Table => "table",
        Open::TableRow => "tableRow",
        Open::TableCell => "tableCell",
        Open::Strong => "strong",
        Open::Emphasis => "emphasis",
        Open::Delete => "delete",
        Open::Link { .. } => "link",
        Open::Image { .. } => "image",
        Open::Code { .. } => "code",
        Open::HtmlBlock => "html",
        Open::FootnoteDefinition { .. } => "footnoteDefinition",
        Open::Unsupported => "unsupported",
    }
}

fn non_empty(s: String) -> Option<String> {
    if s.is_empty() { None } else { Some(s) }
}

/// Split bare `http(s)://`, `www.` and email literals out of text nodes into
/// links, the way GFM autolink literals work. `www.` links get `http://`.
fn autolink_literals(children: Vec<DocumentNode>) -> Vec<DocumentNode> {
    let mut finder = LinkFinder::new();
    finder.url_must_have_scheme(false);

    let mut out = Vec::with_capacity(children.len());
    for child in children {
        let DocumentNode::Text { value } = child else {
            out.push(child);
            continue;
        };

        let mut last = 0;
        for link in finder.links(&value) {
            let Some(url) = literal_url(link.as_str(), link.kind()) else {
                continue;
            };
            if link.start() > last {
                out.push(DocumentNode::text(&value[last..link.start()]));
            }
            out.push(DocumentNode::Link {
                url,
                title: None,
                children: vec![DocumentNode::text(link.as_str())],
            });
            last = link.end();
        }
        if last == 0 {
            out.push(DocumentNode::Text { value });
        } else if last < value.len() {
            out.push(DocumentNode::text(&value[last..]));
        }
    }
    out
}

fn literal_url(literal: &str, kind: &LinkKind) -> Option<String> {
    match kind {
        LinkKind::Email => Some(format!("mailto:{literal}")),
        LinkKind::Url if literal.starts_with("http://") || literal.starts_with("https://") => {
            Some(literal.to_string())
        }
        LinkKind::Url if literal.starts_with("www.") => Some(format!("http://{literal}")),
        _ => None,
    }
}

/// True when the raw source opens with seven or more unescaped `#`.
fn opens_with_deep_marker(raw: &str) -> bool {
    raw.chars().take_while(|&c| c == '#').count() >= 7
}

/// CommonMark stops ATX headings at six markers, so `####### H7` arrives as a
/// paragraph. Single-line paragraphs that open with seven or more markers and
/// whitespace are turned back into a heading of that depth.
fn lift_deep_heading(children: Vec<DocumentNode>) -> DocumentNode {
    let single_line = children.iter().all(|c| match c {
        DocumentNode::Text { value } => !value.contains('\n'),
        DocumentNode::Break => false,
        _ => true,
    });
    let marker = match children.first() {
        Some(DocumentNode::Text { value }) if single_line => deep_marker(value),
        _ => None,
    };
    let Some((level, rest)) = marker else {
        return DocumentNode::Paragraph { children };
    };

    let rest = if children.len() == 1 {
        strip_closing_sequence(rest)
    } else {
        rest
    };
    let mut lifted = Vec::with_capacity(children.len());
    if !rest.is_empty() {
        lifted.push(DocumentNode::text(rest));
    }
    lifted.extend(children.into_iter().skip(1));
    DocumentNode::Heading {
        level,
        children: lifted,
    }
}

/// Returns the marker count and the remaining text, or `None` if `text` does
/// not start with at least seven `#` followed by whitespace or end of line.
fn deep_marker(text: &str) -> Option<(u8, String)> {
    let hashes = text.chars().take_while(|&c| c == '#').count();
    if hashes < 7 {
        return None;
    }
    let rest = &text[hashes..];
    if !rest.is_empty() && !rest.starts_with([' ', '\t']) {
        return None;
    }
    let level = u8::try_from(hashes).unwrap_or(u8::MAX);
    Some((level, rest.trim_start().to_string()))
}

fn strip_closing_sequence(text: String) -> String {
    let trimmed = text.trim_end();
    let without = trimmed.trim_end_matches('#');
    if without.len() == trimmed.len() {
        return trimmed.to_string();
    }
    if without.is_empty() || without.ends_with([' ', '\t']) {
        without.trim_end().to_string()
    } else {
        trimmed.to_string()
    }
}
