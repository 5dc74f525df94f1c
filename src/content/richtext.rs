//! CMS rich text: block model and HTML serialisation
//!
//! Span offsets count UTF-16 code units, as the CMS produces them.

use serde::{Deserialize, Serialize};

use crate::helpers::{html_escape, image_tag, link_open_tag};

/// One block of structured text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum RichTextBlock {
    #[serde(rename = "paragraph")]
    Paragraph(TextBlock),
    #[serde(rename = "heading1")]
    Heading1(TextBlock),
    #[serde(rename = "heading2")]
    Heading2(TextBlock),
    #[serde(rename = "heading3")]
    Heading3(TextBlock),
    #[serde(rename = "heading4")]
    Heading4(TextBlock),
    #[serde(rename = "heading5")]
    Heading5(TextBlock),
    #[serde(rename = "heading6")]
    Heading6(TextBlock),
    #[serde(rename = "preformatted")]
    Preformatted(TextBlock),
    #[serde(rename = "list-item")]
    ListItem(TextBlock),
    #[serde(rename = "o-list-item")]
    OrderedListItem(TextBlock),
    #[serde(rename = "image")]
    Image(ImageBlock),
    #[serde(rename = "embed")]
    Embed(EmbedBlock),
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TextBlock {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub spans: Vec<Span>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageBlock {
    pub url: String,
    #[serde(default)]
    pub alt: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbedBlock {
    #[serde(default)]
    pub oembed: OEmbed,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OEmbed {
    #[serde(default)]
    pub embed_url: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub provider_name: Option<String>,
    #[serde(default)]
    pub html: Option<String>,
}

/// Inline formatting over `[start, end)` of a text block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub data: serde_json::Value,
}

/// Typed view of a span's kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpanKind<'a> {
    Strong,
    Em,
    Hyperlink {
        url: &'a str,
        target: Option<&'a str>,
    },
    Label(&'a str),
    Unknown,
}

impl Span {
    pub fn kind(&self) -> SpanKind<'_> {
        match self.kind.as_str() {
            "strong" => SpanKind::Strong,
            "em" => SpanKind::Em,
            "hyperlink" => match self.data.get("url").and_then(|v| v.as_str()) {
                Some(url) => SpanKind::Hyperlink {
                    url,
                    target: self.data.get("target").and_then(|v| v.as_str()),
                },
                None => SpanKind::Unknown,
            },
            "label" => match self.data.get("label").and_then(|v| v.as_str()) {
                Some(label) => SpanKind::Label(label),
                None => SpanKind::Unknown,
            },
            _ => SpanKind::Unknown,
        }
    }

    fn open_tag(&self) -> String {
        match self.kind() {
            SpanKind::Strong => "<strong>".to_string(),
            SpanKind::Em => "<em>".to_string(),
            SpanKind::Hyperlink { url, target } => link_open_tag(url, target),
            SpanKind::Label(label) => format!(r#"<span class="{}">"#, html_escape(label)),
            SpanKind::Unknown => String::new(),
        }
    }

    fn close_tag(&self) -> &'static str {
        match self.kind() {
            SpanKind::Strong => "</strong>",
            SpanKind::Em => "</em>",
            SpanKind::Hyperlink { .. } => "</a>",
            SpanKind::Label(_) => "</span>",
            SpanKind::Unknown => "",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ListKind {
    Unordered,
    Ordered,
}

impl ListKind {
    fn open(self) -> &'static str {
        match self {
            ListKind::Unordered => "<ul>",
            ListKind::Ordered => "<ol>",
        }
    }

    fn close(self) -> &'static str {
        match self {
            ListKind::Unordered => "</ul>",
            ListKind::Ordered => "</ol>",
        }
    }
}

impl RichTextBlock {
    /// The text of a text-bearing block
    pub fn text_block(&self) -> Option<&TextBlock> {
        match self {
            RichTextBlock::Paragraph(b)
            | RichTextBlock::Heading1(b)
            | RichTextBlock::Heading2(b)
            | RichTextBlock::Heading3(b)
            | RichTextBlock::Heading4(b)
            | RichTextBlock::Heading5(b)
            | RichTextBlock::Heading6(b)
            | RichTextBlock::Preformatted(b)
            | RichTextBlock::ListItem(b)
            | RichTextBlock::OrderedListItem(b) => Some(b),
            _ => None,
        }
    }

    pub fn text(&self) -> &str {
        self.text_block().map(|b| b.text.as_str()).unwrap_or("")
    }

    fn list_kind(&self) -> Option<ListKind> {
        match self {
            RichTextBlock::ListItem(_) => Some(ListKind::Unordered),
            RichTextBlock::OrderedListItem(_) => Some(ListKind::Ordered),
            _ => None,
        }
    }

    fn to_html(&self) -> String {
        let wrap = |tag: &str, block: &TextBlock| {
            format!("<{tag}>{}</{tag}>", render_spans(&block.text, &block.spans))
        };

        match self {
            RichTextBlock::Paragraph(b) => wrap("p", b),
            RichTextBlock::Heading1(b) => wrap("h1", b),
            RichTextBlock::Heading2(b) => wrap("h2", b),
            RichTextBlock::Heading3(b) => wrap("h3", b),
            RichTextBlock::Heading4(b) => wrap("h4", b),
            RichTextBlock::Heading5(b) => wrap("h5", b),
            RichTextBlock::Heading6(b) => wrap("h6", b),
            RichTextBlock::Preformatted(b) => wrap("pre", b),
            RichTextBlock::ListItem(b) | RichTextBlock::OrderedListItem(b) => wrap("li", b),
            RichTextBlock::Image(img) => format!(
                r#"<p class="block-img">{}</p>"#,
                image_tag(&img.url, img.alt.as_deref())
            ),
            RichTextBlock::Embed(embed) => {
                let oembed = &embed.oembed;
                let provider = oembed
                    .provider_name
                    .as_deref()
                    .map(|p| format!(r#" data-oembed-provider="{}""#, html_escape(&p.to_lowercase())))
                    .unwrap_or_default();
                format!(
                    r#"<div data-oembed="{}" data-oembed-type="{}"{}>{}</div>"#,
                    html_escape(&oembed.embed_url),
                    html_escape(&oembed.kind),
                    provider,
                    oembed.html.as_deref().unwrap_or("")
                )
            }
            RichTextBlock::Unknown => String::new(),
        }
    }
}

/// Serialise rich text to HTML
///
/// Consecutive list items are grouped into one `<ul>` or `<ol>`.
pub fn as_html(blocks: &[RichTextBlock]) -> String {
    let mut out = String::new();
    let mut open_list: Option<ListKind> = None;

    for block in blocks {
        let kind = block.list_kind();
        if kind != open_list {
            if let Some(list) = open_list {
                out.push_str(list.close());
            }
            if let Some(list) = kind {
                out.push_str(list.open());
            }
            open_list = kind;
        }
        out.push_str(&block.to_html());
    }

    if let Some(list) = open_list {
        out.push_str(list.close());
    }

    out
}

/// Plain text of all blocks, separated by spaces
pub fn as_text(blocks: &[RichTextBlock]) -> String {
    blocks
        .iter()
        .filter_map(RichTextBlock::text_block)
        .map(|b| b.text.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Apply spans to a text, escaping it along the way
///
/// Spans that end while an inner span is still open are closed together
/// with it and the inner one is reopened, so tags always nest.
fn render_spans(text: &str, spans: &[Span]) -> String {
    let mut spans: Vec<&Span> = spans
        .iter()
        .filter(|s| s.start < s.end && s.kind() != SpanKind::Unknown)
        .collect();
    // outer spans first when they start together
    spans.sort_by(|a, b| a.start.cmp(&b.start).then(b.end.cmp(&a.end)));

    let mut out = String::with_capacity(text.len());
    let mut open: Vec<&Span> = Vec::new();
    let mut next = 0;
    let mut pos = 0;

    for ch in text.chars() {
        close_spans_ending_at(&mut out, &mut open, pos);

        while next < spans.len() && spans[next].start <= pos {
            let span = spans[next];
            if span.end > pos {
                out.push_str(&span.open_tag());
                open.push(span);
            }
            next += 1;
        }

        push_escaped(&mut out, ch);
        pos += ch.len_utf16();
    }

    for span in open.iter().rev() {
        out.push_str(span.close_tag());
    }

    out
}

fn close_spans_ending_at<'a>(out: &mut String, open: &mut Vec<&'a Span>, pos: usize) {
    let mut reopen = Vec::new();
    while open.iter().any(|s| s.end <= pos) {
        let Some(span) = open.pop() else { break };
        out.push_str(span.close_tag());
        if span.end > pos {
            reopen.push(span);
        }
    }
    for span in reopen.into_iter().rev() {
        out.push_str(&span.open_tag());
        open.push(span);
    }
}

fn push_escaped(out: &mut String, ch: char) {
    match ch {
        '&' => out.push_str("&amp;"),
        '<' => out.push_str("&lt;"),
        '>' => out.push_str("&gt;"),
        '"' => out.push_str("&quot;"),
        '\'' => out.push_str("&#39;"),
        '\n' => out.push_str("<br />"),
        _ => out.push(ch),
    }
}
