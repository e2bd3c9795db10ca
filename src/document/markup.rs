//! HTML-like markup for paged documents
//!
//! Pages render as `<div class="page-node" pagenumber="N">` holding one
//! element per block: `<p>`, `<h1>`..`<h6>` or
//! `<li data-marker="bullet|N" data-indent="K">`. Line breaks inside a block
//! are `<br>`. Unknown inline tags are dropped and their text is kept.

use super::{BlockKind, Document, ListMarker};
use crate::error::{PaginationError, Result};
use crate::pagination::{PageAttrs, PAGE_CLASS};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::borrow::Cow;
use std::fmt::Write;

const ATTR_MARKER: &str = "data-marker";
const ATTR_INDENT: &str = "data-indent";

/// Tag name of the element rendering a block
fn block_tag(kind: &BlockKind) -> Cow<'static, str> {
    match kind {
        BlockKind::Paragraph => Cow::Borrowed("p"),
        BlockKind::Heading { level } => Cow::Owned(format!("h{}", level)),
        BlockKind::ListItem { .. } => Cow::Borrowed("li"),
    }
}

fn write_escaped_text(out: &mut String, text: &str) {
    for (i, line) in text.split('\n').enumerate() {
        if i > 0 {
            out.push_str("<br>");
        }
        out.push_str(&html_escape::encode_text(line));
    }
}

impl Document {
    /// Serialize the document to page markup
    pub fn to_markup(&self) -> String {
        let mut out = String::with_capacity(self.content_size() * 2);
        for page in &self.pages {
            let _ = write!(out, "<div class=\"{}\"", PAGE_CLASS);
            for (name, value) in page.attrs.to_markup_attrs() {
                let _ = write!(
                    out,
                    " {}=\"{}\"",
                    name,
                    html_escape::encode_double_quoted_attribute(&value)
                );
            }
            out.push('>');

            for block in &page.blocks {
                let tag = block_tag(&block.kind);
                let _ = write!(out, "<{}", tag);
                if let BlockKind::ListItem {
                    indent_level,
                    marker,
                } = &block.kind
                {
                    let marker = match marker {
                        ListMarker::Bullet => Cow::Borrowed("bullet"),
                        ListMarker::Numbered { ordinal } => Cow::Owned(ordinal.to_string()),
                    };
                    let _ = write!(
                        out,
                        " {}=\"{}\" {}=\"{}\"",
                        ATTR_MARKER, marker, ATTR_INDENT, indent_level
                    );
                }
                out.push('>');
                write_escaped_text(&mut out, &block.text);
                let _ = write!(out, "</{}>", tag);
            }

            out.push_str("</div>");
        }
        out
    }

    /// Parse page markup.
    ///
    /// Blocks outside any page are wrapped into a page of their own, a page
    /// without blocks gets one empty paragraph, and empty input yields the
    /// default document.
    pub fn from_markup(input: &str) -> Result<Self> {
        let mut reader = Reader::from_str(input);
        // void elements such as <br> never close
        reader.config_mut().check_end_names = false;

        let mut builder = Builder::default();
        loop {
            let offset = reader.buffer_position() as usize;
            let event = match reader.read_event() {
                Ok(event) => event,
                Err(err) => {
                    let at = reader.error_position() as usize;
                    return Err(PaginationError::markup(at, err.to_string()));
                }
            };
            match event {
                Event::Start(start) => builder.open(offset, Tag::parse(&start, offset)?)?,
                Event::Empty(start) => {
                    let tag = Tag::parse(&start, offset)?;
                    let name = tag.name.clone();
                    builder.open(offset, tag)?;
                    if name != "br" {
                        builder.close(offset, &name)?;
                    }
                }
                Event::End(end) => builder.close(offset, &tag_name(end.name().as_ref(), offset)?)?,
                Event::Text(text) => {
                    let raw = utf8(&text, offset)?;
                    builder.text(&html_escape::decode_html_entities(raw));
                }
                Event::CData(data) => builder.text(utf8(&data, offset)?),
                Event::Eof => break,
                // comments, declarations, doctype
                _ => {}
            }
        }
        builder.finish(input.len())
    }
}

fn utf8(bytes: &[u8], offset: usize) -> Result<&str> {
    std::str::from_utf8(bytes).map_err(|_| PaginationError::markup(offset, "invalid UTF-8"))
}

fn tag_name(raw: &[u8], offset: usize) -> Result<String> {
    Ok(utf8(raw, offset)?.to_ascii_lowercase())
}

/// An opening tag with its attributes decoded
struct Tag {
    name: String,
    attrs: Vec<(String, String)>,
}

impl Tag {
    fn parse(start: &BytesStart<'_>, offset: usize) -> Result<Self> {
        let name = tag_name(start.name().as_ref(), offset)?;
        let mut attrs = Vec::new();
        // html rules: unquoted values and bare names are allowed
        for attr in start.html_attributes() {
            let attr = attr.map_err(|err| PaginationError::markup(offset, err.to_string()))?;
            let key = utf8(attr.key.as_ref(), offset)?.to_ascii_lowercase();
            let value = html_escape::decode_html_entities(utf8(&attr.value, offset)?).into_owned();
            attrs.push((key, value));
        }
        Ok(Self { name, attrs })
    }

    fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    fn is_page(&self) -> bool {
        self.name == "div"
            && self
                .attr("class")
                .is_some_and(|class| class.split_whitespace().any(|c| c == PAGE_CLASS))
    }
}

/// Block kind for a block tag, `None` for anything else
fn block_kind(name: &str, tag: Option<&Tag>) -> Option<BlockKind> {
    match name {
        "p" => Some(BlockKind::Paragraph),
        "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
            let level = name[1..].parse().unwrap_or(1);
            Some(BlockKind::heading(level))
        }
        "li" => {
            let marker = match tag.and_then(|t| t.attr(ATTR_MARKER)).map(str::trim) {
                Some(value) => value
                    .parse()
                    .map(|ordinal| ListMarker::Numbered { ordinal })
                    .unwrap_or(ListMarker::Bullet),
                None => ListMarker::Bullet,
            };
            let indent_level = tag
                .and_then(|t| t.attr(ATTR_INDENT))
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(0);
            Some(BlockKind::ListItem {
                indent_level,
                marker,
            })
        }
        _ => None,
    }
}

struct OpenPage {
    attrs: PageAttrs,
    blocks: Vec<(BlockKind, String)>,
    /// Opened for top-level blocks rather than by a page element
    implicit: bool,
    /// Plain `<div>`s open inside the page
    nested_divs: usize,
}

struct OpenBlock {
    tag: String,
    kind: BlockKind,
    text: String,
}

#[derive(Default)]
struct Builder {
    doc: Option<Document>,
    page: Option<OpenPage>,
    block: Option<OpenBlock>,
    /// Plain `<div>`s open outside any page
    outer_divs: usize,
}

impl Builder {
    fn doc(&mut self) -> &mut Document {
        self.doc.get_or_insert_with(Document::empty)
    }

    fn page_is_explicit(&self) -> bool {
        self.page.as_ref().is_some_and(|page| !page.implicit)
    }

    fn open_page(&mut self, attrs: PageAttrs, implicit: bool) {
        self.page = Some(OpenPage {
            attrs,
            blocks: Vec::new(),
            implicit,
            nested_divs: 0,
        });
    }

    fn close_page(&mut self) {
        if let Some(page) = self.page.take() {
            self.doc().push_page(page.attrs, page.blocks);
        }
    }

    /// Page for a top-level block, opening an implicit one if needed
    fn ensure_page(&mut self) {
        if self.page.is_none() {
            let ordinal = self.doc.as_ref().map_or(0, Document::page_count) as u32 + 1;
            self.open_page(PageAttrs::numbered(ordinal), true);
        }
    }

    fn open(&mut self, offset: usize, tag: Tag) -> Result<()> {
        if tag.is_page() {
            if self.block.is_some() {
                return Err(PaginationError::markup(offset, "page inside a block"));
            }
            if self.page_is_explicit() {
                return Err(PaginationError::markup(offset, "nested page"));
            }
            self.close_page();
            let attrs =
                PageAttrs::from_markup_attrs(tag.attrs.iter().map(|(n, v)| (n.as_str(), v.as_str())));
            self.open_page(attrs, false);
        } else if let Some(kind) = block_kind(&tag.name, Some(&tag)) {
            if let Some(open) = &self.block {
                let message = format!("<{}> inside <{}>", tag.name, open.tag);
                return Err(PaginationError::markup(offset, message));
            }
            self.ensure_page();
            self.block = Some(OpenBlock {
                tag: tag.name,
                kind,
                text: String::new(),
            });
        } else if tag.name == "br" {
            if let Some(block) = &mut self.block {
                block.text.push('\n');
            }
        } else if tag.name == "div" {
            match &mut self.page {
                Some(page) if !page.implicit => page.nested_divs += 1,
                _ => self.outer_divs += 1,
            }
        }
        Ok(())
    }

    fn close(&mut self, offset: usize, name: &str) -> Result<()> {
        if self.block.as_ref().is_some_and(|b| b.tag == name) {
            if let Some(block) = self.block.take() {
                self.ensure_page();
                if let Some(page) = &mut self.page {
                    page.blocks.push((block.kind, block.text));
                }
            }
        } else if name == "div" {
            if let Some(open) = &self.block {
                let message = format!("</div> closes unterminated <{}>", open.tag);
                return Err(PaginationError::markup(offset, message));
            }
            if self.page_is_explicit() {
                let nested = self.page.as_ref().map_or(0, |page| page.nested_divs);
                if nested == 0 {
                    self.close_page();
                } else if let Some(page) = &mut self.page {
                    page.nested_divs -= 1;
                }
            } else if self.outer_divs > 0 {
                self.outer_divs -= 1;
            } else {
                return Err(PaginationError::markup(offset, "unexpected </div>"));
            }
        } else if block_kind(name, None).is_some() {
            return Err(PaginationError::markup(offset, format!("unexpected </{}>", name)));
        }
        Ok(())
    }

    fn text(&mut self, text: &str) {
        match &mut self.block {
            Some(block) => block.text.push_str(text),
            None if text.trim().is_empty() => {}
            None => {
                self.ensure_page();
                if let Some(page) = &mut self.page {
                    page.blocks
                        .push((BlockKind::Paragraph, text.trim().to_string()));
                }
            }
        }
    }

    fn finish(mut self, end: usize) -> Result<Document> {
        if let Some(block) = &self.block {
            return Err(PaginationError::markup(end, format!("unclosed <{}>", block.tag)));
        }
        if self.page_is_explicit() {
            return Err(PaginationError::markup(end, "unclosed page"));
        }
        self.close_page();
        Ok(self.doc.unwrap_or_default())
    }
}
