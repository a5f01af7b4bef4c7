//! Markup documents
//!
//! A small element tree built from quick-xml events. Documents compare by
//! their canonical rendering: attributes sorted, whitespace-only text dropped,
//! children indented two spaces per level.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum MarkupError {
    #[error("Markup syntax error: {0}")]
    Syntax(String),

    #[error("Document has no root element")]
    Empty,

    #[error("Document has more than one root element")]
    MultipleRoots,

    #[error("Unbalanced closing tag </{0}>")]
    Unbalanced(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element(Element),
    Text(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub name: String,
    pub attributes: BTreeMap<String, String>,
    pub children: Vec<Node>,
}

impl Element {
    fn from_start(start: &BytesStart<'_>) -> Result<Self, MarkupError> {
        let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
        let mut attributes = BTreeMap::new();
        for attr in start.attributes() {
            let attr = attr.map_err(|e| MarkupError::Syntax(e.to_string()))?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let value = attr
                .unescape_value()
                .map_err(|e| MarkupError::Syntax(e.to_string()))?
                .into_owned();
            attributes.insert(key, value);
        }
        Ok(Element {
            name,
            attributes,
            children: Vec::new(),
        })
    }

    fn open_tag(&self) -> String {
        let mut tag = format!("<{}", self.name);
        for (key, value) in &self.attributes {
            tag.push_str(&format!(" {}=\"{}\"", key, escape(value, true)));
        }
        tag
    }

    fn render(&self, out: &mut String, depth: usize) {
        let indent = "  ".repeat(depth);
        out.push_str(&indent);
        out.push_str(&self.open_tag());

        if self.children.is_empty() {
            out.push_str("/>\n");
            return;
        }

        if self.children.iter().all(|c| matches!(c, Node::Text(_))) {
            out.push('>');
            for child in &self.children {
                if let Node::Text(text) = child {
                    out.push_str(&escape(text, false));
                }
            }
            out.push_str(&format!("</{}>\n", self.name));
            return;
        }

        out.push_str(">\n");
        for child in &self.children {
            match child {
                Node::Element(el) => el.render(out, depth + 1),
                Node::Text(text) => {
                    out.push_str(&"  ".repeat(depth + 1));
                    out.push_str(&escape(text, false));
                    out.push('\n');
                }
            }
        }
        out.push_str(&indent);
        out.push_str(&format!("</{}>\n", self.name));
    }

    fn render_compact(&self, out: &mut String) {
        out.push_str(&self.open_tag());
        if self.children.is_empty() {
            out.push_str("/>");
            return;
        }
        out.push('>');
        for child in &self.children {
            match child {
                Node::Element(el) => el.render_compact(out),
                Node::Text(text) => out.push_str(&escape(text, false)),
            }
        }
        out.push_str(&format!("</{}>", self.name));
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub root: Element,
}

impl Document {
    /// Parse a document. Insignificant whitespace between tags is discarded.
    pub fn parse(text: &str) -> Result<Self, MarkupError> {
        let mut reader = Reader::from_str(text);
        reader.trim_text(true);

        let mut stack: Vec<Element> = Vec::new();
        let mut root: Option<Element> = None;

        loop {
            let event = reader
                .read_event()
                .map_err(|e| MarkupError::Syntax(e.to_string()))?;
            match event {
                Event::Start(start) => stack.push(Element::from_start(&start)?),
                Event::Empty(start) => {
                    let element = Element::from_start(&start)?;
                    attach(&mut stack, &mut root, element)?;
                }
                Event::End(end) => {
                    let name = String::from_utf8_lossy(end.name().as_ref()).into_owned();
                    let element = stack.pop().ok_or_else(|| MarkupError::Unbalanced(name.clone()))?;
                    if element.name != name {
                        return Err(MarkupError::Unbalanced(name));
                    }
                    attach(&mut stack, &mut root, element)?;
                }
                Event::Text(text) => {
                    let text = text
                        .unescape()
                        .map_err(|e| MarkupError::Syntax(e.to_string()))?
                        .into_owned();
                    if let Some(parent) = stack.last_mut() {
                        parent.children.push(Node::Text(text));
                    }
                }
                Event::CData(data) => {
                    let text = String::from_utf8_lossy(&data.into_inner()).into_owned();
                    if let Some(parent) = stack.last_mut() {
                        parent.children.push(Node::Text(text));
                    }
                }
                Event::Eof => break,
                // Declarations, comments, processing instructions, doctypes
                _ => {}
            }
        }

        if let Some(open) = stack.pop() {
            return Err(MarkupError::Syntax(format!("Unclosed element <{}>", open.name)));
        }
        root.map(|root| Document { root }).ok_or(MarkupError::Empty)
    }

    /// Canonical multi-line rendering.
    pub fn to_pretty_string(&self) -> String {
        let mut out = String::from("<?xml version=\"1.0\"?>\n");
        self.root.render(&mut out, 0);
        out
    }

    /// Canonical single-line rendering of the root element.
    pub fn to_compact_string(&self) -> String {
        let mut out = String::new();
        self.root.render_compact(&mut out);
        out
    }
}

fn attach(
    stack: &mut [Element],
    root: &mut Option<Element>,
    element: Element,
) -> Result<(), MarkupError> {
    match stack.last_mut() {
        Some(parent) => {
            parent.children.push(Node::Element(element));
            Ok(())
        }
        None if root.is_none() => {
            *root = Some(element);
            Ok(())
        }
        None => Err(MarkupError::MultipleRoots),
    }
}

fn escape(text: &str, attribute: bool) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if attribute => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out
}
