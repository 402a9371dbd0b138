//! Forgiving markup tree builder.
//!
//! Never fails: unclosed elements are closed where their parent ends, stray
//! closing tags are ignored, and anything the lexer cannot make sense of is
//! kept as text. Every element remembers its exact source span so the
//! lossless codec can hand back the author's markup byte for byte.

use crate::entities;
use crate::lexer::{close_tag_name, OpenTag, Token};
use logos::Logos;
use std::ops::Range;

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param",
    "source", "track", "wbr",
];

/// Elements whose content is raw text and is never tokenized
const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style", "textarea", "title"];

/// Elements excluded from every traversal
const INERT_ELEMENTS: &[&str] = &["script", "style", "template", "noscript"];

pub fn is_void(tag: &str) -> bool {
    VOID_ELEMENTS.contains(&tag)
}

pub fn is_inert(tag: &str) -> bool {
    INERT_ELEMENTS.contains(&tag)
}

#[derive(Debug, Clone, PartialEq)]
pub enum DomNode {
    Element(DomElement),
    Text(DomText),
}

#[derive(Debug, Clone, PartialEq)]
pub struct DomText {
    /// Decoded text
    pub text: String,
    pub span: Range<usize>,
}

impl DomText {
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DomElement {
    pub tag: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<DomNode>,
    /// Open tag start to close tag end
    pub span: Range<usize>,
    /// Open tag end to close tag start
    pub inner: Range<usize>,
}

impl DomElement {
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.attributes.iter().any(|(key, _)| key == name)
    }

    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.attr("class").unwrap_or("").split_ascii_whitespace()
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes().any(|c| c == class)
    }

    pub fn is_heading(&self) -> bool {
        matches!(self.tag.as_str(), "h1" | "h2" | "h3" | "h4" | "h5" | "h6")
    }

    pub fn element_children(&self) -> impl Iterator<Item = &DomElement> {
        self.children.iter().filter_map(|child| match child {
            DomNode::Element(el) if !is_inert(&el.tag) => Some(el),
            _ => None,
        })
    }

    pub fn has_element_children(&self) -> bool {
        self.element_children().next().is_some()
    }

    /// Visible text with whitespace collapsed; script/style content excluded
    pub fn text_content(&self) -> String {
        let mut raw = String::new();
        collect_text(self, &mut raw);
        raw.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    /// First descendant (pre-order, self excluded) matching `predicate`
    pub fn find(&self, predicate: &dyn Fn(&DomElement) -> bool) -> Option<&DomElement> {
        for child in self.element_children() {
            if predicate(child) {
                return Some(child);
            }
            if let Some(found) = child.find(predicate) {
                return Some(found);
            }
        }
        None
    }

    /// Every descendant (pre-order, self excluded) matching `predicate`
    pub fn find_all<'a>(&'a self, predicate: &dyn Fn(&DomElement) -> bool) -> Vec<&'a DomElement> {
        let mut out = Vec::new();
        self.find_all_into(predicate, &mut out);
        out
    }

    fn find_all_into<'a>(
        &'a self,
        predicate: &dyn Fn(&DomElement) -> bool,
        out: &mut Vec<&'a DomElement>,
    ) {
        for child in self.element_children() {
            if predicate(child) {
                out.push(child);
            }
            child.find_all_into(predicate, out);
        }
    }

    pub fn contains(&self, predicate: &dyn Fn(&DomElement) -> bool) -> bool {
        self.find(predicate).is_some()
    }
}

fn collect_text(element: &DomElement, out: &mut String) {
    for child in &element.children {
        match child {
            DomNode::Text(text) => {
                out.push_str(&text.text);
                out.push(' ');
            }
            DomNode::Element(el) if !is_inert(&el.tag) => collect_text(el, out),
            DomNode::Element(_) => {}
        }
    }
}

/// Parsed markup plus the source it was parsed from
#[derive(Debug, Clone)]
pub struct DomDocument<'src> {
    pub source: &'src str,
    pub children: Vec<DomNode>,
    /// Every element was closed by its own close tag (or is void or
    /// self-closing), no close tag was stray and no comment ran off the
    /// end. Balanced markup parses the same wherever it is embedded.
    pub balanced: bool,
}

impl<'src> DomDocument<'src> {
    pub fn parse(source: &'src str) -> Self {
        TreeBuilder::new(source).build()
    }

    /// Markup of the element exactly as written
    pub fn outer_html(&self, element: &DomElement) -> &'src str {
        self.source.get(element.span.clone()).unwrap_or("")
    }

    /// Markup between the element's open and close tags, exactly as written
    pub fn inner_html(&self, element: &DomElement) -> &'src str {
        self.source.get(element.inner.clone()).unwrap_or("")
    }

    pub fn raw_text(&self, text: &DomText) -> &'src str {
        self.source.get(text.span.clone()).unwrap_or("")
    }

    /// Content root: `<body>` if present, else `<html>` minus `<head>`,
    /// else the top level.
    pub fn content(&self) -> Vec<&DomNode> {
        if let Some(body) = find_tag(&self.children, "body") {
            return body.children.iter().collect();
        }
        if let Some(html) = find_tag(&self.children, "html") {
            return html
                .children
                .iter()
                .filter(|node| !matches!(node, DomNode::Element(el) if el.tag == "head"))
                .collect();
        }
        self.children
            .iter()
            .filter(|node| !matches!(node, DomNode::Element(el) if el.tag == "head"))
            .collect()
    }
}

fn find_tag<'a>(nodes: &'a [DomNode], tag: &str) -> Option<&'a DomElement> {
    for node in nodes {
        if let DomNode::Element(el) = node {
            if el.tag == tag {
                return Some(el);
            }
            if let Some(found) = find_tag(&el.children, tag) {
                return Some(found);
            }
        }
    }
    None
}

struct TreeBuilder<'src> {
    source: &'src str,
    stack: Vec<DomElement>,
    roots: Vec<DomNode>,
    balanced: bool,
}

impl<'src> TreeBuilder<'src> {
    fn new(source: &'src str) -> Self {
        Self {
            source,
            stack: Vec::new(),
            roots: Vec::new(),
            balanced: true,
        }
    }

    fn build(mut self) -> DomDocument<'src> {
        let mut lexer = Token::lexer(self.source);

        while let Some(token) = lexer.next() {
            let span = lexer.span();
            match token {
                Ok(Token::OpenTag(slice)) => {
                    let tag = OpenTag::parse(slice);
                    let raw_text = RAW_TEXT_ELEMENTS.contains(&tag.name.as_str());
                    let closes_itself = tag.self_closing || is_void(&tag.name);
                    self.open(tag, span.clone(), closes_itself);

                    if raw_text && !closes_itself {
                        // Skip to the matching close tag without tokenizing
                        let name = self.stack.last().map(|el| el.tag.clone()).unwrap_or_default();
                        let needle = format!("</{}", name);
                        let remainder = lexer.remainder();
                        let len = remainder
                            .to_ascii_lowercase()
                            .find(&needle)
                            .unwrap_or(remainder.len());
                        if len > 0 {
                            self.text(&remainder[..len], span.end..span.end + len);
                            lexer.bump(len);
                        }
                    }
                }
                Ok(Token::CloseTag(slice)) => self.close(&close_tag_name(slice), span),
                Ok(Token::Text(slice)) | Ok(Token::StrayAngle(slice)) => self.text(slice, span),
                Ok(Token::Comment(slice)) => {
                    if !slice.ends_with("-->") {
                        self.balanced = false;
                    }
                }
                Ok(Token::Doctype(_))
                | Ok(Token::ProcessingInstruction(_)) => {}
                Err(_) => {
                    let source = self.source;
                    let slice = &source[span.clone()];
                    tracing::trace!(offset = span.start, "Unrecognized markup kept as text");
                    self.text(slice, span);
                }
            }
        }

        while !self.stack.is_empty() {
            self.pop_implicit();
        }

        DomDocument {
            source: self.source,
            children: self.roots,
            balanced: self.balanced,
        }
    }

    fn open(&mut self, tag: OpenTag, span: Range<usize>, closes_itself: bool) {
        // A new paragraph or list item implicitly closes an open one
        if matches!(tag.name.as_str(), "p" | "li") {
            if let Some(top) = self.stack.last() {
                if top.tag == tag.name {
                    self.pop_implicit();
                }
            }
        }

        let element = DomElement {
            tag: tag.name,
            attributes: tag.attributes,
            children: Vec::new(),
            span: span.clone(),
            inner: span.end..span.end,
        };

        if closes_itself {
            self.append(DomNode::Element(element));
        } else {
            self.stack.push(element);
        }
    }

    fn close(&mut self, name: &str, span: Range<usize>) {
        let Some(depth) = self.stack.iter().rposition(|el| el.tag == name) else {
            tracing::trace!(tag = %name, offset = span.start, "Ignoring stray close tag");
            self.balanced = false;
            return;
        };

        while self.stack.len() > depth + 1 {
            self.pop_implicit();
        }
        if let Some(mut element) = self.stack.pop() {
            element.inner.end = span.start;
            element.span.end = span.end;
            self.append(DomNode::Element(element));
        }
    }

    /// Close the innermost open element where its content ends
    fn pop_implicit(&mut self) {
        if let Some(mut element) = self.stack.pop() {
            self.balanced = false;
            let end = last_child_end(&element).unwrap_or(element.inner.start);
            element.inner.end = end;
            element.span.end = end;
            self.append(DomNode::Element(element));
        }
    }

    fn text(&mut self, slice: &str, span: Range<usize>) {
        let source = self.source;
        // Merge with a preceding text node (e.g. text split by a stray '<')
        let siblings = match self.stack.last_mut() {
            Some(parent) => &mut parent.children,
            None => &mut self.roots,
        };
        if let Some(DomNode::Text(previous)) = siblings.last_mut() {
            if previous.span.end == span.start {
                previous.span.end = span.end;
                previous.text = entities::decode(&source[previous.span.clone()]);
                return;
            }
        }
        siblings.push(DomNode::Text(DomText {
            text: entities::decode(slice),
            span,
        }));
    }

    fn append(&mut self, node: DomNode) {
        match self.stack.last_mut() {
            Some(parent) => parent.children.push(node),
            None => self.roots.push(node),
        }
    }
}

fn last_child_end(element: &DomElement) -> Option<usize> {
    element.children.last().map(|child| match child {
        DomNode::Element(el) => el.span.end,
        DomNode::Text(text) => text.span.end,
    })
}
