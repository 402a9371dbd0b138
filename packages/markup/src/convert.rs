//! Top-level walk shared by both codecs.
//!
//! The walk decides what each top-level node is (global slot, marked
//! section, candidate section, ignorable); the codec decides what a
//! candidate section turns into.

use crate::dom::{DomDocument, DomElement, DomNode, DomText};
use crate::markers;
use crate::ParsedMarkup;
use pagekit_document::{Element, NodeFactory, Section, SectionKind};
use tracing::{debug, trace};

/// Tags never visited by either codec
const SKIPPED: &[&str] = &[
    "script", "style", "template", "noscript", "link", "meta", "title", "head", "base",
];

pub(crate) fn is_skipped(tag: &str) -> bool {
    SKIPPED.contains(&tag)
}

/// What a codec does with content the markers do not describe
pub(crate) trait ContentCodec {
    /// Section for an unmarked top-level element, `None` to skip it
    fn section(
        &self,
        doc: &DomDocument,
        el: &DomElement,
        factory: &mut NodeFactory,
    ) -> Option<Section>;

    /// Section for non-blank top-level text, `None` to skip it
    fn loose_text(
        &self,
        doc: &DomDocument,
        text: &DomText,
        factory: &mut NodeFactory,
    ) -> Option<Section>;

    /// Elements for unmarked content met inside a marked column
    fn column_content(
        &self,
        doc: &DomDocument,
        node: &DomNode,
        factory: &mut NodeFactory,
    ) -> Vec<Element>;

    fn navbar(&self, doc: &DomDocument, el: &DomElement, factory: &mut NodeFactory) -> Section;

    fn footer(&self, doc: &DomDocument, el: &DomElement, factory: &mut NodeFactory) -> Section;
}

pub(crate) fn convert<C: ContentCodec>(
    codec: &C,
    source: &str,
    factory: &mut NodeFactory,
) -> ParsedMarkup {
    let doc = DomDocument::parse(source);
    let mut out = ParsedMarkup::default();
    let content = doc.content();
    visit(codec, &doc, &content, factory, &mut out);
    out
}

fn visit<C: ContentCodec>(
    codec: &C,
    doc: &DomDocument,
    nodes: &[&DomNode],
    factory: &mut NodeFactory,
    out: &mut ParsedMarkup,
) {
    for node in nodes {
        match node {
            DomNode::Text(text) if text.is_blank() => {}
            DomNode::Text(text) => {
                if let Some(section) = codec.loose_text(doc, text, factory) {
                    out.sections.push(section);
                }
            }
            DomNode::Element(el) => top_level(codec, doc, el, factory, out),
        }
    }
}

fn top_level<C: ContentCodec>(
    codec: &C,
    doc: &DomDocument,
    el: &DomElement,
    factory: &mut NodeFactory,
    out: &mut ParsedMarkup,
) {
    match el.tag.as_str() {
        tag if is_skipped(tag) => trace!(tag, "Skipping non-content node"),
        "main" if !markers::is_marked(el) => {
            let children: Vec<&DomNode> = el.children.iter().collect();
            visit(codec, doc, &children, factory, out);
        }
        "header" if out.global_navbar.is_none() && !markers::is_section(el) => {
            let navbar = markers::restore_slot(codec, doc, el, SectionKind::Navbar, factory)
                .unwrap_or_else(|| codec.navbar(doc, el, factory));
            out.global_navbar = Some(navbar);
        }
        "footer" if out.global_footer.is_none() && !markers::is_section(el) => {
            let footer = markers::restore_slot(codec, doc, el, SectionKind::Footer, factory)
                .unwrap_or_else(|| codec.footer(doc, el, factory));
            out.global_footer = Some(footer);
        }
        _ if markers::is_section(el) => {
            out.sections
                .push(markers::restore_section(codec, doc, el, factory));
        }
        _ => match codec.section(doc, el, factory) {
            Some(section) => out.sections.push(section),
            None => debug!(tag = %el.tag, "Skipping top-level node that is not section-like"),
        },
    }
}
