//! Lossless codec: every section keeps its markup verbatim as a single
//! opaque `html` element. Which top-level nodes count as sections is
//! decided exactly as in the semantic codec.

use crate::convert::ContentCodec;
use crate::dom::{DomDocument, DomElement, DomNode, DomText};
use crate::semantic::{footer_props, is_section_like, navbar_props};
use pagekit_document::{Element, ElementKind, NodeFactory, Section};
use serde_json::Value;
use tracing::debug;

pub(crate) struct Lossless;

impl Lossless {
    fn opaque(markup: &str, factory: &mut NodeFactory) -> Element {
        let mut element = factory.create_element(ElementKind::Html);
        element
            .props
            .insert("originalHtml".to_string(), Value::from(markup));
        element
    }

    fn opaque_section(markup: &str, factory: &mut NodeFactory) -> Section {
        let mut column = factory.create_column("100%");
        column.elements.push(Self::opaque(markup, factory));

        let mut section = factory.create_section();
        section.columns.push(column);
        section
    }
}

impl ContentCodec for Lossless {
    fn section(
        &self,
        doc: &DomDocument,
        el: &DomElement,
        factory: &mut NodeFactory,
    ) -> Option<Section> {
        is_section_like(el).then(|| Self::opaque_section(doc.outer_html(el), factory))
    }

    fn loose_text(
        &self,
        _doc: &DomDocument,
        text: &DomText,
        _factory: &mut NodeFactory,
    ) -> Option<Section> {
        debug!(offset = text.span.start, "Skipping loose top-level text");
        None
    }

    fn column_content(
        &self,
        doc: &DomDocument,
        node: &DomNode,
        factory: &mut NodeFactory,
    ) -> Vec<Element> {
        match node {
            DomNode::Element(el) => vec![Self::opaque(doc.outer_html(el), factory)],
            DomNode::Text(text) if !text.is_blank() => {
                vec![Self::opaque(doc.raw_text(text), factory)]
            }
            DomNode::Text(_) => Vec::new(),
        }
    }

    fn navbar(&self, doc: &DomDocument, el: &DomElement, factory: &mut NodeFactory) -> Section {
        let mut props = navbar_props(el);
        props.insert(
            "originalHtml".to_string(),
            Value::from(doc.outer_html(el)),
        );
        factory.navbar(props)
    }

    fn footer(&self, doc: &DomDocument, el: &DomElement, factory: &mut NodeFactory) -> Section {
        let mut props = footer_props(el);
        props.insert(
            "originalHtml".to_string(),
            Value::from(doc.outer_html(el)),
        );
        factory.footer(props)
    }
}
