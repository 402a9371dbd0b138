//! `data-pb-*` annotations written by authoring-mode serialization.
//!
//! A marked node carries its kind and its exact props, so both codecs can
//! restore it without guessing:
//!
//! ```html
//! <section data-pb-section data-pb-props='{"background":"#fff"}'>
//!   <div data-pb-column data-pb-props='{"width":"50%"}'>
//!     <h2 data-pb-element="heading" data-pb-props='{"tag":"h2","text":"Hi"}'>Hi</h2>
//!     <div data-pb-element="html" data-pb-markup><b>verbatim</b></div>
//!   </div>
//! </section>
//! ```
//!
//! Opaque elements keep their markup as the wrapper's inner HTML instead
//! of inside the JSON payload.

use crate::convert::ContentCodec;
use crate::dom::{DomDocument, DomElement, DomNode};
use crate::entities::escape_attr_single;
use crate::error::{MarkupError, MarkupResult};
use pagekit_document::{Column, Element, ElementKind, NodeFactory, Props, Section, SectionKind};
use serde_json::Value;
use tracing::debug;

pub const SECTION: &str = "data-pb-section";
pub const COLUMN: &str = "data-pb-column";
pub const ELEMENT: &str = "data-pb-element";
pub const PROPS: &str = "data-pb-props";
pub const MARKUP: &str = "data-pb-markup";

pub(crate) fn is_section(el: &DomElement) -> bool {
    el.has_attr(SECTION)
}

pub(crate) fn is_column(el: &DomElement) -> bool {
    el.has_attr(COLUMN)
}

pub(crate) fn is_element(el: &DomElement) -> bool {
    el.attr(ELEMENT).map_or(false, |kind| !kind.is_empty())
}

/// True for any node written with a marker attribute
pub(crate) fn is_marked(el: &DomElement) -> bool {
    is_section(el) || is_column(el) || el.has_attr(ELEMENT) || el.has_attr(PROPS)
}

/// Decoded `data-pb-props`, `None` when the attribute is absent
pub(crate) fn try_props(el: &DomElement) -> MarkupResult<Option<Props>> {
    let Some(raw) = el.attr(PROPS) else {
        return Ok(None);
    };
    match serde_json::from_str::<Value>(raw)? {
        Value::Object(props) => Ok(Some(props)),
        other => Err(MarkupError::invalid_marker(
            PROPS,
            format!("expected an object, found {}", other),
        )),
    }
}

/// Decoded `data-pb-props`; a malformed payload degrades to `fallback`
pub(crate) fn props_or(el: &DomElement, fallback: Props) -> Props {
    match try_props(el) {
        Ok(Some(props)) => props,
        Ok(None) => fallback,
        Err(err) => {
            debug!(tag = %el.tag, error = %err, "Ignoring malformed props marker");
            fallback
        }
    }
}

/// ` data-pb-props='…'`, or nothing for an empty bag
pub(crate) fn props_attr(props: &Props) -> String {
    if props.is_empty() {
        return String::new();
    }
    let json = serde_json::to_string(props).unwrap_or_else(|_| "{}".to_string());
    format!(" {}='{}'", PROPS, escape_attr_single(&json))
}

pub(crate) fn restore_section<C: ContentCodec + ?Sized>(
    codec: &C,
    doc: &DomDocument,
    el: &DomElement,
    factory: &mut NodeFactory,
) -> Section {
    let mut section = factory.create_section();
    section.props = props_or(el, Props::new());

    for child in el.element_children() {
        if is_column(child) {
            section.columns.push(restore_column(codec, doc, child, factory));
        } else {
            debug!(tag = %child.tag, "Skipping unmarked node between columns");
        }
    }
    section
}

fn restore_column<C: ContentCodec + ?Sized>(
    codec: &C,
    doc: &DomDocument,
    el: &DomElement,
    factory: &mut NodeFactory,
) -> Column {
    let mut column = factory.create_column("100%");
    column.props = props_or(el, column.props);

    for child in &el.children {
        match child {
            DomNode::Element(child) if is_element(child) => {
                column.elements.push(restore_element(codec, doc, child, factory));
            }
            other => column
                .elements
                .extend(codec.column_content(doc, other, factory)),
        }
    }
    column
}

fn restore_element<C: ContentCodec + ?Sized>(
    codec: &C,
    doc: &DomDocument,
    el: &DomElement,
    factory: &mut NodeFactory,
) -> Element {
    let kind = ElementKind::from(el.attr(ELEMENT).unwrap_or_default());
    let mut element = factory.create_element(kind);
    element.props = props_or(el, element.props);

    if element.kind.is_opaque() && el.has_attr(MARKUP) {
        element.props.insert(
            "originalHtml".to_string(),
            Value::from(doc.inner_html(el)),
        );
    }

    if element.kind.is_container() {
        let columns = el
            .element_children()
            .filter(|child| is_column(child))
            .map(|child| restore_column(codec, doc, child, factory))
            .collect();
        element.columns = Some(columns);
    }
    element
}

/// Global slot restored from a marked `<header>`/`<footer>`, `None` when
/// the element carries no usable props marker
pub(crate) fn restore_slot<C: ContentCodec + ?Sized>(
    codec: &C,
    doc: &DomDocument,
    el: &DomElement,
    kind: SectionKind,
    factory: &mut NodeFactory,
) -> Option<Section> {
    let props = match try_props(el) {
        Ok(Some(props)) => props,
        Ok(None) => return None,
        Err(err) => {
            debug!(tag = %el.tag, error = %err, "Ignoring malformed slot marker");
            return None;
        }
    };
    let mut slot = match kind {
        SectionKind::Footer => factory.footer(props),
        _ => factory.navbar(props),
    };
    slot.columns = el
        .element_children()
        .filter(|child| is_column(child))
        .map(|child| restore_column(codec, doc, child, factory))
        .collect();
    Some(slot)
}
