//! Node creation: default props per element kind plus id stamping.

use crate::id_generator::IdGenerator;
use crate::model::{
    Column, ColumnKind, Document, Element, ElementKind, Node, Page, Props, Section, SectionKind,
    BASELINE_VERSION, GLOBAL_FOOTER_ID, GLOBAL_NAVBAR_ID,
};
use crate::walk::walk;
use serde_json::{json, Value};
use std::collections::HashMap;

/// Human-readable column width, e.g. `50%` or `33.33%`
pub fn width_label(percent: f64) -> String {
    if percent.fract().abs() < f64::EPSILON {
        format!("{:.0}%", percent)
    } else {
        let label = format!("{:.2}", percent);
        format!("{}%", label.trim_end_matches('0').trim_end_matches('.'))
    }
}

fn object(value: Value) -> Props {
    match value {
        Value::Object(map) => map,
        _ => Props::new(),
    }
}

fn builtin_defaults() -> HashMap<ElementKind, Props> {
    let mut defaults = HashMap::new();
    defaults.insert(
        ElementKind::Heading,
        object(json!({ "text": "Heading", "tag": "h2" })),
    );
    defaults.insert(ElementKind::Text, object(json!({ "text": "" })));
    defaults.insert(ElementKind::Image, object(json!({ "src": "", "alt": "" })));
    defaults.insert(
        ElementKind::Button,
        object(json!({ "text": "Click here", "link": "" })),
    );
    defaults.insert(ElementKind::Divider, Props::new());
    defaults.insert(ElementKind::Spacer, object(json!({ "height": 40 })));
    defaults.insert(ElementKind::Video, object(json!({ "url": "" })));
    defaults.insert(ElementKind::Slider, object(json!({ "slides": [] })));
    defaults.insert(
        ElementKind::Newsletter,
        object(json!({
            "title": "Subscribe",
            "subtitle": "",
            "buttonText": "Subscribe",
            "placeholder": "Enter your email"
        })),
    );
    defaults.insert(ElementKind::Html, object(json!({ "originalHtml": "" })));
    defaults.insert(ElementKind::InnerSection, Props::new());
    defaults
}

/// Creates nodes with fresh ids and default props.
///
/// Global slots are the exception: they always use the well-known
/// [`GLOBAL_NAVBAR_ID`] / [`GLOBAL_FOOTER_ID`].
#[derive(Debug, Clone)]
pub struct NodeFactory {
    ids: IdGenerator,
    defaults: HashMap<ElementKind, Props>,
}

impl NodeFactory {
    pub fn new() -> Self {
        Self::with_ids(IdGenerator::new())
    }

    pub fn with_ids(ids: IdGenerator) -> Self {
        Self {
            ids,
            defaults: builtin_defaults(),
        }
    }

    /// Register (or override) the default props of an element kind
    pub fn register(&mut self, kind: ElementKind, props: Props) {
        self.defaults.insert(kind, props);
    }

    /// Deep copy of the default props for `kind` (empty for unknown kinds)
    pub fn defaults(&self, kind: &ElementKind) -> Props {
        self.defaults.get(kind).cloned().unwrap_or_default()
    }

    pub fn next_id(&mut self, kind: &str) -> String {
        self.ids.new_id(kind)
    }

    /// Never mint an ID already used in `doc`. Call before editing a
    /// document this factory did not build.
    pub fn reserve_ids(&mut self, doc: &Document) {
        let nodes = walk(doc);
        let comments = doc.comments.iter().flat_map(|pages| pages.values()).flatten();
        self.ids.skip_past(
            nodes
                .iter()
                .map(|(_, node)| node.id())
                .chain(comments.map(|comment| comment.id.as_str())),
        );
    }

    pub fn create_element(&mut self, kind: ElementKind) -> Element {
        let columns = kind.is_container().then(Vec::new);
        Element {
            id: self.ids.new_id(kind.as_str()),
            props: self.defaults(&kind),
            kind,
            columns,
        }
    }

    /// Element of `kind` with `props` deep-merged over the defaults
    pub fn create_element_with(&mut self, kind: ElementKind, props: &Props) -> Element {
        let mut element = self.create_element(kind);
        crate::props::deep_merge(&mut element.props, props);
        element
    }

    /// Placeholder section (no columns yet)
    pub fn create_section(&mut self) -> Section {
        Section {
            id: self.ids.new_id("section"),
            kind: SectionKind::Section,
            props: Props::new(),
            columns: Vec::new(),
            version: BASELINE_VERSION,
        }
    }

    /// Section with one full-width, empty column
    pub fn create_section_with_column(&mut self) -> Section {
        let mut section = self.create_section();
        section.columns.push(self.create_column("100%"));
        section
    }

    pub fn create_column(&mut self, width: &str) -> Column {
        let mut props = Props::new();
        props.insert("width".to_string(), Value::from(width));
        Column {
            id: self.ids.new_id("column"),
            kind: ColumnKind::Column,
            props,
            elements: Vec::new(),
        }
    }

    /// Empty columns sized by percentage
    pub fn create_columns(&mut self, widths: &[f64]) -> Vec<Column> {
        widths
            .iter()
            .map(|w| self.create_column(&width_label(*w)))
            .collect()
    }

    pub fn create_page(&mut self, name: &str) -> Page {
        Page {
            id: self.ids.new_id("page"),
            name: name.to_string(),
            layout: Vec::new(),
            version: 0,
        }
    }

    pub fn navbar(&self, props: Props) -> Section {
        Section {
            id: GLOBAL_NAVBAR_ID.to_string(),
            kind: SectionKind::Navbar,
            props,
            columns: Vec::new(),
            version: BASELINE_VERSION,
        }
    }

    pub fn footer(&self, props: Props) -> Section {
        Section {
            id: GLOBAL_FOOTER_ID.to_string(),
            kind: SectionKind::Footer,
            props,
            columns: Vec::new(),
            version: BASELINE_VERSION,
        }
    }

    /// Copy of a subtree with every id replaced by a fresh one
    pub fn deep_clone_with_fresh_ids(&mut self, node: &Node) -> Node {
        match node {
            Node::Page(page) => {
                let mut page = page.clone();
                page.id = self.ids.new_id("page");
                page.layout = page
                    .layout
                    .iter()
                    .map(|s| self.fresh_section(s))
                    .collect();
                Node::Page(page)
            }
            Node::Section(section) => Node::Section(self.fresh_section(section)),
            Node::Column(column) => Node::Column(self.fresh_column(column)),
            Node::Element(element) => Node::Element(self.fresh_element(element)),
        }
    }

    fn fresh_section(&mut self, section: &Section) -> Section {
        Section {
            id: self.ids.new_id("section"),
            kind: section.kind,
            props: section.props.clone(),
            columns: section.columns.iter().map(|c| self.fresh_column(c)).collect(),
            version: section.version,
        }
    }

    fn fresh_column(&mut self, column: &Column) -> Column {
        Column {
            id: self.ids.new_id("column"),
            kind: column.kind,
            props: column.props.clone(),
            elements: column.elements.iter().map(|e| self.fresh_element(e)).collect(),
        }
    }

    fn fresh_element(&mut self, element: &Element) -> Element {
        Element {
            id: self.ids.new_id(element.kind.as_str()),
            kind: element.kind.clone(),
            props: element.props.clone(),
            columns: element
                .columns
                .as_ref()
                .map(|columns| columns.iter().map(|c| self.fresh_column(c)).collect()),
        }
    }
}

impl Default for NodeFactory {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn factory() -> NodeFactory {
        NodeFactory::with_ids(IdGenerator::from_seed("test"))
    }

    #[test]
    fn test_width_labels() {
        assert_eq!(width_label(100.0), "100%");
        assert_eq!(width_label(50.0), "50%");
        assert_eq!(width_label(100.0 / 3.0), "33.33%");
        assert_eq!(width_label(12.5), "12.5%");
    }

    #[test]
    fn test_reserved_ids_are_not_minted_again() {
        let mut first = factory();
        let mut page = first.create_page("Home");
        let mut section = first.create_section_with_column();
        section.columns[0]
            .elements
            .push(first.create_element(ElementKind::Text));
        page.layout.push(section);
        let doc = Document::new(page);

        let mut second = factory();
        second.reserve_ids(&doc);
        let fresh = second.create_section_with_column();
        assert!(!doc.contains(&fresh.id));
        assert!(!doc.contains(&fresh.columns[0].id));
    }

    #[test]
    fn test_create_element_uses_defaults() {
        let mut factory = factory();
        let heading = factory.create_element(ElementKind::Heading);

        assert_eq!(heading.prop_str("tag"), Some("h2"));
        assert!(heading.columns.is_none());
        assert!(heading.id.starts_with("heading-"));
    }

    #[test]
    fn test_defaults_are_deep_copies() {
        let mut factory = factory();
        let mut slider = factory.create_element(ElementKind::Slider);
        slider
            .props
            .insert("slides".to_string(), json!([{ "src": "a.png" }]));

        let fresh = factory.create_element(ElementKind::Slider);
        assert_eq!(fresh.props["slides"], json!([]));
    }

    #[test]
    fn test_container_kinds_get_columns() {
        let mut factory = factory();
        let inner = factory.create_element(ElementKind::InnerSection);
        assert_eq!(inner.columns, Some(Vec::new()));
    }

    #[test]
    fn test_unknown_kind_has_empty_props() {
        let mut factory = factory();
        let custom = factory.create_element(ElementKind::from("countdown"));
        assert!(custom.props.is_empty());

        factory.register(ElementKind::from("countdown"), object(json!({ "until": "" })));
        let custom = factory.create_element(ElementKind::from("countdown"));
        assert_eq!(custom.prop_str("until"), Some(""));
    }

    #[test]
    fn test_global_slots_use_fixed_ids() {
        let factory = factory();
        assert_eq!(factory.navbar(Props::new()).id, GLOBAL_NAVBAR_ID);
        assert_eq!(factory.footer(Props::new()).id, GLOBAL_FOOTER_ID);
    }

    #[test]
    fn test_fresh_ids_on_clone() {
        let mut factory = factory();
        let mut section = factory.create_section_with_column();
        section.columns[0]
            .elements
            .push(factory.create_element(ElementKind::Text));

        let Node::Section(copy) = factory.deep_clone_with_fresh_ids(&Node::Section(section.clone()))
        else {
            panic!("expected section");
        };

        assert_ne!(copy.id, section.id);
        assert_ne!(copy.columns[0].id, section.columns[0].id);
        assert_ne!(copy.columns[0].elements[0].id, section.columns[0].elements[0].id);
        assert_eq!(crate::shape_of(&copy), crate::shape_of(&section));
    }
}
