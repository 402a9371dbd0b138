//! Node types and the persisted document schema.

use crate::error::{DocumentError, DocumentResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

/// Kind-specific property bag. Unknown keys are carried through untouched.
pub type Props = serde_json::Map<String, Value>;

pub const GLOBAL_NAVBAR_ID: &str = "global-navbar";
pub const GLOBAL_FOOTER_ID: &str = "global-footer";

/// Version every freshly created or freshly parsed section starts at
pub const BASELINE_VERSION: u64 = 1;

fn baseline_version() -> u64 {
    BASELINE_VERSION
}

/// Root of a persisted/exchanged page-builder document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub pages: BTreeMap<String, Page>,
    pub active_page_id: String,
    #[serde(default)]
    pub global_navbar: Option<Section>,
    #[serde(default)]
    pub global_footer: Option<Section>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comments: Option<BTreeMap<String, Vec<Comment>>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub layout: Vec<Section>,
    #[serde(default)]
    pub version: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionKind {
    Section,
    Navbar,
    Footer,
}

impl SectionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SectionKind::Section => "section",
            SectionKind::Navbar => "navbar",
            SectionKind::Footer => "footer",
        }
    }
}

/// A horizontal band of the page. Zero columns means a placeholder that
/// still awaits a structure choice. The global navbar carries its links in
/// `props` and never has columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: SectionKind,
    #[serde(default)]
    pub props: Props,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub columns: Vec<Column>,
    #[serde(default = "baseline_version")]
    pub version: u64,
}

impl Section {
    pub fn is_placeholder(&self) -> bool {
        self.kind == SectionKind::Section && self.columns.is_empty()
    }

    /// Kind of the first element of the first column, if any
    pub fn first_element_kind(&self) -> Option<&ElementKind> {
        self.columns
            .iter()
            .flat_map(|c| c.elements.first())
            .next()
            .map(|e| &e.kind)
    }

    pub fn is_edited(&self) -> bool {
        self.version > BASELINE_VERSION
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnKind {
    #[default]
    Column,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub id: String,
    #[serde(rename = "type", default)]
    pub kind: ColumnKind,
    #[serde(default)]
    pub props: Props,
    #[serde(default)]
    pub elements: Vec<Element>,
}

impl Column {
    pub fn width(&self) -> Option<&str> {
        self.props.get("width").and_then(Value::as_str)
    }
}

/// Element kinds known to the builder. Kinds this build does not know are
/// kept verbatim in [`ElementKind::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ElementKind {
    Heading,
    Text,
    Image,
    Button,
    Divider,
    Spacer,
    Video,
    Slider,
    Newsletter,
    /// Opaque markup content: edited as raw text through `originalHtml`
    Html,
    /// Nested row that owns its own columns
    InnerSection,
    Other(String),
}

impl ElementKind {
    pub const BUILTIN: [ElementKind; 11] = [
        ElementKind::Heading,
        ElementKind::Text,
        ElementKind::Image,
        ElementKind::Button,
        ElementKind::Divider,
        ElementKind::Spacer,
        ElementKind::Video,
        ElementKind::Slider,
        ElementKind::Newsletter,
        ElementKind::Html,
        ElementKind::InnerSection,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            ElementKind::Heading => "heading",
            ElementKind::Text => "text",
            ElementKind::Image => "image",
            ElementKind::Button => "button",
            ElementKind::Divider => "divider",
            ElementKind::Spacer => "spacer",
            ElementKind::Video => "video",
            ElementKind::Slider => "slider",
            ElementKind::Newsletter => "newsletter",
            ElementKind::Html => "html",
            ElementKind::InnerSection => "inner-section",
            ElementKind::Other(kind) => kind,
        }
    }

    pub fn is_container(&self) -> bool {
        matches!(self, ElementKind::InnerSection)
    }

    pub fn is_opaque(&self) -> bool {
        matches!(self, ElementKind::Html)
    }
}

impl From<String> for ElementKind {
    fn from(value: String) -> Self {
        match value.as_str() {
            "heading" => ElementKind::Heading,
            "text" => ElementKind::Text,
            "image" => ElementKind::Image,
            "button" => ElementKind::Button,
            "divider" => ElementKind::Divider,
            "spacer" => ElementKind::Spacer,
            "video" => ElementKind::Video,
            "slider" => ElementKind::Slider,
            "newsletter" => ElementKind::Newsletter,
            "html" => ElementKind::Html,
            "inner-section" => ElementKind::InnerSection,
            _ => ElementKind::Other(value),
        }
    }
}

impl From<&str> for ElementKind {
    fn from(value: &str) -> Self {
        ElementKind::from(value.to_string())
    }
}

impl From<ElementKind> for String {
    fn from(kind: ElementKind) -> Self {
        kind.as_str().to_string()
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: ElementKind,
    #[serde(default)]
    pub props: Props,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub columns: Option<Vec<Column>>,
}

impl Element {
    pub fn prop_str(&self, key: &str) -> Option<&str> {
        self.props.get(key).and_then(Value::as_str)
    }

    /// `originalHtml` of an opaque markup element
    pub fn original_html(&self) -> Option<&str> {
        if self.kind.is_opaque() {
            self.prop_str("originalHtml")
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: String,
    pub author: String,
    pub text: String,
    pub created_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_id: Option<String>,
}

/// Owned node of any level, used when a node is written into the tree.
///
/// On the wire: `{"level": "element", "node": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "level", content = "node", rename_all = "lowercase")]
pub enum Node {
    Page(Page),
    Section(Section),
    Column(Column),
    Element(Element),
}

impl Node {
    pub fn id(&self) -> &str {
        match self {
            Node::Page(p) => &p.id,
            Node::Section(s) => &s.id,
            Node::Column(c) => &c.id,
            Node::Element(e) => &e.id,
        }
    }

    /// Level name used in messages and on the wire
    pub fn level(&self) -> &'static str {
        match self {
            Node::Page(_) => "page",
            Node::Section(_) => "section",
            Node::Column(_) => "column",
            Node::Element(_) => "element",
        }
    }
}

/// Borrowed view of a node found in the tree
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NodeRef<'a> {
    Page(&'a Page),
    Section(&'a Section),
    Column(&'a Column),
    Element(&'a Element),
}

impl<'a> NodeRef<'a> {
    pub fn id(&self) -> &'a str {
        match self {
            NodeRef::Page(p) => &p.id,
            NodeRef::Section(s) => &s.id,
            NodeRef::Column(c) => &c.id,
            NodeRef::Element(e) => &e.id,
        }
    }

    pub fn level(&self) -> &'static str {
        match self {
            NodeRef::Page(_) => "page",
            NodeRef::Section(_) => "section",
            NodeRef::Column(_) => "column",
            NodeRef::Element(_) => "element",
        }
    }

    pub fn to_owned_node(&self) -> Node {
        match self {
            NodeRef::Page(p) => Node::Page((*p).clone()),
            NodeRef::Section(s) => Node::Section((*s).clone()),
            NodeRef::Column(c) => Node::Column((*c).clone()),
            NodeRef::Element(e) => Node::Element((*e).clone()),
        }
    }
}

/// Mutable view of a node found in the tree
#[derive(Debug)]
pub enum NodeMut<'a> {
    Page(&'a mut Page),
    Section(&'a mut Section),
    Column(&'a mut Column),
    Element(&'a mut Element),
}

impl NodeMut<'_> {
    pub fn id(&self) -> &str {
        match self {
            NodeMut::Page(p) => &p.id,
            NodeMut::Section(s) => &s.id,
            NodeMut::Column(c) => &c.id,
            NodeMut::Element(e) => &e.id,
        }
    }

    pub fn level(&self) -> &'static str {
        match self {
            NodeMut::Page(_) => "page",
            NodeMut::Section(_) => "section",
            NodeMut::Column(_) => "column",
            NodeMut::Element(_) => "element",
        }
    }

    /// Property bag of the node (pages have none)
    pub fn props_mut(&mut self) -> Option<&mut Props> {
        match self {
            NodeMut::Page(_) => None,
            NodeMut::Section(s) => Some(&mut s.props),
            NodeMut::Column(c) => Some(&mut c.props),
            NodeMut::Element(e) => Some(&mut e.props),
        }
    }
}

impl Document {
    /// Document holding a single page, which becomes the active page
    pub fn new(page: Page) -> Self {
        let active_page_id = page.id.clone();
        let mut pages = BTreeMap::new();
        pages.insert(page.id.clone(), page);

        Self {
            pages,
            active_page_id,
            global_navbar: None,
            global_footer: None,
            comments: None,
        }
    }

    pub fn page(&self, page_id: &str) -> Option<&Page> {
        self.pages.get(page_id)
    }

    pub fn page_mut(&mut self, page_id: &str) -> Option<&mut Page> {
        self.pages.get_mut(page_id)
    }

    pub fn active_page(&self) -> Option<&Page> {
        self.pages.get(&self.active_page_id)
    }

    /// Add a page; the first page added to an empty document becomes active
    pub fn add_page(&mut self, page: Page) {
        if self.pages.is_empty() {
            self.active_page_id = page.id.clone();
        }
        self.pages.insert(page.id.clone(), page);
    }

    pub fn set_active_page(&mut self, page_id: &str) -> DocumentResult<()> {
        if !self.pages.contains_key(page_id) {
            return Err(DocumentError::PageNotFound(page_id.to_string()));
        }
        self.active_page_id = page_id.to_string();
        Ok(())
    }

    /// Find a node anywhere in the document by id
    pub fn find(&self, id: &str) -> Option<NodeRef<'_>> {
        crate::walk::walk(self)
            .into_iter()
            .find(|(_, node)| node.id() == id)
            .map(|(_, node)| node)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.find(id).is_some()
    }

    /// Number of elements across all pages and global slots, inner sections included
    pub fn element_count(&self) -> usize {
        crate::walk::walk(self)
            .iter()
            .filter(|(_, node)| matches!(node, NodeRef::Element(_)))
            .count()
    }

    pub fn add_comment(&mut self, page_id: &str, comment: Comment) {
        self.comments
            .get_or_insert_with(BTreeMap::new)
            .entry(page_id.to_string())
            .or_default()
            .push(comment);
    }

    pub fn from_json(json: &str) -> DocumentResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> DocumentResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn load(path: &Path) -> DocumentResult<Self> {
        let source = std::fs::read_to_string(path)?;
        Self::from_json(&source)
    }

    pub fn save(&self, path: &Path) -> DocumentResult<()> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }
}
