//! Dotted-bracket paths such as `pages[home].layout[2].columns[0].elements[1]`.
//!
//! A path is a positional view of a node. Resolution never panics and never
//! errors: a missing key or an out-of-range index yields `None` / `false`.

use crate::error::PathError;
use crate::model::{Document, Node, NodeMut, NodeRef};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathRoot {
    Page(String),
    GlobalNavbar,
    GlobalFooter,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PathStep {
    /// Section within a page layout
    Layout(usize),
    /// Column within a section or inner section
    Column(usize),
    /// Element within a column
    Element(usize),
}

impl PathStep {
    pub fn index(&self) -> usize {
        match self {
            PathStep::Layout(i) | PathStep::Column(i) | PathStep::Element(i) => *i,
        }
    }

    fn with_index(&self, index: usize) -> Self {
        match self {
            PathStep::Layout(_) => PathStep::Layout(index),
            PathStep::Column(_) => PathStep::Column(index),
            PathStep::Element(_) => PathStep::Element(index),
        }
    }
}

/// Serialized in its string form, e.g. `"globalFooter.columns[0]"`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NodePath {
    pub root: PathRoot,
    pub steps: Vec<PathStep>,
}

impl NodePath {
    pub fn page(page_id: impl Into<String>) -> Self {
        Self {
            root: PathRoot::Page(page_id.into()),
            steps: Vec::new(),
        }
    }

    pub fn navbar() -> Self {
        Self {
            root: PathRoot::GlobalNavbar,
            steps: Vec::new(),
        }
    }

    pub fn footer() -> Self {
        Self {
            root: PathRoot::GlobalFooter,
            steps: Vec::new(),
        }
    }

    pub fn layout(mut self, index: usize) -> Self {
        self.steps.push(PathStep::Layout(index));
        self
    }

    pub fn column(mut self, index: usize) -> Self {
        self.steps.push(PathStep::Column(index));
        self
    }

    pub fn element(mut self, index: usize) -> Self {
        self.steps.push(PathStep::Element(index));
        self
    }

    pub fn child(&self, step: PathStep) -> Self {
        let mut path = self.clone();
        path.steps.push(step);
        path
    }

    /// Page id for page-rooted paths
    pub fn page_id(&self) -> Option<&str> {
        match &self.root {
            PathRoot::Page(id) => Some(id),
            _ => None,
        }
    }

    /// Parent path and last step, or `None` for a root path
    pub fn split_last(&self) -> Option<(NodePath, PathStep)> {
        let (last, rest) = self.steps.split_last()?;
        Some((
            NodePath {
                root: self.root.clone(),
                steps: rest.to_vec(),
            },
            *last,
        ))
    }

    pub fn parent(&self) -> Option<NodePath> {
        self.split_last().map(|(parent, _)| parent)
    }

    pub fn last_index(&self) -> Option<usize> {
        self.steps.last().map(PathStep::index)
    }

    /// Same path with the last index replaced
    pub fn with_last_index(&self, index: usize) -> Self {
        let mut path = self.clone();
        if let Some(last) = path.steps.last_mut() {
            *last = last.with_index(index);
        }
        path
    }

    /// Paths of the top-level section this path runs through, if any
    pub fn section_prefixes(&self) -> Vec<NodePath> {
        let mut prefixes = Vec::new();
        if !matches!(self.root, PathRoot::Page(_)) {
            prefixes.push(NodePath {
                root: self.root.clone(),
                steps: Vec::new(),
            });
        }
        for (i, step) in self.steps.iter().enumerate() {
            if matches!(step, PathStep::Layout(_)) {
                prefixes.push(NodePath {
                    root: self.root.clone(),
                    steps: self.steps[..=i].to_vec(),
                });
            }
        }
        prefixes
    }

    pub fn is_prefix_of(&self, other: &NodePath) -> bool {
        self.root == other.root
            && self.steps.len() <= other.steps.len()
            && other.steps[..self.steps.len()] == self.steps[..]
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.root {
            PathRoot::Page(id) => write!(f, "pages[{}]", id)?,
            PathRoot::GlobalNavbar => f.write_str("globalNavbar")?,
            PathRoot::GlobalFooter => f.write_str("globalFooter")?,
        }
        for step in &self.steps {
            match step {
                PathStep::Layout(i) => write!(f, ".layout[{}]", i)?,
                PathStep::Column(i) => write!(f, ".columns[{}]", i)?,
                PathStep::Element(i) => write!(f, ".elements[{}]", i)?,
            }
        }
        Ok(())
    }
}

/// Split a path string into `(key, subscript)` pairs, honouring brackets so
/// page ids containing dots survive.
fn segments(path: &str) -> Result<Vec<(String, Option<String>)>, PathError> {
    let mut out = Vec::new();
    let mut chars = path.chars().peekable();

    loop {
        let mut key = String::new();
        while let Some(&c) = chars.peek() {
            if c == '.' || c == '[' {
                break;
            }
            key.push(c);
            chars.next();
        }
        if key.is_empty() {
            return Err(PathError::malformed(path, "empty key"));
        }

        let mut subscript = None;
        if chars.peek() == Some(&'[') {
            chars.next();
            let mut inner = String::new();
            let mut closed = false;
            for c in chars.by_ref() {
                if c == ']' {
                    closed = true;
                    break;
                }
                inner.push(c);
            }
            if !closed {
                return Err(PathError::malformed(path, "unclosed '['"));
            }
            subscript = Some(inner);
        }
        out.push((key, subscript));

        match chars.next() {
            None => break,
            Some('.') => continue,
            Some(c) => return Err(PathError::malformed(path, format!("unexpected '{}'", c))),
        }
    }

    Ok(out)
}

fn index_of(path: &str, subscript: Option<String>) -> Result<usize, PathError> {
    let subscript = subscript.ok_or_else(|| PathError::malformed(path, "missing index"))?;
    subscript
        .trim()
        .parse()
        .map_err(|_| PathError::malformed(path, format!("'{}' is not an index", subscript)))
}

impl FromStr for NodePath {
    type Err = PathError;

    fn from_str(path: &str) -> Result<Self, Self::Err> {
        let mut segments = segments(path)?.into_iter();
        let (key, subscript) = segments
            .next()
            .ok_or_else(|| PathError::malformed(path, "empty path"))?;

        let root = match (key.as_str(), subscript) {
            ("pages", Some(id)) if !id.is_empty() => PathRoot::Page(id),
            ("pages", _) => return Err(PathError::malformed(path, "missing page id")),
            ("globalNavbar", None) => PathRoot::GlobalNavbar,
            ("globalFooter", None) => PathRoot::GlobalFooter,
            (other, _) => return Err(PathError::UnknownKey(other.to_string())),
        };

        let mut steps = Vec::new();
        for (key, subscript) in segments {
            let step = match key.as_str() {
                "layout" => PathStep::Layout(index_of(path, subscript)?),
                "columns" => PathStep::Column(index_of(path, subscript)?),
                "elements" => PathStep::Element(index_of(path, subscript)?),
                other => return Err(PathError::UnknownKey(other.to_string())),
            };
            steps.push(step);
        }

        Ok(NodePath { root, steps })
    }
}

impl TryFrom<String> for NodePath {
    type Error = PathError;

    fn try_from(path: String) -> Result<Self, Self::Error> {
        path.parse()
    }
}

impl From<NodePath> for String {
    fn from(path: NodePath) -> Self {
        path.to_string()
    }
}

/// Resolve a path against the document
pub fn resolve<'a>(doc: &'a Document, path: &NodePath) -> Option<NodeRef<'a>> {
    let mut current = match &path.root {
        PathRoot::Page(id) => NodeRef::Page(doc.pages.get(id)?),
        PathRoot::GlobalNavbar => NodeRef::Section(doc.global_navbar.as_ref()?),
        PathRoot::GlobalFooter => NodeRef::Section(doc.global_footer.as_ref()?),
    };

    for step in &path.steps {
        current = match (current, step) {
            (NodeRef::Page(page), PathStep::Layout(i)) => NodeRef::Section(page.layout.get(*i)?),
            (NodeRef::Section(section), PathStep::Column(i)) => {
                NodeRef::Column(section.columns.get(*i)?)
            }
            (NodeRef::Column(column), PathStep::Element(i)) => {
                NodeRef::Element(column.elements.get(*i)?)
            }
            (NodeRef::Element(element), PathStep::Column(i)) => {
                NodeRef::Column(element.columns.as_ref()?.get(*i)?)
            }
            _ => return None,
        };
    }

    Some(current)
}

/// Parse and resolve in one go; malformed paths resolve to nothing
pub fn resolve_str<'a>(doc: &'a Document, path: &str) -> Option<NodeRef<'a>> {
    let path: NodePath = path.parse().ok()?;
    resolve(doc, &path)
}

pub fn resolve_mut<'a>(doc: &'a mut Document, path: &NodePath) -> Option<NodeMut<'a>> {
    let mut current = match &path.root {
        PathRoot::Page(id) => NodeMut::Page(doc.pages.get_mut(id)?),
        PathRoot::GlobalNavbar => NodeMut::Section(doc.global_navbar.as_mut()?),
        PathRoot::GlobalFooter => NodeMut::Section(doc.global_footer.as_mut()?),
    };

    for step in &path.steps {
        current = match (current, step) {
            (NodeMut::Page(page), PathStep::Layout(i)) => {
                NodeMut::Section(page.layout.get_mut(*i)?)
            }
            (NodeMut::Section(section), PathStep::Column(i)) => {
                NodeMut::Column(section.columns.get_mut(*i)?)
            }
            (NodeMut::Column(column), PathStep::Element(i)) => {
                NodeMut::Element(column.elements.get_mut(*i)?)
            }
            (NodeMut::Element(element), PathStep::Column(i)) => {
                NodeMut::Column(element.columns.as_mut()?.get_mut(*i)?)
            }
            _ => return None,
        };
    }

    Some(current)
}

/// Write `node` at `path`, replacing what is there. Writing one past the end
/// of a container appends. Returns `false` when the path does not resolve or
/// the node does not belong at that level.
pub fn set(doc: &mut Document, path: &NodePath, node: Node) -> bool {
    let Some((parent, last)) = path.split_last() else {
        return match (&path.root, node) {
            (PathRoot::Page(id), Node::Page(page)) if page.id == *id => {
                doc.pages.insert(id.clone(), page);
                true
            }
            (PathRoot::GlobalNavbar, Node::Section(section)) => {
                doc.global_navbar = Some(section);
                true
            }
            (PathRoot::GlobalFooter, Node::Section(section)) => {
                doc.global_footer = Some(section);
                true
            }
            _ => false,
        };
    };

    fn put<T>(items: &mut Vec<T>, index: usize, item: T) -> bool {
        if index < items.len() {
            items[index] = item;
            true
        } else if index == items.len() {
            items.push(item);
            true
        } else {
            false
        }
    }

    match (resolve_mut(doc, &parent), last, node) {
        (Some(NodeMut::Page(page)), PathStep::Layout(i), Node::Section(section)) => {
            put(&mut page.layout, i, section)
        }
        (Some(NodeMut::Section(section)), PathStep::Column(i), Node::Column(column)) => {
            put(&mut section.columns, i, column)
        }
        (Some(NodeMut::Column(column)), PathStep::Element(i), Node::Element(element)) => {
            put(&mut column.elements, i, element)
        }
        (Some(NodeMut::Element(element)), PathStep::Column(i), Node::Column(column)) => {
            match element.columns.as_mut() {
                Some(columns) => put(columns, i, column),
                None => false,
            }
        }
        _ => false,
    }
}

/// Remove the node at `path` together with its subtree
pub fn remove(doc: &mut Document, path: &NodePath) -> bool {
    let Some((parent, last)) = path.split_last() else {
        return match &path.root {
            PathRoot::Page(id) => doc.pages.remove(id).is_some(),
            PathRoot::GlobalNavbar => doc.global_navbar.take().is_some(),
            PathRoot::GlobalFooter => doc.global_footer.take().is_some(),
        };
    };

    fn splice<T>(items: &mut Vec<T>, index: usize) -> bool {
        if index < items.len() {
            items.remove(index);
            true
        } else {
            false
        }
    }

    match (resolve_mut(doc, &parent), last) {
        (Some(NodeMut::Page(page)), PathStep::Layout(i)) => splice(&mut page.layout, i),
        (Some(NodeMut::Section(section)), PathStep::Column(i)) => splice(&mut section.columns, i),
        (Some(NodeMut::Column(column)), PathStep::Element(i)) => splice(&mut column.elements, i),
        (Some(NodeMut::Element(element)), PathStep::Column(i)) => element
            .columns
            .as_mut()
            .map(|columns| splice(columns, i))
            .unwrap_or(false),
        _ => false,
    }
}

/// Current path of the node with `id` (brute-force search)
pub fn path_of(doc: &Document, id: &str) -> Option<NodePath> {
    crate::walk::walk(doc)
        .into_iter()
        .find(|(_, node)| node.id() == id)
        .map(|(path, _)| path)
}
