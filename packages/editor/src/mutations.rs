//! # Structural Mutations
//!
//! Pure operations on a [`Document`]: each one reads the current tree and
//! returns the next one, leaving its input untouched.
//!
//! Every operation comes in two flavours:
//!
//! - `try_*` reports why a request was refused ([`MutationError`]).
//! - The plain form never fails. A refused request is logged at debug level
//!   and an unchanged copy of the input is returned, so a stale drag target
//!   or an outdated path from the UI is a no-op, not a crash.
//!
//! ## Versions
//!
//! A successful mutation increments the version of each page it touched and
//! of every top-level section along the touched paths. Merge relies on this
//! to tell sections the user edited apart from untouched generated ones.
//!
//! ## Move
//!
//! Move resolves its destination container to an id before detaching the
//! node, then finds the container again in the detached tree. Removing the
//! node can shift sibling indexes, so a path computed before the detach may
//! no longer point at the same container.

use pagekit_document::{
    deep_merge, path_of, remove, resolve, resolve_mut, Document, Node, NodeFactory, NodeMut,
    NodePath, NodeRef, PathRoot, PathStep, Props, Section,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use thiserror::Error;
use tracing::debug;

const ORIGINAL_HTML: &str = "originalHtml";

/// Structural operations, in a form that can be queued or sent over the wire
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Mutation {
    /// Insert a new node under `target` (append when `index` is absent)
    Insert {
        target: NodePath,
        node: Node,
        index: Option<usize>,
    },

    /// Detach a node and re-insert it under the container at `dest`
    Move {
        node_id: String,
        dest: NodePath,
        index: usize,
    },

    /// Remove a node together with its subtree
    Delete { path: NodePath },

    /// Replace a section's columns with fresh empty ones
    SetStructure { section: NodePath, widths: Vec<f64> },

    /// Move a child of `container` from one position to another
    Reorder {
        container: NodePath,
        from: usize,
        to: usize,
    },

    /// Copy a node with fresh ids right after the original
    Duplicate { node_id: String },

    /// Deep-merge a patch into a node's props
    UpdateProps { node_id: String, patch: Props },

    AddPage { name: String },

    SetActivePage { page_id: String },
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MutationError {
    #[error("Nothing at path: {0}")]
    PathNotFound(String),

    #[error("Node not found: {0}")]
    NodeNotFound(String),

    #[error("Page not found: {0}")]
    PageNotFound(String),

    #[error("Cannot place a {node} inside a {target}")]
    InvalidTarget {
        node: &'static str,
        target: &'static str,
    },

    #[error("Would create cycle")]
    CycleDetected,

    #[error("Node id already in use: {0}")]
    DuplicateId(String),

    #[error("Index {index} out of range ({len} items)")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Invalid structure: {0}")]
    InvalidStructure(String),

    #[error("Root node cannot be moved or copied: {0}")]
    RootNode(String),

    #[error("Node has no props: {0}")]
    NoProps(String),
}

pub type MutationResult<T> = Result<T, MutationError>;

impl Mutation {
    pub fn try_apply(&self, doc: &Document, factory: &mut NodeFactory) -> MutationResult<Document> {
        match self {
            Mutation::Insert {
                target,
                node,
                index,
            } => try_insert(doc, target, node.clone(), *index, factory),
            Mutation::Move {
                node_id,
                dest,
                index,
            } => try_move_node(doc, node_id, dest, *index),
            Mutation::Delete { path } => try_delete(doc, path),
            Mutation::SetStructure { section, widths } => {
                try_set_structure(doc, section, widths, factory)
            }
            Mutation::Reorder {
                container,
                from,
                to,
            } => try_reorder(doc, container, *from, *to),
            Mutation::Duplicate { node_id } => try_duplicate(doc, node_id, factory),
            Mutation::UpdateProps { node_id, patch } => try_update_props(doc, node_id, patch),
            Mutation::AddPage { name } => try_add_page(doc, name, factory),
            Mutation::SetActivePage { page_id } => try_set_active_page(doc, page_id),
        }
    }

    /// Apply, falling back to an unchanged copy when the mutation is refused
    pub fn apply(&self, doc: &Document, factory: &mut NodeFactory) -> Document {
        or_unchanged(doc, self.label(), self.try_apply(doc, factory))
    }

    /// Short human-readable name, used for history labels and logs
    pub fn label(&self) -> &'static str {
        match self {
            Mutation::Insert { .. } => "insert",
            Mutation::Move { .. } => "move",
            Mutation::Delete { .. } => "delete",
            Mutation::SetStructure { .. } => "set structure",
            Mutation::Reorder { .. } => "reorder",
            Mutation::Duplicate { .. } => "duplicate",
            Mutation::UpdateProps { .. } => "update props",
            Mutation::AddPage { .. } => "add page",
            Mutation::SetActivePage { .. } => "set active page",
        }
    }
}

fn or_unchanged(doc: &Document, operation: &str, result: MutationResult<Document>) -> Document {
    match result {
        Ok(next) => next,
        Err(error) => {
            debug!(operation, %error, "Mutation refused, document unchanged");
            doc.clone()
        }
    }
}

pub fn insert(
    doc: &Document,
    target: &NodePath,
    node: Node,
    index: Option<usize>,
    factory: &mut NodeFactory,
) -> Document {
    or_unchanged(doc, "insert", try_insert(doc, target, node, index, factory))
}

pub fn move_node(doc: &Document, node_id: &str, dest: &NodePath, index: usize) -> Document {
    or_unchanged(doc, "move", try_move_node(doc, node_id, dest, index))
}

pub fn delete(doc: &Document, path: &NodePath) -> Document {
    or_unchanged(doc, "delete", try_delete(doc, path))
}

pub fn set_structure(
    doc: &Document,
    section: &NodePath,
    widths: &[f64],
    factory: &mut NodeFactory,
) -> Document {
    or_unchanged(
        doc,
        "set structure",
        try_set_structure(doc, section, widths, factory),
    )
}

pub fn reorder(doc: &Document, container: &NodePath, from: usize, to: usize) -> Document {
    or_unchanged(doc, "reorder", try_reorder(doc, container, from, to))
}

pub fn duplicate(doc: &Document, node_id: &str, factory: &mut NodeFactory) -> Document {
    or_unchanged(doc, "duplicate", try_duplicate(doc, node_id, factory))
}

pub fn update_props(doc: &Document, node_id: &str, patch: &Props) -> Document {
    or_unchanged(doc, "update props", try_update_props(doc, node_id, patch))
}

pub fn add_page(doc: &Document, name: &str, factory: &mut NodeFactory) -> Document {
    or_unchanged(doc, "add page", try_add_page(doc, name, factory))
}

/// Insert `node` under the node at `target`.
///
/// Levels that do not nest directly are bridged rather than refused:
///
/// - an element or column dropped on a page arrives wrapped in a new
///   section (with one full-width column for an element);
/// - a section dropped anywhere below a page is appended to that page,
///   with one full-width column if it has none;
/// - an element dropped on a section without columns gives the section a
///   full-width column first.
pub fn try_insert(
    doc: &Document,
    target: &NodePath,
    node: Node,
    index: Option<usize>,
    factory: &mut NodeFactory,
) -> MutationResult<Document> {
    if doc.contains(node.id()) {
        return Err(MutationError::DuplicateId(node.id().to_string()));
    }
    let target_node = node_at(doc, target)?;

    let mut next = doc.clone();
    let placed = match (target_node, node) {
        (NodeRef::Page(_), Node::Element(element)) => {
            let mut section = factory.create_section_with_column();
            section.columns[0].elements.push(element);
            insert_child(&mut next, target, Node::Section(section), index)?
        }
        (NodeRef::Page(_), Node::Column(column)) => {
            let mut section = factory.create_section();
            section.columns.push(column);
            insert_child(&mut next, target, Node::Section(section), index)?
        }
        (NodeRef::Page(_), node) => insert_child(&mut next, target, node, index)?,
        (_, Node::Section(section)) => {
            let page = NodePath::page(fallback_page(doc, target));
            let section = with_full_width_column(section, factory);
            insert_child(&mut next, &page, Node::Section(section), None)?
        }
        (NodeRef::Section(section), Node::Element(element)) if section.columns.is_empty() => {
            let column = factory.create_column("100%");
            let column_path = insert_child(&mut next, target, Node::Column(column), None)?;
            insert_child(&mut next, &column_path, Node::Element(element), index)?
        }
        (_, node) => insert_child(&mut next, target, node, index)?,
    };

    bump_sections(&mut next, &placed);
    bump_pages(&mut next, &[&placed]);
    Ok(next)
}

pub fn try_move_node(
    doc: &Document,
    node_id: &str,
    dest: &NodePath,
    index: usize,
) -> MutationResult<Document> {
    let source = locate(doc, node_id)?;
    if source.steps.is_empty() {
        return Err(MutationError::RootNode(node_id.to_string()));
    }
    if source.is_prefix_of(dest) {
        return Err(MutationError::CycleDetected);
    }

    let container = node_at(doc, dest)?;
    let moving = node_at(doc, &source)?.to_owned_node();
    if !accepts(&container, &moving) {
        return Err(MutationError::InvalidTarget {
            node: moving.level(),
            target: container.level(),
        });
    }
    let container_id = container.id().to_string();

    let mut next = doc.clone();
    bump_sections(&mut next, &source);
    remove(&mut next, &source);

    let container_path = locate(&next, &container_id)?;
    let placed = insert_child(&mut next, &container_path, moving, Some(index))?;

    bump_sections(&mut next, &placed);
    bump_pages(&mut next, &[&source, &placed]);
    Ok(next)
}

/// Remove the node at `path`. Removing a page root removes the page; the
/// last remaining page cannot be removed.
pub fn try_delete(doc: &Document, path: &NodePath) -> MutationResult<Document> {
    node_at(doc, path)?;

    let mut next = doc.clone();
    match (&path.root, path.parent()) {
        (PathRoot::Page(page_id), None) => {
            if doc.pages.len() == 1 {
                return Err(MutationError::InvalidStructure(
                    "cannot remove the only page".to_string(),
                ));
            }
            remove(&mut next, path);
            if next.active_page_id == *page_id {
                next.active_page_id = next.pages.keys().next().cloned().unwrap_or_default();
            }
        }
        (_, parent) => {
            if let Some(parent) = &parent {
                bump_sections(&mut next, parent);
            }
            remove(&mut next, path);
            bump_pages(&mut next, &[path]);
        }
    }
    Ok(next)
}

/// Replace the columns of the section (or inner section) at `section` with
/// empty columns of the given percentage widths. Existing elements are
/// discarded.
pub fn try_set_structure(
    doc: &Document,
    section: &NodePath,
    widths: &[f64],
    factory: &mut NodeFactory,
) -> MutationResult<Document> {
    if widths.is_empty() {
        return Err(MutationError::InvalidStructure(
            "at least one column is required".to_string(),
        ));
    }
    if let Some(bad) = widths.iter().find(|w| !w.is_finite() || **w <= 0.0) {
        return Err(MutationError::InvalidStructure(format!(
            "column width must be positive, got {}",
            bad
        )));
    }

    let mut next = doc.clone();
    match resolve_mut(&mut next, section) {
        Some(NodeMut::Section(target)) => target.columns = factory.create_columns(widths),
        Some(NodeMut::Element(target)) if target.kind.is_container() => {
            target.columns = Some(factory.create_columns(widths))
        }
        Some(other) => {
            return Err(MutationError::InvalidTarget {
                node: "column",
                target: other.level(),
            })
        }
        None => return Err(MutationError::PathNotFound(section.to_string())),
    }

    bump_sections(&mut next, section);
    bump_pages(&mut next, &[section]);
    Ok(next)
}

/// Move the child at `from` to position `to` within the same container
pub fn try_reorder(
    doc: &Document,
    container: &NodePath,
    from: usize,
    to: usize,
) -> MutationResult<Document> {
    fn shift<T>(items: &mut Vec<T>, from: usize, to: usize) -> MutationResult<()> {
        if from >= items.len() {
            return Err(MutationError::IndexOutOfRange {
                index: from,
                len: items.len(),
            });
        }
        let item = items.remove(from);
        let to = to.min(items.len());
        items.insert(to, item);
        Ok(())
    }

    let mut next = doc.clone();
    match resolve_mut(&mut next, container) {
        Some(NodeMut::Page(page)) => shift(&mut page.layout, from, to)?,
        Some(NodeMut::Section(section)) => shift(&mut section.columns, from, to)?,
        Some(NodeMut::Column(column)) => shift(&mut column.elements, from, to)?,
        Some(NodeMut::Element(element)) => match element.columns.as_mut() {
            Some(columns) => shift(columns, from, to)?,
            None => {
                return Err(MutationError::InvalidTarget {
                    node: "column",
                    target: "element",
                })
            }
        },
        None => return Err(MutationError::PathNotFound(container.to_string())),
    }

    if from != to {
        bump_sections(&mut next, container);
        bump_pages(&mut next, &[container]);
    }
    Ok(next)
}

/// Copy the node (and its subtree) with fresh ids, directly after the original
pub fn try_duplicate(
    doc: &Document,
    node_id: &str,
    factory: &mut NodeFactory,
) -> MutationResult<Document> {
    let source = locate(doc, node_id)?;
    let (parent, step) = source
        .split_last()
        .ok_or_else(|| MutationError::RootNode(node_id.to_string()))?;

    let copy = factory.deep_clone_with_fresh_ids(&node_at(doc, &source)?.to_owned_node());

    let mut next = doc.clone();
    let placed = insert_child(&mut next, &parent, copy, Some(step.index() + 1))?;

    bump_sections(&mut next, &placed);
    bump_pages(&mut next, &[&placed]);
    Ok(next)
}

/// Deep-merge `patch` into the props of a node (`null` removes a key).
///
/// A global navbar/footer that still carries its imported markup loses that
/// markup once any typed field is patched, so the typed props take over
/// rendering.
pub fn try_update_props(doc: &Document, node_id: &str, patch: &Props) -> MutationResult<Document> {
    let path = locate(doc, node_id)?;
    if patch.is_empty() {
        return Ok(doc.clone());
    }
    let is_slot = path.steps.is_empty() && path.page_id().is_none();

    let mut next = doc.clone();
    {
        let mut node = resolve_mut(&mut next, &path)
            .ok_or_else(|| MutationError::PathNotFound(path.to_string()))?;
        let props = node
            .props_mut()
            .ok_or_else(|| MutationError::NoProps(node_id.to_string()))?;
        deep_merge(props, patch);

        let typed_edit = patch.keys().any(|key| key != ORIGINAL_HTML);
        if is_slot && typed_edit && !patch.contains_key(ORIGINAL_HTML) {
            props.remove(ORIGINAL_HTML);
        }
    }

    bump_sections(&mut next, &path);
    bump_pages(&mut next, &[&path]);
    Ok(next)
}

pub fn try_add_page(
    doc: &Document,
    name: &str,
    factory: &mut NodeFactory,
) -> MutationResult<Document> {
    if name.trim().is_empty() {
        return Err(MutationError::InvalidStructure(
            "page name is empty".to_string(),
        ));
    }
    let mut next = doc.clone();
    next.add_page(factory.create_page(name.trim()));
    Ok(next)
}

pub fn try_set_active_page(doc: &Document, page_id: &str) -> MutationResult<Document> {
    let mut next = doc.clone();
    next.set_active_page(page_id)
        .map_err(|_| MutationError::PageNotFound(page_id.to_string()))?;
    Ok(next)
}

fn node_at<'a>(doc: &'a Document, path: &NodePath) -> MutationResult<NodeRef<'a>> {
    resolve(doc, path).ok_or_else(|| MutationError::PathNotFound(path.to_string()))
}

fn locate(doc: &Document, id: &str) -> MutationResult<NodePath> {
    path_of(doc, id).ok_or_else(|| MutationError::NodeNotFound(id.to_string()))
}

/// Whether `node` nests directly inside `container`
fn accepts(container: &NodeRef, node: &Node) -> bool {
    match (container, node) {
        (NodeRef::Page(_), Node::Section(_))
        | (NodeRef::Section(_), Node::Column(_))
        | (NodeRef::Column(_), Node::Element(_)) => true,
        (NodeRef::Element(element), Node::Column(_)) => element.kind.is_container(),
        _ => false,
    }
}

/// Insert `node` as a direct child of the container at `parent`, at `index`
/// clamped to the container (appending when absent). Returns the new
/// child's path.
fn insert_child(
    doc: &mut Document,
    parent: &NodePath,
    node: Node,
    index: Option<usize>,
) -> MutationResult<NodePath> {
    fn place<T>(items: &mut Vec<T>, index: Option<usize>, item: T) -> usize {
        let at = index.map_or(items.len(), |i| i.min(items.len()));
        items.insert(at, item);
        at
    }

    let step = match (resolve_mut(doc, parent), node) {
        (Some(NodeMut::Page(page)), Node::Section(section)) => {
            PathStep::Layout(place(&mut page.layout, index, section))
        }
        (Some(NodeMut::Section(section)), Node::Column(column)) => {
            PathStep::Column(place(&mut section.columns, index, column))
        }
        (Some(NodeMut::Column(column)), Node::Element(element)) => {
            PathStep::Element(place(&mut column.elements, index, element))
        }
        (Some(NodeMut::Element(element)), Node::Column(column)) if element.kind.is_container() => {
            let columns = element.columns.get_or_insert_with(Vec::new);
            PathStep::Column(place(columns, index, column))
        }
        (Some(container), node) => {
            return Err(MutationError::InvalidTarget {
                node: node.level(),
                target: container.level(),
            })
        }
        (None, _) => return Err(MutationError::PathNotFound(parent.to_string())),
    };

    Ok(parent.child(step))
}

/// Page that receives a section dropped below page level: the target's own
/// page, or the active page for targets inside a global slot
fn fallback_page(doc: &Document, target: &NodePath) -> String {
    target
        .page_id()
        .map(str::to_string)
        .unwrap_or_else(|| doc.active_page_id.clone())
}

fn with_full_width_column(mut section: Section, factory: &mut NodeFactory) -> Section {
    if section.columns.is_empty() {
        section.columns.push(factory.create_column("100%"));
    }
    section
}

fn bump_sections(doc: &mut Document, path: &NodePath) {
    for prefix in path.section_prefixes() {
        if let Some(NodeMut::Section(section)) = resolve_mut(doc, &prefix) {
            section.version += 1;
        }
    }
}

fn bump_pages(doc: &mut Document, paths: &[&NodePath]) {
    let pages: BTreeSet<&str> = paths.iter().filter_map(|p| p.page_id()).collect();
    for page_id in pages {
        if let Some(page) = doc.page_mut(page_id) {
            page.version += 1;
        }
    }
}
