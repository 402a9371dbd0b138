use crate::model::{Column, Document, NodeRef};
use crate::path::{resolve, NodePath, PathStep};
use std::collections::HashMap;

/// Every node of the document paired with its current path, in document
/// order: pages (by id), then the global navbar and footer.
pub fn walk(doc: &Document) -> Vec<(NodePath, NodeRef<'_>)> {
    let mut out = Vec::new();

    for page in doc.pages.values() {
        let page_path = NodePath::page(page.id.clone());
        out.push((page_path.clone(), NodeRef::Page(page)));
        for (i, section) in page.layout.iter().enumerate() {
            let section_path = page_path.child(PathStep::Layout(i));
            out.push((section_path.clone(), NodeRef::Section(section)));
            walk_columns(&section.columns, &section_path, &mut out);
        }
    }

    if let Some(navbar) = &doc.global_navbar {
        let path = NodePath::navbar();
        out.push((path.clone(), NodeRef::Section(navbar)));
        walk_columns(&navbar.columns, &path, &mut out);
    }
    if let Some(footer) = &doc.global_footer {
        let path = NodePath::footer();
        out.push((path.clone(), NodeRef::Section(footer)));
        walk_columns(&footer.columns, &path, &mut out);
    }

    out
}

fn walk_columns<'a>(
    columns: &'a [Column],
    parent: &NodePath,
    out: &mut Vec<(NodePath, NodeRef<'a>)>,
) {
    for (i, column) in columns.iter().enumerate() {
        let column_path = parent.child(PathStep::Column(i));
        out.push((column_path.clone(), NodeRef::Column(column)));
        for (j, element) in column.elements.iter().enumerate() {
            let element_path = column_path.child(PathStep::Element(j));
            out.push((element_path.clone(), NodeRef::Element(element)));
            if let Some(inner) = &element.columns {
                walk_columns(inner, &element_path, out);
            }
        }
    }
}

/// Id → path side index.
///
/// Built from one document value. Lookups re-resolve the cached path against
/// the document they are given and fall back to a full search when the entry
/// is missing or no longer points at the same id, so a stale index can cost
/// time but never return a wrong path.
#[derive(Debug, Default, Clone)]
pub struct PathIndex {
    paths: HashMap<String, NodePath>,
}

impl PathIndex {
    pub fn build(doc: &Document) -> Self {
        let paths = walk(doc)
            .into_iter()
            .map(|(path, node)| (node.id().to_string(), path))
            .collect();
        Self { paths }
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Path of `id` in `doc`
    pub fn path_of(&self, doc: &Document, id: &str) -> Option<NodePath> {
        if let Some(path) = self.paths.get(id) {
            if resolve(doc, path).map(|node| node.id()) == Some(id) {
                return Some(path.clone());
            }
            tracing::trace!(node_id = %id, path = %path, "Stale path index entry");
        }
        crate::path::path_of(doc, id)
    }

    /// Rebuild after a structural change
    pub fn refresh(&mut self, doc: &Document) {
        *self = Self::build(doc);
    }
}
