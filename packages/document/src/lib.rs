//! # Pagekit Document
//!
//! In-memory tree of an editable landing page:
//!
//! ```text
//! Document
//!  ├─ pages[<id>] ── layout[i] (Section) ── columns[j] (Column) ── elements[k] (Element)
//!  │                                                                  └─ columns[..] (inner section)
//!  ├─ globalNavbar (Section, links in props)
//!  └─ globalFooter (Section)
//! ```
//!
//! ## Identity
//!
//! Every node carries an immutable `id`. Ids are the only durable handle;
//! a [`NodePath`] is a positional view recomputed from the tree whenever it
//! is needed and never kept across a structural change. [`PathIndex`] is a
//! cache of those views that re-validates every answer against the tree it
//! is asked about.

mod error;
mod id_generator;
mod model;
mod path;
mod props;
mod registry;
mod shape;
mod walk;

pub use error::{DocumentError, DocumentResult, PathError};
pub use id_generator::{seed_from, IdGenerator};
pub use model::{
    Column, ColumnKind, Comment, Document, Element, ElementKind, Node, NodeMut, NodeRef, Page,
    Props, Section, SectionKind, BASELINE_VERSION, GLOBAL_FOOTER_ID, GLOBAL_NAVBAR_ID,
};
pub use path::{path_of, remove, resolve, resolve_mut, resolve_str, set, NodePath, PathRoot, PathStep};
pub use props::deep_merge;
pub use registry::{width_label, NodeFactory};
pub use shape::shape_of;
pub use walk::{walk, PathIndex};
