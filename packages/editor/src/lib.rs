//! # Pagekit Editor
//!
//! Editing engine for Pagekit documents.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ markup: HTML ⇄ sections (semantic/lossless) │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ editor: Document lifecycle                  │
//! │  - Pure structural mutations                │
//! │  - Merge of generated content               │
//! │  - Linear undo/redo history                 │
//! │  - Generation session tokens                │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ document: tree, ids, paths                  │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Core Principles
//!
//! 1. **Values, not handles**: every mutation returns a new [`Document`](pagekit_document::Document)
//! 2. **Never throw across the API**: refused edits are no-ops, logged at debug level
//! 3. **User edits win**: merge keeps sections whose version moved past baseline
//! 4. **No ambient session**: generation state travels in an explicit token
//!
//! ## Usage
//!
//! ```rust,ignore
//! use pagekit_editor::{Editor, EditorConfig, Mutation};
//!
//! let mut editor = Editor::blank("Home", EditorConfig::default());
//! let page = editor.document().active_page_id.clone();
//!
//! editor.apply(&Mutation::Insert {
//!     target: NodePath::page(&page),
//!     node: Node::Section(editor.factory_mut().create_section()),
//!     index: None,
//! });
//! editor.undo();
//! ```

mod config;
mod editor;
mod errors;
mod history;
mod merge;
mod mutations;
mod session;

pub use config::{EditorConfig, DEFAULT_CONFIG_NAME};
pub use editor::Editor;
pub use errors::{EditorError, EditorResult};
pub use history::{History, HistoryEntry, HistoryError, DEFAULT_CAPACITY};
pub use merge::{merge_document, merge_page, merge_sections, merge_slot, structural_key, StructuralKey};
pub use mutations::{
    add_page, delete, duplicate, insert, move_node, reorder, set_structure, try_add_page,
    try_delete, try_duplicate, try_insert, try_move_node, try_reorder, try_set_active_page,
    try_set_structure, try_update_props, update_props, Mutation, MutationError, MutationResult,
};
pub use session::{
    GenerationOutcome, GenerationRequest, GenerationResponse, GenerationSession, GenerationTicket,
};
