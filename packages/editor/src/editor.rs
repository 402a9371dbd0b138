//! # Editor
//!
//! Stateful handle around one document: the current tree, the node factory
//! that stamps new ids, undo history and the selection.
//!
//! ## Lifecycle
//!
//! ```text
//! open/import → apply(Mutation)* ─┬→ undo/redo
//!                                 └→ begin_generation → accept_generation (merge)
//!                                                         ↓
//!                                                   render / save
//! ```
//!
//! The selection is a node id, never a path; paths are recomputed from the
//! tree whenever they are asked for.

use crate::config::EditorConfig;
use crate::errors::{EditorError, EditorResult};
use crate::history::{History, HistoryEntry};
use crate::merge::merge_document;
use crate::mutations::Mutation;
use crate::session::{GenerationOutcome, GenerationResponse, GenerationSession, GenerationTicket};
use pagekit_document::{Document, NodeFactory, NodePath, PathIndex};
use pagekit_markup::{parse_markup, serialize_document, Codec, SerializeMode, SerializeOptions};
use std::path::{Path, PathBuf};
use tracing::{debug, instrument, warn};

#[derive(Debug)]
pub struct Editor {
    document: Document,
    factory: NodeFactory,
    history: History,
    selection: Option<String>,
    /// Rebuilt on every commit
    paths: PathIndex,
    config: EditorConfig,
    /// Backing file, if the document was opened from or saved to disk
    path: Option<PathBuf>,
    dirty: bool,
}

impl Editor {
    pub fn new(document: Document, config: EditorConfig) -> Self {
        let factory = config.node_factory();
        Self::with_factory(document, factory, config)
    }

    /// Editor over a fresh document with one empty page
    pub fn blank(page_name: &str, config: EditorConfig) -> Self {
        let mut factory = config.node_factory();
        let document = Document::new(factory.create_page(page_name));
        Self::with_factory(document, factory, config)
    }

    /// Editor over a document converted from markup with the configured codec
    pub fn from_markup(html: &str, page_name: &str, config: EditorConfig) -> Self {
        let mut factory = config.node_factory();
        let document = parse_markup(html, config.default_codec, &mut factory)
            .into_document(&mut factory, page_name);
        Self::with_factory(document, factory, config)
    }

    /// Load a document JSON file (file-backed)
    pub fn open(path: &Path, config: EditorConfig) -> EditorResult<Self> {
        let document = Document::load(path)?;
        let mut editor = Self::new(document, config);
        editor.path = Some(path.to_path_buf());
        Ok(editor)
    }

    fn with_factory(document: Document, mut factory: NodeFactory, config: EditorConfig) -> Self {
        // a seeded factory restarts its counter; skip what the document already uses
        factory.reserve_ids(&document);
        let mut editor = Self {
            paths: PathIndex::build(&document),
            document,
            factory,
            history: History::with_capacity(config.history_limit),
            selection: None,
            config,
            path: None,
            dirty: false,
        };
        editor.record_snapshot("open");
        editor
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn factory_mut(&mut self) -> &mut NodeFactory {
        &mut self.factory
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn save(&mut self) -> EditorResult<()> {
        let path = self.path.clone().ok_or(EditorError::NotFileBacked)?;
        self.save_as(&path)
    }

    pub fn save_as(&mut self, path: &Path) -> EditorResult<()> {
        self.document.save(path)?;
        self.path = Some(path.to_path_buf());
        self.dirty = false;
        Ok(())
    }

    /// Apply a mutation. Returns `false` when it was refused or changed
    /// nothing; no history entry is recorded in that case.
    #[instrument(skip(self, mutation), fields(mutation = mutation.label()))]
    pub fn apply(&mut self, mutation: &Mutation) -> bool {
        let next = mutation.apply(&self.document, &mut self.factory);
        if next == self.document {
            debug!("Mutation left the document unchanged");
            return false;
        }

        self.commit(next);
        self.record_snapshot(mutation.label());
        true
    }

    /// Like [`Editor::apply`], but reports why a mutation was refused
    pub fn try_apply(&mut self, mutation: &Mutation) -> EditorResult<()> {
        let next = mutation.try_apply(&self.document, &mut self.factory)?;
        if next != self.document {
            self.commit(next);
            self.record_snapshot(mutation.label());
        }
        Ok(())
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Step back one history entry. No-op (`false`) at the start.
    pub fn undo(&mut self) -> bool {
        let Some(entry) = self.history.undo().cloned() else {
            return false;
        };
        if self.restore(&entry) {
            return true;
        }
        self.history.redo();
        false
    }

    /// Step forward one history entry. No-op (`false`) at the end.
    pub fn redo(&mut self) -> bool {
        let Some(entry) = self.history.redo().cloned() else {
            return false;
        };
        if self.restore(&entry) {
            return true;
        }
        self.history.undo();
        false
    }

    pub fn selection(&self) -> Option<&str> {
        self.selection.as_deref()
    }

    /// Select a node by id; unknown ids leave the selection as it was
    pub fn select(&mut self, id: &str) -> bool {
        if !self.document.contains(id) {
            return false;
        }
        self.selection = Some(id.to_string());
        true
    }

    pub fn clear_selection(&mut self) {
        self.selection = None;
    }

    /// Current path of a node
    pub fn path_of(&self, id: &str) -> Option<NodePath> {
        self.paths.path_of(&self.document, id)
    }

    /// Current path of the selected node
    pub fn selected_path(&self) -> Option<NodePath> {
        self.path_of(self.selection.as_deref()?)
    }

    /// Issue the next request of `session`. Any earlier ticket of the same
    /// session becomes stale.
    pub fn begin_generation(
        &self,
        session: &mut GenerationSession,
        prompt: impl Into<String>,
    ) -> GenerationTicket {
        let ticket = session.next_request(prompt);
        debug!(
            session = %ticket.request.session_id,
            seq = ticket.request_seq,
            "Generation requested"
        );
        ticket
    }

    /// Merge a generator response into `page_id`, unless the ticket has
    /// been superseded or belongs to another session
    #[instrument(skip_all, fields(session = %session.session_id, seq = ticket.request_seq))]
    pub fn accept_generation(
        &mut self,
        session: &GenerationSession,
        ticket: &GenerationTicket,
        response: GenerationResponse,
        page_id: &str,
    ) -> GenerationOutcome {
        if !session.is_current(ticket) {
            debug!(current = session.request_seq(), "Discarding stale generation response");
            return GenerationOutcome::Stale;
        }
        if !self.merge_markup(&response.html, page_id, "generate") {
            return GenerationOutcome::PageMissing(page_id.to_string());
        }

        GenerationOutcome::Applied {
            summary: response.summary,
            suggestions: response.follow_up_suggestions.unwrap_or_default(),
        }
    }

    /// Convert markup with the configured codec and merge it into a page
    pub fn import_markup(&mut self, html: &str, page_id: &str) -> EditorResult<()> {
        if self.merge_markup(html, page_id, "import") {
            Ok(())
        } else {
            Err(EditorError::PageNotFound(page_id.to_string()))
        }
    }

    /// Serialize a page in the configured mode
    pub fn render(&self, page_id: &str) -> Option<String> {
        let options = match self.config.serialize_mode {
            SerializeMode::Authoring => SerializeOptions::default(),
            SerializeMode::Publish => SerializeOptions::publish(),
        };
        serialize_document(&self.document, page_id, &options)
    }

    fn merge_markup(&mut self, html: &str, page_id: &str, label: &str) -> bool {
        if self.document.page(page_id).is_none() {
            warn!(page_id, "Cannot merge markup into a missing page");
            return false;
        }

        let incoming = parse_markup(html, self.config.default_codec, &mut self.factory);
        let merged = merge_document(&self.document, page_id, &incoming);
        self.commit(merged);
        self.record_markup(page_id, label);
        true
    }

    fn commit(&mut self, next: Document) {
        self.document = next;
        self.paths.refresh(&self.document);
        self.dirty = true;
        if let Some(id) = &self.selection {
            if !self.document.contains(id) {
                debug!(node_id = %id, "Selected node is gone, clearing selection");
                self.selection = None;
            }
        }
    }

    fn restore(&mut self, entry: &HistoryEntry) -> bool {
        match entry.restore(&self.document, &mut self.factory) {
            Ok(document) => {
                self.commit(document);
                true
            }
            Err(error) => {
                warn!(entry = %entry.id, %error, "Could not restore history entry");
                false
            }
        }
    }

    fn record_snapshot(&mut self, label: &str) {
        match HistoryEntry::snapshot(&self.document, label) {
            Ok(entry) => {
                self.history.push(entry);
            }
            Err(error) => warn!(%error, "Could not record history snapshot"),
        }
    }

    /// Record the page as authoring markup. Authoring markers restore
    /// exactly through the lossless codec whichever codec produced the tree.
    fn record_markup(&mut self, page_id: &str, label: &str) {
        match serialize_document(&self.document, page_id, &SerializeOptions::default()) {
            Some(markup) => {
                self.history
                    .push(HistoryEntry::markup(page_id, markup, Codec::Lossless, label));
            }
            None => self.record_snapshot(label),
        }
    }
}
