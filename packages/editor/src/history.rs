//! # History
//!
//! Linear undo/redo over serialized states.
//!
//! - Entries are ordered oldest first, and a single cursor points at the
//!   entry for the current state.
//! - Pushing a new entry discards everything after the cursor, so redo
//!   history is lost on new edits. There is no branching.
//! - Undo and redo only move the cursor. At either end they are no-ops.
//! - Beyond `capacity` entries the oldest are evicted (0 = unlimited).
//!
//! Entries either hold a JSON snapshot of the whole document (local edits)
//! or the authoring markup of one page after a generation, which is run
//! back through its codec when restored.

use chrono::Utc;
use pagekit_document::{Document, NodeFactory};
use pagekit_markup::{parse_markup, Codec};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_CAPACITY: usize = 100;

#[derive(Error, Debug)]
pub enum HistoryError {
    #[error("Invalid snapshot: {0}")]
    Snapshot(#[from] serde_json::Error),

    #[error("Markup entry {0} does not name a page")]
    MissingPage(String),

    #[error("Page not found: {0}")]
    PageNotFound(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    /// Assigned when the entry is pushed
    #[serde(default)]
    pub id: String,
    /// RFC 3339, UTC
    pub timestamp: String,
    pub serialized_markup: String,
    /// `None` for document snapshots
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub codec: Option<Codec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl HistoryEntry {
    /// Entry holding the whole document as JSON
    pub fn snapshot(doc: &Document, label: impl Into<String>) -> Result<Self, HistoryError> {
        Ok(Self {
            id: String::new(),
            timestamp: Utc::now().to_rfc3339(),
            serialized_markup: serde_json::to_string(doc)?,
            codec: None,
            page_id: None,
            label: Some(label.into()),
        })
    }

    /// Entry holding the authoring markup of one page
    pub fn markup(
        page_id: impl Into<String>,
        markup: impl Into<String>,
        codec: Codec,
        label: impl Into<String>,
    ) -> Self {
        Self {
            id: String::new(),
            timestamp: Utc::now().to_rfc3339(),
            serialized_markup: markup.into(),
            codec: Some(codec),
            page_id: Some(page_id.into()),
            label: Some(label.into()),
        }
    }

    pub fn is_snapshot(&self) -> bool {
        self.codec.is_none()
    }

    /// Rebuild the document this entry describes. Markup entries replace the
    /// page layout and global slots of `current` and leave the rest of it
    /// alone.
    pub fn restore(
        &self,
        current: &Document,
        factory: &mut NodeFactory,
    ) -> Result<Document, HistoryError> {
        let Some(codec) = self.codec else {
            return Ok(serde_json::from_str(&self.serialized_markup)?);
        };

        let page_id = self
            .page_id
            .as_deref()
            .ok_or_else(|| HistoryError::MissingPage(self.id.clone()))?;
        let parsed = parse_markup(&self.serialized_markup, codec, factory);

        let mut doc = current.clone();
        let page = doc
            .page_mut(page_id)
            .ok_or_else(|| HistoryError::PageNotFound(page_id.to_string()))?;
        page.layout = parsed.sections;
        doc.global_navbar = parsed.global_navbar;
        doc.global_footer = parsed.global_footer;
        Ok(doc)
    }
}

#[derive(Debug, Clone)]
pub struct History {
    entries: Vec<HistoryEntry>,
    cursor: Option<usize>,
    capacity: usize,
    sequence: u64,
}

impl History {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::new(),
            cursor: None,
            capacity,
            sequence: 0,
        }
    }

    /// Record a new current state, dropping any redo entries
    pub fn push(&mut self, mut entry: HistoryEntry) -> &HistoryEntry {
        match self.cursor {
            Some(cursor) => self.entries.truncate(cursor + 1),
            None => self.entries.clear(),
        }

        self.sequence += 1;
        entry.id = format!("entry-{}", self.sequence);
        self.entries.push(entry);

        if self.capacity > 0 && self.entries.len() > self.capacity {
            let overflow = self.entries.len() - self.capacity;
            self.entries.drain(..overflow);
        }

        let last = self.entries.len() - 1;
        self.cursor = Some(last);
        &self.entries[last]
    }

    /// Step back; the returned entry describes the state to restore
    pub fn undo(&mut self) -> Option<&HistoryEntry> {
        let cursor = self.cursor.filter(|c| *c > 0)? - 1;
        self.cursor = Some(cursor);
        self.entries.get(cursor)
    }

    pub fn redo(&mut self) -> Option<&HistoryEntry> {
        let cursor = self.cursor? + 1;
        if cursor >= self.entries.len() {
            return None;
        }
        self.cursor = Some(cursor);
        self.entries.get(cursor)
    }

    pub fn current(&self) -> Option<&HistoryEntry> {
        self.entries.get(self.cursor?)
    }

    pub fn can_undo(&self) -> bool {
        self.cursor.is_some_and(|c| c > 0)
    }

    pub fn can_redo(&self) -> bool {
        self.cursor.is_some_and(|c| c + 1 < self.entries.len())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.cursor = None;
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagekit_document::IdGenerator;

    fn entry(label: &str) -> HistoryEntry {
        HistoryEntry::markup("home", format!("<p>{}</p>", label), Codec::Lossless, label)
    }

    fn label(entry: Option<&HistoryEntry>) -> Option<&str> {
        entry.and_then(|e| e.label.as_deref())
    }

    #[test]
    fn test_undo_redo_are_no_ops_at_the_ends() {
        let mut history = History::new();
        assert!(history.undo().is_none());
        assert!(history.redo().is_none());

        history.push(entry("a"));
        assert!(!history.can_undo());
        assert!(history.undo().is_none());
        assert!(history.redo().is_none());
        assert_eq!(label(history.current()), Some("a"));
    }

    #[test]
    fn test_undo_then_redo_is_symmetric() {
        let mut history = History::new();
        for name in ["a", "b", "c", "d"] {
            history.push(entry(name));
        }

        for _ in 0..4 {
            history.undo();
        }
        assert_eq!(label(history.current()), Some("a"));
        for _ in 0..4 {
            history.redo();
        }
        assert_eq!(label(history.current()), Some("d"));
        assert!(!history.can_redo());
    }

    #[test]
    fn test_push_discards_redo_entries() {
        let mut history = History::new();
        history.push(entry("a"));
        history.push(entry("b"));
        history.push(entry("c"));
        history.undo();
        history.undo();

        history.push(entry("x"));
        assert_eq!(history.len(), 2);
        assert_eq!(label(history.current()), Some("x"));
        assert!(history.redo().is_none());
        assert_eq!(label(history.undo()), Some("a"));
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let mut history = History::with_capacity(3);
        for name in ["a", "b", "c", "d", "e"] {
            history.push(entry(name));
        }

        assert_eq!(history.len(), 3);
        assert_eq!(label(history.entries().first()), Some("c"));
        assert_eq!(label(history.current()), Some("e"));
        assert_eq!(history.current().map(|e| e.id.as_str()), Some("entry-5"));

        history.undo();
        history.undo();
        assert!(!history.can_undo());
        assert_eq!(label(history.current()), Some("c"));
    }

    #[test]
    fn test_snapshot_restores_exactly() {
        let mut factory = NodeFactory::with_ids(IdGenerator::from_seed("history"));
        let mut page = factory.create_page("Home");
        page.layout.push(factory.create_section_with_column());
        let doc = Document::new(page);

        let snapshot = HistoryEntry::snapshot(&doc, "open").unwrap();
        assert!(snapshot.is_snapshot());

        let other = Document::new(factory.create_page("Other"));
        assert_eq!(snapshot.restore(&other, &mut factory).unwrap(), doc);
    }

    #[test]
    fn test_markup_entry_replaces_page_layout() {
        let mut factory = NodeFactory::with_ids(IdGenerator::from_seed("history"));
        let page = factory.create_page("Home");
        let page_id = page.id.clone();
        let doc = Document::new(page);

        let entry = HistoryEntry::markup(
            page_id.clone(),
            "<section><h1>Hi</h1></section><footer><p>Bye</p></footer>",
            Codec::Lossless,
            "generate",
        );
        let restored = entry.restore(&doc, &mut factory).unwrap();

        assert_eq!(restored.pages[&page_id].layout.len(), 1);
        assert!(restored.global_footer.is_some());

        let stray = HistoryEntry::markup("gone", "<p>x</p>", Codec::Lossless, "generate");
        assert!(matches!(
            stray.restore(&doc, &mut factory),
            Err(HistoryError::PageNotFound(_))
        ));
    }

    #[test]
    fn test_entry_wire_format() {
        let mut history = History::new();
        let pushed = history.push(entry("a")).clone();
        let json = serde_json::to_value(&pushed).unwrap();

        assert_eq!(json["id"], "entry-1");
        assert_eq!(json["serializedMarkup"], "<p>a</p>");
        assert_eq!(json["codec"], "lossless");
        assert_eq!(json["pageId"], "home");
        assert!(json["timestamp"].as_str().unwrap().contains('T'));
    }
}
