//! Error types for the editor

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EditorError {
    #[error("Document error: {0}")]
    Document(#[from] pagekit_document::DocumentError),

    #[error("Markup error: {0}")]
    Markup(#[from] pagekit_markup::MarkupError),

    #[error("Mutation error: {0}")]
    Mutation(#[from] crate::mutations::MutationError),

    #[error("History error: {0}")]
    History(#[from] crate::history::HistoryError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config: {0}")]
    Config(#[from] serde_json::Error),

    #[error("Page not found: {0}")]
    PageNotFound(String),

    #[error("Document is not file-backed")]
    NotFileBacked,
}

pub type EditorResult<T> = Result<T, EditorError>;
