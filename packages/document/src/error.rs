use thiserror::Error;

pub type DocumentResult<T> = Result<T, DocumentError>;

#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid document JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Page not found: {0}")]
    PageNotFound(String),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PathError {
    #[error("Malformed path '{path}': {reason}")]
    Malformed { path: String, reason: String },

    #[error("Unknown path key '{0}'")]
    UnknownKey(String),
}

impl PathError {
    pub fn malformed(path: &str, reason: impl Into<String>) -> Self {
        Self::Malformed {
            path: path.to_string(),
            reason: reason.into(),
        }
    }
}
