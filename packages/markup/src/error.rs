use thiserror::Error;

pub type MarkupResult<T> = Result<T, MarkupError>;

/// Problems met while converting markup. None of these escape the codecs:
/// the offending fragment is dropped or defaulted and the error is logged.
#[derive(Error, Debug)]
pub enum MarkupError {
    #[error("Invalid {attribute} marker: {reason}")]
    InvalidMarker { attribute: String, reason: String },

    #[error("Unknown codec: {0}")]
    UnknownCodec(String),

    #[error("Unknown serialize mode: {0}")]
    UnknownMode(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl MarkupError {
    pub fn invalid_marker(attribute: &str, reason: impl Into<String>) -> Self {
        Self::InvalidMarker {
            attribute: attribute.to_string(),
            reason: reason.into(),
        }
    }
}
