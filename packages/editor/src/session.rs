//! # Generation Sessions
//!
//! Boundary types for the external content generator.
//!
//! A [`GenerationSession`] is an explicit token owned by the caller. Each
//! request issued through it gets the next sequence number; only a response
//! to the latest request of the same session is ever merged. Anything older
//! is stale and dropped before it reaches the document. The engine itself
//! has no notion of a request being in flight.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationSession {
    pub session_id: String,
    request_seq: u64,
}

impl GenerationSession {
    pub fn new(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            request_seq: 0,
        }
    }

    /// Sequence number of the most recent request
    pub fn request_seq(&self) -> u64 {
        self.request_seq
    }

    pub(crate) fn next_request(&mut self, prompt: impl Into<String>) -> GenerationTicket {
        self.request_seq += 1;
        GenerationTicket {
            request: GenerationRequest {
                session_id: self.session_id.clone(),
                prompt: prompt.into(),
            },
            request_seq: self.request_seq,
        }
    }

    /// Whether a response to `ticket` may still be applied
    pub fn is_current(&self, ticket: &GenerationTicket) -> bool {
        ticket.request.session_id == self.session_id && ticket.request_seq == self.request_seq
    }
}

/// What is sent to the generator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequest {
    pub session_id: String,
    pub prompt: String,
}

/// A request plus the sequence number it was issued under
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationTicket {
    pub request: GenerationRequest,
    pub request_seq: u64,
}

/// What the generator sends back. `summary` and the suggestions are passed
/// through to the caller untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationResponse {
    pub html: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(
        default,
        alias = "follow_up_suggestions",
        skip_serializing_if = "Option::is_none"
    )]
    pub follow_up_suggestions: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationOutcome {
    /// Merged into the page and recorded in history
    Applied {
        summary: Option<String>,
        suggestions: Vec<String>,
    },
    /// Superseded or foreign ticket; the document was not touched
    Stale,
    /// The target page no longer exists; the document was not touched
    PageMissing(String),
}
