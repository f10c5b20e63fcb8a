//! Error type shared by every stage of the rendering pipeline.
//!
//! Only two classes of failure abort a render: bad input (detected before
//! any layout work starts) and internal layout failures. A logo that cannot
//! be decoded is not an error; see [`crate::logo`].

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RenderError {
    /// A required field is missing, has the wrong type, or cannot be parsed.
    #[error("malformed input in `{field}`: {reason}")]
    MalformedInput { field: String, reason: String },

    /// A ledger entry whose amounts cannot be used to advance the balance.
    #[error("malformed transaction `{id}`: {reason}")]
    MalformedTransaction { id: String, reason: String },

    /// The layout reached a state it cannot recover from.
    #[error("render failure: {0}")]
    RenderFailure(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl RenderError {
    pub fn malformed(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedInput {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// True when the caller sent bad data (a 4xx-class failure).
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::MalformedInput { .. } | Self::MalformedTransaction { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, RenderError>;
