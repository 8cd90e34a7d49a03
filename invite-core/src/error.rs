//! Error types for editor operations.

use thiserror::Error;

use crate::ObjectId;

/// Result type for editor operations.
pub type EditorResult<T> = Result<T, EditorError>;

/// Errors that can occur in editor operations.
#[derive(Debug, Error)]
pub enum EditorError {
    /// A portable document is missing required fields or carries invalid values.
    #[error("Malformed document: {0}")]
    MalformedDocument(String),

    /// A mutation referenced an object that is not in the document.
    #[error("Object not found: {0}")]
    ObjectNotFound(ObjectId),

    /// The operation does not apply to the target object.
    #[error("Invalid operation on object: {0}")]
    InvalidOperation(String),

    /// JSON encoding or decoding failed.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl EditorError {
    /// Shorthand for a [`EditorError::MalformedDocument`] with a formatted reason.
    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedDocument(reason.into())
    }

    /// Whether the error means the stored document itself is unusable.
    #[must_use]
    pub fn is_document_corruption(&self) -> bool {
        matches!(self, Self::MalformedDocument(_) | Self::Serialization(_))
    }
}
