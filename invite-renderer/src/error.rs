//! Renderer error types.

use std::time::Duration;

use invite_core::EditorError;
use thiserror::Error;

/// Result type for renderer operations.
pub type RenderResult<T> = Result<T, RenderError>;

/// Errors that can occur during rendering.
#[derive(Debug, Error)]
pub enum RenderError {
    /// A preview did not finish within its time bound.
    #[error("Render timed out after {0:?}")]
    Timeout(Duration),

    /// An image referenced by the document could not be fetched or decoded.
    #[error("Failed to load resource: {0}")]
    ResourceLoad(String),

    /// The generated SVG could not be parsed.
    #[error("SVG error: {0}")]
    Svg(String),

    /// Rasterization or encoding failed.
    #[error("Export failed: {0}")]
    Export(String),

    /// The portable form could not be turned into a document.
    #[error(transparent)]
    Document(#[from] EditorError),
}

impl RenderError {
    /// Whether a caller should fall back to the placeholder image.
    ///
    /// Every render failure does; a malformed document is also reported to
    /// the user.
    #[must_use]
    pub fn is_user_visible(&self) -> bool {
        matches!(self, Self::Timeout(_) | Self::Document(_))
    }
}

#[cfg(feature = "http")]
impl From<reqwest::Error> for RenderError {
    fn from(e: reqwest::Error) -> Self {
        Self::ResourceLoad(e.to_string())
    }
}

impl From<std::io::Error> for RenderError {
    fn from(e: std::io::Error) -> Self {
        Self::ResourceLoad(e.to_string())
    }
}
