//! # Invite Core
//!
//! Editor logic for the invitation designer's canvas.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │                EditorSession                │
//! ├─────────────────────────────────────────────┤
//! │  CanvasRuntime      │  History              │
//! │  - Objects, z-order │  - Snapshot timeline  │
//! │  - Selection        │  - Undo / redo        │
//! │  - Change events    │                       │
//! ├─────────────────────────────────────────────┤
//! │  Properties         │  Viewport             │
//! │  - Panel intents    │  - Fit-to-container   │
//! ├─────────────────────────────────────────────┤
//! │  SceneDocument  <->  portable form (schema) │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! The document is a fixed 600x800 logical surface. Everything that edits it
//! goes through [`CanvasRuntime`], which notifies listeners synchronously after
//! each successful mutation.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod document;
pub mod error;
pub mod event;
pub mod history;
pub mod object;
pub mod patch;
pub mod presets;
pub mod properties;
pub mod runtime;
pub mod schema;
pub mod session;
pub mod viewport;

pub use document::{Background, SceneDocument, DEFAULT_BACKGROUND, LOGICAL_HEIGHT, LOGICAL_WIDTH};
pub use error::{EditorError, EditorResult};
pub use event::{InputEvent, KeyModifiers, PointerEvent, PointerPhase};
pub use history::{History, HistoryConfig, HistoryEntry, HistoryState};
pub use object::{
    Bounds, CirclePayload, FontWeight, Geometry, GroupPayload, ImagePayload, ObjectId,
    ObjectKind, ObjectSpec, RectPayload, SceneObject, Shadow, SpecKind, Style, TextAlign,
    TextPayload,
};
pub use patch::ObjectPatch;
pub use properties::{PropertyIntent, TextPanelState};
pub use runtime::{
    CanvasRuntime, ChangeEvent, ChangeListener, LayerInfo, LayerKind, ListenerId,
    ReorderDirection,
};
pub use schema::{deserialize, deserialize_str, serialize, serialize_string, PortableForm};
pub use session::{EditorSession, SessionConfig};
pub use viewport::{ViewportConfig, ViewportTransform};

/// Invite core version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
