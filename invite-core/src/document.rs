//! The scene document: ordered objects on a fixed-size design surface.

use serde::{Deserialize, Serialize};

use crate::{ObjectId, SceneObject};

/// Logical canvas width in design units.
pub const LOGICAL_WIDTH: f64 = 600.0;

/// Logical canvas height in design units.
pub const LOGICAL_HEIGHT: f64 = 800.0;

/// Default background colour of a new document.
pub const DEFAULT_BACKGROUND: &str = "#ffffff";

/// Document background.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Background {
    /// Solid colour (any CSS colour string).
    Color(String),
    /// Image stretched over the whole canvas.
    Image {
        /// Image URL, resolved by the asset collaborator.
        #[serde(rename = "image")]
        src: String,
    },
}

impl Default for Background {
    fn default() -> Self {
        Self::Color(DEFAULT_BACKGROUND.to_string())
    }
}

/// The serializable design state.
///
/// Object order is z-order: later entries paint on top. The logical size is
/// fixed at [`LOGICAL_WIDTH`] x [`LOGICAL_HEIGHT`] for every document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SceneDocument {
    objects: Vec<SceneObject>,
    background: Background,
}

impl SceneDocument {
    /// Create an empty document with a white background.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a document from parts. Callers are responsible for id uniqueness.
    #[must_use]
    pub fn from_parts(objects: Vec<SceneObject>, background: Background) -> Self {
        Self {
            objects,
            background,
        }
    }

    /// The fixed logical `(width, height)`.
    #[must_use]
    pub const fn logical_size(&self) -> (f64, f64) {
        (LOGICAL_WIDTH, LOGICAL_HEIGHT)
    }

    /// Objects in paint order.
    #[must_use]
    pub fn objects(&self) -> &[SceneObject] {
        &self.objects
    }

    /// The background.
    #[must_use]
    pub fn background(&self) -> &Background {
        &self.background
    }

    /// Get an object by ID.
    #[must_use]
    pub fn get(&self, id: &ObjectId) -> Option<&SceneObject> {
        self.objects.iter().find(|o| &o.id == id)
    }

    /// Get a mutable reference to an object by ID.
    pub(crate) fn get_mut(&mut self, id: &ObjectId) -> Option<&mut SceneObject> {
        self.objects.iter_mut().find(|o| &o.id == id)
    }

    /// Z-order position of an object.
    #[must_use]
    pub fn index_of(&self, id: &ObjectId) -> Option<usize> {
        self.objects.iter().position(|o| &o.id == id)
    }

    /// Number of top-level objects.
    #[must_use]
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Check if the document has no objects.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub(crate) fn push(&mut self, object: SceneObject) {
        self.objects.push(object);
    }

    pub(crate) fn remove(&mut self, id: &ObjectId) -> Option<SceneObject> {
        let index = self.index_of(id)?;
        Some(self.objects.remove(index))
    }

    pub(crate) fn swap(&mut self, a: usize, b: usize) {
        self.objects.swap(a, b);
    }

    pub(crate) fn set_background(&mut self, background: Background) {
        self.background = background;
    }
}
