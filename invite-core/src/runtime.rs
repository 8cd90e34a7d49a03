//! The live canvas: one mutable document plus selection and text-edit state.
//!
//! Every successful mutation synchronously notifies registered listeners, in
//! the order the operations were invoked. Rendering is read-only and never
//! notifies.

use std::fmt;

use crate::object::ObjectKind;
use crate::{
    Background, EditorError, EditorResult, ObjectId, ObjectPatch, ObjectSpec, SceneDocument,
    SceneObject,
};

/// Maximum characters of text content shown as a layer name.
const LAYER_NAME_MAX_CHARS: usize = 20;

/// What changed in the runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeEvent {
    /// An object was appended on top.
    ObjectAdded(ObjectId),
    /// An object was deleted.
    ObjectRemoved(ObjectId),
    /// An object's geometry, style or payload was written.
    ObjectModified(ObjectId),
    /// An object moved one step in z-order.
    ObjectReordered(ObjectId),
    /// The background was set.
    BackgroundChanged,
    /// The whole document was swapped (load, undo, redo).
    Replaced,
    /// The active object changed.
    SelectionChanged(Option<ObjectId>),
    /// Text edit mode was entered (`Some`) or left (`None`).
    TextEditingChanged(Option<ObjectId>),
}

impl ChangeEvent {
    /// Whether the event is an edit of document content that history should
    /// capture. Selection, edit-mode and wholesale replacement are not.
    #[must_use]
    pub fn is_edit(&self) -> bool {
        matches!(
            self,
            Self::ObjectAdded(_)
                | Self::ObjectRemoved(_)
                | Self::ObjectModified(_)
                | Self::ObjectReordered(_)
                | Self::BackgroundChanged
        )
    }
}

/// Direction for a one-step z-order move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReorderDirection {
    /// Towards the top (later in paint order).
    Forward,
    /// Towards the bottom (earlier in paint order).
    Backward,
}

/// Handle returned by [`CanvasRuntime::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Callback invoked after each mutation with the event and the updated document.
pub type ChangeListener = Box<dyn FnMut(&ChangeEvent, &SceneDocument)>;

/// Coarse object category shown in the layers panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerKind {
    /// Text object.
    Text,
    /// Image object.
    Image,
    /// Rectangle or circle.
    Shape,
    /// Group sticker.
    Group,
}

/// One row of the layers panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerInfo {
    /// Object id.
    pub id: ObjectId,
    /// Display name.
    pub name: String,
    /// Category.
    pub kind: LayerKind,
    /// Visibility flag.
    pub visible: bool,
    /// Lock flag.
    pub locked: bool,
}

/// Owns the live document and mediates every mutation of it.
pub struct CanvasRuntime {
    document: SceneDocument,
    active: Option<ObjectId>,
    editing_text: Option<ObjectId>,
    listeners: Vec<(ListenerId, ChangeListener)>,
    next_listener: u64,
}

impl fmt::Debug for CanvasRuntime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CanvasRuntime")
            .field("document", &self.document)
            .field("active", &self.active)
            .field("editing_text", &self.editing_text)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl Default for CanvasRuntime {
    fn default() -> Self {
        Self::new()
    }
}

impl CanvasRuntime {
    /// Create a runtime over an empty, white document.
    #[must_use]
    pub fn new() -> Self {
        Self::with_document(SceneDocument::new())
    }

    /// Create a runtime over an existing document.
    #[must_use]
    pub fn with_document(document: SceneDocument) -> Self {
        Self {
            document,
            active: None,
            editing_text: None,
            listeners: Vec::new(),
            next_listener: 0,
        }
    }

    /// The live document.
    #[must_use]
    pub fn document(&self) -> &SceneDocument {
        &self.document
    }

    /// Get an object by ID.
    #[must_use]
    pub fn get(&self, id: &ObjectId) -> Option<&SceneObject> {
        self.document.get(id)
    }

    /// Register a change listener.
    pub fn subscribe(&mut self, listener: ChangeListener) -> ListenerId {
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        self.listeners.push((id, listener));
        id
    }

    /// Remove a change listener. Returns `false` if it was not registered.
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(lid, _)| *lid != id);
        self.listeners.len() != before
    }

    fn emit(&mut self, event: &ChangeEvent) {
        let document = &self.document;
        for (_, listener) in &mut self.listeners {
            listener(event, document);
        }
    }

    fn set_active(&mut self, id: Option<ObjectId>) {
        if self.active != id {
            self.active.clone_from(&id);
            self.emit(&ChangeEvent::SelectionChanged(id));
        }
    }

    /// Append a new object on top and make it the active selection.
    pub fn add_object(&mut self, spec: ObjectSpec) -> ObjectId {
        self.exit_text_editing();
        let object = SceneObject::from_spec(spec);
        let id = object.id.clone();
        tracing::debug!("Add {} object {id}", object.kind.tag());
        self.document.push(object);
        self.emit(&ChangeEvent::ObjectAdded(id.clone()));
        self.set_active(Some(id.clone()));
        id
    }

    /// Delete an object. Unknown ids are treated as already removed.
    ///
    /// Returns whether an object was removed.
    pub fn remove_object(&mut self, id: &ObjectId) -> bool {
        if self.document.remove(id).is_none() {
            tracing::debug!("Remove of unknown object {id} ignored");
            return false;
        }
        if self.editing_text.as_ref() == Some(id) {
            self.editing_text = None;
            self.emit(&ChangeEvent::TextEditingChanged(None));
        }
        self.emit(&ChangeEvent::ObjectRemoved(id.clone()));
        if self.active.as_ref() == Some(id) {
            self.set_active(None);
        }
        true
    }

    /// Swap an object with its neighbour in `direction`.
    ///
    /// No-op (returns `false`) at the boundary or for unknown ids.
    pub fn reorder(&mut self, id: &ObjectId, direction: ReorderDirection) -> bool {
        let Some(index) = self.document.index_of(id) else {
            return false;
        };
        let target = match direction {
            ReorderDirection::Forward if index + 1 < self.document.len() => index + 1,
            ReorderDirection::Backward if index > 0 => index - 1,
            _ => return false,
        };
        self.document.swap(index, target);
        tracing::debug!("Reorder {id}: {index} -> {target}");
        self.emit(&ChangeEvent::ObjectReordered(id.clone()));
        true
    }

    /// Merge `patch` into an object.
    ///
    /// Locking the active object clears the selection.
    ///
    /// # Errors
    ///
    /// Returns [`EditorError::ObjectNotFound`] for unknown ids and
    /// [`EditorError::InvalidOperation`] if the patch does not fit the object.
    pub fn set_property(&mut self, id: &ObjectId, patch: &ObjectPatch) -> EditorResult<()> {
        let object = self
            .document
            .get_mut(id)
            .ok_or_else(|| EditorError::ObjectNotFound(id.clone()))?;
        patch.apply(object)?;
        let locked = object.style.locked;
        self.emit(&ChangeEvent::ObjectModified(id.clone()));
        if locked && self.active.as_ref() == Some(id) {
            self.exit_text_editing();
            self.set_active(None);
        }
        Ok(())
    }

    /// Translate an object by a delta in logical units.
    ///
    /// # Errors
    ///
    /// Returns [`EditorError::ObjectNotFound`] for unknown ids.
    pub fn move_by(&mut self, id: &ObjectId, dx: f64, dy: f64) -> EditorResult<()> {
        let object = self
            .document
            .get(id)
            .ok_or_else(|| EditorError::ObjectNotFound(id.clone()))?;
        let patch = ObjectPatch::position(object.geometry.x + dx, object.geometry.y + dy);
        self.set_property(id, &patch)
    }

    /// Show or hide an object. Unknown ids are ignored.
    pub fn set_visibility(&mut self, id: &ObjectId, visible: bool) -> bool {
        let patch = ObjectPatch {
            visible: Some(visible),
            ..ObjectPatch::default()
        };
        self.set_property(id, &patch).is_ok()
    }

    /// Lock or unlock an object. Unknown ids are ignored.
    pub fn set_locked(&mut self, id: &ObjectId, locked: bool) -> bool {
        let patch = ObjectPatch {
            locked: Some(locked),
            ..ObjectPatch::default()
        };
        self.set_property(id, &patch).is_ok()
    }

    /// Set or clear the active object.
    ///
    /// Returns `false` and leaves the selection unchanged if the id is unknown
    /// or the object is locked.
    pub fn select(&mut self, id: Option<&ObjectId>) -> bool {
        match id {
            None => {
                self.exit_text_editing();
                self.set_active(None);
                true
            }
            Some(id) => match self.document.get(id) {
                Some(object) if !object.style.locked => {
                    if self.editing_text.as_ref() != Some(id) {
                        self.exit_text_editing();
                    }
                    self.set_active(Some(id.clone()));
                    true
                }
                _ => false,
            },
        }
    }

    /// The active object id.
    #[must_use]
    pub fn selection(&self) -> Option<&ObjectId> {
        self.active.as_ref()
    }

    /// The active object.
    #[must_use]
    pub fn selected_object(&self) -> Option<&SceneObject> {
        self.active.as_ref().and_then(|id| self.document.get(id))
    }

    /// Replace the background.
    pub fn set_background(&mut self, background: Background) {
        self.document.set_background(background);
        self.emit(&ChangeEvent::BackgroundChanged);
    }

    /// Topmost visible, unlocked object under a point in logical units.
    #[must_use]
    pub fn hit_test(&self, x: f64, y: f64) -> Option<ObjectId> {
        self.document
            .objects()
            .iter()
            .rev()
            .find(|o| o.is_hit_testable() && o.contains_point(x, y))
            .map(|o| o.id.clone())
    }

    /// Enter text edit mode for a text object and make it active.
    ///
    /// # Errors
    ///
    /// Returns [`EditorError::ObjectNotFound`] for unknown ids and
    /// [`EditorError::InvalidOperation`] for non-text or locked objects.
    pub fn enter_text_editing(&mut self, id: &ObjectId) -> EditorResult<()> {
        let object = self
            .document
            .get(id)
            .ok_or_else(|| EditorError::ObjectNotFound(id.clone()))?;
        if object.as_text().is_none() {
            return Err(EditorError::InvalidOperation(format!(
                "cannot edit text of {} object {id}",
                object.kind.tag()
            )));
        }
        if object.style.locked {
            return Err(EditorError::InvalidOperation(format!(
                "object {id} is locked"
            )));
        }
        if self.editing_text.as_ref() == Some(id) {
            return Ok(());
        }
        self.set_active(Some(id.clone()));
        self.editing_text = Some(id.clone());
        self.emit(&ChangeEvent::TextEditingChanged(Some(id.clone())));
        Ok(())
    }

    /// Leave text edit mode. Returns whether an edit was in progress.
    pub fn exit_text_editing(&mut self) -> bool {
        if self.editing_text.take().is_some() {
            self.emit(&ChangeEvent::TextEditingChanged(None));
            true
        } else {
            false
        }
    }

    /// The text object currently being edited.
    #[must_use]
    pub fn editing_text(&self) -> Option<&ObjectId> {
        self.editing_text.as_ref()
    }

    /// Swap the whole document in one step.
    ///
    /// Selection survives only if the active object still exists; text edit
    /// mode always ends.
    pub fn replace_document(&mut self, document: SceneDocument) {
        self.exit_text_editing();
        self.document = document;
        let keep = self
            .active
            .as_ref()
            .is_some_and(|id| self.document.get(id).is_some_and(|o| !o.style.locked));
        self.emit(&ChangeEvent::Replaced);
        if !keep {
            self.set_active(None);
        }
    }

    /// Rows for the layers panel, bottom to top.
    #[must_use]
    pub fn layers(&self) -> Vec<LayerInfo> {
        self.document
            .objects()
            .iter()
            .enumerate()
            .map(|(index, object)| {
                let (name, kind) = match &object.kind {
                    ObjectKind::Text(text) if !text.text.is_empty() => {
                        (truncate_name(&text.text), LayerKind::Text)
                    }
                    ObjectKind::Text(_) => (format!("Layer {}", index + 1), LayerKind::Text),
                    ObjectKind::Image(_) => ("Image".to_string(), LayerKind::Image),
                    ObjectKind::Rect(_) => ("Rectangle".to_string(), LayerKind::Shape),
                    ObjectKind::Circle(_) => ("Circle".to_string(), LayerKind::Shape),
                    ObjectKind::Group(_) => ("Sticker".to_string(), LayerKind::Group),
                };
                LayerInfo {
                    id: object.id.clone(),
                    name,
                    kind,
                    visible: object.style.visible,
                    locked: object.style.locked,
                }
            })
            .collect()
    }
}

fn truncate_name(text: &str) -> String {
    if text.chars().count() > LAYER_NAME_MAX_CHARS {
        let head: String = text.chars().take(LAYER_NAME_MAX_CHARS).collect();
        format!("{head}...")
    } else {
        text.to_string()
    }
}
