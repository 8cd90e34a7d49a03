//! An open editor: runtime, history and viewport wired together, plus the
//! keyboard and pointer rules of the canvas.
//!
//! History captures on every edit event, except while a drag or a text edit
//! is in progress; those capture once when they finish, so a drag is one undo
//! step and a drag back to the start position is none. Text edit mode is
//! tracked from the runtime's own events, so an edit ended by any path
//! (deselect, lock, removal, load) resumes capture.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::event::{InputEvent, KeyModifiers, PointerEvent, PointerPhase};
use crate::history::{History, HistoryConfig, HistoryEntry, HistoryState};
use crate::properties::{self, PropertyIntent};
use crate::runtime::{CanvasRuntime, ChangeEvent};
use crate::schema::{self, PortableForm};
use crate::viewport::{ViewportConfig, ViewportTransform};
use crate::{EditorResult, ObjectId, ObjectPatch, ObjectSpec, SceneDocument};

/// Settings for an [`EditorSession`].
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SessionConfig {
    /// History limits.
    pub history: HistoryConfig,
    /// Viewport padding.
    pub viewport: ViewportConfig,
}

#[derive(Debug, Clone)]
struct Drag {
    id: ObjectId,
    last_x: f64,
    last_y: f64,
}

/// One open editor over one document.
#[derive(Debug)]
pub struct EditorSession {
    runtime: CanvasRuntime,
    history: Rc<RefCell<History>>,
    /// Closed while a drag is in progress.
    capturing: Rc<Cell<bool>>,
    viewport: ViewportTransform,
    config: SessionConfig,
    drag: Option<Drag>,
    caret: usize,
}

impl EditorSession {
    /// Open `document`; it becomes history entry 0.
    #[must_use]
    pub fn new(document: SceneDocument, config: SessionConfig) -> Self {
        let history = Rc::new(RefCell::new(History::new(&document, config.history)));
        let capturing = Rc::new(Cell::new(true));
        let mut runtime = CanvasRuntime::with_document(document);

        let sink = Rc::clone(&history);
        let enabled = Rc::clone(&capturing);
        let editing_text = Cell::new(false);
        runtime.subscribe(Box::new(move |event: &ChangeEvent, doc: &SceneDocument| {
            match event {
                ChangeEvent::TextEditingChanged(Some(_)) => editing_text.set(true),
                ChangeEvent::TextEditingChanged(None) => {
                    editing_text.set(false);
                    if enabled.get() {
                        sink.borrow_mut().capture(doc);
                    }
                }
                _ if event.is_edit() && enabled.get() && !editing_text.get() => {
                    sink.borrow_mut().capture(doc);
                }
                _ => {}
            }
        }));

        Self {
            runtime,
            history,
            capturing,
            viewport: ViewportTransform::identity(),
            config,
            drag: None,
            caret: 0,
        }
    }

    /// Open a stored portable form.
    ///
    /// # Errors
    ///
    /// Returns [`crate::EditorError::MalformedDocument`] if the form is invalid.
    pub fn open(form: &PortableForm, config: SessionConfig) -> EditorResult<Self> {
        Ok(Self::new(schema::deserialize(form)?, config))
    }

    /// Replace the document (template switch, draft load) and restart history.
    pub fn load(&mut self, document: SceneDocument) {
        self.finish_gesture();
        self.runtime.replace_document(document);
        self.history.borrow_mut().reset(self.runtime.document());
    }

    /// The runtime.
    #[must_use]
    pub fn runtime(&self) -> &CanvasRuntime {
        &self.runtime
    }

    /// Mutable runtime access. Edits through it are recorded in history
    /// under the same rules as session methods.
    pub fn runtime_mut(&mut self) -> &mut CanvasRuntime {
        &mut self.runtime
    }

    /// The live document.
    #[must_use]
    pub fn document(&self) -> &SceneDocument {
        self.runtime.document()
    }

    /// Serialize the live document for the persistence layer.
    #[must_use]
    pub fn serialize(&self) -> PortableForm {
        schema::serialize(self.runtime.document())
    }

    /// Add an object and select it.
    pub fn add(&mut self, spec: ObjectSpec) -> ObjectId {
        self.finish_gesture();
        self.runtime.add_object(spec)
    }

    /// Apply a property-panel intent to the active object.
    ///
    /// # Errors
    ///
    /// See [`properties::apply_intent`].
    pub fn apply_intent(&mut self, intent: &PropertyIntent) -> EditorResult<bool> {
        properties::apply_intent(&mut self.runtime, intent)
    }

    /// Undo one step. Returns whether the document changed.
    ///
    /// # Errors
    ///
    /// Returns an error if the stored snapshot cannot be restored.
    pub fn undo(&mut self) -> EditorResult<bool> {
        self.finish_gesture();
        let restored = self.history.borrow_mut().undo()?;
        Ok(self.restore(restored))
    }

    /// Redo one step. Returns whether the document changed.
    ///
    /// # Errors
    ///
    /// Returns an error if the stored snapshot cannot be restored.
    pub fn redo(&mut self) -> EditorResult<bool> {
        self.finish_gesture();
        let restored = self.history.borrow_mut().redo()?;
        Ok(self.restore(restored))
    }

    fn restore(&mut self, document: Option<SceneDocument>) -> bool {
        match document {
            Some(document) => {
                self.runtime.replace_document(document);
                true
            }
            None => false,
        }
    }

    /// Check if undo is available.
    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.history.borrow().can_undo()
    }

    /// Check if redo is available.
    #[must_use]
    pub fn can_redo(&self) -> bool {
        self.history.borrow().can_redo()
    }

    /// Where the history cursor sits.
    #[must_use]
    pub fn history_state(&self) -> HistoryState {
        self.history.borrow().state()
    }

    /// Number of history entries.
    #[must_use]
    pub fn history_len(&self) -> usize {
        self.history.borrow().len()
    }

    /// The snapshot under the history cursor, i.e. the last recorded state.
    #[must_use]
    pub fn history_entry(&self) -> Option<HistoryEntry> {
        self.history.borrow().current()
    }

    /// Recompute the viewport for a new container size.
    pub fn resize(&mut self, container_width: f64, container_height: f64) -> ViewportTransform {
        self.viewport =
            ViewportTransform::fit(container_width, container_height, &self.config.viewport);
        tracing::debug!(
            "Viewport {container_width}x{container_height} -> scale {}",
            self.viewport.scale
        );
        self.viewport
    }

    /// Current viewport transform.
    #[must_use]
    pub fn viewport(&self) -> ViewportTransform {
        self.viewport
    }

    /// Caret position (in characters) of the active text edit.
    #[must_use]
    pub fn caret(&self) -> usize {
        self.caret
    }

    /// Dispatch an input event. Returns whether it was handled.
    pub fn handle_input(&mut self, event: &InputEvent) -> bool {
        match event {
            InputEvent::Pointer(pointer) => self.handle_pointer(pointer),
            InputEvent::Key {
                key,
                pressed: true,
                modifiers,
            } => self.handle_key(key, *modifiers),
            InputEvent::Key { pressed: false, .. } => false,
        }
    }

    /// Handle a key press.
    ///
    /// Editing errors are logged and absorbed; the key then counts as
    /// unhandled.
    pub fn handle_key(&mut self, key: &str, modifiers: KeyModifiers) -> bool {
        if modifiers.is_command() {
            let result = match key.to_ascii_lowercase().as_str() {
                "z" if modifiers.shift => self.redo(),
                "z" => self.undo(),
                "y" => self.redo(),
                _ => return false,
            };
            return absorb(result);
        }

        if let Some(id) = self.runtime.editing_text().cloned() {
            return self.handle_text_key(&id, key);
        }

        match key {
            "Delete" | "Backspace" => match self.runtime.selection().cloned() {
                Some(id) => self.runtime.remove_object(&id),
                None => false,
            },
            "Escape" => self.runtime.select(None),
            _ => false,
        }
    }

    fn handle_text_key(&mut self, id: &ObjectId, key: &str) -> bool {
        let Some(current) = self.runtime.get(id).and_then(|o| o.as_text()) else {
            return false;
        };
        let chars: Vec<char> = current.text.chars().collect();
        let caret = self.caret.min(chars.len());

        let (text, caret) = match key {
            "Escape" => {
                self.end_text_edit();
                return true;
            }
            "ArrowLeft" => (None, caret.saturating_sub(1)),
            "ArrowRight" => (None, (caret + 1).min(chars.len())),
            "Home" => (None, 0),
            "End" => (None, chars.len()),
            "Backspace" if caret > 0 => (Some(splice(&chars, caret - 1..caret, None)), caret - 1),
            "Delete" if caret < chars.len() => (Some(splice(&chars, caret..caret + 1, None)), caret),
            "Backspace" | "Delete" => (None, caret),
            "Enter" => (Some(splice(&chars, caret..caret, Some('\n'))), caret + 1),
            other => {
                let mut it = other.chars();
                match (it.next(), it.next()) {
                    (Some(c), None) if !c.is_control() => {
                        (Some(splice(&chars, caret..caret, Some(c))), caret + 1)
                    }
                    _ => return false,
                }
            }
        };

        self.caret = caret;
        if let Some(text) = text {
            let patch = ObjectPatch {
                text: Some(text),
                ..ObjectPatch::default()
            };
            return absorb(self.runtime.set_property(id, &patch).map(|()| true));
        }
        true
    }

    /// Handle a pointer event in container pixels.
    pub fn handle_pointer(&mut self, event: &PointerEvent) -> bool {
        let (x, y) = self.viewport.to_logical(event.x, event.y);
        match event.phase {
            PointerPhase::Down => {
                let hit = self.runtime.hit_test(x, y);
                if self.runtime.editing_text().is_some() && self.runtime.editing_text() != hit.as_ref()
                {
                    self.end_text_edit();
                }
                self.runtime.select(hit.as_ref());
                if let Some(id) = hit {
                    if self.runtime.editing_text().is_none() {
                        self.capturing.set(false);
                        self.drag = Some(Drag {
                            id,
                            last_x: x,
                            last_y: y,
                        });
                    }
                }
                true
            }
            PointerPhase::Move => {
                let Some(drag) = self.drag.as_mut() else {
                    return false;
                };
                let (dx, dy) = (x - drag.last_x, y - drag.last_y);
                drag.last_x = x;
                drag.last_y = y;
                let id = drag.id.clone();
                absorb(self.runtime.move_by(&id, dx, dy).map(|()| true))
            }
            PointerPhase::Up => {
                let dragging = self.drag.is_some();
                self.end_drag();
                dragging
            }
            PointerPhase::DoubleClick => {
                self.end_drag();
                let Some(id) = self.runtime.hit_test(x, y) else {
                    return false;
                };
                let Some(len) = self.runtime.get(&id).and_then(|o| o.as_text()).map(|t| t.text.chars().count())
                else {
                    return false;
                };
                if absorb(self.runtime.enter_text_editing(&id).map(|()| true)) {
                    self.caret = len;
                    true
                } else {
                    false
                }
            }
        }
    }

    /// Enter text edit mode for `id` with the caret at the end.
    ///
    /// # Errors
    ///
    /// See [`CanvasRuntime::enter_text_editing`].
    pub fn begin_text_edit(&mut self, id: &ObjectId) -> EditorResult<()> {
        self.end_drag();
        self.runtime.enter_text_editing(id)?;
        self.caret = self
            .runtime
            .get(id)
            .and_then(|o| o.as_text())
            .map_or(0, |t| t.text.chars().count());
        Ok(())
    }

    /// Leave text edit mode; the runtime's exit event records the result.
    pub fn end_text_edit(&mut self) {
        self.runtime.exit_text_editing();
        self.caret = 0;
    }

    fn end_drag(&mut self) {
        if self.drag.take().is_some() {
            self.capturing.set(true);
            self.history.borrow_mut().capture(self.runtime.document());
        }
    }

    fn finish_gesture(&mut self) {
        self.end_drag();
        if self.runtime.editing_text().is_some() {
            self.end_text_edit();
        }
    }
}

fn splice(chars: &[char], range: std::ops::Range<usize>, insert: Option<char>) -> String {
    chars[..range.start]
        .iter()
        .chain(insert.iter())
        .chain(chars[range.end..].iter())
        .collect()
}

fn absorb(result: EditorResult<bool>) -> bool {
    result.unwrap_or_else(|e| {
        tracing::warn!("Edit ignored: {e}");
        false
    })
}
