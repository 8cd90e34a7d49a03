//! Input events for editor interaction.

use serde::{Deserialize, Serialize};

/// Phase of a pointer event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointerPhase {
    /// Button pressed.
    Down,
    /// Pointer moved (with or without a button held).
    Move,
    /// Button released.
    Up,
    /// Second click of a double-click.
    DoubleClick,
}

/// A pointer (mouse or single touch) event in container pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointerEvent {
    /// Phase of this event.
    pub phase: PointerPhase,
    /// X position in container pixels.
    pub x: f64,
    /// Y position in container pixels.
    pub y: f64,
    /// Mouse button (0 = left, 1 = middle, 2 = right).
    pub button: u8,
}

impl PointerEvent {
    /// Create a left-button event.
    #[must_use]
    pub fn new(phase: PointerPhase, x: f64, y: f64) -> Self {
        Self {
            phase,
            x,
            y,
            button: 0,
        }
    }
}

/// All input events the editor can receive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum InputEvent {
    /// Pointer (mouse) event.
    Pointer(PointerEvent),

    /// Keyboard event.
    Key {
        /// Key name as reported by the browser (`"a"`, `"Backspace"`, ...).
        key: String,
        /// Whether the key is pressed.
        pressed: bool,
        /// Active modifier keys.
        modifiers: KeyModifiers,
    },
}

/// Keyboard modifiers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[allow(clippy::struct_excessive_bools)]
pub struct KeyModifiers {
    /// Shift key pressed.
    pub shift: bool,
    /// Control key pressed.
    pub ctrl: bool,
    /// Alt/Option key pressed.
    pub alt: bool,
    /// Meta/Command key pressed.
    pub meta: bool,
}

impl KeyModifiers {
    /// No modifiers.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            shift: false,
            ctrl: false,
            alt: false,
            meta: false,
        }
    }

    /// Ctrl (or Cmd) only.
    #[must_use]
    pub const fn command() -> Self {
        Self {
            ctrl: true,
            ..Self::none()
        }
    }

    /// Ctrl (or Cmd) with Shift.
    #[must_use]
    pub const fn command_shift() -> Self {
        Self {
            ctrl: true,
            shift: true,
            ..Self::none()
        }
    }

    /// Whether the platform shortcut modifier (Ctrl or Cmd) is held.
    #[must_use]
    pub fn is_command(&self) -> bool {
        self.ctrl || self.meta
    }
}
