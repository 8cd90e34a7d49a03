//! Property panel intents translated into object patches.
//!
//! Intents read the active object's stored values, never a separately
//! tracked panel value, so toggles stay correct after undo or load.

use std::ops::RangeInclusive;

use crate::object::{FontWeight, TextAlign};
use crate::{CanvasRuntime, EditorError, EditorResult, ObjectPatch, SceneObject, Shadow};

/// Font sizes offered by the size picker, in pixels.
pub const FONT_SIZE_PRESETS: [f64; 16] = [
    8.0, 10.0, 12.0, 14.0, 16.0, 18.0, 20.0, 24.0, 28.0, 32.0, 36.0, 48.0, 64.0, 72.0, 96.0,
    128.0,
];

/// Letter-spacing bounds in thousandths of an em.
pub const CHAR_SPACING_RANGE: RangeInclusive<f64> = -200.0..=1000.0;

/// Line-height multiplier bounds.
pub const LINE_HEIGHT_RANGE: RangeInclusive<f64> = 0.5..=3.0;

/// Shadow applied when the shadow effect is enabled.
pub const SHADOW_COLOR: &str = "rgba(0,0,0,0.3)";
/// Shadow blur radius.
pub const SHADOW_BLUR: f64 = 10.0;
/// Shadow offset on both axes.
pub const SHADOW_OFFSET: f64 = 5.0;

/// Outline colour applied when the outline effect is enabled.
pub const OUTLINE_COLOR: &str = "#000000";
/// Outline width applied when the outline effect is enabled.
pub const OUTLINE_WIDTH: f64 = 2.0;

/// The shadow set by enabling the shadow effect.
#[must_use]
pub fn default_shadow() -> Shadow {
    Shadow {
        color: SHADOW_COLOR.to_string(),
        blur: SHADOW_BLUR,
        offset_x: SHADOW_OFFSET,
        offset_y: SHADOW_OFFSET,
    }
}

/// A single user action from the property panels.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyIntent {
    /// Flip between bold and normal weight.
    ToggleBold,
    /// Flip italic.
    ToggleItalic,
    /// Flip underline.
    ToggleUnderline,
    /// Flip strikethrough.
    ToggleLinethrough,
    /// Set font family.
    SetFontFamily(String),
    /// Set font size, clamped to the preset range.
    SetFontSize(f64),
    /// Set alignment.
    SetAlign(TextAlign),
    /// Set letter spacing, clamped to [`CHAR_SPACING_RANGE`].
    SetCharSpacing(f64),
    /// Set line height, clamped to [`LINE_HEIGHT_RANGE`].
    SetLineHeight(f64),
    /// Set fill colour, `None` for transparent.
    SetFill(Option<String>),
    /// Set opacity, clamped to 0..=1.
    SetOpacity(f64),
    /// Turn the shadow effect on (defaults) or off (cleared).
    SetShadow(bool),
    /// Turn the outline effect on (defaults) or off (cleared).
    SetOutline(bool),
    /// Replace text content.
    SetText(String),
}

pub(crate) fn clamp_to(value: f64, range: &RangeInclusive<f64>) -> f64 {
    value.clamp(*range.start(), *range.end())
}

fn clamp_font_size(size: f64) -> f64 {
    size.clamp(FONT_SIZE_PRESETS[0], FONT_SIZE_PRESETS[FONT_SIZE_PRESETS.len() - 1])
}

/// Compute the patch for `intent` from `object`'s current values.
///
/// # Errors
///
/// Returns [`EditorError::InvalidOperation`] for text intents on non-text
/// objects and for non-finite numeric input.
pub fn intent_patch(object: &SceneObject, intent: &PropertyIntent) -> EditorResult<ObjectPatch> {
    let text = || {
        object.as_text().ok_or_else(|| {
            EditorError::InvalidOperation(format!(
                "{intent:?} needs a text object, got {}",
                object.kind.tag()
            ))
        })
    };

    let mut patch = ObjectPatch::new();
    match intent {
        PropertyIntent::ToggleBold => {
            patch.font_weight = Some(if text()?.font_weight.is_bold() {
                FontWeight::normal()
            } else {
                FontWeight::bold()
            });
        }
        PropertyIntent::ToggleItalic => patch.italic = Some(!text()?.italic),
        PropertyIntent::ToggleUnderline => patch.underline = Some(!text()?.underline),
        PropertyIntent::ToggleLinethrough => patch.linethrough = Some(!text()?.linethrough),
        PropertyIntent::SetFontFamily(family) => {
            text()?;
            patch.font_family = Some(family.clone());
        }
        PropertyIntent::SetFontSize(size) => {
            text()?;
            patch.font_size = Some(clamp_font_size(finite(*size, "fontSize")?));
        }
        PropertyIntent::SetAlign(align) => {
            text()?;
            patch.text_align = Some(*align);
        }
        PropertyIntent::SetCharSpacing(v) => {
            text()?;
            patch.char_spacing = Some(clamp_to(finite(*v, "charSpacing")?, &CHAR_SPACING_RANGE));
        }
        PropertyIntent::SetLineHeight(v) => {
            text()?;
            patch.line_height = Some(clamp_to(finite(*v, "lineHeight")?, &LINE_HEIGHT_RANGE));
        }
        PropertyIntent::SetText(content) => {
            text()?;
            patch.text = Some(content.clone());
        }
        PropertyIntent::SetFill(fill) => patch.fill = Some(fill.clone()),
        PropertyIntent::SetOpacity(v) => {
            patch.opacity = Some(finite(*v, "opacity")?.clamp(0.0, 1.0));
        }
        PropertyIntent::SetShadow(enabled) => {
            patch.shadow = Some(enabled.then(default_shadow));
        }
        PropertyIntent::SetOutline(true) => {
            patch.stroke = Some(Some(OUTLINE_COLOR.to_string()));
            patch.stroke_width = Some(OUTLINE_WIDTH);
        }
        PropertyIntent::SetOutline(false) => {
            patch.stroke = Some(None);
            patch.stroke_width = Some(0.0);
        }
    }
    Ok(patch)
}

fn finite(value: f64, name: &str) -> EditorResult<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(EditorError::InvalidOperation(format!(
            "{name} must be a finite number"
        )))
    }
}

/// Apply `intent` to the runtime's active object.
///
/// Returns `Ok(false)` when nothing is selected.
///
/// # Errors
///
/// Propagates errors from [`intent_patch`] and
/// [`CanvasRuntime::set_property`].
pub fn apply_intent(runtime: &mut CanvasRuntime, intent: &PropertyIntent) -> EditorResult<bool> {
    let Some(object) = runtime.selected_object() else {
        return Ok(false);
    };
    let id = object.id.clone();
    let patch = intent_patch(object, intent)?;
    runtime.set_property(&id, &patch)?;
    Ok(true)
}

/// What the text panel shows for the current selection.
#[derive(Debug, Clone, PartialEq)]
#[allow(clippy::struct_excessive_bools)]
pub struct TextPanelState {
    /// Font family.
    pub font_family: String,
    /// Font size.
    pub font_size: f64,
    /// Stored weight.
    pub font_weight: FontWeight,
    /// Whether the weight counts as bold.
    pub bold: bool,
    /// Italic flag.
    pub italic: bool,
    /// Underline flag.
    pub underline: bool,
    /// Strikethrough flag.
    pub linethrough: bool,
    /// Alignment.
    pub align: TextAlign,
    /// Letter spacing.
    pub char_spacing: f64,
    /// Line height.
    pub line_height: f64,
    /// Fill colour.
    pub fill: Option<String>,
    /// Shadow present.
    pub shadow_enabled: bool,
    /// Outline present with a positive width.
    pub outline_enabled: bool,
}

impl Default for TextPanelState {
    fn default() -> Self {
        Self {
            font_family: "Arial".to_string(),
            font_size: 16.0,
            font_weight: FontWeight::normal(),
            bold: false,
            italic: false,
            underline: false,
            linethrough: false,
            align: TextAlign::Left,
            char_spacing: 0.0,
            line_height: 1.16,
            fill: Some("#000000".to_string()),
            shadow_enabled: false,
            outline_enabled: false,
        }
    }
}

impl TextPanelState {
    /// Read the panel values from an object; non-text objects and an empty
    /// selection give the defaults.
    #[must_use]
    pub fn from_object(object: Option<&SceneObject>) -> Self {
        let Some((object, text)) = object.and_then(|o| o.as_text().map(|t| (o, t))) else {
            return Self::default();
        };
        Self {
            font_family: text.font_family.clone(),
            font_size: text.font_size,
            font_weight: text.font_weight.clone(),
            bold: text.font_weight.is_bold(),
            italic: text.italic,
            underline: text.underline,
            linethrough: text.linethrough,
            align: text.align,
            char_spacing: text.char_spacing,
            line_height: text.line_height,
            fill: object.style.fill.clone(),
            shadow_enabled: object.style.shadow.is_some(),
            outline_enabled: object.style.stroke.is_some() && object.style.stroke_width > 0.0,
        }
    }
}
