//! Canned objects and values offered by the editor panels.

use crate::document::{LOGICAL_HEIGHT, LOGICAL_WIDTH};
use crate::object::FontWeight;
use crate::{Background, EditorError, EditorResult, ObjectSpec, TextPayload};

/// Content of a newly added preset text.
pub const PRESET_TEXT: &str = "Double-click to edit";

/// Content of a newly added custom text.
pub const CUSTOM_TEXT: &str = "Your text here";

/// Font stack for emoji stickers.
pub const EMOJI_FONT_STACK: &str =
    "Apple Color Emoji, Segoe UI Emoji, Noto Color Emoji, sans-serif";

/// Emoji sticker size in pixels.
pub const EMOJI_FONT_SIZE: f64 = 60.0;

/// Scale applied to image and vector stickers.
pub const STICKER_SCALE: f64 = 0.5;

/// Fraction of the canvas an uploaded image may cover on each axis.
pub const UPLOAD_MAX_FRACTION: f64 = 0.5;

/// A text style from the text panel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextPreset {
    /// Panel label.
    pub label: &'static str,
    /// Font size in pixels.
    pub font_size: f64,
    /// Font family.
    pub font_family: &'static str,
    /// Whether the preset is bold.
    pub bold: bool,
}

/// Text styles in panel order.
pub const TEXT_PRESETS: [TextPreset; 4] = [
    TextPreset {
        label: "Heading",
        font_size: 48.0,
        font_family: "Georgia",
        bold: true,
    },
    TextPreset {
        label: "Subheading",
        font_size: 32.0,
        font_family: "Georgia",
        bold: false,
    },
    TextPreset {
        label: "Body Text",
        font_size: 24.0,
        font_family: "Arial",
        bold: false,
    },
    TextPreset {
        label: "Small Text",
        font_size: 18.0,
        font_family: "Arial",
        bold: false,
    },
];

impl TextPreset {
    /// Spec for a new text object in this style.
    #[must_use]
    pub fn spec(&self) -> ObjectSpec {
        let mut payload = TextPayload::new(PRESET_TEXT);
        payload.font_size = self.font_size;
        payload.font_family = self.font_family.to_string();
        if self.bold {
            payload.font_weight = FontWeight::bold();
        }
        ObjectSpec::from_text_payload(payload)
            .at(LOGICAL_WIDTH / 2.0 - 100.0, LOGICAL_HEIGHT / 2.0 - 12.0)
            .with_fill(Some("#000000"))
    }
}

/// Spec for the "add custom text" button.
#[must_use]
pub fn custom_text_spec() -> ObjectSpec {
    let mut payload = TextPayload::new(CUSTOM_TEXT);
    payload.font_size = 24.0;
    payload.font_family = "Arial".to_string();
    ObjectSpec::from_text_payload(payload)
        .at(LOGICAL_WIDTH / 2.0 - 75.0, LOGICAL_HEIGHT / 2.0 - 12.0)
        .with_fill(Some("#000000"))
}

/// Spec for an emoji sticker.
#[must_use]
pub fn emoji_spec(emoji: &str) -> ObjectSpec {
    let mut payload = TextPayload::new(emoji);
    payload.font_size = EMOJI_FONT_SIZE;
    payload.font_family = EMOJI_FONT_STACK.to_string();
    ObjectSpec::from_text_payload(payload).at(
        LOGICAL_WIDTH / 2.0 - EMOJI_FONT_SIZE / 2.0,
        LOGICAL_HEIGHT / 2.0 - EMOJI_FONT_SIZE / 2.0,
    )
}

fn centred(spec: ObjectSpec, scale: f64) -> ObjectSpec {
    let width = spec.geometry.width * scale;
    let height = spec.geometry.height * scale;
    spec.with_scale(scale, scale)
        .at(LOGICAL_WIDTH / 2.0 - width / 2.0, LOGICAL_HEIGHT / 2.0 - height / 2.0)
}

/// Spec for a raster sticker from the asset library.
#[must_use]
pub fn image_sticker_spec(src: &str, natural_width: f64, natural_height: f64) -> ObjectSpec {
    centred(
        ObjectSpec::image(src, natural_width, natural_height),
        STICKER_SCALE,
    )
}

/// Spec for a vector sticker: a group wrapping the drawing, so it moves and
/// scales as one unit.
#[must_use]
pub fn svg_sticker_spec(src: &str, natural_width: f64, natural_height: f64) -> ObjectSpec {
    let drawing = ObjectSpec::image(src, natural_width, natural_height);
    centred(ObjectSpec::group(vec![drawing]), STICKER_SCALE)
}

/// Spec for an uploaded image, shrunk to fit half the canvas and centred.
/// Images already within bounds keep their natural size.
#[must_use]
pub fn uploaded_image_spec(src: &str, natural_width: f64, natural_height: f64) -> ObjectSpec {
    let max_width = LOGICAL_WIDTH * UPLOAD_MAX_FRACTION;
    let max_height = LOGICAL_HEIGHT * UPLOAD_MAX_FRACTION;
    let scale = if natural_width > max_width || natural_height > max_height {
        (max_width / natural_width).min(max_height / natural_height)
    } else {
        1.0
    };
    centred(ObjectSpec::image(src, natural_width, natural_height), scale)
}

/// A named quick emoji set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmojiCategory {
    /// Tab label.
    pub name: &'static str,
    /// Emojis in display order.
    pub emojis: &'static [&'static str],
}

/// Quick emoji sets from the stickers panel.
pub const EMOJI_CATEGORIES: [EmojiCategory; 5] = [
    EmojiCategory {
        name: "Party",
        emojis: &["🎉", "🎊", "🎈", "🎂", "🎁", "🎀", "🪅", "🎯", "🎪", "🎭", "🥳", "✨"],
    },
    EmojiCategory {
        name: "Wedding",
        emojis: &["💒", "💍", "👰", "🤵", "💐", "🕊️", "🥂", "💝", "🌹", "❤️", "💕", "💗"],
    },
    EmojiCategory {
        name: "Baby",
        emojis: &["👶", "🍼", "🧸", "🎀", "👣", "🧷", "🌟", "🦋", "🐣", "🧁", "🎠", "💫"],
    },
    EmojiCategory {
        name: "Holiday",
        emojis: &["🎄", "🎅", "⭐", "❄️", "☃️", "🎆", "🎇", "🕯️", "🔔", "🦌", "🎁", "✨"],
    },
    EmojiCategory {
        name: "Celebration",
        emojis: &["🏆", "🎓", "🎖️", "🏅", "🥇", "🎗️", "🎀", "🌸", "🌺", "🌻", "🌼", "🍾"],
    },
];

/// A named background colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorPreset {
    /// Swatch label.
    pub name: &'static str,
    /// `#RRGGBB` value.
    pub color: &'static str,
}

/// Background swatches in panel order.
pub const BACKGROUND_PRESETS: [ColorPreset; 12] = [
    ColorPreset { name: "White", color: "#FFFFFF" },
    ColorPreset { name: "Cream", color: "#FFF8F0" },
    ColorPreset { name: "Light Pink", color: "#FFE5E5" },
    ColorPreset { name: "Light Blue", color: "#E3F2FD" },
    ColorPreset { name: "Light Yellow", color: "#FFF9C4" },
    ColorPreset { name: "Light Green", color: "#E8F5E9" },
    ColorPreset { name: "Beige", color: "#F5F5DC" },
    ColorPreset { name: "Lavender", color: "#F3E5F5" },
    ColorPreset { name: "Mint", color: "#E0F2F7" },
    ColorPreset { name: "Peach", color: "#FFE4E1" },
    ColorPreset { name: "Black", color: "#000000" },
    ColorPreset { name: "Navy", color: "#1A1A2E" },
];

/// Whether `value` is a `#RRGGBB` hex colour.
#[must_use]
pub fn is_hex_color(value: &str) -> bool {
    value.len() == 7
        && value.starts_with('#')
        && value[1..].chars().all(|c| c.is_ascii_hexdigit())
}

/// Background from the custom-colour input.
///
/// # Errors
///
/// Returns [`EditorError::InvalidOperation`] unless `value` is `#RRGGBB`.
pub fn custom_background(value: &str) -> EditorResult<Background> {
    if is_hex_color(value) {
        Ok(Background::Color(value.to_string()))
    } else {
        Err(EditorError::InvalidOperation(format!(
            "background colour must be #RRGGBB, got {value:?}"
        )))
    }
}

/// Font families grouped the way the font picker shows them.
pub const FONT_CATEGORIES: [(&str, &[&str]); 4] = [
    (
        "Sans Serif",
        &[
            "Arial",
            "Helvetica",
            "Verdana",
            "Roboto",
            "Open Sans",
            "Lato",
            "Montserrat",
            "Poppins",
        ],
    ),
    (
        "Serif",
        &["Times New Roman", "Georgia", "Garamond", "Palatino"],
    ),
    ("Monospace", &["Courier New", "Consolas", "Monaco"]),
    ("Display", &["Impact", "Comic Sans MS", "Brush Script MT"]),
];
