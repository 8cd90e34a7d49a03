//! Partial property updates for `set_property`.
//!
//! Every field is optional: `None` leaves the current value unchanged. Nullable
//! style fields use a nested option so that `Some(None)` clears the value,
//! which is how a JSON `null` reads (`"shadow": null`) while an absent key
//! stays `None`.

use serde::{Deserialize, Deserializer};

use crate::object::{FontWeight, ObjectKind, TextAlign};
use crate::properties::{clamp_to, CHAR_SPACING_RANGE, LINE_HEIGHT_RANGE};
use crate::{EditorError, EditorResult, SceneObject, Shadow};

/// Deserialize a field that distinguishes "absent" from "null".
#[allow(clippy::option_option)]
fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// A shallow merge applied to one object.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
#[allow(clippy::option_option, clippy::struct_excessive_bools)]
pub struct ObjectPatch {
    /// New left edge.
    pub x: Option<f64>,
    /// New top edge.
    pub y: Option<f64>,
    /// New natural width.
    pub width: Option<f64>,
    /// New natural height.
    pub height: Option<f64>,
    /// New horizontal scale.
    pub scale_x: Option<f64>,
    /// New vertical scale.
    pub scale_y: Option<f64>,
    /// New rotation in degrees.
    pub angle: Option<f64>,
    /// New horizontal flip flag.
    pub flip_x: Option<bool>,
    /// New vertical flip flag.
    pub flip_y: Option<bool>,

    /// Fill colour; `Some(None)` makes the object transparent.
    #[serde(deserialize_with = "nullable")]
    pub fill: Option<Option<String>>,
    /// Stroke colour; `Some(None)` removes the outline colour.
    #[serde(deserialize_with = "nullable")]
    pub stroke: Option<Option<String>>,
    /// Stroke width.
    pub stroke_width: Option<f64>,
    /// Opacity, clamped to 0..=1.
    pub opacity: Option<f64>,
    /// Shadow; `Some(None)` removes it.
    #[serde(deserialize_with = "nullable")]
    pub shadow: Option<Option<Shadow>>,
    /// Visibility flag.
    pub visible: Option<bool>,
    /// Lock flag.
    pub locked: Option<bool>,

    /// Text content (text objects only).
    pub text: Option<String>,
    /// Font family (text objects only).
    pub font_family: Option<String>,
    /// Font size in pixels (text objects only).
    pub font_size: Option<f64>,
    /// Font weight (text objects only).
    pub font_weight: Option<FontWeight>,
    /// Italic flag (text objects only).
    pub italic: Option<bool>,
    /// Underline flag (text objects only).
    pub underline: Option<bool>,
    /// Strikethrough flag (text objects only).
    pub linethrough: Option<bool>,
    /// Alignment (text objects only).
    pub text_align: Option<TextAlign>,
    /// Letter spacing in thousandths of an em, clamped to
    /// [`CHAR_SPACING_RANGE`] (text objects only).
    pub char_spacing: Option<f64>,
    /// Line height multiplier, clamped to [`LINE_HEIGHT_RANGE`] (text
    /// objects only).
    pub line_height: Option<f64>,

    /// Image source (image objects only).
    pub src: Option<String>,
}

impl ObjectPatch {
    /// Empty patch that changes nothing.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Patch that moves an object to `(x, y)`.
    #[must_use]
    pub fn position(x: f64, y: f64) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
            ..Self::default()
        }
    }

    fn touches_text(&self) -> bool {
        self.text.is_some()
            || self.font_family.is_some()
            || self.font_size.is_some()
            || self.font_weight.is_some()
            || self.italic.is_some()
            || self.underline.is_some()
            || self.linethrough.is_some()
            || self.text_align.is_some()
            || self.char_spacing.is_some()
            || self.line_height.is_some()
    }

    /// Whether the patch changes anything that affects text layout.
    fn touches_text_layout(&self) -> bool {
        self.text.is_some()
            || self.font_family.is_some()
            || self.font_size.is_some()
            || self.font_weight.is_some()
            || self.char_spacing.is_some()
            || self.line_height.is_some()
    }

    fn shadow_number(&self, field: impl Fn(&Shadow) -> f64) -> Option<f64> {
        self.shadow.as_ref().and_then(Option::as_ref).map(field)
    }

    /// Reject patches that cannot apply to `object` without touching it.
    fn validate(&self, object: &SceneObject) -> EditorResult<()> {
        let numbers = [
            ("x", self.x),
            ("y", self.y),
            ("width", self.width),
            ("height", self.height),
            ("scaleX", self.scale_x),
            ("scaleY", self.scale_y),
            ("angle", self.angle),
            ("strokeWidth", self.stroke_width),
            ("opacity", self.opacity),
            ("fontSize", self.font_size),
            ("charSpacing", self.char_spacing),
            ("lineHeight", self.line_height),
            ("shadow.blur", self.shadow_number(|s| s.blur)),
            ("shadow.offsetX", self.shadow_number(|s| s.offset_x)),
            ("shadow.offsetY", self.shadow_number(|s| s.offset_y)),
        ];
        if let Some((name, _)) = numbers
            .iter()
            .find(|(_, v)| v.is_some_and(|v| !v.is_finite()))
        {
            return Err(EditorError::InvalidOperation(format!(
                "{name} must be a finite number"
            )));
        }
        if self.width.is_some_and(|w| w < 0.0) || self.height.is_some_and(|h| h < 0.0) {
            return Err(EditorError::InvalidOperation(
                "size must not be negative".to_string(),
            ));
        }
        if self.font_size.is_some_and(|v| v <= 0.0) {
            return Err(EditorError::InvalidOperation(
                "fontSize must be positive".to_string(),
            ));
        }
        if self.touches_text() && !matches!(object.kind, ObjectKind::Text(_)) {
            return Err(EditorError::InvalidOperation(format!(
                "text properties do not apply to {} object {}",
                object.kind.tag(),
                object.id
            )));
        }
        if self.src.is_some() && !matches!(object.kind, ObjectKind::Image(_)) {
            return Err(EditorError::InvalidOperation(format!(
                "src does not apply to {} object {}",
                object.kind.tag(),
                object.id
            )));
        }
        Ok(())
    }

    /// Merge this patch into `object`.
    ///
    /// Validation happens before any field is written, so a rejected patch
    /// leaves the object untouched.
    ///
    /// # Errors
    ///
    /// Returns [`EditorError::InvalidOperation`] for non-finite numbers
    /// (shadow parameters included), negative sizes, a non-positive font
    /// size, or payload fields that do not match the object's kind.
    pub fn apply(&self, object: &mut SceneObject) -> EditorResult<()> {
        self.validate(object)?;

        let g = &mut object.geometry;
        if let Some(v) = self.x {
            g.x = v;
        }
        if let Some(v) = self.y {
            g.y = v;
        }
        if let Some(v) = self.width {
            g.width = v;
        }
        if let Some(v) = self.height {
            g.height = v;
        }
        if let Some(v) = self.scale_x {
            g.scale_x = v;
        }
        if let Some(v) = self.scale_y {
            g.scale_y = v;
        }
        if let Some(v) = self.angle {
            g.angle = v;
        }
        if let Some(v) = self.flip_x {
            g.flip_x = v;
        }
        if let Some(v) = self.flip_y {
            g.flip_y = v;
        }

        let s = &mut object.style;
        if let Some(v) = &self.fill {
            s.fill.clone_from(v);
        }
        if let Some(v) = &self.stroke {
            s.stroke = v.clone().filter(|c| !c.is_empty());
        }
        if let Some(v) = self.stroke_width {
            s.stroke_width = v.max(0.0);
        }
        if let Some(v) = self.opacity {
            s.opacity = v.clamp(0.0, 1.0);
        }
        if let Some(v) = &self.shadow {
            s.shadow.clone_from(v);
        }
        if let Some(v) = self.visible {
            s.visible = v;
        }
        if let Some(v) = self.locked {
            s.locked = v;
        }

        match &mut object.kind {
            ObjectKind::Text(text) => {
                if let Some(v) = &self.text {
                    text.text.clone_from(v);
                }
                if let Some(v) = &self.font_family {
                    text.font_family.clone_from(v);
                }
                if let Some(v) = self.font_size {
                    text.font_size = v;
                }
                if let Some(v) = &self.font_weight {
                    text.font_weight = v.clone();
                }
                if let Some(v) = self.italic {
                    text.italic = v;
                }
                if let Some(v) = self.underline {
                    text.underline = v;
                }
                if let Some(v) = self.linethrough {
                    text.linethrough = v;
                }
                if let Some(v) = self.text_align {
                    text.align = v;
                }
                if let Some(v) = self.char_spacing {
                    text.char_spacing = clamp_to(v, &CHAR_SPACING_RANGE);
                }
                if let Some(v) = self.line_height {
                    text.line_height = clamp_to(v, &LINE_HEIGHT_RANGE);
                }
                if self.touches_text_layout() {
                    let (width, height) = text.estimate_size();
                    if self.width.is_none() {
                        object.geometry.width = width;
                    }
                    if self.height.is_none() {
                        object.geometry.height = height;
                    }
                }
            }
            ObjectKind::Image(image) => {
                if let Some(v) = &self.src {
                    image.src.clone_from(v);
                }
            }
            ObjectKind::Rect(_) | ObjectKind::Circle(_) | ObjectKind::Group(_) => {}
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ObjectSpec;

    #[test]
    fn test_null_clears_while_absent_keeps() {
        let patch: ObjectPatch = serde_json::from_str(r#"{"shadow": null}"#).expect("patch");
        assert_eq!(patch.shadow, Some(None));
        assert_eq!(patch.fill, None);

        let mut object = SceneObject::from_spec(ObjectSpec::text("Hi"));
        object.style.shadow = Some(Shadow {
            color: "black".into(),
            blur: 1.0,
            offset_x: 0.0,
            offset_y: 0.0,
        });
        patch.apply(&mut object).expect("apply");
        assert!(object.style.shadow.is_none());
        assert_eq!(object.style.fill.as_deref(), Some("#000000"));
    }

    #[test]
    fn test_text_fields_rejected_on_shapes() {
        let mut object = SceneObject::from_spec(ObjectSpec::rect(10.0, 10.0));
        let before = object.clone();
        let patch = ObjectPatch {
            x: Some(5.0),
            font_size: Some(20.0),
            ..ObjectPatch::default()
        };
        assert!(matches!(
            patch.apply(&mut object),
            Err(EditorError::InvalidOperation(_))
        ));
        assert_eq!(object, before);
    }

    #[test]
    fn test_non_finite_rejected() {
        let mut object = SceneObject::from_spec(ObjectSpec::rect(10.0, 10.0));
        let patch = ObjectPatch {
            x: Some(f64::NAN),
            ..ObjectPatch::default()
        };
        assert!(patch.apply(&mut object).is_err());
    }

    #[test]
    fn test_text_change_relayouts() {
        let mut object = SceneObject::from_spec(ObjectSpec::text("Hi"));
        let narrow = object.geometry.width;
        let patch = ObjectPatch {
            text: Some("A much longer line".into()),
            ..ObjectPatch::default()
        };
        patch.apply(&mut object).expect("apply");
        assert!(object.geometry.width > narrow);
    }

    #[test]
    fn test_spacing_and_line_height_clamped() {
        let mut object = SceneObject::from_spec(ObjectSpec::text("Hi"));
        let patch: ObjectPatch =
            serde_json::from_str(r#"{"charSpacing": 5000, "lineHeight": 9}"#).expect("patch");
        patch.apply(&mut object).expect("apply");
        let text = object.as_text().expect("text");
        assert!((text.char_spacing - 1000.0).abs() < f64::EPSILON);
        assert!((text.line_height - 3.0).abs() < f64::EPSILON);

        let patch: ObjectPatch =
            serde_json::from_str(r#"{"charSpacing": -900, "lineHeight": 0.1}"#).expect("patch");
        patch.apply(&mut object).expect("apply");
        let text = object.as_text().expect("text");
        assert!((text.char_spacing + 200.0).abs() < f64::EPSILON);
        assert!((text.line_height - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_non_finite_shadow_rejected() {
        let mut object = SceneObject::from_spec(ObjectSpec::rect(10.0, 10.0));
        let before = object.clone();
        for shadow in [
            Shadow { color: "black".into(), blur: f64::NAN, offset_x: 0.0, offset_y: 0.0 },
            Shadow { color: "black".into(), blur: 1.0, offset_x: f64::INFINITY, offset_y: 0.0 },
            Shadow { color: "black".into(), blur: 1.0, offset_x: 0.0, offset_y: f64::NEG_INFINITY },
        ] {
            let patch = ObjectPatch {
                shadow: Some(Some(shadow)),
                ..ObjectPatch::default()
            };
            assert!(matches!(
                patch.apply(&mut object),
                Err(EditorError::InvalidOperation(_))
            ));
        }
        assert_eq!(object, before);
    }

    #[test]
    fn test_non_positive_font_size_rejected() {
        let mut object = SceneObject::from_spec(ObjectSpec::text("Hi"));
        for size in [0.0, -12.0] {
            let patch = ObjectPatch {
                font_size: Some(size),
                ..ObjectPatch::default()
            };
            assert!(patch.apply(&mut object).is_err());
        }
    }

    #[test]
    fn test_opacity_clamped() {
        let mut object = SceneObject::from_spec(ObjectSpec::rect(10.0, 10.0));
        let patch = ObjectPatch {
            opacity: Some(3.0),
            ..ObjectPatch::default()
        };
        patch.apply(&mut object).expect("apply");
        assert!((object.style.opacity - 1.0).abs() < f64::EPSILON);
    }
}
