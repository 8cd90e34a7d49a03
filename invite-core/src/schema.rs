//! Portable serialized form of a scene document.
//!
//! The portable form is the JSON shape exchanged with storage:
//!
//! ```text
//! { version, background, objects: [ {id, kind, ...geometry, ...style, ...payload} ] }
//! ```
//!
//! Unknown fields are ignored on input. Required geometry (`x`, `y`, `width`,
//! `height`) must be present and numeric, otherwise decoding fails with
//! [`EditorError::MalformedDocument`].

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::object::{
    CirclePayload, FontWeight, GroupPayload, ImagePayload, RectPayload, TextAlign, TextPayload,
};
use crate::properties::{clamp_to, CHAR_SPACING_RANGE, LINE_HEIGHT_RANGE};
use crate::{
    Background, EditorError, EditorResult, Geometry, ObjectId, ObjectKind, SceneDocument,
    SceneObject, Shadow, Style,
};

/// Version tag written into every serialized document.
pub const FORMAT_VERSION: &str = "1";

/// The JSON-compatible serialized document.
pub type PortableForm = Value;

/// Flat object record as it appears in the portable form.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ObjectRecord {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    kind: Option<String>,
    /// Fabric-style tag; `kind` wins when both are present.
    #[serde(default, rename = "type", skip_serializing)]
    fabric_type: Option<String>,

    // Geometry
    #[serde(default)]
    x: Option<f64>,
    #[serde(default)]
    y: Option<f64>,
    #[serde(default)]
    width: Option<f64>,
    #[serde(default)]
    height: Option<f64>,
    #[serde(default)]
    scale_x: Option<f64>,
    #[serde(default)]
    scale_y: Option<f64>,
    #[serde(default)]
    angle: Option<f64>,
    #[serde(default)]
    flip_x: Option<bool>,
    #[serde(default)]
    flip_y: Option<bool>,

    // Style; nullable fields are always written so a cleared value reads as `null`.
    #[serde(default)]
    fill: Option<String>,
    #[serde(default)]
    stroke: Option<String>,
    #[serde(default)]
    stroke_width: Option<f64>,
    #[serde(default)]
    opacity: Option<f64>,
    #[serde(default)]
    shadow: Option<Shadow>,
    #[serde(default)]
    visible: Option<bool>,
    #[serde(default)]
    locked: Option<bool>,

    // Text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    font_family: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    font_size: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    font_weight: Option<FontWeight>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    font_style: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    underline: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    linethrough: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text_align: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    char_spacing: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    line_height: Option<f64>,

    // Image
    #[serde(default, skip_serializing_if = "Option::is_none")]
    src: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    natural_width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    natural_height: Option<f64>,

    // Rect
    #[serde(default, skip_serializing_if = "Option::is_none")]
    rx: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    ry: Option<f64>,

    // Circle
    #[serde(default, skip_serializing_if = "Option::is_none")]
    radius: Option<f64>,

    // Group
    #[serde(default, skip_serializing_if = "Option::is_none")]
    objects: Option<Vec<Value>>,
}

impl From<&SceneObject> for ObjectRecord {
    fn from(object: &SceneObject) -> Self {
        let g = &object.geometry;
        let s = &object.style;
        let mut record = Self {
            id: Some(object.id.to_string()),
            kind: Some(object.kind.tag().to_string()),
            x: Some(g.x),
            y: Some(g.y),
            width: Some(g.width),
            height: Some(g.height),
            scale_x: Some(g.scale_x),
            scale_y: Some(g.scale_y),
            angle: Some(g.angle),
            flip_x: Some(g.flip_x),
            flip_y: Some(g.flip_y),
            fill: s.fill.clone(),
            stroke: s.stroke.clone(),
            stroke_width: Some(s.stroke_width),
            opacity: Some(s.opacity),
            shadow: s.shadow.clone(),
            visible: Some(s.visible),
            locked: Some(s.locked),
            ..Self::default()
        };

        match &object.kind {
            ObjectKind::Text(text) => {
                record.text = Some(text.text.clone());
                record.font_family = Some(text.font_family.clone());
                record.font_size = Some(text.font_size);
                record.font_weight = Some(text.font_weight.clone());
                record.font_style = Some(if text.italic { "italic" } else { "normal" }.to_string());
                record.underline = Some(text.underline);
                record.linethrough = Some(text.linethrough);
                record.text_align = Some(
                    match text.align {
                        TextAlign::Left => "left",
                        TextAlign::Center => "center",
                        TextAlign::Right => "right",
                    }
                    .to_string(),
                );
                record.char_spacing = Some(text.char_spacing);
                record.line_height = Some(text.line_height);
            }
            ObjectKind::Image(image) => {
                record.src = Some(image.src.clone());
                record.natural_width = image.natural_width;
                record.natural_height = image.natural_height;
            }
            ObjectKind::Rect(rect) => {
                record.rx = Some(rect.rx);
                record.ry = Some(rect.ry);
            }
            ObjectKind::Circle(_) => {
                record.radius = Some(g.inscribed_radius());
            }
            ObjectKind::Group(group) => {
                record.objects = Some(group.objects.iter().map(object_to_value).collect());
            }
        }

        record
    }
}

/// Read a required, finite number.
fn required(value: Option<f64>, field: &str, path: &str) -> EditorResult<f64> {
    match value {
        Some(v) if v.is_finite() => Ok(v),
        Some(_) => Err(EditorError::malformed(format!(
            "{path}.{field} is not a finite number"
        ))),
        None => Err(EditorError::malformed(format!("{path}.{field} is missing"))),
    }
}

/// Read an optional number, rejecting non-finite values.
fn optional(value: Option<f64>, default: f64, field: &str, path: &str) -> EditorResult<f64> {
    match value {
        Some(v) if !v.is_finite() => Err(EditorError::malformed(format!(
            "{path}.{field} is not a finite number"
        ))),
        Some(v) => Ok(v),
        None => Ok(default),
    }
}

fn parse_align(value: Option<&str>) -> TextAlign {
    match value {
        Some("center") => TextAlign::Center,
        Some("right") => TextAlign::Right,
        Some("left") | None => TextAlign::Left,
        Some(other) => {
            tracing::debug!("Unsupported text alignment '{other}', using left");
            TextAlign::Left
        }
    }
}

impl ObjectRecord {
    /// Validate and convert into a runtime object.
    fn into_object(self, path: &str, seen: &mut HashSet<String>) -> EditorResult<SceneObject> {
        let id = self
            .id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| EditorError::malformed(format!("{path}.id is missing")))?;
        if !seen.insert(id.clone()) {
            return Err(EditorError::malformed(format!(
                "{path}.id '{id}' is not unique"
            )));
        }
        let kind_tag = self
            .kind
            .or(self.fabric_type)
            .ok_or_else(|| EditorError::malformed(format!("{path}.kind is missing")))?;

        let geometry = Geometry {
            x: required(self.x, "x", path)?,
            y: required(self.y, "y", path)?,
            width: required(self.width, "width", path)?,
            height: required(self.height, "height", path)?,
            scale_x: optional(self.scale_x, 1.0, "scaleX", path)?,
            scale_y: optional(self.scale_y, 1.0, "scaleY", path)?,
            angle: optional(self.angle, 0.0, "angle", path)?,
            flip_x: self.flip_x.unwrap_or(false),
            flip_y: self.flip_y.unwrap_or(false),
        };
        if geometry.width < 0.0 || geometry.height < 0.0 {
            return Err(EditorError::malformed(format!(
                "{path} has a negative size"
            )));
        }

        let style = Style {
            fill: self.fill,
            stroke: self.stroke.filter(|s| !s.is_empty()),
            stroke_width: optional(self.stroke_width, 0.0, "strokeWidth", path)?.max(0.0),
            opacity: optional(self.opacity, 1.0, "opacity", path)?.clamp(0.0, 1.0),
            shadow: self.shadow,
            visible: self.visible.unwrap_or(true),
            locked: self.locked.unwrap_or(false),
        };

        let kind = match kind_tag.as_str() {
            "text" | "i-text" | "textbox" => {
                let text = self
                    .text
                    .ok_or_else(|| EditorError::malformed(format!("{path}: text object without text")))?;
                let defaults = TextPayload::new(String::new());
                let font_size = optional(self.font_size, defaults.font_size, "fontSize", path)?;
                if font_size <= 0.0 {
                    return Err(EditorError::malformed(format!(
                        "{path}.fontSize must be positive"
                    )));
                }
                ObjectKind::Text(TextPayload {
                    text,
                    font_family: self.font_family.unwrap_or(defaults.font_family),
                    font_size,
                    font_weight: self.font_weight.unwrap_or(defaults.font_weight),
                    italic: self
                        .font_style
                        .as_deref()
                        .is_some_and(|s| s == "italic" || s == "oblique"),
                    underline: self.underline.unwrap_or(false),
                    linethrough: self.linethrough.unwrap_or(false),
                    align: parse_align(self.text_align.as_deref()),
                    char_spacing: clamp_to(
                        optional(self.char_spacing, 0.0, "charSpacing", path)?,
                        &CHAR_SPACING_RANGE,
                    ),
                    line_height: clamp_to(
                        optional(self.line_height, defaults.line_height, "lineHeight", path)?,
                        &LINE_HEIGHT_RANGE,
                    ),
                })
            }
            "image" => {
                let src = self
                    .src
                    .ok_or_else(|| EditorError::malformed(format!("{path}: image object without src")))?;
                ObjectKind::Image(ImagePayload {
                    src,
                    natural_width: self.natural_width.filter(|v| v.is_finite()),
                    natural_height: self.natural_height.filter(|v| v.is_finite()),
                })
            }
            "rect" | "rectangle" => ObjectKind::Rect(RectPayload {
                rx: optional(self.rx, 0.0, "rx", path)?,
                ry: optional(self.ry, 0.0, "ry", path)?,
            }),
            "circle" => {
                // Geometry is authoritative; a stored radius is only checked.
                optional(self.radius, 0.0, "radius", path)?;
                ObjectKind::Circle(CirclePayload)
            }
            "group" => {
                let children = self
                    .objects
                    .ok_or_else(|| EditorError::malformed(format!("{path}: group object without objects")))?;
                let objects = children
                    .iter()
                    .enumerate()
                    .map(|(i, child)| value_to_object(child, &format!("{path}.objects[{i}]"), seen))
                    .collect::<EditorResult<Vec<_>>>()?;
                ObjectKind::Group(GroupPayload { objects })
            }
            other => {
                return Err(EditorError::malformed(format!(
                    "{path}.kind '{other}' is not supported"
                )))
            }
        };

        Ok(SceneObject {
            id: ObjectId::from_string(id),
            kind,
            geometry,
            style,
        })
    }
}

fn object_to_value(object: &SceneObject) -> Value {
    // Records only hold strings, numbers, bools and already-built values.
    serde_json::to_value(ObjectRecord::from(object)).unwrap_or(Value::Null)
}

fn value_to_object(value: &Value, path: &str, seen: &mut HashSet<String>) -> EditorResult<SceneObject> {
    if !value.is_object() {
        return Err(EditorError::malformed(format!("{path} is not an object")));
    }
    let record = ObjectRecord::deserialize(value)
        .map_err(|e| EditorError::malformed(format!("{path}: {e}")))?;
    record.into_object(path, seen)
}

/// Serialize a document into its portable form.
#[must_use]
pub fn serialize(document: &SceneDocument) -> PortableForm {
    let background = serde_json::to_value(document.background())
        .unwrap_or_else(|_| Value::String(crate::document::DEFAULT_BACKGROUND.to_string()));
    let objects: Vec<Value> = document.objects().iter().map(object_to_value).collect();
    serde_json::json!({
        "version": FORMAT_VERSION,
        "background": background,
        "objects": objects,
    })
}

/// Serialize a document into a JSON string.
///
/// # Errors
///
/// Returns an error if JSON encoding fails.
pub fn serialize_string(document: &SceneDocument) -> EditorResult<String> {
    serde_json::to_string(&serialize(document)).map_err(EditorError::Serialization)
}

/// Rebuild a document from its portable form.
///
/// # Errors
///
/// Returns [`EditorError::MalformedDocument`] if the input is not an object,
/// if an object record is missing required fields, carries non-numeric
/// geometry, declares an unsupported kind, or reuses an id.
pub fn deserialize(form: &PortableForm) -> EditorResult<SceneDocument> {
    let map = form
        .as_object()
        .ok_or_else(|| EditorError::malformed("document is not a JSON object"))?;

    if let Some(version) = map.get("version") {
        if version.as_str() != Some(FORMAT_VERSION) {
            tracing::debug!("Reading document with format version {version}");
        }
    }

    let background = match map.get("background") {
        None | Some(Value::Null) => Background::default(),
        Some(value) => Background::deserialize(value)
            .map_err(|e| EditorError::malformed(format!("background: {e}")))?,
    };

    let objects = match map.get("objects") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => {
            let mut seen = HashSet::new();
            items
                .iter()
                .enumerate()
                .map(|(i, item)| value_to_object(item, &format!("objects[{i}]"), &mut seen))
                .collect::<EditorResult<Vec<_>>>()?
        }
        Some(_) => return Err(EditorError::malformed("objects is not an array")),
    };

    Ok(SceneDocument::from_parts(objects, background))
}

/// Parse a JSON string and rebuild the document.
///
/// # Errors
///
/// Returns [`EditorError::MalformedDocument`] if the text is not valid JSON or
/// fails [`deserialize`].
pub fn deserialize_str(json: &str) -> EditorResult<SceneDocument> {
    let form: Value = serde_json::from_str(json)
        .map_err(|e| EditorError::malformed(format!("invalid JSON: {e}")))?;
    deserialize(&form)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::ObjectSpec;

    fn sample_document() -> SceneDocument {
        let mut title = ObjectSpec::text("Hello").at(120.0, 80.0);
        if let crate::SpecKind::Text(payload) = &mut title.kind {
            payload.font_weight = FontWeight::Numeric(700);
            payload.align = TextAlign::Center;
            payload.italic = true;
        }
        title.style.shadow = Some(Shadow {
            color: "rgba(0,0,0,0.3)".to_string(),
            blur: 10.0,
            offset_x: 5.0,
            offset_y: 5.0,
        });
        let photo = ObjectSpec::image("https://cdn/p.png", 400.0, 300.0).with_scale(0.5, 0.5);
        let sticker = ObjectSpec::group(vec![
            ObjectSpec::circle(10.0).at(0.0, 0.0),
            ObjectSpec::rect(5.0, 5.0).at(30.0, 30.0),
        ]);
        SceneDocument::from_parts(
            vec![
                SceneObject::from_spec(title),
                SceneObject::from_spec(photo),
                SceneObject::from_spec(sticker),
            ],
            Background::Color("#FFF8F0".to_string()),
        )
    }

    #[test]
    fn test_round_trip_preserves_everything() {
        let doc = sample_document();
        let restored = deserialize(&serialize(&doc)).expect("round trip");
        assert_eq!(restored, doc);
    }

    #[test]
    fn test_serialized_shape() {
        let form = serialize(&sample_document());
        assert_eq!(form["version"], json!(FORMAT_VERSION));
        assert_eq!(form["background"], json!("#FFF8F0"));
        let title = &form["objects"][0];
        assert_eq!(title["kind"], json!("text"));
        assert_eq!(title["fontWeight"], json!(700));
        assert_eq!(title["fontStyle"], json!("italic"));
        assert_eq!(title["textAlign"], json!("center"));
        assert_eq!(title["shadow"]["offsetX"], json!(5.0));
        assert_eq!(form["objects"][1]["fill"], Value::Null);
        assert!(form["objects"][1].get("text").is_none());
    }

    #[test]
    fn test_unknown_fields_are_ignored() {
        let form = json!({
            "version": "1",
            "background": "#ffffff",
            "futureFlag": true,
            "objects": [{
                "id": "a", "kind": "rect", "x": 1, "y": 2, "width": 3, "height": 4,
                "strokeDashArray": [2, 2], "originX": "left"
            }]
        });
        let doc = deserialize(&form).expect("tolerant");
        assert_eq!(doc.len(), 1);
    }

    #[test]
    fn test_missing_geometry_is_malformed() {
        let form = json!({"objects": [{"id": "a", "kind": "rect", "x": 1, "width": 3, "height": 4}]});
        let err = deserialize(&form).expect_err("missing y");
        assert!(matches!(err, EditorError::MalformedDocument(ref msg) if msg.contains("objects[0].y")));
    }

    #[test]
    fn test_non_numeric_geometry_is_malformed() {
        let form = json!({"objects": [{"id": "a", "kind": "rect", "x": "10", "y": 1, "width": 3, "height": 4}]});
        assert!(matches!(deserialize(&form), Err(EditorError::MalformedDocument(_))));
    }

    #[test]
    fn test_payload_must_match_kind() {
        let form = json!({"objects": [{"id": "a", "kind": "image", "x": 0, "y": 0, "width": 3, "height": 4}]});
        assert!(matches!(deserialize(&form), Err(EditorError::MalformedDocument(_))));
    }

    #[test]
    fn test_circle_radius_follows_geometry() {
        let form = json!({"objects": [{
            "id": "c", "kind": "circle", "x": 0, "y": 0, "width": 40, "height": 40, "radius": 20
        }]});
        let doc = deserialize(&form).expect("circle");
        let mut circle = doc.objects()[0].clone();
        let patch = crate::ObjectPatch {
            width: Some(200.0),
            height: Some(200.0),
            ..crate::ObjectPatch::default()
        };
        patch.apply(&mut circle).expect("resize");
        let out = serialize(&SceneDocument::from_parts(vec![circle], Background::default()));
        assert_eq!(out["objects"][0]["radius"], json!(100.0));

        // A stale stored radius does not override the box.
        let form = json!({"objects": [{
            "id": "c", "kind": "circle", "x": 0, "y": 0, "width": 30, "height": 50, "radius": 99
        }]});
        let doc = deserialize(&form).expect("circle");
        assert!((doc.objects()[0].geometry.inscribed_radius() - 15.0).abs() < f64::EPSILON);
        assert_eq!(serialize(&doc)["objects"][0]["radius"], json!(15.0));

        let form = json!({"objects": [{
            "id": "c", "kind": "circle", "x": 0, "y": 0, "width": 3, "height": 3, "radius": "big"
        }]});
        assert!(matches!(deserialize(&form), Err(EditorError::MalformedDocument(_))));
    }

    #[test]
    fn test_duplicate_ids_are_malformed() {
        let rect = json!({"id": "a", "kind": "rect", "x": 0, "y": 0, "width": 3, "height": 4});
        let form = json!({"objects": [rect.clone(), rect]});
        assert!(matches!(deserialize(&form), Err(EditorError::MalformedDocument(_))));
    }

    #[test]
    fn test_empty_template_defaults() {
        let doc = deserialize(&json!({})).expect("empty");
        assert!(doc.is_empty());
        assert_eq!(doc.background(), &Background::default());
    }

    #[test]
    fn test_fabric_style_type_tag() {
        let form = json!({"objects": [{
            "id": "t", "type": "i-text", "x": 0, "y": 0, "width": 10, "height": 10,
            "text": "Hi", "fontWeight": "bold"
        }]});
        let doc = deserialize(&form).expect("alias");
        let text = doc.objects()[0].as_text().expect("text");
        assert!(text.font_weight.is_bold());
    }

    #[test]
    fn test_kind_and_type_together() {
        let form = json!({"objects": [{
            "id": "t", "kind": "text", "type": "textbox", "x": 0, "y": 0,
            "width": 10, "height": 10, "text": "Hi"
        }]});
        let doc = deserialize(&form).expect("both tags");
        assert_eq!(doc.objects()[0].kind.tag(), "text");
        let out = serialize(&doc);
        assert_eq!(out["objects"][0]["kind"], json!("text"));
        assert!(out["objects"][0].get("type").is_none());
    }

    #[test]
    fn test_out_of_range_text_metrics_are_clamped() {
        let form = json!({"objects": [{
            "id": "t", "kind": "text", "x": 0, "y": 0, "width": 10, "height": 10,
            "text": "Hi", "charSpacing": 5000, "lineHeight": 0.01
        }]});
        let doc = deserialize(&form).expect("clamped");
        let text = doc.objects()[0].as_text().expect("text");
        assert!((text.char_spacing - 1000.0).abs() < f64::EPSILON);
        assert!((text.line_height - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_non_positive_font_size_is_malformed() {
        for size in [0.0, -4.0] {
            let form = json!({"objects": [{
                "id": "t", "kind": "text", "x": 0, "y": 0, "width": 10, "height": 10,
                "text": "Hi", "fontSize": size
            }]});
            assert!(matches!(deserialize(&form), Err(EditorError::MalformedDocument(_))));
        }
    }

    #[test]
    fn test_invalid_json_string_is_malformed() {
        assert!(matches!(
            deserialize_str("{not json"),
            Err(EditorError::MalformedDocument(_))
        ));
    }
}
