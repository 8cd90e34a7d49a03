//! Scene objects - the positionable, stylable building blocks of a design.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

/// Approximate advance width of one glyph, as a fraction of the font size.
const GLYPH_ADVANCE_EM: f64 = 0.6;

/// Height of the first text line, as a multiple of the font size.
const FIRST_LINE_EM: f64 = 1.13;

/// Stable identifier of an object within a document.
///
/// Fresh objects get a UUID; ids read from stored documents are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectId(String);

impl ObjectId {
    /// Create a new unique object ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Wrap an existing identifier.
    #[must_use]
    pub fn from_string(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ObjectId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Position, size and transform of an object in logical canvas units.
///
/// `x`/`y` is the top-left corner of the unrotated, scaled box. Rotation is
/// applied around the centre of that box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Geometry {
    /// Left edge (units from the canvas left).
    pub x: f64,
    /// Top edge (units from the canvas top).
    pub y: f64,
    /// Natural (unscaled) width.
    pub width: f64,
    /// Natural (unscaled) height.
    pub height: f64,
    /// Horizontal scale factor.
    pub scale_x: f64,
    /// Vertical scale factor.
    pub scale_y: f64,
    /// Rotation in degrees, clockwise.
    pub angle: f64,
    /// Mirror horizontally.
    pub flip_x: bool,
    /// Mirror vertically.
    pub flip_y: bool,
}

impl Default for Geometry {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width: 100.0,
            height: 100.0,
            scale_x: 1.0,
            scale_y: 1.0,
            angle: 0.0,
            flip_x: false,
            flip_y: false,
        }
    }
}

/// Axis-aligned rectangle in logical units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    /// Left edge.
    pub min_x: f64,
    /// Top edge.
    pub min_y: f64,
    /// Right edge.
    pub max_x: f64,
    /// Bottom edge.
    pub max_y: f64,
}

impl Bounds {
    /// Width of the rectangle.
    #[must_use]
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    /// Height of the rectangle.
    #[must_use]
    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// Smallest rectangle containing both.
    #[must_use]
    pub fn union(&self, other: &Bounds) -> Bounds {
        Bounds {
            min_x: self.min_x.min(other.min_x),
            min_y: self.min_y.min(other.min_y),
            max_x: self.max_x.max(other.max_x),
            max_y: self.max_y.max(other.max_y),
        }
    }
}

impl Geometry {
    /// Create geometry for a box at `(x, y)` with the given natural size.
    #[must_use]
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
            ..Self::default()
        }
    }

    /// Radius of the largest circle centred in the unscaled box.
    #[must_use]
    pub fn inscribed_radius(&self) -> f64 {
        self.width.min(self.height) / 2.0
    }

    /// Width after scaling.
    #[must_use]
    pub fn scaled_width(&self) -> f64 {
        self.width * self.scale_x.abs()
    }

    /// Height after scaling.
    #[must_use]
    pub fn scaled_height(&self) -> f64 {
        self.height * self.scale_y.abs()
    }

    /// Centre of the scaled box; the pivot for rotation.
    #[must_use]
    pub fn center(&self) -> (f64, f64) {
        (
            self.x + self.scaled_width() / 2.0,
            self.y + self.scaled_height() / 2.0,
        )
    }

    /// Whether every numeric field is finite.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        [
            self.x,
            self.y,
            self.width,
            self.height,
            self.scale_x,
            self.scale_y,
            self.angle,
        ]
        .iter()
        .all(|v| v.is_finite())
    }

    /// Check if a point (in canvas coordinates) is within the transformed box.
    #[must_use]
    pub fn contains_point(&self, px: f64, py: f64) -> bool {
        let (cx, cy) = self.center();
        let (sin, cos) = (-self.angle).to_radians().sin_cos();
        let dx = px - cx;
        let dy = py - cy;
        // Undo the rotation; flips are symmetric about the centre.
        let local_x = dx * cos - dy * sin;
        let local_y = dx * sin + dy * cos;
        let half_w = self.scaled_width() / 2.0;
        let half_h = self.scaled_height() / 2.0;
        local_x.abs() <= half_w && local_y.abs() <= half_h
    }

    /// Axis-aligned bounds of the rotated, scaled box.
    #[must_use]
    pub fn bounding_box(&self) -> Bounds {
        let (cx, cy) = self.center();
        let half_w = self.scaled_width() / 2.0;
        let half_h = self.scaled_height() / 2.0;
        let (sin, cos) = self.angle.to_radians().sin_cos();
        let corners = [
            (-half_w, -half_h),
            (half_w, -half_h),
            (half_w, half_h),
            (-half_w, half_h),
        ];
        let mut bounds = Bounds {
            min_x: f64::INFINITY,
            min_y: f64::INFINITY,
            max_x: f64::NEG_INFINITY,
            max_y: f64::NEG_INFINITY,
        };
        for (lx, ly) in corners {
            let x = cx + lx * cos - ly * sin;
            let y = cy + lx * sin + ly * cos;
            bounds.min_x = bounds.min_x.min(x);
            bounds.min_y = bounds.min_y.min(y);
            bounds.max_x = bounds.max_x.max(x);
            bounds.max_y = bounds.max_y.max(y);
        }
        bounds
    }
}

/// Drop shadow parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Shadow {
    /// Shadow colour (any CSS colour string).
    pub color: String,
    /// Blur radius in logical units.
    pub blur: f64,
    /// Horizontal offset.
    pub offset_x: f64,
    /// Vertical offset.
    pub offset_y: f64,
}

/// Visual style shared by every object kind.
#[derive(Debug, Clone, PartialEq)]
pub struct Style {
    /// Fill colour; `None` means transparent.
    pub fill: Option<String>,
    /// Stroke colour; `None` means no outline.
    pub stroke: Option<String>,
    /// Stroke width in logical units.
    pub stroke_width: f64,
    /// Opacity between 0 and 1.
    pub opacity: f64,
    /// Optional drop shadow.
    pub shadow: Option<Shadow>,
    /// Whether the object is drawn.
    pub visible: bool,
    /// Locked objects are drawn but cannot be hit or selected.
    pub locked: bool,
}

impl Default for Style {
    fn default() -> Self {
        Self {
            fill: Some("#000000".to_string()),
            stroke: None,
            stroke_width: 0.0,
            opacity: 1.0,
            shadow: None,
            visible: true,
            locked: false,
        }
    }
}

/// Font weight as stored in a document.
///
/// Documents carry either a keyword (`"bold"`, `"normal"`) or a numeric weight;
/// the stored form is preserved so that saving does not rewrite it.
#[derive(Debug, Clone, PartialEq)]
pub enum FontWeight {
    /// CSS keyword or numeric string, e.g. `"bold"` or `"700"`.
    Named(String),
    /// Numeric weight, e.g. `700`.
    Numeric(u16),
}

impl FontWeight {
    /// The normalized bold weight.
    #[must_use]
    pub fn bold() -> Self {
        Self::Named("bold".to_string())
    }

    /// The normalized regular weight.
    #[must_use]
    pub fn normal() -> Self {
        Self::Named("normal".to_string())
    }

    /// Whether this weight renders as bold (keyword `bold`/`bolder` or 600+).
    #[must_use]
    pub fn is_bold(&self) -> bool {
        match self {
            Self::Named(name) => {
                let name = name.trim();
                name.eq_ignore_ascii_case("bold")
                    || name.eq_ignore_ascii_case("bolder")
                    || name.parse::<u16>().is_ok_and(|w| w >= 600)
            }
            Self::Numeric(weight) => *weight >= 600,
        }
    }

    /// Value suitable for a CSS/SVG `font-weight` attribute.
    #[must_use]
    pub fn css_value(&self) -> String {
        match self {
            Self::Named(name) => name.clone(),
            Self::Numeric(weight) => weight.to_string(),
        }
    }
}

impl Default for FontWeight {
    fn default() -> Self {
        Self::normal()
    }
}

impl Serialize for FontWeight {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Named(name) => serializer.serialize_str(name),
            Self::Numeric(weight) => serializer.serialize_u16(*weight),
        }
    }
}

impl<'de> Deserialize<'de> for FontWeight {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Int(u64),
            Float(f64),
            Str(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Str(name) => Ok(Self::Named(name)),
            Raw::Int(weight) => u16::try_from(weight)
                .map(Self::Numeric)
                .map_err(|_| serde::de::Error::custom(format!("font weight {weight} out of range"))),
            Raw::Float(weight) if weight.is_finite() && (0.0..=1000.0).contains(&weight) => {
                #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                let weight = weight.round() as u16;
                Ok(Self::Numeric(weight))
            }
            Raw::Float(weight) => Err(serde::de::Error::custom(format!(
                "font weight {weight} out of range"
            ))),
        }
    }
}

/// Horizontal text alignment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    /// Flush left.
    #[default]
    Left,
    /// Centred.
    Center,
    /// Flush right.
    Right,
}

/// Text content and typography.
#[derive(Debug, Clone, PartialEq)]
pub struct TextPayload {
    /// Text content; lines are separated by `\n`.
    pub text: String,
    /// Font family name or CSS font stack.
    pub font_family: String,
    /// Font size in pixels.
    pub font_size: f64,
    /// Font weight.
    pub font_weight: FontWeight,
    /// Italic style.
    pub italic: bool,
    /// Underline decoration.
    pub underline: bool,
    /// Strikethrough decoration.
    pub linethrough: bool,
    /// Horizontal alignment.
    pub align: TextAlign,
    /// Letter spacing in thousandths of an em.
    pub char_spacing: f64,
    /// Line height multiplier.
    pub line_height: f64,
}

impl TextPayload {
    /// Create a payload with the panel defaults.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            font_family: "Arial".to_string(),
            font_size: 24.0,
            font_weight: FontWeight::normal(),
            italic: false,
            underline: false,
            linethrough: false,
            align: TextAlign::Left,
            char_spacing: 0.0,
            line_height: 1.16,
        }
    }

    /// Estimate the natural `(width, height)` of the laid-out text.
    ///
    /// This is a metrics approximation; the rasterizer uses real fonts.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn estimate_size(&self) -> (f64, f64) {
        let spacing = self.char_spacing / 1000.0 * self.font_size;
        let weight_factor = if self.font_weight.is_bold() { 1.08 } else { 1.0 };
        let advance = GLYPH_ADVANCE_EM * self.font_size * weight_factor;
        let lines: Vec<&str> = self.text.split('\n').collect();
        let width = lines
            .iter()
            .map(|line| {
                let chars = line.chars().count() as f64;
                (chars * advance + (chars - 1.0).max(0.0) * spacing).max(0.0)
            })
            .fold(0.0_f64, f64::max)
            .max(1.0);
        let extra_lines = (lines.len().max(1) - 1) as f64;
        let height = self.font_size * (FIRST_LINE_EM + self.line_height * extra_lines);
        (width, height)
    }
}

/// Raster or vector image reference.
#[derive(Debug, Clone, PartialEq)]
pub struct ImagePayload {
    /// Source URL, resolved by the asset collaborator.
    pub src: String,
    /// Natural pixel width, if known.
    pub natural_width: Option<f64>,
    /// Natural pixel height, if known.
    pub natural_height: Option<f64>,
}

/// Rectangle corner radii.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RectPayload {
    /// Horizontal corner radius.
    pub rx: f64,
    /// Vertical corner radius.
    pub ry: f64,
}

/// Circle marker. The radius is always derived from the geometry, see
/// [`Geometry::inscribed_radius`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CirclePayload;

/// Composite of child objects, e.g. an imported vector sticker.
///
/// Child coordinates are relative to the group's top-left corner.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupPayload {
    /// Children in paint order.
    pub objects: Vec<SceneObject>,
}

impl GroupPayload {
    /// Combined bounds of the children in group-local units.
    #[must_use]
    pub fn bounds(&self) -> Option<Bounds> {
        self.objects
            .iter()
            .map(|child| child.geometry.bounding_box())
            .reduce(|acc, b| acc.union(&b))
    }
}

/// The type-specific content of an object.
#[derive(Debug, Clone, PartialEq)]
pub enum ObjectKind {
    /// Editable text.
    Text(TextPayload),
    /// Raster or vector image.
    Image(ImagePayload),
    /// Rectangle shape.
    Rect(RectPayload),
    /// Circle shape.
    Circle(CirclePayload),
    /// Group of child objects.
    Group(GroupPayload),
}

impl ObjectKind {
    /// The discriminant used in the portable form.
    #[must_use]
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::Image(_) => "image",
            Self::Rect(_) => "rect",
            Self::Circle(_) => "circle",
            Self::Group(_) => "group",
        }
    }
}

/// A positioned, styled design element.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneObject {
    /// Unique identifier.
    pub id: ObjectId,
    /// Type-specific payload.
    pub kind: ObjectKind,
    /// Position, size and transform.
    pub geometry: Geometry,
    /// Visual style.
    pub style: Style,
}

impl SceneObject {
    /// Build an object from a constructor spec, assigning fresh ids to it and
    /// to any group children.
    #[must_use]
    pub fn from_spec(spec: ObjectSpec) -> Self {
        let kind = match spec.kind {
            SpecKind::Text(text) => ObjectKind::Text(text),
            SpecKind::Image(image) => ObjectKind::Image(image),
            SpecKind::Rect(rect) => ObjectKind::Rect(rect),
            SpecKind::Circle(circle) => ObjectKind::Circle(circle),
            SpecKind::Group(children) => ObjectKind::Group(GroupPayload {
                objects: children.into_iter().map(Self::from_spec).collect(),
            }),
        };
        Self {
            id: ObjectId::new(),
            kind,
            geometry: spec.geometry,
            style: spec.style,
        }
    }

    /// Text payload, if this is a text object.
    #[must_use]
    pub fn as_text(&self) -> Option<&TextPayload> {
        match &self.kind {
            ObjectKind::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Whether pointer interaction may target this object.
    #[must_use]
    pub fn is_hit_testable(&self) -> bool {
        self.style.visible && !self.style.locked
    }

    /// Check if a point (in canvas coordinates) is within this object.
    #[must_use]
    pub fn contains_point(&self, x: f64, y: f64) -> bool {
        self.geometry.contains_point(x, y)
    }
}

/// Kind-specific part of an [`ObjectSpec`].
#[derive(Debug, Clone, PartialEq)]
pub enum SpecKind {
    /// Text payload.
    Text(TextPayload),
    /// Image payload.
    Image(ImagePayload),
    /// Rectangle payload.
    Rect(RectPayload),
    /// Circle payload.
    Circle(CirclePayload),
    /// Child specs, in group-local coordinates.
    Group(Vec<ObjectSpec>),
}

/// Constructor input for a new object: everything but the id.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectSpec {
    /// Kind-specific payload.
    pub kind: SpecKind,
    /// Initial geometry.
    pub geometry: Geometry,
    /// Initial style.
    pub style: Style,
}

impl ObjectSpec {
    /// Text object sized to its content.
    #[must_use]
    pub fn text(content: impl Into<String>) -> Self {
        Self::from_text_payload(TextPayload::new(content))
    }

    /// Text object from a full payload, sized to its content.
    #[must_use]
    pub fn from_text_payload(payload: TextPayload) -> Self {
        let (width, height) = payload.estimate_size();
        Self {
            kind: SpecKind::Text(payload),
            geometry: Geometry::new(0.0, 0.0, width, height),
            style: Style::default(),
        }
    }

    /// Image object with the given natural size.
    #[must_use]
    pub fn image(src: impl Into<String>, natural_width: f64, natural_height: f64) -> Self {
        Self {
            kind: SpecKind::Image(ImagePayload {
                src: src.into(),
                natural_width: Some(natural_width),
                natural_height: Some(natural_height),
            }),
            geometry: Geometry::new(0.0, 0.0, natural_width, natural_height),
            style: Style {
                fill: None,
                ..Style::default()
            },
        }
    }

    /// Rectangle of the given size.
    #[must_use]
    pub fn rect(width: f64, height: f64) -> Self {
        Self {
            kind: SpecKind::Rect(RectPayload::default()),
            geometry: Geometry::new(0.0, 0.0, width, height),
            style: Style::default(),
        }
    }

    /// Circle of the given radius.
    #[must_use]
    pub fn circle(radius: f64) -> Self {
        Self {
            kind: SpecKind::Circle(CirclePayload),
            geometry: Geometry::new(0.0, 0.0, radius * 2.0, radius * 2.0),
            style: Style::default(),
        }
    }

    /// Group of children given in absolute coordinates.
    ///
    /// The group is placed at the children's combined bounds and the children
    /// are re-expressed relative to it.
    #[must_use]
    pub fn group(mut children: Vec<ObjectSpec>) -> Self {
        let bounds = children
            .iter()
            .map(|child| child.geometry.bounding_box())
            .reduce(|acc, b| acc.union(&b))
            .unwrap_or(Bounds {
                min_x: 0.0,
                min_y: 0.0,
                max_x: 0.0,
                max_y: 0.0,
            });
        for child in &mut children {
            child.geometry.x -= bounds.min_x;
            child.geometry.y -= bounds.min_y;
        }
        Self {
            kind: SpecKind::Group(children),
            geometry: Geometry::new(bounds.min_x, bounds.min_y, bounds.width(), bounds.height()),
            style: Style {
                fill: None,
                ..Style::default()
            },
        }
    }

    /// Place the object at `(x, y)`.
    #[must_use]
    pub fn at(mut self, x: f64, y: f64) -> Self {
        self.geometry.x = x;
        self.geometry.y = y;
        self
    }

    /// Set independent scale factors.
    #[must_use]
    pub fn with_scale(mut self, scale_x: f64, scale_y: f64) -> Self {
        self.geometry.scale_x = scale_x;
        self.geometry.scale_y = scale_y;
        self
    }

    /// Set the fill colour (`None` for transparent).
    #[must_use]
    pub fn with_fill(mut self, fill: Option<&str>) -> Self {
        self.style.fill = fill.map(str::to_string);
        self
    }

    /// Replace the whole style.
    #[must_use]
    pub fn with_style(mut self, style: Style) -> Self {
        self.style = style;
        self
    }

    /// Replace the whole geometry.
    #[must_use]
    pub fn with_geometry(mut self, geometry: Geometry) -> Self {
        self.geometry = geometry;
        self
    }
}
