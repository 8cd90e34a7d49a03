//! Document to SVG conversion.
//!
//! Every render goes through an SVG intermediate that resvg rasterizes. The
//! root `viewBox` is always the logical 600x800 canvas; output scaling only
//! changes the root `width`/`height`.

use std::collections::HashMap;
use std::fmt::Write;

use invite_core::{
    Background, FontWeight, ObjectKind, SceneDocument, SceneObject, Style, TextAlign,
    TextPayload, LOGICAL_HEIGHT, LOGICAL_WIDTH,
};

use crate::asset::LoadedAsset;
use crate::cache::AssetCache;

/// Fill of the box drawn where an asset is missing.
pub const PLACEHOLDER_FILL: &str = "#e0e0e0";
/// Outline of the box drawn where an asset is missing.
pub const PLACEHOLDER_STROKE: &str = "#999999";

/// Fraction of the font size from the line top to the baseline.
const BASELINE_EM: f64 = 0.89;

/// Lookup of decoded assets by source reference.
pub trait AssetLookup {
    /// The decoded asset for `src`, if available.
    fn lookup(&self, src: &str) -> Option<&LoadedAsset>;
}

impl AssetLookup for AssetCache {
    fn lookup(&self, src: &str) -> Option<&LoadedAsset> {
        self.peek(src)
    }
}

impl AssetLookup for HashMap<String, LoadedAsset> {
    fn lookup(&self, src: &str) -> Option<&LoadedAsset> {
        self.get(src)
    }
}

/// Colours for missing-asset placeholders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceholderStyle {
    /// Box fill.
    pub fill: String,
    /// Box outline and cross.
    pub stroke: String,
}

impl Default for PlaceholderStyle {
    fn default() -> Self {
        Self {
            fill: PLACEHOLDER_FILL.to_string(),
            stroke: PLACEHOLDER_STROKE.to_string(),
        }
    }
}

/// Serialize `document` as an SVG string `scale` times the logical size.
#[must_use]
pub fn document_to_svg(
    document: &SceneDocument,
    assets: &dyn AssetLookup,
    scale: f64,
    placeholder: &PlaceholderStyle,
) -> String {
    let (out_w, out_h) = output_size(scale);
    let mut writer = SvgWriter {
        svg: String::with_capacity(4096),
        assets,
        placeholder,
        next_filter: 0,
    };

    let _ = write!(
        writer.svg,
        "<svg xmlns=\"http://www.w3.org/2000/svg\" xmlns:xlink=\"http://www.w3.org/1999/xlink\" width=\"{out_w}\" height=\"{out_h}\" viewBox=\"0 0 {LOGICAL_WIDTH} {LOGICAL_HEIGHT}\">",
    );
    writer.background(document.background());
    for object in document.objects() {
        writer.object(object);
    }
    writer.svg.push_str("</svg>");
    writer.svg
}

/// Pixel size of a render at `scale`, at least 1x1.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn output_size(scale: f64) -> (u32, u32) {
    let w = (LOGICAL_WIDTH * scale).round().max(1.0) as u32;
    let h = (LOGICAL_HEIGHT * scale).round().max(1.0) as u32;
    (w, h)
}

struct SvgWriter<'a> {
    svg: String,
    assets: &'a dyn AssetLookup,
    placeholder: &'a PlaceholderStyle,
    next_filter: usize,
}

impl SvgWriter<'_> {
    fn background(&mut self, background: &Background) {
        match background {
            Background::Color(color) => {
                let _ = write!(
                    self.svg,
                    "<rect width=\"{LOGICAL_WIDTH}\" height=\"{LOGICAL_HEIGHT}\" fill=\"{}\"/>",
                    escape_xml(color),
                );
            }
            Background::Image { src } => {
                let _ = write!(
                    self.svg,
                    "<rect width=\"{LOGICAL_WIDTH}\" height=\"{LOGICAL_HEIGHT}\" fill=\"#ffffff\"/>"
                );
                self.image(src, LOGICAL_WIDTH, LOGICAL_HEIGHT);
            }
        }
    }

    fn object(&mut self, object: &SceneObject) {
        if !object.style.visible {
            return;
        }
        tracing::trace!("Render {} {}", object.kind.tag(), object.id);

        let g = &object.geometry;
        let (cx, cy) = g.center();
        let sx = g.scale_x * if g.flip_x { -1.0 } else { 1.0 };
        let sy = g.scale_y * if g.flip_y { -1.0 } else { 1.0 };

        let filter = object.style.shadow.as_ref().map(|shadow| {
            let id = format!("shadow-{}", self.next_filter);
            self.next_filter += 1;
            // Shadow offsets are in canvas units, so undo the object scale.
            let dx = shadow.offset_x / g.scale_x.abs().max(f64::EPSILON);
            let dy = shadow.offset_y / g.scale_y.abs().max(f64::EPSILON);
            let _ = write!(
                self.svg,
                "<defs><filter id=\"{id}\" x=\"-50%\" y=\"-50%\" width=\"200%\" height=\"200%\"><feDropShadow dx=\"{dx}\" dy=\"{dy}\" stdDeviation=\"{}\" flood-color=\"{}\"/></filter></defs>",
                shadow.blur / 2.0,
                escape_xml(&shadow.color),
            );
            id
        });

        let _ = write!(
            self.svg,
            "<g transform=\"translate({cx},{cy}) rotate({}) scale({sx},{sy}) translate({},{})\" opacity=\"{}\"",
            g.angle,
            -g.width / 2.0,
            -g.height / 2.0,
            object.style.opacity,
        );
        if let Some(id) = filter {
            let _ = write!(self.svg, " filter=\"url(#{id})\"");
        }
        self.svg.push('>');

        match &object.kind {
            ObjectKind::Rect(rect) => {
                let _ = write!(
                    self.svg,
                    "<rect width=\"{}\" height=\"{}\" rx=\"{}\" ry=\"{}\"{}/>",
                    g.width,
                    g.height,
                    rect.rx,
                    rect.ry,
                    paint(&object.style),
                );
            }
            ObjectKind::Circle(_) => {
                let _ = write!(
                    self.svg,
                    "<circle cx=\"{}\" cy=\"{}\" r=\"{}\"{}/>",
                    g.width / 2.0,
                    g.height / 2.0,
                    g.inscribed_radius(),
                    paint(&object.style),
                );
            }
            ObjectKind::Text(text) => self.text(text, &object.style, g.width),
            ObjectKind::Image(image) => self.image(&image.src, g.width, g.height),
            ObjectKind::Group(group) => {
                for child in &group.objects {
                    self.object(child);
                }
            }
        }

        self.svg.push_str("</g>");
    }

    fn text(&mut self, text: &TextPayload, style: &Style, width: f64) {
        let (x, anchor) = match text.align {
            TextAlign::Left => (0.0, "start"),
            TextAlign::Center => (width / 2.0, "middle"),
            TextAlign::Right => (width, "end"),
        };
        let mut decoration = Vec::new();
        if text.underline {
            decoration.push("underline");
        }
        if text.linethrough {
            decoration.push("line-through");
        }

        let _ = write!(
            self.svg,
            "<text xml:space=\"preserve\" font-family=\"{}\" font-size=\"{}\" font-weight=\"{}\" font-style=\"{}\" text-anchor=\"{anchor}\" letter-spacing=\"{}\"{}{}>",
            escape_xml(&text.font_family),
            text.font_size,
            weight_attr(&text.font_weight),
            if text.italic { "italic" } else { "normal" },
            text.char_spacing / 1000.0 * text.font_size,
            if decoration.is_empty() {
                String::new()
            } else {
                format!(" text-decoration=\"{}\"", decoration.join(" "))
            },
            paint(style),
        );

        let line_advance = text.font_size * text.line_height;
        let mut y = text.font_size * BASELINE_EM;
        for line in text.text.split('\n') {
            let _ = write!(
                self.svg,
                "<tspan x=\"{x}\" y=\"{y}\">{}</tspan>",
                escape_xml(line)
            );
            y += line_advance;
        }
        self.svg.push_str("</text>");
    }

    fn image(&mut self, src: &str, width: f64, height: f64) {
        if let Some(asset) = self.assets.lookup(src) {
            let _ = write!(
                self.svg,
                "<image width=\"{width}\" height=\"{height}\" preserveAspectRatio=\"none\" xlink:href=\"{}\"/>",
                escape_xml(&asset.data_uri),
            );
        } else {
            tracing::trace!("Asset {src} not loaded, drawing placeholder");
            let fill = escape_xml(&self.placeholder.fill);
            let stroke = escape_xml(&self.placeholder.stroke);
            let _ = write!(
                self.svg,
                "<rect width=\"{width}\" height=\"{height}\" fill=\"{fill}\" stroke=\"{stroke}\" stroke-width=\"1\"/><path d=\"M0,0 L{width},{height} M{width},0 L0,{height}\" stroke=\"{stroke}\" stroke-width=\"1\"/>",
            );
        }
    }
}

/// Every distinct asset reference in `document`, background first, then
/// objects in paint order including group children.
#[must_use]
pub fn asset_sources(document: &SceneDocument) -> Vec<String> {
    fn walk(objects: &[SceneObject], out: &mut Vec<String>) {
        for object in objects {
            match &object.kind {
                ObjectKind::Image(image) if !out.contains(&image.src) => {
                    out.push(image.src.clone());
                }
                ObjectKind::Group(group) => walk(&group.objects, out),
                _ => {}
            }
        }
    }

    let mut out = Vec::new();
    if let Background::Image { src } = document.background() {
        out.push(src.clone());
    }
    walk(document.objects(), &mut out);
    out
}

/// `fill`/`stroke` attributes for a style.
fn paint(style: &Style) -> String {
    let mut attrs = String::new();
    match &style.fill {
        Some(fill) => {
            let _ = write!(attrs, " fill=\"{}\"", escape_xml(fill));
        }
        None => attrs.push_str(" fill=\"none\""),
    }
    if let Some(stroke) = style.stroke.as_ref().filter(|_| style.stroke_width > 0.0) {
        let _ = write!(
            attrs,
            " stroke=\"{}\" stroke-width=\"{}\"",
            escape_xml(stroke),
            style.stroke_width
        );
    }
    attrs
}

fn weight_attr(weight: &FontWeight) -> String {
    match weight {
        FontWeight::Numeric(n) => n.to_string(),
        FontWeight::Named(name) if name.parse::<u16>().is_ok() => name.clone(),
        FontWeight::Named(_) if weight.is_bold() => "bold".to_string(),
        FontWeight::Named(name) => match name.as_str() {
            "lighter" | "bolder" => name.clone(),
            _ => "normal".to_string(),
        },
    }
}

/// Escape special XML characters.
fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use invite_core::{CanvasRuntime, ObjectPatch, ObjectSpec};

    fn no_assets() -> HashMap<String, LoadedAsset> {
        HashMap::new()
    }

    #[test]
    fn test_empty_document_has_logical_viewbox() {
        let svg = document_to_svg(
            &SceneDocument::new(),
            &no_assets(),
            0.5,
            &PlaceholderStyle::default(),
        );
        assert!(svg.starts_with("<svg"));
        assert!(svg.ends_with("</svg>"));
        assert!(svg.contains("width=\"300\" height=\"400\""));
        assert!(svg.contains("viewBox=\"0 0 600 800\""));
        assert!(svg.contains("fill=\"#ffffff\""));
    }

    #[test]
    fn test_resized_circle_draws_new_radius() {
        let mut runtime = CanvasRuntime::new();
        let id = runtime.add_object(ObjectSpec::circle(20.0));
        let patch = ObjectPatch {
            width: Some(200.0),
            height: Some(200.0),
            ..ObjectPatch::default()
        };
        runtime.set_property(&id, &patch).expect("resize");
        let svg = document_to_svg(
            runtime.document(),
            &no_assets(),
            1.0,
            &PlaceholderStyle::default(),
        );
        assert!(svg.contains("<circle cx=\"100\" cy=\"100\" r=\"100\""));
    }

    #[test]
    fn test_text_is_escaped_and_split_into_lines() {
        let mut runtime = CanvasRuntime::new();
        runtime.add_object(ObjectSpec::text("Tom & Jerry\n<party>"));
        let svg = document_to_svg(
            runtime.document(),
            &no_assets(),
            1.0,
            &PlaceholderStyle::default(),
        );
        assert!(svg.contains("Tom &amp; Jerry"));
        assert!(svg.contains("&lt;party&gt;"));
        assert_eq!(svg.matches("<tspan").count(), 2);
    }

    #[test]
    fn test_hidden_objects_are_skipped() {
        let mut runtime = CanvasRuntime::new();
        let id = runtime.add_object(ObjectSpec::circle(10.0));
        runtime.set_visibility(&id, false);
        let svg = document_to_svg(
            runtime.document(),
            &no_assets(),
            1.0,
            &PlaceholderStyle::default(),
        );
        assert!(!svg.contains("<circle"));
    }

    #[test]
    fn test_missing_image_draws_placeholder() {
        let mut runtime = CanvasRuntime::new();
        runtime.add_object(ObjectSpec::image("https://cdn/missing.png", 100.0, 50.0));
        let svg = document_to_svg(
            runtime.document(),
            &no_assets(),
            1.0,
            &PlaceholderStyle::default(),
        );
        assert!(svg.contains(PLACEHOLDER_FILL));
        assert!(!svg.contains("<image"));
    }

    #[test]
    fn test_shadow_and_transform() {
        let mut runtime = CanvasRuntime::new();
        let id = runtime.add_object(ObjectSpec::rect(100.0, 50.0).at(10.0, 20.0));
        let patch: ObjectPatch = serde_json::from_value(serde_json::json!({
            "angle": 30.0, "flipX": true,
            "shadow": {"color": "rgba(0,0,0,0.3)", "blur": 10.0, "offsetX": 5.0, "offsetY": 5.0}
        }))
        .expect("patch");
        runtime.set_property(&id, &patch).expect("set");

        let svg = document_to_svg(
            runtime.document(),
            &no_assets(),
            1.0,
            &PlaceholderStyle::default(),
        );
        assert!(svg.contains("translate(60,45) rotate(30) scale(-1,1)"));
        assert!(svg.contains("feDropShadow"));
        assert!(svg.contains("filter=\"url(#shadow-0)\""));
    }

    #[test]
    fn test_asset_sources_walks_groups_once() {
        let mut runtime = CanvasRuntime::new();
        runtime.set_background(Background::Image {
            src: "paper.jpg".to_string(),
        });
        runtime.add_object(ObjectSpec::image("heart.png", 10.0, 10.0));
        runtime.add_object(ObjectSpec::group(vec![
            ObjectSpec::image("star.svg", 10.0, 10.0),
            ObjectSpec::image("heart.png", 10.0, 10.0),
        ]));
        assert_eq!(
            asset_sources(runtime.document()),
            vec!["paper.jpg", "heart.png", "star.svg"]
        );
    }

    #[test]
    fn test_output_size() {
        assert_eq!(output_size(1.0), (600, 800));
        assert_eq!(output_size(0.5), (300, 400));
        assert_eq!(output_size(0.0), (1, 1));
    }
}
