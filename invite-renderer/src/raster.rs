//! Rasterization of the SVG intermediate and the resulting image types.

use std::sync::{Arc, OnceLock};

use crate::asset::{create_placeholder, to_data_uri};
use crate::error::{RenderError, RenderResult};

static FONT_DB: OnceLock<Arc<usvg::fontdb::Database>> = OnceLock::new();

/// System fonts, loaded once per process.
fn font_db() -> Arc<usvg::fontdb::Database> {
    Arc::clone(FONT_DB.get_or_init(|| {
        let mut db = usvg::fontdb::Database::new();
        db.load_system_fonts();
        tracing::debug!("Loaded {} font faces", db.len());
        Arc::new(db)
    }))
}

/// Rasterize an SVG string to a tiny-skia pixmap of the SVG's own size.
///
/// # Errors
///
/// Returns [`RenderError::Svg`] if the SVG cannot be parsed and
/// [`RenderError::Export`] if the pixmap cannot be allocated.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub(crate) fn rasterize_svg(svg: &str, anti_aliasing: bool) -> RenderResult<tiny_skia::Pixmap> {
    let opt = usvg::Options {
        fontdb: font_db(),
        shape_rendering: if anti_aliasing {
            usvg::ShapeRendering::GeometricPrecision
        } else {
            usvg::ShapeRendering::CrispEdges
        },
        ..usvg::Options::default()
    };
    let tree = usvg::Tree::from_str(svg, &opt)
        .map_err(|e| RenderError::Svg(format!("SVG parsing failed: {e}")))?;

    let px_w = tree.size().width().round() as u32;
    let px_h = tree.size().height().round() as u32;

    let mut pixmap = tiny_skia::Pixmap::new(px_w.max(1), px_h.max(1))
        .ok_or_else(|| RenderError::Export("Failed to create pixmap".to_string()))?;

    resvg::render(&tree, tiny_skia::Transform::default(), &mut pixmap.as_mut());

    Ok(pixmap)
}

/// A rendered frame of the live canvas.
#[derive(Debug, Clone)]
pub struct RasterSurface {
    pixmap: tiny_skia::Pixmap,
}

impl RasterSurface {
    pub(crate) fn new(pixmap: tiny_skia::Pixmap) -> Self {
        Self { pixmap }
    }

    /// Width in pixels.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    /// Height in pixels.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    /// Straight-alpha RGBA of one pixel, `None` outside the surface.
    #[must_use]
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        let color = self.pixmap.pixel(x, y)?.demultiply();
        Some([color.red(), color.green(), color.blue(), color.alpha()])
    }

    /// Premultiplied RGBA bytes, row-major.
    #[must_use]
    pub fn data(&self) -> &[u8] {
        self.pixmap.data()
    }

    /// Encode as PNG.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding fails.
    pub fn encode_png(&self) -> RenderResult<Vec<u8>> {
        self.pixmap
            .encode_png()
            .map_err(|e| RenderError::Export(format!("PNG encoding failed: {e}")))
    }

    /// Encode as PNG and wrap as a [`RasterImage`].
    ///
    /// # Errors
    ///
    /// Returns an error if encoding fails.
    pub fn to_image(&self) -> RenderResult<RasterImage> {
        Ok(RasterImage {
            width: self.width(),
            height: self.height(),
            png: self.encode_png()?,
        })
    }
}

/// An encoded preview image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterImage {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// PNG bytes.
    pub png: Vec<u8>,
}

impl RasterImage {
    /// The checkerboard placeholder shown when a preview cannot be rendered.
    ///
    /// # Errors
    ///
    /// Returns an error if PNG encoding fails.
    pub fn placeholder(width: u32, height: u32) -> RenderResult<Self> {
        let img = create_placeholder(width, height);
        let mut buf = std::io::Cursor::new(Vec::new());
        img.write_to(&mut buf, image::ImageFormat::Png)
            .map_err(|e| RenderError::Export(format!("PNG encoding failed: {e}")))?;
        Ok(Self {
            width: img.width(),
            height: img.height(),
            png: buf.into_inner(),
        })
    }

    /// `data:image/png;base64,` URI for embedding in a page.
    #[must_use]
    pub fn to_data_uri(&self) -> String {
        to_data_uri("image/png", &self.png)
    }

    /// Decode back into pixels.
    ///
    /// # Errors
    ///
    /// Returns an error if the PNG cannot be decoded.
    pub fn decode(&self) -> RenderResult<image::RgbaImage> {
        image::load_from_memory(&self.png)
            .map(|img| img.to_rgba8())
            .map_err(|e| RenderError::Export(format!("PNG decoding failed: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rasterize_simple_svg() {
        let svg = "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"4\" height=\"2\"><rect width=\"4\" height=\"2\" fill=\"#ff0000\"/></svg>";
        let surface = RasterSurface::new(rasterize_svg(svg, true).expect("rasterize"));
        assert_eq!((surface.width(), surface.height()), (4, 2));
        assert_eq!(surface.pixel(1, 1), Some([255, 0, 0, 255]));
        assert_eq!(surface.pixel(4, 0), None);

        let png = surface.encode_png().expect("png");
        assert_eq!(&png[0..4], &[137, 80, 78, 71]);
    }

    #[test]
    fn test_invalid_svg_is_an_error() {
        assert!(matches!(
            rasterize_svg("<not-svg", true),
            Err(RenderError::Svg(_))
        ));
    }

    #[test]
    fn test_placeholder_image() {
        let image = RasterImage::placeholder(30, 40).expect("placeholder");
        assert_eq!((image.width, image.height), (30, 40));
        assert!(image.to_data_uri().starts_with("data:image/png;base64,iVBOR"));
        assert_eq!(image.decode().expect("decode").dimensions(), (30, 40));
    }
}
