//! Asset decoding utilities.
//!
//! Supports raster images (PNG, JPEG, WebP, GIF), SVG drawings and
//! base64- or percent-encoded data URIs. Decoded assets are kept as data URIs
//! so the SVG intermediate can embed them directly.

use base64::Engine;

use crate::error::{RenderError, RenderResult};

/// Decoded asset ready to embed in a render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedAsset {
    /// Detected format.
    pub format: AssetFormat,
    /// Natural width in pixels.
    pub width: u32,
    /// Natural height in pixels.
    pub height: u32,
    /// `data:` URI holding the (possibly re-encoded) bytes.
    pub data_uri: String,
}

impl LoadedAsset {
    /// Approximate memory held by this asset.
    #[must_use]
    pub fn size_bytes(&self) -> usize {
        self.data_uri.len()
    }
}

/// Supported asset formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetFormat {
    /// PNG with alpha support.
    Png,
    /// JPEG (no alpha).
    Jpeg,
    /// WebP (alpha support).
    WebP,
    /// GIF (first frame).
    Gif,
    /// SVG drawing.
    Svg,
    /// Unknown/other format.
    Unknown,
}

impl AssetFormat {
    /// Detect format from magic bytes.
    #[must_use]
    pub fn from_magic_bytes(data: &[u8]) -> Self {
        if data.len() < 4 {
            return Self::Unknown;
        }

        // PNG: 89 50 4E 47
        if data.starts_with(&[0x89, 0x50, 0x4E, 0x47]) {
            return Self::Png;
        }

        // JPEG: FF D8 FF
        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Self::Jpeg;
        }

        // WebP: RIFF....WEBP
        if data.len() >= 12 && &data[0..4] == b"RIFF" && &data[8..12] == b"WEBP" {
            return Self::WebP;
        }

        if data.starts_with(b"GIF8") {
            return Self::Gif;
        }

        let head = &data[..data.len().min(256)];
        let text = String::from_utf8_lossy(head);
        let text = text.trim_start_matches('\u{feff}').trim_start();
        if text.starts_with("<svg") || (text.starts_with("<?xml") && text.contains("<svg")) {
            return Self::Svg;
        }

        Self::Unknown
    }

    /// MIME type used in data URIs.
    #[must_use]
    pub fn mime(self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::WebP => "image/webp",
            Self::Gif => "image/gif",
            Self::Svg => "image/svg+xml",
            Self::Unknown => "application/octet-stream",
        }
    }
}

/// Decode fetched bytes into an embeddable asset.
///
/// PNG, JPEG and SVG are embedded as-is; other raster formats are re-encoded
/// to PNG.
///
/// # Errors
///
/// Returns [`RenderError::ResourceLoad`] if the bytes cannot be decoded.
pub fn decode_asset(bytes: &[u8]) -> RenderResult<LoadedAsset> {
    let format = AssetFormat::from_magic_bytes(bytes);

    if format == AssetFormat::Svg {
        let tree = usvg::Tree::from_data(bytes, &usvg::Options::default())
            .map_err(|e| RenderError::ResourceLoad(format!("Failed to parse SVG: {e}")))?;
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let (width, height) = (
            tree.size().width().ceil() as u32,
            tree.size().height().ceil() as u32,
        );
        return Ok(LoadedAsset {
            format,
            width,
            height,
            data_uri: to_data_uri(format.mime(), bytes),
        });
    }

    let img = image::load_from_memory(bytes)
        .map_err(|e| RenderError::ResourceLoad(format!("Failed to decode image: {e}")))?;
    let (width, height) = (img.width(), img.height());

    let data_uri = match format {
        AssetFormat::Png | AssetFormat::Jpeg => to_data_uri(format.mime(), bytes),
        _ => {
            let mut buf = std::io::Cursor::new(Vec::new());
            img.write_to(&mut buf, image::ImageFormat::Png)
                .map_err(|e| RenderError::ResourceLoad(format!("Failed to re-encode image: {e}")))?;
            to_data_uri(AssetFormat::Png.mime(), buf.get_ref())
        }
    };

    Ok(LoadedAsset {
        format,
        width,
        height,
        data_uri,
    })
}

/// Encode bytes as a base64 data URI.
#[must_use]
pub fn to_data_uri(mime: &str, bytes: &[u8]) -> String {
    let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);
    format!("data:{mime};base64,{encoded}")
}

/// Split a data URI into its MIME type and decoded bytes.
///
/// Supports formats like: `data:image/png;base64,iVBORw0KGgo...` and
/// percent-encoded payloads such as `data:image/svg+xml,%3Csvg...`.
///
/// # Errors
///
/// Returns an error if the data URI is malformed.
pub fn parse_data_uri(uri: &str) -> RenderResult<(String, Vec<u8>)> {
    let uri_data = uri
        .strip_prefix("data:")
        .ok_or_else(|| RenderError::ResourceLoad("Not a data URI".to_string()))?;

    // Find the comma separating metadata from data
    let comma_pos = uri_data
        .find(',')
        .ok_or_else(|| RenderError::ResourceLoad("Invalid data URI: missing comma".to_string()))?;

    let metadata = &uri_data[..comma_pos];
    let encoded_data = &uri_data[comma_pos + 1..];
    let mime = metadata.split(';').next().unwrap_or_default().to_string();

    let bytes = if metadata.ends_with(";base64") {
        base64::engine::general_purpose::STANDARD
            .decode(encoded_data.trim())
            .map_err(|e| RenderError::ResourceLoad(format!("Failed to decode base64: {e}")))?
    } else {
        percent_decode(encoded_data)?
    };

    Ok((mime, bytes))
}

/// Percent-decoding over bytes.
fn percent_decode(input: &str) -> RenderResult<Vec<u8>> {
    let bytes = input.as_bytes();
    let mut result = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'%' {
            let byte = bytes
                .get(i + 1..i + 3)
                .and_then(|hex| std::str::from_utf8(hex).ok())
                .and_then(|hex| u8::from_str_radix(hex, 16).ok())
                .ok_or_else(|| RenderError::ResourceLoad("Invalid URL encoding".to_string()))?;
            result.push(byte);
            i += 3;
        } else {
            result.push(bytes[i]);
            i += 1;
        }
    }

    Ok(result)
}

/// Create a placeholder image with a checkerboard pattern.
#[must_use]
pub fn create_placeholder(width: u32, height: u32) -> image::RgbaImage {
    let cell_size = 16u32;
    image::RgbaImage::from_fn(width.max(1), height.max(1), |x, y| {
        if ((x / cell_size) + (y / cell_size)) % 2 == 0 {
            image::Rgba([200, 200, 200, 255]) // Light gray
        } else {
            image::Rgba([150, 150, 150, 255]) // Dark gray
        }
    })
}
