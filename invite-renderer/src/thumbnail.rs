//! Off-screen preview rendering.
//!
//! A preview is rendered from the portable form into its own isolated render
//! target: the document is deserialized fresh, its assets are fetched into a
//! target-local table, and the result is rasterized at a fraction of the
//! logical size. Nothing is shared with a live editor or the live renderer's
//! cache.
//!
//! The whole pipeline runs under a timeout. Rasterization and PNG encoding
//! run on the blocking pool so the timer keeps ticking while they work. When
//! the timeout expires the in-flight work is dropped, which disposes of the
//! render target, and the call resolves to [`RenderError::Timeout`]; a
//! rasterization already running finishes in the background and is
//! discarded.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use invite_core::{deserialize, PortableForm, SceneDocument};

use crate::asset::LoadedAsset;
use crate::error::{RenderError, RenderResult};
use crate::raster::{rasterize_svg, RasterImage, RasterSurface};
use crate::resolver::AssetResolver;
use crate::svg::{asset_sources, document_to_svg, output_size, PlaceholderStyle};

/// Default preview scale relative to the logical canvas.
pub const DEFAULT_MULTIPLIER: f64 = 0.5;

/// Largest accepted preview scale (2400x3200 pixels).
pub const MAX_MULTIPLIER: f64 = 4.0;

/// Default bound on a whole preview render.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Options for a single preview render.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PreviewOptions {
    /// Output scale relative to the 600x800 logical canvas, at most
    /// [`MAX_MULTIPLIER`].
    pub multiplier: f64,
    /// Upper bound for asset loading plus rasterization.
    pub timeout: Duration,
}

impl Default for PreviewOptions {
    fn default() -> Self {
        Self {
            multiplier: DEFAULT_MULTIPLIER,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl PreviewOptions {
    /// Output size in pixels.
    #[must_use]
    pub fn output_size(&self) -> (u32, u32) {
        output_size(self.multiplier)
    }
}

/// How a preview request was satisfied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreviewStatus {
    /// The document was rendered.
    Rendered,
    /// Rendering failed; the image is the static placeholder.
    Placeholder(String),
}

/// A preview image together with how it was produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewOutcome {
    /// The image to show.
    pub image: RasterImage,
    /// Whether `image` is a real render or the fallback.
    pub status: PreviewStatus,
}

impl PreviewOutcome {
    /// Whether the fallback placeholder was used.
    #[must_use]
    pub fn is_placeholder(&self) -> bool {
        matches!(self.status, PreviewStatus::Placeholder(_))
    }
}

/// Isolated state for one preview render. Released on drop, whichever way
/// the render ends.
struct RenderTarget {
    assets: HashMap<String, LoadedAsset>,
    live: Arc<AtomicUsize>,
}

impl RenderTarget {
    fn acquire(live: &Arc<AtomicUsize>) -> Self {
        let now = live.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::trace!("Render target acquired ({now} live)");
        Self {
            assets: HashMap::new(),
            live: Arc::clone(live),
        }
    }
}

impl Drop for RenderTarget {
    fn drop(&mut self) {
        self.assets.clear();
        let now = self.live.fetch_sub(1, Ordering::SeqCst) - 1;
        tracing::trace!("Render target disposed ({now} live)");
    }
}

/// Renders previews of serialized documents.
#[derive(Clone)]
pub struct ThumbnailRenderer {
    resolver: Arc<dyn AssetResolver>,
    anti_aliasing: bool,
    placeholder: PlaceholderStyle,
    live: Arc<AtomicUsize>,
}

impl fmt::Debug for ThumbnailRenderer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ThumbnailRenderer")
            .field("anti_aliasing", &self.anti_aliasing)
            .field("placeholder", &self.placeholder)
            .field("live_render_targets", &self.live_render_targets())
            .finish_non_exhaustive()
    }
}

impl ThumbnailRenderer {
    /// Create a renderer fetching assets through `resolver`.
    #[must_use]
    pub fn new(resolver: Arc<dyn AssetResolver>) -> Self {
        Self {
            resolver,
            anti_aliasing: true,
            placeholder: PlaceholderStyle::default(),
            live: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Set anti-aliasing and missing-asset colours.
    #[must_use]
    pub fn with_style(mut self, anti_aliasing: bool, placeholder: PlaceholderStyle) -> Self {
        self.anti_aliasing = anti_aliasing;
        self.placeholder = placeholder;
        self
    }

    /// Number of render targets currently alive.
    #[must_use]
    pub fn live_render_targets(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }

    /// Render `form` as a preview image.
    ///
    /// Assets that fail to load are drawn as placeholder boxes; only a
    /// malformed document, a timeout or a rasterization failure is an error.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Document`] for a malformed form,
    /// [`RenderError::Timeout`] if `options.timeout` expires, and
    /// [`RenderError::Export`] for an unusable multiplier or encoding failure.
    pub async fn render_preview(
        &self,
        form: &PortableForm,
        options: &PreviewOptions,
    ) -> RenderResult<RasterImage> {
        if !(options.multiplier > 0.0 && options.multiplier <= MAX_MULTIPLIER) {
            return Err(RenderError::Export(format!(
                "invalid preview multiplier {}",
                options.multiplier
            )));
        }
        let document = deserialize(form)?;
        let target = RenderTarget::acquire(&self.live);

        match tokio::time::timeout(
            options.timeout,
            self.render_into(target, &document, options.multiplier),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!("Preview render timed out after {:?}", options.timeout);
                Err(RenderError::Timeout(options.timeout))
            }
        }
    }

    /// Render `form`, falling back to the checkerboard placeholder on any
    /// failure.
    ///
    /// # Errors
    ///
    /// Only fails if the placeholder itself cannot be encoded.
    pub async fn render_preview_or_placeholder(
        &self,
        form: &PortableForm,
        options: &PreviewOptions,
    ) -> RenderResult<PreviewOutcome> {
        match self.render_preview(form, options).await {
            Ok(image) => Ok(PreviewOutcome {
                image,
                status: PreviewStatus::Rendered,
            }),
            Err(e) => {
                if e.is_user_visible() {
                    tracing::warn!("Preview failed, using placeholder: {e}");
                } else {
                    tracing::debug!("Preview failed, using placeholder: {e}");
                }
                let (width, height) = output_size(placeholder_multiplier(options.multiplier));
                Ok(PreviewOutcome {
                    image: RasterImage::placeholder(width, height)?,
                    status: PreviewStatus::Placeholder(e.to_string()),
                })
            }
        }
    }

    async fn render_into(
        &self,
        mut target: RenderTarget,
        document: &SceneDocument,
        multiplier: f64,
    ) -> RenderResult<RasterImage> {
        let sources = asset_sources(document);
        let loads = sources.iter().map(|src| self.resolver.load(src));
        let results = join_all(loads).await;

        for (src, result) in sources.into_iter().zip(results) {
            match result {
                Ok(asset) => {
                    target.assets.insert(src, asset);
                }
                Err(e) => tracing::warn!("Preview asset {src} failed to load: {e}"),
            }
        }

        let svg = document_to_svg(document, &target.assets, multiplier, &self.placeholder);
        drop(target);

        let anti_aliasing = self.anti_aliasing;
        tokio::task::spawn_blocking(move || {
            RasterSurface::new(rasterize_svg(&svg, anti_aliasing)?).to_image()
        })
        .await
        .map_err(|e| RenderError::Export(format!("rasterization task failed: {e}")))?
    }
}

/// Scale for the fallback image; never larger than a real preview.
fn placeholder_multiplier(multiplier: f64) -> f64 {
    if multiplier.is_finite() {
        multiplier.clamp(0.0, MAX_MULTIPLIER)
    } else {
        DEFAULT_MULTIPLIER
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use invite_core::{serialize, CanvasRuntime, ObjectSpec};

    struct NeverResolves;

    #[async_trait]
    impl AssetResolver for NeverResolves {
        async fn fetch(&self, _src: &str) -> RenderResult<Vec<u8>> {
            futures::future::pending().await
        }
    }

    fn form_with_image() -> PortableForm {
        let mut runtime = CanvasRuntime::new();
        runtime.add_object(ObjectSpec::image("https://slow.example/a.png", 100.0, 100.0));
        serialize(runtime.document())
    }

    #[test]
    fn test_default_options() {
        let options = PreviewOptions::default();
        assert!((options.multiplier - 0.5).abs() < f64::EPSILON);
        assert_eq!(options.timeout, Duration::from_secs(5));
        assert_eq!(options.output_size(), (300, 400));
    }

    #[tokio::test]
    async fn test_timeout_disposes_target() {
        let renderer = ThumbnailRenderer::new(Arc::new(NeverResolves));
        let options = PreviewOptions {
            timeout: Duration::from_millis(20),
            ..PreviewOptions::default()
        };
        let result = renderer.render_preview(&form_with_image(), &options).await;
        assert!(matches!(result, Err(RenderError::Timeout(_))));
        assert_eq!(renderer.live_render_targets(), 0);
    }

    #[tokio::test]
    async fn test_timeout_fires_during_rasterization() {
        let mut runtime = CanvasRuntime::new();
        for i in 0..40 {
            let offset = f64::from(i) * 10.0;
            runtime.add_object(
                ObjectSpec::rect(400.0, 400.0)
                    .at(offset, offset)
                    .with_fill(Some("#ff0000")),
            );
        }
        let form = serialize(runtime.document());
        let renderer = ThumbnailRenderer::new(Arc::new(NeverResolves));
        let options = PreviewOptions {
            multiplier: MAX_MULTIPLIER,
            timeout: Duration::from_millis(1),
        };
        // No assets to await: the only suspension point is the raster task.
        let result = renderer.render_preview(&form, &options).await;
        assert!(matches!(result, Err(RenderError::Timeout(_))));
        assert_eq!(renderer.live_render_targets(), 0);
    }

    #[tokio::test]
    async fn test_invalid_multiplier_is_rejected() {
        let renderer = ThumbnailRenderer::new(Arc::new(NeverResolves));
        let options = PreviewOptions {
            multiplier: 0.0,
            ..PreviewOptions::default()
        };
        let result = renderer.render_preview(&form_with_image(), &options).await;
        assert!(matches!(result, Err(RenderError::Export(_))));
        assert_eq!(renderer.live_render_targets(), 0);
    }

    #[tokio::test]
    async fn test_oversized_multiplier_is_rejected() {
        let renderer = ThumbnailRenderer::new(Arc::new(NeverResolves));
        for multiplier in [MAX_MULTIPLIER + 0.5, 1e9, f64::INFINITY, f64::NAN] {
            let options = PreviewOptions {
                multiplier,
                ..PreviewOptions::default()
            };
            let result = renderer.render_preview(&form_with_image(), &options).await;
            assert!(matches!(result, Err(RenderError::Export(_))));
        }

        let options = PreviewOptions {
            multiplier: f64::INFINITY,
            ..PreviewOptions::default()
        };
        let outcome = renderer
            .render_preview_or_placeholder(&form_with_image(), &options)
            .await
            .expect("placeholder");
        assert!(outcome.is_placeholder());
        assert_eq!((outcome.image.width, outcome.image.height), (300, 400));
    }

    #[test]
    fn test_placeholder_multiplier_bounds() {
        assert!((placeholder_multiplier(1e9) - MAX_MULTIPLIER).abs() < f64::EPSILON);
        assert!((placeholder_multiplier(f64::NAN) - DEFAULT_MULTIPLIER).abs() < f64::EPSILON);
        assert!(placeholder_multiplier(-1.0).abs() < f64::EPSILON);
    }
}
