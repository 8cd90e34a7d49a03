//! # Invite Renderer
//!
//! Rasterizes invitation documents through an SVG intermediate.
//!
//! ## Pipeline
//!
//! ```text
//! ┌───────────────┐   ┌─────────────┐   ┌──────────────┐   ┌───────────┐
//! │ SceneDocument │──▶│ SVG writer  │──▶│ resvg/usvg   │──▶│ tiny-skia │
//! │               │   │ (svg.rs)    │   │ (raster.rs)  │   │ pixmap    │
//! └───────────────┘   └─────────────┘   └──────────────┘   └───────────┘
//!         ▲                  ▲
//!         │                  │ decoded assets
//!   PortableForm      AssetCache (live) / per-target table (preview)
//! ```
//!
//! The live [`Renderer`] draws only assets already in its cache, so a frame
//! never waits on I/O; call [`Renderer::preload`] after loading a document.
//! The [`ThumbnailRenderer`] works from the portable form in an isolated
//! render target under a timeout.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod asset;
pub mod cache;
pub mod error;
pub mod raster;
pub mod resolver;
pub mod svg;
pub mod thumbnail;

use std::fmt;
use std::sync::Arc;

use futures::future::join_all;
use invite_core::SceneDocument;

pub use asset::{AssetFormat, LoadedAsset};
pub use cache::{AssetCache, AssetCacheConfig, CacheStats};
pub use error::{RenderError, RenderResult};
pub use raster::{RasterImage, RasterSurface};
pub use resolver::{AssetResolver, DefaultResolver};
pub use svg::{document_to_svg, PlaceholderStyle};
pub use thumbnail::{
    PreviewOptions, PreviewOutcome, PreviewStatus, ThumbnailRenderer, MAX_MULTIPLIER,
};

/// Configuration for the renderer.
#[derive(Debug, Clone)]
pub struct RendererConfig {
    /// Output scale of live frames relative to the logical canvas.
    pub scale: f64,
    /// Enable anti-aliasing.
    pub anti_aliasing: bool,
    /// Colours of the box drawn for missing assets.
    pub placeholder: PlaceholderStyle,
    /// Limits for the live asset cache.
    pub asset_cache: AssetCacheConfig,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            scale: 1.0,
            anti_aliasing: true,
            placeholder: PlaceholderStyle::default(),
            asset_cache: AssetCacheConfig::default(),
        }
    }
}

/// The live canvas renderer.
pub struct Renderer {
    config: RendererConfig,
    cache: AssetCache,
    resolver: Arc<dyn AssetResolver>,
    frame_count: u64,
}

impl fmt::Debug for Renderer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Renderer")
            .field("config", &self.config)
            .field("cache", &self.cache)
            .field("frame_count", &self.frame_count)
            .finish_non_exhaustive()
    }
}

impl Renderer {
    /// Create a renderer using the [`DefaultResolver`].
    #[must_use]
    pub fn new(config: RendererConfig) -> Self {
        Self::with_resolver(config, Arc::new(DefaultResolver::new()))
    }

    /// Create a renderer fetching assets through `resolver`.
    #[must_use]
    pub fn with_resolver(config: RendererConfig, resolver: Arc<dyn AssetResolver>) -> Self {
        let cache = AssetCache::with_config(config.asset_cache.clone());
        Self {
            config,
            cache,
            resolver,
            frame_count: 0,
        }
    }

    /// Render a frame of `document`.
    ///
    /// Every asset the frame draws counts as used, so assets on screen do not
    /// age out of the cache.
    ///
    /// # Errors
    ///
    /// Returns an error if rasterization fails.
    pub fn render(&mut self, document: &SceneDocument) -> RenderResult<RasterSurface> {
        for src in svg::asset_sources(document) {
            self.cache.touch(&src);
        }
        let svg = document_to_svg(
            document,
            &self.cache,
            self.config.scale,
            &self.config.placeholder,
        );
        let pixmap = raster::rasterize_svg(&svg, self.config.anti_aliasing)?;
        self.frame_count += 1;
        tracing::trace!("Rendered frame {}", self.frame_count);
        Ok(RasterSurface::new(pixmap))
    }

    /// Fetch every asset `document` references that is not cached yet.
    ///
    /// Returns the sources that failed along with their errors; those keep
    /// rendering as placeholders.
    pub async fn preload(&mut self, document: &SceneDocument) -> Vec<(String, RenderError)> {
        let missing: Vec<String> = svg::asset_sources(document)
            .into_iter()
            .filter(|src| !self.cache.contains(src))
            .collect();
        if missing.is_empty() {
            return Vec::new();
        }
        tracing::debug!("Preloading {} assets", missing.len());

        let resolver = Arc::clone(&self.resolver);
        let results = join_all(missing.iter().map(|src| resolver.load(src))).await;

        let mut failures = Vec::new();
        for (src, result) in missing.into_iter().zip(results) {
            match result {
                Ok(asset) => self.cache.insert(src, asset),
                Err(e) => {
                    tracing::warn!("Asset {src} failed to load: {e}");
                    failures.push((src, e));
                }
            }
        }
        failures
    }

    /// A preview renderer sharing this renderer's resolver and style.
    #[must_use]
    pub fn thumbnails(&self) -> ThumbnailRenderer {
        ThumbnailRenderer::new(Arc::clone(&self.resolver))
            .with_style(self.config.anti_aliasing, self.config.placeholder.clone())
    }

    /// The live asset cache.
    #[must_use]
    pub fn cache(&self) -> &AssetCache {
        &self.cache
    }

    /// Mutable access to the live asset cache.
    pub fn cache_mut(&mut self) -> &mut AssetCache {
        &mut self.cache
    }

    /// Number of frames rendered.
    #[must_use]
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Get the renderer configuration.
    #[must_use]
    pub fn config(&self) -> &RendererConfig {
        &self.config
    }
}

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
