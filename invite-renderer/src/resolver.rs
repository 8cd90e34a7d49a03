//! Fetching the bytes behind an asset reference.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use url::Url;

use crate::asset::{decode_asset, parse_data_uri, LoadedAsset};
use crate::error::{RenderError, RenderResult};

/// Source of asset bytes for image references in a document.
#[async_trait]
pub trait AssetResolver: Send + Sync {
    /// Fetch the raw bytes for `src`.
    async fn fetch(&self, src: &str) -> RenderResult<Vec<u8>>;

    /// Fetch and decode `src`.
    async fn load(&self, src: &str) -> RenderResult<LoadedAsset> {
        let bytes = self.fetch(src).await?;
        decode_asset(&bytes)
    }
}

/// Resolves `data:` URIs, local paths under an asset directory, `file:` URLs
/// and (with the `http` feature) `http(s):` URLs.
#[derive(Debug, Clone, Default)]
pub struct DefaultResolver {
    asset_dir: Option<PathBuf>,
    #[cfg(feature = "http")]
    client: reqwest::Client,
}

impl DefaultResolver {
    /// Resolver without an asset directory; relative paths fail.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve relative references against `dir`.
    #[must_use]
    pub fn with_asset_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.asset_dir = Some(dir.into());
        self
    }

    fn local_path(&self, src: &str) -> RenderResult<PathBuf> {
        let dir = self.asset_dir.as_ref().ok_or_else(|| {
            RenderError::ResourceLoad(format!("no asset directory for relative reference {src}"))
        })?;
        let relative = Path::new(src.trim_start_matches('/'));
        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
        {
            return Err(RenderError::ResourceLoad(format!(
                "asset reference escapes the asset directory: {src}"
            )));
        }
        Ok(dir.join(relative))
    }

    #[cfg(feature = "http")]
    async fn fetch_http(&self, url: Url) -> RenderResult<Vec<u8>> {
        let response = self.client.get(url).send().await?.error_for_status()?;
        Ok(response.bytes().await?.to_vec())
    }

    #[cfg(not(feature = "http"))]
    #[allow(clippy::unused_async)]
    async fn fetch_http(&self, url: Url) -> RenderResult<Vec<u8>> {
        Err(RenderError::ResourceLoad(format!(
            "remote assets need the http feature: {url}"
        )))
    }
}

#[async_trait]
impl AssetResolver for DefaultResolver {
    async fn fetch(&self, src: &str) -> RenderResult<Vec<u8>> {
        if src.starts_with("data:") {
            return parse_data_uri(src).map(|(_, bytes)| bytes);
        }

        match Url::parse(src) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {
                tracing::debug!("Fetching remote asset {url}");
                self.fetch_http(url).await
            }
            Ok(url) if url.scheme() == "file" => {
                let path = url
                    .to_file_path()
                    .map_err(|()| RenderError::ResourceLoad(format!("bad file URL {src}")))?;
                Ok(tokio::fs::read(path).await?)
            }
            Ok(url) => Err(RenderError::ResourceLoad(format!(
                "unsupported asset scheme {}",
                url.scheme()
            ))),
            Err(url::ParseError::RelativeUrlWithoutBase) => {
                let path = self.local_path(src)?;
                tracing::debug!("Reading local asset {}", path.display());
                Ok(tokio::fs::read(path).await?)
            }
            Err(e) => Err(RenderError::ResourceLoad(format!(
                "invalid asset reference {src}: {e}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::tests::RED_PIXEL_PNG;

    #[tokio::test]
    async fn test_data_uri_needs_no_io() {
        let resolver = DefaultResolver::new();
        let asset = resolver
            .load(&format!("data:image/png;base64,{RED_PIXEL_PNG}"))
            .await
            .expect("load");
        assert_eq!((asset.width, asset.height), (1, 1));
    }

    #[tokio::test]
    async fn test_relative_path_requires_dir_and_stays_inside() {
        let resolver = DefaultResolver::new();
        assert!(resolver.fetch("stickers/heart.png").await.is_err());

        let resolver = DefaultResolver::new().with_asset_dir("/srv/assets");
        assert!(matches!(
            resolver.fetch("../secrets.png").await,
            Err(RenderError::ResourceLoad(_))
        ));
    }

    #[tokio::test]
    async fn test_reads_from_asset_dir_and_file_url() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::create_dir(dir.path().join("stickers")).expect("mkdir");
        let path = dir.path().join("stickers/dot.svg");
        std::fs::write(
            &path,
            "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"8\" height=\"6\"/>",
        )
        .expect("write");

        let resolver = DefaultResolver::new().with_asset_dir(dir.path());
        let asset = resolver.load("stickers/dot.svg").await.expect("load");
        assert_eq!((asset.width, asset.height), (8, 6));

        let url = Url::from_file_path(&path).expect("file url");
        let bytes = DefaultResolver::new()
            .fetch(url.as_str())
            .await
            .expect("fetch");
        assert!(bytes.starts_with(b"<svg"));
    }

    #[tokio::test]
    async fn test_unsupported_scheme() {
        let resolver = DefaultResolver::new();
        assert!(resolver.fetch("ftp://example.com/a.png").await.is_err());
    }
}
