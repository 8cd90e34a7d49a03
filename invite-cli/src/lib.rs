//! # Invite CLI
//!
//! Command implementations behind the `invite-cli` binary. Kept in a library
//! so they can be driven from tests without spawning a process.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use invite_core::{deserialize_str, PortableForm, SceneDocument};
use invite_renderer::{
    DefaultResolver, PreviewOptions, PreviewOutcome, ThumbnailRenderer, MAX_MULTIPLIER,
};

/// Summary of a valid document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationReport {
    /// Number of top-level objects.
    pub object_count: usize,
    /// Top-level object count per kind tag.
    pub kinds: BTreeMap<&'static str, usize>,
}

impl ValidationReport {
    /// Summarize `document`.
    #[must_use]
    pub fn from_document(document: &SceneDocument) -> Self {
        let mut kinds = BTreeMap::new();
        for object in document.objects() {
            *kinds.entry(object.kind.tag()).or_insert(0) += 1;
        }
        Self {
            object_count: document.len(),
            kinds,
        }
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} objects", self.object_count)?;
        for (i, (kind, count)) in self.kinds.iter().enumerate() {
            let sep = if i == 0 { ": " } else { ", " };
            write!(f, "{sep}{count} {kind}")?;
        }
        Ok(())
    }
}

/// Read and deserialize the document at `path`.
///
/// # Errors
///
/// Fails if the file cannot be read or is not a well-formed document.
pub fn validate(path: &Path) -> anyhow::Result<ValidationReport> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let document =
        deserialize_str(&json).with_context(|| format!("invalid document {}", path.display()))?;
    tracing::debug!("Validated {} ({} objects)", path.display(), document.len());
    Ok(ValidationReport::from_document(&document))
}

/// Parse a `--multiplier` value: a number in `(0, MAX_MULTIPLIER]`.
///
/// # Errors
///
/// Returns a message for clap to print when the value is not a number or is
/// out of range.
pub fn parse_multiplier(value: &str) -> Result<f64, String> {
    let multiplier: f64 = value
        .trim()
        .parse()
        .map_err(|e| format!("not a number: {e}"))?;
    if multiplier > 0.0 && multiplier <= MAX_MULTIPLIER {
        Ok(multiplier)
    } else {
        Err(format!("must be greater than 0 and at most {MAX_MULTIPLIER}"))
    }
}

/// Options for [`thumbnail`].
#[derive(Debug, Clone, Default)]
pub struct ThumbnailArgs {
    /// Preview scale and timeout.
    pub preview: PreviewOptions,
    /// Directory relative asset references resolve against.
    pub asset_dir: Option<PathBuf>,
}

/// Render a preview of the document at `input` and write it to `output` as
/// PNG. When rendering fails the placeholder image is written instead.
///
/// # Errors
///
/// Fails only if the input cannot be read or the output cannot be written.
pub async fn thumbnail(
    input: &Path,
    output: &Path,
    args: &ThumbnailArgs,
) -> anyhow::Result<PreviewOutcome> {
    let json = tokio::fs::read_to_string(input)
        .await
        .with_context(|| format!("failed to read {}", input.display()))?;
    let form: PortableForm = serde_json::from_str(&json).unwrap_or_else(|e| {
        tracing::warn!("{} is not JSON: {e}", input.display());
        PortableForm::Null
    });

    let mut resolver = DefaultResolver::new();
    if let Some(dir) = &args.asset_dir {
        resolver = resolver.with_asset_dir(dir);
    }
    let renderer = ThumbnailRenderer::new(Arc::new(resolver));

    let outcome = renderer
        .render_preview_or_placeholder(&form, &args.preview)
        .await
        .context("failed to produce a preview image")?;
    if outcome.is_placeholder() {
        tracing::warn!("Wrote placeholder for {}", input.display());
    }

    tokio::fs::write(output, &outcome.image.png)
        .await
        .with_context(|| format!("failed to write {}", output.display()))?;
    tracing::info!(
        "Wrote {}x{} preview to {}",
        outcome.image.width,
        outcome.image.height,
        output.display()
    );
    Ok(outcome)
}
