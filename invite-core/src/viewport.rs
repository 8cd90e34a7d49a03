//! Fitting the fixed logical canvas into an arbitrary container.
//!
//! The transform is presentation only. Nothing here touches a document:
//! callers convert pointer positions with [`ViewportTransform::to_logical`]
//! before handing them to the runtime.

use crate::document::{LOGICAL_HEIGHT, LOGICAL_WIDTH};

/// Smallest scale ever produced, so the transform stays invertible when the
/// container is smaller than the padding.
pub const MIN_SCALE: f64 = 0.01;

/// Viewport settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportConfig {
    /// Total margin subtracted from each container dimension.
    pub padding: f64,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self { padding: 40.0 }
    }
}

/// Scale for an available area: `min(w / 600, h / 800, 1)`.
#[must_use]
pub fn scale_for(available_width: f64, available_height: f64) -> f64 {
    (available_width / LOGICAL_WIDTH)
        .min(available_height / LOGICAL_HEIGHT)
        .min(1.0)
        .max(MIN_SCALE)
}

/// Uniform scale plus centring offset from logical units to container pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportTransform {
    /// Uniform scale, never above 1.
    pub scale: f64,
    /// Left edge of the displayed canvas inside the container.
    pub offset_x: f64,
    /// Top edge of the displayed canvas inside the container.
    pub offset_y: f64,
    /// Displayed canvas width in whole pixels.
    pub display_width: u32,
    /// Displayed canvas height in whole pixels.
    pub display_height: u32,
}

impl Default for ViewportTransform {
    fn default() -> Self {
        Self::identity()
    }
}

impl ViewportTransform {
    /// 1:1 transform with no offset.
    #[must_use]
    pub fn identity() -> Self {
        Self {
            scale: 1.0,
            offset_x: 0.0,
            offset_y: 0.0,
            display_width: 600,
            display_height: 800,
        }
    }

    /// Fit the canvas into a `container_width` x `container_height` container.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn fit(container_width: f64, container_height: f64, config: &ViewportConfig) -> Self {
        let scale = scale_for(
            container_width - config.padding,
            container_height - config.padding,
        );
        let width = (LOGICAL_WIDTH * scale).round();
        let height = (LOGICAL_HEIGHT * scale).round();
        Self {
            scale,
            offset_x: ((container_width - width) / 2.0).max(0.0),
            offset_y: ((container_height - height) / 2.0).max(0.0),
            display_width: width as u32,
            display_height: height as u32,
        }
    }

    /// Container pixels to logical units.
    #[must_use]
    pub fn to_logical(&self, x: f64, y: f64) -> (f64, f64) {
        ((x - self.offset_x) / self.scale, (y - self.offset_y) / self.scale)
    }

    /// Logical units to container pixels.
    #[must_use]
    pub fn to_screen(&self, x: f64, y: f64) -> (f64, f64) {
        (x * self.scale + self.offset_x, y * self.scale + self.offset_y)
    }
}
