//! Placement geometry for the watermark layer.
//!
//! Everything here works in the pixel space of whatever container it is given,
//! so the same calls serve the full-resolution image and a scaled preview.
//!
//! # Example
//!
//! ```
//! use markit::watermark::position::{paste_origin, resolve_center, ImageDimensions, Padding, WatermarkDimensions};
//! use markit::watermark::{Anchor, Position};
//!
//! let image = ImageDimensions::new(800, 600);
//! let layer = WatermarkDimensions::new(100, 50);
//! let padding = Padding::default().for_container(&image);
//!
//! let center = resolve_center(&Position::Anchor(Anchor::BottomRight), &image, &layer, padding);
//! assert_eq!((center.x, center.y), (738.0, 563.0)); // 800 - 12 - 50, 600 - 12 - 25
//!
//! let origin = paste_origin(center, &image, &layer);
//! assert_eq!((origin.x, origin.y), (688, 538));
//! ```

use super::{Anchor, Position};
use serde::{Deserialize, Serialize};

/// Dimensions of the container (full image or preview).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageDimensions {
    pub width: u32,
    pub height: u32,
}

impl ImageDimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn of(image: &image::RgbaImage) -> Self {
        Self::new(image.width(), image.height())
    }
}

/// Dimensions of the rendered watermark layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WatermarkDimensions {
    pub width: u32,
    pub height: u32,
}

impl WatermarkDimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Top-left pixel where the layer is pasted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlacementPosition {
    pub x: i32,
    pub y: i32,
}

impl PlacementPosition {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned rectangle occupied by a pasted layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayerRect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl LayerRect {
    pub fn new(origin: PlacementPosition, size: WatermarkDimensions) -> Self {
        Self {
            x: origin.x,
            y: origin.y,
            width: size.width,
            height: size.height,
        }
    }

    pub fn center(&self) -> Point {
        Point::new(
            self.x as f64 + self.width as f64 / 2.0,
            self.y as f64 + self.height as f64 / 2.0,
        )
    }

    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.x as f64
            && point.y >= self.y as f64
            && point.x < self.x as f64 + self.width as f64
            && point.y < self.y as f64 + self.height as f64
    }

    /// The same rectangle shifted by `(dx, dy)`.
    pub fn translated(&self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            ..*self
        }
    }

    pub fn size(&self) -> WatermarkDimensions {
        WatermarkDimensions::new(self.width, self.height)
    }
}

/// A point in container pixel space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

fn default_min_px() -> f64 {
    8.0
}

fn default_fraction() -> f64 {
    0.02
}

/// Edge padding rule: `max(min_px, fraction * min(width, height))`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Padding {
    #[serde(default = "default_min_px")]
    pub min_px: f64,

    #[serde(default = "default_fraction")]
    pub fraction: f64,
}

impl Default for Padding {
    fn default() -> Self {
        Self {
            min_px: default_min_px(),
            fraction: default_fraction(),
        }
    }
}

impl Padding {
    /// Padding in pixels for a container of the given size.
    pub fn for_container(&self, container: &ImageDimensions) -> f64 {
        let shorter = container.width.min(container.height) as f64;
        self.min_px.max(self.fraction * shorter)
    }

    /// Padding for a container drawn at `scale` times the size of the image it
    /// stands for. The pixel floor scales with it, so a preview keeps the same
    /// proportions as the full-resolution image.
    pub fn for_scaled_container(&self, container: &ImageDimensions, scale: f64) -> f64 {
        let shorter = container.width.min(container.height) as f64;
        (self.min_px * scale).max(self.fraction * shorter)
    }
}

/// Clamp a layer center so the layer's box stays inside the container.
///
/// An axis where the layer is larger than the container collapses to the
/// container's midpoint.
pub fn clamp_center(
    center: Point,
    container: &ImageDimensions,
    layer: &WatermarkDimensions,
) -> Point {
    let clamp_axis = |value: f64, extent: f64, size: f64| {
        let half = size / 2.0;
        if size >= extent {
            extent / 2.0
        } else {
            value.clamp(half, extent - half)
        }
    };

    Point::new(
        clamp_axis(center.x, container.width as f64, layer.width as f64),
        clamp_axis(center.y, container.height as f64, layer.height as f64),
    )
}

/// Compute the layer center for a position.
///
/// Anchors keep `padding` between the layer and the container edges and are
/// clamped so the layer never leaves the container. Custom points map their
/// fractions straight onto the container; non-finite fractions resolve as
/// `center`.
pub fn resolve_center(
    position: &Position,
    container: &ImageDimensions,
    layer: &WatermarkDimensions,
    padding: f64,
) -> Point {
    let (w, h) = (container.width as f64, container.height as f64);

    match *position {
        Position::Anchor(anchor) => {
            let (align_x, align_y) = anchor.alignment();
            let axis = |align: i8, extent: f64, size: f64| match align {
                -1 => padding + size / 2.0,
                1 => extent - padding - size / 2.0,
                _ => extent / 2.0,
            };
            let center = Point::new(
                axis(align_x, w, layer.width as f64),
                axis(align_y, h, layer.height as f64),
            );
            clamp_center(center, container, layer)
        }
        Position::Custom { u, v } if u.is_finite() && v.is_finite() => {
            Point::new(u.clamp(0.0, 1.0) * w, v.clamp(0.0, 1.0) * h)
        }
        Position::Custom { .. } => {
            tracing::debug!("non-finite custom position, using center");
            resolve_center(&Position::Anchor(Anchor::Center), container, layer, padding)
        }
    }
}

/// Convert a center back to container fractions, clamped to `[0, 1]`.
///
/// Zero-sized container axes are treated as 1 pixel.
pub fn to_normalized(center: Point, container: &ImageDimensions) -> (f64, f64) {
    let w = container.width.max(1) as f64;
    let h = container.height.max(1) as f64;
    (
        (center.x / w).clamp(0.0, 1.0),
        (center.y / h).clamp(0.0, 1.0),
    )
}

/// Top-left paste coordinate for a layer centered at `center`.
///
/// The result keeps the layer inside the container; when the layer is larger
/// than the container on an axis the coordinate on that axis is 0.
pub fn paste_origin(
    center: Point,
    container: &ImageDimensions,
    layer: &WatermarkDimensions,
) -> PlacementPosition {
    let axis = |value: f64, extent: u32, size: u32| {
        let max = extent.saturating_sub(size) as f64;
        (value - size as f64 / 2.0).round().clamp(0.0, max) as i32
    };

    PlacementPosition::new(
        axis(center.x, container.width, layer.width),
        axis(center.y, container.height, layer.height),
    )
}
