//! Fit-to-canvas preview geometry and scaling.
//!
//! The shell shows the image letterboxed inside a canvas. [`Viewport`] holds
//! the fitted size and offset and converts points between canvas and image
//! pixels; [`scale_for_preview`] produces the downscaled copy the preview is
//! composited on.

use super::compositor::Composite;
use super::position::{ImageDimensions, LayerRect, Point};
use fast_image_resize as fr;
use image::RgbaImage;
use std::num::NonZeroU32;

/// Where the image sits inside the canvas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub canvas: ImageDimensions,
    pub image: ImageDimensions,
    /// Size of the image as displayed.
    pub display: ImageDimensions,
    pub offset_x: i32,
    pub offset_y: i32,
    /// Display size over image size.
    pub ratio: f64,
}

impl Viewport {
    /// Fit `image` inside `canvas` preserving aspect ratio, centered.
    ///
    /// Zero-sized inputs are treated as 1 pixel; the displayed image is at
    /// least 1x1.
    pub fn fit(image: ImageDimensions, canvas: ImageDimensions) -> Self {
        let iw = image.width.max(1) as f64;
        let ih = image.height.max(1) as f64;
        let cw = canvas.width.max(1) as f64;
        let ch = canvas.height.max(1) as f64;

        let ratio = (cw / iw).min(ch / ih);
        let display = ImageDimensions::new(
            ((iw * ratio).floor() as u32).max(1),
            ((ih * ratio).floor() as u32).max(1),
        );

        Self {
            canvas,
            image,
            display,
            offset_x: (canvas.width as i32 - display.width as i32) / 2,
            offset_y: (canvas.height as i32 - display.height as i32) / 2,
            ratio,
        }
    }

    /// The displayed image rectangle in canvas coordinates.
    pub fn display_rect(&self) -> LayerRect {
        LayerRect {
            x: self.offset_x,
            y: self.offset_y,
            width: self.display.width,
            height: self.display.height,
        }
    }

    pub fn canvas_to_image(&self, point: Point) -> Point {
        Point::new(
            (point.x - self.offset_x as f64) / self.ratio,
            (point.y - self.offset_y as f64) / self.ratio,
        )
    }

    pub fn image_to_canvas(&self, point: Point) -> Point {
        Point::new(
            point.x * self.ratio + self.offset_x as f64,
            point.y * self.ratio + self.offset_y as f64,
        )
    }
}

/// A composited preview ready for display.
#[derive(Debug, Clone)]
pub struct PreviewFrame {
    /// The preview raster, `viewport.display` sized.
    pub image: RgbaImage,
    pub viewport: Viewport,
    /// Watermark rectangle in canvas coordinates, if anything was drawn.
    pub layer: Option<LayerRect>,
}

impl PreviewFrame {
    pub(crate) fn new(composite: Composite, viewport: Viewport) -> Self {
        let layer = composite
            .layer
            .map(|rect| rect.translated(viewport.offset_x, viewport.offset_y));
        Self {
            image: composite.image,
            viewport,
            layer,
        }
    }

    /// Whether a canvas point falls on the watermark.
    pub fn hit_test(&self, point: Point) -> bool {
        self.layer.is_some_and(|rect| rect.contains(point))
    }
}

/// Downscale (or upscale) `image` to `target` with a Lanczos3 filter.
pub fn scale_for_preview(image: &RgbaImage, target: ImageDimensions) -> RgbaImage {
    if image.dimensions() == (target.width, target.height) {
        return image.clone();
    }

    match resize_rgba(image, target) {
        Ok(resized) => resized,
        Err(reason) => {
            tracing::warn!(%reason, "fast resize failed, using image::imageops");
            image::imageops::resize(
                image,
                target.width.max(1),
                target.height.max(1),
                image::imageops::FilterType::Lanczos3,
            )
        }
    }
}

fn resize_rgba(image: &RgbaImage, target: ImageDimensions) -> Result<RgbaImage, String> {
    let src_width = NonZeroU32::new(image.width()).ok_or("source width is 0")?;
    let src_height = NonZeroU32::new(image.height()).ok_or("source height is 0")?;
    let dst_width = NonZeroU32::new(target.width).ok_or("target width is 0")?;
    let dst_height = NonZeroU32::new(target.height).ok_or("target height is 0")?;

    let src_image = fr::Image::from_vec_u8(
        src_width,
        src_height,
        image.as_raw().clone(),
        fr::PixelType::U8x4,
    )
    .map_err(|e| format!("failed to create source image: {:?}", e))?;

    let mut dst_image = fr::Image::new(dst_width, dst_height, fr::PixelType::U8x4);

    let mut resizer = fr::Resizer::new(fr::ResizeAlg::Convolution(fr::FilterType::Lanczos3));
    resizer
        .resize(&src_image.view(), &mut dst_image.view_mut())
        .map_err(|e| format!("resize operation failed: {:?}", e))?;

    RgbaImage::from_raw(target.width, target.height, dst_image.into_vec())
        .ok_or_else(|| "failed to create output image buffer".to_string())
}
