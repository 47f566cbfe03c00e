//! Watermark compositing.
//!
//! One path serves both preview and bake: render the text layer at
//! `size_pt * scale`, resolve its center in the container's own pixel space,
//! clamp the paste origin into the container and blend with the "over"
//! operator. The preview calls it on a downscaled copy with the preview ratio
//! as `scale`; the bake calls it on the original with `scale = 1`. Every pixel
//! floor (edge padding, layer margin) is multiplied by `scale` too, so the
//! preview is the bake in miniature. The bake is never derived from the
//! preview raster.

use super::font::FontRegistry;
use super::position::{
    paste_origin, resolve_center, ImageDimensions, LayerRect, Padding, PlacementPosition,
};
use super::text_renderer::{render_text, TextRenderOptions};
use super::WatermarkSettings;
use image::{Rgba, RgbaImage};

/// A rendered layer and where it goes on the target.
#[derive(Clone)]
pub struct WatermarkLayer {
    pub image: RgbaImage,
    pub position: PlacementPosition,
}

impl WatermarkLayer {
    pub fn rect(&self) -> LayerRect {
        LayerRect {
            x: self.position.x,
            y: self.position.y,
            width: self.image.width(),
            height: self.image.height(),
        }
    }
}

impl std::fmt::Debug for WatermarkLayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatermarkLayer")
            .field("dimensions", &self.image.dimensions())
            .field("position", &self.position)
            .finish()
    }
}

/// Output of a composite: the new image and the rectangle the layer covers.
#[derive(Debug, Clone)]
pub struct Composite {
    pub image: RgbaImage,
    /// `None` when there was nothing to draw.
    pub layer: Option<LayerRect>,
}

/// Renders and blends the text layer described by a [`WatermarkSettings`].
pub struct Compositor<'a> {
    fonts: &'a FontRegistry,
    padding: Padding,
}

impl<'a> Compositor<'a> {
    pub fn new(fonts: &'a FontRegistry, padding: Padding) -> Self {
        Self { fonts, padding }
    }

    /// Full-resolution composite. `base` is left untouched.
    pub fn composite(&self, base: &RgbaImage, settings: &WatermarkSettings) -> RgbaImage {
        self.composite_scaled(base, settings, 1.0).image
    }

    /// Composite with the font size multiplied by `scale`.
    pub fn composite_scaled(
        &self,
        base: &RgbaImage,
        settings: &WatermarkSettings,
        scale: f64,
    ) -> Composite {
        let mut image = base.clone();
        let layer = self.place_layer(ImageDimensions::of(base), settings, scale);

        let rect = layer.as_ref().map(|layer| {
            blend_layer(&mut image, layer);
            layer.rect()
        });

        Composite { image, layer: rect }
    }

    /// Render the layer and compute its paste position inside `container`,
    /// without touching any pixels of the target.
    pub fn place_layer(
        &self,
        container: ImageDimensions,
        settings: &WatermarkSettings,
        scale: f64,
    ) -> Option<WatermarkLayer> {
        if settings.text.is_empty() {
            return None;
        }

        let face = self.fonts.lookup(&settings.font_id);
        let options = TextRenderOptions::from_settings(settings, scale);
        let rendered = render_text(&options, &face);
        if rendered.is_empty() {
            return None;
        }

        let size = rendered.dimensions();
        let padding = self.padding.for_scaled_container(&container, scale);
        let center = resolve_center(&settings.position, &container, &size, padding);
        let position = paste_origin(center, &container, &size);

        tracing::debug!(
            container_width = container.width,
            container_height = container.height,
            layer_width = size.width,
            layer_height = size.height,
            x = position.x,
            y = position.y,
            scale,
            "watermark layer placed"
        );

        Some(WatermarkLayer {
            image: rendered.into_image(),
            position,
        })
    }
}

/// Blend a layer onto the target, clipping to the target bounds.
pub fn blend_layer(target: &mut RgbaImage, layer: &WatermarkLayer) {
    let target_width = target.width() as i64;
    let target_height = target.height() as i64;

    let x = layer.position.x as i64;
    let y = layer.position.y as i64;

    let x_start = x.max(0);
    let y_start = y.max(0);
    let x_end = (x + layer.image.width() as i64).min(target_width);
    let y_end = (y + layer.image.height() as i64).min(target_height);

    for ty in y_start..y_end {
        for tx in x_start..x_end {
            let fg = *layer.image.get_pixel((tx - x) as u32, (ty - y) as u32);
            let bg = target.get_pixel_mut(tx as u32, ty as u32);
            *bg = blend_pixels(*bg, fg);
        }
    }
}

/// Porter-Duff "over". With an opaque background this is
/// `out = fg * a + bg * (1 - a)` per channel.
fn blend_pixels(background: Rgba<u8>, foreground: Rgba<u8>) -> Rgba<u8> {
    match foreground[3] {
        0 => return background,
        255 => return foreground,
        _ => {}
    }

    let fg_alpha = foreground[3] as f32 / 255.0;
    let bg_alpha = background[3] as f32 / 255.0;
    let out_alpha = fg_alpha + bg_alpha * (1.0 - fg_alpha);

    let blend = |fg: u8, bg: u8| -> u8 {
        let fg = fg as f32 / 255.0;
        let bg = bg as f32 / 255.0;
        let result = (fg * fg_alpha + bg * bg_alpha * (1.0 - fg_alpha)) / out_alpha;
        (result * 255.0).round().clamp(0.0, 255.0) as u8
    };

    Rgba([
        blend(foreground[0], background[0]),
        blend(foreground[1], background[1]),
        blend(foreground[2], background[2]),
        (out_alpha * 255.0).round().clamp(0.0, 255.0) as u8,
    ])
}
