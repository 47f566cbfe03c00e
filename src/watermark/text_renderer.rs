//! Text layer rendering.
//!
//! Turns the watermark text into a transparent RGBA layer that the compositor
//! pastes onto the image:
//!
//! 1. rasterize the glyph run and crop it to the inked pixels,
//! 2. surround the ink with a transparent margin of
//!    `max(10, max(ink_w, ink_h) / 5)` pixels so rotation has room,
//! 3. fill with the text color, opacity multiplied into the coverage alpha,
//! 4. rotate about the layer center (counter-clockwise for positive angles),
//!    growing the layer to fit, with bilinear resampling.
//!
//! Layers are rebuilt on every call; nothing is cached between renders.

use super::font::FontFace;
use super::position::WatermarkDimensions;
use super::WatermarkSettings;
use ab_glyph::{point, Font, FontArc, GlyphId, PxScale, Rect, ScaleFont};
use font8x8::{UnicodeFonts, BASIC_FONTS};
use image::{Rgba, RgbaImage};

/// Smallest transparent margin around the ink, in full-resolution pixels.
pub const MIN_LAYER_PADDING: u32 = 10;

/// Largest point size that is actually rendered; bigger sizes are capped.
pub const MAX_RENDER_SIZE_PT: u32 = 1000;

/// Glyph rasters above this many pixels are not rendered.
const MAX_INK_PIXELS: u64 = 1 << 26;

/// Options for text rendering.
#[derive(Debug, Clone)]
pub struct TextRenderOptions<'a> {
    /// The text to render.
    pub text: &'a str,
    /// Font size in pixels.
    pub font_size: f32,
    /// Text color with opacity as alpha.
    pub fill: Rgba<u8>,
    /// Counter-clockwise rotation in degrees.
    pub rotation_degrees: i32,
    /// Size of the target relative to the full-resolution image. Pixel floors
    /// such as the minimum margin are multiplied by it.
    pub scale: f32,
}

impl<'a> TextRenderOptions<'a> {
    /// Options for `settings` with the font size multiplied by `scale`.
    pub fn from_settings(settings: &'a WatermarkSettings, scale: f64) -> Self {
        let size_pt = settings.size_pt.min(MAX_RENDER_SIZE_PT);
        let font_size = (size_pt as f64 * scale).max(1.0) as f32;
        Self {
            text: &settings.text,
            font_size,
            fill: settings.fill(),
            rotation_degrees: settings.angle_deg,
            scale: scale as f32,
        }
    }
}

/// A rendered, padded and possibly rotated text layer.
#[derive(Debug, Clone)]
pub struct RenderedTextLayer {
    image: RgbaImage,
}

impl RenderedTextLayer {
    fn empty() -> Self {
        Self {
            image: RgbaImage::new(0, 0),
        }
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn into_image(self) -> RgbaImage {
        self.image
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn dimensions(&self) -> WatermarkDimensions {
        WatermarkDimensions::new(self.width(), self.height())
    }

    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }
}

/// Transparent margin for an ink box of the given size on a target drawn at
/// `scale`.
pub fn layer_padding(ink_width: u32, ink_height: u32, scale: f32) -> u32 {
    let floor = (MIN_LAYER_PADDING as f32 * scale).round() as u32;
    (ink_width.max(ink_height) / 5).max(floor)
}

/// Tight ink size of `text` in pixels, `(0, 0)` when nothing is inked.
pub fn measure_text(text: &str, face: &FontFace, font_size: f32) -> (u32, u32) {
    let ink = rasterize(text, face, font_size);
    (ink.width, ink.height)
}

/// Render text to a transparent RGBA layer.
///
/// Empty or whitespace-only text gives an empty (0x0) layer. Rendering never
/// fails; the registry has already substituted a face for missing fonts.
pub fn render_text(options: &TextRenderOptions<'_>, face: &FontFace) -> RenderedTextLayer {
    if options.text.is_empty() {
        return RenderedTextLayer::empty();
    }

    let ink = rasterize(options.text, face, options.font_size);
    if ink.is_empty() {
        return RenderedTextLayer::empty();
    }

    let pad = layer_padding(ink.width, ink.height, options.scale);
    let Rgba([r, g, b, opacity]) = options.fill;
    let mut image = RgbaImage::from_pixel(
        ink.width + 2 * pad,
        ink.height + 2 * pad,
        Rgba([r, g, b, 0]),
    );

    for y in 0..ink.height {
        for x in 0..ink.width {
            let coverage = ink.get(x, y);
            if coverage <= 0.0 {
                continue;
            }
            let alpha = (coverage.min(1.0) * opacity as f32).round() as u8;
            image.put_pixel(pad + x, pad + y, Rgba([r, g, b, alpha]));
        }
    }

    let angle = options.rotation_degrees.rem_euclid(360);
    if angle != 0 {
        image = rotate_image(&image, angle as f32);
    }

    RenderedTextLayer { image }
}

/// Per-pixel glyph coverage in `[0, 1]`.
struct Coverage {
    width: u32,
    height: u32,
    values: Vec<f32>,
}

impl Coverage {
    fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            values: vec![0.0; width as usize * height as usize],
        }
    }

    /// A blank raster, or an empty one when the size is over budget.
    fn with_budget(width: u64, height: u64) -> Self {
        if width.saturating_mul(height) > MAX_INK_PIXELS {
            tracing::warn!(width, height, "text raster too large, nothing rendered");
            return Self::new(0, 0);
        }
        // Both sides fit in u32 once the product is within budget.
        Self::new(width as u32, height as u32)
    }

    fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    fn get(&self, x: u32, y: u32) -> f32 {
        self.values[y as usize * self.width as usize + x as usize]
    }

    fn add(&mut self, x: i64, y: i64, coverage: f32) {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return;
        }
        let idx = y as usize * self.width as usize + x as usize;
        self.values[idx] = self.values[idx].max(coverage);
    }

    /// Shrink to the smallest box containing every inked pixel.
    fn crop_to_ink(self) -> Self {
        let mut min = (u32::MAX, u32::MAX);
        let mut max = (0u32, 0u32);
        let mut inked = false;

        for y in 0..self.height {
            for x in 0..self.width {
                if self.get(x, y) > 0.0 {
                    inked = true;
                    min = (min.0.min(x), min.1.min(y));
                    max = (max.0.max(x), max.1.max(y));
                }
            }
        }

        if !inked {
            return Self::new(0, 0);
        }

        let mut cropped = Self::new(max.0 - min.0 + 1, max.1 - min.1 + 1);
        for y in 0..cropped.height {
            for x in 0..cropped.width {
                let value = self.get(min.0 + x, min.1 + y);
                cropped.add(x as i64, y as i64, value);
            }
        }
        cropped
    }
}

fn rasterize(text: &str, face: &FontFace, font_size: f32) -> Coverage {
    match face {
        FontFace::Outline(font) => rasterize_outline(text, font, font_size),
        FontFace::Builtin => rasterize_builtin(text, font_size),
    }
    .crop_to_ink()
}

fn rasterize_outline(text: &str, font: &FontArc, font_size: f32) -> Coverage {
    let scale = PxScale::from(font_size);
    let scaled_font = font.as_scaled(scale);

    let mut outlined = Vec::new();
    let mut cursor_x = 0.0f32;
    let mut prev_glyph: Option<GlyphId> = None;

    for c in text.chars().filter(|c| !c.is_control()) {
        let glyph_id = scaled_font.glyph_id(c);

        if let Some(prev) = prev_glyph {
            cursor_x += scaled_font.kern(prev, glyph_id);
        }

        let glyph = glyph_id.with_scale_and_position(scale, point(cursor_x, scaled_font.ascent()));
        if let Some(glyph) = font.outline_glyph(glyph) {
            outlined.push(glyph);
        }

        cursor_x += scaled_font.h_advance(glyph_id);
        prev_glyph = Some(glyph_id);
    }

    let bounds = outlined
        .iter()
        .map(|glyph| glyph.px_bounds())
        .reduce(|a, b| Rect {
            min: point(a.min.x.min(b.min.x), a.min.y.min(b.min.y)),
            max: point(a.max.x.max(b.max.x), a.max.y.max(b.max.y)),
        });
    let Some(bounds) = bounds else {
        return Coverage::new(0, 0);
    };

    let mut coverage = Coverage::with_budget(
        (bounds.max.x - bounds.min.x).ceil() as u64,
        (bounds.max.y - bounds.min.y).ceil() as u64,
    );
    if coverage.is_empty() {
        return coverage;
    }
    for glyph in &outlined {
        let glyph_bounds = glyph.px_bounds();
        let ox = (glyph_bounds.min.x - bounds.min.x).round() as i64;
        let oy = (glyph_bounds.min.y - bounds.min.y).round() as i64;
        glyph.draw(|x, y, c| coverage.add(ox + x as i64, oy + y as i64, c));
    }
    coverage
}

// 8x8 bitmap glyphs scaled by exactly `font_size / 8`, sampled nearest-neighbor
// at each output pixel center.
fn rasterize_builtin(text: &str, font_size: f32) -> Coverage {
    let factor = (font_size / 8.0) as f64;
    let glyphs: Vec<[u8; 8]> = text
        .chars()
        .filter(|c| !c.is_control())
        .map(|c| {
            BASIC_FONTS
                .get(c)
                .or_else(|| BASIC_FONTS.get('?'))
                .unwrap_or([0; 8])
        })
        .collect();

    let columns = glyphs.len() as f64 * 8.0;
    let mut coverage =
        Coverage::with_budget((columns * factor).ceil() as u64, (8.0 * factor).ceil() as u64);

    for y in 0..coverage.height {
        let row = ((y as f64 + 0.5) / factor) as usize;
        if row >= 8 {
            continue;
        }
        for x in 0..coverage.width {
            let column = ((x as f64 + 0.5) / factor) as usize;
            let Some(rows) = glyphs.get(column / 8) else {
                continue;
            };
            if (rows[row] >> (column % 8)) & 1 == 1 {
                coverage.add(x as i64, y as i64, 1.0);
            }
        }
    }
    coverage
}

/// Rotate counter-clockwise by `degrees`, expanding the canvas to fit.
fn rotate_image(image: &RgbaImage, degrees: f32) -> RgbaImage {
    let (sin, cos) = degrees.to_radians().sin_cos();

    let src_w = image.width() as f32;
    let src_h = image.height() as f32;

    // Trim float noise so exact quarter turns swap dimensions cleanly.
    let dst_w = (src_w * cos.abs() + src_h * sin.abs() - 1e-3).ceil().max(1.0) as u32;
    let dst_h = (src_w * sin.abs() + src_h * cos.abs() - 1e-3).ceil().max(1.0) as u32;

    let src_cx = src_w / 2.0;
    let src_cy = src_h / 2.0;
    let dst_cx = dst_w as f32 / 2.0;
    let dst_cy = dst_h as f32 / 2.0;

    let mut rotated = RgbaImage::new(dst_w, dst_h);
    for (dx, dy, pixel) in rotated.enumerate_pixels_mut() {
        let rx = dx as f32 + 0.5 - dst_cx;
        let ry = dy as f32 + 0.5 - dst_cy;

        // Inverse mapping; the y axis points down.
        let sx = rx * cos - ry * sin + src_cx;
        let sy = rx * sin + ry * cos + src_cy;

        *pixel = sample_bilinear(image, sx - 0.5, sy - 0.5);
    }
    rotated
}

// Premultiplied bilinear sample; pixels outside the source are transparent.
fn sample_bilinear(image: &RgbaImage, x: f32, y: f32) -> Rgba<u8> {
    let x0 = x.floor();
    let y0 = y.floor();
    let fx = x - x0;
    let fy = y - y0;

    let mut alpha = 0.0f32;
    let mut color = [0.0f32; 3];

    for (ox, oy, weight) in [
        (0, 0, (1.0 - fx) * (1.0 - fy)),
        (1, 0, fx * (1.0 - fy)),
        (0, 1, (1.0 - fx) * fy),
        (1, 1, fx * fy),
    ] {
        let px = x0 as i64 + ox;
        let py = y0 as i64 + oy;
        if weight <= 0.0
            || px < 0
            || py < 0
            || px >= image.width() as i64
            || py >= image.height() as i64
        {
            continue;
        }

        let p = image.get_pixel(px as u32, py as u32);
        let a = p[3] as f32 * weight;
        alpha += a;
        for (c, channel) in color.iter_mut().enumerate() {
            *channel += p[c] as f32 * a;
        }
    }

    if alpha <= 0.0 {
        return Rgba([0, 0, 0, 0]);
    }

    let unpremultiply = |c: f32| (c / alpha).round().clamp(0.0, 255.0) as u8;
    Rgba([
        unpremultiply(color[0]),
        unpremultiply(color[1]),
        unpremultiply(color[2]),
        alpha.round().clamp(0.0, 255.0) as u8,
    ])
}
