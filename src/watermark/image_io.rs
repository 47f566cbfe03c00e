//! Image file input and output.
//!
//! Decoding sniffs the content, so any png, jpeg, bmp, gif or webp file
//! loads regardless of its extension. Encoding picks the format from the
//! output extension; formats without alpha are flattened against white.

use super::WatermarkError;
use image::io::Reader as ImageReader;
use image::{Rgba, RgbaImage};
use std::io::Cursor;
use std::path::Path;

/// JPEG quality used unless configured otherwise.
pub const DEFAULT_JPEG_QUALITY: u8 = 95;

/// Output formats, chosen by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Png,
    Jpeg,
    WebP,
    Gif,
    Bmp,
}

impl OutputFormat {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "png" => Some(Self::Png),
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "webp" => Some(Self::WebP),
            "gif" => Some(Self::Gif),
            "bmp" => Some(Self::Bmp),
            _ => None,
        }
    }

    /// Format for an output path, or `UnsupportedFormat`.
    pub fn from_path(path: &Path) -> Result<Self, WatermarkError> {
        let ext = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or_default();
        Self::from_extension(ext).ok_or_else(|| {
            let shown = if ext.is_empty() { "<none>" } else { ext };
            WatermarkError::UnsupportedFormat(shown.to_string())
        })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpeg",
            Self::WebP => "webp",
            Self::Gif => "gif",
            Self::Bmp => "bmp",
        }
    }
}

/// Trait for image encoders.
pub trait ImageEncoder: Send + Sync {
    /// The output format this encoder produces.
    fn format(&self) -> OutputFormat;

    /// Encode an RGBA image.
    fn encode(&self, image: &RgbaImage) -> Result<Vec<u8>, WatermarkError>;

    /// Whether the alpha channel survives encoding.
    fn supports_transparency(&self) -> bool;
}

/// Baseline JPEG; alpha is flattened against white first.
pub struct JpegEncoder {
    pub quality: u8,
}

impl Default for JpegEncoder {
    fn default() -> Self {
        Self {
            quality: DEFAULT_JPEG_QUALITY,
        }
    }
}

impl ImageEncoder for JpegEncoder {
    fn format(&self) -> OutputFormat {
        OutputFormat::Jpeg
    }

    fn encode(&self, image: &RgbaImage) -> Result<Vec<u8>, WatermarkError> {
        use image::codecs::jpeg::JpegEncoder as ImageJpegEncoder;
        use image::ImageEncoder as _;

        let rgb_data = flatten_on_white(image);

        let mut output = Cursor::new(Vec::new());
        let encoder = ImageJpegEncoder::new_with_quality(&mut output, self.quality.clamp(1, 100));

        encoder
            .write_image(
                &rgb_data,
                image.width(),
                image.height(),
                image::ColorType::Rgb8,
            )
            .map_err(|e| encode_failed(OutputFormat::Jpeg, e))?;

        Ok(output.into_inner())
    }

    fn supports_transparency(&self) -> bool {
        false
    }
}

pub struct PngEncoder;

impl ImageEncoder for PngEncoder {
    fn format(&self) -> OutputFormat {
        OutputFormat::Png
    }

    fn encode(&self, image: &RgbaImage) -> Result<Vec<u8>, WatermarkError> {
        use image::codecs::png::PngEncoder as ImagePngEncoder;
        use image::ImageEncoder as _;

        let mut output = Cursor::new(Vec::new());
        let encoder = ImagePngEncoder::new(&mut output);

        encoder
            .write_image(
                image.as_raw(),
                image.width(),
                image.height(),
                image::ColorType::Rgba8,
            )
            .map_err(|e| encode_failed(OutputFormat::Png, e))?;

        Ok(output.into_inner())
    }

    fn supports_transparency(&self) -> bool {
        true
    }
}

/// Lossless WebP; the `image` crate has no lossy WebP encoder.
pub struct WebPEncoder;

impl ImageEncoder for WebPEncoder {
    fn format(&self) -> OutputFormat {
        OutputFormat::WebP
    }

    fn encode(&self, image: &RgbaImage) -> Result<Vec<u8>, WatermarkError> {
        use image::codecs::webp::WebPEncoder as ImageWebPEncoder;
        use image::ImageEncoder as _;

        let mut output = Cursor::new(Vec::new());
        let encoder = ImageWebPEncoder::new_lossless(&mut output);

        encoder
            .write_image(
                image.as_raw(),
                image.width(),
                image.height(),
                image::ColorType::Rgba8,
            )
            .map_err(|e| encode_failed(OutputFormat::WebP, e))?;

        Ok(output.into_inner())
    }

    fn supports_transparency(&self) -> bool {
        true
    }
}

/// GIF and BMP go through `DynamicImage::write_to`.
pub struct GenericEncoder {
    format: OutputFormat,
}

impl ImageEncoder for GenericEncoder {
    fn format(&self) -> OutputFormat {
        self.format
    }

    fn encode(&self, image: &RgbaImage) -> Result<Vec<u8>, WatermarkError> {
        let target = match self.format {
            OutputFormat::Gif => image::ImageFormat::Gif,
            OutputFormat::Bmp => image::ImageFormat::Bmp,
            other => return Err(WatermarkError::UnsupportedFormat(other.as_str().to_string())),
        };

        let mut output = Cursor::new(Vec::new());
        image::DynamicImage::ImageRgba8(image.clone())
            .write_to(&mut output, target)
            .map_err(|e| encode_failed(self.format, e))?;

        Ok(output.into_inner())
    }

    fn supports_transparency(&self) -> bool {
        true
    }
}

/// Factory for creating encoders based on output format.
pub struct EncoderFactory;

impl EncoderFactory {
    pub fn create(format: OutputFormat, jpeg_quality: u8) -> Box<dyn ImageEncoder> {
        match format {
            OutputFormat::Jpeg => Box::new(JpegEncoder {
                quality: jpeg_quality,
            }),
            OutputFormat::Png => Box::new(PngEncoder),
            OutputFormat::WebP => Box::new(WebPEncoder),
            OutputFormat::Gif | OutputFormat::Bmp => Box::new(GenericEncoder { format }),
        }
    }
}

fn encode_failed(format: OutputFormat, err: impl std::fmt::Display) -> WatermarkError {
    WatermarkError::SaveFailed(format!("{} encoding failed: {}", format.as_str(), err))
}

/// Composite RGBA over opaque white and drop the alpha channel.
pub fn flatten_on_white(image: &RgbaImage) -> Vec<u8> {
    let mut rgb = Vec::with_capacity(image.width() as usize * image.height() as usize * 3);

    for Rgba([r, g, b, a]) in image.pixels() {
        let alpha = *a as f32 / 255.0;
        for channel in [*r, *g, *b] {
            let value = channel as f32 * alpha + 255.0 * (1.0 - alpha);
            rgb.push(value.round().clamp(0.0, 255.0) as u8);
        }
    }

    rgb
}

/// Decode an image from memory into RGBA.
pub fn decode_image(data: &[u8]) -> Result<RgbaImage, WatermarkError> {
    decode_labeled(data, "<memory>")
}

/// Open and decode an image file into RGBA.
pub fn load_image(path: &Path) -> Result<RgbaImage, WatermarkError> {
    let shown = path.display();
    let data = std::fs::read(path).map_err(|e| WatermarkError::load_failed(&shown, e))?;
    let image = decode_labeled(&data, &shown)?;

    tracing::debug!(
        path = %shown,
        bytes = data.len(),
        width = image.width(),
        height = image.height(),
        "image decoded"
    );
    Ok(image)
}

// The format is sniffed from the content, never taken from a file name.
fn decode_labeled(data: &[u8], source: impl std::fmt::Display) -> Result<RgbaImage, WatermarkError> {
    let image = ImageReader::new(Cursor::new(data))
        .with_guessed_format()
        .map_err(|e| WatermarkError::load_failed(&source, e))?
        .decode()
        .map_err(|e| WatermarkError::load_failed(&source, e))?;
    Ok(image.to_rgba8())
}

/// Encode `image` in the format named by the path's extension and write it.
pub fn save_image(path: &Path, image: &RgbaImage, jpeg_quality: u8) -> Result<(), WatermarkError> {
    let format = OutputFormat::from_path(path)?;
    let encoder = EncoderFactory::create(format, jpeg_quality);
    let bytes = encoder.encode(image)?;

    std::fs::write(path, &bytes).map_err(|e| WatermarkError::save_failed(path.display(), e))?;

    tracing::debug!(
        path = %path.display(),
        format = format.as_str(),
        bytes = bytes.len(),
        "image written"
    );
    Ok(())
}
