//! The editing session behind the UI shell.
//!
//! A session owns the loaded original, the current settings and the last
//! baked result. The original is never modified: every preview and bake
//! composites onto a fresh copy, so a session can be shared across threads.
//!
//! ```text
//! Empty --load--> Loaded --preview--> Previewing --bake_and_save--> Saved
//!                                         ^                           |
//!                                         +------ update_settings ----+
//! ```

use super::compositor::{Composite, Compositor};
use super::font::FontRegistry;
use super::image_io::{self, DEFAULT_JPEG_QUALITY};
use super::position::{ImageDimensions, Padding};
use super::preview::{scale_for_preview, PreviewFrame, Viewport};
use super::{SettingsUpdate, WatermarkError, WatermarkSettings};
use crate::config::EngineConfig;
use image::RgbaImage;
use std::path::{Path, PathBuf};

/// Output name used when the image did not come from a file.
pub const FALLBACK_OUTPUT_NAME: &str = "watermarked_image.png";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Empty,
    Loaded,
    Previewing,
    Saved,
}

impl SessionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Empty => "empty",
            Self::Loaded => "loaded",
            Self::Previewing => "previewing",
            Self::Saved => "saved",
        }
    }
}

struct LoadedImage {
    path: Option<PathBuf>,
    original: RgbaImage,
    // Downscaled copy for the last requested display size.
    preview_base: Option<RgbaImage>,
}

pub struct WatermarkSession {
    state: SessionState,
    image: Option<LoadedImage>,
    settings: WatermarkSettings,
    baked: Option<RgbaImage>,
    discarded: bool,
    fonts: FontRegistry,
    padding: Padding,
    jpeg_quality: u8,
}

impl WatermarkSession {
    pub fn new(fonts: FontRegistry) -> Self {
        Self {
            state: SessionState::Empty,
            image: None,
            settings: WatermarkSettings::default(),
            baked: None,
            discarded: false,
            fonts,
            padding: Padding::default(),
            jpeg_quality: DEFAULT_JPEG_QUALITY,
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.font_registry())
            .with_padding(config.padding)
            .with_jpeg_quality(config.jpeg_quality)
    }

    pub fn with_padding(mut self, padding: Padding) -> Self {
        self.padding = padding;
        self
    }

    pub fn with_jpeg_quality(mut self, quality: u8) -> Self {
        self.jpeg_quality = quality;
        self
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn settings(&self) -> &WatermarkSettings {
        &self.settings
    }

    pub fn fonts(&self) -> &FontRegistry {
        &self.fonts
    }

    pub fn original(&self) -> Option<&RgbaImage> {
        self.image.as_ref().map(|image| &image.original)
    }

    pub fn source_path(&self) -> Option<&Path> {
        self.image.as_ref().and_then(|image| image.path.as_deref())
    }

    /// The last baked result, kept until the next load, discard or reset.
    pub fn baked(&self) -> Option<&RgbaImage> {
        self.baked.as_ref()
    }

    pub fn is_discarded(&self) -> bool {
        self.discarded
    }

    /// Open an image file. On failure the session is left as it was.
    pub fn load(&mut self, path: impl AsRef<Path>) -> Result<(), WatermarkError> {
        let path = path.as_ref();
        let original = image_io::load_image(path)?;

        tracing::info!(
            path = %path.display(),
            width = original.width(),
            height = original.height(),
            "image loaded"
        );
        self.install(original, Some(path.to_path_buf()));
        Ok(())
    }

    /// Use an already decoded image.
    pub fn load_image(&mut self, original: RgbaImage) {
        tracing::info!(
            width = original.width(),
            height = original.height(),
            "image loaded from memory"
        );
        self.install(original, None);
    }

    fn install(&mut self, original: RgbaImage, path: Option<PathBuf>) {
        self.image = Some(LoadedImage {
            path,
            original,
            preview_base: None,
        });
        self.baked = None;
        self.discarded = false;
        self.transition(SessionState::Loaded);
    }

    /// Merge a partial settings edit. Nothing is rendered until the next
    /// preview.
    pub fn update_settings(&mut self, update: SettingsUpdate) {
        if update.is_empty() {
            return;
        }
        tracing::debug!(?update, "settings updated");

        self.settings.apply(update);
        self.discarded = false;
        if self.state == SessionState::Saved {
            self.transition(SessionState::Previewing);
        }
    }

    /// Full-resolution composite of the current settings.
    pub fn preview(&mut self) -> Result<RgbaImage, WatermarkError> {
        let loaded = self.image.as_ref().ok_or(WatermarkError::NoImageLoaded)?;

        let image = if self.discarded {
            loaded.original.clone()
        } else {
            Compositor::new(&self.fonts, self.padding).composite(&loaded.original, &self.settings)
        };

        self.mark_previewing();
        Ok(image)
    }

    /// Composite on a copy fitted into `canvas`, with the font scaled by the
    /// same ratio as the image.
    pub fn preview_in(&mut self, canvas: ImageDimensions) -> Result<PreviewFrame, WatermarkError> {
        let loaded = self.image.as_mut().ok_or(WatermarkError::NoImageLoaded)?;
        let viewport = Viewport::fit(ImageDimensions::of(&loaded.original), canvas);

        let target = (viewport.display.width, viewport.display.height);
        let base = match loaded.preview_base.take() {
            Some(base) if base.dimensions() == target => base,
            _ => scale_for_preview(&loaded.original, viewport.display),
        };
        let base = loaded.preview_base.insert(base);

        let composite = if self.discarded {
            Composite {
                image: base.clone(),
                layer: None,
            }
        } else {
            Compositor::new(&self.fonts, self.padding).composite_scaled(
                base,
                &self.settings,
                viewport.ratio,
            )
        };

        self.mark_previewing();
        Ok(PreviewFrame::new(composite, viewport))
    }

    /// Composite at full resolution and keep the result.
    ///
    /// A discarded session bakes the untouched original.
    pub fn bake(&mut self) -> Result<&RgbaImage, WatermarkError> {
        let loaded = self.image.as_ref().ok_or(WatermarkError::NoImageLoaded)?;

        let baked = if self.discarded {
            loaded.original.clone()
        } else {
            Compositor::new(&self.fonts, self.padding).composite(&loaded.original, &self.settings)
        };
        Ok(self.baked.insert(baked))
    }

    /// Bake and write to `path`, format chosen by extension. On failure the
    /// loaded image and settings are kept.
    pub fn bake_and_save(&mut self, path: impl AsRef<Path>) -> Result<(), WatermarkError> {
        let path = path.as_ref();
        let quality = self.jpeg_quality;
        let baked = self.bake()?;

        if let Err(e) = image_io::save_image(path, baked, quality) {
            tracing::error!(path = %path.display(), error = %e, "save failed");
            return Err(e);
        }

        tracing::info!(path = %path.display(), "watermarked image saved");
        self.transition(SessionState::Saved);
        Ok(())
    }

    /// Show the original again. Settings and the loaded image are kept; the
    /// next settings change brings the watermark back.
    pub fn discard(&mut self) {
        if self.image.is_none() {
            return;
        }
        self.discarded = true;
        self.baked = None;
        tracing::info!("watermark discarded");
    }

    /// Drop the image and restore default settings.
    pub fn reset(&mut self) {
        self.image = None;
        self.baked = None;
        self.discarded = false;
        self.settings = WatermarkSettings::default();
        self.transition(SessionState::Empty);
    }

    /// `watermarked_<file name>` for a file, `watermarked_image.png` otherwise.
    pub fn suggested_output_name(&self) -> String {
        self.source_path()
            .and_then(|path| path.file_name())
            .map(|name| format!("watermarked_{}", name.to_string_lossy()))
            .unwrap_or_else(|| FALLBACK_OUTPUT_NAME.to_string())
    }

    fn mark_previewing(&mut self) {
        if matches!(self.state, SessionState::Loaded | SessionState::Saved) {
            self.transition(SessionState::Previewing);
        }
    }

    fn transition(&mut self, next: SessionState) {
        if self.state != next {
            tracing::debug!(from = self.state.as_str(), to = next.as_str(), "session state");
            self.state = next;
        }
    }
}

impl std::fmt::Debug for WatermarkSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatermarkSession")
            .field("state", &self.state)
            .field("source_path", &self.source_path())
            .field("dimensions", &self.original().map(|image| image.dimensions()))
            .field("settings", &self.settings)
            .field("discarded", &self.discarded)
            .finish()
    }
}
