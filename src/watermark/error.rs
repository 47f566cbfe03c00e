//! Watermark error types.
//!
//! Only failures the user has to act on are represented here. Font and color
//! problems are recovered with fallbacks and never reach the caller.

use std::fmt;

/// Errors surfaced by the watermark engine.
#[derive(Debug)]
pub enum WatermarkError {
    /// The source image could not be opened or decoded
    LoadFailed(String),

    /// The watermarked image could not be encoded or written
    SaveFailed(String),

    /// The output path names a format the encoder does not support
    UnsupportedFormat(String),

    /// A preview or save was requested before any image was loaded
    NoImageLoaded,
}

impl WatermarkError {
    pub(crate) fn load_failed(path: impl fmt::Display, reason: impl fmt::Display) -> Self {
        Self::LoadFailed(format!("{}: {}", path, reason))
    }

    pub(crate) fn save_failed(path: impl fmt::Display, reason: impl fmt::Display) -> Self {
        Self::SaveFailed(format!("{}: {}", path, reason))
    }
}

impl fmt::Display for WatermarkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LoadFailed(msg) => write!(f, "Failed to load image: {}", msg),
            Self::SaveFailed(msg) => write!(f, "Failed to save image: {}", msg),
            Self::UnsupportedFormat(ext) => write!(f, "Unsupported output format: {}", ext),
            Self::NoImageLoaded => write!(f, "No image loaded"),
        }
    }
}

impl std::error::Error for WatermarkError {}
