// Error types module

use crate::config::ConfigError;
use crate::watermark::WatermarkError;
use std::fmt;

/// Top-level error for library callers that drive both configuration and
/// the watermark engine.
#[derive(Debug)]
pub enum MarkitError {
    /// Configuration errors (unreadable file, invalid YAML, missing env vars)
    Config(ConfigError),

    /// Image load/save errors and missing images
    Watermark(WatermarkError),
}

impl fmt::Display for MarkitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MarkitError::Config(err) => write!(f, "Configuration error: {}", err),
            MarkitError::Watermark(err) => write!(f, "Watermark error: {}", err),
        }
    }
}

impl std::error::Error for MarkitError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            MarkitError::Config(err) => Some(err),
            MarkitError::Watermark(err) => Some(err),
        }
    }
}

impl From<ConfigError> for MarkitError {
    fn from(err: ConfigError) -> Self {
        MarkitError::Config(err)
    }
}

impl From<WatermarkError> for MarkitError {
    fn from(err: WatermarkError) -> Self {
        MarkitError::Watermark(err)
    }
}
