//! Engine configuration.
//!
//! Loaded from YAML with `${VAR}` environment substitution. Every field has a
//! default, so an empty file (or no file at all) is a valid configuration.
//! Watermark settings are never stored here; they live only in the session.
//!
//! ```yaml
//! font_dirs:
//!   - /usr/share/fonts/truetype/msttcorefonts
//!   - ${HOME}/.fonts
//! fonts:
//!   Company Sans: /opt/brand/CompanySans.ttf
//! default_font: Arial
//! padding:
//!   min_px: 8
//!   fraction: 0.02
//! jpeg_quality: 95
//! preview:
//!   max_width: 960
//!   max_height: 720
//! ```

use crate::watermark::font::{default_font_dirs, FontRegistry, DEFAULT_FONT_ID};
use crate::watermark::image_io::DEFAULT_JPEG_QUALITY;
use crate::watermark::position::{ImageDimensions, Padding};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised while loading or validating the configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid YAML: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Environment variable '{0}' is referenced but not set")]
    MissingEnvVar(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

fn default_font() -> String {
    DEFAULT_FONT_ID.to_string()
}

fn default_jpeg_quality() -> u8 {
    DEFAULT_JPEG_QUALITY
}

fn default_preview_width() -> u32 {
    960
}

fn default_preview_height() -> u32 {
    720
}

/// Size of the canvas previews are fitted into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreviewConfig {
    #[serde(default = "default_preview_width")]
    pub max_width: u32,

    #[serde(default = "default_preview_height")]
    pub max_height: u32,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            max_width: default_preview_width(),
            max_height: default_preview_height(),
        }
    }
}

impl PreviewConfig {
    pub fn canvas(&self) -> ImageDimensions {
        ImageDimensions::new(self.max_width, self.max_height)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Directories searched for the standard font files. Empty means the
    /// platform defaults.
    #[serde(default)]
    pub font_dirs: Vec<PathBuf>,

    /// Extra font ids and the files they load from.
    #[serde(default)]
    pub fonts: BTreeMap<String, PathBuf>,

    #[serde(default = "default_font")]
    pub default_font: String,

    #[serde(default)]
    pub padding: Padding,

    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u8,

    #[serde(default)]
    pub preview: PreviewConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            font_dirs: Vec::new(),
            fonts: BTreeMap::new(),
            default_font: default_font(),
            padding: Padding::default(),
            jpeg_quality: default_jpeg_quality(),
            preview: PreviewConfig::default(),
        }
    }
}

impl EngineConfig {
    pub fn from_yaml_with_env(yaml: &str) -> Result<Self, ConfigError> {
        let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}")
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;

        // Every referenced variable must exist before anything is replaced.
        for caps in re.captures_iter(yaml) {
            let var_name = &caps[1];
            if std::env::var(var_name).is_err() {
                return Err(ConfigError::MissingEnvVar(var_name.to_string()));
            }
        }

        let substituted = re.replace_all(yaml, |caps: &regex::Captures| {
            std::env::var(&caps[1]).unwrap_or_default()
        });

        // An empty document deserializes as unit, not as a mapping.
        if substituted.trim().is_empty() {
            return Ok(Self::default());
        }

        Ok(serde_yaml::from_str(&substituted)?)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_with_env(&yaml)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_font.trim().is_empty() {
            return Err(ConfigError::Invalid("default_font cannot be empty".to_string()));
        }

        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(ConfigError::Invalid(format!(
                "jpeg_quality must be between 1 and 100, got {}",
                self.jpeg_quality
            )));
        }

        if !self.padding.min_px.is_finite() || self.padding.min_px < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "padding.min_px must be a non-negative number, got {}",
                self.padding.min_px
            )));
        }

        if !(0.0..=0.5).contains(&self.padding.fraction) {
            return Err(ConfigError::Invalid(format!(
                "padding.fraction must be between 0 and 0.5, got {}",
                self.padding.fraction
            )));
        }

        if self.preview.max_width == 0 || self.preview.max_height == 0 {
            return Err(ConfigError::Invalid(
                "preview dimensions must be non-zero".to_string(),
            ));
        }

        if let Some(id) = self.fonts.keys().find(|id| id.trim().is_empty()) {
            return Err(ConfigError::Invalid(format!(
                "font id cannot be empty (path {:?})",
                self.fonts[id]
            )));
        }

        Ok(())
    }

    /// Font directories to search: the configured ones or the platform list.
    pub fn effective_font_dirs(&self) -> Vec<PathBuf> {
        if self.font_dirs.is_empty() {
            default_font_dirs()
        } else {
            self.font_dirs.clone()
        }
    }

    /// Build the font registry: standard table, then configured extras.
    pub fn font_registry(&self) -> FontRegistry {
        let mut registry = FontRegistry::new(self.effective_font_dirs())
            .with_default_font(self.default_font.clone());

        for (id, path) in &self.fonts {
            registry.register_file(id, path);
        }
        registry
    }
}
