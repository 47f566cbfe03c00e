//! Font registry.
//!
//! Maps user-facing font ids ("Arial", "Times New Roman", ...) to TrueType
//! faces found in the configured font directories. A lookup never fails:
//! unknown ids and missing files resolve to the default font, and when that
//! is unavailable too, to a built-in 8x8 bitmap face.

use ab_glyph::{FontArc, InvalidFont};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// Font ids offered by default and the file each one is loaded from.
pub const FONT_TABLE: [(&str, &str); 9] = [
    ("Arial", "arial.ttf"),
    ("Arial Bold", "arialbd.ttf"),
    ("Times New Roman", "times.ttf"),
    ("Courier New", "cour.ttf"),
    ("Verdana", "verdana.ttf"),
    ("Georgia", "georgia.ttf"),
    ("Impact", "impact.ttf"),
    ("Comic Sans MS", "comic.ttf"),
    ("Trebuchet MS", "trebuc.ttf"),
];

pub const DEFAULT_FONT_ID: &str = "Arial";

/// Platform font directories searched when none are configured.
pub fn default_font_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![
        PathBuf::from("."),
        PathBuf::from("/usr/share/fonts/truetype/msttcorefonts"),
        PathBuf::from("/usr/share/fonts/TTF"),
        PathBuf::from("/usr/share/fonts/truetype"),
        PathBuf::from("/Library/Fonts"),
        PathBuf::from("/System/Library/Fonts/Supplemental"),
        PathBuf::from(r"C:\Windows\Fonts"),
    ];
    if let Some(home) = std::env::var_os("HOME") {
        dirs.push(PathBuf::from(home).join(".fonts"));
    }
    dirs
}

/// A face the text renderer can draw with.
#[derive(Clone)]
pub enum FontFace {
    /// A parsed TrueType/OpenType face.
    Outline(FontArc),
    /// The built-in 8x8 bitmap face.
    Builtin,
}

impl FontFace {
    pub fn is_builtin(&self) -> bool {
        matches!(self, Self::Builtin)
    }
}

impl fmt::Debug for FontFace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Outline(_) => f.write_str("FontFace::Outline"),
            Self::Builtin => f.write_str("FontFace::Builtin"),
        }
    }
}

/// Font id to face lookup.
pub struct FontRegistry {
    ids: Vec<String>,
    faces: HashMap<String, FontArc>,
    font_dirs: Vec<PathBuf>,
    default_font: String,
}

impl FontRegistry {
    /// Registry for the standard font table, searched in `font_dirs`.
    pub fn new(font_dirs: Vec<PathBuf>) -> Self {
        let mut registry = Self::builtin_only();
        registry.font_dirs = font_dirs;

        for (id, file_name) in FONT_TABLE {
            match registry.find_in_dirs(file_name) {
                Some(path) => {
                    registry.register_file(id, &path);
                }
                None => tracing::debug!(font_id = id, file = file_name, "font file not found"),
            }
        }

        tracing::info!(
            known = registry.ids.len(),
            loaded = registry.faces.len(),
            "font registry ready"
        );
        registry
    }

    /// Registry that knows the standard ids but has no faces loaded; every
    /// lookup returns the built-in face.
    pub fn builtin_only() -> Self {
        Self {
            ids: FONT_TABLE.iter().map(|(id, _)| id.to_string()).collect(),
            faces: HashMap::new(),
            font_dirs: Vec::new(),
            default_font: DEFAULT_FONT_ID.to_string(),
        }
    }

    /// Use `id` for lookups of unknown or unloaded fonts.
    pub fn with_default_font(mut self, id: impl Into<String>) -> Self {
        self.default_font = id.into();
        self
    }

    /// Load a face from a file. A missing or unparseable file is logged and
    /// leaves the registry unchanged.
    pub fn register_file(&mut self, id: &str, path: &Path) -> bool {
        let bytes = match std::fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(font_id = id, path = %path.display(), error = %e, "cannot read font file");
                return false;
            }
        };

        match self.register_bytes(id, bytes) {
            Ok(()) => {
                tracing::debug!(font_id = id, path = %path.display(), "font loaded");
                true
            }
            Err(e) => {
                tracing::warn!(font_id = id, path = %path.display(), error = %e, "invalid font file");
                false
            }
        }
    }

    /// Parse and register a face from raw font bytes.
    pub fn register_bytes(&mut self, id: &str, bytes: Vec<u8>) -> Result<(), InvalidFont> {
        let font = FontArc::try_from_vec(bytes)?;
        if !self.ids.iter().any(|known| known == id) {
            self.ids.push(id.to_string());
        }
        self.faces.insert(id.to_string(), font);
        Ok(())
    }

    /// Resolve a font id to a face, substituting the default font and then the
    /// built-in face.
    pub fn lookup(&self, id: &str) -> FontFace {
        if let Some(font) = self.faces.get(id) {
            return FontFace::Outline(font.clone());
        }

        if let Some(font) = self.faces.get(&self.default_font) {
            tracing::debug!(font_id = id, fallback = %self.default_font, "font unavailable, using default");
            return FontFace::Outline(font.clone());
        }

        tracing::debug!(font_id = id, "font unavailable, using built-in face");
        FontFace::Builtin
    }

    /// Known font ids in display order.
    pub fn font_ids(&self) -> Vec<&str> {
        self.ids.iter().map(String::as_str).collect()
    }

    pub fn is_loaded(&self, id: &str) -> bool {
        self.faces.contains_key(id)
    }

    pub fn font_dirs(&self) -> &[PathBuf] {
        &self.font_dirs
    }

    pub fn default_font(&self) -> &str {
        &self.default_font
    }

    // File names are matched case-insensitively ("Arial.ttf" vs "arial.ttf").
    fn find_in_dirs(&self, file_name: &str) -> Option<PathBuf> {
        self.font_dirs.iter().find_map(|dir| {
            let exact = dir.join(file_name);
            if exact.is_file() {
                return Some(exact);
            }
            std::fs::read_dir(dir)
                .ok()?
                .filter_map(Result::ok)
                .map(|entry| entry.path())
                .find(|path| {
                    path.is_file()
                        && path
                            .file_name()
                            .and_then(|name| name.to_str())
                            .is_some_and(|name| name.eq_ignore_ascii_case(file_name))
                })
        })
    }
}

impl Default for FontRegistry {
    fn default() -> Self {
        Self::new(default_font_dirs())
    }
}

impl fmt::Debug for FontRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut loaded: Vec<&String> = self.faces.keys().collect();
        loaded.sort();
        f.debug_struct("FontRegistry")
            .field("ids", &self.ids)
            .field("loaded", &loaded)
            .field("font_dirs", &self.font_dirs)
            .field("default_font", &self.default_font)
            .finish()
    }
}

/// Path of some TrueType face on this machine, if any. Test helper.
#[cfg(test)]
pub(crate) fn system_test_font() -> Option<PathBuf> {
    [
        "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
        "/usr/share/fonts/TTF/DejaVuSans.ttf",
        "/usr/share/fonts/dejavu/DejaVuSans.ttf",
        "/Library/Fonts/Arial.ttf",
        r"C:\Windows\Fonts\arial.ttf",
    ]
    .iter()
    .map(PathBuf::from)
    .find(|path| path.is_file())
}
