//! Watermark settings and their textual forms.
//!
//! [`WatermarkSettings`] is the single record the shell edits. Partial edits
//! arrive as a [`SettingsUpdate`] and are merged field by field, last write
//! wins. Nothing here renders; a settings change only becomes visible when the
//! caller asks the session for a new preview.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;

/// Font sizes offered by the size slider.
pub const SIZE_RANGE: RangeInclusive<u32> = 10..=200;

/// Opacity values offered by the opacity slider.
pub const OPACITY_RANGE: RangeInclusive<u8> = 0..=255;

/// Rotation angles offered by the angle slider, in degrees.
pub const ANGLE_RANGE: RangeInclusive<i32> = -90..=90;

/// Nine fixed placements around the container edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Anchor {
    TopLeft,
    TopCenter,
    TopRight,
    LeftCenter,
    Center,
    RightCenter,
    BottomLeft,
    BottomCenter,
    BottomRight,
}

impl Anchor {
    /// All anchors in the order the position picker lists them.
    pub const ALL: [Anchor; 9] = [
        Anchor::TopLeft,
        Anchor::TopCenter,
        Anchor::TopRight,
        Anchor::LeftCenter,
        Anchor::Center,
        Anchor::RightCenter,
        Anchor::BottomLeft,
        Anchor::BottomCenter,
        Anchor::BottomRight,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TopLeft => "top-left",
            Self::TopCenter => "top-center",
            Self::TopRight => "top-right",
            Self::LeftCenter => "left-center",
            Self::Center => "center",
            Self::RightCenter => "right-center",
            Self::BottomLeft => "bottom-left",
            Self::BottomCenter => "bottom-center",
            Self::BottomRight => "bottom-right",
        }
    }

    /// Horizontal and vertical alignment as -1 (start), 0 (middle) or 1 (end).
    pub(crate) fn alignment(&self) -> (i8, i8) {
        match self {
            Self::TopLeft => (-1, -1),
            Self::TopCenter => (0, -1),
            Self::TopRight => (1, -1),
            Self::LeftCenter => (-1, 0),
            Self::Center => (0, 0),
            Self::RightCenter => (1, 0),
            Self::BottomLeft => (-1, 1),
            Self::BottomCenter => (0, 1),
            Self::BottomRight => (1, 1),
        }
    }
}

impl fmt::Display for Anchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Anchor {
    type Err = PositionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace([' ', '_'], "-");
        Anchor::ALL
            .iter()
            .copied()
            .find(|anchor| anchor.as_str() == normalized)
            .ok_or_else(|| PositionParseError(s.to_string()))
    }
}

/// Where the watermark sits: a named anchor or a fractional point.
///
/// Custom points are fractions of the container, so the same value places the
/// layer consistently on a preview and on the full-resolution image.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Position {
    Anchor(Anchor),
    Custom { u: f64, v: f64 },
}

impl Position {
    /// A custom point with both fractions clamped to `[0, 1]`.
    ///
    /// Non-finite components are kept as-is; the resolver treats them as
    /// `center`.
    pub fn custom(u: f64, v: f64) -> Self {
        let clamp = |value: f64| {
            if value.is_finite() {
                value.clamp(0.0, 1.0)
            } else {
                value
            }
        };
        Self::Custom {
            u: clamp(u),
            v: clamp(v),
        }
    }

    /// Parse a descriptor, falling back to `center` when it is malformed.
    pub fn from_descriptor(descriptor: &str) -> Self {
        descriptor.parse().unwrap_or_else(|err: PositionParseError| {
            tracing::warn!(error = %err, "falling back to center position");
            Position::default()
        })
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::Anchor(Anchor::Center)
    }
}

impl From<Anchor> for Position {
    fn from(anchor: Anchor) -> Self {
        Self::Anchor(anchor)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Anchor(anchor) => anchor.fmt(f),
            Self::Custom { u, v } => write!(f, "custom:{:.6},{:.6}", u, v),
        }
    }
}

impl FromStr for Position {
    type Err = PositionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let point = trimmed
            .strip_prefix("custom_pct:")
            .or_else(|| trimmed.strip_prefix("custom:"));

        let Some(point) = point else {
            return trimmed.parse().map(Position::Anchor);
        };

        let (u, v) = point
            .split_once(',')
            .ok_or_else(|| PositionParseError(s.to_string()))?;
        let parse = |value: &str| {
            value
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|value| value.is_finite())
                .ok_or_else(|| PositionParseError(s.to_string()))
        };
        Ok(Position::custom(parse(u)?, parse(v)?))
    }
}

impl TryFrom<String> for Position {
    type Error = PositionParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Position> for String {
    fn from(position: Position) -> Self {
        position.to_string()
    }
}

/// A position descriptor that is neither an anchor name nor a custom point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionParseError(pub String);

impl fmt::Display for PositionParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid position descriptor: {:?}", self.0)
    }
}

impl std::error::Error for PositionParseError {}

/// Text fill color. Opacity is carried separately in the settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn white() -> Self {
        Self::new(255, 255, 255)
    }

    pub fn black() -> Self {
        Self::new(0, 0, 0)
    }

    /// Parse a color, substituting opaque white for anything unreadable.
    pub fn parse_or_white(value: &str) -> Self {
        parse_color(value).unwrap_or_else(|| {
            tracing::warn!(color = value, "unparseable color, using white");
            Self::white()
        })
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::black()
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl From<String> for Color {
    fn from(value: String) -> Self {
        Self::parse_or_white(&value)
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_string()
    }
}

/// Parse `#RGB`, `#RRGGBB` or one of a few basic color names.
pub fn parse_color(value: &str) -> Option<Color> {
    let value = value.trim();
    let Some(hex) = value.strip_prefix('#') else {
        return named_color(value);
    };
    if !hex.is_ascii() {
        return None;
    }

    let digit = |s: &str| u8::from_str_radix(s, 16).ok();
    match hex.len() {
        // #RGB doubles each digit: 0xF -> 0xFF
        3 => Some(Color::new(
            digit(&hex[0..1])? * 17,
            digit(&hex[1..2])? * 17,
            digit(&hex[2..3])? * 17,
        )),
        6 => Some(Color::new(
            digit(&hex[0..2])?,
            digit(&hex[2..4])?,
            digit(&hex[4..6])?,
        )),
        _ => None,
    }
}

fn named_color(name: &str) -> Option<Color> {
    let color = match name.to_ascii_lowercase().as_str() {
        "white" => Color::white(),
        "black" => Color::black(),
        "red" => Color::new(255, 0, 0),
        "green" => Color::new(0, 128, 0),
        "blue" => Color::new(0, 0, 255),
        "yellow" => Color::new(255, 255, 0),
        "gray" | "grey" => Color::new(128, 128, 128),
        _ => return None,
    };
    Some(color)
}

/// The full set of user-editable watermark parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatermarkSettings {
    pub text: String,
    pub font_id: String,
    pub size_pt: u32,
    pub color: Color,
    pub opacity: u8,
    pub angle_deg: i32,
    pub position: Position,
}

impl Default for WatermarkSettings {
    fn default() -> Self {
        Self {
            text: "Your Watermark".to_string(),
            font_id: "Arial".to_string(),
            size_pt: 36,
            color: Color::black(),
            opacity: 255,
            angle_deg: 0,
            position: Position::default(),
        }
    }
}

impl WatermarkSettings {
    /// Merge a partial update. Absent fields keep their current value.
    pub fn apply(&mut self, update: SettingsUpdate) {
        let SettingsUpdate {
            text,
            font_id,
            size_pt,
            color,
            opacity,
            angle_deg,
            position,
        } = update;

        if let Some(text) = text {
            self.text = text;
        }
        if let Some(font_id) = font_id {
            self.font_id = font_id;
        }
        if let Some(size_pt) = size_pt {
            self.size_pt = size_pt;
        }
        if let Some(color) = color {
            self.color = color;
        }
        if let Some(opacity) = opacity {
            self.opacity = opacity;
        }
        if let Some(angle_deg) = angle_deg {
            self.angle_deg = angle_deg;
        }
        if let Some(position) = position {
            self.position = position;
        }
    }

    /// RGBA fill with opacity as the alpha channel.
    pub fn fill(&self) -> image::Rgba<u8> {
        image::Rgba([self.color.r, self.color.g, self.color.b, self.opacity])
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

/// A partial settings edit, built with the `with_*` methods.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SettingsUpdate {
    pub text: Option<String>,
    pub font_id: Option<String>,
    pub size_pt: Option<u32>,
    pub color: Option<Color>,
    pub opacity: Option<u8>,
    pub angle_deg: Option<i32>,
    pub position: Option<Position>,
}

impl SettingsUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_font(mut self, font_id: impl Into<String>) -> Self {
        self.font_id = Some(font_id.into());
        self
    }

    pub fn with_size(mut self, size_pt: u32) -> Self {
        self.size_pt = Some(size_pt);
        self
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = Some(color);
        self
    }

    /// Color as typed by the user; unreadable input becomes white.
    pub fn with_color_str(self, color: &str) -> Self {
        self.with_color(Color::parse_or_white(color))
    }

    pub fn with_opacity(mut self, opacity: u8) -> Self {
        self.opacity = Some(opacity);
        self
    }

    pub fn with_angle(mut self, angle_deg: i32) -> Self {
        self.angle_deg = Some(angle_deg);
        self
    }

    pub fn with_position(mut self, position: impl Into<Position>) -> Self {
        self.position = Some(position.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

impl From<WatermarkSettings> for SettingsUpdate {
    /// An update that replaces every field.
    fn from(settings: WatermarkSettings) -> Self {
        Self {
            text: Some(settings.text),
            font_id: Some(settings.font_id),
            size_pt: Some(settings.size_pt),
            color: Some(settings.color),
            opacity: Some(settings.opacity),
            angle_deg: Some(settings.angle_deg),
            position: Some(settings.position),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_default_settings() {
        let settings = WatermarkSettings::default();
        assert_eq!(settings.text, "Your Watermark");
        assert_eq!(settings.font_id, "Arial");
        assert_eq!(settings.size_pt, 36);
        assert_eq!(settings.color, Color::black());
        assert_eq!(settings.opacity, 255);
        assert_eq!(settings.angle_deg, 0);
        assert_eq!(settings.position, Position::Anchor(Anchor::Center));
    }

    #[test]
    fn test_parse_color_rrggbb() {
        assert_eq!(parse_color("#FF0000"), Some(Color::new(255, 0, 0)));
        assert_eq!(parse_color("#1a2B3c"), Some(Color::new(0x1a, 0x2b, 0x3c)));
    }

    #[test]
    fn test_parse_color_rgb() {
        assert_eq!(parse_color("#FFF"), Some(Color::white()));
        assert_eq!(parse_color("#A50"), Some(Color::new(0xaa, 0x55, 0x00)));
    }

    #[test]
    fn test_parse_color_names() {
        assert_eq!(parse_color("White"), Some(Color::white()));
        assert_eq!(parse_color("grey"), Some(Color::new(128, 128, 128)));
    }

    #[test]
    fn test_parse_color_invalid() {
        assert_eq!(parse_color("#GG0000"), None);
        assert_eq!(parse_color("#FF00"), None);
        assert_eq!(parse_color("#é00"), None);
        assert_eq!(parse_color("chartreuse-ish"), None);
    }

    #[test]
    fn test_color_fallback_is_white() {
        assert_eq!(Color::parse_or_white("not a color"), Color::white());
        assert_eq!(Color::parse_or_white("#123456"), Color::new(0x12, 0x34, 0x56));
    }

    #[test]
    fn test_color_display_is_lowercase_hex() {
        assert_eq!(Color::new(255, 128, 0).to_string(), "#ff8000");
    }

    #[rstest]
    #[case("top-left", Anchor::TopLeft)]
    #[case("top left", Anchor::TopLeft)]
    #[case("TOP_CENTER", Anchor::TopCenter)]
    #[case("right center", Anchor::RightCenter)]
    #[case(" center ", Anchor::Center)]
    #[case("bottom-right", Anchor::BottomRight)]
    fn test_parse_anchor(#[case] input: &str, #[case] expected: Anchor) {
        assert_eq!(input.parse::<Position>(), Ok(Position::Anchor(expected)));
    }

    #[test]
    fn test_anchor_round_trip_through_display() {
        for anchor in Anchor::ALL {
            let position = Position::Anchor(anchor);
            assert_eq!(position.to_string().parse::<Position>(), Ok(position));
        }
    }

    #[test]
    fn test_parse_custom_position() {
        assert_eq!(
            "custom:0.25,0.75".parse::<Position>(),
            Ok(Position::Custom { u: 0.25, v: 0.75 })
        );
        assert_eq!(
            "custom_pct:0.500000,0.100000".parse::<Position>(),
            Ok(Position::Custom { u: 0.5, v: 0.1 })
        );
    }

    #[test]
    fn test_parse_custom_position_clamps() {
        assert_eq!(
            "custom:1.5,-0.2".parse::<Position>(),
            Ok(Position::Custom { u: 1.0, v: 0.0 })
        );
    }

    #[test]
    fn test_parse_invalid_position() {
        assert!("middle".parse::<Position>().is_err());
        assert!("custom:0.5".parse::<Position>().is_err());
        assert!("custom:abc,0.5".parse::<Position>().is_err());
        assert!("custom:NaN,0.5".parse::<Position>().is_err());
    }

    #[test]
    fn test_from_descriptor_falls_back_to_center() {
        assert_eq!(Position::from_descriptor("nowhere"), Position::default());
        assert_eq!(
            Position::from_descriptor("bottom-left"),
            Position::Anchor(Anchor::BottomLeft)
        );
    }

    #[test]
    fn test_custom_display_has_six_decimals() {
        let position = Position::custom(0.5, 1.0 / 3.0);
        assert_eq!(position.to_string(), "custom:0.500000,0.333333");
    }

    #[test]
    fn test_apply_partial_update() {
        let mut settings = WatermarkSettings::default();
        settings.apply(
            SettingsUpdate::new()
                .with_text("Hi")
                .with_size(20)
                .with_position(Anchor::BottomRight),
        );

        assert_eq!(settings.text, "Hi");
        assert_eq!(settings.size_pt, 20);
        assert_eq!(settings.position, Position::Anchor(Anchor::BottomRight));
        // untouched fields keep their values
        assert_eq!(settings.font_id, "Arial");
        assert_eq!(settings.opacity, 255);
    }

    #[test]
    fn test_apply_last_write_wins() {
        let mut settings = WatermarkSettings::default();
        settings.apply(SettingsUpdate::new().with_opacity(10));
        settings.apply(SettingsUpdate::new().with_opacity(200));
        assert_eq!(settings.opacity, 200);
    }

    #[test]
    fn test_update_with_bad_color_is_white() {
        let mut settings = WatermarkSettings::default();
        settings.apply(SettingsUpdate::new().with_color_str("#zzzzzz"));
        assert_eq!(settings.color, Color::white());
    }

    #[test]
    fn test_empty_update() {
        assert!(SettingsUpdate::new().is_empty());
        assert!(!SettingsUpdate::new().with_angle(15).is_empty());
    }

    #[test]
    fn test_settings_json_transport() {
        let mut settings = WatermarkSettings::default();
        settings.apply(
            SettingsUpdate::new()
                .with_color(Color::new(1, 2, 3))
                .with_position(Position::custom(0.25, 0.5)),
        );

        let json = settings.to_json().unwrap();
        assert!(json.contains("\"color\":\"#010203\""));
        assert!(json.contains("\"position\":\"custom:0.250000,0.500000\""));

        let parsed = WatermarkSettings::from_json(&json).unwrap();
        assert_eq!(parsed, settings);
    }

    #[test]
    fn test_settings_json_missing_fields_use_defaults() {
        let parsed = WatermarkSettings::from_json(r#"{"text":"Draft","color":"oops"}"#).unwrap();
        assert_eq!(parsed.text, "Draft");
        assert_eq!(parsed.color, Color::white());
        assert_eq!(parsed.size_pt, 36);
    }

    #[test]
    fn test_fill_carries_opacity() {
        let mut settings = WatermarkSettings::default();
        settings.apply(
            SettingsUpdate::new()
                .with_color(Color::new(10, 20, 30))
                .with_opacity(128),
        );
        assert_eq!(settings.fill(), image::Rgba([10, 20, 30, 128]));
    }

    #[test]
    fn test_full_update_from_settings() {
        let mut source = WatermarkSettings::default();
        source.apply(SettingsUpdate::new().with_text("Copy").with_angle(-45));

        let mut target = WatermarkSettings::default();
        target.apply(SettingsUpdate::new().with_size(99));
        target.apply(source.clone().into());
        assert_eq!(target, source);
    }

    #[test]
    fn test_control_ranges() {
        assert_eq!(*SIZE_RANGE.start(), 10);
        assert_eq!(*SIZE_RANGE.end(), 200);
        assert!(ANGLE_RANGE.contains(&-90));
        assert!(OPACITY_RANGE.contains(&0));
    }
}
