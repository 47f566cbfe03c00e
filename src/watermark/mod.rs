//! Text watermarking for still images.
//!
//! The engine renders a line of text as a transparent layer, places it on the
//! image by anchor or by a fractional point, and blends it in. The same
//! compositing path drives the scaled interactive preview and the
//! full-resolution bake, so what the preview shows is what gets saved.
//!
//! # Pieces
//!
//! - [`settings`]: the editable parameters and their textual forms
//! - [`position`]: anchor and custom-point geometry, padding, paste clamping
//! - [`font`]: font id to face lookup with a built-in fallback face
//! - [`text_renderer`]: glyph rasterization, padding and rotation
//! - [`compositor`]: layer placement and "over" blending
//! - [`preview`]: fit-to-canvas viewport and preview scaling
//! - [`drag`]: pointer-driven repositioning on the preview
//! - [`session`]: load, preview, bake, save, discard, reset
//! - [`image_io`]: decoding and extension-driven encoding
//!
//! # Example
//!
//! ```no_run
//! use markit::watermark::{Anchor, FontRegistry, SettingsUpdate, WatermarkSession};
//!
//! let mut session = WatermarkSession::new(FontRegistry::default());
//! session.load("photo.jpg")?;
//! session.update_settings(
//!     SettingsUpdate::new()
//!         .with_text("© 2024 Studio")
//!         .with_color_str("#ffffff")
//!         .with_opacity(180)
//!         .with_position(Anchor::BottomRight),
//! );
//! session.bake_and_save("photo_marked.jpg")?;
//! # Ok::<(), markit::watermark::WatermarkError>(())
//! ```

pub mod compositor;
pub mod drag;
pub mod error;
pub mod font;
pub mod image_io;
pub mod position;
pub mod preview;
pub mod session;
pub mod settings;
pub mod text_renderer;

// Re-export main types for convenience
pub use compositor::{Composite, Compositor, WatermarkLayer};
pub use drag::DragController;
pub use error::WatermarkError;
pub use font::{FontFace, FontRegistry};
pub use image_io::{load_image, save_image, OutputFormat};
pub use position::{
    paste_origin, resolve_center, to_normalized, ImageDimensions, LayerRect, Padding,
    PlacementPosition, Point, WatermarkDimensions,
};
pub use preview::{PreviewFrame, Viewport};
pub use session::{SessionState, WatermarkSession};
pub use settings::{
    parse_color, Anchor, Color, Position, SettingsUpdate, WatermarkSettings, ANGLE_RANGE,
    OPACITY_RANGE, SIZE_RANGE,
};
pub use text_renderer::{measure_text, render_text, RenderedTextLayer, TextRenderOptions};
