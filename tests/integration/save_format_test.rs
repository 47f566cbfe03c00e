use image::{Rgba, RgbaImage};
use markit::watermark::{
    FontRegistry, SessionState, SettingsUpdate, WatermarkError, WatermarkSession,
};
use tempfile::TempDir;

fn translucent_session() -> WatermarkSession {
    let mut session = WatermarkSession::new(FontRegistry::builtin_only());
    session.load_image(RgbaImage::from_pixel(64, 48, Rgba([10, 20, 30, 128])));
    session.update_settings(SettingsUpdate::new().with_text("Hi").with_size(12));
    session
}

#[test]
fn test_jpeg_output_has_no_alpha() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("out.jpg");
    let mut session = translucent_session();

    session.bake_and_save(&path).unwrap();
    assert_eq!(session.state(), SessionState::Saved);

    let decoded = image::open(&path).unwrap();
    assert!(!decoded.color().has_alpha());
    assert_eq!((decoded.width(), decoded.height()), (64, 48));
}

#[test]
fn test_png_output_keeps_alpha() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("out.png");
    let mut session = translucent_session();

    session.bake_and_save(&path).unwrap();

    let decoded = image::open(&path).unwrap().to_rgba8();
    assert_eq!(decoded.get_pixel(0, 0)[3], 128);
}

#[test]
fn test_saved_file_can_be_loaded_again() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("round.png");
    let mut session = translucent_session();
    session.bake_and_save(&path).unwrap();

    let mut reopened = WatermarkSession::new(FontRegistry::builtin_only());
    reopened.load(&path).unwrap();
    assert_eq!(reopened.state(), SessionState::Loaded);
    assert_eq!(reopened.original(), session.baked());
    assert_eq!(reopened.suggested_output_name(), "watermarked_round.png");
}

#[test]
fn test_unknown_extension_fails_and_keeps_session() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("out.xyz");
    let mut session = translucent_session();

    let err = session.bake_and_save(&path).unwrap_err();
    assert!(matches!(err, WatermarkError::UnsupportedFormat(_)));
    assert!(!path.exists());
    assert!(session.original().is_some());
    assert_eq!(session.settings().text, "Hi");
    assert_ne!(session.state(), SessionState::Saved);
}

#[test]
fn test_load_missing_file_fails() {
    let mut session = WatermarkSession::new(FontRegistry::builtin_only());
    let err = session.load("/nonexistent/photo.png").unwrap_err();
    assert!(matches!(err, WatermarkError::LoadFailed(_)));
    assert_eq!(session.state(), SessionState::Empty);
}
