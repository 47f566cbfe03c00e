use image::{Rgba, RgbaImage};
use markit::watermark::{
    Anchor, FontRegistry, ImageDimensions, SessionState, SettingsUpdate, WatermarkSession,
};

const BACKGROUND: Rgba<u8> = Rgba([30, 60, 90, 255]);

fn session_with_image(width: u32, height: u32) -> WatermarkSession {
    let mut session = WatermarkSession::new(FontRegistry::builtin_only());
    session.load_image(RgbaImage::from_pixel(width, height, BACKGROUND));
    session
}

fn changed_pixels(image: &RgbaImage) -> Vec<(u32, u32)> {
    image
        .enumerate_pixels()
        .filter(|(_, _, pixel)| **pixel != BACKGROUND)
        .map(|(x, y, _)| (x, y))
        .collect()
}

#[test]
fn test_bottom_right_anchor_only_touches_bottom_right_quadrant() {
    let mut session = session_with_image(400, 300);
    session.update_settings(
        SettingsUpdate::new()
            .with_text("Hi")
            .with_size(20)
            .with_color_str("#ffffff")
            .with_opacity(255)
            .with_angle(0)
            .with_position(Anchor::BottomRight),
    );

    let baked = session.bake().unwrap().clone();
    assert_eq!(baked.dimensions(), (400, 300));

    let changed = changed_pixels(&baked);
    assert!(!changed.is_empty(), "watermark should change some pixels");
    assert!(changed.iter().all(|&(x, y)| x >= 200 && y >= 150));
}

#[test]
fn test_top_left_anchor_only_touches_top_left_quadrant() {
    let mut session = session_with_image(400, 300);
    session.update_settings(
        SettingsUpdate::new()
            .with_text("Hi")
            .with_size(20)
            .with_color_str("white")
            .with_position(Anchor::TopLeft),
    );

    let baked = session.bake().unwrap().clone();
    let changed = changed_pixels(&baked);
    assert!(!changed.is_empty());
    assert!(changed.iter().all(|&(x, y)| x < 200 && y < 150));
}

#[test]
fn test_zero_opacity_bake_is_identical_to_original() {
    let mut session = session_with_image(120, 80);
    session.update_settings(SettingsUpdate::new().with_text("Hidden").with_opacity(0));

    let baked = session.bake().unwrap().clone();
    assert_eq!(&baked, session.original().unwrap());
}

#[test]
fn test_empty_text_bake_is_identical_to_original() {
    let mut session = session_with_image(120, 80);
    session.update_settings(SettingsUpdate::new().with_text(""));

    let baked = session.bake().unwrap().clone();
    assert_eq!(&baked, session.original().unwrap());
}

#[test]
fn test_discard_then_bake_returns_original() {
    let mut session = session_with_image(200, 100);
    session.update_settings(SettingsUpdate::new().with_text("Draft").with_color_str("#fff"));
    session.preview().unwrap();
    assert_eq!(session.state(), SessionState::Previewing);

    session.discard();
    let baked = session.bake().unwrap().clone();
    assert_eq!(&baked, session.original().unwrap());
}

#[test]
fn test_bake_without_image_fails() {
    let mut session = WatermarkSession::new(FontRegistry::builtin_only());
    assert!(session.bake().is_err());
}

fn ink_center(image: &RgbaImage) -> Option<(f64, f64)> {
    let changed = changed_pixels(image);
    let (x0, x1) = changed.iter().fold((u32::MAX, 0), |(lo, hi), &(x, _)| (lo.min(x), hi.max(x)));
    let (y0, y1) = changed.iter().fold((u32::MAX, 0), |(lo, hi), &(_, y)| (lo.min(y), hi.max(y)));
    (!changed.is_empty()).then(|| ((x0 + x1 + 1) as f64 / 2.0, (y0 + y1 + 1) as f64 / 2.0))
}

#[test]
fn test_preview_placement_matches_bake_for_every_anchor() {
    let mut session = session_with_image(2000, 1500);

    for anchor in Anchor::ALL {
        session.update_settings(
            SettingsUpdate::new()
                .with_text("Hi")
                .with_size(80)
                .with_color_str("#ffffff")
                .with_position(anchor),
        );

        let frame = session.preview_in(ImageDimensions::new(400, 300)).unwrap();
        let ratio = frame.viewport.ratio;
        assert!((ratio - 0.2).abs() < 1e-12);
        let shown = frame.layer.unwrap().center();

        let baked = session.bake().unwrap().clone();
        let (bx, by) = ink_center(&baked).unwrap();

        let tolerance = 2.0 / ratio;
        assert!((shown.x / ratio - bx).abs() <= tolerance, "{anchor}: x {} vs {bx}", shown.x / ratio);
        assert!((shown.y / ratio - by).abs() <= tolerance, "{anchor}: y {} vs {by}", shown.y / ratio);
    }
}
