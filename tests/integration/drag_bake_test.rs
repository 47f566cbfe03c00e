use image::{Rgba, RgbaImage};
use markit::watermark::{
    DragController, FontRegistry, ImageDimensions, Point, Position, SettingsUpdate,
    WatermarkSession,
};

const BACKGROUND: Rgba<u8> = Rgba([0, 0, 0, 255]);

fn ink_bbox_center(image: &RgbaImage) -> Option<(f64, f64)> {
    let mut bounds: Option<(u32, u32, u32, u32)> = None;
    for (x, y, pixel) in image.enumerate_pixels() {
        if *pixel == BACKGROUND {
            continue;
        }
        bounds = Some(match bounds {
            None => (x, y, x, y),
            Some((x0, y0, x1, y1)) => (x0.min(x), y0.min(y), x1.max(x), y1.max(y)),
        });
    }
    bounds.map(|(x0, y0, x1, y1)| ((x0 + x1 + 1) as f64 / 2.0, (y0 + y1 + 1) as f64 / 2.0))
}

#[test]
fn test_drag_on_preview_moves_baked_watermark() {
    let mut session = WatermarkSession::new(FontRegistry::builtin_only());
    session.load_image(RgbaImage::from_pixel(800, 600, BACKGROUND));
    session.update_settings(
        SettingsUpdate::new()
            .with_text("Hi")
            .with_size(36)
            .with_color_str("#ffffff"),
    );

    let frame = session.preview_in(ImageDimensions::new(400, 300)).unwrap();
    assert_eq!(frame.viewport.ratio, 0.5);
    assert!(frame.hit_test(Point::new(200.0, 150.0)));

    let mut drag = DragController::new();
    assert!(drag.begin(Point::new(200.0, 150.0), &frame));
    drag.drag_to(Point::new(250.0, 180.0), &frame).unwrap();
    let position = drag.end(&frame).unwrap();

    let Position::Custom { u, v } = position else {
        panic!("expected a custom position, got {position:?}");
    };
    assert!((u - 0.625).abs() < 0.01, "u = {u}");
    assert!((v - 0.6).abs() < 0.01, "v = {v}");

    session.update_settings(SettingsUpdate::new().with_position(position));
    let baked = session.bake().unwrap().clone();

    let (cx, cy) = ink_bbox_center(&baked).expect("watermark should be drawn");
    assert!((cx - 500.0).abs() <= 3.0, "center x = {cx}");
    assert!((cy - 360.0).abs() <= 3.0, "center y = {cy}");
}

#[test]
fn test_drag_is_clamped_to_displayed_image() {
    let mut session = WatermarkSession::new(FontRegistry::builtin_only());
    session.load_image(RgbaImage::from_pixel(800, 600, BACKGROUND));
    session.update_settings(SettingsUpdate::new().with_text("Hi").with_color_str("#fff"));

    let frame = session.preview_in(ImageDimensions::new(400, 300)).unwrap();
    let layer = frame.layer.unwrap();

    let mut drag = DragController::new();
    assert!(drag.begin(layer.center(), &frame));
    let center = drag.drag_to(Point::new(5000.0, -5000.0), &frame).unwrap();

    assert!(center.x + layer.width as f64 / 2.0 <= 400.5);
    assert!(center.y - layer.height as f64 / 2.0 >= -0.5);
}

#[test]
fn test_preview_is_letterboxed_in_wide_canvas() {
    let mut session = WatermarkSession::new(FontRegistry::builtin_only());
    session.load_image(RgbaImage::from_pixel(400, 400, BACKGROUND));

    let frame = session.preview_in(ImageDimensions::new(800, 400)).unwrap();
    assert_eq!(frame.image.dimensions(), (400, 400));
    assert_eq!(frame.viewport.offset_x, 200);
    assert_eq!(frame.viewport.offset_y, 0);

    // Layer rect is in canvas coordinates.
    let layer = frame.layer.unwrap();
    assert!(layer.x >= 200);
}
