use criterion::{black_box, criterion_group, criterion_main, Criterion};
use image::{Rgba, RgbaImage};
use markit::watermark::{
    Anchor, FontRegistry, ImageDimensions, SettingsUpdate, WatermarkSession,
};

fn create_bench_image(width: u32, height: u32) -> RgbaImage {
    RgbaImage::from_fn(width, height, |x, y| {
        Rgba([(x % 255) as u8, (y % 255) as u8, ((x + y) % 255) as u8, 255])
    })
}

fn bench_session() -> WatermarkSession {
    let mut session = WatermarkSession::new(FontRegistry::builtin_only());
    session.load_image(create_bench_image(1920, 1080));
    session.update_settings(
        SettingsUpdate::new()
            .with_text("© 2024 Studio")
            .with_size(48)
            .with_color_str("#ffffff")
            .with_opacity(180)
            .with_position(Anchor::BottomRight),
    );
    session
}

fn bench_compositing(c: &mut Criterion) {
    let mut group = c.benchmark_group("compositing");
    group.sample_size(10); // Full-resolution composites are slow

    let mut session = bench_session();
    group.bench_function("preview_1080p_in_960x720", |b| {
        b.iter(|| {
            session
                .preview_in(black_box(ImageDimensions::new(960, 720)))
                .unwrap();
        })
    });

    let mut session = bench_session();
    group.bench_function("bake_1080p", |b| {
        b.iter(|| {
            black_box(session.bake().unwrap());
        })
    });

    let mut session = bench_session();
    session.update_settings(SettingsUpdate::new().with_angle(30));
    group.bench_function("bake_1080p_rotated", |b| {
        b.iter(|| {
            black_box(session.bake().unwrap());
        })
    });

    group.finish();
}

criterion_group!(benches, bench_compositing);
criterion_main!(benches);
