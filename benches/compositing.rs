use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use image::{ImageFormat, Rgba, RgbaImage};
use std::io::Cursor;

use selo::assets::WatermarkOptions;
use selo::batch::{watermark_image, BatchJob};
use selo::compositor;
use selo::placement::{self, Corner, PixelSize, PlacementSpec};
use selo::raster::{CompressionLevel, OutputFormat, RasterImage};

fn create_bench_image(width: u32, height: u32) -> RgbaImage {
    let mut img = RgbaImage::new(width, height);
    for (x, y, pixel) in img.enumerate_pixels_mut() {
        *pixel = Rgba([(x % 255) as u8, (y % 255) as u8, ((x + y) % 255) as u8, 255]);
    }
    img
}

fn create_bench_png(width: u32, height: u32) -> Vec<u8> {
    let mut buffer = Cursor::new(Vec::new());
    image::DynamicImage::ImageRgba8(create_bench_image(width, height))
        .write_to(&mut buffer, ImageFormat::Png)
        .unwrap();
    buffer.into_inner()
}

fn bench_compositing(c: &mut Criterion) {
    let base = RasterImage::from_surface(create_bench_image(1920, 1080));
    let logo = RasterImage::from_surface(create_bench_image(256, 128));
    let options = WatermarkOptions::default();
    let spec = PlacementSpec::Anchored {
        corner: Corner::BottomRight,
        margin_fraction: 0.02,
    };

    let mut group = c.benchmark_group("compositing");
    group.sample_size(10); // Image ops are slow, reduce sample size

    group.bench_function("composite_1080p_bottom_right", |b| {
        b.iter(|| {
            let resolved = placement::resolve(
                PixelSize::new(base.width(), base.height()),
                PixelSize::new(logo.width(), logo.height()),
                black_box(&spec),
                black_box(&options),
            );
            compositor::composite(black_box(&base), black_box(&logo), &resolved, 0.8).unwrap();
        })
    });

    group.finish();
}

fn bench_full_pipeline(c: &mut Criterion) {
    let input = create_bench_png(1920, 1080);
    let job = BatchJob {
        logo: Arc::new(RasterImage::from_surface(create_bench_image(256, 128))),
        placement: PlacementSpec::default(),
        options: WatermarkOptions::default(),
        format: OutputFormat::Png,
        compression: CompressionLevel::Fast,
    };

    let mut group = c.benchmark_group("pipeline");
    group.sample_size(10);

    group.bench_function("decode_composite_encode_1080p", |b| {
        b.iter(|| watermark_image(black_box(&job), "bench.png", black_box(&input)).unwrap())
    });

    group.finish();
}

criterion_group!(benches, bench_compositing, bench_full_pipeline);
criterion_main!(benches);
