mod common;

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};
use map_canvas::prelude::{
    layout, normalize_lines, paint, BlockTypesetter, Callout, LatLng, Raster, Viewport,
    WebMercatorView,
};

fn callouts(view: &WebMercatorView, count: usize) -> Vec<Callout> {
    (0..count)
        .map(|i| {
            let lat = view.center.lat + ((i % 10) as f64 - 5.0) * 0.002;
            let lng = view.center.lng + ((i / 10) as f64 - 5.0) * 0.003;
            Callout::new(
                format!("poi_{i}"),
                format!("<b>Point {i}</b><br>Opening hours&nbsp;9-17<br/>Row {}", i % 7),
            )
            .with_anchor(LatLng::new(lat, lng))
        })
        .collect()
}

fn bench_text(c: &mut Criterion) {
    let content = "  First line &amp; more  \nSecond<br><br>Third <i>styled</i> line  ";
    let mut group = c.benchmark_group("callout_text");
    group.throughput(common::elements_throughput(1));
    group.bench_function("normalize_lines", |b| {
        b.iter(|| black_box(normalize_lines(black_box(content))));
    });
    group.finish();
}

fn bench_layout_and_paint(c: &mut Criterion) {
    let viewport = Viewport::new(1024, 768);
    let view = WebMercatorView::new(LatLng::new(48.8566, 2.3522), 14.0, viewport);
    let typesetter = BlockTypesetter::new();
    let items = callouts(&view, 100);

    let mut group = c.benchmark_group("callout");
    group.throughput(common::elements_throughput(items.len()));

    group.bench_function("layout_100", |b| {
        b.iter(|| {
            for item in &items {
                let l = layout(viewport, item, &view, &typesetter).expect("layout");
                black_box(l.box_width);
            }
        });
    });

    let layouts: Vec<_> = items
        .iter()
        .map(|item| layout(viewport, item, &view, &typesetter).expect("layout"))
        .collect();
    let base = Raster::filled(viewport.width, viewport.height, [220, 225, 230, 255]);
    group.bench_function("paint_100", |b| {
        b.iter(|| {
            let mut raster = base.clone();
            for (item, l) in items.iter().zip(&layouts) {
                paint(&mut raster, l, &item.style, &typesetter);
            }
            black_box(raster.pixel(0, 0));
        });
    });

    group.finish();
}

fn benches_all(c: &mut Criterion) {
    bench_text(c);
    bench_layout_and_paint(c);
}

criterion_group! {
    name = benches;
    config = common::default_criterion();
    targets = benches_all
}
criterion_main!(benches);
