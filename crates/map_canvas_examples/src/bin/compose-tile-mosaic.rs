use std::sync::Arc;

use glam::{IVec2, UVec2};
use map_canvas::prelude::*;
use map_canvas_examples::{init_tracing, output_path, procedural_tile, write_marker_png};
use tracing::info;

fn main() -> anyhow::Result<()> {
    init_tracing();

    let viewport = Viewport::new(900, 600);
    let view = WebMercatorView::new(LatLng::new(40.7128, -74.0060), 13.0, viewport);

    // Tiles covering the viewport at the view's integer zoom.
    let mut scene = Scene::new();
    let origin = view.pixel_origin();
    let first = (origin / view.tile_size).floor().as_ivec2();
    let last = ((origin + viewport.size().as_dvec2()) / view.tile_size)
        .floor()
        .as_ivec2();
    for ty in first.y..=last.y {
        for tx in first.x..=last.x {
            let tile = Arc::new(procedural_tile(256, IVec2::new(tx, ty)));
            let offset = view.tile_origin(tx as i64, ty as i64).round().as_ivec2();
            scene.push(
                DrawableLayer::pre_rendered(format!("tile/{tx}/{ty}"), tile)
                    .with_style_offset(offset),
            );
        }
    }

    // Marker icons are real PNG files decoded through the file loader.
    let marker_path = output_path("marker-red.png")?;
    write_marker_png(&marker_path, [215, 40, 40, 255])?;
    let marker = marker_path.to_string_lossy().into_owned();
    let places = [
        ("city-hall", LatLng::new(40.7127, -74.0059)),
        ("brooklyn-bridge", LatLng::new(40.7061, -73.9969)),
        ("washington-sq", LatLng::new(40.7308, -73.9973)),
    ];
    for (id, latlng) in places {
        let p = view.project(latlng);
        // Pin tip sits at the bottom center of the 25x41 icon.
        let offset = IVec2::new(p.x.round() as i32 - 12, p.y.round() as i32 - 41);
        scene.push(DrawableLayer::image_asset(id, marker.as_str()).with_style_offset(offset));
    }

    // A missing icon is skipped, not fatal.
    scene.push(
        DrawableLayer::image_asset("missing-icon", "does/not/exist.png")
            .with_layout_offset(IVec2::new(20, 20)),
    );

    // A half-transparent scaled overlay on top.
    scene.push(
        DrawableLayer::pre_rendered("haze", Raster::filled(4, 4, [255, 255, 255, 60]))
            .with_style_offset(IVec2::new(0, viewport.height as i32 - 80))
            .with_size(UVec2::new(viewport.width, 80)),
    );

    let loader = FileImageLoader::new();
    let mut sink = VecSink::new();
    let raster =
        Compositor::new(&loader).composite_with_events(viewport, &mut scene, &mut sink)?;

    for event in sink.of_kind(RenderEventKind::LayerSkipped) {
        if let RenderEvent::LayerSkipped { id, reason, .. } = event {
            info!("skipped {id}: {reason}");
        }
    }

    let out = output_path("compose-tile-mosaic.png")?;
    raster.save_png(&out)?;
    info!("wrote {}", out.display());
    Ok(())
}
