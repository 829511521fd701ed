use map_canvas::prelude::*;
use map_canvas_examples::{init_tracing, output_path};
use tracing::info;

fn main() -> anyhow::Result<()> {
    init_tracing();

    let viewport = Viewport::new(320, 200);
    let view = WebMercatorView::new(LatLng::new(0.0, 0.0), 2.0, viewport);
    let loader = FileImageLoader::new();
    let typesetter = BlockTypesetter::new();
    let renderer = MapRenderer::try_new(RenderConfig::new(viewport), &loader, &view, &typesetter)?;

    // No layers at all: the compositor inserts a transparent placeholder and removes it again.
    let mut scene = Scene::new();
    let callouts = [Callout::new("null-island", "Null Island<br>lat 0, lng 0")
        .with_anchor(LatLng::new(0.0, 0.0))];
    let mut sink = VecSink::new();
    let output = renderer.render_with_events(&mut scene, &callouts, &mut sink)?;

    for event in sink.as_slice() {
        info!("{:?}", event.kind());
    }
    info!("scene has {} layer(s) after rendering", scene.len());

    let out = output_path("empty-scene-placeholder.png")?;
    output.raster.save_png(&out)?;
    info!("wrote {}", out.display());
    Ok(())
}
