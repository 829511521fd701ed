use glam::Vec2;
use map_canvas::prelude::*;
use map_canvas_examples::{init_tracing, output_path, procedural_tile, rand01, scatter_points};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{info, warn};

/// Uses the font at `MAP_CANVAS_FONT` when set, block glyphs otherwise.
fn typesetter() -> Box<dyn Typesetter> {
    match std::env::var("MAP_CANVAS_FONT") {
        Ok(path) => match OutlineTypesetter::from_file(&path) {
            Ok(ts) => {
                info!("using font {path}");
                Box::new(ts)
            }
            Err(e) => {
                warn!("falling back to block glyphs: {e}");
                Box::new(BlockTypesetter::new())
            }
        },
        Err(_) => Box::new(BlockTypesetter::new()),
    }
}

fn main() -> anyhow::Result<()> {
    init_tracing();

    let viewport = Viewport::new(1024, 768);
    let view = WebMercatorView::new(LatLng::new(48.8566, 2.3522), 12.0, viewport);
    let mut rng = StdRng::seed_from_u64(0x5EED_CA11);

    let background = procedural_tile(1024, glam::IVec2::ZERO).resized(viewport.size());
    let mut scene = Scene::new().with_layer(DrawableLayer::pre_rendered("background", background));

    let styles = [
        CalloutStyle::default(),
        CalloutStyle::new()
            .with_fill_color([40, 44, 52, 235])
            .with_text_color([240, 240, 240, 255])
            .with_border([0, 0, 0, 160], 1.5)
            .with_corner_radius(12.0),
        CalloutStyle::new()
            .with_fill_color([255, 248, 220, 255])
            .with_padding(Padding::symmetric(16.0, 10.0))
            .with_line_height(20.0)
            .with_tail_size(14.0)
            .without_shadow(),
    ];

    let world_min = Vec2::new(120.0, 140.0);
    let world_max = Vec2::new(viewport.width as f32 - 120.0, viewport.height as f32 - 40.0);
    let points = scatter_points(&mut rng, 9, world_min, world_max);

    let mut callouts = Vec::new();
    for (i, p) in points.iter().enumerate() {
        let anchor = view.unproject(*p);
        let visitors = (rand01(&mut rng) * 5000.0) as u32;
        let content = match i % 3 {
            0 => format!("<b>Stop {i}</b><br>{visitors} visitors"),
            1 => format!("Stop {i}\nOpen 9&nbsp;-&nbsp;17<br><br>Tickets &amp; tours"),
            _ => format!("Stop {i}"),
        };
        callouts.push(
            Callout::new(format!("stop-{i}"), content)
                .with_anchor(anchor)
                .with_style(styles[i % styles.len()].clone()),
        );
    }
    // Callouts without an anchor are skipped under the default policy.
    callouts.push(Callout::new("orphan", "never drawn"));
    callouts.push(
        Callout::new("nudged", "Offset by the user")
            .with_anchor(view.center)
            .with_anchor_offset(Vec2::new(0.0, -4.0))
            .with_user_offset(Vec2::new(0.0, 60.0))
            .with_width(160.0),
    );

    let loader = FileImageLoader::new();
    let typesetter = typesetter();
    let renderer = MapRenderer::try_new(
        RenderConfig::new(viewport),
        &loader,
        &view,
        typesetter.as_ref(),
    )?;
    let mut sink = FnSink::new(|event| {
        if let RenderEvent::CalloutSkipped { id, reason } = event {
            warn!("callout {id} skipped: {reason}");
        }
    });
    let output = renderer.render_with_events(&mut scene, &callouts, &mut sink)?;
    info!(
        "painted {} callouts, skipped {}",
        output.callouts_painted, output.callouts_skipped
    );

    let out = output_path("callout-gallery.png")?;
    output.raster.save_png(&out)?;
    info!("wrote {}", out.display());
    Ok(())
}
