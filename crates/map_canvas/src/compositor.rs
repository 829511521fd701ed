//! Layer compositor: merges a scene's drawable layers into one viewport-sized raster.
//!
//! Layers are resolved first (concurrently when enabled), then blended strictly in scene order,
//! so the output does not depend on which decode finishes first. A layer whose image cannot be
//! decoded is logged, reported through the [`EventSink`] and left out; every other error aborts
//! the pass.
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::events::{CompositeSummary, EventSink, RenderEvent, RenderEventKind};
use crate::geometry::Viewport;
use crate::raster::Raster;
use crate::resolve::{ImageLoader, Resolver};
use crate::scene::{DrawableLayer, PlaceholderGuard, SceneSource};

/// Flattens scenes into rasters.
#[derive(Clone, Copy)]
pub struct Compositor<'a> {
    resolver: Resolver<'a>,
    parallel: bool,
}

impl<'a> Compositor<'a> {
    /// Creates a compositor; concurrent resolution is on when the `parallel` feature is enabled.
    pub fn new(loader: &'a dyn ImageLoader) -> Self {
        Self {
            resolver: Resolver::new(loader),
            parallel: cfg!(feature = "parallel"),
        }
    }

    /// Enables or disables concurrent image asset resolution.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn resolver(&self) -> &Resolver<'a> {
        &self.resolver
    }

    /// Composites all layers of `scene` into a new raster of `viewport` size.
    pub fn composite<S>(&self, viewport: Viewport, scene: &mut S) -> Result<Raster>
    where
        S: SceneSource + ?Sized,
    {
        self.composite_with_events(viewport, scene, &mut ())
    }

    /// Like [`Compositor::composite`], reporting progress and skipped layers to `sink`.
    pub fn composite_with_events<S>(
        &self,
        viewport: Viewport,
        scene: &mut S,
        sink: &mut dyn EventSink,
    ) -> Result<Raster>
    where
        S: SceneSource + ?Sized,
    {
        viewport.validate()?;
        let mut output = Raster::for_viewport(viewport);
        let mut summary = CompositeSummary::default();

        let layer_count = scene.layers().len();
        if sink.wants(RenderEventKind::CompositeStarted) {
            sink.send(RenderEvent::CompositeStarted {
                viewport,
                layer_count,
            });
        }

        if layer_count == 0 {
            summary.used_placeholder = true;
            let guard = PlaceholderGuard::insert(scene, viewport);
            if sink.wants(RenderEventKind::PlaceholderInserted) {
                sink.send(RenderEvent::PlaceholderInserted {
                    id: guard.id().cloned(),
                });
            }
            if guard.layers().is_empty() {
                warn!("Scene is still empty after inserting a placeholder.");
                return Err(Error::EmptyScene);
            }
            self.blend_layers(&mut output, guard.layers(), sink, &mut summary)?;
        } else {
            self.blend_layers(&mut output, scene.layers(), sink, &mut summary)?;
        }

        info!(
            "Composited {} layer(s) into {}x{} ({} skipped).",
            summary.layers_composited, viewport.width, viewport.height, summary.layers_skipped
        );
        if sink.wants(RenderEventKind::CompositeFinished) {
            sink.send(RenderEvent::CompositeFinished { summary });
        }
        Ok(output)
    }

    fn blend_layers(
        &self,
        output: &mut Raster,
        layers: &[DrawableLayer],
        sink: &mut dyn EventSink,
        summary: &mut CompositeSummary,
    ) -> Result<()> {
        let viewport = Viewport::new(output.width(), output.height());
        let resolved = self.resolver.resolve_all(layers, self.parallel);

        for (index, (layer, result)) in layers.iter().zip(resolved).enumerate() {
            let raster = match result {
                Ok(raster) => raster,
                Err(e) if e.is_recoverable_layer_failure() => {
                    warn!("Skipping layer '{}': {}", layer.id, e);
                    summary.layers_skipped += 1;
                    if sink.wants(RenderEventKind::LayerSkipped) {
                        sink.send(RenderEvent::LayerSkipped {
                            index,
                            id: layer.id.clone(),
                            reason: e.to_string(),
                        });
                    }
                    continue;
                }
                Err(e) => return Err(e),
            };

            let position = layer.draw_position();
            let size = layer.draw_size(raster.size());
            if size.x == 0 || size.y == 0 || raster.is_empty() {
                warn!("Layer '{}' has zero draw area; skipping.", layer.id);
                if sink.wants(RenderEventKind::Warning) {
                    sink.send(RenderEvent::Warning {
                        context: format!("layer:{}", layer.id),
                        message: format!("zero draw area {}x{}", size.x, size.y),
                    });
                }
                continue;
            }

            if viewport.intersects(position, size) {
                output.blend_scaled(&raster, position, size);
            } else {
                debug!("Layer '{}' lies outside the viewport.", layer.id);
            }
            summary.layers_composited += 1;

            if sink.wants(RenderEventKind::LayerComposited) {
                sink.send(RenderEvent::LayerComposited {
                    index,
                    id: layer.id.clone(),
                    kind: layer.kind(),
                    position,
                    size,
                });
            }
        }
        Ok(())
    }
}

/// Composites `scene` with a default [`Compositor`].
pub fn composite<S>(viewport: Viewport, scene: &mut S, loader: &dyn ImageLoader) -> Result<Raster>
where
    S: SceneSource + ?Sized,
{
    Compositor::new(loader).composite(viewport, scene)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use glam::{IVec2, UVec2};

    use super::*;
    use crate::events::VecSink;
    use crate::scene::{LayerId, Scene, SourceLocator};

    const RED: [u8; 4] = [255, 0, 0, 255];
    const BLUE: [u8; 4] = [0, 0, 255, 255];

    #[derive(Default)]
    struct MemoryLoader {
        images: HashMap<String, Raster>,
        calls: AtomicUsize,
    }

    impl MemoryLoader {
        fn with(mut self, locator: &str, raster: Raster) -> Self {
            self.images.insert(locator.into(), raster);
            self
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl ImageLoader for MemoryLoader {
        fn load(&self, locator: &SourceLocator) -> Result<Raster> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let key = locator.to_string();
            self.images.get(&key).cloned().ok_or(Error::Decode {
                locator: key,
                reason: "not found".into(),
            })
        }
    }

    /// Scene that can never host a placeholder.
    #[derive(Default)]
    struct BarrenScene {
        hand_out_id: bool,
        removed: Vec<String>,
    }

    impl SceneSource for BarrenScene {
        fn layers(&self) -> &[DrawableLayer] {
            &[]
        }

        fn insert_placeholder(&mut self, _viewport: Viewport) -> Option<LayerId> {
            self.hand_out_id.then(|| "ghost".to_string())
        }

        fn remove_placeholder(&mut self, id: &str) {
            self.removed.push(id.to_string());
        }
    }

    fn sample_scene() -> Scene {
        Scene::new()
            .with_layer(DrawableLayer::pre_rendered(
                "base",
                Raster::filled(8, 8, [40, 80, 120, 255]),
            ))
            .with_layer(
                DrawableLayer::image_asset("pin", "pin.png").with_style_offset(IVec2::new(2, 1)),
            )
            .with_layer(
                DrawableLayer::pre_rendered("veil", Raster::filled(4, 4, [255, 255, 255, 100]))
                    .with_layout_offset(IVec2::new(5, 5)),
            )
    }

    #[test]
    fn output_matches_viewport_even_with_out_of_bounds_layers() {
        let loader = MemoryLoader::default();
        let mut scene = Scene::new()
            .with_layer(
                DrawableLayer::pre_rendered("far", Raster::filled(3, 3, RED))
                    .with_style_offset(IVec2::new(100, -50)),
            )
            .with_layer(
                DrawableLayer::pre_rendered("left", Raster::filled(3, 3, RED))
                    .with_style_offset(IVec2::new(-10, 0)),
            );
        let mut sink = VecSink::new();
        let out = Compositor::new(&loader)
            .composite_with_events(Viewport::new(7, 5), &mut scene, &mut sink)
            .expect("composite");
        assert_eq!(out.size(), UVec2::new(7, 5));
        assert_eq!(out.as_raw().len(), 7 * 5 * 4);
        assert!(out.as_raw().iter().all(|b| *b == 0));
        assert_eq!(sink.of_kind(RenderEventKind::LayerComposited).count(), 2);
    }

    #[test]
    fn compositing_is_deterministic_across_modes() {
        let loader =
            MemoryLoader::default().with("pin.png", Raster::filled(3, 5, [0, 200, 0, 180]));
        let viewport = Viewport::new(8, 8);

        let mut scene = sample_scene();
        let first = Compositor::new(&loader)
            .with_parallel(false)
            .composite(viewport, &mut scene)
            .expect("sequential");

        let mut fresh = sample_scene();
        let second = Compositor::new(&loader)
            .with_parallel(true)
            .composite(viewport, &mut fresh)
            .expect("parallel");
        let third = Compositor::new(&loader)
            .composite(viewport, &mut fresh)
            .expect("again");

        assert_eq!(first.as_raw(), second.as_raw());
        assert_eq!(second.as_raw(), third.as_raw());
    }

    /// Loader whose latency varies per locator, so concurrent decodes finish out of order.
    struct StaggeredLoader {
        count: usize,
        calls: Vec<AtomicUsize>,
    }

    impl StaggeredLoader {
        fn new(count: usize) -> Self {
            Self {
                count,
                calls: (0..count).map(|_| AtomicUsize::new(0)).collect(),
            }
        }

        fn locator(i: usize) -> String {
            format!("asset-{i}.png")
        }
    }

    impl ImageLoader for StaggeredLoader {
        fn load(&self, locator: &SourceLocator) -> Result<Raster> {
            let key = locator.to_string();
            let i = (0..self.count)
                .find(|i| Self::locator(*i) == key)
                .ok_or_else(|| Error::from(format!("unknown locator {key}")))?;
            self.calls[i].fetch_add(1, Ordering::SeqCst);
            // Earlier layers sleep longest.
            let delay = ((self.count - i) * 3) as u64;
            std::thread::sleep(std::time::Duration::from_millis(delay));
            let i = i as u8;
            let color = [
                i.wrapping_mul(37),
                255 - i.wrapping_mul(23),
                i.wrapping_mul(71),
                60 + i * 10,
            ];
            Ok(Raster::filled(5, 5, color))
        }
    }

    fn staggered_scene(count: usize) -> Scene {
        let layers = (0..count)
            .map(|i| {
                DrawableLayer::image_asset(format!("l{i}"), StaggeredLoader::locator(i).as_str())
                    .with_style_offset(IVec2::new((i % 4) as i32, (i / 4) as i32))
            })
            .collect();
        Scene::new().with_layers(layers)
    }

    #[test]
    fn concurrent_resolution_matches_sequential_output() {
        const COUNT: usize = 12;
        let viewport = Viewport::new(9, 9);

        let sequential_loader = StaggeredLoader::new(COUNT);
        let sequential = Compositor::new(&sequential_loader)
            .with_parallel(false)
            .composite(viewport, &mut staggered_scene(COUNT))
            .expect("sequential");

        let parallel_loader = StaggeredLoader::new(COUNT);
        let parallel = Compositor::new(&parallel_loader)
            .with_parallel(true)
            .composite(viewport, &mut staggered_scene(COUNT))
            .expect("parallel");

        assert_eq!(sequential.as_raw(), parallel.as_raw());
        for loader in [&sequential_loader, &parallel_loader] {
            assert!(loader.calls.iter().all(|c| c.load(Ordering::SeqCst) == 1));
        }
    }

    #[test]
    fn image_asset_is_fetched_once_across_passes() {
        let loader = MemoryLoader::default().with("pin.png", Raster::filled(2, 2, RED));
        let mut scene = sample_scene();
        let compositor = Compositor::new(&loader);
        compositor
            .composite(Viewport::new(8, 8), &mut scene)
            .expect("first");
        compositor
            .composite(Viewport::new(8, 8), &mut scene)
            .expect("second");
        assert_eq!(loader.calls(), 1);
    }

    #[test]
    fn empty_scene_uses_placeholder_and_cleans_up() {
        let loader = MemoryLoader::default();
        let mut scene = Scene::new();
        let mut sink = VecSink::new();
        let out = Compositor::new(&loader)
            .composite_with_events(Viewport::new(4, 3), &mut scene, &mut sink)
            .expect("placeholder path");
        assert_eq!(out.size(), UVec2::new(4, 3));
        assert!(out.as_raw().iter().all(|b| *b == 0));
        assert!(scene.is_empty());
        assert_eq!(sink.of_kind(RenderEventKind::PlaceholderInserted).count(), 1);
        let finished = sink
            .of_kind(RenderEventKind::CompositeFinished)
            .next()
            .expect("finished event");
        assert!(matches!(
            finished,
            RenderEvent::CompositeFinished { summary } if summary.used_placeholder
        ));
    }

    #[test]
    fn scene_that_stays_empty_is_an_error() {
        let loader = MemoryLoader::default();
        let mut scene = BarrenScene::default();
        let err = composite(Viewport::new(4, 4), &mut scene, &loader).expect_err("empty");
        assert!(matches!(err, Error::EmptyScene));
        assert!(scene.removed.is_empty());
    }

    #[test]
    fn placeholder_handle_is_released_even_on_failure() {
        let loader = MemoryLoader::default();
        let mut scene = BarrenScene {
            hand_out_id: true,
            removed: Vec::new(),
        };
        let err = composite(Viewport::new(4, 4), &mut scene, &loader).expect_err("empty");
        assert!(matches!(err, Error::EmptyScene));
        assert_eq!(scene.removed, vec!["ghost".to_string()]);
    }

    #[test]
    fn single_full_viewport_layer_is_reproduced() {
        let loader = MemoryLoader::default();
        let mut source = Raster::new(5, 4);
        source.blend_over(&Raster::filled(2, 2, [10, 20, 30, 77]), IVec2::new(1, 1));
        source.blend_over(&Raster::filled(1, 4, BLUE), IVec2::new(4, 0));
        let mut scene =
            Scene::new().with_layer(DrawableLayer::pre_rendered("only", source.clone()));
        let out = Compositor::new(&loader)
            .composite(Viewport::new(5, 4), &mut scene)
            .expect("composite");
        assert_eq!(out, source);
    }

    #[test]
    fn failing_middle_layer_is_skipped_and_recorded() {
        let loader = MemoryLoader::default();
        let mut scene = Scene::new()
            .with_layer(DrawableLayer::pre_rendered("first", Raster::filled(4, 4, RED)))
            .with_layer(DrawableLayer::image_asset("second", "missing.png"))
            .with_layer(
                DrawableLayer::pre_rendered("third", Raster::filled(2, 2, BLUE))
                    .with_style_offset(IVec2::new(2, 2)),
            );
        let mut sink = VecSink::new();
        let out = Compositor::new(&loader)
            .composite_with_events(Viewport::new(4, 4), &mut scene, &mut sink)
            .expect("partial failure is not fatal");

        assert_eq!(out.pixel(0, 0), Some(RED));
        assert_eq!(out.pixel(3, 3), Some(BLUE));
        assert_eq!(out.pixel(1, 3), Some(RED));

        let skipped: Vec<_> = sink.of_kind(RenderEventKind::LayerSkipped).collect();
        assert_eq!(skipped.len(), 1);
        assert!(matches!(
            skipped[0],
            RenderEvent::LayerSkipped { index: 1, id, reason }
                if id == "second" && reason.contains("missing.png")
        ));
    }

    #[test]
    fn unsupported_layer_aborts_the_pass() {
        let loader = MemoryLoader::default();
        let mut scene = Scene::new()
            .with_layer(DrawableLayer::pre_rendered("base", Raster::filled(2, 2, RED)))
            .with_layer(DrawableLayer::foreign("clip", "video"));
        let err = composite(Viewport::new(2, 2), &mut scene, &loader).expect_err("fatal");
        assert!(matches!(err, Error::UnsupportedLayer { ref id, .. } if id == "clip"));
    }

    #[test]
    fn size_override_resamples_layer() {
        let loader = MemoryLoader::default().with("pin.png", Raster::filled(2, 2, BLUE));
        let mut scene = Scene::new().with_layer(
            DrawableLayer::image_asset("pin", "pin.png")
                .with_style_offset(IVec2::new(1, 1))
                .with_size(UVec2::new(3, 3)),
        );
        let out = Compositor::new(&loader)
            .composite(Viewport::new(5, 5), &mut scene)
            .expect("composite");
        assert_eq!(out.pixel(0, 0), Some([0, 0, 0, 0]));
        assert_eq!(out.pixel(1, 1), Some(BLUE));
        assert_eq!(out.pixel(3, 3), Some(BLUE));
        assert_eq!(out.pixel(4, 4), Some([0, 0, 0, 0]));
    }

    #[test]
    fn huge_size_override_off_screen_is_composited_without_resampling() {
        let loader = MemoryLoader::default();
        let mut scene = Scene::new()
            .with_layer(DrawableLayer::pre_rendered("base", Raster::filled(4, 4, RED)))
            .with_layer(
                DrawableLayer::pre_rendered("far", Raster::filled(1, 1, BLUE))
                    .with_style_offset(IVec2::new(1_000_000, 1_000_000))
                    .with_size(UVec2::new(u32::MAX, u32::MAX)),
            );
        let mut sink = VecSink::new();
        let out = Compositor::new(&loader)
            .composite_with_events(Viewport::new(4, 4), &mut scene, &mut sink)
            .expect("composite");
        assert_eq!(out, Raster::filled(4, 4, RED));
        assert_eq!(sink.of_kind(RenderEventKind::LayerComposited).count(), 2);
    }

    #[test]
    fn huge_size_override_covering_the_viewport_is_clipped() {
        let loader = MemoryLoader::default();
        let mut scene = Scene::new().with_layer(
            DrawableLayer::pre_rendered("sky", Raster::filled(1, 1, BLUE))
                .with_style_offset(IVec2::new(-1_000_000, -1_000_000))
                .with_size(UVec2::new(u32::MAX, u32::MAX)),
        );
        let out = Compositor::new(&loader)
            .composite(Viewport::new(4, 4), &mut scene)
            .expect("composite");
        assert_eq!(out, Raster::filled(4, 4, BLUE));
    }

    #[test]
    fn zero_area_layer_is_skipped_with_warning() {
        let loader = MemoryLoader::default();
        let mut scene = Scene::new().with_layer(
            DrawableLayer::pre_rendered("flat", Raster::filled(2, 2, RED))
                .with_size(UVec2::new(0, 2)),
        );
        let mut sink = VecSink::new();
        let out = Compositor::new(&loader)
            .composite_with_events(Viewport::new(2, 2), &mut scene, &mut sink)
            .expect("composite");
        assert!(out.as_raw().iter().all(|b| *b == 0));
        assert_eq!(sink.of_kind(RenderEventKind::Warning).count(), 1);
    }

    #[test]
    fn empty_viewport_is_rejected() {
        let loader = MemoryLoader::default();
        let mut scene = sample_scene();
        let err = composite(Viewport::new(0, 3), &mut scene, &loader).expect_err("invalid");
        assert!(matches!(err, Error::InvalidConfig(_)));
    }
}
