//! High-level renderer: composites a scene, then paints callouts on top.
use tracing::{debug, info, warn};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::callout::{self, Callout, Typesetter};
use crate::compositor::Compositor;
use crate::error::Result;
use crate::events::{EventSink, RenderEvent, RenderEventKind};
use crate::geometry::Viewport;
use crate::projection::Projection;
use crate::raster::Raster;
use crate::resolve::ImageLoader;
use crate::scene::SceneSource;

/// What to do when a callout cannot be laid out.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum CalloutFailurePolicy {
    /// Leave the callout out, log it and report it through the event sink.
    #[default]
    Skip,
    /// Fail the whole render with the callout's error.
    Abort,
}

/// Configuration for a render pass.
#[non_exhaustive]
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RenderConfig {
    /// Output size in pixels.
    pub viewport: Viewport,
    /// Resolve image assets concurrently (requires the `parallel` feature).
    pub parallel: bool,
    pub callout_failure: CalloutFailurePolicy,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            viewport: Viewport::new(0, 0),
            parallel: cfg!(feature = "parallel"),
            callout_failure: CalloutFailurePolicy::Skip,
        }
    }
}

impl RenderConfig {
    /// Creates a new [`RenderConfig`] for the given viewport.
    pub fn new(viewport: Viewport) -> Self {
        Self {
            viewport,
            ..Default::default()
        }
    }

    pub fn with_viewport(mut self, viewport: Viewport) -> Self {
        self.viewport = viewport;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn with_callout_failure(mut self, policy: CalloutFailurePolicy) -> Self {
        self.callout_failure = policy;
        self
    }

    /// Validates the configuration, returning an error if invalid.
    pub fn validate(&self) -> Result<()> {
        self.viewport.validate()
    }
}

/// Result of a render pass.
#[non_exhaustive]
#[derive(Debug, Clone)]
pub struct RenderOutput {
    /// Viewport-sized output.
    pub raster: Raster,
    pub callouts_painted: usize,
    pub callouts_skipped: usize,
}

/// Renders scenes and callouts with a fixed set of collaborators.
pub struct MapRenderer<'a> {
    /// Configuration applied to every render.
    pub config: RenderConfig,
    loader: &'a dyn ImageLoader,
    projection: &'a dyn Projection,
    typesetter: &'a dyn Typesetter,
}

impl<'a> MapRenderer<'a> {
    pub fn try_new(
        config: RenderConfig,
        loader: &'a dyn ImageLoader,
        projection: &'a dyn Projection,
        typesetter: &'a dyn Typesetter,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            loader,
            projection,
            typesetter,
        })
    }

    pub fn new(
        config: RenderConfig,
        loader: &'a dyn ImageLoader,
        projection: &'a dyn Projection,
        typesetter: &'a dyn Typesetter,
    ) -> Self {
        debug_assert!(
            config.viewport.width > 0 && config.viewport.height > 0,
            "viewport must be non-empty"
        );
        Self {
            config,
            loader,
            projection,
            typesetter,
        }
    }

    fn compositor(&self) -> Compositor<'a> {
        Compositor::new(self.loader).with_parallel(self.config.parallel)
    }

    /// Composites `scene` without callouts.
    pub fn composite<S>(&self, scene: &mut S) -> Result<Raster>
    where
        S: SceneSource + ?Sized,
    {
        self.compositor().composite(self.config.viewport, scene)
    }

    /// Renders `scene` and paints `callouts` on top, in the given order.
    pub fn render<S>(&self, scene: &mut S, callouts: &[Callout]) -> Result<RenderOutput>
    where
        S: SceneSource + ?Sized,
    {
        self.render_with_events(scene, callouts, &mut ())
    }

    pub fn render_with_events<S>(
        &self,
        scene: &mut S,
        callouts: &[Callout],
        sink: &mut dyn EventSink,
    ) -> Result<RenderOutput>
    where
        S: SceneSource + ?Sized,
    {
        let viewport = self.config.viewport;
        let mut raster = self
            .compositor()
            .composite_with_events(viewport, scene, sink)?;

        let mut painted = 0;
        let mut skipped = 0;
        for c in callouts {
            let laid_out = callout::layout(viewport, c, self.projection, self.typesetter);
            let layout = match laid_out {
                Ok(layout) => layout,
                Err(e) if self.config.callout_failure == CalloutFailurePolicy::Skip => {
                    warn!("Skipping callout '{}': {}", c.id, e);
                    skipped += 1;
                    if sink.wants(RenderEventKind::CalloutSkipped) {
                        sink.send(RenderEvent::CalloutSkipped {
                            id: c.id.clone(),
                            reason: e.to_string(),
                        });
                    }
                    continue;
                }
                Err(e) => return Err(e),
            };

            callout::paint(&mut raster, &layout, &c.style, self.typesetter);
            painted += 1;
            debug!(
                "Painted callout '{}' at ({:.1}, {:.1}) size {:.1}x{:.1}.",
                c.id, layout.box_left, layout.box_top, layout.box_width, layout.box_height
            );
            if sink.wants(RenderEventKind::CalloutPainted) {
                sink.send(RenderEvent::CalloutPainted {
                    id: c.id.clone(),
                    layout,
                });
            }
        }

        info!(
            "Rendered {}x{} map with {} callout(s) ({} skipped).",
            viewport.width, viewport.height, painted, skipped
        );
        Ok(RenderOutput {
            raster,
            callouts_painted: painted,
            callouts_skipped: skipped,
        })
    }
}

/// Lay out and paint a single callout onto an existing raster.
pub fn paint_callout(
    raster: &mut Raster,
    callout: &Callout,
    projection: &dyn Projection,
    typesetter: &dyn Typesetter,
) -> Result<()> {
    let viewport = Viewport::new(raster.width(), raster.height());
    let layout = callout::layout(viewport, callout, projection, typesetter)?;
    callout::paint(raster, &layout, &callout.style, typesetter);
    Ok(())
}
