#![forbid(unsafe_code)]
//! map_canvas: Layer compositing and callout layout for flattening map scenes into images.
//!
//! Modules:
//! - scene: drawable layer descriptors, the scene enumeration seam and an in-memory scene
//! - resolve: layer to raster resolution with cached, exactly-once image decoding
//! - compositor: ordered straight-alpha blending of resolved layers into one raster
//! - callout: callout text extraction, layout from a geographic anchor, and painting
//! - render: the high-level renderer tying compositor and callouts together, plus events
//!
//! For examples, see the README and the `map_canvas_examples` crate.
pub mod callout;
pub mod compositor;
pub mod error;
pub mod events;
pub mod geometry;
pub mod projection;
pub mod raster;
pub mod render;
pub mod resolve;
pub mod scene;

/// Convenient re-exports for common types. Import with `use map_canvas::prelude::*;`.
pub mod prelude {
    pub use crate::callout::{
        layout, normalize_lines, paint, BlockTypesetter, Callout, CalloutLayout, CalloutStyle,
        FontSpec, OutlineTypesetter, Padding, Typesetter,
    };
    pub use crate::compositor::{composite, Compositor};
    pub use crate::error::{Error, Result};
    pub use crate::events::{
        CompositeSummary, EventSink, FilterSink, FnSink, RenderEvent, RenderEventKind, VecSink,
    };
    pub use crate::geometry::{LatLng, Viewport};
    pub use crate::projection::{Projection, WebMercatorView, YAxis};
    pub use crate::raster::Raster;
    pub use crate::render::{
        paint_callout, CalloutFailurePolicy, MapRenderer, RenderConfig, RenderOutput,
    };
    pub use crate::resolve::{decode_image, FileImageLoader, ImageLoader, Resolver};
    pub use crate::scene::{
        DrawableLayer, ImageAsset, LayerId, LayerKind, LayerSource, PlaceholderGuard, Scene,
        SceneSource, SourceLocator,
    };
}
