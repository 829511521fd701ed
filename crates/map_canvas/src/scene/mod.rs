//! Scene model: drawable layer descriptors in paint order and the enumeration seam.
pub mod layer;
pub mod source;

pub use layer::{DrawableLayer, ImageAsset, LayerId, LayerKind, LayerSource, SourceLocator};
pub use source::{PlaceholderGuard, Scene, SceneSource, PLACEHOLDER_PREFIX};
