//! Drawable layer descriptors.
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use glam::{IVec2, UVec2};
use once_cell::sync::OnceCell;

use crate::raster::Raster;

pub type LayerId = String;

/// Where an image asset's bytes come from.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum SourceLocator {
    /// Local filesystem path (plain paths and `file://` URLs).
    Path(PathBuf),
    /// Remote URL, fetched by a user-supplied loader.
    Url(String),
}

impl SourceLocator {
    /// Classify a locator string as a path or a remote URL.
    pub fn parse(locator: &str) -> Self {
        if let Some(path) = locator.strip_prefix("file://") {
            return SourceLocator::Path(PathBuf::from(path));
        }
        let is_remote = locator
            .split_once("://")
            .is_some_and(|(scheme, _)| is_url_scheme(scheme));
        if is_remote || locator.starts_with("data:") {
            SourceLocator::Url(locator.to_owned())
        } else {
            SourceLocator::Path(PathBuf::from(locator))
        }
    }
}

fn is_url_scheme(scheme: &str) -> bool {
    !scheme.is_empty()
        && scheme
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

impl fmt::Display for SourceLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceLocator::Path(path) => write!(f, "{}", path.display()),
            SourceLocator::Url(url) => f.write_str(url),
        }
    }
}

impl From<&str> for SourceLocator {
    fn from(value: &str) -> Self {
        SourceLocator::parse(value)
    }
}

/// A standalone image whose decode is cached on the layer instance.
#[derive(Debug)]
pub struct ImageAsset {
    pub locator: SourceLocator,
    decoded: OnceCell<Arc<Raster>>,
}

impl ImageAsset {
    pub fn new(locator: impl Into<SourceLocator>) -> Self {
        Self {
            locator: locator.into(),
            decoded: OnceCell::new(),
        }
    }

    /// Returns the cached decode, if the asset was already resolved.
    pub fn cached(&self) -> Option<&Arc<Raster>> {
        self.decoded.get()
    }

    pub(crate) fn cache(&self) -> &OnceCell<Arc<Raster>> {
        &self.decoded
    }
}

/// Pixel content backing a drawable layer.
#[derive(Debug)]
pub enum LayerSource {
    /// Surface already rendered by an upstream tile or vector renderer.
    PreRendered(Arc<Raster>),
    /// Image loaded lazily through an [`crate::resolve::ImageLoader`].
    ImageAsset(ImageAsset),
    /// A layer kind reported by the scene that has no resolution path.
    Foreign { kind: String },
}

/// Coarse classification of a layer, used in logs and events.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LayerKind {
    PreRendered,
    ImageAsset,
    Foreign(String),
}

impl fmt::Display for LayerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LayerKind::PreRendered => f.write_str("pre-rendered"),
            LayerKind::ImageAsset => f.write_str("image-asset"),
            LayerKind::Foreign(kind) => f.write_str(kind),
        }
    }
}

/// One paintable unit of the scene, in stacking order.
#[non_exhaustive]
#[derive(Debug)]
pub struct DrawableLayer {
    /// Identifier used in logs, events and errors.
    pub id: LayerId,
    /// Pixel content.
    pub source: LayerSource,
    /// Explicit offset from the layer's style, in viewport pixels.
    pub style_offset: Option<IVec2>,
    /// Fallback offset derived from scene layout.
    pub layout_offset: Option<IVec2>,
    /// Explicit draw size; the natural raster size is used otherwise.
    pub size_override: Option<UVec2>,
}

impl DrawableLayer {
    pub fn new(id: impl Into<LayerId>, source: LayerSource) -> Self {
        Self {
            id: id.into(),
            source,
            style_offset: None,
            layout_offset: None,
            size_override: None,
        }
    }

    pub fn pre_rendered(id: impl Into<LayerId>, raster: impl Into<Arc<Raster>>) -> Self {
        Self::new(id, LayerSource::PreRendered(raster.into()))
    }

    pub fn image_asset(id: impl Into<LayerId>, locator: impl Into<SourceLocator>) -> Self {
        Self::new(id, LayerSource::ImageAsset(ImageAsset::new(locator)))
    }

    pub fn foreign(id: impl Into<LayerId>, kind: impl Into<String>) -> Self {
        Self::new(id, LayerSource::Foreign { kind: kind.into() })
    }

    pub fn with_style_offset(mut self, offset: IVec2) -> Self {
        self.style_offset = Some(offset);
        self
    }

    pub fn with_layout_offset(mut self, offset: IVec2) -> Self {
        self.layout_offset = Some(offset);
        self
    }

    pub fn with_size(mut self, size: UVec2) -> Self {
        self.size_override = Some(size);
        self
    }

    pub fn kind(&self) -> LayerKind {
        match &self.source {
            LayerSource::PreRendered(_) => LayerKind::PreRendered,
            LayerSource::ImageAsset(_) => LayerKind::ImageAsset,
            LayerSource::Foreign { kind } => LayerKind::Foreign(kind.clone()),
        }
    }

    /// Draw position: style offset, then layout fallback, then the origin.
    pub fn draw_position(&self) -> IVec2 {
        self.style_offset
            .or(self.layout_offset)
            .unwrap_or(IVec2::ZERO)
    }

    /// Draw size given the natural size of the resolved raster.
    pub fn draw_size(&self, natural: UVec2) -> UVec2 {
        self.size_override.unwrap_or(natural)
    }
}
