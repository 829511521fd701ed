//! Raster source resolution for drawable layers.
//!
//! [`Resolver::resolve`] turns a [`DrawableLayer`] into pixels:
//! - pre-rendered surfaces are returned as-is;
//! - image assets are decoded through an [`ImageLoader`] at most once per layer instance, the
//!   result being cached on the layer itself;
//! - foreign layer kinds fail with [`Error::UnsupportedLayer`].
use std::sync::Arc;

use tracing::debug;

use crate::error::{Error, Result};
use crate::raster::Raster;
use crate::scene::{DrawableLayer, ImageAsset, LayerSource};

pub mod loader;

pub use loader::{decode_image, FileImageLoader, ImageLoader};

/// Resolves layers to rasters using a shared image loader.
#[derive(Clone, Copy)]
pub struct Resolver<'a> {
    loader: &'a dyn ImageLoader,
}

impl<'a> Resolver<'a> {
    pub fn new(loader: &'a dyn ImageLoader) -> Self {
        Self { loader }
    }

    /// Resolve a single layer to its raster.
    pub fn resolve(&self, layer: &DrawableLayer) -> Result<Arc<Raster>> {
        match &layer.source {
            LayerSource::PreRendered(raster) => Ok(raster.clone()),
            LayerSource::ImageAsset(asset) => asset
                .cache()
                .get_or_try_init(|| self.load(&layer.id, asset).map(Arc::new))
                .cloned(),
            LayerSource::Foreign { kind } => Err(Error::UnsupportedLayer {
                id: layer.id.clone(),
                kind: kind.clone(),
            }),
        }
    }

    /// Resolve every layer, keeping results in scene order.
    ///
    /// With `parallel` set (and the `parallel` feature enabled) resolutions run on the rayon pool.
    pub fn resolve_all(
        &self,
        layers: &[DrawableLayer],
        parallel: bool,
    ) -> Vec<Result<Arc<Raster>>> {
        if parallel {
            return self.resolve_concurrently(layers);
        }
        layers.iter().map(|l| self.resolve(l)).collect()
    }

    #[cfg(feature = "parallel")]
    fn resolve_concurrently(&self, layers: &[DrawableLayer]) -> Vec<Result<Arc<Raster>>> {
        use rayon::prelude::*;
        layers.par_iter().map(|l| self.resolve(l)).collect()
    }

    #[cfg(not(feature = "parallel"))]
    fn resolve_concurrently(&self, layers: &[DrawableLayer]) -> Vec<Result<Arc<Raster>>> {
        layers.iter().map(|l| self.resolve(l)).collect()
    }

    fn load(&self, id: &str, asset: &ImageAsset) -> Result<Raster> {
        debug!("Decoding image '{}' for layer '{}'.", asset.locator, id);
        self.loader.load(&asset.locator).map_err(|e| match e {
            Error::Decode { .. } => e,
            other => Error::Decode {
                locator: asset.locator.to_string(),
                reason: other.to_string(),
            },
        })
    }
}
