//! Scene enumeration seam and the in-memory [`Scene`] arena.
use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use tracing::debug;

use super::layer::{DrawableLayer, LayerId};
use crate::geometry::Viewport;
use crate::raster::Raster;

/// Enumerates the drawable layers attached to a view, in paint order.
pub trait SceneSource {
    /// Layers in paint order; later entries are drawn on top.
    fn layers(&self) -> &[DrawableLayer];

    /// Add a zero-opacity shape so the upstream renderer creates at least one surface.
    ///
    /// Returns a handle for [`SceneSource::remove_placeholder`], or `None` if the scene cannot
    /// host one.
    fn insert_placeholder(&mut self, viewport: Viewport) -> Option<LayerId>;

    fn remove_placeholder(&mut self, id: &str);
}

/// Scoped placeholder: removes the synthetic shape from the scene when dropped.
pub struct PlaceholderGuard<'s, S: SceneSource + ?Sized> {
    scene: &'s mut S,
    id: Option<LayerId>,
}

impl<'s, S: SceneSource + ?Sized> PlaceholderGuard<'s, S> {
    pub fn insert(scene: &'s mut S, viewport: Viewport) -> Self {
        let id = scene.insert_placeholder(viewport);
        debug!("Inserted placeholder layer {:?}.", id);
        Self { scene, id }
    }

    pub fn id(&self) -> Option<&LayerId> {
        self.id.as_ref()
    }
}

impl<S: SceneSource + ?Sized> Deref for PlaceholderGuard<'_, S> {
    type Target = S;

    fn deref(&self) -> &S {
        self.scene
    }
}

impl<S: SceneSource + ?Sized> DerefMut for PlaceholderGuard<'_, S> {
    fn deref_mut(&mut self) -> &mut S {
        self.scene
    }
}

impl<S: SceneSource + ?Sized> Drop for PlaceholderGuard<'_, S> {
    fn drop(&mut self) {
        if let Some(id) = self.id.take() {
            self.scene.remove_placeholder(&id);
            debug!("Removed placeholder layer '{}'.", id);
        }
    }
}

/// Identifier prefix of placeholder layers created by [`Scene`].
pub const PLACEHOLDER_PREFIX: &str = "__placeholder";

/// Ordered arena of drawable layers.
#[derive(Debug, Default)]
pub struct Scene {
    layers: Vec<DrawableLayer>,
    next_placeholder: u64,
}

impl Scene {
    /// Create a new empty scene.
    pub fn new() -> Self {
        Self {
            layers: Vec::new(),
            next_placeholder: 0,
        }
    }

    /// Add a single layer on top of the stack.
    pub fn with_layer(mut self, layer: DrawableLayer) -> Self {
        self.layers.push(layer);
        self
    }

    /// Add multiple layers on top of the stack.
    pub fn with_layers(mut self, layers: Vec<DrawableLayer>) -> Self {
        self.layers.extend(layers);
        self
    }

    pub fn push(&mut self, layer: DrawableLayer) {
        self.layers.push(layer);
    }

    /// Removes the layer with the given id, returning it if present.
    pub fn remove(&mut self, id: &str) -> Option<DrawableLayer> {
        let idx = self.layers.iter().position(|l| l.id == id)?;
        Some(self.layers.remove(idx))
    }

    pub fn get(&self, id: &str) -> Option<&DrawableLayer> {
        self.layers.iter().find(|l| l.id == id)
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }
}

impl SceneSource for Scene {
    fn layers(&self) -> &[DrawableLayer] {
        &self.layers
    }

    fn insert_placeholder(&mut self, viewport: Viewport) -> Option<LayerId> {
        let id = format!("{PLACEHOLDER_PREFIX}_{}", self.next_placeholder);
        self.next_placeholder += 1;
        let surface = Arc::new(Raster::for_viewport(viewport));
        self.layers.push(DrawableLayer::pre_rendered(id.clone(), surface));
        Some(id)
    }

    fn remove_placeholder(&mut self, id: &str) {
        self.remove(id);
    }
}
