//! Event types and sinks for observing render passes.
//!
//! This module defines [`RenderEvent`] and a set of sinks to emit, collect, or forward events
//! while compositing layers via [`crate::compositor::Compositor`] or rendering a full map via
//! [`crate::render::MapRenderer`]. Recoverable failures (skipped layers, skipped callouts) are
//! recorded here rather than returned as errors.
use glam::{IVec2, UVec2};

use crate::callout::CalloutLayout;
use crate::geometry::Viewport;
use crate::scene::{LayerId, LayerKind};

/// Describes events emitted by render operations.
#[non_exhaustive]
#[derive(Debug, Clone)]
pub enum RenderEvent {
    /// Emitted when a composite pass starts.
    CompositeStarted {
        viewport: Viewport,
        /// Number of layers enumerated from the scene.
        layer_count: usize,
    },

    /// Emitted when the scene was empty and a placeholder shape was requested.
    PlaceholderInserted {
        /// Handle returned by the scene, if it could host a placeholder.
        id: Option<LayerId>,
    },

    /// Emitted after a layer was blended onto the output.
    LayerComposited {
        /// Position of the layer in paint order.
        index: usize,
        id: LayerId,
        kind: LayerKind,
        /// Top-left corner in viewport pixels.
        position: IVec2,
        /// Drawn size in pixels.
        size: UVec2,
    },

    /// Emitted when a layer could not be resolved and was left out of the composite.
    LayerSkipped {
        index: usize,
        id: LayerId,
        /// Human-readable cause, including the source locator.
        reason: String,
    },

    /// Emitted when the composite pass finishes.
    CompositeFinished { summary: CompositeSummary },

    /// Emitted after a callout was laid out and painted.
    CalloutPainted { id: String, layout: CalloutLayout },

    /// Emitted when a callout could not be laid out and was left out of the render.
    CalloutSkipped { id: String, reason: String },

    /// Non-fatal warning generated during rendering.
    Warning {
        /// Context string (e.g. layer id, callout id).
        context: String,
        /// Human-readable message.
        message: String,
    },
}

/// Discriminant of [`RenderEvent`], used by sinks to filter what they want to receive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RenderEventKind {
    CompositeStarted,
    PlaceholderInserted,
    LayerComposited,
    LayerSkipped,
    CompositeFinished,
    CalloutPainted,
    CalloutSkipped,
    Warning,
}

impl RenderEvent {
    pub fn kind(&self) -> RenderEventKind {
        match self {
            RenderEvent::CompositeStarted { .. } => RenderEventKind::CompositeStarted,
            RenderEvent::PlaceholderInserted { .. } => RenderEventKind::PlaceholderInserted,
            RenderEvent::LayerComposited { .. } => RenderEventKind::LayerComposited,
            RenderEvent::LayerSkipped { .. } => RenderEventKind::LayerSkipped,
            RenderEvent::CompositeFinished { .. } => RenderEventKind::CompositeFinished,
            RenderEvent::CalloutPainted { .. } => RenderEventKind::CalloutPainted,
            RenderEvent::CalloutSkipped { .. } => RenderEventKind::CalloutSkipped,
            RenderEvent::Warning { .. } => RenderEventKind::Warning,
        }
    }
}

/// Counts reported at the end of a composite pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompositeSummary {
    /// Layers blended onto the output.
    pub layers_composited: usize,
    /// Layers left out because they failed to resolve.
    pub layers_skipped: usize,
    /// Whether the placeholder path was taken.
    pub used_placeholder: bool,
}

/// A generic event sink that accepts [`RenderEvent`]s.
pub trait EventSink {
    fn send(&mut self, event: RenderEvent);

    /// Returns `false` for event kinds the sink ignores, letting emitters skip building them.
    fn wants(&self, _kind: RenderEventKind) -> bool {
        true
    }

    fn send_many<I>(&mut self, events: I)
    where
        Self: Sized,
        I: IntoIterator<Item = RenderEvent>,
    {
        for e in events {
            self.send(e);
        }
    }
}

/// A no-op event sink.
impl EventSink for () {
    #[inline]
    fn send(&mut self, _event: RenderEvent) {}

    #[inline]
    fn wants(&self, _kind: RenderEventKind) -> bool {
        false
    }
}

/// An event sink that forwards to a user-provided closure.
pub struct FnSink<F>
where
    F: FnMut(RenderEvent),
{
    f: F,
}

impl<F> FnSink<F>
where
    F: FnMut(RenderEvent),
{
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F> EventSink for FnSink<F>
where
    F: FnMut(RenderEvent),
{
    #[inline]
    fn send(&mut self, event: RenderEvent) {
        (self.f)(event);
    }
}

/// An event sink that collects all events in a `Vec`.
#[derive(Default)]
pub struct VecSink {
    events: Vec<RenderEvent>,
}

impl VecSink {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn into_inner(self) -> Vec<RenderEvent> {
        self.events
    }

    pub fn as_slice(&self) -> &[RenderEvent] {
        &self.events
    }

    /// Iterate over collected events of one kind.
    pub fn of_kind(&self, kind: RenderEventKind) -> impl Iterator<Item = &RenderEvent> {
        self.events.iter().filter(move |e| e.kind() == kind)
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl EventSink for VecSink {
    #[inline]
    fn send(&mut self, event: RenderEvent) {
        self.events.push(event);
    }
}

/// Filters events by kind before forwarding them to an inner sink.
pub struct FilterSink<S: EventSink> {
    inner: S,
    kinds: Vec<RenderEventKind>,
}

impl<S: EventSink> FilterSink<S> {
    pub fn new(inner: S, kinds: impl IntoIterator<Item = RenderEventKind>) -> Self {
        Self {
            inner,
            kinds: kinds.into_iter().collect(),
        }
    }

    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S: EventSink> EventSink for FilterSink<S> {
    fn send(&mut self, event: RenderEvent) {
        if self.wants(event.kind()) {
            self.inner.send(event);
        }
    }

    fn wants(&self, kind: RenderEventKind) -> bool {
        self.kinds.contains(&kind) && self.inner.wants(kind)
    }
}
