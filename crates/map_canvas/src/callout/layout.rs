//! Callout geometry.
//!
//! [`layout`] places a callout box above its projected anchor, sized from the measured text, with
//! the tail apex on the anchor. All coordinates are viewport pixels with a top-left origin and y
//! growing downwards. Projections reporting [`YAxis::Up`] have their anchor reflected against the
//! viewport height first; [`YAxis::Down`] anchors are used as-is.
use glam::Vec2;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::style::CalloutStyle;
use super::text::normalize_lines;
use super::typeset::Typesetter;
use crate::error::{Error, Result};
use crate::geometry::{LatLng, Viewport};
use crate::projection::{Projection, YAxis};

/// A floating annotation bound to a geographic anchor.
#[non_exhaustive]
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Callout {
    /// Identifier used in logs, events and errors.
    pub id: String,
    pub anchor: Option<LatLng>,
    /// Offset of the annotation's own registration point, in pixels.
    pub anchor_offset: Vec2,
    /// Additional offset requested by the user, in pixels.
    pub user_offset: Option<Vec2>,
    /// Raw content; see [`normalize_lines`] for how it is split.
    pub content: String,
    /// Lower bound for the measured content width.
    pub width_override: Option<f32>,
    pub style: CalloutStyle,
}

impl Callout {
    pub fn new(id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            anchor: None,
            anchor_offset: Vec2::ZERO,
            user_offset: None,
            content: content.into(),
            width_override: None,
            style: CalloutStyle::default(),
        }
    }

    pub fn with_anchor(mut self, anchor: LatLng) -> Self {
        self.anchor = Some(anchor);
        self
    }

    pub fn with_anchor_offset(mut self, offset: Vec2) -> Self {
        self.anchor_offset = offset;
        self
    }

    pub fn with_user_offset(mut self, offset: Vec2) -> Self {
        self.user_offset = Some(offset);
        self
    }

    pub fn with_width(mut self, width: f32) -> Self {
        self.width_override = Some(width);
        self
    }

    pub fn with_style(mut self, style: CalloutStyle) -> Self {
        self.style = style;
        self
    }
}

/// Computed geometry of one callout for one render pass.
#[derive(Clone, Debug, PartialEq)]
pub struct CalloutLayout {
    pub box_left: f32,
    pub box_top: f32,
    pub box_width: f32,
    pub box_height: f32,
    pub tail_apex_x: f32,
    pub tail_apex_y: f32,
    /// Normalized text lines, top to bottom.
    pub lines: Vec<String>,
}

impl CalloutLayout {
    pub fn box_right(&self) -> f32 {
        self.box_left + self.box_width
    }

    pub fn box_bottom(&self) -> f32 {
        self.box_top + self.box_height
    }

    pub fn tail_apex(&self) -> Vec2 {
        Vec2::new(self.tail_apex_x, self.tail_apex_y)
    }

    /// Axis-aligned bounds of box and tail as `(min, max)`.
    pub fn bounds(&self) -> (Vec2, Vec2) {
        let min = Vec2::new(self.box_left, self.box_top.min(self.tail_apex_y));
        let max = Vec2::new(self.box_right(), self.box_bottom().max(self.tail_apex_y));
        (min, max)
    }
}

/// Lay out `callout` for `viewport`.
///
/// Fails with [`Error::InvalidConfig`] when the callout's style does not validate, and with
/// [`Error::NoAnchor`] when the callout has no anchor or it projects to a non-finite position.
pub fn layout(
    viewport: Viewport,
    callout: &Callout,
    projection: &dyn Projection,
    typesetter: &dyn Typesetter,
) -> Result<CalloutLayout> {
    callout.style.validate()?;
    let no_anchor = || Error::NoAnchor {
        callout: callout.id.clone(),
    };
    let latlng = callout
        .anchor
        .filter(LatLng::is_finite)
        .ok_or_else(no_anchor)?;

    let mut anchor = Vec2::from(projection.project(latlng));
    if projection.y_axis() == YAxis::Up {
        anchor.y = viewport.height as f32 - anchor.y;
    }
    anchor += callout.anchor_offset + callout.user_offset.unwrap_or(Vec2::ZERO);
    if !anchor.is_finite() {
        return Err(no_anchor());
    }

    let style = &callout.style;
    let lines = normalize_lines(&callout.content);
    let measured = lines
        .iter()
        .map(|line| typesetter.measure(line, &style.font))
        .fold(0.0_f32, f32::max);
    let content_width = callout
        .width_override
        .map_or(measured, |w| w.max(measured));

    let box_width = style
        .min_width
        .max(content_width + style.padding.horizontal());
    let box_height = lines.len() as f32 * style.line_height + style.padding.vertical();
    let box_left = anchor.x - box_width / 2.0;
    let box_top = anchor.y - style.tail_size - box_height;

    Ok(CalloutLayout {
        box_left,
        box_top,
        box_width,
        box_height,
        tail_apex_x: box_left + box_width / 2.0,
        tail_apex_y: box_top + box_height + style.tail_size,
        lines,
    })
}
