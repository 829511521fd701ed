//! Floating text callouts: layout from a geographic anchor and painting on top of the composite.
//!
//! - [`layout()`] projects the anchor, normalizes and measures the text and returns a
//!   [`CalloutLayout`].
//! - [`paint()`] draws the box, its shadow, tail and text onto a [`crate::raster::Raster`].
//! - [`Typesetter`] is the font seam used by both.
mod blur;
pub mod layout;
pub mod paint;
pub mod style;
pub mod text;
pub mod typeset;

pub use layout::{layout, Callout, CalloutLayout};
pub use paint::paint;
pub use style::{CalloutStyle, FontSpec, Padding, MAX_DECORATION_EXTENT, MAX_SHADOW_BLUR};
pub use text::normalize_lines;
pub use typeset::{BlockTypesetter, OutlineTypesetter, Typesetter};
