//! Visual style of callout boxes.
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Upper bound for [`CalloutStyle::shadow_blur`].
pub const MAX_SHADOW_BLUR: f32 = 64.0;
/// Upper bound for the magnitude of [`CalloutStyle::shadow_offset_y`] and for
/// [`CalloutStyle::border_width`].
pub const MAX_DECORATION_EXTENT: f32 = 256.0;

/// Inner spacing between the box edge and its text, in pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Padding {
    pub left: f32,
    pub right: f32,
    pub top: f32,
    pub bottom: f32,
}

impl Padding {
    pub fn new(left: f32, right: f32, top: f32, bottom: f32) -> Self {
        Self {
            left,
            right,
            top,
            bottom,
        }
    }

    pub fn uniform(value: f32) -> Self {
        Self::new(value, value, value, value)
    }

    /// Same padding on left/right and on top/bottom.
    pub fn symmetric(horizontal: f32, vertical: f32) -> Self {
        Self::new(horizontal, horizontal, vertical, vertical)
    }

    pub fn horizontal(&self) -> f32 {
        self.left + self.right
    }

    pub fn vertical(&self) -> f32 {
        self.top + self.bottom
    }

    fn is_valid(&self) -> bool {
        [self.left, self.right, self.top, self.bottom]
            .iter()
            .all(|v| v.is_finite() && *v >= 0.0)
    }
}

impl Default for Padding {
    fn default() -> Self {
        Self::symmetric(12.0, 8.0)
    }
}

/// Font used to measure and draw callout text.
///
/// `family` is informational; the [`crate::callout::Typesetter`] decides which face is used.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FontSpec {
    pub family: String,
    pub size_px: f32,
}

impl FontSpec {
    pub fn new(family: impl Into<String>, size_px: f32) -> Self {
        Self {
            family: family.into(),
            size_px,
        }
    }
}

impl Default for FontSpec {
    fn default() -> Self {
        Self::new("sans-serif", 13.0)
    }
}

/// Style of a callout box, its tail and its text.
///
/// Colors are straight (non-premultiplied) RGBA.
#[non_exhaustive]
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct CalloutStyle {
    pub padding: Padding,
    /// Vertical advance between consecutive text lines.
    pub line_height: f32,
    pub font: FontSpec,
    /// Requested corner radius; clamped to half the smaller box side when painting.
    pub corner_radius: f32,
    /// Distance from the box bottom edge to the tail apex.
    pub tail_size: f32,
    /// Floor for the box width, applied even to empty content.
    pub min_width: f32,
    pub fill_color: [u8; 4],
    pub border_color: [u8; 4],
    pub border_width: f32,
    pub text_color: [u8; 4],
    pub shadow_color: [u8; 4],
    /// Gaussian standard deviation of the drop shadow.
    pub shadow_blur: f32,
    /// Downward offset of the drop shadow.
    pub shadow_offset_y: f32,
}

impl Default for CalloutStyle {
    fn default() -> Self {
        Self {
            padding: Padding::default(),
            line_height: 18.0,
            font: FontSpec::default(),
            corner_radius: 6.0,
            tail_size: 10.0,
            min_width: 50.0,
            fill_color: [255, 255, 255, 255],
            border_color: [0, 0, 0, 64],
            border_width: 1.0,
            text_color: [51, 51, 51, 255],
            shadow_color: [0, 0, 0, 90],
            shadow_blur: 4.0,
            shadow_offset_y: 3.0,
        }
    }
}

impl CalloutStyle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_padding(mut self, padding: Padding) -> Self {
        self.padding = padding;
        self
    }

    pub fn with_line_height(mut self, line_height: f32) -> Self {
        self.line_height = line_height;
        self
    }

    pub fn with_font(mut self, font: FontSpec) -> Self {
        self.font = font;
        self
    }

    pub fn with_corner_radius(mut self, corner_radius: f32) -> Self {
        self.corner_radius = corner_radius;
        self
    }

    pub fn with_tail_size(mut self, tail_size: f32) -> Self {
        self.tail_size = tail_size;
        self
    }

    pub fn with_min_width(mut self, min_width: f32) -> Self {
        self.min_width = min_width;
        self
    }

    pub fn with_fill_color(mut self, rgba: [u8; 4]) -> Self {
        self.fill_color = rgba;
        self
    }

    /// Sets the border color and stroke width.
    pub fn with_border(mut self, rgba: [u8; 4], width: f32) -> Self {
        self.border_color = rgba;
        self.border_width = width;
        self
    }

    pub fn with_text_color(mut self, rgba: [u8; 4]) -> Self {
        self.text_color = rgba;
        self
    }

    /// Sets the drop shadow color, blur and vertical offset.
    pub fn with_shadow(mut self, rgba: [u8; 4], blur: f32, offset_y: f32) -> Self {
        self.shadow_color = rgba;
        self.shadow_blur = blur;
        self.shadow_offset_y = offset_y;
        self
    }

    /// Removes the drop shadow.
    pub fn without_shadow(mut self) -> Self {
        self.shadow_color[3] = 0;
        self
    }

    pub fn has_shadow(&self) -> bool {
        self.shadow_color[3] > 0
    }

    /// Validates the style, returning an error if invalid.
    pub fn validate(&self) -> Result<()> {
        if !self.padding.is_valid() {
            return Err(Error::InvalidConfig(
                "padding must be finite and >= 0 on every side".into(),
            ));
        }
        if !(self.line_height.is_finite() && self.line_height > 0.0) {
            return Err(Error::InvalidConfig("line_height must be > 0".into()));
        }
        if !(self.font.size_px.is_finite() && self.font.size_px > 0.0) {
            return Err(Error::InvalidConfig("font size must be > 0".into()));
        }
        let non_negative = [
            ("corner_radius", self.corner_radius),
            ("tail_size", self.tail_size),
            ("min_width", self.min_width),
            ("border_width", self.border_width),
            ("shadow_blur", self.shadow_blur),
        ];
        for (name, value) in non_negative {
            if !(value.is_finite() && value >= 0.0) {
                return Err(Error::InvalidConfig(format!("{name} must be >= 0")));
            }
        }
        if self.shadow_blur > MAX_SHADOW_BLUR {
            return Err(Error::InvalidConfig(format!(
                "shadow_blur must be <= {MAX_SHADOW_BLUR}"
            )));
        }
        if !(self.shadow_offset_y.is_finite()
            && self.shadow_offset_y.abs() <= MAX_DECORATION_EXTENT)
        {
            return Err(Error::InvalidConfig(format!(
                "shadow_offset_y must be within +/-{MAX_DECORATION_EXTENT}"
            )));
        }
        if self.border_width > MAX_DECORATION_EXTENT {
            return Err(Error::InvalidConfig(format!(
                "border_width must be <= {MAX_DECORATION_EXTENT}"
            )));
        }
        Ok(())
    }
}
