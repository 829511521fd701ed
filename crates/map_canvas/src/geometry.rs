//! Viewport and coordinate primitives shared by the compositor and the callout engine.
use glam::{IVec2, UVec2};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Pixel dimensions of a single render pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn size(&self) -> UVec2 {
        UVec2::new(self.width, self.height)
    }

    /// Total number of pixels covered by the viewport.
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Returns `true` if a rectangle at `origin` with `size` overlaps the viewport.
    pub fn intersects(&self, origin: IVec2, size: UVec2) -> bool {
        let right = origin.x as i64 + size.x as i64;
        let bottom = origin.y as i64 + size.y as i64;
        right > 0
            && bottom > 0
            && (origin.x as i64) < self.width as i64
            && (origin.y as i64) < self.height as i64
    }

    /// Validates the viewport, returning an error if either dimension is zero.
    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(Error::InvalidConfig(format!(
                "viewport must be non-empty, got {}x{}",
                self.width, self.height
            )));
        }
        Ok(())
    }
}

/// Geographic coordinate in degrees.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Returns `true` when both components are finite numbers.
    pub fn is_finite(&self) -> bool {
        self.lat.is_finite() && self.lng.is_finite()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_rejects_zero_dimensions() {
        assert!(Viewport::new(0, 10).validate().is_err());
        assert!(Viewport::new(10, 0).validate().is_err());
        assert!(Viewport::new(1, 1).validate().is_ok());
    }

    #[test]
    fn intersects_detects_fully_outside_rectangles() {
        let vp = Viewport::new(100, 50);
        assert!(vp.intersects(IVec2::new(-10, -10), UVec2::new(20, 20)));
        assert!(!vp.intersects(IVec2::new(100, 0), UVec2::new(20, 20)));
        assert!(!vp.intersects(IVec2::new(-20, 0), UVec2::new(20, 20)));
        assert!(!vp.intersects(IVec2::new(0, 50), UVec2::new(5, 5)));
    }

    #[test]
    fn pixel_count_multiplies_dimensions() {
        assert_eq!(Viewport::new(256, 128).pixel_count(), 256 * 128);
    }

    #[test]
    fn latlng_finiteness() {
        assert!(LatLng::new(51.5, -0.12).is_finite());
        assert!(!LatLng::new(f64::NAN, 0.0).is_finite());
    }
}
