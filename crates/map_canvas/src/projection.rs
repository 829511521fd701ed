//! Geographic projection seam.
//!
//! The compositor never does projection math itself; callers hand in a [`Projection`] that maps
//! a [`LatLng`] to layer pixel coordinates for the current view. [`WebMercatorView`] is a
//! ready-made implementation for the common 256 px tile pyramid.
use std::f64::consts::PI;

use glam::{DVec2, Vec2};
use mint::Point2;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::geometry::{LatLng, Viewport};

/// Orientation of the Y axis in the pixel space returned by a [`Projection`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum YAxis {
    /// Origin at the top-left corner, Y grows downward (the compositor's own convention).
    #[default]
    Down,
    /// Origin at the bottom-left corner, Y grows upward.
    Up,
}

/// Maps geographic coordinates to pixels for the current view state.
pub trait Projection: Send + Sync {
    fn project(&self, latlng: LatLng) -> Point2<f32>;

    /// Documented Y-axis orientation of [`Projection::project`].
    fn y_axis(&self) -> YAxis {
        YAxis::Down
    }
}

/// Maximum latitude representable in spherical Web Mercator.
pub const MAX_LATITUDE: f64 = 85.051_128_779_806_59;

/// Default tile edge length in pixels.
pub const TILE_SIZE: f64 = 256.0;

/// Spherical Web Mercator view centered on a geographic point at a zoom level.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct WebMercatorView {
    pub center: LatLng,
    pub zoom: f64,
    pub viewport: Viewport,
    pub tile_size: f64,
}

impl WebMercatorView {
    pub fn new(center: LatLng, zoom: f64, viewport: Viewport) -> Self {
        Self {
            center,
            zoom,
            viewport,
            tile_size: TILE_SIZE,
        }
    }

    pub fn with_tile_size(mut self, tile_size: f64) -> Self {
        self.tile_size = tile_size;
        self
    }

    /// World size in pixels at the current zoom.
    pub fn world_size(&self) -> f64 {
        self.tile_size * 2f64.powf(self.zoom)
    }

    /// Projects to absolute world pixels (origin at the top-left of the world).
    pub fn world_pixel(&self, latlng: LatLng) -> DVec2 {
        let size = self.world_size();
        let lat = latlng.lat.clamp(-MAX_LATITUDE, MAX_LATITUDE).to_radians();
        let x = (latlng.lng + 180.0) / 360.0 * size;
        let sin = lat.sin();
        let y = (0.5 - ((1.0 + sin) / (1.0 - sin)).ln() / (4.0 * PI)) * size;
        DVec2::new(x, y)
    }

    /// World pixel coordinates of the viewport's top-left corner.
    pub fn pixel_origin(&self) -> DVec2 {
        let half = DVec2::new(
            self.viewport.width as f64 / 2.0,
            self.viewport.height as f64 / 2.0,
        );
        self.world_pixel(self.center) - half
    }

    /// Viewport pixel back to a coordinate; inverse of [`Projection::project`].
    pub fn unproject(&self, pixel: Vec2) -> LatLng {
        let world = self.pixel_origin() + pixel.as_dvec2();
        let size = self.world_size();
        let lng = world.x / size * 360.0 - 180.0;
        let n = PI * (1.0 - 2.0 * world.y / size);
        LatLng::new(n.sinh().atan().to_degrees(), lng)
    }

    /// Top-left viewport position of the tile `(x, y)` at the integer zoom level.
    pub fn tile_origin(&self, x: i64, y: i64) -> Vec2 {
        let world = DVec2::new(x as f64 * self.tile_size, y as f64 * self.tile_size);
        (world - self.pixel_origin()).as_vec2()
    }
}

impl Projection for WebMercatorView {
    fn project(&self, latlng: LatLng) -> Point2<f32> {
        let p = (self.world_pixel(latlng) - self.pixel_origin()).as_vec2();
        Point2 { x: p.x, y: p.y }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view() -> WebMercatorView {
        WebMercatorView::new(LatLng::new(0.0, 0.0), 0.0, Viewport::new(256, 256))
    }

    #[test]
    fn center_projects_to_viewport_center() {
        let v = WebMercatorView::new(LatLng::new(48.85, 2.35), 12.0, Viewport::new(800, 600));
        let p = v.project(v.center);
        assert!((p.x - 400.0).abs() < 1e-3);
        assert!((p.y - 300.0).abs() < 1e-3);
    }

    #[test]
    fn north_is_up_in_pixel_space() {
        let v = view();
        let north = v.project(LatLng::new(45.0, 0.0));
        let south = v.project(LatLng::new(-45.0, 0.0));
        assert!(north.y < south.y);
        assert_eq!(v.y_axis(), YAxis::Down);
    }

    #[test]
    fn unproject_inverts_project() {
        let v = WebMercatorView::new(LatLng::new(35.68, 139.69), 11.0, Viewport::new(640, 480));
        let target = LatLng::new(35.70, 139.75);
        let back = v.unproject(Vec2::from(v.project(target)));
        assert!((back.lat - target.lat).abs() < 1e-4);
        assert!((back.lng - target.lng).abs() < 1e-4);
    }

    #[test]
    fn antimeridian_maps_to_world_edges() {
        let v = view();
        assert!((v.world_pixel(LatLng::new(0.0, -180.0)).x).abs() < 1e-9);
        assert!((v.world_pixel(LatLng::new(0.0, 180.0)).x - 256.0).abs() < 1e-9);
    }

    #[test]
    fn latitude_is_clamped() {
        let v = view();
        let p = v.world_pixel(LatLng::new(90.0, 0.0));
        assert!(p.y.is_finite());
        assert!(p.y.abs() < 1e-6);
    }

    #[test]
    fn tile_origin_matches_world_grid() {
        let v = WebMercatorView::new(LatLng::new(0.0, 0.0), 1.0, Viewport::new(512, 512));
        assert_eq!(v.tile_origin(0, 0), Vec2::new(0.0, 0.0));
        assert_eq!(v.tile_origin(1, 1), Vec2::new(256.0, 256.0));
    }
}
