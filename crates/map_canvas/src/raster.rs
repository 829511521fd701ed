//! Straight-alpha RGBA pixel buffers and source-over blending.
//!
//! [`Raster`] is the currency of the whole crate: resolved layers, the composite output, and the
//! surface callouts are painted onto. Color channels are never premultiplied; blending uses the
//! straight-alpha source-over operator with integer arithmetic so results are reproducible.
use std::path::Path;

use glam::{IVec2, UVec2};
use image::imageops::{self, FilterType};
use image::RgbaImage;

use crate::error::{Error, Result};
use crate::geometry::Viewport;

/// A decoded or rendered 2D pixel buffer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Raster {
    image: RgbaImage,
}

impl Raster {
    /// Create a fully transparent raster.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            image: RgbaImage::new(width, height),
        }
    }

    /// Create a transparent raster matching the viewport dimensions.
    pub fn for_viewport(viewport: Viewport) -> Self {
        Self::new(viewport.width, viewport.height)
    }

    /// Create a raster where every pixel has the given straight RGBA color.
    pub fn filled(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        Self {
            image: RgbaImage::from_pixel(width, height, image::Rgba(rgba)),
        }
    }

    pub fn from_image(image: RgbaImage) -> Self {
        Self { image }
    }

    /// Wrap raw straight RGBA bytes, row-major without padding.
    pub fn from_rgba(width: u32, height: u32, data: Vec<u8>) -> Result<Self> {
        let expected = width as usize * height as usize * 4;
        let actual = data.len();
        RgbaImage::from_raw(width, height, data)
            .map(Self::from_image)
            .ok_or_else(|| {
                Error::Other(format!(
                    "raster {width}x{height} needs {expected} bytes, got {actual}"
                ))
            })
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn size(&self) -> UVec2 {
        UVec2::new(self.width(), self.height())
    }

    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }

    /// Returns the pixel at `(x, y)`, or `None` outside the raster.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        self.image.get_pixel_checked(x, y).map(|p| p.0)
    }

    pub fn as_raw(&self) -> &[u8] {
        self.image.as_raw()
    }

    pub fn as_image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn into_image(self) -> RgbaImage {
        self.image
    }

    /// Returns a copy resampled to `size` with a triangle filter.
    pub fn resized(&self, size: UVec2) -> Raster {
        if size == self.size() {
            return self.clone();
        }
        Raster::from_image(imageops::resize(
            &self.image,
            size.x,
            size.y,
            FilterType::Triangle,
        ))
    }

    /// Blend `src` over this raster with its top-left corner at `origin`.
    ///
    /// Pixels falling outside this raster are discarded.
    pub fn blend_over(&mut self, src: &Raster, origin: IVec2) {
        let width = src.width();
        let src_data = src.as_raw();
        self.blend_rows(origin, src.size(), |x, y| {
            let i = (y as usize * width as usize + x as usize) * 4;
            [
                src_data[i],
                src_data[i + 1],
                src_data[i + 2],
                src_data[i + 3],
            ]
        });
    }

    /// Blend `src` stretched to `size` with its top-left corner at `origin`.
    ///
    /// Only destination pixels inside this raster are visited, each sampled bilinearly from `src`,
    /// so the stretched image is never materialized.
    pub fn blend_scaled(&mut self, src: &Raster, origin: IVec2, size: UVec2) {
        if src.is_empty() || size.x == 0 || size.y == 0 {
            return;
        }
        if size == src.size() {
            self.blend_over(src, origin);
            return;
        }
        let scale_x = src.width() as f64 / size.x as f64;
        let scale_y = src.height() as f64 / size.y as f64;
        self.blend_rows(origin, size, |x, y| {
            src.sample_bilinear(
                (x as f64 + 0.5) * scale_x - 0.5,
                (y as f64 + 0.5) * scale_y - 0.5,
            )
        });
    }

    /// Bilinear sample at continuous pixel coordinates, clamped to the edges.
    fn sample_bilinear(&self, u: f64, v: f64) -> [u8; 4] {
        let last_x = self.width() - 1;
        let last_y = self.height() - 1;
        let u = u.clamp(0.0, last_x as f64);
        let v = v.clamp(0.0, last_y as f64);
        let (x0, y0) = (u.floor() as u32, v.floor() as u32);
        let (x1, y1) = ((x0 + 1).min(last_x), (y0 + 1).min(last_y));
        let (fx, fy) = (u - x0 as f64, v - y0 as f64);

        let px = |x: u32, y: u32| self.image.get_pixel(x, y).0;
        let (a, b, c, d) = (px(x0, y0), px(x1, y0), px(x0, y1), px(x1, y1));
        let mut out = [0u8; 4];
        for i in 0..4 {
            let top = a[i] as f64 * (1.0 - fx) + b[i] as f64 * fx;
            let bottom = c[i] as f64 * (1.0 - fx) + d[i] as f64 * fx;
            out[i] = (top * (1.0 - fy) + bottom * fy).round().clamp(0.0, 255.0) as u8;
        }
        out
    }

    /// Blend a premultiplied `tiny-skia` pixmap over this raster at `origin`.
    pub fn blend_pixmap(&mut self, pixmap: &tiny_skia::Pixmap, origin: IVec2) {
        let width = pixmap.width();
        let pixels = pixmap.pixels();
        let size = UVec2::new(pixmap.width(), pixmap.height());
        self.blend_rows(origin, size, |x, y| {
            let c = pixels[y as usize * width as usize + x as usize].demultiply();
            [c.red(), c.green(), c.blue(), c.alpha()]
        });
    }

    fn blend_rows(
        &mut self,
        origin: IVec2,
        size: UVec2,
        mut sample: impl FnMut(u32, u32) -> [u8; 4],
    ) {
        let dst_w = self.width() as i64;
        let dst_h = self.height() as i64;
        let x0 = (origin.x as i64).max(0);
        let y0 = (origin.y as i64).max(0);
        let x1 = (origin.x as i64 + size.x as i64).min(dst_w);
        let y1 = (origin.y as i64 + size.y as i64).min(dst_h);
        if x0 >= x1 || y0 >= y1 {
            return;
        }

        let stride = dst_w as usize * 4;
        let dst: &mut [u8] = &mut self.image;
        for dy in y0..y1 {
            let sy = (dy - origin.y as i64) as u32;
            let row = dy as usize * stride;
            for dx in x0..x1 {
                let sx = (dx - origin.x as i64) as u32;
                let i = row + dx as usize * 4;
                blend_pixel(&mut dst[i..i + 4], sample(sx, sy));
            }
        }
    }

    /// Encode the raster as PNG at `path`.
    pub fn save_png(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        self.image
            .save_with_format(path, image::ImageFormat::Png)
            .map_err(|e| match e {
                image::ImageError::IoError(io) => Error::Io(io),
                other => {
                    Error::Other(format!("failed to encode '{}': {other}", path.display()))
                }
            })
    }
}

/// Straight-alpha source-over of `src` onto the 4-byte pixel `dst`.
#[inline]
pub(crate) fn blend_pixel(dst: &mut [u8], src: [u8; 4]) {
    let sa = src[3] as u32;
    if sa == 0 {
        return;
    }
    if sa == 255 {
        dst.copy_from_slice(&src);
        return;
    }

    let da = dst[3] as u32;
    let inv = 255 - sa;
    // Alpha scaled by 255 to keep the channel math in integers.
    let out_a = sa * 255 + da * inv;
    let half = out_a / 2;
    for c in 0..3 {
        let num = src[c] as u32 * sa * 255 + dst[c] as u32 * da * inv;
        dst[c] = ((num + half) / out_a).min(255) as u8;
    }
    dst[3] = ((out_a + 127) / 255) as u8;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_raster_is_transparent() {
        let raster = Raster::new(3, 2);
        assert_eq!(raster.size(), UVec2::new(3, 2));
        assert!(raster.as_raw().iter().all(|b| *b == 0));
    }

    #[test]
    fn from_rgba_rejects_wrong_length() {
        assert!(Raster::from_rgba(2, 2, vec![0; 15]).is_err());
        assert!(Raster::from_rgba(2, 2, vec![0; 16]).is_ok());
    }

    #[test]
    fn opaque_source_replaces_destination() {
        let mut dst = [10, 20, 30, 255];
        blend_pixel(&mut dst, [200, 100, 50, 255]);
        assert_eq!(dst, [200, 100, 50, 255]);
    }

    #[test]
    fn transparent_source_leaves_destination() {
        let mut dst = [10, 20, 30, 40];
        blend_pixel(&mut dst, [200, 100, 50, 0]);
        assert_eq!(dst, [10, 20, 30, 40]);
    }

    #[test]
    fn translucent_over_empty_keeps_straight_color() {
        let mut dst = [0, 0, 0, 0];
        blend_pixel(&mut dst, [200, 100, 50, 128]);
        assert_eq!(dst, [200, 100, 50, 128]);
    }

    #[test]
    fn half_alpha_over_opaque_mixes_evenly() {
        let mut dst = [0, 0, 0, 255];
        blend_pixel(&mut dst, [255, 255, 255, 128]);
        assert_eq!(dst[3], 255);
        assert_eq!(dst[0], 128);
    }

    #[test]
    fn blend_over_clips_negative_origin() {
        let mut dst = Raster::new(4, 4);
        let src = Raster::filled(3, 3, [255, 0, 0, 255]);
        dst.blend_over(&src, IVec2::new(-2, -2));
        assert_eq!(dst.pixel(0, 0), Some([255, 0, 0, 255]));
        assert_eq!(dst.pixel(1, 0), Some([0, 0, 0, 0]));
        assert_eq!(dst.pixel(0, 1), Some([0, 0, 0, 0]));
    }

    #[test]
    fn blend_over_outside_bounds_is_noop() {
        let mut dst = Raster::new(4, 4);
        let src = Raster::filled(3, 3, [255, 0, 0, 255]);
        dst.blend_over(&src, IVec2::new(10, 10));
        dst.blend_over(&src, IVec2::new(-3, 0));
        assert!(dst.as_raw().iter().all(|b| *b == 0));
    }

    #[test]
    fn blend_pixmap_demultiplies() {
        let mut pixmap = tiny_skia::Pixmap::new(1, 1).expect("pixmap");
        pixmap.fill(tiny_skia::Color::from_rgba8(255, 0, 0, 255));
        let mut dst = Raster::new(2, 1);
        dst.blend_pixmap(&pixmap, IVec2::new(1, 0));
        assert_eq!(dst.pixel(1, 0), Some([255, 0, 0, 255]));
        assert_eq!(dst.pixel(0, 0), Some([0, 0, 0, 0]));
    }

    #[test]
    fn blend_scaled_stretches_and_clips() {
        let mut src = Raster::new(2, 1);
        src.blend_over(&Raster::filled(1, 1, [255, 0, 0, 255]), IVec2::ZERO);
        src.blend_over(&Raster::filled(1, 1, [0, 0, 255, 255]), IVec2::new(1, 0));

        let mut dst = Raster::new(6, 2);
        dst.blend_scaled(&src, IVec2::new(-1, 0), UVec2::new(8, 2));
        // Left edge stays red, right edge blue, the middle mixes.
        assert_eq!(dst.pixel(0, 0), Some([255, 0, 0, 255]));
        assert_eq!(dst.pixel(5, 1), Some([0, 0, 255, 255]));
        let mid = dst.pixel(3, 0).expect("pixel");
        assert!(mid[0] > 0 && mid[2] > 0 && mid[3] == 255);
    }

    #[test]
    fn blend_scaled_handles_huge_sizes_without_allocating() {
        let mut dst = Raster::new(3, 3);
        let src = Raster::filled(1, 1, [9, 8, 7, 255]);
        dst.blend_scaled(&src, IVec2::new(-5, -5), UVec2::new(u32::MAX, u32::MAX));
        assert_eq!(dst, Raster::filled(3, 3, [9, 8, 7, 255]));
    }

    #[test]
    fn resized_changes_dimensions() {
        let src = Raster::filled(4, 4, [0, 255, 0, 255]);
        let scaled = src.resized(UVec2::new(8, 2));
        assert_eq!(scaled.size(), UVec2::new(8, 2));
        assert_eq!(scaled.pixel(7, 1), Some([0, 255, 0, 255]));
    }
}
