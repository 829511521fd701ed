//! Font metrics and glyph drawing for callout text.
//!
//! - [`Typesetter`] is the seam the layout engine measures with and the painter draws with.
//! - [`BlockTypesetter`] draws fixed-advance block glyphs; metrics are exact and font-free.
//! - [`OutlineTypesetter`] renders TrueType/OpenType outlines parsed with `ttf-parser`.
use std::path::Path;
use std::sync::Arc;

use glam::Vec2;
use tiny_skia::{FillRule, Paint, PathBuilder, Pixmap, Rect, Transform};

use super::style::FontSpec;
use crate::error::{Error, Result};

/// Measures and draws single lines of text.
pub trait Typesetter: Send + Sync {
    /// Advance width of `text` at `font`, in pixels.
    fn measure(&self, text: &str, font: &FontSpec) -> f32;

    /// Draw `text` into `pixmap` starting at `origin`.
    ///
    /// `origin.x` is the pen start and `origin.y` the top of the font's ascent, so the baseline
    /// sits at `origin.y + ascent`. Drawing is clipped to the pixmap.
    fn draw_line(
        &self,
        pixmap: &mut Pixmap,
        text: &str,
        font: &FontSpec,
        origin: Vec2,
        color: [u8; 4],
    );
}

fn solid_paint(color: [u8; 4]) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color_rgba8(color[0], color[1], color[2], color[3]);
    paint.anti_alias = true;
    paint
}

/// Font-free typesetter drawing each visible character as a solid block.
///
/// Blocks span the whole ascent, `0.7 * size_px`, from the line top down to the baseline.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BlockTypesetter {
    /// Advance per character as a fraction of the font size.
    pub advance_ratio: f32,
}

impl Default for BlockTypesetter {
    fn default() -> Self {
        Self { advance_ratio: 0.6 }
    }
}

impl BlockTypesetter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_advance_ratio(mut self, advance_ratio: f32) -> Self {
        self.advance_ratio = advance_ratio;
        self
    }

    fn advance(&self, font: &FontSpec) -> f32 {
        font.size_px * self.advance_ratio
    }

    pub fn ascent(&self, font: &FontSpec) -> f32 {
        font.size_px * 0.7
    }
}

impl Typesetter for BlockTypesetter {
    fn measure(&self, text: &str, font: &FontSpec) -> f32 {
        text.chars().count() as f32 * self.advance(font)
    }

    fn draw_line(
        &self,
        pixmap: &mut Pixmap,
        text: &str,
        font: &FontSpec,
        origin: Vec2,
        color: [u8; 4],
    ) {
        let advance = self.advance(font);
        let glyph_height = self.ascent(font);
        let paint = solid_paint(color);

        for (i, ch) in text.chars().enumerate() {
            if ch.is_whitespace() {
                continue;
            }
            let left = origin.x + i as f32 * advance + advance * 0.1;
            let Some(rect) =
                Rect::from_xywh(left, origin.y, advance * 0.8, glyph_height)
            else {
                continue;
            };
            pixmap.fill_rect(rect, &paint, Transform::identity(), None);
        }
    }
}

/// Converts `ttf-parser` outline commands into a `tiny-skia` path in font units.
struct GlyphPathBuilder {
    builder: PathBuilder,
}

impl ttf_parser::OutlineBuilder for GlyphPathBuilder {
    fn move_to(&mut self, x: f32, y: f32) {
        self.builder.move_to(x, y);
    }

    fn line_to(&mut self, x: f32, y: f32) {
        self.builder.line_to(x, y);
    }

    fn quad_to(&mut self, x1: f32, y1: f32, x: f32, y: f32) {
        self.builder.quad_to(x1, y1, x, y);
    }

    fn curve_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, x: f32, y: f32) {
        self.builder.cubic_to(x1, y1, x2, y2, x, y);
    }

    fn close(&mut self) {
        self.builder.close();
    }
}

/// Typesetter backed by a single TrueType/OpenType face.
///
/// Measurement sums horizontal advances without kerning or shaping. Characters missing from the
/// face use the `.notdef` glyph.
#[derive(Clone)]
pub struct OutlineTypesetter {
    data: Arc<[u8]>,
    face_index: u32,
}

impl std::fmt::Debug for OutlineTypesetter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutlineTypesetter")
            .field("bytes", &self.data.len())
            .field("face_index", &self.face_index)
            .finish()
    }
}

impl OutlineTypesetter {
    /// Parse the first face of a font file held in memory.
    pub fn from_bytes(data: impl Into<Arc<[u8]>>) -> Result<Self> {
        Self::from_collection(data, 0)
    }

    /// Parse face `face_index` of a font collection held in memory.
    pub fn from_collection(data: impl Into<Arc<[u8]>>, face_index: u32) -> Result<Self> {
        let data = data.into();
        ttf_parser::Face::parse(&data, face_index)
            .map_err(|e| Error::Font(format!("cannot parse face {face_index}: {e}")))?;
        Ok(Self { data, face_index })
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        Self::from_bytes(bytes)
    }

    fn face(&self) -> Option<ttf_parser::Face<'_>> {
        ttf_parser::Face::parse(&self.data, self.face_index).ok()
    }
}

fn glyph_for(face: &ttf_parser::Face<'_>, ch: char) -> ttf_parser::GlyphId {
    face.glyph_index(ch).unwrap_or(ttf_parser::GlyphId(0))
}

fn units_scale(face: &ttf_parser::Face<'_>, font: &FontSpec) -> f32 {
    font.size_px / face.units_per_em().max(1) as f32
}

impl Typesetter for OutlineTypesetter {
    fn measure(&self, text: &str, font: &FontSpec) -> f32 {
        let Some(face) = self.face() else {
            return 0.0;
        };
        let scale = units_scale(&face, font);
        text.chars()
            .map(|ch| face.glyph_hor_advance(glyph_for(&face, ch)).unwrap_or(0) as f32)
            .sum::<f32>()
            * scale
    }

    fn draw_line(
        &self,
        pixmap: &mut Pixmap,
        text: &str,
        font: &FontSpec,
        origin: Vec2,
        color: [u8; 4],
    ) {
        let Some(face) = self.face() else {
            return;
        };
        let scale = units_scale(&face, font);
        let baseline = origin.y + face.ascender() as f32 * scale;
        let paint = solid_paint(color);

        let mut pen_x = origin.x;
        for ch in text.chars() {
            let glyph = glyph_for(&face, ch);
            let mut outline = GlyphPathBuilder {
                builder: PathBuilder::new(),
            };
            if face.outline_glyph(glyph, &mut outline).is_some() {
                if let Some(path) = outline.builder.finish() {
                    // Font units are y-up; flip onto the y-down pixmap.
                    let transform = Transform::from_row(scale, 0.0, 0.0, -scale, pen_x, baseline);
                    pixmap.fill_path(&path, &paint, FillRule::Winding, transform, None);
                }
            }
            pen_x += face.glyph_hor_advance(glyph).unwrap_or(0) as f32 * scale;
        }
    }
}

#[cfg(test)]
mod tests {
    use ttf_parser::OutlineBuilder;

    use super::*;

    #[test]
    fn block_measure_is_linear_in_characters() {
        let ts = BlockTypesetter::new();
        let font = FontSpec::new("mono", 10.0);
        assert_eq!(ts.measure("", &font), 0.0);
        assert_eq!(ts.measure("abc", &font), 18.0);
        assert_eq!(ts.measure("abcd", &font) - ts.measure("abc", &font), 6.0);
    }

    #[test]
    fn block_draw_line_marks_pixels_inside_line_box() {
        let ts = BlockTypesetter::new();
        let font = FontSpec::new("mono", 10.0);
        let mut pixmap = Pixmap::new(40, 20).expect("pixmap");
        ts.draw_line(&mut pixmap, "ab", &font, Vec2::new(2.0, 0.0), [0, 0, 0, 255]);

        let painted: Vec<(u32, u32)> = pixmap
            .pixels()
            .iter()
            .enumerate()
            .filter(|(_, p)| p.alpha() > 0)
            .map(|(i, _)| (i as u32 % 40, i as u32 / 40))
            .collect();
        assert!(!painted.is_empty());
        assert!(painted.iter().all(|(x, _)| *x >= 2 && *x < 2 + 12));
    }

    #[test]
    fn block_glyphs_start_at_the_line_top() {
        let ts = BlockTypesetter::new();
        let font = FontSpec::new("mono", 10.0);
        let mut pixmap = Pixmap::new(20, 30).expect("pixmap");
        ts.draw_line(&mut pixmap, "a", &font, Vec2::new(0.0, 12.0), [0, 0, 0, 255]);

        let rows: Vec<u32> = (0..30)
            .filter(|y| (0..20).any(|x| pixmap.pixels()[(y * 20 + x) as usize].alpha() > 0))
            .collect();
        assert_eq!(rows.first(), Some(&12));
        assert!(rows.iter().all(|y| *y >= 12 && *y < 12 + 7 + 1));
        assert_eq!(pixmap.pixels()[12 * 20 + 3].alpha(), 255);
        assert!((ts.ascent(&font) - 7.0).abs() < 1e-5);
    }

    #[test]
    fn whitespace_draws_nothing() {
        let ts = BlockTypesetter::new();
        let mut pixmap = Pixmap::new(20, 20).expect("pixmap");
        ts.draw_line(
            &mut pixmap,
            "   ",
            &FontSpec::default(),
            Vec2::ZERO,
            [0, 0, 0, 255],
        );
        assert!(pixmap.pixels().iter().all(|p| p.alpha() == 0));
    }

    #[test]
    fn outline_typesetter_rejects_garbage() {
        let err = OutlineTypesetter::from_bytes(vec![0u8; 16]).expect_err("not a font");
        assert!(matches!(err, Error::Font(_)));
    }

    #[test]
    fn outline_builder_produces_path() {
        let mut b = GlyphPathBuilder {
            builder: PathBuilder::new(),
        };
        b.move_to(0.0, 0.0);
        b.line_to(10.0, 0.0);
        b.quad_to(15.0, 5.0, 10.0, 10.0);
        b.curve_to(8.0, 12.0, 2.0, 12.0, 0.0, 10.0);
        b.close();
        let path = b.builder.finish().expect("path");
        assert_eq!(path.bounds().left(), 0.0);
        assert!(path.bounds().right() >= 10.0);
    }
}
