//! Callout painter.
//!
//! Paint order is shadow, box fill, tail, box outline, text. Later strokes cover the seams left by
//! earlier ones. Everything is drawn into an overlay pixmap covering the callout's bounds, which
//! is then blended onto the raster, so content outside the raster is clipped.
use glam::{IVec2, Vec2};
use tiny_skia::{FillRule, Paint, Path, PathBuilder, Pixmap, PixmapPaint, Rect, Stroke, Transform};
use tracing::warn;

use super::blur::gaussian_blur;
use super::layout::CalloutLayout;
use super::style::CalloutStyle;
use super::typeset::Typesetter;
use crate::raster::Raster;

/// Cubic approximation factor for quarter circles: `4/3 * tan(pi/8)`.
const KAPPA: f32 = 0.552_284_8;

/// Paint a laid-out callout onto `raster`.
///
/// Text lines start at `box_left + padding.left`; line `i` has the top of its ascent at
/// `box_top + padding.top + i * line_height`. A style failing [`CalloutStyle::validate`] paints
/// nothing.
pub fn paint(
    raster: &mut Raster,
    layout: &CalloutLayout,
    style: &CalloutStyle,
    typesetter: &dyn Typesetter,
) {
    if let Err(e) = style.validate() {
        warn!("Not painting callout with invalid style: {}", e);
        return;
    }
    let Some((origin, size)) = overlay_region(raster, layout, style) else {
        return;
    };
    let Some(mut overlay) = Pixmap::new(size.x as u32, size.y as u32) else {
        return;
    };
    let to_overlay = Transform::from_translate(-origin.x as f32, -origin.y as f32);

    let radius = clamped_radius(style.corner_radius, layout.box_width, layout.box_height);
    let Some(body) = rounded_rect_path(
        layout.box_left,
        layout.box_top,
        layout.box_width,
        layout.box_height,
        radius,
    ) else {
        return;
    };

    if style.has_shadow() {
        paint_shadow(&mut overlay, &body, style, to_overlay);
    }

    let fill = solid(style.fill_color);
    overlay.fill_path(&body, &fill, FillRule::Winding, to_overlay, None);

    let border = solid(style.border_color);
    let stroke = Stroke {
        width: style.border_width,
        ..Default::default()
    };
    let draw_border = style.border_width > 0.0 && style.border_color[3] > 0;

    if style.tail_size > 0.0 {
        let (kite, edges) = tail_paths(layout, style.tail_size);
        if let Some(kite) = kite {
            overlay.fill_path(&kite, &fill, FillRule::Winding, to_overlay, None);
        }
        if let Some(edges) = edges.filter(|_| draw_border) {
            overlay.stroke_path(&edges, &border, &stroke, to_overlay, None);
        }
    }

    if draw_border {
        overlay.stroke_path(&body, &border, &stroke, to_overlay, None);
    }

    let text_left = layout.box_left + style.padding.left - origin.x as f32;
    let text_top = layout.box_top + style.padding.top - origin.y as f32;
    for (i, line) in layout.lines.iter().enumerate() {
        if line.is_empty() {
            continue;
        }
        let line_origin = Vec2::new(text_left, text_top + i as f32 * style.line_height);
        typesetter.draw_line(&mut overlay, line, &style.font, line_origin, style.text_color);
    }

    raster.blend_pixmap(&overlay, origin);
}

/// Pixel region, in raster coordinates, that the callout can touch, clipped to the raster plus
/// the blur margin so the shadow still sees its surroundings.
fn overlay_region(
    raster: &Raster,
    layout: &CalloutLayout,
    style: &CalloutStyle,
) -> Option<(IVec2, IVec2)> {
    let (min, max) = layout.bounds();
    if !(min.is_finite() && max.is_finite()) {
        return None;
    }
    let blur_reach = if style.has_shadow() {
        (style.shadow_blur * 3.0).ceil() + style.shadow_offset_y.abs()
    } else {
        0.0
    };
    let margin = blur_reach + style.border_width + 2.0;

    let clip_min = Vec2::splat(-margin);
    let clip_max = Vec2::new(raster.width() as f32, raster.height() as f32) + margin;
    let lo = (min - margin).max(clip_min).floor();
    let hi = (max + margin).min(clip_max).ceil();
    if lo.x >= hi.x || lo.y >= hi.y {
        return None;
    }
    if lo.x >= raster.width() as f32 || lo.y >= raster.height() as f32 {
        return None;
    }
    let origin = lo.as_ivec2();
    Some((origin, hi.as_ivec2() - origin))
}

fn solid(color: [u8; 4]) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color_rgba8(color[0], color[1], color[2], color[3]);
    paint.anti_alias = true;
    paint
}

/// Corner radius limited to half of the smaller box side.
pub(crate) fn clamped_radius(radius: f32, width: f32, height: f32) -> f32 {
    radius.clamp(0.0, (width.min(height) / 2.0).max(0.0))
}

pub(crate) fn rounded_rect_path(x: f32, y: f32, w: f32, h: f32, r: f32) -> Option<Path> {
    if r <= 0.0 {
        return Rect::from_xywh(x, y, w, h).map(PathBuilder::from_rect);
    }
    let k = r * KAPPA;
    let (right, bottom) = (x + w, y + h);
    let mut pb = PathBuilder::new();
    pb.move_to(x + r, y);
    pb.line_to(right - r, y);
    pb.cubic_to(right - r + k, y, right, y + r - k, right, y + r);
    pb.line_to(right, bottom - r);
    pb.cubic_to(right, bottom - r + k, right - r + k, bottom, right - r, bottom);
    pb.line_to(x + r, bottom);
    pb.cubic_to(x + r - k, bottom, x, bottom - r + k, x, bottom - r);
    pb.line_to(x, y + r);
    pb.cubic_to(x, y + r - k, x + r - k, y, x + r, y);
    pb.close();
    pb.finish()
}

/// Kite shape for the tail and the open path of its two lower edges.
///
/// The kite's upper half overlaps the box bottom; the outline stroked afterwards stays on top.
fn tail_paths(layout: &CalloutLayout, tail_size: f32) -> (Option<Path>, Option<Path>) {
    let apex = layout.tail_apex();
    let base_y = layout.box_bottom();
    let half = tail_size * 0.75;

    let mut kite = PathBuilder::new();
    kite.move_to(apex.x, apex.y);
    kite.line_to(apex.x - half, base_y);
    kite.line_to(apex.x, base_y - tail_size);
    kite.line_to(apex.x + half, base_y);
    kite.close();

    let mut edges = PathBuilder::new();
    edges.move_to(apex.x - half, base_y);
    edges.line_to(apex.x, apex.y);
    edges.line_to(apex.x + half, base_y);

    (kite.finish(), edges.finish())
}

fn paint_shadow(overlay: &mut Pixmap, body: &Path, style: &CalloutStyle, to_overlay: Transform) {
    let Some(mut shadow) = Pixmap::new(overlay.width(), overlay.height()) else {
        return;
    };
    let offset = to_overlay.pre_translate(0.0, style.shadow_offset_y);
    shadow.fill_path(
        body,
        &solid(style.shadow_color),
        FillRule::Winding,
        offset,
        None,
    );
    gaussian_blur(&mut shadow, style.shadow_blur);
    overlay.draw_pixmap(
        0,
        0,
        shadow.as_ref(),
        &PixmapPaint::default(),
        Transform::identity(),
        None,
    );
}
