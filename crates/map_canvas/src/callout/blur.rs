//! Separable gaussian blur for premultiplied pixmaps.
use tiny_skia::{Pixmap, PremultipliedColorU8};

/// Normalized 1D gaussian kernel and its radius (`ceil(3 * sigma)`).
pub(crate) fn gaussian_kernel(sigma: f32) -> (Vec<f32>, usize) {
    let radius = (sigma.abs() * 3.0).ceil() as usize;
    if radius == 0 {
        return (Vec::new(), 0);
    }

    let two_sigma_sq = 2.0 * sigma * sigma;
    let mut kernel: Vec<f32> = (0..=radius * 2)
        .map(|i| {
            let x = i as f32 - radius as f32;
            (-x * x / two_sigma_sq).exp()
        })
        .collect();
    let sum: f32 = kernel.iter().sum();
    if sum > 0.0 {
        for k in &mut kernel {
            *k /= sum;
        }
    }
    (kernel, radius)
}

/// Blur `pixmap` in place. Edges are clamped.
pub(crate) fn gaussian_blur(pixmap: &mut Pixmap, sigma: f32) {
    let (kernel, radius) = gaussian_kernel(sigma);
    if kernel.is_empty() {
        return;
    }

    let width = pixmap.width() as usize;
    let height = pixmap.height() as usize;
    let src: Vec<[f32; 4]> = pixmap
        .pixels()
        .iter()
        .map(|p| {
            [
                p.red() as f32,
                p.green() as f32,
                p.blue() as f32,
                p.alpha() as f32,
            ]
        })
        .collect();

    let mut temp = vec![[0.0; 4]; src.len()];
    convolve(&src, &mut temp, &kernel, radius, width, height, true);
    let mut dst = vec![[0.0; 4]; src.len()];
    convolve(&temp, &mut dst, &kernel, radius, width, height, false);

    for (px, v) in pixmap.pixels_mut().iter_mut().zip(dst.iter()) {
        let a = to_u8(v[3]);
        // Rounding may push a color channel past alpha, which premultiplied storage forbids.
        *px = PremultipliedColorU8::from_rgba(
            to_u8(v[0]).min(a),
            to_u8(v[1]).min(a),
            to_u8(v[2]).min(a),
            a,
        )
        .unwrap_or(PremultipliedColorU8::TRANSPARENT);
    }
}

fn to_u8(v: f32) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}

fn convolve(
    src: &[[f32; 4]],
    dst: &mut [[f32; 4]],
    kernel: &[f32],
    radius: usize,
    width: usize,
    height: usize,
    horizontal: bool,
) {
    for y in 0..height {
        for x in 0..width {
            let mut accum = [0.0; 4];
            for (i, weight) in kernel.iter().enumerate() {
                let offset = i as isize - radius as isize;
                let idx = if horizontal {
                    let cx = (x as isize + offset).clamp(0, width as isize - 1) as usize;
                    y * width + cx
                } else {
                    let cy = (y as isize + offset).clamp(0, height as isize - 1) as usize;
                    cy * width + x
                };
                let sample = src[idx];
                for c in 0..4 {
                    accum[c] += sample[c] * weight;
                }
            }
            dst[y * width + x] = accum;
        }
    }
}
