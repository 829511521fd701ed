//! Shared helpers for the example binaries.
use std::path::{Path, PathBuf};

use anyhow::Context;
use glam::{IVec2, Vec2};
use map_canvas::prelude::Raster;
use rand::Rng as RngCore;
use tracing_subscriber::EnvFilter;

/// Install a `fmt` subscriber filtered by `RUST_LOG` (default `info`).
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// Output location for an example PNG, under `target/examples-output/`.
pub fn output_path(name: &str) -> anyhow::Result<PathBuf> {
    let dir = Path::new("target").join("examples-output");
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("creating output directory {}", dir.display()))?;
    Ok(dir.join(name))
}

/// Uniform float in \[0,1).
pub fn rand01(rng: &mut impl RngCore) -> f32 {
    (rng.next_u32() as f32) / ((u32::MAX as f32) + 1.0)
}

/// `count` uniformly distributed points inside `min..max`.
pub fn scatter_points(rng: &mut impl RngCore, count: usize, min: Vec2, max: Vec2) -> Vec<Vec2> {
    (0..count)
        .map(|_| min + (max - min) * Vec2::new(rand01(rng), rand01(rng)))
        .collect()
}

/// A map-like tile: land tint, a grid of "streets" and a diagonal "river".
pub fn procedural_tile(size: u32, tile: IVec2) -> Raster {
    let hue = ((tile.x * 31 + tile.y * 17).rem_euclid(40)) as u8;
    let mut raster = Raster::filled(size, size, [232 - hue / 2, 228, 214 + hue / 4, 255]);

    let street = Raster::filled(size, 3, [255, 255, 255, 255]);
    let avenue = Raster::filled(3, size, [255, 255, 255, 255]);
    for i in (0..size).step_by(64) {
        raster.blend_over(&street, IVec2::new(0, i as i32 + 30));
        raster.blend_over(&avenue, IVec2::new(i as i32 + 20, 0));
    }

    let water = Raster::filled(6, 6, [150, 190, 230, 200]);
    for i in (0..size as i32).step_by(3) {
        raster.blend_over(&water, IVec2::new(i, (i + tile.x * 40).rem_euclid(size as i32)));
    }
    raster
}

/// Write a simple pin-shaped marker icon to `path`.
pub fn write_marker_png(path: &Path, rgba: [u8; 4]) -> anyhow::Result<()> {
    let mut pin = Raster::new(25, 41);
    pin.blend_over(&Raster::filled(21, 21, rgba), IVec2::new(2, 2));
    pin.blend_over(&Raster::filled(7, 16, rgba), IVec2::new(9, 23));
    pin.blend_over(&Raster::filled(7, 7, [255, 255, 255, 255]), IVec2::new(9, 9));
    pin.save_png(path)
        .with_context(|| format!("writing marker {}", path.display()))
}
