#![forbid(unsafe_code)]

mod support;

pub use support::{
    init_tracing, output_path, procedural_tile, rand01, scatter_points, write_marker_png,
};
