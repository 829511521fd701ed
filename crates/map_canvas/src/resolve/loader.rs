//! Image fetch/decode seam.
//!
//! - Implement [`ImageLoader`] to plug in remote fetching, asset bundles or test doubles.
//! - [`FileImageLoader`] reads local files and decodes them with the `image` crate.
use std::fs;
use std::io::Cursor;

use image::ImageReader;

use crate::error::{Error, Result};
use crate::raster::Raster;
use crate::scene::SourceLocator;

/// Fetches the bytes behind a [`SourceLocator`] and decodes them to a [`Raster`].
///
/// Failures should be reported as [`Error::Decode`]; other error variants are wrapped into one
/// by the resolver. Retries for transient failures belong here, not in the compositor.
pub trait ImageLoader: Send + Sync {
    fn load(&self, locator: &SourceLocator) -> Result<Raster>;
}

/// Decode an encoded image (format sniffed from the bytes) into a straight-alpha raster.
pub fn decode_image(bytes: &[u8], locator: &SourceLocator) -> Result<Raster> {
    let decoded = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| decode_error(locator, e))?
        .decode()
        .map_err(|e| decode_error(locator, e))?;
    Ok(Raster::from_image(decoded.to_rgba8()))
}

fn decode_error(locator: &SourceLocator, reason: impl std::fmt::Display) -> Error {
    Error::Decode {
        locator: locator.to_string(),
        reason: reason.to_string(),
    }
}

/// Loads images from the local filesystem.
#[derive(Clone, Copy, Debug, Default)]
pub struct FileImageLoader;

impl FileImageLoader {
    pub fn new() -> Self {
        Self
    }
}

impl ImageLoader for FileImageLoader {
    fn load(&self, locator: &SourceLocator) -> Result<Raster> {
        match locator {
            SourceLocator::Path(path) => {
                let bytes = fs::read(path).map_err(|e| decode_error(locator, e))?;
                decode_image(&bytes, locator)
            }
            SourceLocator::Url(_) => Err(decode_error(
                locator,
                "remote sources need a network-capable loader",
            )),
        }
    }
}
