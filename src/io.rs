//! Source-image helpers backed by the `image` crate.
//!
//! Available when the `image-io` feature is enabled. Only the image header is
//! read; pixel data stays with the preprocessing side.

use crate::geometry::ScaleFactors;
use crate::util::{YoloPostError, YoloPostResult};
use std::path::Path;

/// Reads the width and height of an image file.
pub fn source_dimensions<P: AsRef<Path>>(path: P) -> YoloPostResult<(u32, u32)> {
    image::image_dimensions(path).map_err(|err| YoloPostError::ImageIo {
        reason: err.to_string(),
    })
}

/// Scale factors mapping a network input of `input_width x input_height`
/// back onto the image stored at `path`.
pub fn scale_for_image<P: AsRef<Path>>(
    path: P,
    input_width: u32,
    input_height: u32,
) -> YoloPostResult<ScaleFactors> {
    let (width, height) = source_dimensions(path)?;
    ScaleFactors::from_dims(width, height, input_width, input_height)
}
