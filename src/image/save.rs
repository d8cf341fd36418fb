//! Tensor-to-image conversion and image saving.

use std::path::Path;

use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};

use crate::error::{Error, Result};

use super::{ImageTensor, TensorLayout, RGB_CHANNELS};

/// Save an image, inferring the format from the extension.
///
/// A path without an extension is written as PNG.
/// JPEG output is flattened to RGB and encoded at `quality` (1-100); other
/// formats use the encoder defaults.
///
/// # Errors
///
/// Returns an error if the image cannot be encoded or written.
pub fn save_image<P: AsRef<Path>>(img: &DynamicImage, path: P, quality: u8) -> Result<()> {
    let path = path.as_ref();

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase);

    let saved = match extension.as_deref() {
        Some("jpg" | "jpeg") => {
            let mut output = std::fs::File::create(path)?;
            let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut output, quality);
            DynamicImage::ImageRgb8(img.to_rgb8()).write_with_encoder(encoder)
        }
        Some(_) => img.save(path),
        None => img.save_with_format(path, ImageFormat::Png),
    };

    saved.map_err(|source| Error::ImageSave {
        path: path.to_path_buf(),
        source,
    })?;

    tracing::debug!("Wrote {}", path.display());
    Ok(())
}

/// Convert a normalized tensor back into an opaque RGBA image.
///
/// # Errors
///
/// Returns an error if the tensor does not have the shape `layout` describes.
pub fn tensor_to_image(tensor: &ImageTensor, layout: TensorLayout) -> Result<RgbaImage> {
    let (height, width) = layout.spatial_dims(tensor.shape())?;

    let too_large = || Error::ShapeMismatch {
        expected: "image dimensions that fit in u32".to_string(),
        actual: format!("{width}x{height}"),
    };
    let img_width = u32::try_from(width).map_err(|_| too_large())?;
    let img_height = u32::try_from(height).map_err(|_| too_large())?;

    let img = RgbaImage::from_fn(img_width, img_height, |x, y| {
        let (x, y) = (x as usize, y as usize);
        let mut px = [0u8, 0, 0, u8::MAX];
        for (c, value) in px.iter_mut().take(RGB_CHANNELS).enumerate() {
            *value = denormalize(tensor[layout.index(y, x, c)]);
        }
        Rgba(px)
    });

    Ok(img)
}

/// Map a value from [-1, 1] back to a channel byte, rounding and clamping.
#[inline]
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn denormalize(value: f32) -> u8 {
    // NaN falls through clamp and casts to 0
    let scaled = value.mul_add(127.5, 127.5).round();
    scaled.clamp(0.0, 255.0) as u8
}
