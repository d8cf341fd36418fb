//! Image loading and conversion to normalized tensors.

use std::path::Path;

use image::{imageops::FilterType, DynamicImage, RgbImage};
use ndarray::Array4;

use crate::error::{Error, Result};

use super::{ImageTensor, TensorLayout, RGB_CHANNELS};

/// Load an image from disk (a gallery pick).
///
/// # Errors
///
/// Returns an error if the file cannot be read or decoded.
pub fn load_image<P: AsRef<Path>>(path: P) -> Result<DynamicImage> {
    let path = path.as_ref();

    let img = image::open(path).map_err(|source| Error::ImageLoad {
        path: path.to_path_buf(),
        source,
    })?;

    tracing::debug!(
        "Loaded {} ({}x{})",
        path.display(),
        img.width(),
        img.height()
    );
    Ok(img)
}

/// Decode an encoded image held in memory (a camera capture).
///
/// The format is guessed from the leading bytes.
///
/// # Errors
///
/// Returns an error if the bytes are not a supported image.
pub fn decode_image(bytes: &[u8]) -> Result<DynamicImage> {
    image::load_from_memory(bytes).map_err(|source| Error::ImageDecode { source })
}

/// Scale an image to the model's square resolution.
///
/// The aspect ratio is not preserved; smaller images are upscaled.
#[must_use]
pub fn scale_to_model(img: &DynamicImage, size: u32) -> RgbImage {
    img.resize_exact(size, size, FilterType::Triangle).to_rgb8()
}

/// Map a channel byte into [-1, 1].
#[inline]
#[must_use]
pub fn normalize(value: u8) -> f32 {
    (f32::from(value) - 127.5) / 127.5
}

/// Convert an already scaled RGB image into a normalized tensor.
///
/// Alpha is dropped; only the three color channels are read.
#[must_use]
pub fn rgb_to_tensor(rgb: &RgbImage, layout: TensorLayout) -> ImageTensor {
    let (width, height) = (rgb.width() as usize, rgb.height() as usize);

    let shape = match layout {
        TensorLayout::Nhwc => [1, height, width, RGB_CHANNELS],
        TensorLayout::Nchw => [1, RGB_CHANNELS, height, width],
    };
    let mut tensor = Array4::<f32>::zeros(shape);

    for (x, y, pixel) in rgb.enumerate_pixels() {
        let (x, y) = (x as usize, y as usize);
        for c in 0..RGB_CHANNELS {
            tensor[layout.index(y, x, c)] = normalize(pixel[c]);
        }
    }

    tensor
}

/// Scale an image to `size x size` and convert it to a normalized tensor.
#[must_use]
pub fn image_to_tensor(img: &DynamicImage, size: u32, layout: TensorLayout) -> ImageTensor {
    rgb_to_tensor(&scale_to_model(img, size), layout)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgb, Rgba, RgbaImage};
    use rand::{rngs::StdRng, Rng, SeedableRng};
    use std::io::Cursor;

    #[test]
    fn test_tensor_shape() {
        let img = DynamicImage::new_rgb8(100, 100);
        let tensor = image_to_tensor(&img, 256, TensorLayout::Nhwc);

        assert_eq!(tensor.shape(), &[1, 256, 256, 3]);
    }

    #[test]
    fn test_non_square_inputs_match_model_shape() {
        let mut rng = StdRng::seed_from_u64(7);

        for _ in 0..16 {
            let width = rng.random_range(1..400);
            let height = rng.random_range(1..400);
            let img = DynamicImage::new_rgb8(width, height);

            for size in [128, 256] {
                let nhwc = image_to_tensor(&img, size, TensorLayout::Nhwc);
                assert_eq!(nhwc.shape(), &TensorLayout::Nhwc.shape(size as usize));

                let nchw = image_to_tensor(&img, size, TensorLayout::Nchw);
                assert_eq!(nchw.shape(), &TensorLayout::Nchw.shape(size as usize));
            }
        }
    }

    #[test]
    fn test_normalization_range() {
        let img = DynamicImage::new_rgb8(100, 100);
        let tensor = image_to_tensor(&img, 128, TensorLayout::Nchw);

        let min = tensor.iter().copied().fold(f32::INFINITY, f32::min);
        let max = tensor.iter().copied().fold(f32::NEG_INFINITY, f32::max);

        // Black image should be all -1.0
        assert!((min - (-1.0)).abs() < 1e-6);
        assert!((max - (-1.0)).abs() < 1e-6);
    }

    #[test]
    fn test_normalize_endpoints() {
        assert!((normalize(0) + 1.0).abs() < f32::EPSILON);
        assert!((normalize(255) - 1.0).abs() < f32::EPSILON);
        assert!(normalize(127) < 0.0);
        assert!(normalize(128) > 0.0);
    }

    #[test]
    fn test_channel_order_and_layout() {
        let mut rgb = RgbImage::new(2, 1);
        rgb.put_pixel(1, 0, Rgb([255, 0, 127]));

        let nhwc = rgb_to_tensor(&rgb, TensorLayout::Nhwc);
        assert!((nhwc[[0, 0, 1, 0]] - 1.0).abs() < 1e-6);
        assert!((nhwc[[0, 0, 1, 1]] + 1.0).abs() < 1e-6);
        assert!((nhwc[[0, 0, 1, 2]] - normalize(127)).abs() < 1e-6);

        let nchw = rgb_to_tensor(&rgb, TensorLayout::Nchw);
        assert!((nchw[[0, 0, 0, 1]] - 1.0).abs() < 1e-6);
        assert!((nchw[[0, 1, 0, 1]] + 1.0).abs() < 1e-6);
        assert!((nchw[[0, 0, 0, 0]] + 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_alpha_is_ignored() {
        let transparent = DynamicImage::ImageRgba8(RgbaImage::from_pixel(
            4,
            4,
            Rgba([200, 100, 50, 0]),
        ));
        let opaque = DynamicImage::new_rgb8(4, 4);

        let tensor = image_to_tensor(&transparent, 4, TensorLayout::Nhwc);
        assert!((tensor[[0, 2, 2, 0]] - normalize(200)).abs() < 1e-6);
        assert_ne!(tensor, image_to_tensor(&opaque, 4, TensorLayout::Nhwc));
    }

    #[test]
    fn test_decode_image() {
        let mut encoded = Vec::new();
        DynamicImage::new_rgb8(3, 2)
            .write_to(&mut Cursor::new(&mut encoded), ImageFormat::Png)
            .unwrap();

        let img = decode_image(&encoded).unwrap();
        assert_eq!((img.width(), img.height()), (3, 2));
    }

    #[test]
    fn test_decode_garbage_fails() {
        let err = decode_image(b"definitely not an image").unwrap_err();
        assert!(matches!(err, Error::ImageDecode { .. }));
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_image("/nonexistent/photo.jpg").unwrap_err();
        assert!(matches!(err, Error::ImageLoad { .. }));
        assert!(err.to_string().contains("/nonexistent/photo.jpg"));
    }
}
