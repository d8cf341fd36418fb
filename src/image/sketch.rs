//! Pencil-sketch effect used to derive an extra input panel from a photo.

use image::{GrayImage, Luma, Rgba, RgbImage, RgbaImage};
use imageproc::filter::gaussian_blur_f32;

/// Nominal Gaussian kernel size of the sketch blur.
pub const SKETCH_KERNEL_SIZE: u32 = 21;

/// Sigma for a kernel of `size` when none is given, as vision libraries
/// derive it: `0.3 * ((size - 1) * 0.5 - 1) + 0.8`.
#[allow(clippy::cast_precision_loss)]
fn sigma_for_kernel(size: u32) -> f32 {
    0.3_f32.mul_add((size as f32 - 1.0).mul_add(0.5, -1.0), 0.8)
}

/// Render `rgb` as a pencil sketch.
///
/// Gray, inverted, blurred, inverted again, then color-dodge divided:
/// `gray * dodge_scale / inverted_blur`, saturating at 255. A zero divisor
/// yields black. The result is gray expanded to opaque RGBA.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn pencil_sketch(rgb: &RgbImage, dodge_scale: f32) -> RgbaImage {
    let gray = to_gray(rgb);

    let mut inverted = gray.clone();
    image::imageops::invert(&mut inverted);

    let mut blurred = gaussian_blur_f32(&inverted, sigma_for_kernel(SKETCH_KERNEL_SIZE));
    image::imageops::invert(&mut blurred);

    RgbaImage::from_fn(rgb.width(), rgb.height(), |x, y| {
        let g = f32::from(gray.get_pixel(x, y)[0]);
        let divisor = f32::from(blurred.get_pixel(x, y)[0]);

        let value = if divisor == 0.0 {
            0
        } else {
            (g * dodge_scale / divisor).round().clamp(0.0, 255.0) as u8
        };
        Rgba([value, value, value, u8::MAX])
    })
}

/// Luminosity gray: 0.299*R + 0.587*G + 0.114*B.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn to_gray(rgb: &RgbImage) -> GrayImage {
    GrayImage::from_fn(rgb.width(), rgb.height(), |x, y| {
        let [r, g, b] = rgb.get_pixel(x, y).0;
        let luma = 0.299_f32
            .mul_add(f32::from(r), 0.587_f32.mul_add(f32::from(g), 0.114 * f32::from(b)))
            .round()
            .clamp(0.0, 255.0) as u8;
        Luma([luma])
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_sigma_for_default_kernel() {
        assert!((sigma_for_kernel(SKETCH_KERNEL_SIZE) - 3.5).abs() < 1e-5);
    }

    #[test]
    fn test_flat_image_sketches_white() {
        let rgb = RgbImage::from_pixel(32, 24, Rgb([100, 100, 100]));
        let sketch = pencil_sketch(&rgb, 256.0);

        assert_eq!(sketch.dimensions(), (32, 24));
        assert!(sketch.pixels().all(|p| p[0] >= 250 && p[0] == p[1] && p[1] == p[2]));
    }

    #[test]
    fn test_black_image_divides_by_zero_to_black() {
        let rgb = RgbImage::new(16, 16);
        let sketch = pencil_sketch(&rgb, 256.0);

        assert!(sketch.pixels().all(|p| p.0 == [0, 0, 0, 255]));
    }

    #[test]
    fn test_edges_darken() {
        // Dark on the left, light on the right: the dark side of the boundary
        // draws a line, flat regions stay white.
        let rgb = RgbImage::from_fn(64, 8, |x, _| {
            if x < 32 {
                Rgb([100, 100, 100])
            } else {
                Rgb([200, 200, 200])
            }
        });
        let sketch = pencil_sketch(&rgb, 256.0);

        assert!(sketch.get_pixel(5, 4)[0] >= 250);
        assert!(sketch.get_pixel(31, 4)[0] < 200);
        assert!(sketch.get_pixel(60, 4)[0] >= 250);
        assert!(sketch.pixels().all(|p| p[3] == 255));
    }

    #[test]
    fn test_gray_weights() {
        let rgb = RgbImage::from_fn(3, 1, |x, _| match x {
            0 => Rgb([255, 0, 0]),
            1 => Rgb([0, 255, 0]),
            _ => Rgb([0, 0, 255]),
        });
        let gray = to_gray(&rgb);

        assert_eq!(gray.get_pixel(0, 0)[0], 76);
        assert_eq!(gray.get_pixel(1, 0)[0], 150);
        assert_eq!(gray.get_pixel(2, 0)[0], 29);
    }

    #[test]
    fn test_unit_dodge_scale_is_nearly_black() {
        let rgb = RgbImage::from_pixel(32, 32, Rgb([100, 100, 100]));
        let sketch = pencil_sketch(&rgb, 1.0);

        assert!(sketch.pixels().all(|p| p.0 == [1, 1, 1, 255]));
    }
}
