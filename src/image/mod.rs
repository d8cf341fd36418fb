//! Image loading, tensor conversion, sketch effect, and saving utilities.

mod compose;
mod load;
mod save;
mod sketch;

pub use compose::{side_by_side, GUTTER_COLOR};
pub use load::{decode_image, image_to_tensor, load_image, normalize, rgb_to_tensor, scale_to_model};
pub use save::{denormalize, save_image, tensor_to_image};
pub use sketch::{pencil_sketch, SKETCH_KERNEL_SIZE};

use ndarray::Array4;

/// Image tensor with a batch of one. Axis order depends on [`TensorLayout`].
/// Values are normalized to [-1, 1].
pub type ImageTensor = Array4<f32>;

/// Side of the square input the bundled model expects.
pub const DEFAULT_MODEL_SIZE: u32 = 256;

/// Number of channels in RGB images.
pub const RGB_CHANNELS: usize = 3;

/// Axis order of an [`ImageTensor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TensorLayout {
    /// `[1, height, width, 3]`, channels last.
    #[default]
    Nhwc,
    /// `[1, 3, height, width]`, channels first.
    Nchw,
}

impl TensorLayout {
    /// Full tensor shape for a square image of side `size`.
    #[must_use]
    pub const fn shape(self, size: usize) -> [usize; 4] {
        match self {
            Self::Nhwc => [1, size, size, RGB_CHANNELS],
            Self::Nchw => [1, RGB_CHANNELS, size, size],
        }
    }

    /// Index of channel `c` of pixel `(x, y)`.
    #[inline]
    #[must_use]
    pub const fn index(self, y: usize, x: usize, c: usize) -> [usize; 4] {
        match self {
            Self::Nhwc => [0, y, x, c],
            Self::Nchw => [0, c, y, x],
        }
    }

    /// Height and width of a tensor in this layout, after checking the batch
    /// and channel axes.
    ///
    /// # Errors
    ///
    /// Returns an error if the batch is not 1 or there are not 3 channels.
    pub fn spatial_dims(self, shape: &[usize]) -> crate::Result<(usize, usize)> {
        let dims = match (self, shape) {
            (Self::Nhwc, &[1, h, w, RGB_CHANNELS]) | (Self::Nchw, &[1, RGB_CHANNELS, h, w]) => {
                (h, w)
            }
            _ => {
                let expected = match self {
                    Self::Nhwc => "[1, H, W, 3]",
                    Self::Nchw => "[1, 3, H, W]",
                };
                return Err(crate::Error::ShapeMismatch {
                    expected: expected.to_string(),
                    actual: format!("{shape:?}"),
                });
            }
        };
        Ok(dims)
    }
}
