//! Inference engines that run the image-to-image model.

use ndarray::Array4;
use ort::session::Session;
use ort::value::Tensor;

use crate::error::{Error, Result};
use crate::image::ImageTensor;

/// A pre-trained image-to-image model.
///
/// One synchronous call per image. Output has the same shape as the input.
pub trait InferenceEngine {
    /// Run the model on a single normalized tensor.
    ///
    /// # Errors
    ///
    /// Returns an error if the model fails or produces a malformed output.
    fn run(&mut self, input: &ImageTensor) -> Result<ImageTensor>;
}

/// ONNX Runtime engine. Feeds the first model input, reads the first output.
pub struct OrtEngine {
    session: Session,
}

impl OrtEngine {
    /// Wrap a loaded session.
    #[must_use]
    pub const fn new(session: Session) -> Self {
        Self { session }
    }
}

impl InferenceEngine for OrtEngine {
    fn run(&mut self, input: &ImageTensor) -> Result<ImageTensor> {
        let input_value =
            Tensor::from_array(input.clone()).map_err(|source| Error::Inference { source })?;

        let outputs = self
            .session
            .run(ort::inputs![input_value])
            .map_err(|source| Error::Inference { source })?;

        let output = outputs
            .values()
            .next()
            .ok_or_else(|| Error::ShapeMismatch {
                expected: "image output".to_string(),
                actual: "no output".to_string(),
            })?;

        extract_array4(&output)
    }
}

/// Extract a 4D array from an ONNX value.
#[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
fn extract_array4(value: &ort::value::ValueRef<'_>) -> Result<Array4<f32>> {
    let (shape_info, data) = value
        .try_extract_tensor::<f32>()
        .map_err(|source| Error::Inference { source })?;

    // Dimensions of a materialized tensor are never negative
    let dims: Vec<usize> = shape_info.iter().map(|&x| x as usize).collect();

    if dims.len() != 4 {
        return Err(Error::ShapeMismatch {
            expected: "4D tensor".to_string(),
            actual: format!("{}D tensor", dims.len()),
        });
    }

    Array4::from_shape_vec((dims[0], dims[1], dims[2], dims[3]), data.to_vec()).map_err(|_| {
        Error::ShapeMismatch {
            expected: format!("{dims:?}"),
            actual: format!("{} values", data.len()),
        }
    })
}
