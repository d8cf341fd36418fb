//! # sketchai
//!
//! Applies pre-trained image-to-image models (pencil sketch, fashion style) to
//! photographs and renders each result next to the image that produced it.
//!
//! The work per photo is a fixed sequence: scale to the model's square input,
//! normalize RGB bytes to `[-1, 1]`, run the model, map the output back to
//! bytes and pack it as an opaque RGBA image.
//!
//! ## Example
//!
//! ```no_run
//! use sketchai::{Config, ImageSource, Pipeline};
//!
//! # fn main() -> sketchai::Result<()> {
//! let mut pipeline = Pipeline::new(Config::default())?;
//!
//! let source: ImageSource = ImageSource::Gallery("photo.jpg".into());
//! if let Some(photo) = source.acquire()? {
//!     let sheet = pipeline.render_sheet(&photo)?;
//!     sketchai::image::save_image(&sheet.into(), "sheet.png", 95)?;
//! }
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod image;
pub mod model;
pub mod pipeline;

pub use error::{Error, Result};
pub use model::{InferenceEngine, OrtEngine};
pub use pipeline::{present, Alert, Config, ImageSource, Outcome, Panel, PanelResult, Pipeline};
