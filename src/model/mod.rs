//! Model artifact handling and inference engines.

mod engine;
mod loader;

pub use engine::{InferenceEngine, OrtEngine};
pub use loader::{load_session, model_filename, ModelSource, ModelStore};
