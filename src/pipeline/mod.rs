//! Photo-to-comparison-sheet pipeline.

mod alert;
mod source;
mod transform;

pub use alert::{present, Alert, Outcome};
pub use source::ImageSource;
pub use transform::{Config, Panel, PanelResult, Pipeline};
