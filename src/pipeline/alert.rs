//! Turning request failures into a message for the user.

use std::fmt;

use ::image::RgbaImage;

use crate::error::Result;

/// A failure shown to the user as-is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    pub title: String,
    pub message: String,
}

impl Alert {
    /// Alert carrying `err`'s message verbatim.
    pub fn from_error(err: &dyn std::error::Error) -> Self {
        Self {
            title: "Error".to_string(),
            message: err.to_string(),
        }
    }
}

impl fmt::Display for Alert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.title, self.message)
    }
}

/// What the user sees after a request.
#[derive(Debug)]
pub enum Outcome {
    /// The comparison sheet.
    Shown(RgbaImage),
    /// The request failed.
    Alert(Alert),
}

/// Convert a request result into something to show. Never panics.
#[must_use]
pub fn present(result: Result<RgbaImage>) -> Outcome {
    match result {
        Ok(sheet) => Outcome::Shown(sheet),
        Err(err) => {
            tracing::error!("{err}");
            Outcome::Alert(Alert::from_error(&err))
        }
    }
}
