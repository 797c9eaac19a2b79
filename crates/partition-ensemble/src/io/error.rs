//! Shared error types for frame I/O.

use std::io;

use crate::frame::FrameError;

/// Errors that can occur when loading a frame.
#[derive(Debug, thiserror::Error)]
pub enum FrameLoadError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("invalid index label {value:?} at row {row}")]
    InvalidIndex { row: usize, value: String },

    #[error(transparent)]
    Frame(#[from] FrameError),
}
