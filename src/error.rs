// src/error.rs

//! Error taxonomy for the display core.
//!
//! Geometric input is never an error (drawing clamps instead). Everything that
//! can fail because of a resource (connection, memory, file) is returned to the
//! caller as a `DisplayError` and is never retried internally.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DisplayError {
    /// The native surface or its connection could not be created. Terminal for
    /// this attempt: a new `Display::init` call is the only way to retry.
    #[error("failed to initialise display surface: {0}")]
    InitFailure(String),

    /// Frame buffer memory could not be reserved. Buffers allocated earlier in
    /// the same call have already been released.
    #[error("failed to allocate {bytes} bytes for frame buffer {index}")]
    AllocFailure { index: usize, bytes: usize },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("I/O failure on {}: {source}", path.display())]
    IoFailure {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("unsupported: {0}")]
    Unsupported(String),

    /// The backend accepted the frame but could not put it on screen.
    #[error("failed to present frame: {0}")]
    PresentFailure(String),
}

impl DisplayError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        DisplayError::InvalidArgument(msg.into())
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        DisplayError::IoFailure {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T, E = DisplayError> = std::result::Result<T, E>;
