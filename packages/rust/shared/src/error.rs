//! Error types for the Mandelbrot viewer.
//!
//! Library crates use [`ViewerError`] via `thiserror`.
//! App crates (cli/tui) wrap this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all viewer operations.
#[derive(Debug, thiserror::Error)]
pub enum ViewerError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Invalid render or view parameters.
    #[error("validation error: {message}")]
    Validation { message: String },

    /// A render worker failed.
    #[error("render error: {0}")]
    Render(String),

    /// Manifest (de)serialization error.
    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, ViewerError>;

impl ViewerError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

impl From<serde_json::Error> for ViewerError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = ViewerError::config("zoom_factor must be greater than 1");
        assert_eq!(err.to_string(), "config error: zoom_factor must be greater than 1");

        let err = ViewerError::validation("width must be non-zero");
        assert!(err.to_string().contains("width must be non-zero"));
    }

    #[test]
    fn io_error_keeps_path() {
        let source = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err = ViewerError::io("/tmp/missing.ppm", source);
        assert!(err.to_string().contains("missing.ppm"));
    }
}
