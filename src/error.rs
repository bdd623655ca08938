//! Error handling for mipscope
//!
//! This module defines the crate error type and a Result alias.
//!
//! Only programmer misuse is surfaced as an error: indexing past the end of a
//! buffer, an inverted calibration mapping, or a non-positive query
//! resolution. Geometric problems in the viewport (zero-width rectangles,
//! overflowing coordinates, floating-point drift) are never reported; the
//! viewport normalizes them on every frame.

use thiserror::Error;

/// Main error type for mipscope operations
#[derive(Error, Debug)]
pub enum ScopeError {
    /// Calibration mapping with `value_min > value_max`
    #[error("Invalid mapping: value_min {value_min} is greater than value_max {value_max}")]
    InvalidMapping { value_min: f64, value_max: f64 },

    /// Direct sample access beyond the current buffer size
    #[error("Index {index} out of range for buffer of {len} samples")]
    IndexOutOfRange { index: usize, len: usize },

    /// Range query with a resolution that cannot select a level
    #[error("Invalid resolution: {0} (must be finite and greater than zero)")]
    InvalidResolution(f64),

    /// Invalid construction parameters for a channel or scope
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Errors related to configuration loading/saving
    #[error("Config error: {0}")]
    Config(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<ScopeError>,
    },
}

impl ScopeError {
    /// Add context to an error
    pub fn with_context(self, context: impl Into<String>) -> Self {
        ScopeError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Returns true for errors caused by bad construction or calibration input
    pub fn is_configuration(&self) -> bool {
        match self {
            ScopeError::InvalidMapping { .. }
            | ScopeError::InvalidResolution(_)
            | ScopeError::Configuration(_) => true,
            ScopeError::WithContext { source, .. } => source.is_configuration(),
            _ => false,
        }
    }
}

/// Result type alias for mipscope operations
pub type Result<T> = std::result::Result<T, ScopeError>;

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error result
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context lazily to an error result
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| e.with_context(f()))
    }
}
