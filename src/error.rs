//! Error types for the skinquant library

use thiserror::Error;

/// Result type alias for skinquant operations
pub type Result<T> = std::result::Result<T, AnalysisError>;

/// Error types for skin analysis operations
///
/// Only input validation and I/O adapters fail. Empty sample sets and
/// degenerate regions resolve to documented defaults inside the engine.
#[derive(Error, Debug)]
pub enum AnalysisError {
    /// Image file could not be loaded or decoded
    #[error("Failed to load image: {message}")]
    ImageLoadError {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration file could not be read, parsed or validated
    #[error("Configuration error: {message}")]
    ConfigError {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Pixel buffer length does not match the declared dimensions
    #[error("Pixel buffer holds {actual} bytes but {width}x{height} RGBA needs {expected}")]
    DimensionMismatch {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },

    /// Calibration produced a scale that cannot convert pixels to millimetres
    #[error("Invalid calibration: {pixels_per_mm} pixels/mm")]
    InvalidCalibration { pixels_per_mm: f64 },

    /// Input rejected before analysis started
    #[error("Invalid input: {reason}")]
    InvalidInput { reason: String },

    /// Invalid configuration or input parameter
    #[error("Invalid parameter: {parameter} = {value}")]
    InvalidParameter { parameter: String, value: String },
}

impl AnalysisError {
    /// Create an image load error with context
    pub fn image_load<E>(message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::ImageLoadError {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a configuration error with context
    pub fn config<E>(message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::ConfigError {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Shorthand for an [`AnalysisError::InvalidParameter`]
    pub fn invalid_parameter(parameter: impl Into<String>, value: impl ToString) -> Self {
        Self::InvalidParameter {
            parameter: parameter.into(),
            value: value.to_string(),
        }
    }

    /// Check if the caller can retry with corrected input
    ///
    /// Calibration mistakes (e.g. a mis-measured reference object) can be
    /// fixed by the user; a corrupt buffer or config cannot.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            AnalysisError::InvalidCalibration { .. } | AnalysisError::InvalidInput { .. }
        )
    }

    /// Get user-friendly error description for application display
    pub fn user_message(&self) -> String {
        match self {
            AnalysisError::ImageLoadError { .. } => {
                "Could not load the photo. Please check the file format and try again.".to_string()
            }
            AnalysisError::DimensionMismatch { .. } => {
                "The captured photo is incomplete. Please take the picture again.".to_string()
            }
            AnalysisError::InvalidCalibration { .. } => {
                "The reference object measurement looks wrong. Please measure it again or skip calibration.".to_string()
            }
            AnalysisError::InvalidInput { reason } => {
                format!("The photo cannot be analyzed: {}.", reason)
            }
            _ => "Skin analysis failed. Please try again with a different photo.".to_string(),
        }
    }
}
