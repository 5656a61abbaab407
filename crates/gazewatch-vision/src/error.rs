//! Error types for frame analysis.

use thiserror::Error;

/// Result type for vision operations.
pub type VisionResult<T> = Result<T, VisionError>;

/// Errors that can occur while analyzing a frame.
#[derive(Debug, Error)]
pub enum VisionError {
    #[error("Frame decode failed: {0}")]
    DecodeFailed(String),

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("Vision model not loaded")]
    ModelUnavailable,

    #[error("Face detection failed: {0}")]
    DetectionFailed(String),

    #[error("Face has {found} landmarks, index {index} required")]
    InsufficientLandmarks { index: usize, found: usize },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl VisionError {
    /// Create a decode failure error.
    pub fn decode_failed(message: impl Into<String>) -> Self {
        Self::DecodeFailed(message.into())
    }

    /// Create a detection failure error.
    pub fn detection_failed(message: impl Into<String>) -> Self {
        Self::DetectionFailed(message.into())
    }

    /// Create a model not found error.
    pub fn model_not_found(path: impl Into<String>) -> Self {
        Self::ModelNotFound(path.into())
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    pub fn is_decode_failure(&self) -> bool {
        matches!(self, Self::DecodeFailed(_))
    }
}
