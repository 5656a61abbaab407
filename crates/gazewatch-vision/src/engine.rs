//! Detector lifecycle.
//!
//! The engine is built once at startup and shared by every session. A model
//! that fails to load does not stop the process: the engine stays up without
//! a detector and every analysis call reports [`VisionError::ModelUnavailable`].

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{error, info};

use crate::decode::DEFAULT_MAX_FRAME_BYTES;
use crate::detector::{DetectorOptions, LandmarkDetector};
use crate::error::{VisionError, VisionResult};
use crate::face_landmarker::OrtFaceLandmarker;

/// Engine configuration.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Directory holding the face landmarker model assets
    pub model_dir: PathBuf,
    /// Detector options
    pub detector: DetectorOptions,
    /// Largest accepted encoded frame
    pub max_frame_bytes: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            model_dir: PathBuf::from("./models/face_landmarker"),
            detector: DetectorOptions::default(),
            max_frame_bytes: DEFAULT_MAX_FRAME_BYTES,
        }
    }
}

/// Shared handle to the (possibly absent) landmark detector.
pub struct Engine {
    detector: Option<Arc<dyn LandmarkDetector>>,
    load_error: Option<String>,
    max_frame_bytes: usize,
}

impl Engine {
    /// Load the ONNX face landmarker. Never fails; see [`Engine::is_ready`].
    pub fn load(config: &EngineConfig) -> Self {
        match OrtFaceLandmarker::load(&config.model_dir, config.detector.clone()) {
            Ok(detector) => {
                info!(model_dir = %config.model_dir.display(), "Vision engine loaded");
                Self {
                    detector: Some(Arc::new(detector)),
                    load_error: None,
                    max_frame_bytes: config.max_frame_bytes,
                }
            }
            Err(e) => {
                error!(
                    model_dir = %config.model_dir.display(),
                    error = %e,
                    "Failed to load vision model; frames will be answered with errors"
                );
                Self::unavailable(e.to_string()).with_max_frame_bytes(config.max_frame_bytes)
            }
        }
    }

    /// Engine around an already constructed detector.
    pub fn with_detector(detector: Arc<dyn LandmarkDetector>) -> Self {
        Self {
            detector: Some(detector),
            load_error: None,
            max_frame_bytes: DEFAULT_MAX_FRAME_BYTES,
        }
    }

    /// Engine with no detector.
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self {
            detector: None,
            load_error: Some(reason.into()),
            max_frame_bytes: DEFAULT_MAX_FRAME_BYTES,
        }
    }

    pub fn with_max_frame_bytes(mut self, max_frame_bytes: usize) -> Self {
        self.max_frame_bytes = max_frame_bytes;
        self
    }

    pub fn max_frame_bytes(&self) -> usize {
        self.max_frame_bytes
    }

    /// The loaded detector, or `ModelUnavailable`.
    pub fn detector(&self) -> VisionResult<&dyn LandmarkDetector> {
        self.detector.as_deref().ok_or(VisionError::ModelUnavailable)
    }

    pub fn is_ready(&self) -> bool {
        self.detector.is_some()
    }

    /// Why the model failed to load, if it did.
    pub fn load_error(&self) -> Option<&str> {
        self.load_error.as_deref()
    }
}
