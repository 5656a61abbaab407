//! Per-frame face cue analysis.
//!
//! Pipeline: encoded frame -> [`PixelBuffer`] -> [`LandmarkDetector`] ->
//! gaze and emotion heuristics -> [`AnalysisOutcome`].
//!
//! The detector is owned by an explicitly constructed [`Engine`] that is
//! shared between sessions; nothing in this crate keeps global state.

pub mod analyzer;
pub mod decode;
pub mod detector;
pub mod emotion;
pub mod engine;
pub mod error;
pub mod face_landmarker;
pub mod gaze;

pub use analyzer::FrameAnalyzer;
pub use decode::{decode_frame, decode_image_bytes, strip_data_uri_prefix, ColorLayout, PixelBuffer};
pub use detector::{DetectorOptions, LandmarkDetector};
pub use emotion::classify_emotion;
pub use engine::{Engine, EngineConfig};
pub use error::{VisionError, VisionResult};
pub use face_landmarker::OrtFaceLandmarker;
pub use gaze::{evaluate_gaze, GazeDirection};

pub use gazewatch_models::AnalysisOutcome;
