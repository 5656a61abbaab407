//! Shared data models for the gazewatch backend.
//!
//! This crate provides Serde-serializable types for:
//! - Per-frame analysis outcomes sent over the WebSocket
//! - Detected faces, landmarks and blendshape scores

pub mod face;
pub mod outcome;

// Re-export common types
pub use face::{Blendshapes, DetectionResult, Face, Landmark};
pub use outcome::{AnalysisOutcome, AnalysisStatus, Emotion};
