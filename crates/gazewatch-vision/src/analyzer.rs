//! Frame analyzer.
//!
//! decode -> layout normalization -> detect -> gaze + emotion -> outcome.
//! [`FrameAnalyzer::try_analyze`] reports failures as [`VisionError`];
//! [`FrameAnalyzer::analyze`] folds them into an error outcome so every
//! frame gets exactly one answer.

use std::sync::Arc;

use gazewatch_models::AnalysisOutcome;
use tracing::{debug, warn};

use crate::decode::{decode_frame_with_limit, decode_image_bytes_with_limit, PixelBuffer};
use crate::emotion::classify_emotion;
use crate::engine::Engine;
use crate::error::{VisionError, VisionResult};
use crate::gaze::evaluate_gaze;

/// Stateless per-frame analyzer over a shared engine.
#[derive(Clone)]
pub struct FrameAnalyzer {
    engine: Arc<Engine>,
}

impl FrameAnalyzer {
    pub fn new(engine: Arc<Engine>) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// Analyze a base64 text frame (optionally data-URI prefixed).
    pub fn analyze(&self, frame: &str) -> AnalysisOutcome {
        self.try_analyze(frame).unwrap_or_else(outcome_for_error)
    }

    /// Analyze raw encoded image bytes.
    pub fn analyze_bytes(&self, bytes: &[u8]) -> AnalysisOutcome {
        self.try_analyze_bytes(bytes).unwrap_or_else(outcome_for_error)
    }

    pub fn try_analyze(&self, frame: &str) -> VisionResult<AnalysisOutcome> {
        let buffer = decode_frame_with_limit(frame, self.engine.max_frame_bytes())?;
        self.analyze_buffer(buffer)
    }

    pub fn try_analyze_bytes(&self, bytes: &[u8]) -> VisionResult<AnalysisOutcome> {
        let buffer = decode_image_bytes_with_limit(bytes, self.engine.max_frame_bytes())?;
        self.analyze_buffer(buffer)
    }

    fn analyze_buffer(&self, buffer: PixelBuffer) -> VisionResult<AnalysisOutcome> {
        let detector = self.engine.detector()?;
        let buffer = buffer.into_layout(detector.input_layout());
        let detection = detector.detect(&buffer)?;

        let Some(face) = detection.primary_face() else {
            return Ok(AnalysisOutcome::no_face());
        };

        let gaze = evaluate_gaze(&face.landmarks)?;
        let emotion = classify_emotion(face.blendshapes.as_ref());

        debug!(
            faces = detection.faces.len(),
            emotion = %emotion,
            gaze = ?gaze,
            "Frame analyzed"
        );

        Ok(AnalysisOutcome::active(
            emotion,
            gaze.is_alert(),
            gaze.debug_msg().unwrap_or_default(),
        ))
    }
}

fn outcome_for_error(err: VisionError) -> AnalysisOutcome {
    warn!(error = %err, "Frame analysis failed");
    if err.is_decode_failure() {
        AnalysisOutcome::decode_failed()
    } else {
        AnalysisOutcome::error(err.to_string())
    }
}
