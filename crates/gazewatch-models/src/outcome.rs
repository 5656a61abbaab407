//! Per-frame analysis outcome.
//!
//! One `AnalysisOutcome` is sent back for every frame a client submits,
//! including frames that could not be decoded or analyzed.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Debug message for frames the codec rejected.
pub const DECODE_FAILED_MSG: &str = "Frame decode failed";

/// Debug message when the detector found no face.
pub const NO_FACE_MSG: &str = "No face detected";

/// Outcome status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisStatus {
    /// Frame was analyzed (a face may or may not have been found)
    Active,
    /// Frame could not be analyzed
    Error,
}

impl AnalysisStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisStatus::Active => "active",
            AnalysisStatus::Error => "error",
        }
    }
}

/// Coarse emotion/state label derived from blendshape scores.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub enum Emotion {
    #[default]
    #[serde(rename = "Neutral")]
    Neutral,
    #[serde(rename = "Confused / Frowning")]
    ConfusedFrowning,
    #[serde(rename = "Surprised")]
    Surprised,
    #[serde(rename = "Talking")]
    Talking,
    #[serde(rename = "Blinking")]
    Blinking,
}

impl Emotion {
    /// Label as it appears on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Emotion::Neutral => "Neutral",
            Emotion::ConfusedFrowning => "Confused / Frowning",
            Emotion::Surprised => "Surprised",
            Emotion::Talking => "Talking",
            Emotion::Blinking => "Blinking",
        }
    }
}

impl std::fmt::Display for Emotion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of analyzing a single frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AnalysisOutcome {
    pub status: AnalysisStatus,
    #[serde(default)]
    pub emotion: Emotion,
    #[serde(default)]
    pub gaze_alert: bool,
    #[serde(default)]
    pub debug_msg: String,
}

impl AnalysisOutcome {
    /// Active outcome for a frame with a face.
    pub fn active(emotion: Emotion, gaze_alert: bool, debug_msg: impl Into<String>) -> Self {
        Self {
            status: AnalysisStatus::Active,
            emotion,
            gaze_alert,
            debug_msg: debug_msg.into(),
        }
    }

    /// Active outcome for a frame where no face was detected.
    pub fn no_face() -> Self {
        Self::active(Emotion::Neutral, false, NO_FACE_MSG)
    }

    /// Error outcome carrying a failure description.
    pub fn error(debug_msg: impl Into<String>) -> Self {
        Self {
            status: AnalysisStatus::Error,
            emotion: Emotion::Neutral,
            gaze_alert: false,
            debug_msg: debug_msg.into(),
        }
    }

    /// Error outcome for a frame that could not be decoded.
    pub fn decode_failed() -> Self {
        Self::error(DECODE_FAILED_MSG)
    }

    pub fn is_error(&self) -> bool {
        self.status == AnalysisStatus::Error
    }
}
