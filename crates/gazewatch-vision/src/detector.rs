//! Landmark detector seam.
//!
//! The analyzer only depends on this trait; the ONNX backed implementation
//! lives in [`crate::face_landmarker`].

use gazewatch_models::DetectionResult;

use crate::decode::{ColorLayout, PixelBuffer};
use crate::error::VisionResult;

/// Detector configuration, fixed when the engine is built.
#[derive(Debug, Clone)]
pub struct DetectorOptions {
    /// Produce blendshape scores for each face
    pub output_blendshapes: bool,
    /// Request facial transformation matrices. Nothing downstream reads them
    /// and [`crate::OrtFaceLandmarker`] ignores this flag, leaving
    /// `Face::transformation_matrix` as `None`.
    pub output_facial_transformation_matrixes: bool,
    /// Maximum number of faces returned
    pub num_faces: usize,
    /// Face presence score below which a frame reports no face
    pub min_face_presence: f32,
}

impl Default for DetectorOptions {
    fn default() -> Self {
        Self {
            output_blendshapes: true,
            output_facial_transformation_matrixes: true,
            num_faces: 2,
            min_face_presence: 0.5,
        }
    }
}

/// Facial landmark / blendshape detector.
///
/// One instance is shared by every session, so `detect` may be called from
/// several threads at once. Runtimes that are not reentrant must serialize
/// internally.
pub trait LandmarkDetector: Send + Sync {
    /// Detect faces in a frame already converted to [`Self::input_layout`].
    fn detect(&self, frame: &PixelBuffer) -> VisionResult<DetectionResult>;

    /// Channel order the model expects.
    fn input_layout(&self) -> ColorLayout {
        ColorLayout::Rgb
    }
}
