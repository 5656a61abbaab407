//! Coarse gaze / head-turn heuristic.
//!
//! Compares the 2-D distance from the nose tip to each outer eye corner.
//! Turning the head shortens one distance and lengthens the other, so the
//! ratio moves away from 1. This is a proxy for head turn, not calibrated
//! gaze tracking.

use gazewatch_models::Landmark;

use crate::error::{VisionError, VisionResult};

/// MediaPipe face mesh topology (468/478 points): nose tip.
pub const NOSE_TIP: usize = 1;
/// Outer corner of the eye on the left side of the image.
pub const LEFT_EYE_OUTER: usize = 33;
/// Outer corner of the eye on the right side of the image.
pub const RIGHT_EYE_OUTER: usize = 263;

/// Below this ratio the subject is looking right.
pub const LOOKING_RIGHT_RATIO: f32 = 0.5;
/// Above this ratio the subject is looking left.
pub const LOOKING_LEFT_RATIO: f32 = 2.0;

const EPS: f32 = 1e-6;

/// Gaze classification for one face.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GazeDirection {
    Center,
    Left,
    Right,
}

impl GazeDirection {
    /// Whether this direction raises the gaze alert.
    pub fn is_alert(&self) -> bool {
        !matches!(self, GazeDirection::Center)
    }

    /// Debug message reported to the client, if any.
    pub fn debug_msg(&self) -> Option<&'static str> {
        match self {
            GazeDirection::Center => None,
            GazeDirection::Left => Some("looking left"),
            GazeDirection::Right => Some("looking right"),
        }
    }
}

/// Ratio of nose-to-left-corner over nose-to-right-corner distance.
pub fn gaze_ratio(nose: &Landmark, left_eye_outer: &Landmark, right_eye_outer: &Landmark) -> f32 {
    let dist_left = nose.distance_2d(left_eye_outer);
    let dist_right = nose.distance_2d(right_eye_outer);
    dist_left / (dist_right + EPS)
}

/// Classify a gaze ratio. Threshold values themselves are not alerts.
pub fn classify_gaze(ratio: f32) -> GazeDirection {
    if ratio < LOOKING_RIGHT_RATIO {
        GazeDirection::Right
    } else if ratio > LOOKING_LEFT_RATIO {
        GazeDirection::Left
    } else {
        GazeDirection::Center
    }
}

/// Run the heuristic over a full landmark set.
pub fn evaluate_gaze(landmarks: &[Landmark]) -> VisionResult<GazeDirection> {
    let point = |index: usize| {
        landmarks.get(index).ok_or(VisionError::InsufficientLandmarks {
            index,
            found: landmarks.len(),
        })
    };

    let ratio = gaze_ratio(point(NOSE_TIP)?, point(LEFT_EYE_OUTER)?, point(RIGHT_EYE_OUTER)?);
    Ok(classify_gaze(ratio))
}
