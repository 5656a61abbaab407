//! Blendshape threshold emotion classifier.
//!
//! Rules are checked in priority order and the first match wins. Only the
//! left-side blendshapes are consulted; the right-side scores are ignored.

use gazewatch_models::{Blendshapes, Emotion};

/// (blendshape, threshold, label) in priority order. Scores must exceed the
/// threshold strictly.
const RULES: &[(&str, f32, Emotion)] = &[
    ("browDownLeft", 0.5, Emotion::ConfusedFrowning),
    ("browOuterUpLeft", 0.5, Emotion::Surprised),
    ("jawOpen", 0.3, Emotion::Talking),
    ("eyeBlinkLeft", 0.6, Emotion::Blinking),
];

/// Classify face 0's blendshapes. No map at all yields `Neutral`.
pub fn classify_emotion(blendshapes: Option<&Blendshapes>) -> Emotion {
    let Some(shapes) = blendshapes else {
        return Emotion::Neutral;
    };

    RULES
        .iter()
        .find(|(name, threshold, _)| shapes.score(name) > *threshold)
        .map(|(_, _, emotion)| *emotion)
        .unwrap_or(Emotion::Neutral)
}
