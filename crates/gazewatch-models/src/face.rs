//! Face detection types produced by the landmark detector.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Single face landmark in normalized frame coordinates.
///
/// `x` and `y` are in [0, 1] relative to frame width/height. `z` is relative
/// depth and is 0 when the model does not provide it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    #[serde(default)]
    pub z: f32,
}

impl Landmark {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y, z: 0.0 }
    }

    /// Euclidean distance using x and y only.
    pub fn distance_2d(&self, other: &Landmark) -> f32 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

/// Blendshape name to score mapping (scores in [0, 1]).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Blendshapes(HashMap<String, f32>);

impl Blendshapes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, score: f32) {
        self.0.insert(name.into(), score);
    }

    /// Score for a blendshape; missing names score 0.
    pub fn score(&self, name: &str) -> f32 {
        self.0.get(name).copied().unwrap_or(0.0)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, f32)> for Blendshapes {
    fn from_iter<I: IntoIterator<Item = (K, f32)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

/// One detected face.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Face {
    /// Landmarks in model topology order.
    pub landmarks: Vec<Landmark>,
    /// Blendshape scores, when the model produced them.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blendshapes: Option<Blendshapes>,
    /// Row-major 4x4 facial transformation matrix. Not read by any heuristic.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transformation_matrix: Option<[f32; 16]>,
}

impl Face {
    pub fn new(landmarks: Vec<Landmark>) -> Self {
        Self {
            landmarks,
            ..Self::default()
        }
    }

    pub fn with_blendshapes(mut self, blendshapes: Blendshapes) -> Self {
        self.blendshapes = Some(blendshapes);
        self
    }
}

/// Detector output for one frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DetectionResult {
    pub faces: Vec<Face>,
}

impl DetectionResult {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn single(face: Face) -> Self {
        Self { faces: vec![face] }
    }

    /// The only face the heuristics look at.
    pub fn primary_face(&self) -> Option<&Face> {
        self.faces.first()
    }
}
