//! MediaPipe face mesh + blendshape inference on ONNX Runtime.
//!
//! Two models are loaded from one asset directory:
//! - `face_landmark_with_attention.onnx`: dense mesh (478 points with iris
//!   refinement, 468 without) plus an optional face-flag output.
//! - `face_blendshapes.onnx` (optional): 52 ARKit-style blendshape scores
//!   from a fixed 146-point landmark subset.
//!
//! Notes:
//! - The mesh model runs on a centered square crop of the frame; there is no
//!   separate face detector stage, so at most one face is returned.
//! - Both ORT sessions are behind a `Mutex`; concurrent sessions serialize on
//!   inference.

use std::path::Path;
use std::sync::Mutex;

use gazewatch_models::{Blendshapes, DetectionResult, Face, Landmark};
use image::imageops::{self, FilterType};
use image::RgbImage;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::{Tensor, Value};
use tracing::{debug, info};

use crate::decode::PixelBuffer;
use crate::detector::{DetectorOptions, LandmarkDetector};
use crate::error::{VisionError, VisionResult};

/// Mesh model file name inside the asset directory.
pub const FACE_MESH_MODEL_FILE: &str = "face_landmark_with_attention.onnx";
/// Blendshape model file name inside the asset directory.
pub const BLENDSHAPE_MODEL_FILE: &str = "face_blendshapes.onnx";

/// Mesh model input resolution.
const INPUT_SIZE: u32 = 192;

/// Landmark count of the iris-refined mesh.
const REFINED_LANDMARK_COUNT: usize = 478;

/// Blendshape names in model output order.
pub const BLENDSHAPE_NAMES: [&str; 52] = [
    "_neutral",
    "browDownLeft",
    "browDownRight",
    "browInnerUp",
    "browOuterUpLeft",
    "browOuterUpRight",
    "cheekPuff",
    "cheekSquintLeft",
    "cheekSquintRight",
    "eyeBlinkLeft",
    "eyeBlinkRight",
    "eyeLookDownLeft",
    "eyeLookDownRight",
    "eyeLookInLeft",
    "eyeLookInRight",
    "eyeLookOutLeft",
    "eyeLookOutRight",
    "eyeLookUpLeft",
    "eyeLookUpRight",
    "eyeSquintLeft",
    "eyeSquintRight",
    "eyeWideLeft",
    "eyeWideRight",
    "jawForward",
    "jawLeft",
    "jawOpen",
    "jawRight",
    "mouthClose",
    "mouthDimpleLeft",
    "mouthDimpleRight",
    "mouthFrownLeft",
    "mouthFrownRight",
    "mouthFunnel",
    "mouthLeft",
    "mouthLowerDownLeft",
    "mouthLowerDownRight",
    "mouthPressLeft",
    "mouthPressRight",
    "mouthPucker",
    "mouthRight",
    "mouthRollLower",
    "mouthRollUpper",
    "mouthShrugLower",
    "mouthShrugUpper",
    "mouthSmileLeft",
    "mouthSmileRight",
    "mouthStretchLeft",
    "mouthStretchRight",
    "mouthUpperUpLeft",
    "mouthUpperUpRight",
    "noseSneerLeft",
    "noseSneerRight",
];

/// Mesh indices fed to the blendshape model, in input order.
const BLENDSHAPE_LANDMARK_SUBSET: [usize; 146] = [
    0, 1, 4, 5, 6, 7, 8, 10, 13, 14, 17, 21, 33, 37, 39, 40, 46, 52, 53, 54, 55, 58, 61, 63, 65,
    66, 67, 70, 78, 80, 81, 82, 84, 87, 88, 91, 93, 95, 103, 105, 107, 109, 127, 132, 133, 136,
    144, 145, 146, 148, 149, 150, 152, 153, 154, 155, 157, 158, 159, 160, 161, 162, 163, 168, 172,
    173, 176, 178, 181, 185, 191, 195, 197, 234, 246, 249, 251, 263, 267, 269, 270, 276, 282, 283,
    284, 285, 288, 291, 293, 295, 296, 297, 300, 308, 310, 311, 312, 314, 317, 318, 321, 323, 324,
    332, 334, 336, 338, 356, 361, 362, 365, 373, 374, 375, 377, 378, 379, 380, 381, 382, 384, 385,
    386, 387, 388, 389, 390, 397, 398, 400, 402, 405, 409, 415, 454, 466, 468, 469, 470, 471, 472,
    473, 474, 475, 476, 477,
];

/// Square region of the frame the mesh model sees (pixel coordinates).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRect {
    pub x: u32,
    pub y: u32,
    pub size: u32,
}

/// ONNX Runtime backed [`LandmarkDetector`].
pub struct OrtFaceLandmarker {
    mesh: Mutex<Session>,
    blendshapes: Option<Mutex<Session>>,
    options: DetectorOptions,
}

impl OrtFaceLandmarker {
    /// Load the models from `model_dir`.
    ///
    /// The mesh model is required. The blendshape model is optional; without
    /// it faces carry no blendshape map.
    pub fn load(model_dir: &Path, options: DetectorOptions) -> VisionResult<Self> {
        let mesh_path = model_dir.join(FACE_MESH_MODEL_FILE);
        if !mesh_path.exists() {
            return Err(VisionError::model_not_found(mesh_path.display().to_string()));
        }
        let mesh = Mutex::new(create_session(&mesh_path)?);

        let blend_path = model_dir.join(BLENDSHAPE_MODEL_FILE);
        let blendshapes = if options.output_blendshapes && blend_path.exists() {
            Some(Mutex::new(create_session(&blend_path)?))
        } else {
            None
        };

        info!(
            model_dir = %model_dir.display(),
            blendshapes = blendshapes.is_some(),
            num_faces = options.num_faces,
            "Face landmarker initialized"
        );

        Ok(Self {
            mesh,
            blendshapes,
            options,
        })
    }

    /// Run the mesh model. Returns raw output values and the face presence
    /// score when the model exposes one.
    fn run_mesh(&self, input: Value) -> VisionResult<(Vec<f32>, Option<f32>)> {
        let mut session = self
            .mesh
            .lock()
            .map_err(|_| VisionError::internal("Face mesh session lock poisoned"))?;

        let outputs = session
            .run(ort::inputs![input])
            .map_err(|e| VisionError::detection_failed(format!("ORT run failed: {e}")))?;

        if outputs.len() == 0 {
            return Err(VisionError::detection_failed("ORT returned no outputs"));
        }

        let (shape, data) = outputs[0]
            .try_extract_tensor::<f32>()
            .map_err(|e| VisionError::detection_failed(format!("ORT extract: {e}")))?;
        if data.len() % 3 != 0 {
            return Err(VisionError::detection_failed(format!(
                "Unexpected face mesh output shape: {:?}",
                shape
            )));
        }
        let coords = data.to_vec();

        let presence = if outputs.len() > 1 {
            let (_, flag) = outputs[1]
                .try_extract_tensor::<f32>()
                .map_err(|e| VisionError::detection_failed(format!("ORT extract: {e}")))?;
            flag.first().map(|logit| sigmoid(*logit))
        } else {
            None
        };

        Ok((coords, presence))
    }

    fn run_blendshapes(
        &self,
        session: &Mutex<Session>,
        landmarks: &[Landmark],
        width: u32,
        height: u32,
    ) -> VisionResult<Blendshapes> {
        let mut input = Vec::with_capacity(BLENDSHAPE_LANDMARK_SUBSET.len() * 2);
        for &idx in &BLENDSHAPE_LANDMARK_SUBSET {
            let lm = landmarks[idx];
            input.push(lm.x * width as f32);
            input.push(lm.y * height as f32);
        }
        let shape = vec![1usize, BLENDSHAPE_LANDMARK_SUBSET.len(), 2];
        let tensor: Value = Tensor::from_array((shape, input.into_boxed_slice()))
            .map(Value::from)
            .map_err(|e| VisionError::internal(format!("ORT tensor: {e}")))?;

        let mut session = session
            .lock()
            .map_err(|_| VisionError::internal("Blendshape session lock poisoned"))?;

        let outputs = session
            .run(ort::inputs![tensor])
            .map_err(|e| VisionError::detection_failed(format!("ORT run failed: {e}")))?;

        if outputs.len() == 0 {
            return Err(VisionError::detection_failed("ORT returned no outputs"));
        }

        let (shape, scores) = outputs[0]
            .try_extract_tensor::<f32>()
            .map_err(|e| VisionError::detection_failed(format!("ORT extract: {e}")))?;
        if scores.len() < BLENDSHAPE_NAMES.len() {
            return Err(VisionError::detection_failed(format!(
                "Unexpected blendshape output shape: {:?}",
                shape
            )));
        }

        Ok(BLENDSHAPE_NAMES
            .iter()
            .zip(scores.iter())
            .map(|(name, score)| (*name, *score))
            .collect())
    }
}

impl LandmarkDetector for OrtFaceLandmarker {
    fn detect(&self, frame: &PixelBuffer) -> VisionResult<DetectionResult> {
        if self.options.num_faces == 0 {
            return Ok(DetectionResult::empty());
        }

        let rgb = frame.to_rgb_image()?;
        let crop = center_square_crop(rgb.width(), rgb.height())?;
        let input = image_to_chw_tensor(&crop_and_resize(&rgb, crop))?;

        let (coords, presence) = self.run_mesh(input)?;

        if let Some(score) = presence {
            if score < self.options.min_face_presence {
                debug!(presence = score, "No face in frame");
                return Ok(DetectionResult::empty());
            }
        }

        let landmarks = map_landmarks(&coords, crop, rgb.width(), rgb.height());
        let mut face = Face::new(landmarks);

        if let Some(session) = &self.blendshapes {
            if face.landmarks.len() >= REFINED_LANDMARK_COUNT {
                let shapes =
                    self.run_blendshapes(session, &face.landmarks, rgb.width(), rgb.height())?;
                face = face.with_blendshapes(shapes);
            }
        }

        debug!(
            landmarks = face.landmarks.len(),
            blendshapes = face.blendshapes.is_some(),
            "Face landmarks detected"
        );

        let mut result = DetectionResult::single(face);
        result.faces.truncate(self.options.num_faces);
        Ok(result)
    }
}

fn create_session(model_path: &Path) -> VisionResult<Session> {
    let model_bytes = std::fs::read(model_path)
        .map_err(|e| VisionError::detection_failed(format!("ORT read model file: {e}")))?;

    Session::builder()
        .map_err(|e| VisionError::detection_failed(format!("ORT session builder: {e}")))?
        .with_optimization_level(GraphOptimizationLevel::Level3)
        .map_err(|e| VisionError::detection_failed(format!("ORT opt level: {e}")))?
        .commit_from_memory(model_bytes.as_slice())
        .map_err(|e| VisionError::detection_failed(format!("ORT load model: {e}")))
}

#[inline]
fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

/// Largest centered square that fits in the frame.
pub fn center_square_crop(width: u32, height: u32) -> VisionResult<CropRect> {
    let size = width.min(height);
    if size < 8 {
        return Err(VisionError::detection_failed("Frame too small for face mesh"));
    }
    Ok(CropRect {
        x: (width - size) / 2,
        y: (height - size) / 2,
        size,
    })
}

fn crop_and_resize(rgb: &RgbImage, crop: CropRect) -> RgbImage {
    let cropped = imageops::crop_imm(rgb, crop.x, crop.y, crop.size, crop.size).to_image();
    imageops::resize(&cropped, INPUT_SIZE, INPUT_SIZE, FilterType::Triangle)
}

/// Convert an RGB image (HxWx3) to an ORT tensor (1,3,H,W) normalized to [-1,1].
fn image_to_chw_tensor(rgb: &RgbImage) -> VisionResult<Value> {
    let (w, h) = (rgb.width() as usize, rgb.height() as usize);
    let data = rgb.as_raw();

    let mut chw = Vec::with_capacity(h * w * 3);
    // HWC -> CHW
    for c in 0..3 {
        for y in 0..h {
            for x in 0..w {
                let v = data[y * w * 3 + x * 3 + c] as f32 / 255.0;
                chw.push(v * 2.0 - 1.0);
            }
        }
    }

    let shape = vec![1usize, 3, h, w];
    Tensor::from_array((shape, chw.into_boxed_slice()))
        .map(Value::from)
        .map_err(|e| VisionError::internal(format!("ORT tensor: {e}")))
}

/// Map mesh output (x, y, z triples in crop space) to normalized frame
/// coordinates.
///
/// Exports differ: some emit crop pixels (0..192), others values already
/// normalized to the crop. Anything beyond 2.0 is treated as pixels.
pub fn map_landmarks(coords: &[f32], crop: CropRect, width: u32, height: u32) -> Vec<Landmark> {
    let pixel_space = coords
        .chunks_exact(3)
        .any(|p| p[0].abs() > 2.0 || p[1].abs() > 2.0);
    let scale = if pixel_space { INPUT_SIZE as f32 } else { 1.0 };

    coords
        .chunks_exact(3)
        .map(|p| {
            let (nx, ny, nz) = (p[0] / scale, p[1] / scale, p[2] / scale);
            Landmark {
                x: (crop.x as f32 + nx * crop.size as f32) / width as f32,
                y: (crop.y as f32 + ny * crop.size as f32) / height as f32,
                z: nz,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_center_crop_landscape() {
        let crop = center_square_crop(320, 240).unwrap();
        assert_eq!(crop, CropRect { x: 40, y: 0, size: 240 });
    }

    #[test]
    fn test_center_crop_rejects_tiny_frames() {
        assert!(center_square_crop(4, 100).is_err());
    }

    #[test]
    fn test_map_pixel_space_landmarks() {
        let crop = CropRect { x: 40, y: 0, size: 240 };
        // crop center in 192px model space
        let landmarks = map_landmarks(&[96.0, 96.0, 0.0, 0.0, 0.0, 0.0], crop, 320, 240);
        assert_eq!(landmarks.len(), 2);
        assert!((landmarks[0].x - 0.5).abs() < 1e-4);
        assert!((landmarks[0].y - 0.5).abs() < 1e-4);
        assert!((landmarks[1].x - 40.0 / 320.0).abs() < 1e-4);
        assert!(landmarks[1].y.abs() < 1e-4);
    }

    #[test]
    fn test_map_normalized_landmarks() {
        let crop = CropRect { x: 0, y: 0, size: 100 };
        let landmarks = map_landmarks(&[0.25, 0.75, 0.1], crop, 100, 100);
        assert!((landmarks[0].x - 0.25).abs() < 1e-6);
        assert!((landmarks[0].y - 0.75).abs() < 1e-6);
        assert!((landmarks[0].z - 0.1).abs() < 1e-6);
    }

    #[test]
    fn test_blendshape_subset_fits_refined_mesh() {
        assert!(BLENDSHAPE_LANDMARK_SUBSET
            .iter()
            .all(|&i| i < REFINED_LANDMARK_COUNT));
        assert_eq!(BLENDSHAPE_NAMES[25], "jawOpen");
        assert_eq!(BLENDSHAPE_NAMES[1], "browDownLeft");
    }

    #[test]
    fn test_load_missing_model() {
        let dir = tempfile::tempdir().unwrap();
        let err = OrtFaceLandmarker::load(dir.path(), DetectorOptions::default())
            .err()
            .unwrap();
        assert!(matches!(err, VisionError::ModelNotFound(_)));
    }
}
