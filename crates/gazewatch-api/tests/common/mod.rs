//! Shared fixtures for API tests.
#![allow(dead_code)]

use std::io::Cursor;
use std::sync::Arc;

use axum::extract::ws::Message;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use gazewatch_api::{ApiConfig, AppState};
use gazewatch_models::{AnalysisOutcome, Blendshapes, DetectionResult, Face, Landmark};
use gazewatch_vision::gaze::{LEFT_EYE_OUTER, NOSE_TIP, RIGHT_EYE_OUTER};
use gazewatch_vision::{Engine, FrameAnalyzer, LandmarkDetector, PixelBuffer, VisionResult};
use image::{DynamicImage, ImageBuffer, ImageOutputFormat, Rgb};

/// Frame colors understood by [`ColorDetector`] (red channel).
pub const EMPTY_ROOM: u8 = 10;
pub const NEUTRAL_FACE: u8 = 100;
pub const TALKING_FACE: u8 = 150;
pub const TURNED_FACE: u8 = 220;

/// Detector that picks a canned face from the first pixel's red channel.
pub struct ColorDetector;

impl LandmarkDetector for ColorDetector {
    fn detect(&self, frame: &PixelBuffer) -> VisionResult<DetectionResult> {
        let red = frame.data()[0];
        let result = match red {
            0..=63 => DetectionResult::empty(),
            64..=127 => DetectionResult::single(face(0.5, Blendshapes::new())),
            128..=191 => {
                let shapes: Blendshapes = [("jawOpen", 0.5)].into_iter().collect();
                DetectionResult::single(face(0.5, shapes))
            }
            _ => DetectionResult::single(face(0.58, Blendshapes::new())),
        };
        Ok(result)
    }
}

/// Detector that panics on every frame.
pub struct PanickingDetector;

impl LandmarkDetector for PanickingDetector {
    fn detect(&self, _frame: &PixelBuffer) -> VisionResult<DetectionResult> {
        panic!("detector crashed")
    }
}

fn face(nose_x: f32, shapes: Blendshapes) -> Face {
    let mut landmarks = vec![Landmark::default(); 478];
    landmarks[NOSE_TIP] = Landmark::new(nose_x, 0.5);
    landmarks[LEFT_EYE_OUTER] = Landmark::new(0.4, 0.5);
    landmarks[RIGHT_EYE_OUTER] = Landmark::new(0.6, 0.5);
    Face::new(landmarks).with_blendshapes(shapes)
}

pub fn analyzer() -> FrameAnalyzer {
    FrameAnalyzer::new(Arc::new(Engine::with_detector(Arc::new(ColorDetector))))
}

pub fn panicking_analyzer() -> FrameAnalyzer {
    FrameAnalyzer::new(Arc::new(Engine::with_detector(Arc::new(PanickingDetector))))
}

pub fn unavailable_analyzer() -> FrameAnalyzer {
    FrameAnalyzer::new(Arc::new(Engine::unavailable("model missing")))
}

pub fn state(ready: bool) -> AppState {
    let engine = if ready {
        Engine::with_detector(Arc::new(ColorDetector))
    } else {
        Engine::unavailable("Model not found: ./models/face_landmarker")
    };
    AppState::with_engine(ApiConfig::default(), Arc::new(engine))
}

pub fn png_bytes(red: u8) -> Vec<u8> {
    let img = ImageBuffer::from_pixel(32, 24, Rgb([red, 40, 40]));
    let mut bytes = Vec::new();
    DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut bytes), ImageOutputFormat::Png)
        .unwrap();
    bytes
}

/// Canvas-style data URI frame.
pub fn frame(red: u8) -> Message {
    Message::Text(format!(
        "data:image/png;base64,{}",
        STANDARD.encode(png_bytes(red))
    ))
}

pub fn outcomes(sent: &[Message]) -> Vec<AnalysisOutcome> {
    sent.iter()
        .map(|msg| match msg {
            Message::Text(text) => serde_json::from_str(text).unwrap(),
            other => panic!("unexpected message: {other:?}"),
        })
        .collect()
}
