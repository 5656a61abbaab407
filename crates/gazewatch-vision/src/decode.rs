//! Frame decoding.
//!
//! Clients send frames as base64 text, usually as a canvas data URI
//! (`data:image/jpeg;base64,<body>`). The metadata prefix is dropped, the body
//! is base64-decoded and handed to the `image` codec.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::{ImageBuffer, Rgb, RgbImage};
use tracing::debug;

use crate::error::{VisionError, VisionResult};

/// Largest encoded frame accepted by default (8 MiB).
pub const DEFAULT_MAX_FRAME_BYTES: usize = 8 * 1024 * 1024;

/// Channel order of a [`PixelBuffer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorLayout {
    Rgb,
    Bgr,
}

/// Decoded 8-bit, 3-channel raster in row-major order.
#[derive(Debug, Clone, PartialEq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    layout: ColorLayout,
    data: Vec<u8>,
}

impl PixelBuffer {
    /// Wrap raw interleaved pixel data.
    pub fn new(width: u32, height: u32, layout: ColorLayout, data: Vec<u8>) -> VisionResult<Self> {
        let expected_len = width as usize * height as usize * 3;
        if data.len() != expected_len {
            return Err(VisionError::internal(format!(
                "Invalid pixel buffer length: expected {}, got {}",
                expected_len,
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            layout,
            data,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn layout(&self) -> ColorLayout {
        self.layout
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Convert to the requested channel order. Same-layout conversion is a no-op.
    pub fn into_layout(mut self, layout: ColorLayout) -> Self {
        if self.layout != layout {
            for px in self.data.chunks_exact_mut(3) {
                px.swap(0, 2);
            }
            self.layout = layout;
        }
        self
    }

    /// View as an `image` RGB buffer, converting channel order if needed.
    pub fn to_rgb_image(&self) -> VisionResult<RgbImage> {
        let rgb = self.clone().into_layout(ColorLayout::Rgb);
        ImageBuffer::<Rgb<u8>, Vec<u8>>::from_raw(rgb.width, rgb.height, rgb.data)
            .ok_or_else(|| VisionError::internal("Failed to create image buffer"))
    }
}

/// Drop a `"<metadata>,"` prefix if present.
///
/// Returns the segment after the first comma, or the whole input when there
/// is no comma.
pub fn strip_data_uri_prefix(frame: &str) -> &str {
    frame.split(',').nth(1).unwrap_or(frame)
}

/// Decode a text frame using the default size cap.
pub fn decode_frame(frame: &str) -> VisionResult<PixelBuffer> {
    decode_frame_with_limit(frame, DEFAULT_MAX_FRAME_BYTES)
}

/// Decode a text frame, rejecting bodies longer than `max_bytes`.
pub fn decode_frame_with_limit(frame: &str, max_bytes: usize) -> VisionResult<PixelBuffer> {
    let body = strip_data_uri_prefix(frame).trim();
    if body.len() > max_bytes {
        return Err(VisionError::decode_failed(format!(
            "frame of {} bytes exceeds limit of {}",
            body.len(),
            max_bytes
        )));
    }

    let bytes = STANDARD
        .decode(body)
        .map_err(|e| VisionError::decode_failed(format!("invalid base64: {e}")))?;

    decode_image_bytes_with_limit(&bytes, max_bytes)
}

/// Decode raw encoded image bytes (PNG, JPEG, ...) using the default size cap.
pub fn decode_image_bytes(bytes: &[u8]) -> VisionResult<PixelBuffer> {
    decode_image_bytes_with_limit(bytes, DEFAULT_MAX_FRAME_BYTES)
}

/// Decode raw encoded image bytes, rejecting payloads longer than `max_bytes`.
pub fn decode_image_bytes_with_limit(bytes: &[u8], max_bytes: usize) -> VisionResult<PixelBuffer> {
    if bytes.len() > max_bytes {
        return Err(VisionError::decode_failed(format!(
            "image of {} bytes exceeds limit of {}",
            bytes.len(),
            max_bytes
        )));
    }

    let img = image::load_from_memory(bytes)
        .map_err(|e| VisionError::decode_failed(e.to_string()))?;
    let rgb = img.to_rgb8();
    let (width, height) = rgb.dimensions();

    debug!(width, height, "Frame decoded");

    PixelBuffer::new(width, height, ColorLayout::Rgb, rgb.into_raw())
}
