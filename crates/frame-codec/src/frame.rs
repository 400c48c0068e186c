//! Video frame types and decoding

use base64::{engine::general_purpose::STANDARD, Engine as _};
use tracing::trace;

use crate::FrameError;

/// Decoded RGB video frame
#[derive(Debug, Clone)]
pub struct VideoFrame {
    /// RGB pixel data (width * height * 3)
    pub data: Vec<u8>,
    /// Frame width
    pub width: u32,
    /// Frame height
    pub height: u32,
    /// Frame sequence number within its session
    pub sequence: u64,
}

impl VideoFrame {
    /// Create a new video frame from raw RGB data
    pub fn new(data: Vec<u8>, width: u32, height: u32, sequence: u64) -> Self {
        Self {
            data,
            width,
            height,
            sequence,
        }
    }

    /// Tag the frame with its position in the session stream
    pub fn with_sequence(mut self, sequence: u64) -> Self {
        self.sequence = sequence;
        self
    }
}

/// Decode a base64 text frame (as sent by the browser client) to RGB.
///
/// Accepts both bare base64 and `data:image/jpeg;base64,...` URLs.
pub fn decode_base64_frame(payload: &str) -> Result<VideoFrame, FrameError> {
    let payload = payload.trim();
    let encoded = match payload.strip_prefix("data:") {
        Some(rest) => rest.split_once(',').map(|(_, data)| data).unwrap_or(""),
        None => payload,
    };

    if encoded.is_empty() {
        return Err(FrameError::Empty);
    }

    let bytes = STANDARD.decode(encoded)?;
    decode_image_bytes(&bytes)
}

/// Decode raw image bytes (JPEG, PNG, ...) to RGB
pub fn decode_image_bytes(bytes: &[u8]) -> Result<VideoFrame, FrameError> {
    if bytes.is_empty() {
        return Err(FrameError::Empty);
    }

    let img = image::load_from_memory(bytes)?;
    let (width, height) = (img.width(), img.height());
    if width == 0 || height == 0 {
        return Err(FrameError::ZeroArea { width, height });
    }

    trace!("Decoded {}x{} frame from {} bytes", width, height, bytes.len());

    Ok(VideoFrame {
        data: img.to_rgb8().into_raw(),
        width,
        height,
        sequence: 0,
    })
}
