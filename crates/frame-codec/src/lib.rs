//! Frame Codec for SmartSession
//!
//! Turns the frames a participant's browser pushes over the stream into
//! pixel buffers the perception layer can work on.
//! Supports:
//! - base64 text frames, with or without a `data:<mime>;base64,` prefix
//! - raw image bytes (binary messages)
//! - any still-image format the `image` crate can guess (JPEG, PNG, ...)

pub mod frame;

pub use frame::{decode_base64_frame, decode_image_bytes, VideoFrame};

use thiserror::Error;

/// Frame decoding error types
#[derive(Error, Debug)]
pub enum FrameError {
    #[error("Empty frame payload")]
    Empty,

    #[error("Invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("Image decoding failed: {0}")]
    Image(#[from] image::ImageError),

    #[error("Decoded image has zero area ({width}x{height})")]
    ZeroArea { width: u32, height: u32 },
}
