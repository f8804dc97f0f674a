use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::codecs::jpeg::JpegEncoder;
use thiserror::Error;

use crate::drivers::Frame;

#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("jpeg encoding failed: {0}")]
    Jpeg(#[from] image::ImageError),
}

/// Lossy-compress a frame. Alpha, if any, is dropped.
pub fn encode_jpeg(frame: &Frame, quality: u8) -> Result<Vec<u8>, EncodeError> {
    let rgb = frame.to_rgb8();
    let mut buf = Vec::new();
    JpegEncoder::new_with_quality(&mut buf, quality).encode_image(&rgb)?;
    Ok(buf)
}

/// JPEG bytes as standard base64, ready for the string channel.
pub fn encode_frame(frame: &Frame, quality: u8) -> Result<String, EncodeError> {
    Ok(STANDARD.encode(encode_jpeg(frame, quality)?))
}
