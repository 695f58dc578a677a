//! Still-image compositing: turn the live frame into the photo the user sees.
//!
//! The [`Compositor`] capability draws a frame into a canvas of a given size
//! and encodes the result. [`PngCompositor`] is the stock implementation.

mod png;

use std::path::Path;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::camera::{Frame, Resolution};

pub use png::PngCompositor;

/// Canvas size used when the device has not reported a resolution.
pub const DEFAULT_CANVAS: Resolution = Resolution::MEDIUM;

/// Draws a video frame into a fixed-size canvas and encodes it.
pub trait Compositor {
    fn composite(&self, frame: &Frame, canvas: Resolution)
        -> Result<CapturedImage, CompositeError>;
}

/// Pick the canvas size for a capture: the device's reported size when it is
/// known and non-zero, otherwise [`DEFAULT_CANVAS`].
pub fn canvas_for(reported: Option<Resolution>) -> Resolution {
    reported
        .filter(|r| !r.is_empty())
        .unwrap_or(DEFAULT_CANVAS)
}

/// Errors that abort a capture attempt. The session keeps previewing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CompositeError {
    /// The device has not delivered a frame to draw
    #[error("No video frame available to capture")]
    NoFrame,
    /// Pixel buffer does not match the frame dimensions
    #[error("Frame buffer holds {actual} bytes, expected {expected} for {width}x{height}")]
    InvalidFrame {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },
    /// Canvas has a zero dimension
    #[error("Cannot draw into an empty canvas")]
    EmptyCanvas,
    /// Still-image encoder failed
    #[error("Image encoding failed: {0}")]
    Encode(String),
}

/// An encoded still photo.
///
/// Carries both the raw PNG bytes and the self-describing data URI handed to
/// the capture callback.
#[derive(Clone, PartialEq, Eq)]
pub struct CapturedImage {
    width: u32,
    height: u32,
    png: Vec<u8>,
    data_url: String,
}

impl CapturedImage {
    /// Wrap PNG bytes, building the `data:image/png;base64,...` URI.
    pub fn from_png(png: Vec<u8>, width: u32, height: u32) -> Self {
        let data_url = format!("data:image/png;base64,{}", STANDARD.encode(&png));
        Self {
            width,
            height,
            png,
            data_url,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn png_bytes(&self) -> &[u8] {
        &self.png
    }

    pub fn data_url(&self) -> &str {
        &self.data_url
    }

    pub fn is_empty(&self) -> bool {
        self.png.is_empty()
    }

    /// Write the PNG to disk.
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        std::fs::write(path, &self.png)
    }
}

impl std::fmt::Debug for CapturedImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CapturedImage")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("png_bytes", &self.png.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canvas_falls_back_to_default() {
        assert_eq!(canvas_for(None), Resolution::new(640, 480));
        assert_eq!(canvas_for(Some(Resolution::new(0, 0))), DEFAULT_CANVAS);
        assert_eq!(canvas_for(Some(Resolution::HIGH)), Resolution::HIGH);
    }

    #[test]
    fn test_data_url_is_base64_png() {
        let image = CapturedImage::from_png(vec![0x89, b'P', b'N', b'G'], 1, 1);
        assert_eq!(image.data_url(), "data:image/png;base64,iVBORw==");
        assert!(!image.is_empty());
    }

    #[test]
    fn test_save_writes_png_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("photo.png");
        let image = CapturedImage::from_png(vec![1, 2, 3], 1, 1);
        image.save(&path).unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), vec![1, 2, 3]);
    }
}
