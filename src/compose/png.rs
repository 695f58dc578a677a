//! Lossless PNG compositor.

use image::imageops::{self, FilterType};
use image::{ImageFormat, RgbImage};

use super::{CapturedImage, CompositeError, Compositor};
use crate::camera::frame_utils::mirror_horizontal;
use crate::camera::{Frame, Resolution};

/// Scales the frame to the canvas, optionally mirrors it (selfie view) and
/// encodes it as PNG.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PngCompositor {
    mirror: bool,
}

impl PngCompositor {
    pub fn new(mirror: bool) -> Self {
        Self { mirror }
    }

    pub fn mirror(&self) -> bool {
        self.mirror
    }
}

impl Default for PngCompositor {
    fn default() -> Self {
        Self::new(true)
    }
}

impl Compositor for PngCompositor {
    fn composite(
        &self,
        frame: &Frame,
        canvas: Resolution,
    ) -> Result<CapturedImage, CompositeError> {
        if canvas.is_empty() {
            return Err(CompositeError::EmptyCanvas);
        }

        let invalid = || CompositeError::InvalidFrame {
            width: frame.width,
            height: frame.height,
            expected: frame.expected_len(),
            actual: frame.data.len(),
        };
        if frame.width == 0 || frame.height == 0 || frame.data.len() != frame.expected_len() {
            return Err(invalid());
        }

        let mut drawn = frame.clone();
        if self.mirror {
            mirror_horizontal(&mut drawn);
        }

        let mut image = RgbImage::from_raw(drawn.width, drawn.height, drawn.data).ok_or_else(invalid)?;
        if image.dimensions() != (canvas.width, canvas.height) {
            image = imageops::resize(&image, canvas.width, canvas.height, FilterType::Triangle);
        }

        let mut png = Vec::new();
        image
            .write_to(&mut std::io::Cursor::new(&mut png), ImageFormat::Png)
            .map_err(|e| CompositeError::Encode(e.to_string()))?;

        log::debug!(
            "Composited {}x{} frame into {} canvas ({} PNG bytes)",
            frame.width,
            frame.height,
            canvas,
            png.len()
        );
        Ok(CapturedImage::from_png(png, canvas.width, canvas.height))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(image: &CapturedImage) -> RgbImage {
        image::load_from_memory_with_format(image.png_bytes(), ImageFormat::Png)
            .expect("valid png")
            .to_rgb8()
    }

    #[test]
    fn test_mirrors_like_the_preview() {
        // left pixel red, right pixel blue
        let frame = Frame::rgb(vec![255, 0, 0, 0, 0, 255], 2, 1);
        let image = PngCompositor::default()
            .composite(&frame, Resolution::new(2, 1))
            .unwrap();

        let decoded = decode(&image);
        assert_eq!(decoded.get_pixel(0, 0).0, [0, 0, 255]);
        assert_eq!(decoded.get_pixel(1, 0).0, [255, 0, 0]);
        assert!(image.data_url().starts_with("data:image/png;base64,"));
    }

    #[test]
    fn test_unmirrored_keeps_orientation() {
        let frame = Frame::rgb(vec![255, 0, 0, 0, 0, 255], 2, 1);
        let image = PngCompositor::new(false)
            .composite(&frame, Resolution::new(2, 1))
            .unwrap();
        assert_eq!(decode(&image).get_pixel(0, 0).0, [255, 0, 0]);
    }

    #[test]
    fn test_scales_to_canvas() {
        let frame = Frame::rgb(vec![10; 4 * 2 * 3], 4, 2);
        let image = PngCompositor::default()
            .composite(&frame, Resolution::new(8, 6))
            .unwrap();
        assert_eq!((image.width(), image.height()), (8, 6));
        assert_eq!(decode(&image).dimensions(), (8, 6));
    }

    #[test]
    fn test_rejects_short_buffer() {
        let frame = Frame::rgb(vec![0; 5], 2, 1);
        let err = PngCompositor::default()
            .composite(&frame, Resolution::new(2, 1))
            .unwrap_err();
        assert_eq!(
            err,
            CompositeError::InvalidFrame {
                width: 2,
                height: 1,
                expected: 6,
                actual: 5
            }
        );
    }

    #[test]
    fn test_rejects_empty_canvas() {
        let frame = Frame::rgb(vec![0; 3], 1, 1);
        let err = PngCompositor::default()
            .composite(&frame, Resolution::new(0, 10))
            .unwrap_err();
        assert_eq!(err, CompositeError::EmptyCanvas);
    }
}
