//! Frame transformation utilities.

use super::types::{Frame, Resolution};

/// Mirror a frame horizontally (flip left-right) for selfie mode.
pub fn mirror_horizontal(frame: &mut Frame) {
    let width = frame.width as usize;
    let height = frame.height as usize;
    let bpp = frame.bytes_per_pixel();

    for y in 0..height {
        let row_start = y * width * bpp;
        let row = &mut frame.data[row_start..row_start + width * bpp];

        // Swap pixels from left and right
        for x in 0..width / 2 {
            let left = x * bpp;
            let right = (width - 1 - x) * bpp;
            for i in 0..bpp {
                row.swap(left + i, right + i);
            }
        }
    }
}

/// Render an animated test pattern: a horizontal red ramp, a vertical green
/// ramp and a blue channel that drifts with `tick`.
///
/// The left edge is dark and the right edge bright, so a mirrored capture is
/// easy to tell apart from an unmirrored one.
pub fn test_pattern(resolution: Resolution, tick: u64) -> Frame {
    let width = resolution.width.max(1);
    let height = resolution.height.max(1);
    let mut data = Vec::with_capacity(width as usize * height as usize * 3);
    let blue = (tick % 256) as u8;

    for y in 0..height {
        let green = (y * 255 / height.saturating_sub(1).max(1)) as u8;
        for x in 0..width {
            let red = (x * 255 / width.saturating_sub(1).max(1)) as u8;
            data.extend_from_slice(&[red, green, blue]);
        }
    }

    Frame::rgb(data, width, height)
}
