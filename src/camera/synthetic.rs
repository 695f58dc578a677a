//! Synthetic camera backend producing an animated test pattern.
//!
//! Behaves like a real device: frames come from a background capture thread,
//! the stream must be stopped, and unknown device indices are rejected.

use std::thread;
use std::time::{Duration, Instant};

use futures_util::future::BoxFuture;

use super::capture::CameraCapture;
use super::capture_loop::FrameSource;
use super::device::MediaDevices;
use super::frame_utils::test_pattern;
use super::types::{CameraError, CameraInfo, Frame, MediaConstraints, Resolution};

/// How long acquisition waits for the first frame before giving up.
const FIRST_FRAME_TIMEOUT: Duration = Duration::from_secs(2);

/// Test-pattern camera with a single device at index 0.
#[derive(Debug, Clone)]
pub struct SyntheticCamera {
    device_index: u32,
    fps: u32,
}

impl SyntheticCamera {
    pub fn new(device_index: u32, fps: u32) -> Self {
        Self {
            device_index,
            fps: fps.clamp(1, 120),
        }
    }
}

impl Default for SyntheticCamera {
    fn default() -> Self {
        Self::new(0, 30)
    }
}

impl MediaDevices for SyntheticCamera {
    type Stream = CameraCapture;

    fn acquire(
        &self,
        constraints: MediaConstraints,
    ) -> BoxFuture<'static, Result<CameraCapture, CameraError>> {
        let device_index = self.device_index;
        let fps = self.fps;

        Box::pin(async move {
            if device_index != 0 {
                return Err(CameraError::DeviceNotFound(device_index));
            }
            if constraints.audio {
                log::warn!("Synthetic camera has no microphone, ignoring audio request");
            }

            let resolution = constraints.resolution();
            let task = tokio::task::spawn_blocking(move || {
                let capture = CameraCapture::start(Box::new(move || {
                    Ok(Box::new(TestPatternSource::new(resolution, fps)) as Box<dyn FrameSource>)
                }))?;
                if !capture.wait_for_first_frame(FIRST_FRAME_TIMEOUT) {
                    return Err(CameraError::StreamFailed(
                        "no frames received from synthetic camera".to_string(),
                    ));
                }
                Ok(capture)
            });

            task.await
                .map_err(|e| CameraError::StreamFailed(e.to_string()))?
        })
    }

    fn list_devices(&self) -> Result<Vec<CameraInfo>, CameraError> {
        Ok(vec![CameraInfo {
            index: 0,
            name: "Synthetic Camera".to_string(),
            description: "animated test pattern".to_string(),
        }])
    }
}

/// Frame source rendering [`test_pattern`] at a fixed rate.
struct TestPatternSource {
    resolution: Resolution,
    fps: u32,
    interval: Duration,
    tick: u64,
    last: Option<Instant>,
}

impl TestPatternSource {
    fn new(resolution: Resolution, fps: u32) -> Self {
        let resolution = if resolution.is_empty() {
            Resolution::MEDIUM
        } else {
            resolution
        };
        Self {
            resolution,
            fps,
            interval: Duration::from_secs(1) / fps.max(1),
            tick: 0,
            last: None,
        }
    }
}

impl FrameSource for TestPatternSource {
    fn resolution(&self) -> Resolution {
        self.resolution
    }

    fn fps(&self) -> u32 {
        self.fps
    }

    fn next_frame(&mut self) -> Option<Frame> {
        // First frame is immediate, later ones are paced to the frame rate
        if let Some(last) = self.last {
            let due = last + self.interval;
            let now = Instant::now();
            if due > now {
                thread::sleep(due - now);
            }
        }
        self.last = Some(Instant::now());
        self.tick = self.tick.wrapping_add(1);
        Some(test_pattern(self.resolution, self.tick))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::MediaStream;

    #[test]
    fn test_list_devices_has_one_camera() {
        let devices = SyntheticCamera::default().list_devices().unwrap();
        assert_eq!(devices.len(), 1);
        assert_eq!(devices[0].index, 0);
    }

    #[tokio::test]
    async fn test_acquire_unknown_device_fails() {
        let camera = SyntheticCamera::new(3, 30);
        let result = camera.acquire(MediaConstraints::default()).await;
        match result {
            Err(CameraError::DeviceNotFound(idx)) => assert_eq!(idx, 3),
            other => panic!("Expected DeviceNotFound, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_acquire_delivers_frames_at_requested_size() {
        let camera = SyntheticCamera::new(0, 60);
        let mut stream = camera
            .acquire(MediaConstraints {
                width: 32,
                height: 24,
                ..MediaConstraints::default()
            })
            .await
            .expect("synthetic camera opens");

        assert_eq!(stream.resolution(), Some(Resolution::new(32, 24)));
        let frame = stream.latest_frame().expect("first frame is ready");
        assert_eq!((frame.width, frame.height), (32, 24));

        stream.stop_all_tracks();
        assert!(!stream.is_running());
    }
}
