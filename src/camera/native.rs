//! Webcam backend using `nokhwa`.
//!
//! Requires the `native` feature to be enabled.

use std::time::{Duration, Instant};

use futures_util::future::BoxFuture;
use nokhwa::pixel_format::RgbFormat;
use nokhwa::utils::{
    ApiBackend, CameraFormat, CameraIndex, FrameFormat as NokhwaFrameFormat, RequestedFormat,
    RequestedFormatType,
};
use nokhwa::{query, Camera};

use super::capture::CameraCapture;
use super::capture_loop::FrameSource;
use super::device::MediaDevices;
use super::types::{CameraError, CameraInfo, Frame, FrameFormat, MediaConstraints, Resolution};

const FIRST_FRAME_TIMEOUT: Duration = Duration::from_secs(5);

/// Real camera selected by device index.
#[derive(Debug, Clone)]
pub struct NativeCamera {
    device_index: u32,
    fps: u32,
}

impl NativeCamera {
    pub fn new(device_index: u32, fps: u32) -> Self {
        Self { device_index, fps }
    }
}

impl MediaDevices for NativeCamera {
    type Stream = CameraCapture;

    fn acquire(
        &self,
        constraints: MediaConstraints,
    ) -> BoxFuture<'static, Result<CameraCapture, CameraError>> {
        let devices = self.list_devices();
        let device_index = self.device_index;
        let fps = self.fps;

        Box::pin(async move {
            let devices = devices?;
            if devices.is_empty() {
                return Err(CameraError::NoDevices);
            }
            if !devices.iter().any(|d| d.index == device_index) {
                return Err(CameraError::DeviceNotFound(device_index));
            }
            log::debug!(
                "Opening camera {} ({}, facing {}); facing preference is advisory",
                device_index,
                constraints.resolution(),
                constraints.facing.name()
            );

            let task = tokio::task::spawn_blocking(move || {
                let capture = CameraCapture::start(Box::new(move || {
                    NokhwaSource::open(device_index, constraints.resolution(), fps)
                        .map(|source| Box::new(source) as Box<dyn FrameSource>)
                }))?;
                if !capture.wait_for_first_frame(FIRST_FRAME_TIMEOUT) {
                    return Err(CameraError::StreamFailed(
                        "camera produced no frames".to_string(),
                    ));
                }
                Ok(capture)
            });

            task.await
                .map_err(|e| CameraError::StreamFailed(e.to_string()))?
        })
    }

    fn list_devices(&self) -> Result<Vec<CameraInfo>, CameraError> {
        let devices =
            query(ApiBackend::Auto).map_err(|e| CameraError::QueryFailed(e.to_string()))?;

        Ok(devices
            .into_iter()
            .map(|d| CameraInfo {
                index: d.index().as_index().unwrap_or(0),
                name: d.human_name(),
                description: d.description().to_string(),
            })
            .collect())
    }
}

struct NokhwaSource {
    camera: Camera,
    resolution: Resolution,
    fps: u32,
}

impl NokhwaSource {
    fn open(device_index: u32, resolution: Resolution, fps: u32) -> Result<Self, CameraError> {
        let index = CameraIndex::Index(device_index);
        let mut camera = open_camera_with_fallback(&index, resolution, fps)?;
        camera
            .open_stream()
            .map_err(|e| CameraError::StreamFailed(e.to_string()))?;

        let res = camera.resolution();
        Ok(Self {
            resolution: Resolution::new(res.width(), res.height()),
            fps: camera.frame_rate(),
            camera,
        })
    }
}

impl FrameSource for NokhwaSource {
    fn resolution(&self) -> Resolution {
        self.resolution
    }

    fn fps(&self) -> u32 {
        self.fps
    }

    fn next_frame(&mut self) -> Option<Frame> {
        let buffer = self.camera.frame().ok()?;
        // MJPEG, YUYV, NV12 and friends are decoded to RGB by nokhwa
        let decoded = buffer.decode_image::<RgbFormat>().ok()?;
        let res = buffer.resolution();
        Some(Frame {
            data: decoded.into_raw(),
            width: res.width(),
            height: res.height(),
            format: FrameFormat::Rgb,
            timestamp: Instant::now(),
        })
    }

    fn close(&mut self) {
        if let Err(e) = self.camera.stop_stream() {
            log::warn!("Failed to stop camera stream: {}", e);
        }
    }
}

/// Try NV12, then MJPEG, then whatever the camera offers at its highest resolution.
fn open_camera_with_fallback(
    index: &CameraIndex,
    resolution: Resolution,
    fps: u32,
) -> Result<Camera, CameraError> {
    let requested = nokhwa::utils::Resolution::new(resolution.width, resolution.height);
    let format_attempts = [
        RequestedFormat::new::<RgbFormat>(RequestedFormatType::Closest(CameraFormat::new(
            requested,
            NokhwaFrameFormat::NV12,
            fps,
        ))),
        RequestedFormat::new::<RgbFormat>(RequestedFormatType::Closest(CameraFormat::new(
            requested,
            NokhwaFrameFormat::MJPEG,
            fps,
        ))),
        RequestedFormat::new::<RgbFormat>(RequestedFormatType::AbsoluteHighestResolution),
    ];

    let mut last_error = None;
    for format in format_attempts {
        match Camera::new(index.clone(), format) {
            Ok(camera) => return Ok(camera),
            Err(e) => last_error = Some(e),
        }
    }

    Err(match last_error {
        Some(e) => CameraError::classify(e.to_string()),
        None => CameraError::NoDevices,
    })
}
