//! Camera capture handle backed by a background thread.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Sender};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use super::capture_loop::{run_capture_loop, CaptureCommand, SourceOpener};
use super::device::MediaStream;
use super::types::{CameraError, Frame, Resolution};

/// Camera capture handle.
///
/// The device is opened inside a background thread that continuously
/// captures frames and stores the latest one in a shared buffer. Use
/// `get_frame()` to retrieve it and `stop()` to shut the thread down.
pub struct CameraCapture {
    /// Latest captured frame (shared with capture thread)
    frame_buffer: Arc<Mutex<Option<Frame>>>,
    /// Capture thread handle
    capture_thread: Option<JoinHandle<()>>,
    /// Channel to send commands to capture thread
    command_tx: Option<Sender<CaptureCommand>>,
    /// Signal to stop capture thread
    stop_signal: Arc<AtomicBool>,
    /// Actual resolution reported by the device
    actual_resolution: Option<Resolution>,
    /// Actual FPS reported by the device
    actual_fps: Option<u32>,
}

impl std::fmt::Debug for CameraCapture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CameraCapture")
            .field("actual_resolution", &self.actual_resolution)
            .field("is_running", &self.is_running())
            .finish_non_exhaustive()
    }
}

impl CameraCapture {
    /// Spawn the capture thread and wait until the source reports success or failure.
    ///
    /// This blocks the calling thread while the device opens; async callers
    /// should run it on a blocking task.
    ///
    /// # Errors
    /// Whatever the opener returns (`PermissionDenied`, `DeviceNotFound`,
    /// `OpenFailed`, ...) or `StreamFailed` if the thread dies before reporting.
    pub fn start(open: SourceOpener) -> Result<Self, CameraError> {
        let frame_buffer = Arc::new(Mutex::new(None));
        let stop_signal = Arc::new(AtomicBool::new(false));
        let (tx, rx) = mpsc::channel();
        let (info_tx, info_rx) = mpsc::channel::<Result<(Resolution, u32), CameraError>>();

        let buffer = Arc::clone(&frame_buffer);
        let stop = Arc::clone(&stop_signal);
        let handle = std::thread::Builder::new()
            .name("camera-capture".to_string())
            .spawn(move || run_capture_loop(open, buffer, stop, rx, info_tx))
            .map_err(|e| CameraError::StreamFailed(e.to_string()))?;

        let mut capture = Self {
            frame_buffer,
            capture_thread: Some(handle),
            command_tx: Some(tx),
            stop_signal,
            actual_resolution: None,
            actual_fps: None,
        };

        match info_rx.recv() {
            Ok(Ok((res, fps))) => {
                log::info!("Camera stream started at {} @ {} fps", res, fps);
                capture.actual_resolution = Some(res);
                capture.actual_fps = Some(fps);
                Ok(capture)
            }
            Ok(Err(e)) => {
                capture.stop();
                Err(e)
            }
            Err(_) => {
                capture.stop();
                Err(CameraError::StreamFailed(
                    "Capture thread terminated unexpectedly".to_string(),
                ))
            }
        }
    }

    /// Get the actual resolution the camera is using.
    ///
    /// This may differ from the requested resolution if the camera
    /// doesn't support it exactly.
    pub fn actual_resolution(&self) -> Option<Resolution> {
        self.actual_resolution
    }

    /// Get the actual frame rate the camera is using.
    pub fn actual_fps(&self) -> Option<u32> {
        self.actual_fps
    }

    /// Stop the capture thread and wait for it to finish.
    pub fn stop(&mut self) {
        self.stop_signal.store(true, Ordering::SeqCst);

        // Also send stop command via channel (in case thread is blocked)
        if let Some(tx) = self.command_tx.take() {
            let _ = tx.send(CaptureCommand::Stop);
        }

        if let Some(handle) = self.capture_thread.take() {
            let _ = handle.join();
        }

        if let Ok(mut buf) = self.frame_buffer.lock() {
            *buf = None;
        }
    }

    /// Get the latest captured frame.
    ///
    /// Returns `None` if no frame has been captured yet or capture is stopped.
    pub fn get_frame(&self) -> Option<Frame> {
        let buffer = self.frame_buffer.lock().ok()?;
        buffer.clone()
    }

    /// Block until the first frame lands in the buffer or `timeout` elapses.
    pub fn wait_for_first_frame(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            if self.frame_buffer.lock().is_ok_and(|buf| buf.is_some()) {
                return true;
            }
            if Instant::now() >= deadline || !self.is_running() {
                return false;
            }
            std::thread::sleep(Duration::from_millis(5));
        }
    }

    /// Check if the capture thread is currently running.
    pub fn is_running(&self) -> bool {
        self.capture_thread
            .as_ref()
            .is_some_and(|h| !h.is_finished())
    }
}

impl MediaStream for CameraCapture {
    fn resolution(&self) -> Option<Resolution> {
        self.actual_resolution
    }

    fn latest_frame(&self) -> Option<Frame> {
        self.get_frame()
    }

    fn stop_all_tracks(&mut self) {
        self.stop();
    }
}

impl Drop for CameraCapture {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::capture_loop::FrameSource;
    use crate::camera::DeviceHandle;

    struct Solid;

    impl FrameSource for Solid {
        fn resolution(&self) -> Resolution {
            Resolution::new(4, 2)
        }

        fn fps(&self) -> u32 {
            60
        }

        fn next_frame(&mut self) -> Option<Frame> {
            Some(Frame::rgb(vec![200; 24], 4, 2))
        }
    }

    #[test]
    fn test_start_reports_failure() {
        let result = CameraCapture::start(Box::new(|| Err(CameraError::DeviceNotFound(7))));
        match result {
            Err(CameraError::DeviceNotFound(idx)) => assert_eq!(idx, 7),
            other => panic!("Expected DeviceNotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_start_and_stop() {
        let mut capture =
            CameraCapture::start(Box::new(|| Ok(Box::new(Solid) as Box<dyn FrameSource>)))
                .expect("solid source opens");
        assert_eq!(capture.actual_resolution(), Some(Resolution::new(4, 2)));
        assert_eq!(capture.actual_fps(), Some(60));

        assert!(capture.wait_for_first_frame(Duration::from_secs(2)));
        assert!(capture.get_frame().is_some());

        capture.stop_all_tracks();
        assert!(!capture.is_running());
        assert!(capture.get_frame().is_none());
    }

    struct Tracked {
        closed: Arc<AtomicBool>,
    }

    impl FrameSource for Tracked {
        fn resolution(&self) -> Resolution {
            Resolution::new(4, 2)
        }

        fn fps(&self) -> u32 {
            60
        }

        fn next_frame(&mut self) -> Option<Frame> {
            Some(Frame::rgb(vec![10; 24], 4, 2))
        }

        fn close(&mut self) {
            self.closed.store(true, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_release_returns_after_device_closed() {
        let closed = Arc::new(AtomicBool::new(false));
        let source_closed = Arc::clone(&closed);
        let capture = CameraCapture::start(Box::new(move || {
            Ok(Box::new(Tracked {
                closed: source_closed,
            }) as Box<dyn FrameSource>)
        }))
        .expect("tracked source opens");
        assert!(capture.wait_for_first_frame(Duration::from_secs(2)));

        DeviceHandle::new(capture).release();
        assert!(closed.load(Ordering::SeqCst));
    }
}
