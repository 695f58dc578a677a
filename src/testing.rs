//! Scriptable camera backend and recording host for tests.
//!
//! [`ScriptedDevices`] hands out in-memory streams and counts every
//! acquisition and release, so leak and double-release checks are a matter
//! of comparing two numbers. Acquisitions can be made to fail or to wait
//! on a [`Gate`].

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use futures_util::future::BoxFuture;
use tokio::sync::oneshot;

use crate::camera::frame_utils::test_pattern;
use crate::camera::{
    CameraError, CameraInfo, Frame, MediaConstraints, MediaDevices, MediaStream, Resolution,
};
use crate::compose::{CapturedImage, CompositeError};
use crate::session::{SessionHost, SessionPhase};

/// Acquisition and release counters shared by a backend and its streams.
#[derive(Debug, Clone, Default)]
pub struct DeviceStats {
    inner: Arc<StatsInner>,
}

#[derive(Debug, Default)]
struct StatsInner {
    acquisitions: AtomicUsize,
    releases: AtomicUsize,
    requests: Mutex<Vec<MediaConstraints>>,
}

impl DeviceStats {
    /// Streams successfully handed out.
    pub fn acquisitions(&self) -> usize {
        self.inner.acquisitions.load(Ordering::SeqCst)
    }

    /// `stop_all_tracks` calls, including repeated ones.
    pub fn releases(&self) -> usize {
        self.inner.releases.load(Ordering::SeqCst)
    }

    /// Streams acquired but not yet released.
    pub fn live(&self) -> usize {
        self.acquisitions().saturating_sub(self.releases())
    }

    /// Every constraint set passed to `acquire`, in order.
    pub fn requests(&self) -> Vec<MediaConstraints> {
        self.inner
            .requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }
}

/// What the next acquisition does.
enum Script {
    Grant,
    Fail(CameraError),
    Wait(oneshot::Receiver<()>),
}

/// Holds a pending acquisition until [`Gate::open`] is called.
///
/// Dropping the gate without opening it fails the acquisition.
#[derive(Debug)]
pub struct Gate {
    tx: oneshot::Sender<()>,
}

impl Gate {
    pub fn open(self) {
        let _ = self.tx.send(());
    }
}

/// In-memory camera backend.
#[derive(Clone)]
pub struct ScriptedDevices {
    stats: DeviceStats,
    script: Arc<Mutex<VecDeque<Script>>>,
    resolution: Option<Resolution>,
    frame: Option<Frame>,
}

impl ScriptedDevices {
    /// Grants every acquisition with an 8x6 test-pattern stream.
    pub fn new() -> Self {
        let resolution = Resolution::new(8, 6);
        Self {
            stats: DeviceStats::default(),
            script: Arc::new(Mutex::new(VecDeque::new())),
            resolution: Some(resolution),
            frame: Some(test_pattern(resolution, 0)),
        }
    }

    /// Resolution streams report; `None` mimics a device that never reports one.
    pub fn with_resolution(mut self, resolution: Option<Resolution>) -> Self {
        self.resolution = resolution;
        self
    }

    /// Streams that never deliver a frame, so every capture fails to composite.
    pub fn without_frames(mut self) -> Self {
        self.frame = None;
        self
    }

    pub fn stats(&self) -> DeviceStats {
        self.stats.clone()
    }

    /// Make the next unscripted acquisition fail with `error`.
    pub fn fail_next(&self, error: CameraError) {
        self.push(Script::Fail(error));
    }

    /// Make the next unscripted acquisition wait until the returned gate opens.
    pub fn hold_next(&self) -> Gate {
        let (tx, rx) = oneshot::channel();
        self.push(Script::Wait(rx));
        Gate { tx }
    }

    fn push(&self, step: Script) {
        if let Ok(mut script) = self.script.lock() {
            script.push_back(step);
        }
    }
}

impl Default for ScriptedDevices {
    fn default() -> Self {
        Self::new()
    }
}

impl MediaDevices for ScriptedDevices {
    type Stream = ScriptedStream;

    fn acquire(
        &self,
        constraints: MediaConstraints,
    ) -> BoxFuture<'static, Result<ScriptedStream, CameraError>> {
        if let Ok(mut requests) = self.stats.inner.requests.lock() {
            requests.push(constraints);
        }
        let step = self
            .script
            .lock()
            .ok()
            .and_then(|mut script| script.pop_front())
            .unwrap_or(Script::Grant);
        let stats = self.stats.clone();
        let resolution = self.resolution;
        let frame = self.frame.clone();

        Box::pin(async move {
            match step {
                Script::Grant => {}
                Script::Fail(error) => return Err(error),
                Script::Wait(rx) => {
                    if rx.await.is_err() {
                        return Err(CameraError::StreamFailed("gate dropped".to_string()));
                    }
                }
            }
            stats.inner.acquisitions.fetch_add(1, Ordering::SeqCst);
            Ok(ScriptedStream {
                stats,
                resolution,
                frame,
            })
        })
    }

    fn list_devices(&self) -> Result<Vec<CameraInfo>, CameraError> {
        Ok(vec![CameraInfo {
            index: 0,
            name: "Scripted Camera".to_string(),
            description: "in-memory".to_string(),
        }])
    }
}

/// Stream handed out by [`ScriptedDevices`].
#[derive(Debug)]
pub struct ScriptedStream {
    stats: DeviceStats,
    resolution: Option<Resolution>,
    frame: Option<Frame>,
}

impl MediaStream for ScriptedStream {
    fn resolution(&self) -> Option<Resolution> {
        self.resolution
    }

    fn latest_frame(&self) -> Option<Frame> {
        self.frame.clone()
    }

    fn stop_all_tracks(&mut self) {
        self.stats.inner.releases.fetch_add(1, Ordering::SeqCst);
    }
}

/// Host that records every callback.
#[derive(Debug, Default)]
pub struct RecordingHost {
    pub modal: Vec<bool>,
    pub captures: Vec<CapturedImage>,
    pub countdown: Vec<Option<u32>>,
    pub device_errors: Vec<CameraError>,
    pub capture_errors: Vec<CompositeError>,
    pub phases: Vec<SessionPhase>,
}

impl RecordingHost {
    /// Whether the last modal signal was "open".
    pub fn modal_open(&self) -> bool {
        self.modal.last().copied().unwrap_or(false)
    }

    /// How many times the session entered `phase`.
    pub fn entered(&self, phase: SessionPhase) -> usize {
        self.phases.iter().filter(|p| **p == phase).count()
    }
}

impl SessionHost for RecordingHost {
    fn set_modal_open(&mut self, open: bool) {
        self.modal.push(open);
    }

    fn on_capture(&mut self, image: &CapturedImage) {
        self.captures.push(image.clone());
    }

    fn on_countdown(&mut self, remaining: Option<u32>) {
        self.countdown.push(remaining);
    }

    fn on_device_error(&mut self, error: &CameraError) {
        self.device_errors.push(error.clone());
    }

    fn on_capture_failed(&mut self, error: &CompositeError) {
        self.capture_errors.push(error.clone());
    }

    fn on_phase(&mut self, phase: SessionPhase) {
        self.phases.push(phase);
    }
}
