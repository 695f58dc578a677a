//! Device acquisition capability and exclusive stream ownership.

use futures_util::future::BoxFuture;

use super::types::{CameraError, CameraInfo, Frame, MediaConstraints, Resolution};

/// A live media stream produced by a [`MediaDevices`] backend.
pub trait MediaStream: Send + 'static {
    /// Resolution the device reports for the running video track, if known.
    fn resolution(&self) -> Option<Resolution>;

    /// Most recent frame delivered by the device.
    fn latest_frame(&self) -> Option<Frame>;

    /// Stop every track of the stream and free the device.
    ///
    /// Blocks until the device is closed; thread-backed streams join their
    /// capture thread here, which takes up to one frame interval.
    fn stop_all_tracks(&mut self);
}

/// Capability to request exclusive access to a camera.
pub trait MediaDevices: Send + Sync + 'static {
    type Stream: MediaStream;

    /// Request a stream matching `constraints`.
    ///
    /// The returned future must be `'static` so it can run on a background task
    /// while the session keeps handling input.
    fn acquire(
        &self,
        constraints: MediaConstraints,
    ) -> BoxFuture<'static, Result<Self::Stream, CameraError>>;

    /// List cameras this backend can open.
    fn list_devices(&self) -> Result<Vec<CameraInfo>, CameraError>;
}

/// Exclusive ownership of one acquired stream.
///
/// The stream is stopped exactly once: either through [`DeviceHandle::release`]
/// or when the handle is dropped.
pub struct DeviceHandle<S: MediaStream> {
    stream: Option<S>,
}

impl<S: MediaStream> DeviceHandle<S> {
    pub fn new(stream: S) -> Self {
        Self {
            stream: Some(stream),
        }
    }

    pub fn resolution(&self) -> Option<Resolution> {
        self.stream.as_ref().and_then(|s| s.resolution())
    }

    pub fn latest_frame(&self) -> Option<Frame> {
        self.stream.as_ref().and_then(|s| s.latest_frame())
    }

    /// Stop all tracks now.
    pub fn release(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            stream.stop_all_tracks();
            log::debug!("Camera stream released");
        }
    }
}

impl<S: MediaStream> Drop for DeviceHandle<S> {
    fn drop(&mut self) {
        self.stop();
    }
}

impl<S: MediaStream> std::fmt::Debug for DeviceHandle<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceHandle")
            .field("live", &self.stream.is_some())
            .field("resolution", &self.resolution())
            .finish()
    }
}
