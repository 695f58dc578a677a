//! Session state: one tagged value instead of independent flags.

use std::fmt;

use super::countdown::CountdownTimer;
use crate::camera::{CameraError, DeviceHandle, MediaStream};
use crate::compose::CapturedImage;

/// Observable phase of a capture session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionPhase {
    /// Modal closed, no resources held
    #[default]
    Closed,
    /// Waiting for the camera
    Acquiring,
    /// Modal open but the camera could not be acquired; capture is disabled
    Unavailable,
    /// Live preview running
    Previewing,
    /// Live preview with a countdown showing the remaining seconds
    CountingDown(u32),
    /// Photo taken, camera released
    Frozen,
}

impl SessionPhase {
    pub fn name(&self) -> &'static str {
        match self {
            SessionPhase::Closed => "closed",
            SessionPhase::Acquiring => "acquiring",
            SessionPhase::Unavailable => "unavailable",
            SessionPhase::Previewing => "previewing",
            SessionPhase::CountingDown(_) => "counting-down",
            SessionPhase::Frozen => "frozen",
        }
    }

    /// Whether the modal is showing.
    pub fn is_open(&self) -> bool {
        !matches!(self, SessionPhase::Closed)
    }

    /// Whether a camera stream is bound to the preview.
    pub fn device_active(&self) -> bool {
        matches!(
            self,
            SessionPhase::Previewing | SessionPhase::CountingDown(_)
        )
    }
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionPhase::CountingDown(n) => write!(f, "counting-down({})", n),
            other => f.write_str(other.name()),
        }
    }
}

/// Full session state. Resources live inside the variant that owns them, so a
/// captured image and a live device can never coexist.
pub(crate) enum SessionState<S: MediaStream> {
    Closed,
    Acquiring {
        token: u64,
    },
    Unavailable {
        error: CameraError,
    },
    Previewing {
        device: DeviceHandle<S>,
    },
    CountingDown {
        device: DeviceHandle<S>,
        remaining: u32,
        timer: CountdownTimer,
    },
    Frozen {
        image: CapturedImage,
    },
}

impl<S: MediaStream> SessionState<S> {
    pub(crate) fn phase(&self) -> SessionPhase {
        match self {
            SessionState::Closed => SessionPhase::Closed,
            SessionState::Acquiring { .. } => SessionPhase::Acquiring,
            SessionState::Unavailable { .. } => SessionPhase::Unavailable,
            SessionState::Previewing { .. } => SessionPhase::Previewing,
            SessionState::CountingDown { remaining, .. } => SessionPhase::CountingDown(*remaining),
            SessionState::Frozen { .. } => SessionPhase::Frozen,
        }
    }
}
