//! Callbacks from the session to whatever presents it.

use super::state::SessionPhase;
use crate::camera::CameraError;
use crate::compose::{CapturedImage, CompositeError};

/// The presenter hosting a capture session.
pub trait SessionHost {
    /// The only way the session signals that its modal is open or closed.
    fn set_modal_open(&mut self, open: bool);

    /// Called exactly once per accepted photo, right before the modal closes.
    fn on_capture(&mut self, image: &CapturedImage);

    /// Countdown value to display, `None` when the overlay should disappear.
    fn on_countdown(&mut self, _remaining: Option<u32>) {}

    /// The camera could not be acquired. The session stays open with capture disabled.
    fn on_device_error(&mut self, _error: &CameraError) {}

    /// A capture attempt could not composite a photo. The session keeps previewing.
    fn on_capture_failed(&mut self, _error: &CompositeError) {}

    /// Every phase change, in order.
    fn on_phase(&mut self, _phase: SessionPhase) {}
}

impl<H: SessionHost + ?Sized> SessionHost for &mut H {
    fn set_modal_open(&mut self, open: bool) {
        (**self).set_modal_open(open)
    }

    fn on_capture(&mut self, image: &CapturedImage) {
        (**self).on_capture(image)
    }

    fn on_countdown(&mut self, remaining: Option<u32>) {
        (**self).on_countdown(remaining)
    }

    fn on_device_error(&mut self, error: &CameraError) {
        (**self).on_device_error(error)
    }

    fn on_capture_failed(&mut self, error: &CompositeError) {
        (**self).on_capture_failed(error)
    }

    fn on_phase(&mut self, phase: SessionPhase) {
        (**self).on_phase(phase)
    }
}
