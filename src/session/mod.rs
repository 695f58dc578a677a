//! Capture session: the state machine behind the "take a photo" modal.

mod controller;
mod countdown;
mod host;
mod state;

pub use controller::{CaptureSession, SessionSettings};
pub use countdown::CountdownTimer;
pub use host::SessionHost;
pub use state::SessionPhase;
