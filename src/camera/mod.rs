//! Camera access: device capability traits, exclusive stream ownership and
//! the capture thread that backs concrete devices.
//!
//! - Device capability via [`MediaDevices`] / [`MediaStream`]
//! - Exclusive ownership via [`DeviceHandle`]
//! - Backends: [`SyntheticCamera`] and, with the `native` feature, `NativeCamera`

mod capture;
mod capture_loop;
mod device;
pub mod frame_utils;
#[cfg(feature = "native")]
mod native;
mod synthetic;
mod types;

pub use capture::CameraCapture;
pub use capture_loop::{FrameSource, SourceOpener};
pub use device::{DeviceHandle, MediaDevices, MediaStream};
#[cfg(feature = "native")]
pub use native::NativeCamera;
pub use synthetic::SyntheticCamera;
pub use types::{
    CameraError, CameraInfo, FacingMode, Frame, FrameFormat, MediaConstraints, Resolution,
};
