//! selfie-booth library crate.
//!
//! The capture session state machine, the camera backends it drives and the
//! PNG compositor, exposed for the CLI and for integration testing.

pub mod camera;
pub mod compose;
pub mod config;
pub mod login;
pub mod session;
pub mod testing;
