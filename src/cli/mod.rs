//! Command-line interface definitions and helpers.
//!
//! This module contains CLI argument parsing, subcommand handlers and the
//! interactive capture driver.

mod args;
mod capture;
mod commands;

use std::path::PathBuf;

use selfie_booth::camera::CameraError;
use selfie_booth::compose::CompositeError;
use selfie_booth::config::ConfigError;

pub use args::{Args, Command, ConfigAction};
pub use capture::{run_capture, CaptureOutcome};
pub use commands::{handle_config_action, list_cameras, login};

/// Errors surfaced to the user by the binary.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("Camera error: {0}")]
    Camera(#[from] CameraError),
    #[error("Could not take a photo: {0}")]
    Composite(#[from] CompositeError),
    #[error("Failed to write '{}': {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to read input: {0}")]
    Input(#[from] std::io::Error),
    #[error("Failed to install Ctrl-C handler: {0}")]
    Signal(#[from] ctrlc::Error),
    #[error("Config file already exists: {}", path.display())]
    ConfigExists { path: PathBuf },
    #[error("The native backend is not available; rebuild with `--features native`")]
    NativeUnavailable,
    #[error("Invalid credentials")]
    LoginRejected,
}
