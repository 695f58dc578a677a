//! Subcommand handlers for list-cameras, config and login.

use std::path::{Path, PathBuf};

use selfie_booth::camera::{CameraInfo, MediaDevices, SyntheticCamera};
use selfie_booth::config::{default_path, Backend, Config, DEFAULT_CONFIG_TOML};
use selfie_booth::login::{LoginForm, LoginOutcome, MemoryRoleStore, Navigator, Notifier};

use super::args::ConfigAction;
use super::CliError;

fn query_devices(backend: Backend, config: &Config) -> Result<Vec<CameraInfo>, CliError> {
    match backend {
        Backend::Synthetic => {
            Ok(SyntheticCamera::new(config.camera.device, config.camera.fps).list_devices()?)
        }
        #[cfg(feature = "native")]
        Backend::Native => Ok(selfie_booth::camera::NativeCamera::new(
            config.camera.device,
            config.camera.fps,
        )
        .list_devices()?),
        #[cfg(not(feature = "native"))]
        Backend::Native => Err(CliError::NativeUnavailable),
    }
}

/// List available cameras and print them to stdout.
pub fn list_cameras(backend: Option<Backend>, config: &Config) -> Result<(), CliError> {
    let devices = query_devices(backend.unwrap_or(config.camera.backend), config)?;
    if devices.is_empty() {
        println!("No cameras found.");
        println!();
        println!("Make sure your camera is connected and permissions are granted.");
    } else {
        println!("Available cameras:");
        for device in devices {
            println!("  {}", device);
        }
        println!();
        println!("Use --camera <index> to select a camera.");
    }
    Ok(())
}

/// Handle config subcommand actions. `path` is the `--config` override, if any.
pub fn handle_config_action(
    action: ConfigAction,
    path: Option<&Path>,
    config: &Config,
) -> Result<(), CliError> {
    let config_path = path.map(PathBuf::from).unwrap_or_else(default_path);
    match action {
        ConfigAction::Show => {
            println!("Current configuration:");
            println!("  Backend: {:?}", config.camera.backend);
            println!("  Camera: {}", config.camera.device);
            println!(
                "  Resolution: {}x{}",
                config.camera.width, config.camera.height
            );
            println!("  Facing: {}", config.camera.facing.name());
            println!("  Mirror: {}", if config.camera.mirror { "yes" } else { "no" });
            println!(
                "  Countdown: {}s ({}ms per step)",
                config.countdown.seconds, config.countdown.tick_ms
            );
            println!("  Output: {}", config.output.path.display());
            println!();

            if config_path.exists() {
                println!("Config file: {} (exists)", config_path.display());
            } else {
                println!("Config file: {} (not found)", config_path.display());
            }
            Ok(())
        }
        ConfigAction::Init => init_config(&config_path),
    }
}

fn init_config(config_path: &Path) -> Result<(), CliError> {
    if config_path.exists() {
        return Err(CliError::ConfigExists {
            path: config_path.to_path_buf(),
        });
    }

    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent).map_err(|source| CliError::Write {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    std::fs::write(config_path, DEFAULT_CONFIG_TOML).map_err(|source| CliError::Write {
        path: config_path.to_path_buf(),
        source,
    })?;

    println!("Created config file: {}", config_path.display());
    Ok(())
}

/// Prints navigation and notifications instead of routing a browser.
#[derive(Debug, Default)]
struct ConsoleRouter;

impl Navigator for ConsoleRouter {
    fn push(&mut self, path: &str) {
        println!("Redirecting to {}", path);
    }

    fn replace(&mut self, path: &str) {
        println!("Already signed in, redirecting to {}", path);
    }
}

impl Notifier for ConsoleRouter {
    fn success(&mut self, message: &str) {
        println!("{}", message);
    }

    fn error(&mut self, message: &str) {
        eprintln!("{}", message);
    }
}

/// Sign in with a demo account, or pick up the role from a cookie.
pub fn login(username: &str, password: &str, cookie: Option<&str>) -> Result<(), CliError> {
    let mut form = LoginForm::new(MemoryRoleStore::default(), ConsoleRouter, ConsoleRouter);
    if form.restore(cookie).is_some() {
        return Ok(());
    }
    match form.submit(username, password) {
        LoginOutcome::SignedIn(_) => Ok(()),
        LoginOutcome::Rejected => Err(CliError::LoginRejected),
    }
}
