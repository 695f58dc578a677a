//! CLI argument parsing with clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use selfie_booth::camera::Resolution;
use selfie_booth::config::{Backend, MAX_COUNTDOWN_SECONDS};

/// Webcam photo booth with a countdown, retake and a mirrored selfie capture
#[derive(Parser, Debug)]
#[command(name = "selfie-booth")]
#[command(version, about = "Take a webcam photo with a countdown", long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Config file path
    #[arg(long, short, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Open the camera, count down and take a photo (default)
    Capture(CaptureArgs),
    /// List available cameras
    ListCameras {
        /// Backend to query (default: from config)
        #[arg(long, value_enum)]
        backend: Option<Backend>,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Sign in with one of the demo accounts
    Login {
        #[arg(long, short)]
        username: String,
        #[arg(long, short)]
        password: String,
        /// Cookie header to restore a previous role from (e.g. "role=admin")
        #[arg(long)]
        cookie: Option<String>,
    },
}

#[derive(clap::Args, Debug, Default, Clone)]
pub struct CaptureArgs {
    /// Camera backend
    #[arg(long, value_enum)]
    pub backend: Option<Backend>,

    /// Camera device index (from list-cameras)
    #[arg(long)]
    pub camera: Option<u32>,

    /// Requested resolution, WIDTHxHEIGHT
    #[arg(long, value_parser = parse_resolution)]
    pub resolution: Option<Resolution>,

    /// Countdown length in seconds
    #[arg(
        long,
        conflicts_with = "no_countdown",
        value_parser = clap::value_parser!(u32).range(0..=MAX_COUNTDOWN_SECONDS as i64)
    )]
    pub countdown: Option<u32>,

    /// Take the photo immediately
    #[arg(long)]
    pub no_countdown: bool,

    /// Keep the photo unmirrored
    #[arg(long)]
    pub no_mirror: bool,

    /// Where to write the accepted photo
    #[arg(long, short)]
    pub output: Option<PathBuf>,

    /// Accept the first photo without prompting
    #[arg(long, short)]
    pub yes: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum ConfigAction {
    /// Show current configuration
    Show,
    /// Create default config file
    Init,
}

/// Parse and validate resolution (WIDTHxHEIGHT format)
fn parse_resolution(s: &str) -> Result<Resolution, String> {
    let parts: Vec<&str> = s.split('x').collect();
    if parts.len() != 2 {
        return Err(format!(
            "Invalid resolution format '{}'. Use WIDTHxHEIGHT (e.g., 640x480)",
            s
        ));
    }
    let width: u32 = parts[0]
        .parse()
        .map_err(|_| format!("Invalid width '{}' in resolution", parts[0]))?;
    let height: u32 = parts[1]
        .parse()
        .map_err(|_| format!("Invalid height '{}' in resolution", parts[1]))?;
    if width == 0 || height == 0 {
        return Err("Resolution width and height must be greater than 0".to_string());
    }
    if width > 7680 || height > 4320 {
        return Err("Resolution exceeds maximum supported (7680x4320)".to_string());
    }
    Ok(Resolution::new(width, height))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_defaults() {
        let args = Args::parse_from(["selfie-booth"]);
        assert!(args.config.is_none());
        assert!(args.command.is_none());
    }

    #[test]
    fn test_args_capture_options() {
        let args = Args::parse_from([
            "selfie-booth",
            "capture",
            "--camera",
            "1",
            "--resolution",
            "1280x720",
            "--countdown",
            "5",
            "--no-mirror",
            "-o",
            "/tmp/me.png",
            "--yes",
        ]);
        match args.command {
            Some(Command::Capture(capture)) => {
                assert_eq!(capture.camera, Some(1));
                assert_eq!(capture.resolution, Some(Resolution::HIGH));
                assert_eq!(capture.countdown, Some(5));
                assert!(capture.no_mirror);
                assert!(!capture.no_countdown);
                assert_eq!(capture.output, Some(PathBuf::from("/tmp/me.png")));
                assert!(capture.yes);
            }
            other => panic!("Expected Capture subcommand, got {:?}", other),
        }
    }

    #[test]
    fn test_countdown_conflicts_with_no_countdown() {
        let result =
            Args::try_parse_from(["selfie-booth", "capture", "--countdown", "2", "--no-countdown"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_countdown_is_capped_like_config() {
        let max = MAX_COUNTDOWN_SECONDS.to_string();
        assert!(Args::try_parse_from(["selfie-booth", "capture", "--countdown", max.as_str()]).is_ok());

        let over = (MAX_COUNTDOWN_SECONDS + 1).to_string();
        assert!(Args::try_parse_from(["selfie-booth", "capture", "--countdown", over.as_str()]).is_err());
    }

    #[test]
    fn test_backend_values() {
        let args = Args::parse_from(["selfie-booth", "capture", "--backend", "native"]);
        match args.command {
            Some(Command::Capture(capture)) => assert_eq!(capture.backend, Some(Backend::Native)),
            other => panic!("Expected Capture subcommand, got {:?}", other),
        }
    }

    #[test]
    fn test_args_config_option_is_global() {
        let args = Args::parse_from(["selfie-booth", "list-cameras", "-c", "/tmp/test.toml"]);
        assert_eq!(args.config, Some(PathBuf::from("/tmp/test.toml")));
        assert!(matches!(
            args.command,
            Some(Command::ListCameras { backend: None })
        ));
    }

    #[test]
    fn test_args_config_init_subcommand() {
        let args = Args::parse_from(["selfie-booth", "config", "init"]);
        match args.command {
            Some(Command::Config {
                action: ConfigAction::Init,
            }) => (),
            _ => panic!("Expected Config Init subcommand"),
        }
    }

    #[test]
    fn test_args_login_subcommand() {
        let args = Args::parse_from([
            "selfie-booth",
            "login",
            "-u",
            "admin",
            "-p",
            "password",
            "--cookie",
            "role=admin",
        ]);
        match args.command {
            Some(Command::Login {
                username,
                password,
                cookie,
            }) => {
                assert_eq!(username, "admin");
                assert_eq!(password, "password");
                assert_eq!(cookie.as_deref(), Some("role=admin"));
            }
            other => panic!("Expected Login subcommand, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_resolution() {
        assert_eq!(parse_resolution("640x480"), Ok(Resolution::MEDIUM));
        assert!(parse_resolution("640").is_err());
        assert!(parse_resolution("0x480").is_err());
        assert!(parse_resolution("99999x480").is_err());
    }
}
