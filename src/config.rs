//! Configuration file handling for selfie-booth.
//!
//! Loads configuration from `~/.config/selfie-booth/config.toml` or a custom path.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::camera::{FacingMode, MediaConstraints, Resolution};
use crate::session::SessionSettings;

/// Which camera backend the CLI drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Animated test pattern, no hardware needed
    #[default]
    Synthetic,
    /// Real webcam (requires the `native` feature)
    Native,
}

/// Configuration file structure.
#[derive(Debug, Deserialize, Default, Clone, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub camera: CameraConfig,
    #[serde(default)]
    pub countdown: CountdownConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct CameraConfig {
    #[serde(default)]
    pub backend: Backend,
    #[serde(default)]
    pub device: u32,
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
    #[serde(default)]
    pub facing: FacingMode,
    #[serde(default = "default_fps")]
    pub fps: u32,
    #[serde(default = "default_true")]
    pub mirror: bool,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            backend: Backend::default(),
            device: 0,
            width: default_width(),
            height: default_height(),
            facing: FacingMode::default(),
            fps: default_fps(),
            mirror: true,
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct CountdownConfig {
    #[serde(default = "default_seconds")]
    pub seconds: u32,
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,
}

impl Default for CountdownConfig {
    fn default() -> Self {
        Self {
            seconds: default_seconds(),
            tick_ms: default_tick_ms(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct OutputConfig {
    #[serde(default = "default_output_path")]
    pub path: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: default_output_path(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_width() -> u32 {
    Resolution::MEDIUM.width
}

fn default_height() -> u32 {
    Resolution::MEDIUM.height
}

fn default_fps() -> u32 {
    30
}

fn default_seconds() -> u32 {
    3
}

fn default_tick_ms() -> u64 {
    1000
}

fn default_output_path() -> PathBuf {
    PathBuf::from("selfie.png")
}

/// Longest countdown accepted from the config file.
pub const MAX_COUNTDOWN_SECONDS: u32 = 60;

/// Template written by `config init`.
pub const DEFAULT_CONFIG_TOML: &str = r#"# selfie-booth configuration

[camera]
# Backend: synthetic (test pattern) or native (webcam, needs the `native` feature)
backend = "synthetic"
# Camera device index (see `selfie-booth list-cameras`)
device = 0
# Requested capture resolution
width = 640
height = 480
# Preferred camera: user (front) or environment (rear)
facing = "user"
# Frame rate for the live preview
fps = 30
# Mirror the photo like the selfie preview
mirror = true

[countdown]
# Seconds counted before the photo is taken (0 = immediately)
seconds = 3
# Milliseconds per countdown step
tick_ms = 1000

[output]
# Where accepted photos are written
path = "selfie.png"
"#;

impl Config {
    /// Load configuration from a file path.
    /// Returns default config if the file doesn't exist.
    /// Returns an error if the file exists but cannot be parsed.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = path.map(PathBuf::from).unwrap_or_else(default_path);

        if path.exists() {
            Self::load_from_explicit(&path)
        } else {
            log::debug!("No config at {}, using defaults", path.display());
            Ok(Config::default())
        }
    }

    /// Load from a path the user named explicitly; the file must exist.
    pub fn load_from_explicit(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound {
                path: path.to_path_buf(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })?;
        config.validate()?;
        log::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Reject values that would make a session unusable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.camera.width == 0 || self.camera.height == 0 {
            return Err(ConfigError::Invalid(
                "camera width and height must be greater than 0".to_string(),
            ));
        }
        if !(1..=120).contains(&self.camera.fps) {
            return Err(ConfigError::Invalid(format!(
                "camera fps must be between 1 and 120, got {}",
                self.camera.fps
            )));
        }
        if self.countdown.seconds > MAX_COUNTDOWN_SECONDS {
            return Err(ConfigError::Invalid(format!(
                "countdown seconds must be at most {}, got {}",
                MAX_COUNTDOWN_SECONDS, self.countdown.seconds
            )));
        }
        if self.countdown.tick_ms == 0 {
            return Err(ConfigError::Invalid(
                "countdown tick_ms must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Capability request built from the `[camera]` section. Audio is never requested.
    pub fn constraints(&self) -> MediaConstraints {
        MediaConstraints {
            width: self.camera.width,
            height: self.camera.height,
            facing: self.camera.facing,
            audio: false,
        }
    }

    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            constraints: self.constraints(),
            countdown_from: self.countdown.seconds,
            tick: Duration::from_millis(self.countdown.tick_ms),
        }
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Config file '{}' not found", path.display())]
    NotFound { path: PathBuf },
    #[error("Failed to read config file '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse config file '{}': {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Get the default config file path.
pub fn default_path() -> PathBuf {
    dirs::config_dir()
        .map(|d| d.join("selfie-booth").join("config.toml"))
        .unwrap_or_else(|| {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
            PathBuf::from(home).join(".config/selfie-booth/config.toml")
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_missing_default_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(Some(&dir.path().join("nope.toml"))).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_explicit_path_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load_from_explicit(&dir.path().join("nope.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound { .. }));
        assert!(err.to_string().contains("nope.toml"));
    }

    #[test]
    fn test_defaults_match_capture_request() {
        let config = Config::default();
        let constraints = config.constraints();
        assert_eq!((constraints.width, constraints.height), (640, 480));
        assert_eq!(constraints.facing, FacingMode::User);
        assert!(!constraints.audio);

        let settings = config.session_settings();
        assert_eq!(settings.countdown_from, 3);
        assert_eq!(settings.tick, Duration::from_secs(1));
        assert!(config.camera.mirror);
    }

    #[test]
    fn test_template_parses_to_defaults() {
        let file = write_config(DEFAULT_CONFIG_TOML);
        let config = Config::load(Some(file.path())).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let file = write_config(
            r#"
[camera]
facing = "environment"
mirror = false

[countdown]
seconds = 5
"#,
        );
        let config = Config::load(Some(file.path())).unwrap();
        assert_eq!(config.camera.facing, FacingMode::Environment);
        assert!(!config.camera.mirror);
        assert_eq!(config.camera.width, 640);
        assert_eq!(config.countdown.seconds, 5);
        assert_eq!(config.countdown.tick_ms, 1000);
    }

    #[test]
    fn test_parse_error_names_file() {
        let file = write_config("[camera\nwidth = ");
        let err = Config::load(Some(file.path())).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains("Failed to parse config file"));
    }

    #[test]
    fn test_rejects_zero_tick() {
        let file = write_config("[countdown]\ntick_ms = 0\n");
        let err = Config::load(Some(file.path())).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_rejects_zero_width() {
        let file = write_config("[camera]\nwidth = 0\n");
        assert!(Config::load(Some(file.path())).is_err());
    }

    #[test]
    fn test_default_path_ends_with_config_toml() {
        let path = default_path();
        assert!(path.ends_with("selfie-booth/config.toml"));
    }
}
