//! Interactive capture: opens a session, runs the countdown and saves the
//! accepted photo.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::sync::Notify;

use selfie_booth::camera::{CameraError, MediaDevices, SyntheticCamera};
use selfie_booth::compose::{CapturedImage, CompositeError, PngCompositor};
use selfie_booth::config::{Backend, Config};
use selfie_booth::session::{CaptureSession, SessionHost, SessionPhase, SessionSettings};

use super::args::CaptureArgs;
use super::CliError;

/// Countdown attempts in a row that may end without a photo before giving up.
const MAX_FAILED_CAPTURES: u32 = 3;

/// How an interactive capture ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureOutcome {
    Saved(PathBuf),
    Cancelled,
}

/// Everything the driver needs once config and flags are merged.
#[derive(Debug, Clone)]
struct CapturePlan {
    backend: Backend,
    device: u32,
    fps: u32,
    mirror: bool,
    output: PathBuf,
    settings: SessionSettings,
    auto_accept: bool,
}

impl CapturePlan {
    fn new(config: &Config, args: &CaptureArgs) -> Self {
        let mut settings = config.session_settings();
        if let Some(resolution) = args.resolution {
            settings.constraints.width = resolution.width;
            settings.constraints.height = resolution.height;
        }
        if args.no_countdown {
            settings.countdown_from = 0;
        } else if let Some(seconds) = args.countdown {
            settings.countdown_from = seconds;
        }

        Self {
            backend: args.backend.unwrap_or(config.camera.backend),
            device: args.camera.unwrap_or(config.camera.device),
            fps: config.camera.fps,
            mirror: config.camera.mirror && !args.no_mirror,
            output: args
                .output
                .clone()
                .unwrap_or_else(|| config.output.path.clone()),
            settings,
            auto_accept: args.yes,
        }
    }
}

/// Run one capture session against the configured backend.
pub async fn run_capture(config: &Config, args: &CaptureArgs) -> Result<CaptureOutcome, CliError> {
    let plan = CapturePlan::new(config, args);
    log::info!(
        "Capture with {:?} backend, device {}, {}x{}",
        plan.backend,
        plan.device,
        plan.settings.constraints.width,
        plan.settings.constraints.height
    );

    match plan.backend {
        Backend::Synthetic => drive(SyntheticCamera::new(plan.device, plan.fps), &plan).await,
        #[cfg(feature = "native")]
        Backend::Native => {
            drive(
                selfie_booth::camera::NativeCamera::new(plan.device, plan.fps),
                &plan,
            )
            .await
        }
        #[cfg(not(feature = "native"))]
        Backend::Native => Err(CliError::NativeUnavailable),
    }
}

/// Terminal presenter: prints progress to stderr and writes the accepted photo.
struct ConsoleHost {
    output: PathBuf,
    saved: Option<PathBuf>,
    save_error: Option<std::io::Error>,
    capture_error: Option<CompositeError>,
}

impl ConsoleHost {
    fn new(output: &Path) -> Self {
        Self {
            output: output.to_path_buf(),
            saved: None,
            save_error: None,
            capture_error: None,
        }
    }
}

impl SessionHost for ConsoleHost {
    fn set_modal_open(&mut self, open: bool) {
        if open {
            eprintln!("Starting camera...");
        }
    }

    fn on_capture(&mut self, image: &CapturedImage) {
        match image.save(&self.output) {
            Ok(()) => self.saved = Some(self.output.clone()),
            Err(e) => self.save_error = Some(e),
        }
    }

    fn on_countdown(&mut self, remaining: Option<u32>) {
        if let Some(n) = remaining {
            eprintln!("  {}...", n);
        }
    }

    fn on_device_error(&mut self, error: &CameraError) {
        eprintln!("Camera unavailable: {}", error);
        if error.is_permission_denied() {
            eprintln!("Grant camera access to this terminal and try again.");
        }
    }

    fn on_capture_failed(&mut self, error: &CompositeError) {
        eprintln!("Could not take a photo: {}", error);
        self.capture_error = Some(error.clone());
    }

    fn on_phase(&mut self, phase: SessionPhase) {
        match phase {
            SessionPhase::Previewing => eprintln!("Camera ready."),
            SessionPhase::Frozen => eprintln!("Photo taken."),
            _ => {}
        }
    }
}

/// Wait for a line on stdin. `None` on Ctrl-C or end of input.
async fn prompt(
    lines: &mut Lines<BufReader<Stdin>>,
    interrupt: &Notify,
    question: &str,
) -> Result<Option<String>, CliError> {
    eprint!("{} ", question);
    tokio::select! {
        _ = interrupt.notified() => Ok(None),
        line = lines.next_line() => Ok(line?.map(|l| l.trim().to_lowercase())),
    }
}

async fn drive<D: MediaDevices>(devices: D, plan: &CapturePlan) -> Result<CaptureOutcome, CliError> {
    let interrupt = Arc::new(Notify::new());
    let handler_interrupt = Arc::clone(&interrupt);
    ctrlc::set_handler(move || handler_interrupt.notify_one())?;

    let mut host = ConsoleHost::new(&plan.output);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut failed_captures = 0;

    {
        let mut session = CaptureSession::new(
            devices,
            PngCompositor::new(plan.mirror),
            &mut host,
            plan.settings,
        );
        session.open();

        loop {
            if session.has_pending_work() {
                let interrupted = tokio::select! {
                    _ = interrupt.notified() => true,
                    _ = session.step() => false,
                };
                if interrupted {
                    eprintln!();
                    session.close();
                }
                continue;
            }

            match session.phase() {
                SessionPhase::Closed => break,
                SessionPhase::Unavailable => {
                    let answer = if plan.auto_accept {
                        None
                    } else {
                        prompt(&mut lines, &interrupt, "[r]etry or [q]uit?").await?
                    };
                    match answer.as_deref() {
                        Some("r") | Some("retry") => {
                            session.retry();
                        }
                        _ => session.close(),
                    }
                }
                SessionPhase::Previewing => {
                    if failed_captures >= MAX_FAILED_CAPTURES {
                        let error = session
                            .host()
                            .capture_error
                            .clone()
                            .unwrap_or(CompositeError::NoFrame);
                        session.close();
                        return Err(CliError::Composite(error));
                    }
                    if !plan.auto_accept {
                        let answer = prompt(
                            &mut lines,
                            &interrupt,
                            "Press Enter to take a photo, or q to quit:",
                        )
                        .await?;
                        if !matches!(answer.as_deref(), Some("")) {
                            session.close();
                            continue;
                        }
                    }
                    // Reset once a photo freezes; a failed capture lands back here
                    failed_captures += 1;
                    session.start_countdown();
                }
                SessionPhase::Frozen => {
                    failed_captures = 0;
                    let answer = if plan.auto_accept {
                        Some("a".to_string())
                    } else {
                        prompt(&mut lines, &interrupt, "[a]ccept, [r]etake or [q]uit?").await?
                    };
                    match answer.as_deref() {
                        Some("a") | Some("accept") | Some("") => {
                            session.accept();
                        }
                        Some("r") | Some("retake") => {
                            session.retake();
                        }
                        _ => session.close(),
                    }
                }
                SessionPhase::Acquiring | SessionPhase::CountingDown(_) => {
                    session.process_ready();
                }
            }
        }
    }

    if let Some(source) = host.save_error {
        return Err(CliError::Write {
            path: host.output,
            source,
        });
    }
    Ok(host
        .saved
        .map(CaptureOutcome::Saved)
        .unwrap_or(CaptureOutcome::Cancelled))
}

#[cfg(test)]
mod tests {
    use super::*;
    use selfie_booth::camera::Resolution;
    use std::time::Duration;

    #[test]
    fn test_plan_uses_config_defaults() {
        let plan = CapturePlan::new(&Config::default(), &CaptureArgs::default());
        assert_eq!(plan.backend, Backend::Synthetic);
        assert_eq!(plan.device, 0);
        assert!(plan.mirror);
        assert_eq!(plan.output, PathBuf::from("selfie.png"));
        assert_eq!(plan.settings.countdown_from, 3);
        assert_eq!(plan.settings.tick, Duration::from_secs(1));
        assert!(!plan.auto_accept);
    }

    #[test]
    fn test_plan_flags_override_config() {
        let args = CaptureArgs {
            camera: Some(2),
            resolution: Some(Resolution::HIGH),
            countdown: Some(5),
            no_mirror: true,
            output: Some(PathBuf::from("me.png")),
            yes: true,
            ..Default::default()
        };
        let plan = CapturePlan::new(&Config::default(), &args);
        assert_eq!(plan.device, 2);
        assert_eq!(plan.settings.constraints.width, 1280);
        assert_eq!(plan.settings.constraints.height, 720);
        assert_eq!(plan.settings.countdown_from, 5);
        assert!(!plan.mirror);
        assert_eq!(plan.output, PathBuf::from("me.png"));
        assert!(plan.auto_accept);
    }

    #[test]
    fn test_no_countdown_captures_immediately() {
        let args = CaptureArgs {
            no_countdown: true,
            ..Default::default()
        };
        let plan = CapturePlan::new(&Config::default(), &args);
        assert_eq!(plan.settings.countdown_from, 0);
    }

    #[test]
    fn test_console_host_saves_accepted_photo() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("photo.png");
        let mut host = ConsoleHost::new(&path);
        host.on_capture(&CapturedImage::from_png(vec![0x89, b'P', b'N', b'G'], 1, 1));
        assert_eq!(host.saved.as_deref(), Some(path.as_path()));
        assert!(host.save_error.is_none());
        assert_eq!(std::fs::read(&path).unwrap(), vec![0x89, b'P', b'N', b'G']);
    }

    #[test]
    fn test_console_host_keeps_last_capture_error() {
        let mut host = ConsoleHost::new(Path::new("unused.png"));
        host.on_capture_failed(&CompositeError::NoFrame);
        host.on_capture_failed(&CompositeError::Encode("disk full".to_string()));
        assert_eq!(
            host.capture_error,
            Some(CompositeError::Encode("disk full".to_string()))
        );
    }

    #[test]
    fn test_console_host_records_save_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("photo.png");
        let mut host = ConsoleHost::new(&path);
        host.on_capture(&CapturedImage::from_png(vec![1, 2, 3], 1, 1));
        assert!(host.saved.is_none());
        assert!(host.save_error.is_some());
    }
}
