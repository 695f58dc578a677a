//! Capture session controller.
//!
//! Drives one modal-scoped photo capture:
//! `Closed -> Acquiring -> Previewing -> (CountingDown) -> Frozen -> (retake | accept -> Closed)`.
//!
//! All transitions run on the caller's task. Camera acquisition and countdown
//! ticks run on background tokio tasks and come back as events through
//! [`CaptureSession::step`]. Every event carries the token of the work that
//! produced it; events whose token no longer matches the live state are
//! stale, and a stale camera stream is released instead of bound.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use super::countdown::CountdownTimer;
use super::host::SessionHost;
use super::state::{SessionPhase, SessionState};
use crate::camera::{CameraError, DeviceHandle, MediaConstraints, MediaDevices, MediaStream};
use crate::compose::{canvas_for, CapturedImage, CompositeError, Compositor};

/// No acquisition in flight.
const NO_TOKEN: u64 = 0;

/// Tunables for a capture session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSettings {
    /// Capability request sent on every acquisition
    pub constraints: MediaConstraints,
    /// First countdown value; 0 captures immediately
    pub countdown_from: u32,
    /// Time between countdown ticks; zero also captures immediately
    pub tick: Duration,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            constraints: MediaConstraints::default(),
            countdown_from: 3,
            tick: Duration::from_secs(1),
        }
    }
}

enum SessionEvent<S: MediaStream> {
    Acquired {
        token: u64,
        result: Result<DeviceHandle<S>, CameraError>,
    },
    Tick {
        token: u64,
    },
}

/// One capture interaction, from modal open to close.
///
/// Methods that start background work (`open`, `retry`, `retake`,
/// `start_countdown`) must be called inside a tokio runtime. Dropping the
/// session releases the camera and cancels the countdown.
pub struct CaptureSession<D, C, H>
where
    D: MediaDevices,
    C: Compositor,
    H: SessionHost,
{
    devices: D,
    compositor: C,
    host: H,
    settings: SessionSettings,
    state: SessionState<D::Stream>,
    phase: SessionPhase,
    next_token: u64,
    /// Token of the acquisition the session is waiting for, shared with the
    /// acquisition task so late streams can be released without a round trip
    live_acquisition: Arc<AtomicU64>,
    events_tx: UnboundedSender<SessionEvent<D::Stream>>,
    events_rx: UnboundedReceiver<SessionEvent<D::Stream>>,
}

impl<D, C, H> CaptureSession<D, C, H>
where
    D: MediaDevices,
    C: Compositor,
    H: SessionHost,
{
    pub fn new(devices: D, compositor: C, host: H, settings: SessionSettings) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            devices,
            compositor,
            host,
            settings,
            state: SessionState::Closed,
            phase: SessionPhase::Closed,
            next_token: NO_TOKEN,
            live_acquisition: Arc::new(AtomicU64::new(NO_TOKEN)),
            events_tx,
            events_rx,
        }
    }

    // ==================== Observation ====================

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn is_open(&self) -> bool {
        self.phase.is_open()
    }

    /// Whether a camera stream is currently bound to the preview.
    pub fn device_active(&self) -> bool {
        matches!(
            self.state,
            SessionState::Previewing { .. } | SessionState::CountingDown { .. }
        )
    }

    pub fn countdown_remaining(&self) -> Option<u32> {
        match self.state {
            SessionState::CountingDown { remaining, .. } => Some(remaining),
            _ => None,
        }
    }

    /// The frozen photo, if one has been taken and not yet accepted or discarded.
    pub fn captured(&self) -> Option<&CapturedImage> {
        match &self.state {
            SessionState::Frozen { image } => Some(image),
            _ => None,
        }
    }

    /// Why the camera is unavailable, while the session is in that phase.
    pub fn device_error(&self) -> Option<&CameraError> {
        match &self.state {
            SessionState::Unavailable { error } => Some(error),
            _ => None,
        }
    }

    /// True while an acquisition or countdown will deliver another event.
    pub fn has_pending_work(&self) -> bool {
        matches!(
            self.state,
            SessionState::Acquiring { .. } | SessionState::CountingDown { .. }
        )
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    // ==================== User actions ====================

    /// Open the modal and request the camera.
    ///
    /// From `Unavailable` this retries acquisition. Ignored in other phases.
    pub fn open(&mut self) {
        match self.state {
            SessionState::Closed => {
                log::info!("Opening capture session");
                self.host.set_modal_open(true);
                self.begin_acquisition();
            }
            SessionState::Unavailable { .. } => {
                self.begin_acquisition();
            }
            _ => log::debug!("open() ignored while {}", self.phase),
        }
    }

    /// Retry camera acquisition after a failure. Returns `false` outside `Unavailable`.
    pub fn retry(&mut self) -> bool {
        if !matches!(self.state, SessionState::Unavailable { .. }) {
            log::debug!("retry() ignored while {}", self.phase);
            return false;
        }
        log::info!("Retrying camera acquisition");
        self.begin_acquisition();
        true
    }

    /// Start the capture countdown. Only valid while previewing; repeated
    /// calls during a running countdown are ignored.
    pub fn start_countdown(&mut self) -> bool {
        let device = match self.take_state() {
            SessionState::Previewing { device } => device,
            other => {
                self.state = other;
                log::debug!("start_countdown() ignored while {}", self.phase);
                return false;
            }
        };

        let from = self.settings.countdown_from;
        if from == 0 || self.settings.tick.is_zero() {
            self.state = SessionState::Previewing { device };
            return self.capture_from_preview().unwrap_or(false);
        }

        let token = self.issue_token();
        let timer = CountdownTimer::start(
            token,
            self.settings.tick,
            self.events_tx.clone(),
            |token| SessionEvent::Tick { token },
        );
        log::debug!("Countdown started from {}", from);
        self.host.on_countdown(Some(from));
        self.set_state(SessionState::CountingDown {
            device,
            remaining: from,
            timer,
        });
        true
    }

    /// Freeze the current preview frame into a photo and release the camera.
    ///
    /// Returns `Ok(false)` when not previewing. A compositing failure leaves
    /// the session previewing.
    pub fn capture(&mut self) -> Result<bool, CompositeError> {
        if !matches!(self.state, SessionState::Previewing { .. }) {
            log::debug!("capture() ignored while {}", self.phase);
            return Ok(false);
        }
        self.capture_from_preview()
    }

    /// Discard the frozen photo and reacquire the camera.
    pub fn retake(&mut self) -> bool {
        if !matches!(self.state, SessionState::Frozen { .. }) {
            log::debug!("retake() ignored while {}", self.phase);
            return false;
        }
        log::info!("Retaking photo");
        self.begin_acquisition();
        true
    }

    /// Hand the frozen photo to the host, then close.
    pub fn accept(&mut self) -> bool {
        match &self.state {
            SessionState::Frozen { image } => {
                log::info!("Photo accepted ({}x{})", image.width(), image.height());
                self.host.on_capture(image);
            }
            _ => {
                log::debug!("accept() ignored while {}", self.phase);
                return false;
            }
        }
        self.close();
        true
    }

    /// Close the modal, releasing the camera and clearing countdown and photo.
    /// Safe to call any number of times.
    pub fn close(&mut self) {
        let previous = self.take_state();
        match previous {
            SessionState::Closed => return,
            SessionState::Previewing { device } => device.release(),
            SessionState::CountingDown { device, timer, .. } => {
                timer.cancel();
                device.release();
                self.host.on_countdown(None);
            }
            SessionState::Acquiring { .. } => {
                log::debug!("Closing with acquisition in flight, late stream will be released");
            }
            SessionState::Unavailable { .. } | SessionState::Frozen { .. } => {}
        }

        self.set_state(SessionState::Closed);
        self.host.set_modal_open(false);
        // A stream that resolved before the close may still be queued
        self.process_ready();
        log::info!("Capture session closed");
    }

    // ==================== Event loop ====================

    /// Wait for the next background event and apply it.
    ///
    /// Never returns if nothing is pending; check [`has_pending_work`](Self::has_pending_work)
    /// or race it against other input.
    pub async fn step(&mut self) {
        if let Some(event) = self.events_rx.recv().await {
            self.handle_event(event);
        }
    }

    /// Step until no acquisition or countdown is outstanding.
    pub async fn settle(&mut self) {
        while self.has_pending_work() {
            self.step().await;
        }
    }

    /// Apply every event that is already queued without waiting. Returns the count.
    pub fn process_ready(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(event) = self.events_rx.try_recv() {
            self.handle_event(event);
            handled += 1;
        }
        handled
    }

    fn handle_event(&mut self, event: SessionEvent<D::Stream>) {
        match event {
            SessionEvent::Acquired { token, result } => self.on_acquired(token, result),
            SessionEvent::Tick { token } => self.on_tick(token),
        }
    }

    fn on_acquired(&mut self, token: u64, result: Result<DeviceHandle<D::Stream>, CameraError>) {
        let live = matches!(self.state, SessionState::Acquiring { token: t } if t == token);
        if !live {
            if let Ok(device) = result {
                log::warn!("Camera stream arrived after the session moved on, releasing it");
                device.release();
            }
            return;
        }

        match result {
            Ok(device) => {
                log::info!("Camera ready, previewing");
                self.set_state(SessionState::Previewing { device });
            }
            Err(error) => {
                log::warn!("Camera unavailable: {}", error);
                self.host.on_device_error(&error);
                self.set_state(SessionState::Unavailable { error });
            }
        }
    }

    fn on_tick(&mut self, token: u64) {
        match self.take_state() {
            SessionState::CountingDown {
                device,
                remaining,
                timer,
            } if timer.token() == token => {
                let remaining = remaining.saturating_sub(1);
                if remaining > 0 {
                    self.host.on_countdown(Some(remaining));
                    self.set_state(SessionState::CountingDown {
                        device,
                        remaining,
                        timer,
                    });
                    return;
                }

                timer.cancel();
                self.host.on_countdown(None);
                self.set_state(SessionState::Previewing { device });
                if let Err(e) = self.capture_from_preview() {
                    log::warn!("Countdown capture failed: {}", e);
                }
            }
            other => {
                self.state = other;
                log::trace!("Dropping stale countdown tick");
            }
        }
    }

    // ==================== Transitions ====================

    fn begin_acquisition(&mut self) {
        let token = self.issue_token();
        // Publish the token before the task can observe it
        self.set_state(SessionState::Acquiring { token });

        let acquire = self.devices.acquire(self.settings.constraints);
        let tx = self.events_tx.clone();
        let live = Arc::clone(&self.live_acquisition);

        tokio::spawn(async move {
            let result = acquire.await.map(DeviceHandle::new);
            if let Ok(device) = result.as_ref() {
                log::debug!("Camera acquired: {:?}", device);
            }
            if live.load(Ordering::SeqCst) != token {
                // The session closed or restarted; the handle releases on drop
                if result.is_ok() {
                    log::warn!("Camera acquired after the session moved on, releasing it");
                }
                return;
            }
            // If the session is gone the event (and the handle in it) is dropped here
            let _ = tx.send(SessionEvent::Acquired { token, result });
        });
    }

    /// Composite and freeze from `Previewing`; any other state is put back untouched.
    fn capture_from_preview(&mut self) -> Result<bool, CompositeError> {
        let device = match self.take_state() {
            SessionState::Previewing { device } => device,
            other => {
                self.state = other;
                return Ok(false);
            }
        };

        let composed = device
            .latest_frame()
            .ok_or(CompositeError::NoFrame)
            .and_then(|frame| {
                self.compositor
                    .composite(&frame, canvas_for(device.resolution()))
            });

        match composed {
            Ok(image) => {
                device.release();
                log::info!(
                    "Captured {}x{} photo ({} bytes)",
                    image.width(),
                    image.height(),
                    image.png_bytes().len()
                );
                self.set_state(SessionState::Frozen { image });
                Ok(true)
            }
            Err(e) => {
                log::warn!("Capture aborted, still previewing: {}", e);
                self.set_state(SessionState::Previewing { device });
                self.host.on_capture_failed(&e);
                Err(e)
            }
        }
    }

    fn issue_token(&mut self) -> u64 {
        self.next_token += 1;
        self.next_token
    }

    /// Move the state out, leaving `Closed` as a placeholder. Callers must put
    /// a real state back with `set_state` or a direct assignment.
    fn take_state(&mut self) -> SessionState<D::Stream> {
        std::mem::replace(&mut self.state, SessionState::Closed)
    }

    fn set_state(&mut self, state: SessionState<D::Stream>) {
        let live = match state {
            SessionState::Acquiring { token } => token,
            _ => NO_TOKEN,
        };
        self.live_acquisition.store(live, Ordering::SeqCst);
        self.state = state;

        let phase = self.state.phase();
        if phase != self.phase {
            log::debug!("Session {} -> {}", self.phase, phase);
            self.phase = phase;
            self.host.on_phase(phase);
        }
    }
}

impl<D, C, H> std::fmt::Debug for CaptureSession<D, C, H>
where
    D: MediaDevices,
    C: Compositor,
    H: SessionHost,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptureSession")
            .field("phase", &self.phase)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}
