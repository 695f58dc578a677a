//! End-to-end capture against the synthetic camera: real capture thread,
//! real timer, real PNG.

use std::time::Duration;

use selfie_booth::camera::{CameraError, MediaConstraints, SyntheticCamera};
use selfie_booth::compose::PngCompositor;
use selfie_booth::session::{CaptureSession, SessionPhase, SessionSettings};
use selfie_booth::testing::RecordingHost;

fn fast_settings() -> SessionSettings {
    SessionSettings {
        constraints: MediaConstraints {
            width: 64,
            height: 48,
            ..Default::default()
        },
        countdown_from: 2,
        tick: Duration::from_millis(20),
    }
}

#[tokio::test]
async fn countdown_capture_produces_mirrored_png() {
    let mut session = CaptureSession::new(
        SyntheticCamera::default(),
        PngCompositor::new(true),
        RecordingHost::default(),
        fast_settings(),
    );

    session.open();
    tokio::time::timeout(Duration::from_secs(5), session.settle())
        .await
        .expect("camera should start");
    assert_eq!(session.phase(), SessionPhase::Previewing);

    assert!(session.start_countdown());
    tokio::time::timeout(Duration::from_secs(5), session.settle())
        .await
        .expect("countdown should finish");
    assert_eq!(session.phase(), SessionPhase::Frozen);

    assert!(session.accept());
    let host = session.host();
    assert_eq!(host.countdown, vec![Some(2), Some(1), None]);
    assert_eq!(host.captures.len(), 1);

    let photo = &host.captures[0];
    assert_eq!((photo.width(), photo.height()), (64, 48));
    let decoded = image::load_from_memory_with_format(photo.png_bytes(), image::ImageFormat::Png)
        .unwrap()
        .to_rgb8();
    // The test pattern is brightest red on the right; mirrored it is on the left
    assert_eq!(decoded.get_pixel(0, 0)[0], 255);
    assert_eq!(decoded.get_pixel(63, 0)[0], 0);
}

#[tokio::test]
async fn unknown_device_index_is_reported_and_closable() {
    let mut session = CaptureSession::new(
        SyntheticCamera::new(3, 30),
        PngCompositor::default(),
        RecordingHost::default(),
        fast_settings(),
    );

    session.open();
    session.settle().await;
    assert_eq!(session.phase(), SessionPhase::Unavailable);
    assert_eq!(
        session.host().device_errors,
        vec![CameraError::DeviceNotFound(3)]
    );

    session.close();
    assert_eq!(session.phase(), SessionPhase::Closed);
    assert!(!session.host().modal_open());
}
