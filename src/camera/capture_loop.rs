//! Background capture thread implementation.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use super::types::{CameraError, Frame, Resolution};

/// A device that yields frames on the capture thread.
///
/// Sources are opened inside the capture thread, so they do not need to be `Send`.
pub trait FrameSource {
    /// Negotiated resolution.
    fn resolution(&self) -> Resolution;

    /// Negotiated frame rate.
    fn fps(&self) -> u32;

    /// Block until the next frame is available. `None` skips this iteration.
    fn next_frame(&mut self) -> Option<Frame>;

    /// Stop the underlying device stream.
    fn close(&mut self) {}
}

/// Opens a [`FrameSource`] on the capture thread.
pub type SourceOpener = Box<dyn FnOnce() -> Result<Box<dyn FrameSource>, CameraError> + Send>;

/// Commands sent to the capture thread.
pub enum CaptureCommand {
    Stop,
}

/// Run the capture loop in a background thread.
///
/// Reports the negotiated `(resolution, fps)` (or the open error) on `info_tx`
/// before the first frame, then publishes the latest frame into `buffer` until
/// stopped.
pub fn run_capture_loop(
    open: SourceOpener,
    buffer: Arc<Mutex<Option<Frame>>>,
    stop: Arc<AtomicBool>,
    rx: Receiver<CaptureCommand>,
    info_tx: Sender<Result<(Resolution, u32), CameraError>>,
) {
    let mut source = match open() {
        Ok(source) => source,
        Err(e) => {
            let _ = info_tx.send(Err(e));
            return;
        }
    };

    let _ = info_tx.send(Ok((source.resolution(), source.fps())));

    while !stop.load(Ordering::Relaxed) {
        if let Ok(CaptureCommand::Stop) = rx.try_recv() {
            break;
        }

        // Frames that fail to decode are skipped
        if let Some(frame) = source.next_frame() {
            if let Ok(mut buf) = buffer.lock() {
                *buf = Some(frame);
            }
        }

        thread::sleep(Duration::from_millis(1));
    }

    source.close();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    struct OneColor {
        frames: usize,
        closed: Arc<AtomicBool>,
    }

    impl FrameSource for OneColor {
        fn resolution(&self) -> Resolution {
            Resolution::new(2, 1)
        }

        fn fps(&self) -> u32 {
            30
        }

        fn next_frame(&mut self) -> Option<Frame> {
            self.frames += 1;
            Some(Frame::rgb(vec![9; 6], 2, 1))
        }

        fn close(&mut self) {
            self.closed.store(true, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_open_error_is_reported() {
        let (_tx, rx) = mpsc::channel();
        let (info_tx, info_rx) = mpsc::channel();
        run_capture_loop(
            Box::new(|| Err(CameraError::PermissionDenied)),
            Arc::new(Mutex::new(None)),
            Arc::new(AtomicBool::new(false)),
            rx,
            info_tx,
        );
        assert_eq!(info_rx.recv().unwrap(), Err(CameraError::PermissionDenied));
    }

    #[test]
    fn test_loop_publishes_frames_and_closes_source() {
        let closed = Arc::new(AtomicBool::new(false));
        let buffer = Arc::new(Mutex::new(None));
        let stop = Arc::new(AtomicBool::new(false));
        let (tx, rx) = mpsc::channel();
        let (info_tx, info_rx) = mpsc::channel();

        let closed_flag = closed.clone();
        let thread_buffer = buffer.clone();
        let thread_stop = stop.clone();
        let handle = thread::spawn(move || {
            run_capture_loop(
                Box::new(move || {
                    Ok(Box::new(OneColor {
                        frames: 0,
                        closed: closed_flag,
                    }) as Box<dyn FrameSource>)
                }),
                thread_buffer,
                thread_stop,
                rx,
                info_tx,
            )
        });

        let (res, fps) = info_rx.recv().unwrap().unwrap();
        assert_eq!(res, Resolution::new(2, 1));
        assert_eq!(fps, 30);

        while buffer.lock().unwrap().is_none() {
            thread::sleep(Duration::from_millis(1));
        }

        tx.send(CaptureCommand::Stop).unwrap();
        handle.join().unwrap();
        assert!(closed.load(Ordering::SeqCst));
    }
}
