// THEORY:
// The `runner` module is the explicit frame loop around a `DetectionSession`. The
// loop never touches a device directly; it is handed three collaborators:
//
// - a `FrameSource` that yields frames until the stream ends,
// - a `CommandSource` polled once per displayed frame,
// - a `DisplaySink` that receives the four diagnostic images.
//
// One frame is read, processed and shown before the next is requested. There are no
// worker threads and no queues. A failed read ends the loop normally, `Quit` ends it
// at the next poll, and a processing error (a frame whose size no longer matches the
// background) aborts it. In every case the source and sink are released before
// returning.

use crate::core_modules::session::{Command, Control, DetectionSession, FrameOutcome};
use crate::core_modules::utils::image_helper::image_helper::{save_frame, save_mask, slug};
use crate::error::Result;
use image::{GrayImage, RgbImage};
use log::{info, warn};
use std::path::PathBuf;

pub const WINDOW_MOTION: &str = "A - Motion Mask";
pub const WINDOW_COLOR: &str = "B - Color Mask";
pub const WINDOW_FINAL: &str = "C - Final Mask";
pub const WINDOW_RESULT: &str = "Result";

/// Supplies frames until the stream ends.
pub trait FrameSource {
    /// The next frame, or `None` once the stream has ended or the device failed.
    fn read_frame(&mut self) -> Option<RgbImage>;

    /// Releases the underlying device.
    fn release(&mut self) {}
}

/// Supplies one command per loop iteration.
pub trait CommandSource {
    fn poll(&mut self) -> Command;
}

/// Receives the diagnostic images of each processed frame.
pub trait DisplaySink {
    fn show_mask(&mut self, name: &str, mask: &GrayImage);

    fn show_frame(&mut self, name: &str, frame: &RgbImage);

    /// Called once all images of a frame have been shown.
    fn end_frame(&mut self) {}

    /// Closes every display surface.
    fn close(&mut self) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The source could not deliver another frame.
    CaptureFailure,
    /// The user asked to quit.
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// Frames delivered by the source, the background frame included.
    pub frames_read: u64,
    /// Frames that went through detection and were displayed.
    pub frames_processed: u64,
    pub stop_reason: StopReason,
}

/// Logs the active color and the key bindings.
pub fn log_banner(session: &DetectionSession) {
    info!("Moving object detection");
    info!(
        "Active color: {}",
        session.active_color().as_str().to_uppercase()
    );
    info!("Commands: ESC quit | r red | v (or g) green | b blue");
}

/// Drives `session` until the stream ends, the user quits, or processing fails.
pub fn run<S, C, D>(
    session: &mut DetectionSession,
    source: &mut S,
    commands: &mut C,
    sink: &mut D,
) -> Result<RunSummary>
where
    S: FrameSource + ?Sized,
    C: CommandSource + ?Sized,
    D: DisplaySink + ?Sized,
{
    let outcome = drive(session, source, commands, sink);
    source.release();
    sink.close();

    let summary = outcome?;
    info!(
        "Finished after {} frames ({} processed)",
        summary.frames_read, summary.frames_processed
    );
    Ok(summary)
}

fn drive<S, C, D>(
    session: &mut DetectionSession,
    source: &mut S,
    commands: &mut C,
    sink: &mut D,
) -> Result<RunSummary>
where
    S: FrameSource + ?Sized,
    C: CommandSource + ?Sized,
    D: DisplaySink + ?Sized,
{
    let mut frames_read = 0u64;
    let mut frames_processed = 0u64;

    let stop_reason = loop {
        let Some(frame) = source.read_frame() else {
            warn!("Unable to read frame, ending stream");
            break StopReason::CaptureFailure;
        };
        frames_read += 1;

        let detection = match session.process_frame(&frame)? {
            FrameOutcome::BackgroundCaptured => continue,
            FrameOutcome::Detection(detection) => detection,
        };
        frames_processed += 1;

        sink.show_mask(WINDOW_MOTION, &detection.motion_mask);
        sink.show_mask(WINDOW_COLOR, &detection.color_mask);
        sink.show_mask(WINDOW_FINAL, &detection.final_mask);
        sink.show_frame(WINDOW_RESULT, &detection.result);
        sink.end_frame();

        if session.handle_command(commands.poll()) == Control::Stop {
            break StopReason::Quit;
        }
    };

    Ok(RunSummary {
        frames_read,
        frames_processed,
        stop_reason,
    })
}

/// A `DisplaySink` that writes every image to `<dir>/<frame>_<window>.png`.
pub struct SnapshotSink {
    directory: PathBuf,
    frame_index: u64,
    written: usize,
}

impl SnapshotSink {
    pub fn new(directory: impl Into<PathBuf>) -> Result<Self> {
        let directory = directory.into();
        std::fs::create_dir_all(&directory)?;
        Ok(Self {
            directory,
            frame_index: 0,
            written: 0,
        })
    }

    /// Number of files written so far.
    pub fn written(&self) -> usize {
        self.written
    }

    fn path_for(&self, name: &str) -> PathBuf {
        self.directory
            .join(format!("{:04}_{}.png", self.frame_index, slug(name)))
    }
}

impl DisplaySink for SnapshotSink {
    fn show_mask(&mut self, name: &str, mask: &GrayImage) {
        let path = self.path_for(name);
        match save_mask(&path, mask) {
            Ok(()) => self.written += 1,
            Err(e) => warn!("Could not write {}: {e}", path.display()),
        }
    }

    fn show_frame(&mut self, name: &str, frame: &RgbImage) {
        let path = self.path_for(name);
        match save_frame(&path, frame) {
            Ok(()) => self.written += 1,
            Err(e) => warn!("Could not write {}: {e}", path.display()),
        }
    }

    fn end_frame(&mut self) {
        self.frame_index += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_modules::color_profile::ColorRegistry;
    use crate::pipeline::DetectionConfig;
    use image::Rgb;
    use std::collections::VecDeque;

    struct Frames(VecDeque<RgbImage>);

    impl FrameSource for Frames {
        fn read_frame(&mut self) -> Option<RgbImage> {
            self.0.pop_front()
        }
    }

    struct Idle;

    impl CommandSource for Idle {
        fn poll(&mut self) -> Command {
            Command::NoOp
        }
    }

    fn session() -> DetectionSession {
        DetectionSession::new(DetectionConfig::default(), ColorRegistry::default())
            .expect("default session")
    }

    #[test]
    fn snapshot_sink_writes_one_file_per_image() {
        let dir = tempfile::tempdir().expect("temp dir");
        let mut sink = SnapshotSink::new(dir.path().join("shots")).expect("dir created");
        let mut source = Frames(VecDeque::from(vec![
            RgbImage::from_pixel(12, 10, Rgb([10, 10, 10])),
            RgbImage::from_pixel(12, 10, Rgb([10, 10, 10])),
            RgbImage::from_pixel(12, 10, Rgb([10, 10, 10])),
        ]));

        let summary = run(&mut session(), &mut source, &mut Idle, &mut sink).expect("runs");
        assert_eq!(summary.frames_read, 3);
        assert_eq!(summary.frames_processed, 2);
        assert_eq!(summary.stop_reason, StopReason::CaptureFailure);
        assert_eq!(sink.written(), 8);
        assert!(dir.path().join("shots/0000_a_motion_mask.png").exists());
        assert!(dir.path().join("shots/0001_result.png").exists());
    }

    #[test]
    fn empty_stream_ends_immediately() {
        let dir = tempfile::tempdir().expect("temp dir");
        let mut sink = SnapshotSink::new(dir.path()).expect("dir exists");
        let mut source = Frames(VecDeque::new());
        let summary = run(&mut session(), &mut source, &mut Idle, &mut sink).expect("runs");
        assert_eq!(
            summary,
            RunSummary {
                frames_read: 0,
                frames_processed: 0,
                stop_reason: StopReason::CaptureFailure,
            }
        );
        assert_eq!(sink.written(), 0);
    }
}
