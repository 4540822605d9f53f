// THEORY:
// The `DetectionSession` owns the only mutable state of the detector: the captured
// background and the currently selected color. It is a two-state machine.
//
// - `Uninitialized`: no background yet. The next frame is blurred, converted to
//   grayscale and stored as the reference; no detection output is produced for it.
// - `Ready`: every frame runs the full pipeline against the stored reference.
//
// The transition happens exactly once and never reverses; a new session is the only
// way back. Color selection is orthogonal to that state. A command received while a
// frame is displayed changes the color used from the next processed frame on.
//
// Every selectable color must exist in the registry. That is checked when the session
// is built, so lookups during processing cannot fail on a correctly built session.

use crate::core_modules::background::BackgroundModel;
use crate::core_modules::color_profile::{ColorId, ColorRegistry};
use crate::core_modules::conversion::conversion::to_grayscale;
use crate::error::Result;
use crate::pipeline::{DetectionConfig, DetectionResult, detect, prepare_frame};
use image::RgbImage;
use log::{debug, info};

const KEY_ESCAPE: i32 = 27;

/// A decoded user command, polled once per loop iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Quit,
    Select(ColorId),
    NoOp,
}

impl Command {
    /// Decodes a key code. Only the low byte is significant; unknown keys are `NoOp`.
    pub fn from_key(code: i32) -> Self {
        match code & 0xFF {
            KEY_ESCAPE => Command::Quit,
            key => match key as u8 {
                b'r' => Command::Select(ColorId::Red),
                b'v' | b'g' => Command::Select(ColorId::Green),
                b'b' => Command::Select(ColorId::Blue),
                _ => Command::NoOp,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Uninitialized,
    Ready,
}

/// What processing a single frame produced.
#[derive(Debug, Clone)]
pub enum FrameOutcome {
    /// The frame became the background reference. Nothing to display.
    BackgroundCaptured,
    Detection(DetectionResult),
}

/// Whether the run loop should keep going after a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Continue,
    Stop,
}

pub struct DetectionSession {
    config: DetectionConfig,
    registry: ColorRegistry,
    background: BackgroundModel,
    active_color: ColorId,
    frames_processed: u64,
}

impl DetectionSession {
    pub fn new(config: DetectionConfig, registry: ColorRegistry) -> Result<Self> {
        config.validate()?;
        for color in ColorId::ALL {
            registry.profile(color)?;
        }
        let active_color = config.default_color;
        Ok(Self {
            config,
            registry,
            background: BackgroundModel::new(),
            active_color,
            frames_processed: 0,
        })
    }

    pub fn state(&self) -> SessionState {
        if self.background.is_initialized() {
            SessionState::Ready
        } else {
            SessionState::Uninitialized
        }
    }

    pub fn active_color(&self) -> ColorId {
        self.active_color
    }

    pub fn config(&self) -> &DetectionConfig {
        &self.config
    }

    pub fn background(&self) -> &BackgroundModel {
        &self.background
    }

    /// Frames that went through the full pipeline (the background frame excluded).
    pub fn frames_processed(&self) -> u64 {
        self.frames_processed
    }

    /// Runs one frame through the state machine.
    pub fn process_frame(&mut self, frame: &RgbImage) -> Result<FrameOutcome> {
        match self.state() {
            SessionState::Uninitialized => {
                let reference = to_grayscale(&prepare_frame(frame, &self.config));
                self.background.capture(reference)?;
                let (width, height) = frame.dimensions();
                info!("Background reference captured ({width}x{height})");
                Ok(FrameOutcome::BackgroundCaptured)
            }
            SessionState::Ready => {
                let profile = self.registry.profile(self.active_color)?;
                let reference = self.background.reference()?;
                let detection = detect(frame, reference, profile, &self.config)?;
                self.frames_processed += 1;
                debug!(
                    "Frame {}: {} pixels of {} in motion",
                    self.frames_processed,
                    detection.detected_pixels(),
                    self.active_color
                );
                Ok(FrameOutcome::Detection(detection))
            }
        }
    }

    /// Applies a command. Color changes take effect on the next processed frame.
    pub fn handle_command(&mut self, command: Command) -> Control {
        match command {
            Command::Quit => {
                info!("Stop requested");
                Control::Stop
            }
            Command::Select(color) => {
                if color != self.active_color {
                    self.active_color = color;
                    info!("Detecting: {}", color.as_str().to_uppercase());
                }
                Control::Continue
            }
            Command::NoOp => Control::Continue,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_modules::color_profile::{ColorProfile, HsvRange};
    use crate::error::DetectionError;
    use image::Rgb;

    fn session() -> DetectionSession {
        DetectionSession::new(DetectionConfig::default(), ColorRegistry::default())
            .expect("default session")
    }

    #[test]
    fn keys_decode_to_commands() {
        assert_eq!(Command::from_key(27), Command::Quit);
        assert_eq!(Command::from_key('r' as i32), Command::Select(ColorId::Red));
        assert_eq!(Command::from_key('v' as i32), Command::Select(ColorId::Green));
        assert_eq!(Command::from_key('g' as i32), Command::Select(ColorId::Green));
        assert_eq!(Command::from_key('b' as i32), Command::Select(ColorId::Blue));
        assert_eq!(Command::from_key('x' as i32), Command::NoOp);
        assert_eq!(Command::from_key(-1), Command::NoOp);
        // High bits are ignored, as with modifier-tagged key codes.
        assert_eq!(Command::from_key(0x1_0000 | 27), Command::Quit);
    }

    #[test]
    fn first_frame_captures_background() {
        let mut session = session();
        assert_eq!(session.state(), SessionState::Uninitialized);

        let frame = RgbImage::from_pixel(16, 12, Rgb([30, 60, 90]));
        let outcome = session.process_frame(&frame).expect("capture");
        assert!(matches!(outcome, FrameOutcome::BackgroundCaptured));
        assert_eq!(session.state(), SessionState::Ready);
        assert_eq!(session.frames_processed(), 0);

        let expected = to_grayscale(&prepare_frame(&frame, session.config()));
        assert_eq!(session.background().reference().expect("ready"), &expected);
    }

    #[test]
    fn later_frames_run_detection_and_never_recapture() {
        let mut session = session();
        let first = RgbImage::from_pixel(16, 12, Rgb([30, 60, 90]));
        let second = RgbImage::from_pixel(16, 12, Rgb([200, 10, 10]));
        session.process_frame(&first).expect("capture");

        let outcome = session.process_frame(&second).expect("detect");
        assert!(matches!(outcome, FrameOutcome::Detection(_)));
        assert_eq!(session.state(), SessionState::Ready);
        assert_eq!(session.frames_processed(), 1);

        // The reference still reflects the first frame.
        let expected = to_grayscale(&prepare_frame(&first, session.config()));
        assert_eq!(session.background().reference().expect("ready"), &expected);
    }

    #[test]
    fn resized_frame_is_fatal() {
        let mut session = session();
        session
            .process_frame(&RgbImage::new(16, 12))
            .expect("capture");
        let result = session.process_frame(&RgbImage::new(12, 16));
        assert!(matches!(result, Err(DetectionError::DimensionMismatch { .. })));
    }

    #[test]
    fn commands_switch_color_and_stop() {
        let mut session = session();
        assert_eq!(session.active_color(), ColorId::Red);
        assert_eq!(
            session.handle_command(Command::Select(ColorId::Blue)),
            Control::Continue
        );
        assert_eq!(session.active_color(), ColorId::Blue);
        assert_eq!(session.handle_command(Command::NoOp), Control::Continue);
        assert_eq!(session.active_color(), ColorId::Blue);
        assert_eq!(session.handle_command(Command::Quit), Control::Stop);
    }

    #[test]
    fn registry_missing_a_selectable_color_is_rejected() {
        let registry = ColorRegistry::new(vec![ColorProfile::new(
            "red",
            vec![HsvRange::new([0, 40, 40], [10, 255, 255])],
        )]);
        let result = DetectionSession::new(DetectionConfig::default(), registry);
        assert!(matches!(result, Err(DetectionError::UnknownColor(name)) if name == "green"));
    }

    #[test]
    fn default_color_comes_from_config() {
        let config = DetectionConfig {
            default_color: ColorId::Green,
            ..DetectionConfig::default()
        };
        let session = DetectionSession::new(config, ColorRegistry::default()).expect("valid");
        assert_eq!(session.active_color(), ColorId::Green);
    }
}
