// THEORY:
// This file is the main entry point for the `chroma_motion` library crate.
// It exposes the detection session, the pure per-frame pipeline and the run loop
// with its collaborator traits. Camera and window handling are not part of this
// crate; they plug in through `runner::FrameSource`, `runner::CommandSource` and
// `runner::DisplaySink` (see the `live_viewer` crate for an OpenCV front end).
//
// The building blocks (`core_modules`) stay public so the individual stages can be
// reused and tested on their own.

pub mod core_modules;
pub mod error;
pub mod pipeline;
pub mod runner;

pub use core_modules::color_profile::{ColorId, ColorProfile, ColorRegistry, HsvRange};
pub use core_modules::session::{Command, DetectionSession, FrameOutcome, SessionState};
pub use error::DetectionError;
pub use pipeline::{DetectionConfig, DetectionResult, detect};
pub use runner::{CommandSource, DisplaySink, FrameSource, RunSummary, StopReason, run};
