// Offline demo of the `chroma_motion` library.
//
// Runs a detection session over a synthetic scene (a red and a green square drifting
// over a static backdrop) and writes the diagnostic masks of every frame as PNG files.
// Halfway through, the scripted command stream switches detection from red to green.
// The live camera front end is the `live_viewer` crate.

use anyhow::{Context, Result};
use chroma_motion::core_modules::color_profile::ColorId;
use chroma_motion::core_modules::session::Command;
use chroma_motion::runner::{self, CommandSource, FrameSource, SnapshotSink};
use chroma_motion::{ColorRegistry, DetectionConfig, DetectionSession};
use image::{Rgb, RgbImage};
use log::info;

const SCENE_WIDTH: u32 = 160;
const SCENE_HEIGHT: u32 = 120;
const SQUARE_SIDE: u32 = 24;
const BACKDROP: Rgb<u8> = Rgb([25, 25, 30]);

/// Yields an empty backdrop first, then frames with two squares moving right.
struct SyntheticScene {
    total_frames: u32,
    next_frame: u32,
}

impl SyntheticScene {
    fn new(total_frames: u32) -> Self {
        Self {
            total_frames,
            next_frame: 0,
        }
    }

    fn render(&self, index: u32) -> RgbImage {
        let mut frame = RgbImage::from_pixel(SCENE_WIDTH, SCENE_HEIGHT, BACKDROP);
        if index == 0 {
            return frame;
        }
        let offset = (index * 6) % (SCENE_WIDTH - SQUARE_SIDE);
        paint_square(&mut frame, offset, 20, Rgb([210, 30, 30]));
        paint_square(&mut frame, SCENE_WIDTH - SQUARE_SIDE - offset, 70, Rgb([30, 190, 40]));
        frame
    }
}

fn paint_square(frame: &mut RgbImage, x0: u32, y0: u32, color: Rgb<u8>) {
    for y in y0..(y0 + SQUARE_SIDE).min(frame.height()) {
        for x in x0..(x0 + SQUARE_SIDE).min(frame.width()) {
            frame.put_pixel(x, y, color);
        }
    }
}

impl FrameSource for SyntheticScene {
    fn read_frame(&mut self) -> Option<RgbImage> {
        if self.next_frame >= self.total_frames {
            return None;
        }
        let frame = self.render(self.next_frame);
        self.next_frame += 1;
        Some(frame)
    }
}

/// Selects green after `switch_after` polls, otherwise does nothing.
struct ScriptedCommands {
    polls: u32,
    switch_after: u32,
}

impl CommandSource for ScriptedCommands {
    fn poll(&mut self) -> Command {
        self.polls += 1;
        if self.polls == self.switch_after {
            Command::Select(ColorId::Green)
        } else {
            Command::NoOp
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = DetectionConfig::from_env().context("invalid detection settings")?;
    let output_dir = std::env::var("CHROMA_OUTPUT_DIR").unwrap_or_else(|_| "snapshots".to_string());
    let total_frames: u32 = std::env::var("CHROMA_DEMO_FRAMES")
        .ok()
        .map(|raw| raw.parse::<u32>())
        .transpose()
        .context("CHROMA_DEMO_FRAMES must be a positive integer")?
        .unwrap_or(12);

    let mut session = DetectionSession::new(config, ColorRegistry::default())?;
    let mut source = SyntheticScene::new(total_frames);
    let mut commands = ScriptedCommands {
        polls: 0,
        switch_after: total_frames / 2,
    };
    let mut sink = SnapshotSink::new(&output_dir)
        .with_context(|| format!("cannot create output directory {output_dir}"))?;

    runner::log_banner(&session);
    let summary = runner::run(&mut session, &mut source, &mut commands, &mut sink)?;

    info!(
        "Wrote {} images to {} ({:?})",
        sink.written(),
        output_dir,
        summary.stop_reason
    );
    Ok(())
}
