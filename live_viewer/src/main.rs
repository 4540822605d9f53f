// Live webcam front end for `chroma_motion`.
//
// OpenCV supplies the three collaborators the detection loop needs: `VideoCapture`
// for frames, HighGUI windows for the diagnostic masks, and `wait_key` for the
// keyboard. Everything else (background capture, masks, fusion, color switching)
// happens inside the library.

use anyhow::{Context, Result};
use chroma_motion::core_modules::session::Command;
use chroma_motion::runner::{self, CommandSource, DisplaySink, FrameSource};
use chroma_motion::{ColorRegistry, DetectionConfig, DetectionSession};
use image::{GrayImage, RgbImage};
use log::{info, warn};
use opencv::{
    core::{self, Mat, Scalar},
    highgui, imgproc,
    prelude::*,
    videoio::{self, VideoCapture},
};

const KEY_POLL_DELAY_MS: i32 = 5;

/// A camera opened through OpenCV, converted from BGR to RGB on read.
struct Camera {
    capture: VideoCapture,
    bgr: Mat,
    rgb: Mat,
}

impl Camera {
    fn open(index: i32) -> Result<Self> {
        let capture = VideoCapture::new(index, videoio::CAP_ANY)
            .with_context(|| format!("cannot open camera {index}"))?;
        if !capture.is_opened()? {
            anyhow::bail!("camera {index} did not open");
        }
        Ok(Self {
            capture,
            bgr: Mat::default(),
            rgb: Mat::default(),
        })
    }

    fn grab(&mut self) -> opencv::Result<Option<RgbImage>> {
        if !self.capture.read(&mut self.bgr)? || self.bgr.empty() {
            return Ok(None);
        }
        imgproc::cvt_color(&self.bgr, &mut self.rgb, imgproc::COLOR_BGR2RGB, 0)?;
        let width = self.rgb.cols() as u32;
        let height = self.rgb.rows() as u32;
        let bytes = self.rgb.data_bytes()?.to_vec();
        Ok(RgbImage::from_raw(width, height, bytes))
    }
}

impl FrameSource for Camera {
    fn read_frame(&mut self) -> Option<RgbImage> {
        match self.grab() {
            Ok(frame) => frame,
            Err(e) => {
                warn!("Error reading frame: {e}");
                None
            }
        }
    }

    fn release(&mut self) {
        if let Err(e) = self.capture.release() {
            warn!("Error releasing camera: {e}");
        }
    }
}

/// HighGUI windows, one per diagnostic image.
struct Windows;

impl Windows {
    fn show(name: &str, width: u32, height: u32, data: &[u8], typ: i32, rgb: bool) -> opencv::Result<()> {
        let mut mat = Mat::new_rows_cols_with_default(height as i32, width as i32, typ, Scalar::all(0.0))?;
        mat.data_bytes_mut()?.copy_from_slice(data);
        if rgb {
            let mut bgr = Mat::default();
            imgproc::cvt_color(&mat, &mut bgr, imgproc::COLOR_RGB2BGR, 0)?;
            highgui::imshow(name, &bgr)
        } else {
            highgui::imshow(name, &mat)
        }
    }
}

impl DisplaySink for Windows {
    fn show_mask(&mut self, name: &str, mask: &GrayImage) {
        let (width, height) = mask.dimensions();
        if let Err(e) = Self::show(name, width, height, mask.as_raw(), core::CV_8UC1, false) {
            warn!("Cannot display {name}: {e}");
        }
    }

    fn show_frame(&mut self, name: &str, frame: &RgbImage) {
        let (width, height) = frame.dimensions();
        if let Err(e) = Self::show(name, width, height, frame.as_raw(), core::CV_8UC3, true) {
            warn!("Cannot display {name}: {e}");
        }
    }

    fn close(&mut self) {
        if let Err(e) = highgui::destroy_all_windows() {
            warn!("Error closing windows: {e}");
        }
    }
}

/// Keyboard input read through HighGUI's event loop.
struct Keyboard;

impl CommandSource for Keyboard {
    fn poll(&mut self) -> Command {
        match highgui::wait_key(KEY_POLL_DELAY_MS) {
            Ok(key) => Command::from_key(key),
            Err(e) => {
                warn!("Error polling keyboard: {e}");
                Command::NoOp
            }
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // --- 1. Settings ---
    let config = DetectionConfig::from_env().context("invalid detection settings")?;
    let camera_index: i32 = std::env::var("CHROMA_CAMERA_INDEX")
        .ok()
        .map(|raw| raw.parse::<i32>())
        .transpose()
        .context("CHROMA_CAMERA_INDEX must be an integer")?
        .unwrap_or(0);

    // --- 2. Collaborators ---
    let mut camera = Camera::open(camera_index)?;
    let mut session = DetectionSession::new(config, ColorRegistry::default())?;

    // --- 3. Main loop ---
    runner::log_banner(&session);
    let summary = runner::run(&mut session, &mut camera, &mut Keyboard, &mut Windows)?;

    info!("Program finished ({:?})", summary.stop_reason);
    Ok(())
}
