// THEORY:
// The `pipeline` module is the pure, per-frame heart of the detector. Given a frame,
// the captured background, the active color profile and the configuration, `detect`
// runs the whole chain and returns every intermediate product:
//
//   frame ──blur──┬─ grayscale ─ |diff| ─ threshold ─ open/close ──┐
//                 └─ HSV ─ in-range per interval ─ OR ─ open/close ─┴─ AND ─ cut-out
//
// The blur is computed once and shared by both branches so that the two masks line up
// pixel for pixel. The cut-out uses the original, unblurred frame.
//
// Nothing here holds state. Session bookkeeping (when to capture the background, which
// color is active) lives in `core_modules::session`, and device I/O lives behind the
// traits in `runner`.

use crate::core_modules::color_mask::color_mask;
use crate::core_modules::color_profile::{ColorId, ColorProfile};
use crate::core_modules::conversion::conversion::gaussian_blur;
use crate::core_modules::fusion::{apply_mask, fuse};
use crate::core_modules::motion_mask::{ensure_same_dimensions, motion_mask};
use crate::error::{DetectionError, Result};
use image::{GrayImage, RgbImage};

pub const ENV_MOTION_THRESHOLD: &str = "CHROMA_MOTION_THRESHOLD";
pub const ENV_KERNEL_SIZE: &str = "CHROMA_KERNEL_SIZE";
pub const ENV_BLUR_SIZE: &str = "CHROMA_BLUR_SIZE";
pub const ENV_DEFAULT_COLOR: &str = "CHROMA_DEFAULT_COLOR";

/// Tunable constants of the detector, fixed for the lifetime of a session.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectionConfig {
    /// A grayscale difference strictly above this value counts as motion.
    pub motion_threshold: u8,
    /// Side of the square structuring element used for opening and closing. Odd.
    pub kernel_size: u32,
    /// Side of the Gaussian blur kernel applied before both detectors. Odd.
    pub blur_kernel_size: u32,
    /// The color selected when a session starts.
    pub default_color: ColorId,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            motion_threshold: 25,
            kernel_size: 5,
            blur_kernel_size: 5,
            default_color: ColorId::Red,
        }
    }
}

impl DetectionConfig {
    /// Defaults overridden by the `CHROMA_*` environment variables that are set.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as `from_env`, reading values through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(raw) = lookup(ENV_MOTION_THRESHOLD) {
            config.motion_threshold = parse_setting(ENV_MOTION_THRESHOLD, &raw)?;
        }
        if let Some(raw) = lookup(ENV_KERNEL_SIZE) {
            config.kernel_size = parse_setting(ENV_KERNEL_SIZE, &raw)?;
        }
        if let Some(raw) = lookup(ENV_BLUR_SIZE) {
            config.blur_kernel_size = parse_setting(ENV_BLUR_SIZE, &raw)?;
        }
        if let Some(raw) = lookup(ENV_DEFAULT_COLOR) {
            config.default_color = raw.parse()?;
        }
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        for (name, size) in [
            ("kernel_size", self.kernel_size),
            ("blur_kernel_size", self.blur_kernel_size),
        ] {
            if size == 0 || size % 2 == 0 {
                return Err(DetectionError::InvalidConfig(format!(
                    "{name} must be odd and at least 1, got {size}"
                )));
            }
        }
        Ok(())
    }
}

fn parse_setting<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T> {
    raw.trim()
        .parse()
        .map_err(|_| DetectionError::InvalidConfig(format!("{key}: cannot parse `{raw}`")))
}

/// Everything the pipeline produced for one frame.
#[derive(Debug, Clone)]
pub struct DetectionResult {
    pub motion_mask: GrayImage,
    pub color_mask: GrayImage,
    pub final_mask: GrayImage,
    /// The original frame with everything outside `final_mask` blacked out.
    pub result: RgbImage,
}

impl DetectionResult {
    /// Number of pixels retained by the fused mask.
    pub fn detected_pixels(&self) -> usize {
        self.final_mask.pixels().filter(|p| p[0] != 0).count()
    }
}

/// Blur applied once per frame and shared by both detectors.
pub fn prepare_frame(frame: &RgbImage, config: &DetectionConfig) -> RgbImage {
    gaussian_blur(frame, config.blur_kernel_size)
}

/// Runs motion detection, color detection and fusion over one frame.
pub fn detect(
    frame: &RgbImage,
    background: &GrayImage,
    profile: &ColorProfile,
    config: &DetectionConfig,
) -> Result<DetectionResult> {
    ensure_same_dimensions(background.dimensions(), frame.dimensions())?;

    // Stage 1: shared noise reduction
    let blurred = prepare_frame(frame, config);

    // Stage 2: the two independent detectors
    let motion_mask = motion_mask(
        &blurred,
        background,
        config.motion_threshold,
        config.kernel_size,
    )?;
    let color_mask = color_mask(&blurred, profile, config.kernel_size)?;

    // Stage 3: fusion and projection onto the original frame
    let final_mask = fuse(&motion_mask, &color_mask)?;
    let result = apply_mask(frame, &final_mask)?;

    Ok(DetectionResult {
        motion_mask,
        color_mask,
        final_mask,
        result,
    })
}
