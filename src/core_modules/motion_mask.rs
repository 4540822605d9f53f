// THEORY:
// The motion stage is plain background subtraction against the static reference held
// by `BackgroundModel`:
//
// 1.  The (already blurred) frame is reduced to grayscale.
// 2.  Each pixel's absolute difference from the reference is computed.
// 3.  A strict binary threshold marks motion: `diff > threshold` becomes 255, anything
//     at or below the threshold is background.
// 4.  Opening then closing with the shared square kernel drops sensor speckle and
//     fills pinholes inside moving regions.
//
// The stage holds no state. Given the same frame, reference and parameters it always
// yields the same mask.

use crate::core_modules::conversion::conversion::to_grayscale;
use crate::core_modules::morphology::open_close;
use crate::error::{DetectionError, Result};
use image::{GrayImage, Luma, RgbImage};

pub const MASK_ON: u8 = 255;
pub const MASK_OFF: u8 = 0;

/// Per-pixel `|a - b|`.
pub fn absolute_difference(a: &GrayImage, b: &GrayImage) -> Result<GrayImage> {
    ensure_same_dimensions(a.dimensions(), b.dimensions())?;
    let (width, height) = a.dimensions();
    Ok(GrayImage::from_fn(width, height, |x, y| {
        Luma([a.get_pixel(x, y)[0].abs_diff(b.get_pixel(x, y)[0])])
    }))
}

/// Binary threshold with a strict comparison.
pub fn threshold(image: &GrayImage, level: u8) -> GrayImage {
    let (width, height) = image.dimensions();
    GrayImage::from_fn(width, height, |x, y| {
        if image.get_pixel(x, y)[0] > level {
            Luma([MASK_ON])
        } else {
            Luma([MASK_OFF])
        }
    })
}

/// Motion mask for a grayscale frame, without morphological cleanup.
pub fn raw_motion_mask(gray: &GrayImage, background: &GrayImage, level: u8) -> Result<GrayImage> {
    let difference = absolute_difference(background, gray)?;
    Ok(threshold(&difference, level))
}

/// Full motion stage over the blurred color frame.
pub fn motion_mask(
    blurred: &RgbImage,
    background: &GrayImage,
    level: u8,
    kernel_size: u32,
) -> Result<GrayImage> {
    let gray = to_grayscale(blurred);
    let raw = raw_motion_mask(&gray, background, level)?;
    Ok(open_close(&raw, kernel_size))
}

pub(crate) fn ensure_same_dimensions(expected: (u32, u32), actual: (u32, u32)) -> Result<()> {
    if expected != actual {
        return Err(DetectionError::DimensionMismatch { expected, actual });
    }
    Ok(())
}
