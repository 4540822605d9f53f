// THEORY:
// The background model holds the single grayscale reference frame that every later
// frame is compared against. It is captured exactly once, from the first frame the
// session reads, and is never updated afterwards. There is no running average: any
// scene change after capture (lighting drift, a moved chair) shows up as permanent
// motion. That is a known limitation of static background subtraction and is kept.
//
// A second capture is rejected with `BackgroundAlreadyCaptured` rather than silently
// ignored, so misuse is visible in tests.

use crate::error::{DetectionError, Result};
use image::GrayImage;

/// Single-shot grayscale reference for background subtraction.
#[derive(Debug, Default)]
pub struct BackgroundModel {
    reference: Option<GrayImage>,
}

impl BackgroundModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_initialized(&self) -> bool {
        self.reference.is_some()
    }

    /// Stores `frame` as the reference. Only the first call succeeds.
    pub fn capture(&mut self, frame: GrayImage) -> Result<()> {
        if self.reference.is_some() {
            return Err(DetectionError::BackgroundAlreadyCaptured);
        }
        self.reference = Some(frame);
        Ok(())
    }

    pub fn reference(&self) -> Result<&GrayImage> {
        self.reference
            .as_ref()
            .ok_or(DetectionError::BackgroundNotInitialized)
    }

    /// `(width, height)` of the reference, once captured.
    pub fn dimensions(&self) -> Option<(u32, u32)> {
        self.reference.as_ref().map(|frame| frame.dimensions())
    }
}
