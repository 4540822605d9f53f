// THEORY:
// Fusion keeps only what both detectors agree on: a pixel survives when it is set in
// the motion mask AND in the color mask. The fused mask is then used to cut the
// matching pixels out of the original, unblurred frame; everything else is painted
// black. Both masks come from the same blurred frame, so their sizes always match
// in the pipeline; the checks here only guard direct callers.

use crate::core_modules::motion_mask::ensure_same_dimensions;
use crate::error::Result;
use image::{GrayImage, Luma, Rgb, RgbImage};

/// Pixel-wise bitwise AND of two binary masks.
pub fn fuse(motion: &GrayImage, color: &GrayImage) -> Result<GrayImage> {
    ensure_same_dimensions(motion.dimensions(), color.dimensions())?;
    let (width, height) = motion.dimensions();
    Ok(GrayImage::from_fn(width, height, |x, y| {
        Luma([motion.get_pixel(x, y)[0] & color.get_pixel(x, y)[0]])
    }))
}

/// Copies `frame` where `mask` is set and blacks out the rest.
pub fn apply_mask(frame: &RgbImage, mask: &GrayImage) -> Result<RgbImage> {
    ensure_same_dimensions(mask.dimensions(), frame.dimensions())?;
    let (width, height) = frame.dimensions();
    Ok(RgbImage::from_fn(width, height, |x, y| {
        if mask.get_pixel(x, y)[0] != 0 {
            *frame.get_pixel(x, y)
        } else {
            Rgb([0, 0, 0])
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DetectionError;

    fn checker(width: u32, height: u32) -> GrayImage {
        GrayImage::from_fn(width, height, |x, y| Luma([if (x + y) % 2 == 0 { 255 } else { 0 }]))
    }

    fn stripes(width: u32, height: u32) -> GrayImage {
        GrayImage::from_fn(width, height, |x, _| Luma([if x < width / 2 { 255 } else { 0 }]))
    }

    #[test]
    fn fusion_is_commutative() {
        let a = checker(6, 4);
        let b = stripes(6, 4);
        assert_eq!(fuse(&a, &b).expect("same size"), fuse(&b, &a).expect("same size"));
    }

    #[test]
    fn fusion_with_empty_mask_is_empty() {
        let a = checker(6, 4);
        let empty = GrayImage::new(6, 4);
        assert_eq!(fuse(&a, &empty).expect("same size"), empty);
    }

    #[test]
    fn fusion_with_full_mask_is_identity() {
        let a = checker(6, 4);
        let full = GrayImage::from_pixel(6, 4, Luma([255]));
        assert_eq!(fuse(&a, &full).expect("same size"), a);
    }

    #[test]
    fn fusion_keeps_only_common_pixels() {
        let fused = fuse(&checker(6, 4), &stripes(6, 4)).expect("same size");
        assert_eq!(fused.get_pixel(0, 0)[0], 255);
        assert_eq!(fused.get_pixel(1, 0)[0], 0);
        assert_eq!(fused.get_pixel(4, 0)[0], 0);
    }

    #[test]
    fn mask_projects_onto_frame() {
        let frame = RgbImage::from_fn(4, 2, |x, y| Rgb([x as u8 * 10, y as u8 * 10, 77]));
        let mask = stripes(4, 2);
        let result = apply_mask(&frame, &mask).expect("same size");
        assert_eq!(result.get_pixel(1, 1), frame.get_pixel(1, 1));
        assert_eq!(result.get_pixel(3, 0), &Rgb([0, 0, 0]));
    }

    #[test]
    fn mismatched_masks_are_rejected() {
        let result = fuse(&checker(6, 4), &checker(4, 6));
        assert!(matches!(result, Err(DetectionError::DimensionMismatch { .. })));
    }
}
