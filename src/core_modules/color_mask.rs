// THEORY:
// The color stage selects pixels whose HSV triple falls inside the active profile.
// Each interval of the profile yields its own binary mask; the masks are merged with a
// saturating add, which on 0/255 inputs is exactly a logical OR. Merging is what lets
// red, whose hues sit at both ends of the hue circle, be described by two disjoint
// intervals. The merged mask then goes through the same opening/closing cleanup as the
// motion mask, with the same kernel.

use crate::core_modules::color_profile::{ColorProfile, HsvRange};
use crate::core_modules::conversion::conversion::{HsvImage, to_hsv};
use crate::core_modules::morphology::open_close;
use crate::core_modules::motion_mask::{MASK_OFF, MASK_ON, ensure_same_dimensions};
use crate::error::Result;
use image::{GrayImage, Luma, RgbImage};

/// Binary mask of the pixels inside a single inclusive HSV interval.
pub fn in_range(hsv: &HsvImage, range: &HsvRange) -> GrayImage {
    let (width, height) = hsv.dimensions();
    GrayImage::from_fn(width, height, |x, y| {
        if range.contains(hsv.get_pixel(x, y).0) {
            Luma([MASK_ON])
        } else {
            Luma([MASK_OFF])
        }
    })
}

/// Saturating per-pixel sum of two masks.
pub fn union(a: &GrayImage, b: &GrayImage) -> Result<GrayImage> {
    ensure_same_dimensions(a.dimensions(), b.dimensions())?;
    let (width, height) = a.dimensions();
    Ok(GrayImage::from_fn(width, height, |x, y| {
        Luma([a.get_pixel(x, y)[0].saturating_add(b.get_pixel(x, y)[0])])
    }))
}

/// Union of the per-interval masks of `profile`, before cleanup.
pub fn raw_color_mask(hsv: &HsvImage, profile: &ColorProfile) -> Result<GrayImage> {
    let (width, height) = hsv.dimensions();
    profile
        .ranges
        .iter()
        .try_fold(GrayImage::new(width, height), |combined, range| {
            union(&combined, &in_range(hsv, range))
        })
}

/// Full color stage over the blurred color frame.
pub fn color_mask(blurred: &RgbImage, profile: &ColorProfile, kernel_size: u32) -> Result<GrayImage> {
    let hsv = to_hsv(blurred);
    let raw = raw_color_mask(&hsv, profile)?;
    Ok(open_close(&raw, kernel_size))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_modules::color_profile::{ColorId, ColorRegistry};
    use image::Rgb;

    fn hsv_row(pixels: &[[u8; 3]]) -> HsvImage {
        HsvImage::from_fn(pixels.len() as u32, 1, |x, _| Rgb(pixels[x as usize]))
    }

    #[test]
    fn red_union_accepts_either_range() {
        let registry = ColorRegistry::default();
        let red = registry.profile(ColorId::Red).expect("red");
        let hsv = hsv_row(&[
            [5, 200, 200],   // low red interval only
            [175, 200, 200], // high red interval only
            [60, 200, 200],  // green, neither interval
            [5, 10, 200],    // right hue, too little saturation
        ]);

        let mask = raw_color_mask(&hsv, red).expect("same size");
        let values: Vec<u8> = mask.pixels().map(|p| p[0]).collect();
        assert_eq!(values, vec![MASK_ON, MASK_ON, MASK_OFF, MASK_OFF]);
    }

    #[test]
    fn overlapping_ranges_saturate_instead_of_wrapping() {
        let overlapping = ColorProfile::new(
            "overlap",
            vec![
                HsvRange::new([0, 0, 0], [20, 255, 255]),
                HsvRange::new([10, 0, 0], [30, 255, 255]),
            ],
        );
        let hsv = hsv_row(&[[15, 100, 100]]);
        let mask = raw_color_mask(&hsv, &overlapping).expect("same size");
        assert_eq!(mask.get_pixel(0, 0)[0], MASK_ON);
    }

    #[test]
    fn empty_profile_selects_nothing() {
        let nothing = ColorProfile::new("none", Vec::new());
        let hsv = hsv_row(&[[5, 200, 200], [60, 200, 200]]);
        let mask = raw_color_mask(&hsv, &nothing).expect("same size");
        assert!(mask.pixels().all(|p| p[0] == MASK_OFF));
    }

    #[test]
    fn green_block_in_rgb_frame_is_selected() {
        let registry = ColorRegistry::default();
        let green = registry.profile(ColorId::Green).expect("green");
        let mut frame = RgbImage::from_pixel(20, 20, Rgb([40, 40, 40]));
        for y in 5..15 {
            for x in 5..15 {
                frame.put_pixel(x, y, Rgb([20, 200, 30]));
            }
        }

        let mask = color_mask(&frame, green, 5).expect("same size");
        assert_eq!(mask.get_pixel(10, 10)[0], MASK_ON);
        assert_eq!(mask.get_pixel(1, 1)[0], MASK_OFF);

        let blue = registry.profile(ColorId::Blue).expect("blue");
        let other = color_mask(&frame, blue, 5).expect("same size");
        assert!(other.pixels().all(|p| p[0] == MASK_OFF));
    }
}
