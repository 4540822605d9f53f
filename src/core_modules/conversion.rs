// THEORY (Frame Conversions):
// Every stage of the detector starts from the same three per-frame transforms:
//
// - Gaussian blur: a separable low-pass filter applied once per frame. The motion and
//   color stages both consume this single blurred frame so that their masks stay
//   spatially aligned. The kernel weights follow the usual 8-bit convention: fixed
//   binomial tables for sizes 1, 3, 5 and 7, otherwise sampled Gaussian weights with
//   sigma = 0.3 * ((k - 1) * 0.5 - 1) + 0.8. Borders reflect without repeating the
//   edge pixel (`dcb|abcd|cba`).
// - Grayscale: Rec. 601 luma, `0.299 R + 0.587 G + 0.114 B`, in 14-bit fixed point
//   with rounding.
// - HSV: 8-bit HSV where hue is halved to fit a byte (0..=179), saturation is
//   `255 * (max - min) / max` and value is `max`. Hue is derived from the channel
//   holding the maximum, with red winning ties, then green.
//
// All functions are pure. Inputs are RGB ordered; callers holding BGR data must swap
// channels before handing frames over.

pub mod conversion {
    use image::{GrayImage, ImageBuffer, Luma, Rgb, RgbImage};

    pub type HsvImage = ImageBuffer<Rgb<u8>, Vec<u8>>;

    const LUMA_SHIFT: u32 = 14;
    const LUMA_RED: u32 = 4899;
    const LUMA_GREEN: u32 = 9617;
    const LUMA_BLUE: u32 = 1868;

    /// Hue units per chroma unit: 180 hue steps over 6 sectors.
    const HUE_SECTOR_SPAN: i32 = 30;
    const HUE_RANGE: i32 = 180;

    /// Returns the normalized 1D Gaussian weights for an odd kernel size.
    pub fn gaussian_kernel(size: u32) -> Vec<f32> {
        match size {
            1 => vec![1.0],
            3 => vec![0.25, 0.5, 0.25],
            5 => vec![0.0625, 0.25, 0.375, 0.25, 0.0625],
            7 => vec![
                0.03125, 0.109375, 0.21875, 0.28125, 0.21875, 0.109375, 0.03125,
            ],
            _ => {
                let sigma = 0.3 * ((size as f32 - 1.0) * 0.5 - 1.0) + 0.8;
                let center = (size / 2) as f32;
                let raw: Vec<f32> = (0..size)
                    .map(|i| {
                        let offset = i as f32 - center;
                        (-(offset * offset) / (2.0 * sigma * sigma)).exp()
                    })
                    .collect();
                let sum: f32 = raw.iter().sum();
                raw.into_iter().map(|weight| weight / sum).collect()
            }
        }
    }

    /// Mirrors an out-of-range index back into `0..len` without repeating the edge.
    #[inline]
    fn reflect_101(mut index: i64, len: i64) -> usize {
        if len == 1 {
            return 0;
        }
        loop {
            if index < 0 {
                index = -index;
            } else if index >= len {
                index = 2 * len - 2 - index;
            } else {
                return index as usize;
            }
        }
    }

    /// Separable Gaussian blur with a square `size`x`size` kernel.
    pub fn gaussian_blur(frame: &RgbImage, size: u32) -> RgbImage {
        let (width, height) = frame.dimensions();
        if width == 0 || height == 0 || size <= 1 {
            return frame.clone();
        }

        let kernel = gaussian_kernel(size);
        let radius = (size / 2) as i64;
        let (w, h) = (width as i64, height as i64);
        let source = frame.as_raw();

        // --- Horizontal pass into a float buffer ---
        let mut horizontal = vec![0.0f32; source.len()];
        for y in 0..h {
            let row = (y * w) as usize * 3;
            for x in 0..w {
                let mut acc = [0.0f32; 3];
                for (k, weight) in kernel.iter().enumerate() {
                    let sx = reflect_101(x + k as i64 - radius, w);
                    let base = row + sx * 3;
                    for c in 0..3 {
                        acc[c] += weight * source[base + c] as f32;
                    }
                }
                let out = row + x as usize * 3;
                horizontal[out..out + 3].copy_from_slice(&acc);
            }
        }

        // --- Vertical pass with rounding back to bytes ---
        let mut output = RgbImage::new(width, height);
        let target: &mut [u8] = &mut output;
        for y in 0..h {
            for x in 0..w {
                let mut acc = [0.0f32; 3];
                for (k, weight) in kernel.iter().enumerate() {
                    let sy = reflect_101(y + k as i64 - radius, h);
                    let base = (sy * width as usize + x as usize) * 3;
                    for c in 0..3 {
                        acc[c] += weight * horizontal[base + c];
                    }
                }
                let out = (y * w + x) as usize * 3;
                for c in 0..3 {
                    target[out + c] = acc[c].round().clamp(0.0, 255.0) as u8;
                }
            }
        }
        output
    }

    /// Rec. 601 luma of a single RGB pixel.
    #[inline]
    pub fn luma(pixel: &Rgb<u8>) -> u8 {
        let [r, g, b] = pixel.0;
        let weighted = r as u32 * LUMA_RED + g as u32 * LUMA_GREEN + b as u32 * LUMA_BLUE;
        ((weighted + (1 << (LUMA_SHIFT - 1))) >> LUMA_SHIFT) as u8
    }

    pub fn to_grayscale(frame: &RgbImage) -> GrayImage {
        let (width, height) = frame.dimensions();
        GrayImage::from_fn(width, height, |x, y| Luma([luma(frame.get_pixel(x, y))]))
    }

    /// 8-bit HSV triple of a single RGB pixel.
    pub fn rgb_to_hsv(pixel: &Rgb<u8>) -> [u8; 3] {
        let [r, g, b] = pixel.0.map(i32::from);
        let value = r.max(g).max(b);
        let minimum = r.min(g).min(b);
        let chroma = value - minimum;

        if chroma == 0 {
            // Achromatic: hue and saturation are undefined, report zero.
            return [0, 0, value as u8];
        }

        let saturation = (chroma * 255 * 2 + value) / (2 * value);

        let sector = if value == r {
            g - b
        } else if value == g {
            b - r + 2 * chroma
        } else {
            r - g + 4 * chroma
        };
        let mut hue = (2 * sector * HUE_SECTOR_SPAN + chroma).div_euclid(2 * chroma);
        if hue < 0 {
            hue += HUE_RANGE;
        }

        [hue as u8, saturation as u8, value as u8]
    }

    pub fn to_hsv(frame: &RgbImage) -> HsvImage {
        let (width, height) = frame.dimensions();
        HsvImage::from_fn(width, height, |x, y| Rgb(rgb_to_hsv(frame.get_pixel(x, y))))
    }
}

#[cfg(test)]
mod tests {
    use super::conversion::*;
    use image::{Rgb, RgbImage};

    #[test]
    fn kernels_are_normalized() {
        for size in [1, 3, 5, 7, 9, 11] {
            let kernel = gaussian_kernel(size);
            assert_eq!(kernel.len(), size as usize);
            let sum: f32 = kernel.iter().sum();
            assert!((sum - 1.0).abs() < 1e-5, "size {size} sums to {sum}");
        }
    }

    #[test]
    fn blur_keeps_uniform_frames_unchanged() {
        let frame = RgbImage::from_pixel(7, 5, Rgb([120, 30, 200]));
        let blurred = gaussian_blur(&frame, 5);
        assert_eq!(blurred, frame);
    }

    #[test]
    fn blur_spreads_a_bright_dot() {
        let mut frame = RgbImage::new(9, 9);
        frame.put_pixel(4, 4, Rgb([255, 255, 255]));
        let blurred = gaussian_blur(&frame, 5);

        let center = blurred.get_pixel(4, 4)[0];
        let neighbour = blurred.get_pixel(5, 4)[0];
        assert!(center < 255);
        assert!(neighbour > 0);
        assert!(center > neighbour);
        // Outside the 5x5 support nothing leaks through.
        assert_eq!(blurred.get_pixel(7, 4)[0], 0);
    }

    #[test]
    fn blur_handles_single_pixel_frames() {
        let frame = RgbImage::from_pixel(1, 1, Rgb([9, 8, 7]));
        assert_eq!(gaussian_blur(&frame, 5), frame);
    }

    #[test]
    fn luma_uses_rec601_weights() {
        assert_eq!(luma(&Rgb([0, 0, 0])), 0);
        assert_eq!(luma(&Rgb([255, 255, 255])), 255);
        assert_eq!(luma(&Rgb([255, 0, 0])), 76);
        assert_eq!(luma(&Rgb([0, 255, 0])), 150);
        assert_eq!(luma(&Rgb([0, 0, 255])), 29);
    }

    #[test]
    fn primaries_map_to_half_degree_hues() {
        assert_eq!(rgb_to_hsv(&Rgb([255, 0, 0])), [0, 255, 255]);
        assert_eq!(rgb_to_hsv(&Rgb([0, 255, 0])), [60, 255, 255]);
        assert_eq!(rgb_to_hsv(&Rgb([0, 0, 255])), [120, 255, 255]);
        assert_eq!(rgb_to_hsv(&Rgb([255, 255, 0])), [30, 255, 255]);
    }

    #[test]
    fn magenta_side_of_red_wraps_near_180() {
        let [hue, _, _] = rgb_to_hsv(&Rgb([255, 0, 40]));
        assert!(hue >= 170 && hue < 180, "hue was {hue}");
    }

    #[test]
    fn grays_have_no_saturation() {
        assert_eq!(rgb_to_hsv(&Rgb([90, 90, 90])), [0, 0, 90]);
        assert_eq!(rgb_to_hsv(&Rgb([0, 0, 0])), [0, 0, 0]);
    }

    #[test]
    fn half_saturated_pixel() {
        let [_, saturation, value] = rgb_to_hsv(&Rgb([200, 100, 100]));
        assert_eq!(value, 200);
        assert_eq!(saturation, 128);
    }
}
