// THEORY:
// Binary mask cleanup with a square, all-ones structuring element.
//
// - Erosion keeps a pixel only if every pixel under the kernel is set (window minimum).
// - Dilation sets a pixel if any pixel under the kernel is set (window maximum).
// - Opening (erode, then dilate) removes foreground specks smaller than the kernel.
// - Closing (dilate, then erode) fills background holes smaller than the kernel.
//
// Pixels outside the image never influence the result: erosion treats them as set and
// dilation treats them as clear, so a blob touching the border is not eaten away from
// that side. Because the element is a full square, a 2D min/max splits into a
// horizontal pass followed by a vertical pass.

use image::GrayImage;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Extremum {
    Min,
    Max,
}

impl Extremum {
    #[inline]
    fn pick(self, a: u8, b: u8) -> u8 {
        match self {
            Extremum::Min => a.min(b),
            Extremum::Max => a.max(b),
        }
    }

    #[inline]
    fn identity(self) -> u8 {
        match self {
            Extremum::Min => u8::MAX,
            Extremum::Max => u8::MIN,
        }
    }
}

fn window_filter(mask: &GrayImage, kernel_size: u32, extremum: Extremum) -> GrayImage {
    let (width, height) = mask.dimensions();
    if kernel_size <= 1 || width == 0 || height == 0 {
        return mask.clone();
    }
    let radius = (kernel_size / 2) as usize;
    let (w, h) = (width as usize, height as usize);
    let source = mask.as_raw();

    let mut horizontal = vec![0u8; source.len()];
    for y in 0..h {
        let row = &source[y * w..(y + 1) * w];
        for x in 0..w {
            let start = x.saturating_sub(radius);
            let end = (x + radius).min(w - 1);
            horizontal[y * w + x] = row[start..=end]
                .iter()
                .fold(extremum.identity(), |acc, &value| extremum.pick(acc, value));
        }
    }

    let mut output = GrayImage::new(width, height);
    for y in 0..h {
        let start = y.saturating_sub(radius);
        let end = (y + radius).min(h - 1);
        for x in 0..w {
            let value = (start..=end)
                .map(|sy| horizontal[sy * w + x])
                .fold(extremum.identity(), |acc, value| extremum.pick(acc, value));
            output.put_pixel(x as u32, y as u32, image::Luma([value]));
        }
    }
    output
}

pub fn erode(mask: &GrayImage, kernel_size: u32) -> GrayImage {
    window_filter(mask, kernel_size, Extremum::Min)
}

pub fn dilate(mask: &GrayImage, kernel_size: u32) -> GrayImage {
    window_filter(mask, kernel_size, Extremum::Max)
}

/// Erosion followed by dilation.
pub fn open(mask: &GrayImage, kernel_size: u32) -> GrayImage {
    dilate(&erode(mask, kernel_size), kernel_size)
}

/// Dilation followed by erosion.
pub fn close(mask: &GrayImage, kernel_size: u32) -> GrayImage {
    erode(&dilate(mask, kernel_size), kernel_size)
}

/// The cleanup applied to both detection masks: opening, then closing.
pub fn open_close(mask: &GrayImage, kernel_size: u32) -> GrayImage {
    close(&open(mask, kernel_size), kernel_size)
}
