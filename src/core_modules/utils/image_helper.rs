pub mod image_helper {
    use image::{ExtendedColorType, GrayImage, ImageEncoder, RgbImage};
    use std::fs::File;
    use std::io::BufWriter;
    use std::path::Path;

    fn save(
        path: &Path,
        width: u32,
        height: u32,
        buffer: &[u8],
        color: ExtendedColorType,
    ) -> Result<(), image::error::ImageError> {
        let output = BufWriter::new(File::create(path)?);
        let encoder = image::codecs::png::PngEncoder::new(output);

        encoder.write_image(buffer, width, height, color)?;

        Ok(())
    }

    /// Writes a single-channel mask as an 8-bit grayscale PNG.
    pub fn save_mask(path: &Path, mask: &GrayImage) -> Result<(), image::error::ImageError> {
        save(path, mask.width(), mask.height(), mask.as_raw(), ExtendedColorType::L8)
    }

    /// Writes an RGB frame as an 8-bit RGB PNG.
    pub fn save_frame(path: &Path, frame: &RgbImage) -> Result<(), image::error::ImageError> {
        save(path, frame.width(), frame.height(), frame.as_raw(), ExtendedColorType::Rgb8)
    }

    /// Lowercase file-name slug of a window title: `"A - Motion Mask"` -> `"a_motion_mask"`.
    pub fn slug(name: &str) -> String {
        let mut slug = String::with_capacity(name.len());
        for c in name.chars() {
            if c.is_ascii_alphanumeric() {
                slug.push(c.to_ascii_lowercase());
            } else if !slug.is_empty() && !slug.ends_with('_') {
                slug.push('_');
            }
        }
        while slug.ends_with('_') {
            slug.pop();
        }
        slug
    }
}
