//! Mask image loading.
//!
//! A mask constrains placement to its dark shape and doubles as the pixel
//! source for `image_colors`. It is resized to the canvas on load, so the
//! configured width and height stay authoritative.

use crate::color::ImageSampler;
use crate::Error;
use image::{imageops::FilterType, GenericImageView, RgbaImage};
use std::path::Path;
use tracing::info;

pub struct MaskImage {
    pixels: RgbaImage,
}

impl MaskImage {
    /// Decode a mask file and resize it to the canvas with nearest-neighbor
    /// filtering. Any failure (missing file, undecodable content) comes back
    /// as an [`Error::Image`] for the caller to downgrade.
    pub fn load(path: &Path, canvas_width: u32, canvas_height: u32) -> Result<Self, Error> {
        let img = image::open(path)
            .map_err(|e| Error::Image(format!("{}: {e}", path.display())))?;
        let (w, h) = img.dimensions();
        info!("loading mask: {}, size: {w}x{h}", path.display());
        let pixels = img
            .resize_exact(canvas_width, canvas_height, FilterType::Nearest)
            .to_rgba8();
        Ok(Self { pixels })
    }

    #[cfg(test)]
    pub(crate) fn from_pixels(pixels: RgbaImage) -> Self {
        Self { pixels }
    }

    /// Whether a canvas pixel is off-limits for word placement.
    ///
    /// Transparent pixels and near-white pixels are blocked; words land on
    /// the dark shape of the mask.
    pub fn is_blocked(&self, x: u32, y: u32) -> bool {
        let (w, h) = self.pixels.dimensions();
        if x >= w || y >= h {
            return true;
        }
        let [r, g, b, a] = self.pixels.get_pixel(x, y).0;
        a < 128 || r as u16 + g as u16 + b as u16 >= 750
    }

    /// Color sampler over the resized mask pixels, for `image_colors`.
    pub fn sampler(&self) -> ImageSampler {
        ImageSampler::new(self.pixels.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_an_error() {
        let err = MaskImage::load(Path::new("/no/such/mask.png"), 100, 100);
        assert!(matches!(err, Err(Error::Image(_))));
    }

    #[test]
    fn white_and_transparent_pixels_are_blocked() {
        let mut img = RgbaImage::from_pixel(3, 1, image::Rgba([20, 20, 20, 255]));
        img.put_pixel(1, 0, image::Rgba([255, 255, 255, 255]));
        img.put_pixel(2, 0, image::Rgba([20, 20, 20, 0]));
        let mask = MaskImage::from_pixels(img);
        assert!(!mask.is_blocked(0, 0));
        assert!(mask.is_blocked(1, 0));
        assert!(mask.is_blocked(2, 0));
        // Out of bounds counts as blocked.
        assert!(mask.is_blocked(3, 0));
        assert!(mask.is_blocked(0, 1));
    }
}
