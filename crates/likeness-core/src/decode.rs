//! Image decoding: raw upload bytes to an RGB pixel buffer.
//!
//! Any format the `image` crate recognises is accepted. Grayscale, paletted
//! and alpha-carrying sources are converted to 8-bit RGB; alpha is dropped,
//! not composited.

use image::imageops::FilterType;
use image::RgbImage;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("cannot identify image file: {0}")]
    Unrecognized(#[from] image::ImageError),
    #[error("image has zero width or height")]
    Empty,
}

/// What shape the decoder must hand to an embedder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodePolicy {
    /// Keep the source resolution. Used when the embedder crops/aligns itself.
    Native,
    /// Resize (bicubic) to a fixed `size × size` square.
    Square(u32),
}

/// A decoded RGB image, owned by a single extraction call.
#[derive(Debug, Clone)]
pub struct DecodedImage {
    rgb: RgbImage,
}

impl DecodedImage {
    pub fn width(&self) -> u32 {
        self.rgb.width()
    }

    pub fn height(&self) -> u32 {
        self.rgb.height()
    }

    /// Packed RGB bytes, row-major, `width * height * 3` long.
    pub fn pixels(&self) -> &[u8] {
        self.rgb.as_raw()
    }

    pub fn as_rgb(&self) -> &RgbImage {
        &self.rgb
    }
}

impl From<RgbImage> for DecodedImage {
    fn from(rgb: RgbImage) -> Self {
        Self { rgb }
    }
}

/// Decode `bytes` into an RGB image shaped according to `policy`.
pub fn decode_image(bytes: &[u8], policy: DecodePolicy) -> Result<DecodedImage, DecodeError> {
    let dynamic = image::load_from_memory(bytes)?;
    if dynamic.width() == 0 || dynamic.height() == 0 {
        return Err(DecodeError::Empty);
    }

    let rgb = dynamic.to_rgb8();
    let rgb = match policy {
        DecodePolicy::Native => rgb,
        DecodePolicy::Square(size) if rgb.width() == size && rgb.height() == size => rgb,
        DecodePolicy::Square(size) => {
            image::imageops::resize(&rgb, size, size, FilterType::CatmullRom)
        }
    };

    tracing::trace!(
        width = rgb.width(),
        height = rgb.height(),
        ?policy,
        "decoded image"
    );

    Ok(DecodedImage { rgb })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, GrayImage, ImageFormat, Luma, Rgba, RgbaImage};
    use std::io::Cursor;

    fn encode(img: DynamicImage) -> Vec<u8> {
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, ImageFormat::Png).unwrap();
        buf.into_inner()
    }

    #[test]
    fn test_decode_rgba_drops_alpha() {
        let src = RgbaImage::from_pixel(4, 3, Rgba([10, 20, 30, 0]));
        let bytes = encode(DynamicImage::ImageRgba8(src));

        let decoded = decode_image(&bytes, DecodePolicy::Native).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (4, 3));
        assert_eq!(decoded.pixels().len(), 4 * 3 * 3);
        assert_eq!(&decoded.pixels()[..3], &[10, 20, 30]);
    }

    #[test]
    fn test_decode_grayscale_expands_to_rgb() {
        let src = GrayImage::from_pixel(2, 2, Luma([77]));
        let bytes = encode(DynamicImage::ImageLuma8(src));

        let decoded = decode_image(&bytes, DecodePolicy::Native).unwrap();
        assert!(decoded.pixels().iter().all(|&p| p == 77));
        assert_eq!(decoded.pixels().len(), 2 * 2 * 3);
    }

    #[test]
    fn test_decode_square_resizes() {
        let src = RgbaImage::from_pixel(50, 20, Rgba([200, 100, 50, 255]));
        let bytes = encode(DynamicImage::ImageRgba8(src));

        let decoded = decode_image(&bytes, DecodePolicy::Square(224)).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (224, 224));
        // Uniform input stays uniform through the resampling filter.
        let px = &decoded.pixels()[..3];
        assert!(px[0].abs_diff(200) <= 1 && px[1].abs_diff(100) <= 1 && px[2].abs_diff(50) <= 1);
    }

    #[test]
    fn test_decode_rejects_garbage() {
        let err = decode_image(b"definitely not an image", DecodePolicy::Native).unwrap_err();
        assert!(matches!(err, DecodeError::Unrecognized(_)));
    }

    #[test]
    fn test_decode_rejects_empty_buffer() {
        assert!(decode_image(&[], DecodePolicy::Square(224)).is_err());
    }
}
