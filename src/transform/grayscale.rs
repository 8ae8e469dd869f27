//! Grayscale conversion: decode → luma → JPEG.

use image::codecs::jpeg::JpegEncoder;

/// File name suggested to clients for the transformed image.
pub const OUTPUT_FILE_NAME: &str = "image_grayscale.jpg";

#[derive(Debug, thiserror::Error)]
pub enum TransformError {
    #[error("empty image payload")]
    Empty,

    #[error("failed to decode image: {0}")]
    Decode(#[source] image::ImageError),

    #[error("failed to encode JPEG: {0}")]
    Encode(#[source] image::ImageError),
}

/// Stateless grayscale transform with a fixed JPEG quality.
#[derive(Debug, Clone, Copy)]
pub struct GrayscaleTransform {
    quality: u8,
}

impl GrayscaleTransform {
    pub fn new(quality: u8) -> Self {
        Self {
            quality: quality.clamp(1, 100),
        }
    }

    pub fn quality(&self) -> u8 {
        self.quality
    }

    /// Convert any decodable image to a single-channel grayscale JPEG.
    ///
    /// Luma uses the codec's Rec. 709 weights; alpha is dropped. The output
    /// depends only on the input bytes and the quality.
    pub fn apply(&self, input: &[u8]) -> Result<Vec<u8>, TransformError> {
        if input.is_empty() {
            return Err(TransformError::Empty);
        }

        let decoded = image::load_from_memory(input).map_err(TransformError::Decode)?;
        let luma = decoded.to_luma8();

        let mut output = Vec::with_capacity(input.len() / 2);
        JpegEncoder::new_with_quality(&mut output, self.quality)
            .encode_image(&luma)
            .map_err(TransformError::Encode)?;
        Ok(output)
    }
}

impl Default for GrayscaleTransform {
    fn default() -> Self {
        Self::new(90)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};
    use std::io::Cursor;

    fn encode(image: DynamicImage, format: ImageFormat) -> Vec<u8> {
        let mut buf = Cursor::new(Vec::new());
        image.write_to(&mut buf, format).unwrap();
        buf.into_inner()
    }

    fn gradient(width: u32, height: u32) -> RgbImage {
        RgbImage::from_fn(width, height, |x, y| {
            Rgb([(x * 25) as u8, (y * 25) as u8, ((x + y) * 12) as u8])
        })
    }

    fn rec709(r: u8, g: u8, b: u8) -> f64 {
        0.2126 * r as f64 + 0.7152 * g as f64 + 0.0722 * b as f64
    }

    #[test]
    fn test_output_pixels_are_gray() {
        let input = encode(DynamicImage::ImageRgb8(gradient(10, 10)), ImageFormat::Jpeg);
        let output = GrayscaleTransform::default().apply(&input).unwrap();

        assert_eq!(image::guess_format(&output).unwrap(), ImageFormat::Jpeg);
        let decoded = image::load_from_memory(&output).unwrap().to_rgb8();
        assert_eq!(decoded.dimensions(), (10, 10));
        for pixel in decoded.pixels() {
            let [r, g, b] = pixel.0;
            assert!(r == g && g == b, "pixel {:?} is not gray", pixel);
        }
    }

    #[test]
    fn test_luminance_preserved() {
        let colours = [(200u8, 100u8, 50u8), (10, 240, 30), (255, 255, 255), (0, 0, 200)];
        let transform = GrayscaleTransform::new(100);

        for (r, g, b) in colours {
            let solid = RgbImage::from_pixel(16, 16, Rgb([r, g, b]));
            let input = encode(DynamicImage::ImageRgb8(solid), ImageFormat::Png);
            let output = transform.apply(&input).unwrap();

            let decoded = image::load_from_memory(&output).unwrap().to_luma8();
            let expected = rec709(r, g, b);
            for pixel in decoded.pixels() {
                let diff = (pixel.0[0] as f64 - expected).abs();
                assert!(diff <= 3.0, "({r},{g},{b}) → {} expected ~{expected:.1}", pixel.0[0]);
            }
        }
    }

    #[test]
    fn test_deterministic() {
        let input = encode(DynamicImage::ImageRgb8(gradient(10, 10)), ImageFormat::Png);
        let transform = GrayscaleTransform::default();

        let first = image::load_from_memory(&transform.apply(&input).unwrap())
            .unwrap()
            .to_luma8();
        let second = image::load_from_memory(&transform.apply(&input).unwrap())
            .unwrap()
            .to_luma8();
        assert_eq!(first.as_raw(), second.as_raw());
    }

    #[test]
    fn test_alpha_is_dropped() {
        let rgba = RgbaImage::from_pixel(8, 8, Rgba([120, 60, 30, 128]));
        let input = encode(DynamicImage::ImageRgba8(rgba), ImageFormat::Png);

        let output = GrayscaleTransform::default().apply(&input).unwrap();
        let decoded = image::load_from_memory(&output).unwrap();
        assert!(!decoded.color().has_alpha());
    }

    #[test]
    fn test_rejects_empty_and_garbage() {
        let transform = GrayscaleTransform::default();
        assert!(matches!(transform.apply(&[]), Err(TransformError::Empty)));
        assert!(matches!(
            transform.apply(b"this is plainly not an image"),
            Err(TransformError::Decode(_))
        ));
    }

    #[test]
    fn test_quality_is_clamped() {
        assert_eq!(GrayscaleTransform::new(0).quality(), 1);
        assert_eq!(GrayscaleTransform::new(250).quality(), 100);
    }
}
