use fast_image_resize as fr;
use fr::images::Image;
use image::codecs::{bmp::BmpEncoder, jpeg::JpegEncoder, png::PngEncoder};
use image::{ColorType, ImageEncoder};

use super::{overlay, ImageFormat, Interpolation};
use crate::core::error::TransformError;
use crate::decoder::FrameData;
use crate::utils::time_utils;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TransformOptions {
    pub scale: f64,
    pub interpolation: Interpolation,
    pub format: ImageFormat,
    /// JPEG quality, 1..=100. Ignored by lossless formats.
    pub quality: u8,
    pub timestamp: bool,
}

/// Frame to encoded image bytes. Holds no state, so workers call it concurrently.
pub struct FrameTransform;

impl FrameTransform {
    /// Scaled dimensions, rounded down to whole pixels.
    pub fn output_size(width: u32, height: u32, scale: f64) -> (u32, u32) {
        let w = (width as f64 * scale).floor();
        let h = (height as f64 * scale).floor();
        (w.max(0.0) as u32, h.max(0.0) as u32)
    }

    pub fn transform(frame: FrameData, options: &TransformOptions) -> Result<Vec<u8>, TransformError> {
        let FrameData { mut buffer, width, height, timestamp, .. } = frame;

        let expected = FrameData::expected_len(width, height);
        if buffer.len() != expected {
            return Err(TransformError::Dimensions { width, height, expected, actual: buffer.len() });
        }

        // Label goes on before the resize so it scales with the picture
        if options.timestamp {
            let label = time_utils::format_timestamp(timestamp.as_secs_f64());
            overlay::burn_label(&mut buffer, width, height, &label)?;
        }

        let (pixels, out_w, out_h) =
            Self::resize(buffer, width, height, options.scale, options.interpolation)?;
        Self::encode(&pixels, out_w, out_h, options.format, options.quality)
    }

    pub fn resize(
        buffer: Vec<u8>,
        width: u32,
        height: u32,
        scale: f64,
        interpolation: Interpolation,
    ) -> Result<(Vec<u8>, u32, u32), TransformError> {
        let (new_w, new_h) = Self::output_size(width, height, scale);
        if new_w == 0 || new_h == 0 {
            return Err(TransformError::EmptyOutput { width, height, scale });
        }
        if new_w == width && new_h == height {
            return Ok((buffer, width, height));
        }

        let src_image = Image::from_vec_u8(width, height, buffer, fr::PixelType::U8x3)?;
        let mut dst_image = Image::new(new_w, new_h, fr::PixelType::U8x3);

        let options = fr::ResizeOptions::new().resize_alg(interpolation.resize_alg());
        let mut resizer = fr::Resizer::new();
        resizer.resize(&src_image, &mut dst_image, &options)?;

        Ok((dst_image.buffer().to_vec(), new_w, new_h))
    }

    pub fn encode(
        pixels: &[u8],
        width: u32,
        height: u32,
        format: ImageFormat,
        quality: u8,
    ) -> Result<Vec<u8>, TransformError> {
        let mut bytes = Vec::new();
        match format {
            ImageFormat::Jpg => {
                JpegEncoder::new_with_quality(&mut bytes, quality.clamp(1, 100))
                    .write_image(pixels, width, height, ColorType::Rgb8)?;
            }
            ImageFormat::Png => {
                PngEncoder::new(&mut bytes).write_image(pixels, width, height, ColorType::Rgb8)?;
            }
            ImageFormat::Bmp => {
                BmpEncoder::new(&mut bytes).write_image(pixels, width, height, ColorType::Rgb8)?;
            }
        }
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::GenericImageView;

    fn gradient(width: u32, height: u32) -> FrameData {
        let mut buffer = Vec::with_capacity(FrameData::expected_len(width, height));
        for y in 0..height {
            for x in 0..width {
                buffer.extend_from_slice(&[(x * 8) as u8, (y * 8) as u8, 128]);
            }
        }
        FrameData::new(buffer, width, height, 30, 30.0)
    }

    fn options(scale: f64, format: ImageFormat) -> TransformOptions {
        TransformOptions {
            scale,
            interpolation: Interpolation::Linear,
            format,
            quality: 90,
            timestamp: false,
        }
    }

    #[test]
    fn test_output_size_rounds_down() {
        assert_eq!(FrameTransform::output_size(1920, 1080, 0.5), (960, 540));
        assert_eq!(FrameTransform::output_size(101, 51, 0.5), (50, 25));
        assert_eq!(FrameTransform::output_size(3, 3, 0.1), (0, 0));
    }

    #[test]
    fn test_unit_scale_linear_keeps_dimensions() {
        let frame = gradient(16, 10);
        let original = frame.buffer.clone();
        let (pixels, w, h) =
            FrameTransform::resize(frame.buffer, 16, 10, 1.0, Interpolation::Linear).unwrap();
        assert_eq!((w, h), (16, 10));
        assert_eq!(pixels, original);
    }

    #[test]
    fn test_every_interpolation_halves() {
        for interpolation in [
            Interpolation::Nearest,
            Interpolation::Linear,
            Interpolation::Cubic,
            Interpolation::Area,
        ] {
            let frame = gradient(20, 12);
            let (pixels, w, h) =
                FrameTransform::resize(frame.buffer, 20, 12, 0.5, interpolation).unwrap();
            assert_eq!((w, h), (10, 6));
            assert_eq!(pixels.len(), 10 * 6 * 3);
        }
    }

    #[test]
    fn test_resize_is_deterministic() {
        let a = FrameTransform::resize(gradient(20, 12).buffer, 20, 12, 0.7, Interpolation::Cubic).unwrap();
        let b = FrameTransform::resize(gradient(20, 12).buffer, 20, 12, 0.7, Interpolation::Cubic).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_png_output_decodes_to_scaled_size() {
        let bytes = FrameTransform::transform(gradient(16, 8), &options(0.5, ImageFormat::Png)).unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (8, 4));
    }

    #[test]
    fn test_encoded_signatures() {
        let jpg = FrameTransform::transform(gradient(8, 8), &options(1.0, ImageFormat::Jpg)).unwrap();
        assert_eq!(&jpg[..2], &[0xFF, 0xD8]);
        let bmp = FrameTransform::transform(gradient(8, 8), &options(1.0, ImageFormat::Bmp)).unwrap();
        assert_eq!(&bmp[..2], b"BM");
    }

    #[test]
    fn test_timestamp_changes_pixels() {
        let frame = gradient(320, 180);
        let mut with_label = options(1.0, ImageFormat::Png);
        with_label.timestamp = true;
        let plain = FrameTransform::transform(frame.clone(), &options(1.0, ImageFormat::Png)).unwrap();
        let labelled = FrameTransform::transform(frame, &with_label).unwrap();
        assert_ne!(plain, labelled);
    }

    #[test]
    fn test_rejects_short_buffer_and_empty_output() {
        let mut frame = gradient(4, 4);
        frame.buffer.truncate(10);
        assert!(matches!(
            FrameTransform::transform(frame, &options(1.0, ImageFormat::Png)),
            Err(TransformError::Dimensions { .. })
        ));
        assert!(matches!(
            FrameTransform::transform(gradient(4, 4), &options(0.1, ImageFormat::Png)),
            Err(TransformError::EmptyOutput { .. })
        ));
    }
}
