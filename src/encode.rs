//! Final image encoding.

use image::ImageEncoder;

use crate::foundation::buffer::PixelBuffer;
use crate::foundation::error::{ForgeError, ForgeResult};

pub const DEFAULT_JPEG_QUALITY: u8 = 88;

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OutputFormat {
    /// Lossy, alpha dropped. Quality in `1..=100`.
    Jpeg { quality: u8 },
    Png,
}

impl Default for OutputFormat {
    fn default() -> Self {
        Self::Jpeg {
            quality: DEFAULT_JPEG_QUALITY,
        }
    }
}

impl OutputFormat {
    pub fn content_type(self) -> &'static str {
        match self {
            Self::Jpeg { .. } => "image/jpeg",
            Self::Png => "image/png",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Jpeg { .. } => "jpg",
            Self::Png => "png",
        }
    }

    pub fn validate(self) -> ForgeResult<()> {
        match self {
            Self::Jpeg { quality } if !(1..=100).contains(&quality) => Err(
                ForgeError::validation(format!("jpeg quality must be in 1..=100, got {quality}")),
            ),
            _ => Ok(()),
        }
    }
}

/// Serialize `buffer` in `format`. Same input and format always yield the same bytes.
#[tracing::instrument(skip(buffer), fields(w = buffer.width(), h = buffer.height()))]
pub fn encode(buffer: &PixelBuffer, format: OutputFormat) -> ForgeResult<Vec<u8>> {
    format.validate()?;
    let mut out = Vec::new();
    match format {
        OutputFormat::Jpeg { quality } => {
            let rgb: Vec<u8> = buffer
                .as_bytes()
                .chunks_exact(4)
                .flat_map(|px| [px[0], px[1], px[2]])
                .collect();
            image::codecs::jpeg::JpegEncoder::new_with_quality(&mut out, quality)
                .write_image(
                    &rgb,
                    buffer.width(),
                    buffer.height(),
                    image::ExtendedColorType::Rgb8,
                )
                .map_err(|e| ForgeError::encode(format!("jpeg: {e}")))?;
        }
        OutputFormat::Png => {
            image::codecs::png::PngEncoder::new(&mut out)
                .write_image(
                    buffer.as_bytes(),
                    buffer.width(),
                    buffer.height(),
                    image::ExtendedColorType::Rgba8,
                )
                .map_err(|e| ForgeError::encode(format!("png: {e}")))?;
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::color::Rgba8;

    fn gradient_buffer() -> PixelBuffer {
        let mut buf = PixelBuffer::new(32, 16).unwrap();
        for (x, y, px) in buf.pixels_mut() {
            px.copy_from_slice(&[(x * 8) as u8, (y * 16) as u8, 90, 255]);
        }
        buf
    }

    #[test]
    fn jpeg_has_magic_and_decodes_to_same_size() {
        let bytes = encode(&gradient_buffer(), OutputFormat::default()).unwrap();
        assert_eq!(&bytes[..2], &[0xFF, 0xD8]);
        let img = image::load_from_memory(&bytes).unwrap();
        assert_eq!((img.width(), img.height()), (32, 16));
    }

    #[test]
    fn png_is_lossless() {
        let buf = PixelBuffer::filled(5, 4, Rgba8::rgba(1, 2, 3, 4)).unwrap();
        let bytes = encode(&buf, OutputFormat::Png).unwrap();
        let img = image::load_from_memory(&bytes).unwrap().to_rgba8();
        assert_eq!(img.into_raw(), buf.as_bytes());
    }

    #[test]
    fn out_of_range_quality_is_rejected() {
        let buf = PixelBuffer::new(2, 2).unwrap();
        assert!(encode(&buf, OutputFormat::Jpeg { quality: 0 }).is_err());
        assert!(encode(&buf, OutputFormat::Jpeg { quality: 101 }).is_err());
    }

    #[test]
    fn extension_matches_content_type() {
        assert_eq!(OutputFormat::default().extension(), "jpg");
        assert_eq!(OutputFormat::default().content_type(), "image/jpeg");
        assert_eq!(OutputFormat::Png.extension(), "png");
        assert_eq!(OutputFormat::Png.content_type(), "image/png");
    }
}
