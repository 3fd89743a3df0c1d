//! Image output conversion
//!
//! Providers emit a fixed native container (PNG for the Amazon generators,
//! JPEG for Stability); callers may request another one. Conversion decodes
//! and re-encodes so the resulting byte stream carries the target
//! container's magic bytes, not just a renamed extension. When the requested
//! format already matches the native one the bytes pass through unchanged.

use crate::providers::error::{ProviderError, ProviderResult};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::codecs::webp::WebPEncoder;
use image::{DynamicImage, ImageEncoder, RgbImage};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::Cursor;

/// Supported output containers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    Png,
    Jpeg,
    Webp,
}

impl ImageFormat {
    /// Parse a caller-supplied format name.
    pub fn parse(value: &str) -> ProviderResult<Self> {
        match value.to_ascii_lowercase().as_str() {
            "png" => Ok(Self::Png),
            "jpeg" | "jpg" => Ok(Self::Jpeg),
            "webp" => Ok(Self::Webp),
            other => Err(ProviderError::invalid_param(
                "output_format",
                format!("Unsupported output format '{other}'. Supported formats: png, jpeg, webp."),
            )),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpeg",
            Self::Webp => "webp",
        }
    }

    /// File extension, which differs from the format name for JPEG.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            other => other.as_str(),
        }
    }

    pub fn mime(&self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::Webp => "image/webp",
        }
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Convert raw image bytes into the target container.
///
/// `compression` is 0-100 (100 = highest quality). For JPEG and WEBP it maps
/// to encoder quality; for PNG it selects the compression level. WEBP output
/// is lossless. Returns the converted bytes with the decoded width and
/// height.
pub fn convert(
    content: &[u8],
    target: ImageFormat,
    compression: u8,
) -> ProviderResult<(Vec<u8>, u32, u32)> {
    if compression > 100 {
        return Err(ProviderError::invalid_param(
            "output_compression",
            format!("Compression must be between 0 and 100, got {compression}"),
        ));
    }
    let decoded = image::load_from_memory(content)
        .map_err(|err| ProviderError::Parse(format!("Undecodable image payload: {err}")))?;
    let width = decoded.width();
    let height = decoded.height();

    let mut output = Cursor::new(Vec::new());
    match target {
        ImageFormat::Png => {
            // High "quality" means low compression effort, mirroring the
            // JPEG quality scale.
            let level = if compression >= 70 {
                CompressionType::Fast
            } else if compression >= 30 {
                CompressionType::Default
            } else {
                CompressionType::Best
            };
            let encoder = PngEncoder::new_with_quality(&mut output, level, FilterType::Adaptive);
            decoded
                .write_with_encoder(encoder)
                .map_err(|err| ProviderError::Parse(format!("PNG encode failed: {err}")))?;
        }
        ImageFormat::Jpeg => {
            // JPEG carries no alpha channel; composite onto white instead
            // of dropping it.
            let flattened = flatten_onto_white(decoded);
            let mut encoder = JpegEncoder::new_with_quality(&mut output, compression.max(1));
            encoder
                .encode_image(&flattened)
                .map_err(|err| ProviderError::Parse(format!("JPEG encode failed: {err}")))?;
        }
        ImageFormat::Webp => {
            let rgba = decoded.to_rgba8();
            let encoder = WebPEncoder::new_lossless(&mut output);
            encoder
                .write_image(rgba.as_raw(), width, height, image::ExtendedColorType::Rgba8)
                .map_err(|err| ProviderError::Parse(format!("WEBP encode failed: {err}")))?;
        }
    }
    Ok((output.into_inner(), width, height))
}

/// Convert a base64-encoded image into the target container.
pub fn convert_base64(
    content: &str,
    target: ImageFormat,
    compression: u8,
) -> ProviderResult<(String, u32, u32)> {
    let bytes = BASE64
        .decode(content)
        .map_err(|err| ProviderError::Parse(format!("Invalid base64 image payload: {err}")))?;
    let (converted, width, height) = convert(&bytes, target, compression)?;
    Ok((BASE64.encode(converted), width, height))
}

/// Width and height of a base64-encoded image.
pub fn base64_image_size(content: &str) -> ProviderResult<(u32, u32)> {
    let bytes = BASE64
        .decode(content)
        .map_err(|err| ProviderError::Parse(format!("Invalid base64 image payload: {err}")))?;
    let decoded = image::load_from_memory(&bytes)
        .map_err(|err| ProviderError::Parse(format!("Undecodable image payload: {err}")))?;
    Ok((decoded.width(), decoded.height()))
}

fn flatten_onto_white(decoded: DynamicImage) -> RgbImage {
    let rgba = decoded.to_rgba8();
    let mut flattened = RgbImage::new(rgba.width(), rgba.height());
    for (x, y, pixel) in rgba.enumerate_pixels() {
        let alpha = pixel[3] as u16;
        let blend = |channel: u8| -> u8 {
            ((channel as u16 * alpha + 255 * (255 - alpha)) / 255) as u8
        };
        flattened.put_pixel(
            x,
            y,
            image::Rgb([blend(pixel[0]), blend(pixel[1]), blend(pixel[2])]),
        );
    }
    flattened
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_png() -> Vec<u8> {
        let mut pixels = image::RgbaImage::new(4, 4);
        for pixel in pixels.pixels_mut() {
            *pixel = image::Rgba([200, 40, 40, 128]);
        }
        let mut output = Cursor::new(Vec::new());
        DynamicImage::ImageRgba8(pixels)
            .write_to(&mut output, image::ImageFormat::Png)
            .unwrap();
        output.into_inner()
    }

    #[test]
    fn jpeg_output_carries_jpeg_magic_bytes() {
        let (converted, width, height) = convert(&sample_png(), ImageFormat::Jpeg, 90).unwrap();
        assert_eq!(&converted[..3], &[0xFF, 0xD8, 0xFF]);
        assert_eq!((width, height), (4, 4));
    }

    #[test]
    fn webp_output_carries_riff_webp_signature() {
        let (converted, _, _) = convert(&sample_png(), ImageFormat::Webp, 100).unwrap();
        assert_eq!(&converted[..4], b"RIFF");
        assert_eq!(&converted[8..12], b"WEBP");
    }

    #[test]
    fn png_output_carries_png_signature() {
        let (jpeg, _, _) = convert(&sample_png(), ImageFormat::Jpeg, 90).unwrap();
        let (converted, _, _) = convert(&jpeg, ImageFormat::Png, 100).unwrap();
        assert_eq!(&converted[..8], &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]);
    }

    #[test]
    fn base64_round_trip_and_size() {
        let encoded = BASE64.encode(sample_png());
        let (converted, width, height) =
            convert_base64(&encoded, ImageFormat::Jpeg, 80).unwrap();
        assert_eq!((width, height), (4, 4));
        let bytes = BASE64.decode(converted).unwrap();
        assert_eq!(&bytes[..3], &[0xFF, 0xD8, 0xFF]);
        assert_eq!(base64_image_size(&encoded).unwrap(), (4, 4));
    }

    #[test]
    fn garbage_bytes_are_rejected() {
        assert!(convert(b"not an image", ImageFormat::Png, 100).is_err());
    }

    #[test]
    fn format_parsing() {
        assert_eq!(ImageFormat::parse("JPG").unwrap(), ImageFormat::Jpeg);
        assert_eq!(ImageFormat::parse("png").unwrap().extension(), "png");
        assert_eq!(ImageFormat::Jpeg.extension(), "jpg");
        assert!(ImageFormat::parse("gif").is_err());
    }
}
