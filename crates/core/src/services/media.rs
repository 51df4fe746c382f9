//! Image validation for post attachments.

use std::io::Cursor;

use serde::{Deserialize, Serialize};

/// Message shown when an upload is not a decodable image.
pub const INVALID_IMAGE: &str =
    "Upload a valid image. The file you uploaded was either not an image or a corrupted image.";

/// Supported image formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    Jpeg,
    Png,
    WebP,
    Gif,
}

impl ImageFormat {
    /// Get MIME type for this format.
    #[must_use]
    pub const fn mime_type(&self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::WebP => "image/webp",
            Self::Gif => "image/gif",
        }
    }

    /// Get file extension for this format.
    #[must_use]
    pub const fn extension(&self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Png => "png",
            Self::WebP => "webp",
            Self::Gif => "gif",
        }
    }

    /// Detect format from magic bytes.
    #[must_use]
    pub fn detect(data: &[u8]) -> Option<Self> {
        if data.len() < 12 {
            return None;
        }

        // JPEG: FF D8 FF
        if data[0..3] == [0xFF, 0xD8, 0xFF] {
            return Some(Self::Jpeg);
        }

        // PNG: 89 50 4E 47 0D 0A 1A 0A
        if data[0..8] == [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A] {
            return Some(Self::Png);
        }

        // GIF: GIF87a or GIF89a
        if data[0..3] == *b"GIF" {
            return Some(Self::Gif);
        }

        // WebP: RIFF....WEBP
        if data[0..4] == *b"RIFF" && data[8..12] == *b"WEBP" {
            return Some(Self::WebP);
        }

        None
    }
}

/// An uploaded file that passed image validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidImage {
    pub data: Vec<u8>,
    pub format: ImageFormat,
    pub width: u32,
    pub height: u32,
}

/// Check that `data` is a supported image no larger than `max_bytes`.
///
/// The header is decoded with the `image` crate so a file that merely starts
/// with the right magic bytes is still rejected. Errors are user-facing form
/// messages.
pub fn validate_image(data: Vec<u8>, max_bytes: usize) -> Result<ValidImage, String> {
    if data.len() > max_bytes {
        return Err(format!(
            "The image is too large ({} bytes). The limit is {max_bytes} bytes.",
            data.len()
        ));
    }

    let format = ImageFormat::detect(&data).ok_or_else(|| INVALID_IMAGE.to_string())?;

    let (width, height) = image::ImageReader::new(Cursor::new(data.as_slice()))
        .with_guessed_format()
        .map_err(|_| INVALID_IMAGE.to_string())?
        .into_dimensions()
        .map_err(|_| INVALID_IMAGE.to_string())?;

    if width == 0 || height == 0 {
        return Err(INVALID_IMAGE.to_string());
    }

    Ok(ValidImage {
        data,
        format,
        width,
        height,
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// A 1x1 transparent GIF.
    pub(crate) const TINY_GIF: &[u8] = &[
        0x47, 0x49, 0x46, 0x38, 0x39, 0x61, 0x01, 0x00, 0x01, 0x00, 0x80, 0x00, 0x00, 0x00, 0x00,
        0x00, 0xFF, 0xFF, 0xFF, 0x21, 0xF9, 0x04, 0x01, 0x00, 0x00, 0x00, 0x00, 0x2C, 0x00, 0x00,
        0x00, 0x00, 0x01, 0x00, 0x01, 0x00, 0x00, 0x02, 0x02, 0x44, 0x01, 0x00, 0x3B,
    ];

    #[test]
    fn test_detect_formats() {
        assert_eq!(ImageFormat::detect(TINY_GIF), Some(ImageFormat::Gif));
        assert_eq!(
            ImageFormat::detect(&[0xFF, 0xD8, 0xFF, 0xE0, 0, 0, 0, 0, 0, 0, 0, 0]),
            Some(ImageFormat::Jpeg)
        );
        assert_eq!(ImageFormat::detect(b"RIFF\0\0\0\0WEBPVP8 "), Some(ImageFormat::WebP));
        assert_eq!(ImageFormat::detect(b"short"), None);
        assert_eq!(ImageFormat::detect(b"plain text, not an image"), None);
    }

    #[test]
    fn test_validate_tiny_gif() {
        let image = validate_image(TINY_GIF.to_vec(), 1024).unwrap();
        assert_eq!(image.format, ImageFormat::Gif);
        assert_eq!((image.width, image.height), (1, 1));
        assert_eq!(image.format.extension(), "gif");
    }

    #[test]
    fn test_validate_rejects_text() {
        let err = validate_image(b"definitely not an image file".to_vec(), 1024).unwrap_err();
        assert_eq!(err, INVALID_IMAGE);
    }

    #[test]
    fn test_validate_rejects_truncated_header() {
        let err = validate_image(TINY_GIF[..8].to_vec(), 1024).unwrap_err();
        assert_eq!(err, INVALID_IMAGE);
    }

    #[test]
    fn test_validate_rejects_oversized() {
        let err = validate_image(TINY_GIF.to_vec(), 10).unwrap_err();
        assert!(err.contains("too large"));
    }
}
