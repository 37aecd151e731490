//! Photo upload gate and decoded preview bitmap.

use std::io::Cursor;
use std::sync::Arc;

use image::{DynamicImage, ImageReader};
use thiserror::Error;

/// 5 MiB. Exactly this size is accepted; one byte more is not.
pub const MAX_PHOTO_BYTES: usize = 5 * 1024 * 1024;

pub const ACCEPTED_MIME_TYPES: &[&str] = &["image/jpeg", "image/jpg", "image/png", "image/webp"];

/// Longest edge kept in memory after decoding. The exported card's photo
/// frame is 1200 px wide at the default scale, so nothing visible is lost.
const MAX_PREVIEW_EDGE: u32 = 2400;

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("Please upload a valid image file (JPG, PNG, or WebP)")]
    UnsupportedType(String),

    #[error("File size must be less than 5MB")]
    TooLarge(usize),

    #[error("Could not read image: {0}")]
    Decode(String),

    #[error("Please upload a photo")]
    MissingFile,
}

pub fn is_accepted_type(mime: &str) -> bool {
    let mime = mime.trim().to_ascii_lowercase();
    ACCEPTED_MIME_TYPES.contains(&mime.as_str())
}

/// Checks the declared MIME type, then the size. Type is checked first.
pub fn validate_upload(mime: &str, size: usize) -> Result<(), UploadError> {
    if !is_accepted_type(mime) {
        return Err(UploadError::UnsupportedType(mime.trim().to_ascii_lowercase()));
    }
    if size > MAX_PHOTO_BYTES {
        return Err(UploadError::TooLarge(size));
    }
    Ok(())
}

/// An accepted photo. The bitmap is shared with in-flight renders through
/// `Arc` and freed when the last owner drops it.
#[derive(Debug, Clone)]
pub struct PhotoPreview {
    pub file_name: Option<String>,
    pub mime: String,
    pub size_bytes: usize,
    pub bitmap: Arc<DynamicImage>,
}

impl PhotoPreview {
    /// Validates and decodes an upload. CPU bound; call from a blocking task.
    pub fn decode(
        file_name: Option<String>,
        mime: &str,
        bytes: &[u8],
    ) -> Result<PhotoPreview, UploadError> {
        validate_upload(mime, bytes.len())?;

        let bitmap = ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(|e| UploadError::Decode(e.to_string()))?
            .decode()
            .map_err(|e| UploadError::Decode(e.to_string()))?;

        let bitmap = if bitmap.width().max(bitmap.height()) > MAX_PREVIEW_EDGE {
            bitmap.resize(
                MAX_PREVIEW_EDGE,
                MAX_PREVIEW_EDGE,
                image::imageops::FilterType::Triangle,
            )
        } else {
            bitmap
        };

        Ok(PhotoPreview {
            file_name,
            mime: mime.trim().to_ascii_lowercase(),
            size_bytes: bytes.len(),
            bitmap: Arc::new(bitmap),
        })
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.bitmap.width(), self.bitmap.height())
    }
}

#[cfg(test)]
pub(crate) fn png_fixture(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(width, height, image::Rgba([200, 120, 40, 255]));
    let mut bytes = Vec::new();
    DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
        .unwrap();
    bytes
}
