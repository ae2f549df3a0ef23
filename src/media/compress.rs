//! Client-side image compression before upload.
//!
//! Images at or under the size limit are uploaded untouched. Anything larger
//! (or of unknown size) is decoded, shrunk so its longer side fits the
//! dimension limit, and re-encoded as JPEG at falling quality until the
//! output is under the limit.

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, RgbImage};

use super::ImageAsset;
use crate::error::ComposeError;

/// JPEG qualities tried in order
pub const QUALITY_STEPS: [u8; 9] = [100, 90, 80, 70, 60, 50, 40, 30, 20];

/// Size and dimension limits for uploaded images
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompressOptions {
    /// Encoded output must be strictly smaller than this many bytes
    pub max_size: u64,
    /// Longest side, in pixels, after resizing
    pub max_dimension: u32,
}

impl Default for CompressOptions {
    fn default() -> Self {
        Self {
            max_size: 1_000_000,
            max_dimension: 2048,
        }
    }
}

/// Bytes ready to be uploaded as a blob
#[derive(Debug, Clone)]
pub struct PreparedImage {
    /// Encoded image
    pub bytes: Vec<u8>,
    /// MIME type of `bytes`
    pub mime: String,
    /// Width of the encoded image
    pub width: u32,
    /// Height of the encoded image
    pub height: u32,
    /// JPEG quality used, `None` when the original file is uploaded as is
    pub quality: Option<u8>,
}

/// Whether either side exceeds `max`
pub const fn needs_resize(width: u32, height: u32, max: u32) -> bool {
    width > max || height > max
}

/// Dimensions that fit `max` while keeping the aspect ratio.
///
/// Landscape images get `max` as width; portrait and square ones get it as
/// height.
pub fn target_dimensions(width: u32, height: u32, max: u32) -> (u32, u32) {
    let scale = |side: u32, long_side: u32| -> u32 {
        let scaled = (f64::from(side) * f64::from(max) / f64::from(long_side)).round();
        (scaled as u32).max(1)
    };

    if width > height {
        (max, scale(height, width))
    } else {
        (scale(width, height), max)
    }
}

/// Encode `image` as JPEG at `quality`
pub(crate) fn encode_jpeg(image: &RgbImage, quality: u8) -> Result<Vec<u8>, ComposeError> {
    let mut bytes = Vec::new();
    {
        let mut encoder = JpegEncoder::new_with_quality(&mut bytes, quality);
        encoder
            .encode_image(image)
            .map_err(|e| ComposeError::Resize(e.to_string()))?;
    }
    Ok(bytes)
}

/// Read `asset` and shrink it below `opts.max_size` if it is too big.
///
/// When no quality step gets under the limit the original bytes are
/// returned and the upload is left to succeed or fail on its own.
pub fn compress_image(
    asset: &ImageAsset,
    opts: CompressOptions,
) -> Result<PreparedImage, ComposeError> {
    let original = std::fs::read(&asset.path)?;
    let size = asset.file_size.unwrap_or_else(|| opts.max_size.saturating_add(1));

    let untouched = |bytes: Vec<u8>| PreparedImage {
        bytes,
        mime: asset.mime.clone(),
        width: asset.width,
        height: asset.height,
        quality: None,
    };

    if size <= opts.max_size {
        return Ok(untouched(original));
    }

    let decoded = image::load_from_memory(&original)
        .map_err(|e| ComposeError::Resize(e.to_string()))?;
    let decoded = shrink(decoded, opts.max_dimension);
    let rgb = decoded.to_rgb8();

    for quality in QUALITY_STEPS {
        let bytes = encode_jpeg(&rgb, quality)?;
        let len = bytes.len() as u64;
        if len < opts.max_size {
            tracing::debug!(
                "Compressed {} to {} bytes at quality {}",
                asset.file_name(),
                len,
                quality
            );
            return Ok(PreparedImage {
                bytes,
                mime: "image/jpeg".to_string(),
                width: rgb.width(),
                height: rgb.height(),
                quality: Some(quality),
            });
        }
        tracing::debug!("Quality {} still {} bytes", quality, len);
    }

    tracing::warn!(
        "Could not get {} under {} bytes, uploading original",
        asset.file_name(),
        opts.max_size
    );
    Ok(untouched(original))
}

fn shrink(image: DynamicImage, max_dimension: u32) -> DynamicImage {
    if !needs_resize(image.width(), image.height(), max_dimension) {
        return image;
    }
    let (width, height) = target_dimensions(image.width(), image.height(), max_dimension);
    image.resize_exact(width, height, FilterType::Lanczos3)
}

/// [`compress_image`] on the blocking thread pool
pub async fn prepare_for_upload(
    asset: ImageAsset,
    opts: CompressOptions,
) -> Result<PreparedImage, ComposeError> {
    tokio::task::spawn_blocking(move || compress_image(&asset, opts))
        .await
        .map_err(|e| ComposeError::Resize(e.to_string()))?
}
