//! A local image file picked for attachment.

use image::ImageFormat;
use std::path::{Path, PathBuf};

use crate::error::ComposeError;

/// Metadata of a local image file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageAsset {
    /// Source file
    pub path: PathBuf,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// File size in bytes, when known
    pub file_size: Option<u64>,
    /// MIME type guessed from the file extension
    pub mime: String,
}

impl ImageAsset {
    /// Read dimensions and size of the image at `path`
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ComposeError> {
        let path = path.as_ref();
        let metadata = std::fs::metadata(path)?;
        let (width, height) =
            image::image_dimensions(path).map_err(|e| ComposeError::InvalidImage(e.to_string()))?;

        Ok(Self {
            path: path.to_path_buf(),
            width,
            height,
            file_size: Some(metadata.len()),
            mime: mime_for_path(path),
        })
    }

    /// File name for display
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map_or_else(|| self.path.display().to_string(), |n| n.to_string_lossy().to_string())
    }

    /// Human readable size ("1.2 MB", "640 KB")
    pub fn size_label(&self) -> String {
        match self.file_size {
            Some(bytes) if bytes >= 1_000_000 => format!("{:.1} MB", bytes as f64 / 1_000_000.0),
            Some(bytes) => format!("{} KB", bytes.div_ceil(1000)),
            None => "? KB".to_string(),
        }
    }
}

fn mime_for_path(path: &Path) -> String {
    ImageFormat::from_path(path)
        .map_or("application/octet-stream", |f| f.to_mime_type())
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};
    use tempfile::tempdir;

    #[test]
    fn test_open_reads_dimensions_and_size() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("pic.png");
        RgbImage::from_pixel(40, 30, Rgb([10, 20, 30])).save(&path).unwrap();

        let asset = ImageAsset::open(&path).unwrap();
        assert_eq!((asset.width, asset.height), (40, 30));
        assert_eq!(asset.mime, "image/png");
        assert_eq!(asset.file_size, Some(std::fs::metadata(&path).unwrap().len()));
        assert_eq!(asset.file_name(), "pic.png");
    }

    #[test]
    fn test_open_rejects_non_images() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("notes.jpg");
        std::fs::write(&path, b"definitely not a jpeg").unwrap();

        assert!(matches!(
            ImageAsset::open(&path),
            Err(ComposeError::InvalidImage(_))
        ));
        assert!(matches!(
            ImageAsset::open(dir.path().join("missing.png")),
            Err(ComposeError::Io(_))
        ));
    }

    #[test]
    fn test_size_label() {
        let mut asset = ImageAsset {
            path: PathBuf::from("a.jpg"),
            width: 1,
            height: 1,
            file_size: Some(2_500_000),
            mime: "image/jpeg".to_string(),
        };
        assert_eq!(asset.size_label(), "2.5 MB");
        asset.file_size = Some(1500);
        assert_eq!(asset.size_label(), "2 KB");
        asset.file_size = None;
        assert_eq!(asset.size_label(), "? KB");
    }
}
