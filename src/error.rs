//! Errors surfaced by the compose flow.
//!
//! The `Display` text of each variant is what the composer shows in its
//! error banner, so keep the messages short and user-facing.

use thiserror::Error;

use crate::compose::MAX_LENGTH;
use crate::media::MAX_IMAGES;

/// A failed compose or submit step. Any of these aborts the whole submit.
#[derive(Debug, Error)]
pub enum ComposeError {
    /// No authenticated session is available
    #[error("Not logged in")]
    NotLoggedIn,

    /// The post text is over the grapheme limit
    #[error("Too long")]
    TooLong {
        /// Grapheme count of the rejected text
        length: usize,
    },

    /// The attachment list is already full
    #[error("You can attach at most {} images", MAX_IMAGES)]
    TooManyImages,

    /// An attachment index that does not exist
    #[error("No image at position {0}")]
    NoSuchImage(usize),

    /// A file that could not be read as an image
    #[error("Not a supported image: {0}")]
    InvalidImage(String),

    /// Decoding, resizing or re-encoding an image failed
    #[error("Failed to resize: {0}")]
    Resize(String),

    /// A blob upload was rejected or never completed
    #[error("Failed to upload image")]
    Upload(#[source] anyhow::Error),

    /// Creating the post record failed
    #[error("Failed to post: {0}")]
    Post(#[source] anyhow::Error),

    /// Reading an image from disk failed
    #[error("Could not read image: {0}")]
    Io(#[from] std::io::Error),
}

impl ComposeError {
    /// Longer explanation shown alongside the banner, when there is one
    pub fn detail(&self) -> Option<String> {
        match self {
            Self::TooLong { .. } => Some(format!(
                "There is a character limit of {MAX_LENGTH} characters"
            )),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_banner_messages() {
        assert_eq!(ComposeError::NotLoggedIn.to_string(), "Not logged in");
        assert_eq!(ComposeError::TooLong { length: 301 }.to_string(), "Too long");
        assert_eq!(
            ComposeError::Resize("bad header".into()).to_string(),
            "Failed to resize: bad header"
        );
        assert_eq!(
            ComposeError::Upload(anyhow::anyhow!("500")).to_string(),
            "Failed to upload image"
        );
    }

    #[test]
    fn test_too_long_detail() {
        let detail = ComposeError::TooLong { length: 400 }.detail().unwrap();
        assert!(detail.contains("300"));
        assert!(ComposeError::NotLoggedIn.detail().is_none());
    }
}
