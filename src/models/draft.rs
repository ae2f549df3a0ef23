//! Saved drafts (compose sessions parked for later)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use uuid::Uuid;

/// An image reference kept with a saved draft
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftImage {
    /// Source file on disk
    pub path: PathBuf,
    /// Caption (alt text)
    #[serde(default)]
    pub alt: Option<String>,
}

/// A draft saved from the composer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedDraft {
    /// Unique identifier
    pub id: Uuid,
    /// Draft text
    pub text: String,
    /// Attached images
    pub images: Vec<DraftImage>,
    /// When the draft was first saved
    pub created_at: DateTime<Utc>,
    /// When the draft was last saved
    pub updated_at: DateTime<Utc>,
}

impl SavedDraft {
    /// Create a new draft
    pub fn new(text: &str, images: Vec<DraftImage>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            text: text.to_string(),
            images,
            created_at: now,
            updated_at: now,
        }
    }

    /// Get a short single-line preview of the text
    pub fn preview(&self, max_chars: usize) -> String {
        let content = self.text.replace('\n', " ");
        if content.chars().count() <= max_chars {
            content
        } else {
            let cut: String = content.chars().take(max_chars.saturating_sub(3)).collect();
            format!("{cut}...")
        }
    }
}
