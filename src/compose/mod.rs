//! The post composer: editable draft state and the submit flow.
//!
//! [`Composer`] holds what the user is writing. [`submit`] turns a snapshot
//! of it into a published post: facets are resolved, images are compressed
//! and uploaded, and the record is created.

pub mod locale;
mod submit;

pub use submit::{SubmitOutcome, SubmitRequest, submit};

use unicode_segmentation::UnicodeSegmentation;

use crate::error::ComposeError;
use crate::media::Attachments;
use crate::richtext::RichText;

/// Maximum post length, in graphemes
pub const MAX_LENGTH: usize = 300;

/// Fraction of [`MAX_LENGTH`] above which the counter is shown
pub const COUNTER_THRESHOLD: f64 = 0.66;

/// A submit error as shown in the banner
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposeFailure {
    /// Banner headline
    pub message: String,
    /// Optional second line
    pub detail: Option<String>,
}

impl From<&ComposeError> for ComposeFailure {
    fn from(err: &ComposeError) -> Self {
        Self {
            message: err.to_string(),
            detail: err.detail(),
        }
    }
}

/// State of the compose screen
#[derive(Debug, Default)]
pub struct Composer {
    text: String,
    /// Attached images
    pub attachments: Attachments,
    rich_text: RichText,
    error: Option<ComposeFailure>,
    /// Whether a submit is in flight
    pub sending: bool,
}

impl Composer {
    /// An empty composer
    pub fn new() -> Self {
        Self::default()
    }

    /// Current text
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Last detected rich text. May lag behind [`Self::text`] while a
    /// detection is pending.
    pub const fn rich_text(&self) -> &RichText {
        &self.rich_text
    }

    /// Error of the last failed submit
    pub const fn error(&self) -> Option<&ComposeFailure> {
        self.error.as_ref()
    }

    /// Replace the whole text
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
        self.edited();
    }

    /// Type a character
    pub fn insert_char(&mut self, c: char) {
        self.text.push(c);
        self.edited();
    }

    /// Start a new line
    pub fn insert_newline(&mut self) {
        self.insert_char('\n');
    }

    /// Delete the last grapheme
    pub fn backspace(&mut self) {
        if let Some((start, _)) = self.text.grapheme_indices(true).next_back() {
            self.text.truncate(start);
        }
        self.edited();
    }

    fn edited(&mut self) {
        self.error = None;
        if self.text.is_empty() {
            self.rich_text = RichText::default();
        }
    }

    /// Install a detection result. Results for text that has since changed
    /// are dropped; returns whether it was applied.
    pub fn apply_rich_text(&mut self, rich_text: RichText) -> bool {
        if rich_text.text != self.text {
            return false;
        }
        self.rich_text = rich_text;
        true
    }

    /// Length of the text in graphemes
    pub fn grapheme_length(&self) -> usize {
        self.text.graphemes(true).count()
    }

    /// Whether the text is over [`MAX_LENGTH`]
    pub fn is_too_long(&self) -> bool {
        self.grapheme_length() > MAX_LENGTH
    }

    /// Whether the length counter should be visible
    pub fn show_counter(&self) -> bool {
        self.grapheme_length() as f64 > MAX_LENGTH as f64 * COUNTER_THRESHOLD
    }

    /// Counter text, e.g. `201 / 300`
    pub fn counter_label(&self) -> String {
        format!("{} / {}", self.grapheme_length(), MAX_LENGTH)
    }

    /// No text (ignoring whitespace) and no images
    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty() && self.attachments.is_empty()
    }

    /// Whether the Post action is enabled
    pub fn can_post(&self) -> bool {
        !self.is_empty() && !self.sending
    }

    /// Snapshot for [`submit`]
    pub fn request(&self, langs: Vec<String>) -> SubmitRequest {
        SubmitRequest {
            text: self.text.clone(),
            images: self.attachments.to_vec(),
            langs,
        }
    }

    /// Record a failed submit
    pub fn fail(&mut self, err: &ComposeError) {
        self.sending = false;
        self.error = Some(err.into());
    }

    /// Back to an empty draft
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_typing_clears_error() {
        let mut composer = Composer::new();
        composer.fail(&ComposeError::NotLoggedIn);
        assert_eq!(composer.error().unwrap().message, "Not logged in");

        composer.insert_char('a');
        assert!(composer.error().is_none());
        assert_eq!(composer.text(), "a");
    }

    #[test]
    fn test_backspace_removes_whole_grapheme() {
        let mut composer = Composer::new();
        composer.set_text("hi 👋🏽");
        composer.backspace();
        assert_eq!(composer.text(), "hi ");
        composer.set_text("");
        composer.backspace();
        assert_eq!(composer.text(), "");
    }

    #[test]
    fn test_counter_threshold() {
        let mut composer = Composer::new();
        composer.set_text("a".repeat(198));
        assert!(!composer.show_counter());
        composer.insert_char('a');
        assert!(composer.show_counter());
        assert_eq!(composer.counter_label(), "199 / 300");
        assert!(!composer.is_too_long());

        composer.set_text("a".repeat(301));
        assert!(composer.is_too_long());
    }

    #[test]
    fn test_emoji_counts_once() {
        let mut composer = Composer::new();
        composer.set_text("👨‍👩‍👧".repeat(MAX_LENGTH));
        assert_eq!(composer.grapheme_length(), MAX_LENGTH);
        assert!(!composer.is_too_long());
    }

    #[test]
    fn test_whitespace_only_is_empty() {
        let mut composer = Composer::new();
        composer.set_text("  \n ");
        assert!(composer.is_empty());
        assert!(!composer.can_post());

        composer.set_text("hello");
        assert!(composer.can_post());
        composer.sending = true;
        assert!(!composer.can_post());
    }

    #[test]
    fn test_stale_rich_text_is_ignored() {
        let mut composer = Composer::new();
        composer.set_text("#one");
        let stale = RichText::new("#one").with_local_facets();
        composer.insert_char('!');

        assert!(!composer.apply_rich_text(stale));
        assert!(composer.rich_text().facets.is_empty());

        let fresh = RichText::new("#one!").with_local_facets();
        assert!(composer.apply_rich_text(fresh));
        assert_eq!(composer.rich_text().facets.len(), 1);
    }

    #[test]
    fn test_too_long_failure_has_detail() {
        let mut composer = Composer::new();
        composer.sending = true;
        composer.fail(&ComposeError::TooLong { length: 320 });
        let failure = composer.error().unwrap();
        assert_eq!(failure.message, "Too long");
        assert!(failure.detail.as_deref().unwrap().contains("300"));
        assert!(!composer.sending);

        composer.reset();
        assert!(composer.error().is_none());
        assert!(composer.is_empty());
    }
}
