//! Application state

use anyhow::Result;
use std::time::{Duration, Instant};
use uuid::Uuid;

use super::async_ops::AsyncCommand;
use crate::compose::{Composer, locale};
use crate::config::Config;
use crate::db::Database;
use crate::error::ComposeError;
use crate::media::ImageAsset;
use crate::models::{Account, DraftImage, SavedDraft};
use crate::richtext::{FacetCache, RichText};
use crate::theme::Theme;

/// Current input mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Typing the post
    #[default]
    Editing,
    /// Typing the path of an image to attach
    AttachPath,
    /// Editing the caption of an image
    AltText {
        /// Attachment being captioned
        index: usize,
    },
    /// Esc pressed on a non-empty draft
    CancelMenu,
    /// Browsing saved drafts
    Drafts,
    /// Theme picker popup
    ThemePicker,
    /// Help popup
    Help,
}

/// Entries of the cancel menu
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelChoice {
    /// Park the draft in the database
    SaveDraft,
    /// Throw the draft away
    Discard,
    /// Close the menu
    KeepEditing,
}

impl CancelChoice {
    /// Menu order
    pub const ALL: [Self; 3] = [Self::SaveDraft, Self::Discard, Self::KeepEditing];

    /// Menu text
    pub fn label(&self) -> &'static str {
        match self {
            Self::SaveDraft => "Save to drafts",
            Self::Discard => "Discard",
            Self::KeepEditing => "Keep editing",
        }
    }
}

/// Application state
pub struct AppState {
    /// Configuration
    pub config: Config,
    /// Database connection
    pub db: Database,
    /// Whether to quit
    pub should_quit: bool,
    /// Current theme
    pub theme: Theme,
    /// Current mode
    pub mode: Mode,

    /// Account posts are sent from
    pub account: Option<Account>,
    /// Handle of the live session, once logged in
    pub session_handle: Option<String>,

    /// The draft being written
    pub composer: Composer,
    /// Image the caption/remove keys act on
    pub selected_image: usize,
    /// Line editor for the path and caption prompts
    pub input: String,

    /// Highlighted cancel menu entry
    pub cancel_index: usize,
    /// Saved drafts (loaded when the list opens)
    pub drafts: Vec<SavedDraft>,
    /// Highlighted draft
    pub draft_index: usize,
    /// Saved draft the composer was loaded from
    pub loaded_draft: Option<Uuid>,

    /// Detected rich text by text, shared with the worker
    pub facet_cache: FacetCache,
    /// When the text last changed without a detection being requested
    facets_dirty_since: Option<Instant>,

    /// Theme picker selected index
    pub theme_picker_index: usize,
    /// Status message (bottom bar)
    pub status: String,

    /// Tick counter for animations
    tick: u64,
}

impl AppState {
    /// Create a new app state
    pub fn new(config: Config, db: Database) -> Result<Self> {
        let theme = config.theme;
        let account = db.get_default_account()?;

        Ok(Self {
            config,
            db,
            should_quit: false,
            theme,
            mode: Mode::Editing,
            account,
            session_handle: None,
            composer: Composer::new(),
            selected_image: 0,
            input: String::new(),
            cancel_index: 0,
            drafts: Vec::new(),
            draft_index: 0,
            loaded_draft: None,
            facet_cache: FacetCache::new(),
            facets_dirty_since: None,
            theme_picker_index: 0,
            status: String::new(),
            tick: 0,
        })
    }

    /// Tick for animations
    pub fn tick(&mut self) {
        self.tick = self.tick.wrapping_add(1);
    }

    /// Get current tick
    pub fn current_tick(&self) -> u64 {
        self.tick
    }

    /// Set status message
    pub fn set_status(&mut self, msg: impl Into<String>) {
        self.status = msg.into();
    }

    // ==================== Text ====================

    /// Call after every edit of the text
    pub fn text_changed(&mut self) {
        if let Some(cached) = self.facet_cache.get(self.composer.text()) {
            self.composer.apply_rich_text(cached);
            self.facets_dirty_since = None;
        } else {
            self.facets_dirty_since = Some(Instant::now());
        }
    }

    /// Text whose facets should be detected now, once the debounce elapsed
    pub fn due_facet_request(&mut self, now: Instant) -> Option<String> {
        let since = self.facets_dirty_since?;
        if now.duration_since(since) < Duration::from_millis(self.config.facet_debounce_ms) {
            return None;
        }
        self.facets_dirty_since = None;
        if self.composer.text().is_empty() {
            return None;
        }
        // Highlight right away; the worker result adds resolved mentions
        self.composer
            .apply_rich_text(RichText::new(self.composer.text()).with_local_facets());
        Some(self.composer.text().to_string())
    }

    /// Install a detection result from the worker
    pub fn apply_detected(&mut self, rich_text: RichText) {
        self.facet_cache.insert(rich_text.clone());
        self.composer.apply_rich_text(rich_text);
    }

    // ==================== Images ====================

    /// Attach the image at `path`
    pub fn attach_image(&mut self, path: &str) -> Result<(), ComposeError> {
        let path = expand_home(path.trim());
        let asset = ImageAsset::open(&path)?;
        self.selected_image = self.composer.attachments.add(asset)?;
        Ok(())
    }

    /// Remove the selected image
    pub fn remove_selected_image(&mut self) {
        if self
            .composer
            .attachments
            .remove(self.selected_image)
            .is_ok()
        {
            self.selected_image = self
                .selected_image
                .min(self.composer.attachments.len().saturating_sub(1));
        }
    }

    /// Select the next image
    pub fn select_next_image(&mut self) {
        let len = self.composer.attachments.len();
        if len > 0 {
            self.selected_image = (self.selected_image + 1).min(len - 1);
        }
    }

    /// Select the previous image
    pub fn select_prev_image(&mut self) {
        self.selected_image = self.selected_image.saturating_sub(1);
    }

    /// Open the caption prompt for the selected image
    pub fn open_alt_editor(&mut self) {
        if let Some(attachment) = self.composer.attachments.get(self.selected_image) {
            self.input = attachment.alt_text().to_string();
            self.mode = Mode::AltText {
                index: self.selected_image,
            };
        }
    }

    // ==================== Drafts ====================

    /// Snapshot the composer into a saved draft, keeping the id of the
    /// draft it was loaded from
    pub fn save_draft(&mut self) -> Result<()> {
        let images = self
            .composer
            .attachments
            .iter()
            .map(|a| DraftImage {
                path: a.asset.path.clone(),
                alt: a.alt.clone(),
            })
            .collect();

        let mut draft = SavedDraft::new(self.composer.text(), images);
        if let Some(id) = self.loaded_draft
            && let Some(existing) = self.db.get_draft(id)?
        {
            draft.id = existing.id;
            draft.created_at = existing.created_at;
        }
        self.db.save_draft(&draft)?;
        tracing::debug!("Saved draft {}", draft.id);

        self.discard();
        self.set_status("Saved to drafts");
        Ok(())
    }

    /// Reload the drafts list
    pub fn refresh_drafts(&mut self) -> Result<()> {
        self.drafts = self.db.get_drafts()?;
        self.draft_index = self
            .draft_index
            .min(self.drafts.len().saturating_sub(1));
        Ok(())
    }

    /// Replace the composer contents with the highlighted draft
    pub fn load_selected_draft(&mut self) {
        let Some(draft) = self.drafts.get(self.draft_index).cloned() else {
            return;
        };

        self.composer.reset();
        self.composer.set_text(draft.text.as_str());
        let mut missing = 0;
        for image in &draft.images {
            match ImageAsset::open(&image.path) {
                Ok(asset) => {
                    if let Err(e) = self.composer.attachments.add_with_alt(asset, image.alt.clone()) {
                        tracing::warn!("Skipping draft image {}: {}", image.path.display(), e);
                    }
                }
                Err(e) => {
                    tracing::warn!("Draft image {} unavailable: {}", image.path.display(), e);
                    missing += 1;
                }
            }
        }

        self.selected_image = 0;
        self.loaded_draft = Some(draft.id);
        self.mode = Mode::Editing;
        self.text_changed();
        if missing > 0 {
            self.set_status(format!("Draft loaded, {missing} image(s) missing"));
        } else {
            self.set_status("Draft loaded");
        }
    }

    /// Delete the highlighted draft
    pub fn delete_selected_draft(&mut self) -> Result<()> {
        if let Some(draft) = self.drafts.get(self.draft_index) {
            let id = draft.id;
            self.db.delete_draft(id)?;
            if self.loaded_draft == Some(id) {
                self.loaded_draft = None;
            }
            self.refresh_drafts()?;
        }
        Ok(())
    }

    /// Throw the draft away
    pub fn discard(&mut self) {
        self.composer.reset();
        self.selected_image = 0;
        self.loaded_draft = None;
        self.facets_dirty_since = None;
        self.mode = Mode::Editing;
    }

    // ==================== Posting ====================

    /// Start a submit, if the draft can be posted
    pub fn submit_command(&mut self) -> Option<AsyncCommand> {
        if !self.composer.can_post() {
            return None;
        }
        self.composer.sending = true;
        Some(AsyncCommand::Submit {
            request: self.composer.request(locale::post_languages(&self.config)),
            opts: self.config.compress_options(),
        })
    }

    /// The worker published the post
    pub fn on_posted(&mut self, url: &str) {
        tracing::info!("Posted {}", url);

        if let Some(account) = &self.account
            && let Err(e) = self.db.update_account_last_used(account.id)
        {
            tracing::warn!("Failed to update last used: {}", e);
        }
        if let Some(id) = self.loaded_draft
            && let Err(e) = self.db.delete_draft(id)
        {
            tracing::warn!("Failed to delete posted draft: {}", e);
        }

        self.discard();
        self.set_status("Posted");
    }

    /// The worker failed to publish the post
    pub fn on_post_failed(&mut self, error: &ComposeError) {
        self.composer.fail(error);
        self.status.clear();
    }
}

/// Expand a leading `~/` to the home directory
fn expand_home(path: &str) -> std::path::PathBuf {
    if let Some(rest) = path.strip_prefix("~/")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(rest);
    }
    std::path::PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};
    use tempfile::{TempDir, tempdir};

    fn state() -> (TempDir, AppState) {
        let dir = tempdir().unwrap();
        let db = Database::open_path(&dir.path().join("test.sqlite")).unwrap();
        let config = Config {
            facet_debounce_ms: 0,
            ..Config::default()
        };
        (dir, AppState::new(config, db).unwrap())
    }

    fn png(dir: &TempDir, name: &str) -> String {
        let path = dir.path().join(name);
        RgbImage::from_pixel(4, 4, Rgb([1, 2, 3])).save(&path).unwrap();
        path.to_string_lossy().to_string()
    }

    #[test]
    fn test_attach_and_remove() {
        let (dir, mut state) = state();
        for i in 0..4 {
            state.attach_image(&png(&dir, &format!("{i}.png"))).unwrap();
        }
        assert_eq!(state.selected_image, 3);
        let err = state.attach_image(&png(&dir, "5.png")).unwrap_err();
        assert!(matches!(err, ComposeError::TooManyImages));

        state.remove_selected_image();
        assert_eq!(state.composer.attachments.len(), 3);
        assert_eq!(state.selected_image, 2);
    }

    #[test]
    fn test_attach_missing_file() {
        let (_dir, mut state) = state();
        assert!(state.attach_image("/definitely/not/here.png").is_err());
        assert!(state.composer.attachments.is_empty());
    }

    #[test]
    fn test_debounced_facet_request() {
        let (_dir, mut state) = state();
        state.composer.set_text("#rust");
        state.text_changed();

        let text = state.due_facet_request(Instant::now()).unwrap();
        assert_eq!(text, "#rust");
        assert_eq!(state.composer.rich_text().facets.len(), 1);
        assert!(state.due_facet_request(Instant::now()).is_none());
    }

    #[test]
    fn test_cached_facets_skip_request() {
        let (_dir, mut state) = state();
        state.apply_detected(RichText::new("#cached").with_local_facets());

        state.composer.set_text("#cached");
        state.text_changed();
        assert_eq!(state.composer.rich_text().facets.len(), 1);
        assert!(state.due_facet_request(Instant::now()).is_none());
    }

    #[test]
    fn test_save_and_load_draft() {
        let (dir, mut state) = state();
        state.composer.set_text("later");
        state.attach_image(&png(&dir, "a.png")).unwrap();
        state.composer.attachments.set_alt(0, "a dot").unwrap();

        state.save_draft().unwrap();
        assert!(state.composer.is_empty());

        state.refresh_drafts().unwrap();
        assert_eq!(state.drafts.len(), 1);
        state.load_selected_draft();
        assert_eq!(state.composer.text(), "later");
        assert_eq!(state.composer.attachments.get(0).unwrap().alt_text(), "a dot");
        let id = state.loaded_draft.unwrap();

        // Saving again updates the same draft
        state.composer.insert_char('!');
        state.save_draft().unwrap();
        state.refresh_drafts().unwrap();
        assert_eq!(state.drafts.len(), 1);
        assert_eq!(state.drafts[0].id, id);
        assert_eq!(state.drafts[0].text, "later!");
    }

    #[test]
    fn test_posted_deletes_loaded_draft() {
        let (_dir, mut state) = state();
        state.composer.set_text("ship it");
        state.save_draft().unwrap();
        state.refresh_drafts().unwrap();
        state.load_selected_draft();

        let cmd = state.submit_command();
        assert!(matches!(cmd, Some(AsyncCommand::Submit { .. })));
        assert!(state.submit_command().is_none());

        state.on_posted("https://bsky.app/profile/me/post/1");
        assert_eq!(state.status, "Posted");
        assert!(state.composer.is_empty());
        assert!(state.db.get_drafts().unwrap().is_empty());
    }

    #[test]
    fn test_failed_post_keeps_text() {
        let (_dir, mut state) = state();
        state.composer.set_text("oops");
        let _ = state.submit_command();
        state.on_post_failed(&ComposeError::NotLoggedIn);
        assert_eq!(state.composer.text(), "oops");
        assert!(state.composer.error().is_some());
        assert!(state.composer.can_post());
    }
}
