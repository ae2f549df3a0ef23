//! # Plume 🪶
//!
//! Compose and publish Bluesky posts from the terminal.
//!
//! ## Overview
//!
//! Plume is a post composer for Bluesky. It highlights mentions, links and
//! hashtags as you type, attaches up to four captioned images, shrinks large
//! images on the client before upload and publishes the post with resolved
//! rich-text facets.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                          App                                │
//! │   Composer screen, key handling, async worker over mpsc     │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!          ┌───────────────────┼───────────────────┐
//!          ▼                   ▼                   ▼
//! ┌─────────────────┐ ┌─────────────────┐ ┌─────────────────┐
//! │    Compose      │ │    Richtext     │ │      Media      │
//! │                 │ │                 │ │                 │
//! │ • Draft state   │ │ • Facet detect  │ │ • Attachments   │
//! │ • Length rules  │ │ • Mention DIDs  │ │ • Resize        │
//! │ • Submit flow   │ │ • Facet cache   │ │ • JPEG steps    │
//! └─────────────────┘ └─────────────────┘ └─────────────────┘
//!          │                   │                   │
//!          └───────────────────┴───────────────────┘
//!                              │
//!          ┌───────────────────┼───────────────────┐
//!          ▼                   ▼                   ▼
//! ┌─────────────────┐ ┌─────────────────┐ ┌─────────────────┐
//! │       API       │ │    Database     │ │      Auth       │
//! │                 │ │                 │ │                 │
//! │ • Session       │ │ • Accounts      │ │ • App passwords │
//! │ • uploadBlob    │ │ • Drafts        │ │ • AES-GCM file  │
//! │ • createRecord  │ │                 │ │                 │
//! └─────────────────┘ └─────────────────┘ └─────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`api`] — Bluesky XRPC client and the traits the composer talks through
//! - [`app`] — TUI state and event loop
//! - [`auth`] — Encrypted app password storage
//! - [`compose`] — Composer state and the submit flow
//! - [`config`] — Configuration management
//! - [`db`] — `SQLite` database for accounts and drafts
//! - [`error`] — Errors shown by the composer
//! - [`media`] — Image attachments and compression
//! - [`models`] — Data models (Account, `SavedDraft`)
//! - [`richtext`] — Facet detection
//! - [`theme`] — Theme support via ratatui-themes
//!
//! ## Example
//!
//! ```no_run
//! use plume::app;
//!
//! fn main() -> anyhow::Result<()> {
//!     app::run()
//! }
//! ```

#![doc(html_root_url = "https://docs.rs/plume/0.1.0")]
#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![allow(clippy::unused_async)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::option_if_let_else)]
#![allow(clippy::if_not_else)]
#![allow(clippy::single_match_else)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::trivially_copy_pass_by_ref)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::use_self)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::should_implement_trait)]
#![allow(clippy::struct_excessive_bools)]
#![allow(clippy::similar_names)]
#![allow(clippy::if_same_then_else)]
#![allow(clippy::manual_let_else)]
#![allow(clippy::branches_sharing_code)]
#![allow(clippy::wrong_self_convention)]
#![allow(clippy::return_self_not_must_use)]

pub mod api;
pub mod app;
pub mod auth;
pub mod compose;
pub mod config;
pub mod db;
pub mod error;
pub mod media;
pub mod models;
pub mod paths;
pub mod richtext;
pub mod theme;

// Re-export main types for convenience
pub use app::AppState;
pub use compose::{Composer, SubmitOutcome, SubmitRequest, submit};
pub use config::Config;
pub use db::Database;
pub use error::ComposeError;
pub use models::{Account, DraftImage, SavedDraft};
pub use richtext::RichText;
pub use theme::{Theme, ThemeColors};

// Re-export theme types from ratatui-themes crate
pub use ratatui_themes::{ThemeName, ThemePalette};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
