//! Data models for Plume

mod account;
mod draft;

pub use account::Account;
pub use draft::{DraftImage, SavedDraft};
