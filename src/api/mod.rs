//! Bluesky API client and the traits the compose flow talks through

pub mod bluesky;
mod lexicon;

pub use lexicon::{
    AspectRatio, BlobRef, CidLink, CreatedPost, Embed, EmbedImage, POST_COLLECTION, PostRecord,
};

use anyhow::Result;

use crate::models::Account;

/// Resolves handles (`alice.bsky.social`) to DIDs
#[allow(async_fn_in_trait)]
pub trait HandleResolver {
    /// Resolve a handle to its DID
    async fn resolve_handle(&self, handle: &str) -> Result<String>;
}

/// Everything the composer needs from an authenticated agent
#[allow(async_fn_in_trait)]
pub trait ComposeApi: HandleResolver {
    /// Whether the agent holds a session
    fn has_session(&self) -> bool;

    /// Upload binary data, returning a reference to embed in records
    async fn upload_blob(&self, bytes: Vec<u8>, mime_type: &str) -> Result<BlobRef>;

    /// Create a post record in the session's repository
    async fn create_post(&self, record: &PostRecord) -> Result<CreatedPost>;
}

/// Log in as `account` with its stored app password
pub async fn get_client(account: &Account, app_password: &str) -> Result<bluesky::BlueskyClient> {
    bluesky::BlueskyClient::login_with_pds(&account.handle, app_password, &account.pds_url).await
}
