//! Account model for stored Bluesky identities

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::bluesky::DEFAULT_PDS_URL;

/// A stored Bluesky account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    /// Unique identifier
    pub id: Uuid,
    /// Decentralized identifier (did:plc:... or did:web:...)
    pub did: String,
    /// Handle (e.g., user.bsky.social)
    pub handle: String,
    /// Display name (for UI)
    pub display_name: String,
    /// PDS URL hosting the account
    pub pds_url: String,
    /// Whether this is the account used when composing
    pub is_default: bool,
    /// Avatar URL (cached)
    pub avatar_url: Option<String>,
    /// When the account was added
    pub created_at: DateTime<Utc>,
    /// Last time a post was sent from this account
    pub last_used_at: Option<DateTime<Utc>>,
}

impl Account {
    /// Create a new account hosted on `pds_url`
    pub fn new(handle: &str, did: &str, display_name: &str, pds_url: &str) -> Self {
        let pds_url = if pds_url.is_empty() {
            DEFAULT_PDS_URL
        } else {
            pds_url
        };

        Self {
            id: Uuid::new_v4(),
            did: did.to_string(),
            handle: handle.trim_start_matches('@').to_string(),
            display_name: display_name.to_string(),
            pds_url: pds_url.trim_end_matches('/').to_string(),
            is_default: false,
            avatar_url: None,
            created_at: Utc::now(),
            last_used_at: None,
        }
    }

    /// Handle with a leading `@`
    pub fn full_handle(&self) -> String {
        format!("@{}", self.handle)
    }

    /// Display name, falling back to the handle
    pub fn name(&self) -> &str {
        if self.display_name.is_empty() {
            &self.handle
        } else {
            &self.display_name
        }
    }

    /// Get the key for storing credentials
    pub fn keyring_key(&self) -> String {
        format!("plume:bluesky:{}", self.id)
    }
}
