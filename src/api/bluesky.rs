//! Bluesky (AT Protocol) API client

use anyhow::{Context, Result, bail};
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};

use super::{BlobRef, ComposeApi, CreatedPost, HandleResolver, POST_COLLECTION, PostRecord};

/// Default PDS URL for Bluesky
pub const DEFAULT_PDS_URL: &str = "https://bsky.social";

/// Web URL on bsky.app for the record at `uri`
pub fn post_url(handle: &str, uri: &str) -> String {
    let rkey = uri.rsplit('/').next().unwrap_or(uri);
    format!("https://bsky.app/profile/{handle}/post/{rkey}")
}

/// Bluesky API client
pub struct BlueskyClient {
    client: Client,
    pds_url: String,
    access_jwt: String,
    did: String,
    handle: String,
}

/// Public profile of an account
#[derive(Debug, Clone, Deserialize)]
pub struct Profile {
    /// Account DID
    pub did: String,
    /// Current handle
    pub handle: String,
    /// Display name
    #[serde(rename = "displayName")]
    pub display_name: Option<String>,
    /// Avatar URL
    pub avatar: Option<String>,
}

impl BlueskyClient {
    /// Login to Bluesky using the default PDS
    pub async fn login(handle: &str, app_password: &str) -> Result<Self> {
        Self::login_with_pds(handle, app_password, DEFAULT_PDS_URL).await
    }

    /// Login to Bluesky with a custom PDS URL
    pub async fn login_with_pds(handle: &str, app_password: &str, pds_url: &str) -> Result<Self> {
        let client = Client::new();
        let pds_url = pds_url.trim_end_matches('/').to_string();

        let url = format!("{}/xrpc/com.atproto.server.createSession", pds_url);

        let request = CreateSessionRequest {
            identifier: handle.trim_start_matches('@').to_string(),
            password: app_password.to_string(),
        };

        let response = client
            .post(&url)
            .json(&request)
            .send()
            .await
            .context("Failed to login to Bluesky")?;
        let response = ensure_success(response, "Bluesky login failed").await?;

        let session: CreateSessionResponse = response
            .json()
            .await
            .context("Failed to parse login response")?;

        tracing::info!("Logged in as {} ({})", session.handle, session.did);

        Ok(Self {
            client,
            pds_url,
            access_jwt: session.access_jwt,
            did: session.did,
            handle: session.handle,
        })
    }

    /// Create a new client with an existing session
    pub fn new(pds_url: &str, access_jwt: &str, did: &str, handle: &str) -> Self {
        Self {
            client: Client::new(),
            pds_url: pds_url.trim_end_matches('/').to_string(),
            access_jwt: access_jwt.to_string(),
            did: did.to_string(),
            handle: handle.to_string(),
        }
    }

    /// A client with no session. It can resolve handles but not write.
    pub fn anonymous(pds_url: &str) -> Self {
        Self::new(pds_url, "", "", "")
    }

    /// DID of the logged in account
    pub fn did(&self) -> &str {
        &self.did
    }

    /// Handle of the logged in account
    pub fn handle(&self) -> &str {
        &self.handle
    }

    /// PDS the session lives on
    pub fn pds_url(&self) -> &str {
        &self.pds_url
    }

    /// Fetch the profile of the logged in account
    pub async fn get_profile(&self) -> Result<Profile> {
        let url = format!(
            "{}/xrpc/app.bsky.actor.getProfile?actor={}",
            self.pds_url,
            urlencoding::encode(&self.did)
        );

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.access_jwt)
            .send()
            .await
            .context("Failed to get profile")?;
        let response = ensure_success(response, "Failed to get profile").await?;

        response
            .json()
            .await
            .context("Failed to parse profile response")
    }
}

impl HandleResolver for BlueskyClient {
    async fn resolve_handle(&self, handle: &str) -> Result<String> {
        let url = format!(
            "{}/xrpc/com.atproto.identity.resolveHandle?handle={}",
            self.pds_url,
            urlencoding::encode(handle)
        );

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .context("Failed to resolve handle")?;
        let response = ensure_success(response, "Failed to resolve handle").await?;

        let resolved: ResolveHandleResponse = response
            .json()
            .await
            .context("Failed to parse resolveHandle response")?;

        Ok(resolved.did)
    }
}

impl ComposeApi for BlueskyClient {
    fn has_session(&self) -> bool {
        !self.access_jwt.is_empty() && !self.did.is_empty()
    }

    async fn upload_blob(&self, bytes: Vec<u8>, mime_type: &str) -> Result<BlobRef> {
        let url = format!("{}/xrpc/com.atproto.repo.uploadBlob", self.pds_url);
        let size = bytes.len();

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.access_jwt)
            .header(reqwest::header::CONTENT_TYPE, mime_type)
            .body(bytes)
            .send()
            .await
            .context("Failed to upload blob")?;
        let response = ensure_success(response, "Failed to upload blob").await?;

        let uploaded: UploadBlobResponse = response
            .json()
            .await
            .context("Failed to parse uploadBlob response")?;

        tracing::debug!("Uploaded {} byte blob {}", size, uploaded.blob.link.link);
        Ok(uploaded.blob)
    }

    async fn create_post(&self, record: &PostRecord) -> Result<CreatedPost> {
        let url = format!("{}/xrpc/com.atproto.repo.createRecord", self.pds_url);

        let request = CreateRecordRequest {
            repo: &self.did,
            collection: POST_COLLECTION,
            record,
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.access_jwt)
            .json(&request)
            .send()
            .await
            .context("Failed to post")?;
        let response = ensure_success(response, "Failed to post").await?;

        response
            .json()
            .await
            .context("Failed to parse post response")
    }
}

/// Turn a non-2xx response into an error carrying the server's message
async fn ensure_success(response: Response, what: &str) -> Result<Response> {
    if response.status().is_success() {
        return Ok(response);
    }

    let status = response.status();
    let error_text = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<XrpcError>(&error_text)
        .ok()
        .and_then(|e| e.message.or(e.error))
        .unwrap_or(error_text);
    bail!("{}: {} {}", what, status.as_u16(), message)
}

// ==================== API Types ====================

#[derive(Debug, Serialize)]
struct CreateSessionRequest {
    identifier: String,
    password: String,
}

#[derive(Debug, Deserialize)]
struct CreateSessionResponse {
    #[serde(rename = "accessJwt")]
    access_jwt: String,
    did: String,
    handle: String,
}

#[derive(Debug, Deserialize)]
struct ResolveHandleResponse {
    did: String,
}

#[derive(Debug, Deserialize)]
struct UploadBlobResponse {
    blob: BlobRef,
}

#[derive(Debug, Serialize)]
struct CreateRecordRequest<'a, T> {
    repo: &'a str,
    collection: &'a str,
    record: &'a T,
}

#[derive(Debug, Deserialize)]
struct XrpcError {
    error: Option<String>,
    message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_client_has_session() {
        let client = BlueskyClient::new("https://pds.example/", "jwt", "did:plc:me", "me.test");
        assert!(client.has_session());
        assert_eq!(client.pds_url(), "https://pds.example");
        assert_eq!(client.handle(), "me.test");
    }

    #[test]
    fn test_empty_token_is_not_a_session() {
        let client = BlueskyClient::new(DEFAULT_PDS_URL, "", "did:plc:me", "me.test");
        assert!(!client.has_session());
        assert!(!BlueskyClient::anonymous(DEFAULT_PDS_URL).has_session());
    }

    #[test]
    fn test_create_record_request_shape() {
        let record = PostRecord::new("hi".into(), None, None, vec!["en".into()]);
        let request = CreateRecordRequest {
            repo: "did:plc:me",
            collection: POST_COLLECTION,
            record: &record,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["repo"], "did:plc:me");
        assert_eq!(json["collection"], "app.bsky.feed.post");
        assert_eq!(json["record"]["text"], "hi");
    }

    #[test]
    fn test_xrpc_error_parsing() {
        let err: XrpcError =
            serde_json::from_str(r#"{"error":"BlobTooLarge","message":"This file is too large"}"#)
                .unwrap();
        assert_eq!(err.message.as_deref(), Some("This file is too large"));
    }

    #[test]
    fn test_post_url() {
        assert_eq!(
            post_url("alice.bsky.social", "at://did:plc:alice/app.bsky.feed.post/3kxyz"),
            "https://bsky.app/profile/alice.bsky.social/post/3kxyz"
        );
    }
}
