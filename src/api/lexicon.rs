//! Record types sent to and received from the PDS.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::richtext::Facet;

/// NSID of post records
pub const POST_COLLECTION: &str = "app.bsky.feed.post";

/// Reference to an uploaded blob, as returned by `uploadBlob`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlobRef {
    /// Always `blob`
    #[serde(rename = "$type", default = "blob_type")]
    pub r#type: String,
    /// Content identifier of the blob
    #[serde(rename = "ref")]
    pub link: CidLink,
    /// MIME type the blob was uploaded with
    #[serde(rename = "mimeType")]
    pub mime_type: String,
    /// Size in bytes
    pub size: u64,
}

fn blob_type() -> String {
    "blob".to_string()
}

/// A `{"$link": cid}` object
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CidLink {
    /// The CID
    #[serde(rename = "$link")]
    pub link: String,
}

/// Width and height hint for an embedded image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AspectRatio {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

/// One image of an `app.bsky.embed.images` embed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbedImage {
    /// The uploaded blob
    pub image: BlobRef,
    /// Caption, empty when none was written
    pub alt: String,
    /// Dimensions of the uploaded image
    #[serde(rename = "aspectRatio", skip_serializing_if = "Option::is_none", default)]
    pub aspect_ratio: Option<AspectRatio>,
}

/// Post embeds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "$type")]
pub enum Embed {
    /// Up to four images
    #[serde(rename = "app.bsky.embed.images")]
    Images {
        /// Images in display order
        images: Vec<EmbedImage>,
    },
}

/// An `app.bsky.feed.post` record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostRecord {
    /// Always `app.bsky.feed.post`
    #[serde(rename = "$type")]
    pub r#type: String,
    /// Post text
    pub text: String,
    /// Rich text annotations
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub facets: Option<Vec<Facet>>,
    /// Attached media
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub embed: Option<Embed>,
    /// Languages the text is written in
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub langs: Vec<String>,
    /// Creation timestamp (RFC 3339, millisecond precision)
    #[serde(rename = "createdAt")]
    pub created_at: String,
}

impl PostRecord {
    /// Build a record timestamped now
    pub fn new(
        text: String,
        facets: Option<Vec<Facet>>,
        embed: Option<Embed>,
        langs: Vec<String>,
    ) -> Self {
        Self {
            r#type: POST_COLLECTION.to_string(),
            text,
            facets,
            embed,
            langs,
            created_at: Utc::now().format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string(),
        }
    }

    /// Images embedded in this record
    pub fn images(&self) -> &[EmbedImage] {
        match &self.embed {
            Some(Embed::Images { images }) => images,
            None => &[],
        }
    }
}

/// The created record's address
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CreatedPost {
    /// `at://` URI of the record
    pub uri: String,
    /// Content identifier of the record
    pub cid: String,
}

impl CreatedPost {
    /// Record key (last path segment of the URI)
    pub fn rkey(&self) -> &str {
        self.uri.rsplit('/').next().unwrap_or(&self.uri)
    }

    /// Web URL of the post on bsky.app
    pub fn web_url(&self, handle: &str) -> String {
        super::bluesky::post_url(handle, &self.uri)
    }
}
