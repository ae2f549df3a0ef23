//! Publishing a draft.

use futures_util::future::try_join_all;

use crate::api::{AspectRatio, ComposeApi, CreatedPost, Embed, EmbedImage, PostRecord};
use crate::error::ComposeError;
use crate::media::{Attachment, CompressOptions, prepare_for_upload};
use crate::richtext::RichText;

use super::MAX_LENGTH;

/// Everything needed to publish one post
#[derive(Debug, Clone, Default)]
pub struct SubmitRequest {
    /// Post text
    pub text: String,
    /// Images in display order
    pub images: Vec<Attachment>,
    /// Language tags for the record
    pub langs: Vec<String>,
}

/// A published post
#[derive(Debug, Clone)]
pub struct SubmitOutcome {
    /// Address of the new record
    pub post: CreatedPost,
    /// The record as sent
    pub record: PostRecord,
}

/// Publish `request` through `agent`.
///
/// Steps run in order and the first failure aborts the rest: session check,
/// facet detection, length check, image compression and upload (all images
/// at once), record creation.
pub async fn submit<A: ComposeApi>(
    agent: &A,
    request: SubmitRequest,
    opts: CompressOptions,
) -> Result<SubmitOutcome, ComposeError> {
    if !agent.has_session() {
        return Err(ComposeError::NotLoggedIn);
    }

    let mut rich_text = RichText::new(request.text);
    rich_text.detect_facets(agent).await;

    let length = rich_text.grapheme_length();
    if length > MAX_LENGTH {
        return Err(ComposeError::TooLong { length });
    }

    let embed = if request.images.is_empty() {
        None
    } else {
        let images = try_join_all(
            request
                .images
                .into_iter()
                .map(|attachment| upload_image(agent, attachment, opts)),
        )
        .await?;
        Some(Embed::Images { images })
    };

    let record = PostRecord::new(
        rich_text.text.clone(),
        rich_text.facets_for_record(),
        embed,
        request.langs,
    );

    let post = agent
        .create_post(&record)
        .await
        .map_err(ComposeError::Post)?;
    tracing::info!("Created post {}", post.uri);

    Ok(SubmitOutcome { post, record })
}

async fn upload_image<A: ComposeApi>(
    agent: &A,
    attachment: Attachment,
    opts: CompressOptions,
) -> Result<EmbedImage, ComposeError> {
    let alt = attachment.alt_text().to_string();
    let prepared = prepare_for_upload(attachment.asset, opts).await?;

    let image = agent
        .upload_blob(prepared.bytes, &prepared.mime)
        .await
        .map_err(ComposeError::Upload)?;

    Ok(EmbedImage {
        image,
        alt,
        aspect_ratio: Some(AspectRatio {
            width: prepared.width,
            height: prepared.height,
        }),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{BlobRef, CidLink, HandleResolver};
    use crate::media::ImageAsset;
    use crate::richtext::FacetFeature;
    use anyhow::{Result, bail};
    use image::{Rgb, RgbImage};
    use std::sync::Mutex;
    use tempfile::{TempDir, tempdir};

    #[derive(Default)]
    struct MockAgent {
        logged_out: bool,
        fail_uploads: bool,
        uploads: Mutex<Vec<(usize, String)>>,
        posts: Mutex<Vec<PostRecord>>,
    }

    impl HandleResolver for MockAgent {
        async fn resolve_handle(&self, handle: &str) -> Result<String> {
            match handle {
                "alice.bsky.social" => Ok("did:plc:alice".to_string()),
                _ => bail!("Unable to resolve handle"),
            }
        }
    }

    impl ComposeApi for MockAgent {
        fn has_session(&self) -> bool {
            !self.logged_out
        }

        async fn upload_blob(&self, bytes: Vec<u8>, mime_type: &str) -> Result<BlobRef> {
            if self.fail_uploads {
                bail!("500 Internal Server Error");
            }
            let size = bytes.len();
            self.uploads
                .lock()
                .unwrap()
                .push((size, mime_type.to_string()));
            Ok(BlobRef {
                r#type: "blob".to_string(),
                link: CidLink {
                    link: format!("bafk{size}"),
                },
                mime_type: mime_type.to_string(),
                size: size as u64,
            })
        }

        async fn create_post(&self, record: &PostRecord) -> Result<CreatedPost> {
            self.posts.lock().unwrap().push(record.clone());
            Ok(CreatedPost {
                uri: "at://did:plc:me/app.bsky.feed.post/3k2a".to_string(),
                cid: "bafyrecord".to_string(),
            })
        }
    }

    fn image(dir: &TempDir, name: &str, width: u32, height: u32, alt: Option<&str>) -> Attachment {
        let path = dir.path().join(name);
        RgbImage::from_fn(width, height, |x, y| Rgb([x as u8, y as u8, 128]))
            .save(&path)
            .unwrap();
        let mut attachment = Attachment::new(ImageAsset::open(&path).unwrap());
        attachment.alt = alt.map(str::to_string);
        attachment
    }

    fn request(text: &str) -> SubmitRequest {
        SubmitRequest {
            text: text.to_string(),
            images: Vec::new(),
            langs: vec!["en".to_string()],
        }
    }

    #[tokio::test]
    async fn test_requires_session() {
        let agent = MockAgent {
            logged_out: true,
            ..MockAgent::default()
        };
        let err = submit(&agent, request("hi"), CompressOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ComposeError::NotLoggedIn));
        assert!(agent.posts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_too_long_uploads_nothing() {
        let dir = tempdir().unwrap();
        let agent = MockAgent::default();
        let mut req = request(&"a".repeat(MAX_LENGTH + 1));
        req.images.push(image(&dir, "a.png", 8, 8, None));

        let err = submit(&agent, req, CompressOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ComposeError::TooLong { length: 301 }));
        assert!(agent.uploads.lock().unwrap().is_empty());
        assert!(agent.posts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_text_post_with_facets() {
        let agent = MockAgent::default();
        let outcome = submit(
            &agent,
            request("hey @alice.bsky.social and @ghost.bsky.social #rust"),
            CompressOptions::default(),
        )
        .await
        .unwrap();

        let record = &agent.posts.lock().unwrap()[0];
        assert_eq!(record, &outcome.record);
        assert!(record.embed.is_none());
        assert_eq!(record.langs, vec!["en".to_string()]);

        let facets = record.facets.as_ref().unwrap();
        assert_eq!(facets.len(), 2);
        assert_eq!(facets[0].feature(), Some(&FacetFeature::Mention {
            did: "did:plc:alice".to_string()
        }));
        assert_eq!(outcome.post.rkey(), "3k2a");
    }

    #[tokio::test]
    async fn test_images_keep_order_and_alt() {
        let dir = tempdir().unwrap();
        let agent = MockAgent::default();
        let mut req = request("two pictures");
        req.images.push(image(&dir, "wide.png", 40, 20, Some("a wide one")));
        req.images.push(image(&dir, "tall.png", 10, 30, None));

        let outcome = submit(&agent, req, CompressOptions::default())
            .await
            .unwrap();

        let images = outcome.record.images();
        assert_eq!(images.len(), 2);
        assert_eq!(images[0].alt, "a wide one");
        assert_eq!(images[1].alt, "");
        assert_eq!(
            images[0].aspect_ratio,
            Some(AspectRatio {
                width: 40,
                height: 20
            })
        );
        assert_eq!(images[1].image.mime_type, "image/png");
        assert_eq!(agent.uploads.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_oversized_image_is_recompressed() {
        let dir = tempdir().unwrap();
        let agent = MockAgent::default();
        let mut attachment = image(&dir, "big.png", 300, 100, None);
        // Unknown size always goes through the compression loop
        attachment.asset.file_size = None;
        let mut req = request("");
        req.images.push(attachment);

        let opts = CompressOptions {
            max_size: 10_000_000,
            max_dimension: 150,
        };
        let outcome = submit(&agent, req, opts).await.unwrap();

        let embedded = &outcome.record.images()[0];
        assert_eq!(embedded.image.mime_type, "image/jpeg");
        assert_eq!(
            embedded.aspect_ratio,
            Some(AspectRatio {
                width: 150,
                height: 50
            })
        );
    }

    #[tokio::test]
    async fn test_incompressible_image_uploads_original() {
        let dir = tempdir().unwrap();
        let agent = MockAgent::default();
        let mut req = request("");
        req.images.push(image(&dir, "big.png", 300, 100, None));

        let opts = CompressOptions {
            max_size: 1,
            max_dimension: 150,
        };
        let outcome = submit(&agent, req, opts).await.unwrap();
        assert_eq!(outcome.record.images()[0].image.mime_type, "image/png");
    }

    #[tokio::test]
    async fn test_upload_failure_aborts() {
        let dir = tempdir().unwrap();
        let agent = MockAgent {
            fail_uploads: true,
            ..MockAgent::default()
        };
        let mut req = request("pic");
        req.images.push(image(&dir, "a.png", 8, 8, None));

        let err = submit(&agent, req, CompressOptions::default())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Failed to upload image");
        assert!(agent.posts.lock().unwrap().is_empty());
    }
}
