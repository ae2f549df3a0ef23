//! Rich text: post text plus the facets (mentions, links, tags) found in it.
//!
//! Detection is split in two steps. [`RichText::with_local_facets`] runs the
//! pattern matching only, which is enough for highlighting while typing.
//! [`RichText::detect_facets`] also resolves every mentioned handle to a DID
//! through a [`HandleResolver`], which is what a published post needs.

mod cache;
pub mod detect;
mod facet;

pub use cache::FacetCache;
pub use facet::{ByteSlice, Facet, FacetFeature};

use futures_util::future::join_all;
use unicode_segmentation::UnicodeSegmentation;

use crate::api::HandleResolver;

/// Post text with its detected facets
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RichText {
    /// The text itself
    pub text: String,
    /// Facets sorted by start offset
    pub facets: Vec<Facet>,
}

/// A run of text, optionally covered by a facet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment<'a> {
    /// The run of text
    pub text: &'a str,
    /// The facet covering it, if any
    pub facet: Option<&'a Facet>,
}

impl RichText {
    /// Plain text with no facets yet
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            facets: Vec::new(),
        }
    }

    /// Detect facets without resolving mentions (mentions keep the handle)
    pub fn detect_facets_without_resolution(&mut self) {
        self.facets = detect::detect(&self.text);
    }

    /// Builder form of [`Self::detect_facets_without_resolution`]
    #[must_use]
    pub fn with_local_facets(mut self) -> Self {
        self.detect_facets_without_resolution();
        self
    }

    /// Detect facets and resolve mentioned handles to DIDs.
    ///
    /// Mentions whose handle does not resolve are dropped; the rest of the
    /// facets are kept.
    pub async fn detect_facets<R: HandleResolver>(&mut self, resolver: &R) {
        let detected = detect::detect(&self.text);

        let resolved = join_all(detected.into_iter().map(|mut facet| async move {
            let mut features = Vec::with_capacity(facet.features.len());
            for feature in facet.features {
                match feature {
                    FacetFeature::Mention { did: handle } => {
                        match resolver.resolve_handle(&handle).await {
                            Ok(did) => features.push(FacetFeature::Mention { did }),
                            Err(e) => {
                                tracing::debug!("Dropping mention of {handle}: {e}");
                            }
                        }
                    }
                    other => features.push(other),
                }
            }
            facet.features = features;
            facet
        }))
        .await;

        self.facets = resolved
            .into_iter()
            .filter(|f| !f.features.is_empty())
            .collect();
    }

    /// Length in user-perceived characters (extended grapheme clusters)
    pub fn grapheme_length(&self) -> usize {
        self.text.graphemes(true).count()
    }

    /// Length in UTF-8 bytes
    pub fn len(&self) -> usize {
        self.text.len()
    }

    /// Whether the text is empty
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Facets for the record, or `None` when there are none
    pub fn facets_for_record(&self) -> Option<Vec<Facet>> {
        if self.facets.is_empty() {
            None
        } else {
            Some(self.facets.clone())
        }
    }

    /// Split the text into plain and faceted runs.
    ///
    /// Facets that overlap an earlier one, fall outside the text or do not
    /// sit on character boundaries are rendered as plain text.
    pub fn segments(&self) -> Vec<Segment<'_>> {
        let mut segments = Vec::new();
        let mut cursor = 0;

        for facet in &self.facets {
            let range = facet.index.range();
            if facet.index.is_empty()
                || range.start < cursor
                || range.end > self.text.len()
                || !self.text.is_char_boundary(range.start)
                || !self.text.is_char_boundary(range.end)
            {
                continue;
            }

            if range.start > cursor {
                segments.push(Segment {
                    text: &self.text[cursor..range.start],
                    facet: None,
                });
            }
            segments.push(Segment {
                text: &self.text[range.clone()],
                facet: Some(facet),
            });
            cursor = range.end;
        }

        if cursor < self.text.len() {
            segments.push(Segment {
                text: &self.text[cursor..],
                facet: None,
            });
        }

        segments
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{Result, bail};

    struct FixedResolver;

    impl HandleResolver for FixedResolver {
        async fn resolve_handle(&self, handle: &str) -> Result<String> {
            match handle {
                "alice.bsky.social" => Ok("did:plc:alice".to_string()),
                _ => bail!("Unable to resolve handle"),
            }
        }
    }

    #[test]
    fn test_grapheme_length_counts_clusters() {
        assert_eq!(RichText::new("hello").grapheme_length(), 5);
        // Family emoji is one grapheme made of several code points
        assert_eq!(RichText::new("👨‍👩‍👧").grapheme_length(), 1);
        assert_eq!(RichText::new("e\u{301}").grapheme_length(), 1);
    }

    #[test]
    fn test_detect_facets_resolves_and_drops() {
        let mut rt = RichText::new("hi @alice.bsky.social and @ghost.bsky.social #tag");
        tokio_test::block_on(rt.detect_facets(&FixedResolver));

        assert_eq!(rt.facets.len(), 2);
        assert_eq!(rt.facets[0].feature(), Some(&FacetFeature::Mention {
            did: "did:plc:alice".to_string()
        }));
        assert_eq!(rt.facets[1].feature(), Some(&FacetFeature::Tag {
            tag: "tag".to_string()
        }));
    }

    #[test]
    fn test_local_facets_keep_handles() {
        let rt = RichText::new("@ghost.bsky.social").with_local_facets();
        assert_eq!(rt.facets.len(), 1);
        assert_eq!(rt.facets[0].feature(), Some(&FacetFeature::Mention {
            did: "ghost.bsky.social".to_string()
        }));
    }

    #[test]
    fn test_segments() {
        let rt = RichText::new("go to example.com now #yes").with_local_facets();
        let segments = rt.segments();
        let texts: Vec<_> = segments.iter().map(|s| s.text).collect();
        assert_eq!(texts, vec!["go to ", "example.com", " now ", "#yes"]);
        assert!(segments[0].facet.is_none());
        assert!(segments[1].facet.is_some());
        assert_eq!(texts.concat(), rt.text);
    }

    #[test]
    fn test_segments_skip_bad_facets() {
        let rt = RichText {
            text: "héllo".to_string(),
            facets: vec![
                Facet::new(2, 3, FacetFeature::Tag { tag: "x".into() }),
                Facet::new(0, 99, FacetFeature::Tag { tag: "y".into() }),
            ],
        };
        let segments = rt.segments();
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].text, "héllo");
    }

    #[test]
    fn test_no_facets_for_plain_text() {
        let rt = RichText::new("just words").with_local_facets();
        assert!(rt.facets_for_record().is_none());
    }
}
