//! Facet types as they appear in `app.bsky.richtext.facet` records.

use serde::{Deserialize, Serialize};
use std::ops::Range;

/// A span of the post text, in UTF-8 byte offsets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ByteSlice {
    /// Inclusive start offset
    pub byte_start: usize,
    /// Exclusive end offset
    pub byte_end: usize,
}

impl ByteSlice {
    /// Create a new slice
    pub const fn new(byte_start: usize, byte_end: usize) -> Self {
        Self {
            byte_start,
            byte_end,
        }
    }

    /// As a `Range` usable for slicing the text
    pub const fn range(self) -> Range<usize> {
        self.byte_start..self.byte_end
    }

    /// Whether the slice covers no bytes
    pub const fn is_empty(&self) -> bool {
        self.byte_start >= self.byte_end
    }
}

/// What a facet means
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "$type")]
pub enum FacetFeature {
    /// A mention of an account. Holds the handle until it is resolved to a DID.
    #[serde(rename = "app.bsky.richtext.facet#mention")]
    Mention {
        /// Account DID
        did: String,
    },
    /// A hyperlink
    #[serde(rename = "app.bsky.richtext.facet#link")]
    Link {
        /// Full URI, scheme included
        uri: String,
    },
    /// A hashtag, stored without the leading `#`
    #[serde(rename = "app.bsky.richtext.facet#tag")]
    Tag {
        /// Tag text
        tag: String,
    },
}

/// An annotated span of text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Facet {
    /// Where the facet applies
    pub index: ByteSlice,
    /// What it means
    pub features: Vec<FacetFeature>,
}

impl Facet {
    /// A facet with a single feature
    pub fn new(byte_start: usize, byte_end: usize, feature: FacetFeature) -> Self {
        Self {
            index: ByteSlice::new(byte_start, byte_end),
            features: vec![feature],
        }
    }

    /// The first feature, which is the only one plume ever produces
    pub fn feature(&self) -> Option<&FacetFeature> {
        self.features.first()
    }
}
