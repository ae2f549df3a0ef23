//! Image attachments: picking, captioning and preparing them for upload.
//!
//! Large images are recompressed on the client before they are uploaded as
//! blobs. See [`compress_image`] for the exact loop.

mod asset;
mod attachments;
mod compress;

pub use asset::ImageAsset;
pub use attachments::{Attachment, Attachments};
pub use compress::{
    CompressOptions, PreparedImage, QUALITY_STEPS, compress_image, needs_resize,
    prepare_for_upload, target_dimensions,
};

/// Maximum number of images on one post
pub const MAX_IMAGES: usize = 4;
