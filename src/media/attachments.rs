//! The ordered list of images attached to a draft.

use super::{ImageAsset, MAX_IMAGES};
use crate::error::ComposeError;

/// An attached image and its caption
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    /// The picked file
    pub asset: ImageAsset,
    /// Caption (alt text)
    pub alt: Option<String>,
}

impl Attachment {
    /// Attach an image with no caption
    pub const fn new(asset: ImageAsset) -> Self {
        Self { asset, alt: None }
    }

    /// Whether a caption has been written
    pub fn has_alt(&self) -> bool {
        self.alt.as_deref().is_some_and(|a| !a.trim().is_empty())
    }

    /// Caption text, empty when missing
    pub fn alt_text(&self) -> &str {
        self.alt.as_deref().unwrap_or_default()
    }
}

/// Attached images, capped at [`MAX_IMAGES`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attachments {
    items: Vec<Attachment>,
}

impl Attachments {
    /// An empty list
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Append an image, returning its index
    pub fn add(&mut self, asset: ImageAsset) -> Result<usize, ComposeError> {
        if self.is_full() {
            return Err(ComposeError::TooManyImages);
        }
        self.items.push(Attachment::new(asset));
        Ok(self.items.len() - 1)
    }

    /// Append an image that already has a caption
    pub fn add_with_alt(
        &mut self,
        asset: ImageAsset,
        alt: Option<String>,
    ) -> Result<usize, ComposeError> {
        let index = self.add(asset)?;
        self.set_alt(index, alt.unwrap_or_default())?;
        Ok(index)
    }

    /// Remove the image at `index`
    pub fn remove(&mut self, index: usize) -> Result<Attachment, ComposeError> {
        if index >= self.items.len() {
            return Err(ComposeError::NoSuchImage(index));
        }
        Ok(self.items.remove(index))
    }

    /// Set the caption of the image at `index`. An empty caption clears it.
    pub fn set_alt(&mut self, index: usize, alt: impl Into<String>) -> Result<(), ComposeError> {
        let item = self
            .items
            .get_mut(index)
            .ok_or(ComposeError::NoSuchImage(index))?;
        let alt = alt.into();
        item.alt = if alt.trim().is_empty() { None } else { Some(alt) };
        Ok(())
    }

    /// The image at `index`
    pub fn get(&self, index: usize) -> Option<&Attachment> {
        self.items.get(index)
    }

    /// Iterate in attachment order
    pub fn iter(&self) -> std::slice::Iter<'_, Attachment> {
        self.items.iter()
    }

    /// Number of attached images
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether nothing is attached
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Whether another image can still be added
    pub fn is_full(&self) -> bool {
        self.items.len() >= MAX_IMAGES
    }

    /// Counter shown next to the attach button
    pub fn label(&self) -> String {
        format!("{} / {} images", self.items.len(), MAX_IMAGES)
    }

    /// Owned copy of the list, for handing to the submit task
    pub fn to_vec(&self) -> Vec<Attachment> {
        self.items.clone()
    }

    /// Remove everything
    pub fn clear(&mut self) {
        self.items.clear();
    }
}

impl<'a> IntoIterator for &'a Attachments {
    type Item = &'a Attachment;
    type IntoIter = std::slice::Iter<'a, Attachment>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn asset(name: &str) -> ImageAsset {
        ImageAsset {
            path: PathBuf::from(name),
            width: 100,
            height: 100,
            file_size: Some(1000),
            mime: "image/png".to_string(),
        }
    }

    #[test]
    fn test_caps_at_four() {
        let mut list = Attachments::new();
        for i in 0..MAX_IMAGES {
            assert_eq!(list.add(asset(&format!("{i}.png"))).unwrap(), i);
        }
        assert!(list.is_full());
        assert!(matches!(
            list.add(asset("extra.png")),
            Err(ComposeError::TooManyImages)
        ));
        assert_eq!(list.len(), 4);
        assert_eq!(list.label(), "4 / 4 images");
    }

    #[test]
    fn test_remove_keeps_order() {
        let mut list = Attachments::new();
        list.add(asset("a.png")).unwrap();
        list.add(asset("b.png")).unwrap();
        list.add(asset("c.png")).unwrap();

        let removed = list.remove(1).unwrap();
        assert_eq!(removed.asset.file_name(), "b.png");
        let names: Vec<_> = list.iter().map(|a| a.asset.file_name()).collect();
        assert_eq!(names, vec!["a.png", "c.png"]);
        assert!(matches!(list.remove(5), Err(ComposeError::NoSuchImage(5))));
    }

    #[test]
    fn test_alt_text() {
        let mut list = Attachments::new();
        list.add(asset("a.png")).unwrap();
        assert!(!list.get(0).unwrap().has_alt());

        list.set_alt(0, "A cat on a sofa").unwrap();
        assert_eq!(list.get(0).unwrap().alt_text(), "A cat on a sofa");

        list.set_alt(0, "   ").unwrap();
        assert!(list.get(0).unwrap().alt.is_none());
        assert!(list.set_alt(3, "nope").is_err());
    }

    #[test]
    fn test_add_with_alt() {
        let mut list = Attachments::new();
        list.add_with_alt(asset("a.png"), Some("caption".into())).unwrap();
        list.add_with_alt(asset("b.png"), None).unwrap();
        assert!(list.get(0).unwrap().has_alt());
        assert!(!list.get(1).unwrap().has_alt());
        assert_eq!(list.label(), "2 / 4 images");
    }
}
