//! Local view of a part's images.
//!
//! Only operations the service confirmed are applied. A failed delete, for
//! instance, is simply never passed in and the image stays listed.

use crate::models::PartImage;

/// Ordered images of one part.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageGallery {
    part_id: String,
    images: Vec<PartImage>,
}

impl ImageGallery {
    pub fn new(part_id: impl Into<String>, images: Vec<PartImage>) -> Self {
        Self {
            part_id: part_id.into(),
            images,
        }
    }

    pub fn part_id(&self) -> &str {
        &self.part_id
    }

    pub fn images(&self) -> &[PartImage] {
        &self.images
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    pub fn get(&self, image_id: &str) -> Option<&PartImage> {
        self.images.iter().find(|i| i.id == image_id)
    }

    /// Appends a newly uploaded image.
    pub fn apply_added(&mut self, image: PartImage) {
        if let Some(existing) = self.images.iter_mut().find(|i| i.id == image.id) {
            *existing = image;
            return;
        }
        self.images.push(image);
    }

    /// Swaps the content of an existing image in place.
    ///
    /// When the image has been deleted in the meantime the replacement is
    /// appended again, so the last confirmed write wins.
    pub fn apply_replaced(&mut self, image: PartImage) {
        match self.images.iter_mut().find(|i| i.id == image.id) {
            Some(existing) => existing.url = image.url,
            None => {
                log::debug!(
                    "Replaced image {} is no longer listed on part {}, re-adding it",
                    image.id,
                    self.part_id
                );
                self.images.push(image);
            }
        }
    }

    /// Removes a deleted image. Returns false when it was already gone.
    pub fn apply_deleted(&mut self, image_id: &str) -> bool {
        let before = self.images.len();
        self.images.retain(|i| i.id != image_id);
        self.images.len() != before
    }
}
