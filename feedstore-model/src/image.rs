use chrono::{DateTime, Utc};

use crate::error::{ModelError, Result};
use crate::ids::{AccountId, FeedID, ImageID};

/// Uploaded image metadata.
///
/// An image is either unbound (`feed_id == None`) or bound to exactly one
/// feed. The feed holds no ownership over the image: deleting a feed clears
/// `feed_id` and leaves the image in place.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Image {
    pub image_id: ImageID,
    pub uploader: AccountId,
    /// Public download URL of the stored object.
    pub url: String,
    pub feed_id: Option<FeedID>,
    /// Perceptual hash used as a placeholder while the image loads.
    pub blurhash: Option<String>,
    pub uploaded_at: DateTime<Utc>,
    pub order: i32,
}

impl Image {
    pub fn new(
        uploader: AccountId,
        url: impl Into<String>,
        blurhash: Option<String>,
    ) -> Self {
        Self {
            image_id: ImageID::new(),
            uploader,
            url: url.into(),
            feed_id: None,
            blurhash,
            uploaded_at: Utc::now(),
            order: 0,
        }
    }

    pub fn is_bound(&self) -> bool {
        self.feed_id.is_some()
    }

    /// Returns a copy bound to `feed_id`.
    ///
    /// Fails when the image is already bound; rebinding requires an explicit
    /// unbind first.
    pub fn bind_to_feed(&self, feed_id: FeedID) -> Result<Image> {
        if let Some(current) = self.feed_id {
            return Err(ModelError::ImageAlreadyBound {
                image_id: self.image_id,
                feed_id: current,
            });
        }

        Ok(Image {
            feed_id: Some(feed_id),
            ..self.clone()
        })
    }

    /// Returns a copy with the feed binding cleared.
    pub fn unbind_from_feed(&self) -> Result<Image> {
        if self.feed_id.is_none() {
            return Err(ModelError::ImageNotBound {
                image_id: self.image_id,
            });
        }

        Ok(Image {
            feed_id: None,
            ..self.clone()
        })
    }

    pub fn with_order(self, order: i32) -> Image {
        Image { order, ..self }
    }
}

/// Requested position of an image inside a feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ImageSlot {
    pub image_id: ImageID,
    pub order: i32,
}

impl ImageSlot {
    pub fn new(image_id: ImageID, order: i32) -> Self {
        Self { image_id, order }
    }

    /// Assigns `0..n` orders following the iteration order of `ids`.
    pub fn sequential<I>(ids: I) -> Vec<ImageSlot>
    where
        I: IntoIterator<Item = ImageID>,
    {
        ids.into_iter()
            .enumerate()
            .map(|(idx, image_id)| ImageSlot {
                image_id,
                order: idx as i32,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Image {
        Image::new(
            AccountId::new("uploader").unwrap(),
            "https://cdn.example/img.jpg",
            Some("LEHV6nWB2yk8".into()),
        )
    }

    #[test]
    fn bind_then_unbind_round_trips_state() {
        let image = sample();
        let feed_id = FeedID::new();

        let bound = image.bind_to_feed(feed_id).unwrap();
        assert_eq!(bound.feed_id, Some(feed_id));
        assert_eq!(bound.image_id, image.image_id);
        assert!(!image.is_bound(), "source value is left untouched");

        let unbound = bound.unbind_from_feed().unwrap();
        assert_eq!(unbound.feed_id, None);
    }

    #[test]
    fn binding_a_bound_image_is_rejected() {
        let first = FeedID::new();
        let bound = sample().bind_to_feed(first).unwrap();

        let err = bound.bind_to_feed(FeedID::new()).unwrap_err();
        assert_eq!(
            err,
            ModelError::ImageAlreadyBound {
                image_id: bound.image_id,
                feed_id: first,
            }
        );
    }

    #[test]
    fn unbinding_an_unbound_image_is_rejected() {
        let image = sample();
        assert!(matches!(
            image.unbind_from_feed(),
            Err(ModelError::ImageNotBound { .. })
        ));
    }

    #[test]
    fn sequential_slots_follow_input_order() {
        let ids = [ImageID::new(), ImageID::new(), ImageID::new()];
        let slots = ImageSlot::sequential(ids);
        assert_eq!(
            slots.iter().map(|s| s.order).collect::<Vec<_>>(),
            vec![0, 1, 2]
        );
        assert_eq!(slots[2].image_id, ids[2]);
    }
}
