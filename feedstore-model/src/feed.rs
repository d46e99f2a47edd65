use chrono::{DateTime, Utc};

use crate::ids::{AccountId, FeedID};
use crate::image::Image;

/// A text post with its bound images.
///
/// `likes_count`, `views_count`, `has_followed` and `has_liked` are computed
/// by the repository relative to the requesting viewer. Without a viewer the
/// boolean fields are `false`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Feed {
    pub feed_id: FeedID,
    pub account_id: AccountId,
    pub text: String,
    /// Bound images sorted by `order`.
    pub images: Vec<Image>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,

    pub likes_count: i64,
    pub views_count: i64,
    pub has_followed: bool,
    pub has_liked: bool,
}

impl Feed {
    pub fn new(
        feed_id: FeedID,
        account_id: AccountId,
        text: impl Into<String>,
    ) -> Self {
        Self {
            feed_id,
            account_id,
            text: text.into(),
            images: Vec::new(),
            created_at: Utc::now(),
            updated_at: None,
            likes_count: 0,
            views_count: 0,
            has_followed: false,
            has_liked: false,
        }
    }

    pub fn with_images(mut self, images: Vec<Image>) -> Self {
        self.images = images;
        self.sort_images();
        self
    }

    pub fn sort_images(&mut self) {
        self.images.sort_by_key(|image| (image.order, image.image_id));
    }

    pub fn is_owned_by(&self, account_id: &AccountId) -> bool {
        &self.account_id == account_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn images_are_kept_in_order() {
        let owner = AccountId::new("author").unwrap();
        let late = Image::new(owner.clone(), "b", None).with_order(3);
        let early = Image::new(owner.clone(), "a", None).with_order(1);

        let feed = Feed::new(FeedID::new(), owner.clone(), "hello")
            .with_images(vec![late.clone(), early.clone()]);

        assert_eq!(feed.images, vec![early, late]);
        assert!(feed.is_owned_by(&owner));
        assert_eq!(feed.likes_count, 0);
        assert!(!feed.has_liked);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn serde_round_trip_keeps_ids_transparent() {
        let owner = AccountId::new("author").unwrap();
        let feed = Feed::new(FeedID::new(), owner, "hi");

        let json = serde_json::to_value(&feed).unwrap();
        assert_eq!(json["account_id"], "author");
        assert_eq!(json["feed_id"], feed.feed_id.as_str());

        let back: Feed = serde_json::from_value(json).unwrap();
        assert_eq!(back, feed);
    }
}
