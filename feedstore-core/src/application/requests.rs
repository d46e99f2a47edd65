//! Inputs accepted by the application services.
//!
//! Identity fields (`account_id`, `follower`, `uploader`) carry the already
//! authenticated acting account.

use feedstore_model::{AccountId, FeedID, ImageID, ImageSlot, Pagination};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostFeed {
    pub account_id: AccountId,
    pub text: String,
    #[serde(default)]
    pub images: Vec<ImageSlot>,
}

/// Replaces text and the full image list of an existing feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateFeed {
    pub account_id: AccountId,
    pub feed_id: FeedID,
    pub text: String,
    #[serde(default)]
    pub images: Vec<ImageSlot>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteFeed {
    pub account_id: AccountId,
    pub feed_id: FeedID,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetAccountFeeds {
    pub account_id: AccountId,
    #[serde(default)]
    pub pagination: Pagination,
    pub viewer: Option<AccountId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterImage {
    /// Set when the object store already keyed the upload; generated otherwise.
    pub image_id: Option<ImageID>,
    pub uploader: AccountId,
    pub url: String,
    pub blurhash: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Follow {
    pub follower: AccountId,
    pub follow_for: AccountId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unfollow {
    pub follower: AccountId,
    pub follow_for: AccountId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LikeFeed {
    pub feed_id: FeedID,
    pub account_id: AccountId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnlikeFeed {
    pub feed_id: FeedID,
    pub account_id: AccountId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewFeeds {
    pub account_id: AccountId,
    pub feed_ids: Vec<FeedID>,
}
