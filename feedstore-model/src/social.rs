use chrono::{DateTime, Utc};

use crate::ids::{AccountId, FeedID};

/// Directed follow edge: `follower` follows `follow_for`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Follower {
    pub follower: AccountId,
    pub follow_for: AccountId,
    pub followed_at: DateTime<Utc>,
}

impl Follower {
    pub fn new(follower: AccountId, follow_for: AccountId) -> Self {
        Self {
            follower,
            follow_for,
            followed_at: Utc::now(),
        }
    }

    pub fn is_self_follow(&self) -> bool {
        self.follower == self.follow_for
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Like {
    pub feed_id: FeedID,
    pub account_id: AccountId,
    pub liked_at: DateTime<Utc>,
}

impl Like {
    pub fn new(feed_id: FeedID, account_id: AccountId) -> Self {
        Self {
            feed_id,
            account_id,
            liked_at: Utc::now(),
        }
    }
}

/// Append-only record that `account_id` has seen `feed_id`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct View {
    pub feed_id: FeedID,
    pub account_id: AccountId,
    pub viewed_at: DateTime<Utc>,
}

impl View {
    pub fn new(feed_id: FeedID, account_id: AccountId) -> Self {
        Self {
            feed_id,
            account_id,
            viewed_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AccountInfoCounts {
    pub followers_count: i64,
    pub following_count: i64,
    pub feeds_count: i64,
}
