use feedstore_model::{AccountId, FeedID, ImageID};

/// Key layout of the cache-backed store.
///
/// Records live under singular keys (`feed:{id}`); the sets that index them
/// are named after the owning entity (`account_feeds:{account}`).
#[derive(Debug, Clone, Copy)]
pub struct CacheKeys;

impl CacheKeys {
    pub fn feed(feed_id: FeedID) -> String {
        format!("feed:{feed_id}")
    }

    pub fn image(image_id: ImageID) -> String {
        format!("image:{image_id}")
    }

    /// Set of feed ids authored by `account_id`.
    pub fn account_feeds(account_id: &AccountId) -> String {
        format!("account_feeds:{account_id}")
    }

    /// Set of image ids bound to `feed_id`.
    pub fn feed_images(feed_id: FeedID) -> String {
        format!("feed_images:{feed_id}")
    }

    /// Set of accounts following `account_id`.
    pub fn followers_set(account_id: &AccountId) -> String {
        format!("followers_set:{account_id}")
    }

    /// Set of accounts `account_id` follows.
    pub fn following_set(account_id: &AccountId) -> String {
        format!("following_set:{account_id}")
    }

    /// Edge record for `follower -> follow_for`.
    ///
    /// Account ids may contain `:`, so the follower id carries its byte
    /// length to keep `a:b -> c` and `a -> b:c` apart.
    pub fn follower(follower: &AccountId, follow_for: &AccountId) -> String {
        format!("follower:{}:{follower}:{follow_for}", follower.as_str().len())
    }

    pub fn like(feed_id: FeedID, account_id: &AccountId) -> String {
        format!("like:{feed_id}:{account_id}")
    }

    /// Set of accounts that liked `feed_id`.
    pub fn feed_likes(feed_id: FeedID) -> String {
        format!("feed_likes:{feed_id}")
    }

    pub fn view(feed_id: FeedID, account_id: &AccountId) -> String {
        format!("view:{feed_id}:{account_id}")
    }

    /// Set of accounts that viewed `feed_id`.
    pub fn feed_views(feed_id: FeedID) -> String {
        format!("feed_views:{feed_id}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn keys_embed_ids_verbatim() {
        let feed = FeedID(Uuid::nil());
        let alice = AccountId::new("alice").unwrap();
        let bob = AccountId::new("bob").unwrap();

        assert_eq!(
            CacheKeys::feed(feed),
            "feed:00000000-0000-0000-0000-000000000000"
        );
        assert_eq!(CacheKeys::follower(&alice, &bob), "follower:5:alice:bob");
        assert_eq!(CacheKeys::followers_set(&bob), "followers_set:bob");
        assert_eq!(
            CacheKeys::like(feed, &alice),
            "like:00000000-0000-0000-0000-000000000000:alice"
        );
    }

    #[test]
    fn follower_keys_separate_ids_containing_colons() {
        let left = CacheKeys::follower(
            &AccountId::new("a:b").unwrap(),
            &AccountId::new("c").unwrap(),
        );
        let right = CacheKeys::follower(
            &AccountId::new("a").unwrap(),
            &AccountId::new("b:c").unwrap(),
        );
        assert_ne!(left, right);
    }
}
