use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use feedstore_model::{
    AccountId, AccountInfoCounts, Feed, FeedID, Image, ImageID, Page,
    Pagination,
};
use tracing::debug;

use super::{FeedRecord, hydrate_feed, load_feed_record, paginate, parse_uuid};
use crate::database::infrastructure::cache::{keys::CacheKeys, scope::CacheScope};
use crate::database::ports::feeds::FeedsRepository;
use crate::error::{CoreError, Result};

#[derive(Clone, Debug)]
pub struct CacheFeedsRepository {
    scope: Arc<CacheScope>,
}

impl CacheFeedsRepository {
    pub(crate) fn new(scope: Arc<CacheScope>) -> Self {
        Self { scope }
    }

    async fn bound_image_ids(&self, feed_id: FeedID) -> Result<Vec<ImageID>> {
        let key = CacheKeys::feed_images(feed_id);
        self.scope
            .smembers(&key)
            .await?
            .iter()
            .map(|member| parse_uuid(&key, member).map(ImageID))
            .collect()
    }

    fn stage_image(&self, image: &Image) -> Result<()> {
        self.scope.put_record(CacheKeys::image(image.image_id), image)
    }
}

#[async_trait]
impl FeedsRepository for CacheFeedsRepository {
    async fn add(&self, feed: &Feed) -> Result<()> {
        let key = CacheKeys::feed(feed.feed_id);
        if self.scope.exists(&key).await? {
            return Err(CoreError::Conflict(format!(
                "feed {} already exists",
                feed.feed_id
            )));
        }

        self.scope.put_record(key, &FeedRecord::from(feed))?;
        self.scope.sadd(
            CacheKeys::account_feeds(&feed.account_id),
            feed.feed_id.as_str(),
        );
        Ok(())
    }

    async fn update(&self, feed: &Feed) -> Result<()> {
        let key = CacheKeys::feed(feed.feed_id);
        if !self.scope.exists(&key).await? {
            return Err(CoreError::NotFound(format!(
                "feed {} does not exist",
                feed.feed_id
            )));
        }
        self.scope.put_record(key, &FeedRecord::from(feed))?;

        let feed_images_key = CacheKeys::feed_images(feed.feed_id);
        let kept: HashSet<ImageID> =
            feed.images.iter().map(|image| image.image_id).collect();

        let mut unbound = 0usize;
        for image_id in self.bound_image_ids(feed.feed_id).await? {
            if kept.contains(&image_id) {
                continue;
            }
            let stored: Option<Image> =
                self.scope.get_record(&CacheKeys::image(image_id)).await?;
            if let Some(image) = stored
                && image.feed_id == Some(feed.feed_id)
            {
                self.stage_image(&Image {
                    feed_id: None,
                    ..image
                })?;
                unbound += 1;
            }
            self.scope
                .srem(feed_images_key.clone(), image_id.as_str());
        }

        for image in &feed.images {
            let previous: Option<Image> =
                self.scope.get_record(&CacheKeys::image(image.image_id)).await?;
            if let Some(other) = previous.and_then(|p| p.feed_id)
                && other != feed.feed_id
            {
                self.scope
                    .srem(CacheKeys::feed_images(other), image.image_id.as_str());
            }

            self.stage_image(&Image {
                feed_id: Some(feed.feed_id),
                ..image.clone()
            })?;
            self.scope
                .sadd(feed_images_key.clone(), image.image_id.as_str());
        }

        debug!(
            "Updated feed {} ({} images bound, {} unbound)",
            feed.feed_id,
            feed.images.len(),
            unbound
        );
        Ok(())
    }

    async fn get_by_id(
        &self,
        feed_id: FeedID,
        viewer: Option<&AccountId>,
    ) -> Result<Option<Feed>> {
        match load_feed_record(&self.scope, feed_id).await? {
            Some(record) => {
                Ok(Some(hydrate_feed(&self.scope, record, viewer).await?))
            }
            None => Ok(None),
        }
    }

    async fn get_by_ids(
        &self,
        feed_ids: &[FeedID],
        viewer: Option<&AccountId>,
    ) -> Result<Vec<Feed>> {
        let mut seen = HashSet::with_capacity(feed_ids.len());
        let requested: Vec<FeedID> =
            feed_ids.iter().copied().filter(|id| seen.insert(*id)).collect();

        let keys: Vec<String> =
            requested.iter().map(|id| CacheKeys::feed(*id)).collect();
        let records = self.scope.get_records::<FeedRecord>(&keys).await?;

        let mut feeds = Vec::with_capacity(records.len());
        for record in records.into_iter().flatten() {
            feeds.push(hydrate_feed(&self.scope, record, viewer).await?);
        }
        Ok(feeds)
    }

    async fn get_account_feeds(
        &self,
        account_id: &AccountId,
        pagination: Pagination,
        viewer: Option<&AccountId>,
    ) -> Result<Page<Feed>> {
        let index_key = CacheKeys::account_feeds(account_id);
        let keys = self
            .scope
            .smembers(&index_key)
            .await?
            .iter()
            .map(|member| {
                parse_uuid(&index_key, member)
                    .map(|id| CacheKeys::feed(FeedID(id)))
            })
            .collect::<Result<Vec<_>>>()?;

        let mut records: Vec<FeedRecord> = self
            .scope
            .get_records::<FeedRecord>(&keys)
            .await?
            .into_iter()
            .flatten()
            .collect();
        records.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.feed_id.cmp(&a.feed_id))
        });

        let page = paginate(records, pagination);
        let mut items = Vec::with_capacity(page.items.len());
        for record in page.items {
            items.push(hydrate_feed(&self.scope, record, viewer).await?);
        }
        Ok(Page::new(items, page.total_count))
    }

    async fn count_feeds(&self, account_id: &AccountId) -> Result<i64> {
        let members = self
            .scope
            .smembers(&CacheKeys::account_feeds(account_id))
            .await?;
        Ok(members.len() as i64)
    }

    async fn exists(&self, feed_id: FeedID) -> Result<bool> {
        self.scope.exists(&CacheKeys::feed(feed_id)).await
    }

    async fn delete(&self, feed_id: FeedID) -> Result<bool> {
        let Some(record) = load_feed_record(&self.scope, feed_id).await? else {
            return Ok(false);
        };

        for image_id in self.bound_image_ids(feed_id).await? {
            let stored: Option<Image> =
                self.scope.get_record(&CacheKeys::image(image_id)).await?;
            if let Some(image) = stored
                && image.feed_id == Some(feed_id)
            {
                self.stage_image(&Image {
                    feed_id: None,
                    ..image
                })?;
            }
        }
        self.scope.delete(CacheKeys::feed_images(feed_id));

        let likes_key = CacheKeys::feed_likes(feed_id);
        for account in self.scope.smembers(&likes_key).await? {
            let account = AccountId::from_trusted(account);
            self.scope.delete(CacheKeys::like(feed_id, &account));
        }
        self.scope.delete(likes_key);

        let views_key = CacheKeys::feed_views(feed_id);
        for account in self.scope.smembers(&views_key).await? {
            let account = AccountId::from_trusted(account);
            self.scope.delete(CacheKeys::view(feed_id, &account));
        }
        self.scope.delete(views_key);

        self.scope.delete(CacheKeys::feed(feed_id));
        self.scope.srem(
            CacheKeys::account_feeds(&record.account_id),
            feed_id.as_str(),
        );

        debug!("Deleted feed {} with its likes and views", feed_id);
        Ok(true)
    }

    async fn get_account_info_counts(
        &self,
        account_id: &AccountId,
    ) -> Result<AccountInfoCounts> {
        let followers = self
            .scope
            .smembers(&CacheKeys::followers_set(account_id))
            .await?;
        let following = self
            .scope
            .smembers(&CacheKeys::following_set(account_id))
            .await?;
        let feeds = self
            .scope
            .smembers(&CacheKeys::account_feeds(account_id))
            .await?;

        Ok(AccountInfoCounts {
            followers_count: followers.len() as i64,
            following_count: following.len() as i64,
            feeds_count: feeds.len() as i64,
        })
    }
}
