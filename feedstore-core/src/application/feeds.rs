use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::Utc;
use feedstore_model::{
    AccountId, Feed, FeedID, Image, ImageID, ImageSlot, ModelResult, Page,
};
use tracing::{debug, info, instrument};

use super::requests::{DeleteFeed, GetAccountFeeds, PostFeed, UpdateFeed};
use crate::database::unit_of_work::{UnitOfWork, UnitOfWorkFactory, scoped};
use crate::error::{CoreError, Result};

/// Rejects image lists that name an image twice or reuse an order.
pub(crate) fn validate_slots(slots: &[ImageSlot]) -> Result<()> {
    let mut ids = HashSet::with_capacity(slots.len());
    let mut orders = HashSet::with_capacity(slots.len());
    for slot in slots {
        if !ids.insert(slot.image_id) {
            return Err(CoreError::InvariantViolation(format!(
                "image {} is listed more than once",
                slot.image_id
            )));
        }
        if !orders.insert(slot.order) {
            return Err(CoreError::InvariantViolation(format!(
                "image order {} is used more than once",
                slot.order
            )));
        }
    }
    Ok(())
}

/// Loads the requested images, treating images uploaded by someone else as
/// missing.
async fn load_owned_images(
    uow: &dyn UnitOfWork,
    owner: &AccountId,
    slots: &[ImageSlot],
) -> Result<HashMap<ImageID, Image>> {
    let ids: Vec<ImageID> = slots.iter().map(|slot| slot.image_id).collect();
    let found: HashMap<ImageID, Image> = uow
        .images()?
        .get_many(&ids)
        .await?
        .into_iter()
        .filter(|image| &image.uploader == owner)
        .map(|image| (image.image_id, image))
        .collect();

    if let Some(missing) = ids.iter().find(|id| !found.contains_key(*id)) {
        return Err(CoreError::NotFound(format!("image {missing} not found")));
    }
    Ok(found)
}

/// Commands and queries over feeds.
#[derive(Clone, Debug)]
pub struct FeedService {
    uow: Arc<dyn UnitOfWorkFactory>,
}

impl FeedService {
    pub fn new(uow: Arc<dyn UnitOfWorkFactory>) -> Self {
        Self { uow }
    }

    /// Creates a feed and binds the requested images to it.
    ///
    /// Every image must exist and belong to the author; an image already
    /// bound elsewhere fails with `InvariantViolation`.
    #[instrument(skip(self, request), fields(account = %request.account_id))]
    pub async fn post_feed(&self, request: PostFeed) -> Result<Feed> {
        validate_slots(&request.images)?;

        scoped(self.uow.create(), move |uow| {
            Box::pin(async move {
                let PostFeed {
                    account_id,
                    text,
                    images: slots,
                } = request;
                let feed_id = FeedID::new();

                let mut owned =
                    load_owned_images(&*uow, &account_id, &slots).await?;
                let mut bound = Vec::with_capacity(slots.len());
                for slot in &slots {
                    let image = owned.remove(&slot.image_id).ok_or_else(|| {
                        CoreError::NotFound(format!(
                            "image {} not found",
                            slot.image_id
                        ))
                    })?;
                    bound.push(
                        image.bind_to_feed(feed_id)?.with_order(slot.order),
                    );
                }

                let feed = Feed::new(feed_id, account_id.clone(), text)
                    .with_images(bound.clone());
                uow.feeds()?.add(&feed).await?;
                uow.images()?.update(&bound).await?;

                let stored = uow
                    .feeds()?
                    .get_by_id(feed_id, Some(&account_id))
                    .await?
                    .ok_or_else(|| {
                        CoreError::Internal(format!(
                            "feed {feed_id} vanished after insert"
                        ))
                    })?;
                info!("Posted feed {} with {} images", feed_id, bound.len());
                Ok::<_, CoreError>(stored)
            })
        })
        .await
    }

    /// Replaces the text and image list of a feed owned by the caller.
    ///
    /// Images dropped from the list are unbound but kept; new ones are bound;
    /// kept ones take their new order.
    #[instrument(skip(self, request), fields(feed = %request.feed_id))]
    pub async fn update_feed(&self, request: UpdateFeed) -> Result<Feed> {
        validate_slots(&request.images)?;

        scoped(self.uow.create(), move |uow| {
            Box::pin(async move {
                let UpdateFeed {
                    account_id,
                    feed_id,
                    text,
                    images: slots,
                } = request;

                let current = uow
                    .feeds()?
                    .get_by_id(feed_id, None)
                    .await?
                    .ok_or_else(|| {
                        CoreError::NotFound(format!("feed {feed_id} not found"))
                    })?;
                if !current.is_owned_by(&account_id) {
                    return Err(CoreError::Forbidden(format!(
                        "feed {feed_id} belongs to another account"
                    )));
                }

                let owned =
                    load_owned_images(&*uow, &account_id, &slots).await?;
                let mut next = Vec::with_capacity(slots.len());
                for slot in &slots {
                    let image = owned.get(&slot.image_id).ok_or_else(|| {
                        CoreError::NotFound(format!(
                            "image {} not found",
                            slot.image_id
                        ))
                    })?;
                    let image = if image.feed_id == Some(feed_id) {
                        image.clone()
                    } else {
                        image.bind_to_feed(feed_id)?
                    };
                    next.push(image.with_order(slot.order));
                }

                let requested: HashSet<ImageID> =
                    slots.iter().map(|slot| slot.image_id).collect();
                let removed = current
                    .images
                    .iter()
                    .filter(|image| !requested.contains(&image.image_id))
                    .map(Image::unbind_from_feed)
                    .collect::<ModelResult<Vec<_>>>()?;

                let mut feed = current.with_images(next.clone());
                feed.text = text;
                feed.updated_at = Some(Utc::now());

                uow.feeds()?.update(&feed).await?;
                let mut changed = removed;
                changed.extend(next);
                uow.images()?.update(&changed).await?;

                debug!(
                    "Feed {} now has {} images",
                    feed_id,
                    feed.images.len()
                );
                uow.feeds()?
                    .get_by_id(feed_id, Some(&account_id))
                    .await?
                    .ok_or_else(|| {
                        CoreError::Internal(format!(
                            "feed {feed_id} vanished during update"
                        ))
                    })
            })
        })
        .await
    }

    /// Deletes a feed owned by the caller. Returns `false` when the feed did
    /// not exist.
    #[instrument(skip(self, request), fields(feed = %request.feed_id))]
    pub async fn delete_feed(&self, request: DeleteFeed) -> Result<bool> {
        scoped(self.uow.create(), move |uow| {
            Box::pin(async move {
                let feeds = uow.feeds()?;
                match feeds.get_by_id(request.feed_id, None).await? {
                    None => Ok(false),
                    Some(feed) if !feed.is_owned_by(&request.account_id) => {
                        Err(CoreError::Forbidden(format!(
                            "feed {} belongs to another account",
                            request.feed_id
                        )))
                    }
                    Some(_) => feeds.delete(request.feed_id).await,
                }
            })
        })
        .await
    }

    #[instrument(skip(self))]
    pub async fn get_feed(
        &self,
        feed_id: FeedID,
        viewer: Option<AccountId>,
    ) -> Result<Option<Feed>> {
        scoped(self.uow.create(), move |uow| {
            Box::pin(async move {
                uow.feeds()?.get_by_id(feed_id, viewer.as_ref()).await
            })
        })
        .await
    }

    #[instrument(skip(self, feed_ids), fields(count = feed_ids.len()))]
    pub async fn get_feeds(
        &self,
        feed_ids: Vec<FeedID>,
        viewer: Option<AccountId>,
    ) -> Result<Vec<Feed>> {
        scoped(self.uow.create(), move |uow| {
            Box::pin(async move {
                uow.feeds()?.get_by_ids(&feed_ids, viewer.as_ref()).await
            })
        })
        .await
    }

    #[instrument(skip(self))]
    pub async fn get_account_feeds(
        &self,
        request: GetAccountFeeds,
    ) -> Result<Page<Feed>> {
        scoped(self.uow.create(), move |uow| {
            Box::pin(async move {
                uow.feeds()?
                    .get_account_feeds(
                        &request.account_id,
                        request.pagination,
                        request.viewer.as_ref(),
                    )
                    .await
            })
        })
        .await
    }
}
