use std::sync::Arc;

use async_trait::async_trait;
use feedstore_model::{Image, ImageID};

use crate::database::infrastructure::cache::{keys::CacheKeys, scope::CacheScope};
use crate::database::ports::images::ImagesRepository;
use crate::error::{CoreError, Result};

#[derive(Clone, Debug)]
pub struct CacheImagesRepository {
    scope: Arc<CacheScope>,
}

impl CacheImagesRepository {
    pub(crate) fn new(scope: Arc<CacheScope>) -> Self {
        Self { scope }
    }

    /// Writes the record and moves its id between `feed_images` sets when
    /// the binding changed.
    fn stage(&self, previous: Option<&Image>, image: &Image) -> Result<()> {
        let member = image.image_id.as_str();
        let old_feed = previous.and_then(|p| p.feed_id);

        if old_feed != image.feed_id {
            if let Some(old) = old_feed {
                self.scope.srem(CacheKeys::feed_images(old), member.clone());
            }
            if let Some(new) = image.feed_id {
                self.scope.sadd(CacheKeys::feed_images(new), member);
            }
        }

        self.scope.put_record(CacheKeys::image(image.image_id), image)
    }
}

#[async_trait]
impl ImagesRepository for CacheImagesRepository {
    async fn add(&self, image: &Image) -> Result<()> {
        if self.scope.exists(&CacheKeys::image(image.image_id)).await? {
            return Err(CoreError::Conflict(format!(
                "image {} already exists",
                image.image_id
            )));
        }
        self.stage(None, image)
    }

    async fn get_by_id(&self, image_id: ImageID) -> Result<Option<Image>> {
        self.scope.get_record(&CacheKeys::image(image_id)).await
    }

    async fn get_many(&self, image_ids: &[ImageID]) -> Result<Vec<Image>> {
        let keys: Vec<String> =
            image_ids.iter().map(|id| CacheKeys::image(*id)).collect();
        Ok(self
            .scope
            .get_records::<Image>(&keys)
            .await?
            .into_iter()
            .flatten()
            .collect())
    }

    async fn update(&self, images: &[Image]) -> Result<()> {
        let keys: Vec<String> =
            images.iter().map(|image| CacheKeys::image(image.image_id)).collect();
        let stored = self.scope.get_records::<Image>(&keys).await?;

        if let Some((image, _)) =
            images.iter().zip(&stored).find(|(_, stored)| stored.is_none())
        {
            return Err(CoreError::NotFound(format!(
                "image {} does not exist",
                image.image_id
            )));
        }

        for (image, previous) in images.iter().zip(&stored) {
            self.stage(previous.as_ref(), image)?;
        }
        Ok(())
    }
}
