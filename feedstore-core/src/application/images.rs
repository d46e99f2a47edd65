use std::sync::Arc;

use feedstore_model::{Image, ImageID};
use tracing::{info, instrument};

use super::requests::RegisterImage;
use crate::database::unit_of_work::{UnitOfWorkFactory, scoped};
use crate::error::{CoreError, Result};

#[derive(Clone, Debug)]
pub struct ImageService {
    uow: Arc<dyn UnitOfWorkFactory>,
}

impl ImageService {
    pub fn new(uow: Arc<dyn UnitOfWorkFactory>) -> Self {
        Self { uow }
    }

    /// Records an uploaded image as unbound. Fails with `Conflict` when the
    /// id is already taken.
    #[instrument(skip(self, request), fields(uploader = %request.uploader))]
    pub async fn register_image(&self, request: RegisterImage) -> Result<Image> {
        let mut image =
            Image::new(request.uploader, request.url, request.blurhash);
        if let Some(image_id) = request.image_id {
            image.image_id = image_id;
        }

        scoped(self.uow.create(), move |uow| {
            Box::pin(async move {
                uow.images()?.add(&image).await?;
                info!("Registered image {}", image.image_id);
                Ok::<_, CoreError>(image)
            })
        })
        .await
    }

    #[instrument(skip(self))]
    pub async fn get_image(&self, image_id: ImageID) -> Result<Option<Image>> {
        scoped(self.uow.create(), move |uow| {
            Box::pin(async move { uow.images()?.get_by_id(image_id).await })
        })
        .await
    }
}
