use async_trait::async_trait;
use feedstore_model::{Image, ImageID};

use crate::error::Result;

/// Repository port for uploaded image records.
///
/// Binding rules are enforced by the caller through
/// [`Image::bind_to_feed`] and [`Image::unbind_from_feed`]; this port stores
/// whatever state it is handed.
#[async_trait]
pub trait ImagesRepository: Send + Sync {
    async fn add(&self, image: &Image) -> Result<()>;

    async fn get_by_id(&self, image_id: ImageID) -> Result<Option<Image>>;

    /// Returns the images that exist, in request order.
    async fn get_many(&self, image_ids: &[ImageID]) -> Result<Vec<Image>>;

    /// Writes the mutable fields of every image. Fails with `NotFound` naming
    /// the first id that has no stored record.
    async fn update(&self, images: &[Image]) -> Result<()>;
}
