//! Command and query handlers. Each call runs in exactly one unit of work.

pub mod feeds;
pub mod followers;
pub mod images;
pub mod likes;
pub mod requests;
pub mod views;

use std::sync::Arc;

pub use feeds::FeedService;
pub use followers::FollowerService;
pub use images::ImageService;
pub use likes::LikeService;
pub use views::ViewService;

use crate::database::unit_of_work::UnitOfWorkFactory;

/// All services wired to one unit-of-work factory.
#[derive(Clone, Debug)]
pub struct Services {
    pub feeds: FeedService,
    pub images: ImageService,
    pub followers: FollowerService,
    pub likes: LikeService,
    pub views: ViewService,
}

impl Services {
    pub fn new(uow: Arc<dyn UnitOfWorkFactory>) -> Self {
        Self {
            feeds: FeedService::new(Arc::clone(&uow)),
            images: ImageService::new(Arc::clone(&uow)),
            followers: FollowerService::new(Arc::clone(&uow)),
            likes: LikeService::new(Arc::clone(&uow)),
            views: ViewService::new(uow),
        }
    }
}
