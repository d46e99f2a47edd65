use std::sync::Arc;

use feedstore_model::View;
use tracing::instrument;

use super::requests::ViewFeeds;
use crate::database::unit_of_work::{UnitOfWorkFactory, scoped};
use crate::error::Result;

#[derive(Clone, Debug)]
pub struct ViewService {
    uow: Arc<dyn UnitOfWorkFactory>,
}

impl ViewService {
    pub fn new(uow: Arc<dyn UnitOfWorkFactory>) -> Self {
        Self { uow }
    }

    /// Marks every feed in the request as seen by the account. Returns the
    /// number of views that were not recorded before.
    #[instrument(skip(self, request), fields(account = %request.account_id, feeds = request.feed_ids.len()))]
    pub async fn view_feeds(&self, request: ViewFeeds) -> Result<u64> {
        let views: Vec<View> = request
            .feed_ids
            .iter()
            .map(|feed_id| View::new(*feed_id, request.account_id.clone()))
            .collect();

        scoped(self.uow.create(), move |uow| {
            Box::pin(async move { uow.views()?.batch_add(&views).await })
        })
        .await
    }
}
