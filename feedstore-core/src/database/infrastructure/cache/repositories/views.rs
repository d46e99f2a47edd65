use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use feedstore_model::{FeedID, View};
use tracing::debug;

use crate::database::infrastructure::cache::{keys::CacheKeys, scope::CacheScope};
use crate::database::ports::views::ViewsRepository;
use crate::error::{CoreError, Result};

#[derive(Clone, Debug)]
pub struct CacheViewsRepository {
    scope: Arc<CacheScope>,
}

impl CacheViewsRepository {
    pub(crate) fn new(scope: Arc<CacheScope>) -> Self {
        Self { scope }
    }
}

#[async_trait]
impl ViewsRepository for CacheViewsRepository {
    async fn batch_add(&self, views: &[View]) -> Result<u64> {
        // Validate every feed before staging anything.
        let feeds: HashSet<FeedID> = views.iter().map(|v| v.feed_id).collect();
        for feed_id in &feeds {
            if !self.scope.exists(&CacheKeys::feed(*feed_id)).await? {
                return Err(CoreError::NotFound(format!(
                    "feed {feed_id} does not exist"
                )));
            }
        }

        let mut seen = HashSet::with_capacity(views.len());
        let mut inserted = 0u64;
        for view in views {
            if !seen.insert((view.feed_id, view.account_id.clone())) {
                continue;
            }

            let key = CacheKeys::view(view.feed_id, &view.account_id);
            if self.scope.exists(&key).await? {
                continue;
            }

            self.scope.put_record(key, view)?;
            self.scope.sadd(
                CacheKeys::feed_views(view.feed_id),
                view.account_id.to_string(),
            );
            inserted += 1;
        }

        debug!("Recorded {} of {} views", inserted, views.len());
        Ok(inserted)
    }
}
