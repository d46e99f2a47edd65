use std::sync::Arc;

use anyhow::Result;
use feedstore_core::database::{DatabaseContext, MemoryStore, UnitOfWorkFactory};

mod support;

fn memory_factory() -> Arc<dyn UnitOfWorkFactory> {
    DatabaseContext::from_store(Arc::new(MemoryStore::new())).unit_of_work_factory()
}

#[tokio::test]
async fn rollback_discards_staged_writes() -> Result<()> {
    support::rollback_discards_staged_writes(memory_factory()).await
}

#[tokio::test]
async fn failed_work_is_rolled_back() -> Result<()> {
    support::failed_work_is_rolled_back(memory_factory()).await
}

#[tokio::test]
async fn scope_lifecycle_is_enforced() -> Result<()> {
    support::scope_lifecycle_is_enforced(memory_factory()).await
}

#[tokio::test]
async fn image_update_rejects_unknown_ids() -> Result<()> {
    support::image_update_rejects_unknown_ids(memory_factory()).await
}

#[tokio::test]
async fn get_many_skips_missing_ids() -> Result<()> {
    support::get_many_skips_missing_ids(memory_factory()).await
}

#[tokio::test]
async fn committed_writes_reach_the_shared_store() -> Result<()> {
    let store = Arc::new(MemoryStore::new());
    let factory = DatabaseContext::from_store(store.clone()).unit_of_work_factory();
    assert!(store.is_empty());

    let services = support::services(factory);
    let alice = support::account("alice");
    support::upload(&services, &alice).await?;
    assert_eq!(store.len(), 1);

    // A staged write that fails leaves the store untouched.
    support::post(&services, &alice, "bad", &[feedstore_model::ImageID::new()])
        .await
        .expect_err("unknown image");
    assert_eq!(store.len(), 1);
    Ok(())
}
