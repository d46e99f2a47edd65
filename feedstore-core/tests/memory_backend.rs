use std::sync::Arc;

use anyhow::Result;
use feedstore_core::application::Services;
use feedstore_core::database::{DatabaseContext, MemoryStore};

mod support;

fn memory_services() -> Services {
    let ctx = DatabaseContext::from_store(Arc::new(MemoryStore::new()));
    support::services(ctx.unit_of_work_factory())
}

#[tokio::test]
async fn post_feed_binds_images_in_order() -> Result<()> {
    support::post_feed_binds_images_in_order(&memory_services()).await
}

#[tokio::test]
async fn update_feed_rebinds_images() -> Result<()> {
    support::update_feed_rebinds_images(&memory_services()).await
}

#[tokio::test]
async fn only_the_author_may_change_a_feed() -> Result<()> {
    support::only_the_author_may_change_a_feed(&memory_services()).await
}

#[tokio::test]
async fn failed_post_leaves_no_trace() -> Result<()> {
    support::failed_post_leaves_no_trace(&memory_services()).await
}

#[tokio::test]
async fn delete_feed_cascades() -> Result<()> {
    support::delete_feed_cascades(&memory_services()).await
}

#[tokio::test]
async fn follow_is_idempotent() -> Result<()> {
    support::follow_is_idempotent(&memory_services()).await
}

#[tokio::test]
async fn account_info_counts_edges_and_feeds() -> Result<()> {
    support::account_info_counts_edges_and_feeds(&memory_services()).await
}

#[tokio::test]
async fn viewer_flags_follow_the_viewer() -> Result<()> {
    support::viewer_flags_follow_the_viewer(&memory_services()).await
}

#[tokio::test]
async fn like_and_unlike_are_idempotent() -> Result<()> {
    support::like_and_unlike_are_idempotent(&memory_services()).await
}

#[tokio::test]
async fn views_count_distinct_accounts() -> Result<()> {
    support::views_count_distinct_accounts(&memory_services()).await
}

#[tokio::test]
async fn pages_partition_account_feeds() -> Result<()> {
    support::pages_partition_account_feeds(&memory_services()).await
}

#[tokio::test]
async fn get_feeds_keeps_request_order() -> Result<()> {
    support::get_feeds_keeps_request_order(&memory_services()).await
}

#[tokio::test]
async fn duplicate_image_id_conflicts() -> Result<()> {
    support::duplicate_image_id_conflicts(&memory_services()).await
}

#[tokio::test]
async fn update_feed_keeps_retained_image_order() -> Result<()> {
    support::update_feed_keeps_retained_image_order(&memory_services()).await
}

#[tokio::test]
async fn follow_edges_with_colons_stay_distinct() -> Result<()> {
    support::follow_edges_with_colons_stay_distinct(&memory_services()).await
}

#[tokio::test]
async fn follower_pages_are_newest_first() -> Result<()> {
    support::follower_pages_are_newest_first(&memory_services()).await
}

#[tokio::test]
async fn like_pages_are_newest_first() -> Result<()> {
    support::like_pages_are_newest_first(&memory_services()).await
}
