//! Core data model definitions shared across feedstore crates.
//!
//! Entities here are plain value records. Viewer-relative fields on [`Feed`]
//! (`likes_count`, `views_count`, `has_followed`, `has_liked`) are projections
//! filled in by the storage layer at read time and are never persisted.
#![allow(missing_docs)]

pub mod error;
pub mod feed;
pub mod ids;
pub mod image;
pub mod pagination;
pub mod social;

pub use error::{ModelError, Result as ModelResult};
pub use feed::Feed;
pub use ids::{AccountId, FeedID, ImageID};
pub use image::{Image, ImageSlot};
pub use pagination::{MAX_PAGE_LIMIT, Page, Pagination};
pub use social::{AccountInfoCounts, Follower, Like, View};
