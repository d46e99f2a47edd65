use std::fmt::{self, Display};

use crate::ids::{FeedID, ImageID};

/// Errors produced by model constructors and state transitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    /// The image is already bound to a feed and must be unbound first.
    ImageAlreadyBound { image_id: ImageID, feed_id: FeedID },
    /// The image is not bound to any feed.
    ImageNotBound { image_id: ImageID },
    InvalidAccountId(String),
}

impl Display for ModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelError::ImageAlreadyBound { image_id, feed_id } => {
                write!(f, "image {image_id} is already bound to feed {feed_id}")
            }
            ModelError::ImageNotBound { image_id } => {
                write!(f, "image {image_id} is not bound to a feed")
            }
            ModelError::InvalidAccountId(msg) => {
                write!(f, "invalid account id: {msg}")
            }
        }
    }
}

impl std::error::Error for ModelError {}

pub type Result<T> = std::result::Result<T, ModelError>;
