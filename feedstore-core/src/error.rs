use feedstore_model::ModelError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    /// The entity already exists, or a uniqueness constraint rejected a
    /// concurrent duplicate.
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// The acting account does not own the resource.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// A domain invariant would be broken by the requested change.
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    /// The unit of work was used outside of its entered state.
    #[error("Unit of work state error: {0}")]
    ScopeState(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Cache error: {0}")]
    Cache(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    pub fn is_conflict(&self) -> bool {
        matches!(self, CoreError::Conflict(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, CoreError::NotFound(_))
    }

    pub fn is_forbidden(&self) -> bool {
        matches!(self, CoreError::Forbidden(_))
    }
}

impl From<ModelError> for CoreError {
    fn from(err: ModelError) -> Self {
        CoreError::InvariantViolation(err.to_string())
    }
}

#[cfg(feature = "postgres")]
pub(crate) mod pg {
    use super::CoreError;

    const UNIQUE_VIOLATION: &str = "23505";
    const FOREIGN_KEY_VIOLATION: &str = "23503";

    /// Classifies an sqlx failure: unique violations become `Conflict`,
    /// foreign key violations `NotFound`, anything else `Database`.
    pub(crate) fn classify(context: &str, err: sqlx::Error) -> CoreError {
        let code = err
            .as_database_error()
            .and_then(|db| db.code().map(|c| c.into_owned()));

        match code.as_deref() {
            Some(UNIQUE_VIOLATION) => {
                CoreError::Conflict(format!("{context}: {err}"))
            }
            Some(FOREIGN_KEY_VIOLATION) => {
                CoreError::NotFound(format!("{context}: {err}"))
            }
            _ => CoreError::Database(format!("{context}: {err}")),
        }
    }

    pub(crate) fn db_error(
        context: &'static str,
    ) -> impl FnOnce(sqlx::Error) -> CoreError {
        move |err| classify(context, err)
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;
    use feedstore_model::{FeedID, ImageID};

    #[test]
    fn model_errors_surface_as_invariant_violations() {
        let err: CoreError = ModelError::ImageAlreadyBound {
            image_id: ImageID::new(),
            feed_id: FeedID::new(),
        }
        .into();
        assert!(matches!(err, CoreError::InvariantViolation(_)));
        assert!(!err.is_conflict());
    }

    #[cfg(feature = "postgres")]
    #[test]
    fn non_database_sqlx_errors_stay_generic() {
        let err = pg::classify("Failed to load feed", sqlx::Error::RowNotFound);
        assert!(matches!(err, CoreError::Database(msg) if msg.starts_with("Failed to load feed")));
    }
}
