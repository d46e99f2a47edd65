use uuid::Uuid;

use crate::error::ModelError;

/// Strongly typed ID for feeds
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Copy)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct FeedID(pub Uuid);

impl Default for FeedID {
    fn default() -> Self {
        Self::new()
    }
}

impl FeedID {
    pub fn new() -> Self {
        FeedID(Uuid::now_v7())
    }

    pub fn as_str(&self) -> String {
        self.0.to_string()
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    pub fn to_uuid(&self) -> Uuid {
        self.0
    }
}

impl AsRef<Uuid> for FeedID {
    fn as_ref(&self) -> &Uuid {
        &self.0
    }
}

impl From<Uuid> for FeedID {
    fn from(value: Uuid) -> Self {
        FeedID(value)
    }
}

impl std::fmt::Display for FeedID {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Strongly typed ID for uploaded images
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Copy)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct ImageID(pub Uuid);

impl Default for ImageID {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageID {
    pub fn new() -> Self {
        ImageID(Uuid::now_v7())
    }

    pub fn as_str(&self) -> String {
        self.0.to_string()
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    pub fn to_uuid(&self) -> Uuid {
        self.0
    }
}

impl AsRef<Uuid> for ImageID {
    fn as_ref(&self) -> &Uuid {
        &self.0
    }
}

impl From<Uuid> for ImageID {
    fn from(value: Uuid) -> Self {
        ImageID(value)
    }
}

impl std::fmt::Display for ImageID {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque account identifier issued by the identity provider.
///
/// Accounts are owned by an external service, so the id is kept as the raw
/// subject string rather than parsed into a UUID.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "String", into = "String"))]
pub struct AccountId(String);

impl AccountId {
    /// Maximum length accepted by the `VARCHAR(255)` account columns.
    pub const MAX_LEN: usize = 255;

    pub fn new(id: impl Into<String>) -> Result<Self, ModelError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(ModelError::InvalidAccountId(
                "account id cannot be empty".to_string(),
            ));
        }
        if id.len() > Self::MAX_LEN {
            return Err(ModelError::InvalidAccountId(format!(
                "account id exceeds {} bytes",
                Self::MAX_LEN
            )));
        }
        Ok(AccountId(id))
    }

    /// Wrap a value already validated by storage (rows read back from a store).
    pub fn from_trusted(id: String) -> Self {
        AccountId(id)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl AsRef<str> for AccountId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for AccountId {
    type Error = ModelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        AccountId::new(value)
    }
}

impl From<AccountId> for String {
    fn from(value: AccountId) -> Self {
        value.0
    }
}

impl std::fmt::Display for AccountId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
