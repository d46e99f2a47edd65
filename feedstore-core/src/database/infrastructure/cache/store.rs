use std::fmt;

use async_trait::async_trait;

use crate::error::Result;

/// A single mutation inside a [`WriteBatch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOp {
    Set { key: String, value: Vec<u8> },
    Delete { key: String },
    SetAdd { key: String, member: String },
    SetRemove { key: String, member: String },
}

/// Ordered list of mutations applied atomically by
/// [`KeyValueStore::apply`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteBatch {
    ops: Vec<WriteOp>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, op: WriteOp) {
        self.ops.push(op);
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn ops(&self) -> &[WriteOp] {
        &self.ops
    }

    pub fn into_ops(self) -> Vec<WriteOp> {
        self.ops
    }
}

/// Minimal key-value contract the cache-backed repositories run on.
///
/// Values are opaque byte blobs; sets hold string members. Implementations
/// must apply a [`WriteBatch`] all-or-nothing.
#[async_trait]
pub trait KeyValueStore: Send + Sync + fmt::Debug {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// One entry per requested key, `None` for missing keys.
    async fn mget(&self, keys: &[String]) -> Result<Vec<Option<Vec<u8>>>>;

    async fn smembers(&self, key: &str) -> Result<Vec<String>>;

    async fn apply(&self, batch: WriteBatch) -> Result<()>;

    async fn ping(&self) -> Result<()>;
}
