use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;

use super::store::{KeyValueStore, WriteBatch, WriteOp};
use crate::error::Result;

#[derive(Default)]
struct MemoryState {
    values: HashMap<String, Vec<u8>>,
    sets: HashMap<String, BTreeSet<String>>,
}

/// Process-local [`KeyValueStore`].
///
/// Clones share the same data. A batch is applied under one write lock, so
/// readers never observe half of it.
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<RwLock<MemoryState>>,
}

impl fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.read();
        f.debug_struct("MemoryStore")
            .field("values", &state.values.len())
            .field("sets", &state.sets.len())
            .finish()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of plain values currently stored.
    pub fn len(&self) -> usize {
        self.state.read().values.len()
    }

    pub fn is_empty(&self) -> bool {
        let state = self.state.read();
        state.values.is_empty() && state.sets.is_empty()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.state.read().values.get(key).cloned())
    }

    async fn mget(&self, keys: &[String]) -> Result<Vec<Option<Vec<u8>>>> {
        let state = self.state.read();
        Ok(keys.iter().map(|k| state.values.get(k).cloned()).collect())
    }

    async fn smembers(&self, key: &str) -> Result<Vec<String>> {
        Ok(self
            .state
            .read()
            .sets
            .get(key)
            .map(|members| members.iter().cloned().collect())
            .unwrap_or_default())
    }

    async fn apply(&self, batch: WriteBatch) -> Result<()> {
        let mut state = self.state.write();
        for op in batch.into_ops() {
            match op {
                WriteOp::Set { key, value } => {
                    state.values.insert(key, value);
                }
                WriteOp::Delete { key } => {
                    state.values.remove(&key);
                    state.sets.remove(&key);
                }
                WriteOp::SetAdd { key, member } => {
                    state.sets.entry(key).or_default().insert(member);
                }
                WriteOp::SetRemove { key, member } => {
                    if let Some(members) = state.sets.get_mut(&key) {
                        members.remove(&member);
                        if members.is_empty() {
                            state.sets.remove(&key);
                        }
                    }
                }
            }
        }
        Ok(())
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn batch_applies_in_order() {
        let store = MemoryStore::new();
        let mut batch = WriteBatch::new();
        batch.push(WriteOp::Set {
            key: "a".into(),
            value: b"1".to_vec(),
        });
        batch.push(WriteOp::SetAdd {
            key: "s".into(),
            member: "x".into(),
        });
        batch.push(WriteOp::SetAdd {
            key: "s".into(),
            member: "y".into(),
        });
        batch.push(WriteOp::SetRemove {
            key: "s".into(),
            member: "x".into(),
        });
        store.apply(batch).await.unwrap();

        assert_eq!(store.get("a").await.unwrap(), Some(b"1".to_vec()));
        assert_eq!(store.smembers("s").await.unwrap(), vec!["y".to_string()]);
        assert_eq!(
            store.mget(&["a".into(), "missing".into()]).await.unwrap(),
            vec![Some(b"1".to_vec()), None]
        );
    }

    #[tokio::test]
    async fn delete_clears_values_and_sets() {
        let store = MemoryStore::new();
        let mut batch = WriteBatch::new();
        batch.push(WriteOp::SetAdd {
            key: "s".into(),
            member: "x".into(),
        });
        batch.push(WriteOp::Delete { key: "s".into() });
        store.apply(batch).await.unwrap();

        assert!(store.smembers("s").await.unwrap().is_empty());
        assert!(store.is_empty());
    }
}
