use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Serialize, de::DeserializeOwned};

use super::store::{KeyValueStore, WriteBatch, WriteOp};
use crate::error::Result;

#[derive(Default)]
struct Staging {
    /// `None` marks a staged delete.
    values: HashMap<String, Option<Vec<u8>>>,
    added: HashMap<String, BTreeSet<String>>,
    removed: HashMap<String, BTreeSet<String>>,
    /// Keys deleted in this scope; their stored members are hidden.
    cleared: HashSet<String>,
    batch: WriteBatch,
}

/// Write buffer of one cache-backed unit of work.
///
/// Writes are staged locally and only reach the store as one atomic batch on
/// commit. Reads overlay the staged writes on top of the store, so a scope
/// sees its own uncommitted changes. Other scopes do not.
pub struct CacheScope {
    store: Arc<dyn KeyValueStore>,
    staging: Mutex<Staging>,
}

impl fmt::Debug for CacheScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheScope")
            .field("store", &self.store)
            .field("staged_ops", &self.staging.lock().batch.len())
            .finish()
    }
}

impl CacheScope {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            staging: Mutex::new(Staging::default()),
        }
    }

    pub(crate) fn store(&self) -> &Arc<dyn KeyValueStore> {
        &self.store
    }

    pub async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        if let Some(staged) = self.staging.lock().values.get(key) {
            return Ok(staged.clone());
        }
        self.store.get(key).await
    }

    pub async fn mget(&self, keys: &[String]) -> Result<Vec<Option<Vec<u8>>>> {
        let mut out: Vec<Option<Option<Vec<u8>>>> = {
            let staging = self.staging.lock();
            keys.iter().map(|k| staging.values.get(k).cloned()).collect()
        };

        let pending: Vec<String> = keys
            .iter()
            .zip(&out)
            .filter(|(_, staged)| staged.is_none())
            .map(|(key, _)| key.clone())
            .collect();

        if !pending.is_empty() {
            let mut fetched = self.store.mget(&pending).await?.into_iter();
            for slot in out.iter_mut().filter(|slot| slot.is_none()) {
                *slot = Some(fetched.next().flatten());
            }
        }

        Ok(out.into_iter().map(Option::flatten).collect())
    }

    pub async fn exists(&self, key: &str) -> Result<bool> {
        Ok(self.get(key).await?.is_some())
    }

    /// Members of `key` with the staged additions and removals applied.
    pub async fn smembers(&self, key: &str) -> Result<BTreeSet<String>> {
        let cleared = self.staging.lock().cleared.contains(key);
        let mut members: BTreeSet<String> = if cleared {
            BTreeSet::new()
        } else {
            self.store.smembers(key).await?.into_iter().collect()
        };

        let staging = self.staging.lock();
        if let Some(removed) = staging.removed.get(key) {
            members.retain(|m| !removed.contains(m));
        }
        if let Some(added) = staging.added.get(key) {
            members.extend(added.iter().cloned());
        }
        Ok(members)
    }

    pub fn set(&self, key: String, value: Vec<u8>) {
        let mut staging = self.staging.lock();
        staging.values.insert(key.clone(), Some(value.clone()));
        staging.batch.push(WriteOp::Set { key, value });
    }

    pub fn delete(&self, key: String) {
        let mut staging = self.staging.lock();
        staging.values.insert(key.clone(), None);
        staging.added.remove(&key);
        staging.removed.remove(&key);
        staging.cleared.insert(key.clone());
        staging.batch.push(WriteOp::Delete { key });
    }

    pub fn sadd(&self, key: String, member: String) {
        let mut staging = self.staging.lock();
        if let Some(removed) = staging.removed.get_mut(&key) {
            removed.remove(&member);
        }
        staging
            .added
            .entry(key.clone())
            .or_default()
            .insert(member.clone());
        staging.batch.push(WriteOp::SetAdd { key, member });
    }

    pub fn srem(&self, key: String, member: String) {
        let mut staging = self.staging.lock();
        if let Some(added) = staging.added.get_mut(&key) {
            added.remove(&member);
        }
        staging
            .removed
            .entry(key.clone())
            .or_default()
            .insert(member.clone());
        staging.batch.push(WriteOp::SetRemove { key, member });
    }

    pub async fn get_record<T: DeserializeOwned>(
        &self,
        key: &str,
    ) -> Result<Option<T>> {
        match self.get(key).await? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    pub async fn get_records<T: DeserializeOwned>(
        &self,
        keys: &[String],
    ) -> Result<Vec<Option<T>>> {
        self.mget(keys)
            .await?
            .into_iter()
            .map(|bytes| match bytes {
                Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
                None => Ok(None),
            })
            .collect()
    }

    pub fn put_record<T: Serialize>(&self, key: String, value: &T) -> Result<()> {
        let bytes = serde_json::to_vec(value)?;
        self.set(key, bytes);
        Ok(())
    }

    /// Hands the staged writes over for commit and resets the overlay.
    pub fn take_batch(&self) -> WriteBatch {
        let mut staging = self.staging.lock();
        std::mem::take(&mut *staging).batch
    }

    pub fn discard(&self) -> usize {
        let mut staging = self.staging.lock();
        std::mem::take(&mut *staging).batch.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::infrastructure::cache::memory::MemoryStore;

    fn scope_over(store: &MemoryStore) -> CacheScope {
        CacheScope::new(Arc::new(store.clone()))
    }

    #[tokio::test]
    async fn staged_writes_are_visible_only_inside_the_scope() {
        let store = MemoryStore::new();
        let scope = scope_over(&store);

        scope.set("k".into(), b"v".to_vec());
        scope.sadd("s".into(), "a".into());

        assert_eq!(scope.get("k").await.unwrap(), Some(b"v".to_vec()));
        assert!(scope.smembers("s").await.unwrap().contains("a"));
        assert_eq!(store.get("k").await.unwrap(), None);

        store.apply(scope.take_batch()).await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), Some(b"v".to_vec()));
    }

    #[tokio::test]
    async fn overlay_merges_with_stored_members() {
        let store = MemoryStore::new();
        let mut seed = WriteBatch::new();
        for member in ["a", "b"] {
            seed.push(WriteOp::SetAdd {
                key: "s".into(),
                member: member.into(),
            });
        }
        seed.push(WriteOp::Set {
            key: "k1".into(),
            value: b"stored".to_vec(),
        });
        store.apply(seed).await.unwrap();

        let scope = scope_over(&store);
        scope.srem("s".into(), "a".into());
        scope.sadd("s".into(), "c".into());
        scope.set("k2".into(), b"staged".to_vec());

        let members: Vec<_> =
            scope.smembers("s").await.unwrap().into_iter().collect();
        assert_eq!(members, vec!["b".to_string(), "c".to_string()]);

        let values = scope
            .mget(&["k1".into(), "k2".into(), "k3".into()])
            .await
            .unwrap();
        assert_eq!(
            values,
            vec![Some(b"stored".to_vec()), Some(b"staged".to_vec()), None]
        );
    }

    #[tokio::test]
    async fn delete_hides_stored_members_and_discard_drops_everything() {
        let store = MemoryStore::new();
        let mut seed = WriteBatch::new();
        seed.push(WriteOp::SetAdd {
            key: "s".into(),
            member: "a".into(),
        });
        store.apply(seed).await.unwrap();

        let scope = scope_over(&store);
        scope.delete("s".into());
        assert!(scope.smembers("s").await.unwrap().is_empty());

        assert_eq!(scope.discard(), 1);
        assert_eq!(scope.smembers("s").await.unwrap().len(), 1);
    }
}
