use async_trait::async_trait;
use placard_core::ObjectRef;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::RwLock;

use crate::store::{ObjectStore, StoreError};

/// In-process store — used for tests and for wiring the pipeline without a
/// filesystem.
#[derive(Default)]
pub struct MemoryObjectStore {
    objects: RwLock<HashMap<ObjectRef, Vec<u8>>>,
    writes: AtomicUsize,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an object without counting it as a pipeline write.
    pub async fn seed(&self, object: ObjectRef, data: Vec<u8>) {
        self.objects.write().await.insert(object, data);
    }

    pub async fn get(&self, object: &ObjectRef) -> Option<Vec<u8>> {
        self.objects.read().await.get(object).cloned()
    }

    /// Object names in `bucket`, sorted.
    pub async fn names_in(&self, bucket: &str) -> Vec<String> {
        let mut names: Vec<String> = self
            .objects
            .read()
            .await
            .keys()
            .filter(|o| o.bucket == bucket)
            .map(|o| o.name.clone())
            .collect();
        names.sort();
        names
    }

    /// Number of `write` calls made through the [`ObjectStore`] interface.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn read(&self, object: &ObjectRef) -> Result<Vec<u8>, StoreError> {
        self.get(object)
            .await
            .ok_or_else(|| StoreError::NotFound(object.clone()))
    }

    async fn write(&self, object: &ObjectRef, data: Vec<u8>) -> Result<(), StoreError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.objects.write().await.insert(object.clone(), data);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn seed_is_not_a_write() {
        let store = MemoryObjectStore::new();
        store.seed(ObjectRef::new("intake", "a.png"), vec![1, 2]).await;
        assert_eq!(store.write_count(), 0);
        assert_eq!(store.read(&ObjectRef::new("intake", "a.png")).await.unwrap(), vec![1, 2]);
    }

    #[tokio::test]
    async fn writes_are_counted_and_listed() {
        let store = MemoryObjectStore::new();
        store.write(&ObjectRef::new("b", "z"), vec![]).await.unwrap();
        store.write(&ObjectRef::new("b", "a"), vec![]).await.unwrap();
        store.write(&ObjectRef::new("other", "m"), vec![]).await.unwrap();
        assert_eq!(store.write_count(), 3);
        assert_eq!(store.names_in("b").await, vec!["a".to_string(), "z".to_string()]);
    }

    #[tokio::test]
    async fn read_missing_is_not_found() {
        let store = MemoryObjectStore::new();
        assert!(matches!(
            store.read(&ObjectRef::new("b", "x")).await,
            Err(StoreError::NotFound(_))
        ));
    }
}
