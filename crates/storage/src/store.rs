use async_trait::async_trait;
use placard_core::ObjectRef;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Object not found: {0}")]
    NotFound(ObjectRef),
    #[error("Invalid object name '{0}'")]
    InvalidName(String),
    #[error("IO error on {object}: {source}")]
    Io {
        object: ObjectRef,
        #[source]
        source: std::io::Error,
    },
}

/// Abstraction over a bucket-addressed blob store.
/// Writes replace any existing object (last write wins).
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn read(&self, object: &ObjectRef) -> Result<Vec<u8>, StoreError>;
    async fn write(&self, object: &ObjectRef, data: Vec<u8>) -> Result<(), StoreError>;
}

#[async_trait]
impl<T: ObjectStore + ?Sized> ObjectStore for Arc<T> {
    async fn read(&self, object: &ObjectRef) -> Result<Vec<u8>, StoreError> {
        (**self).read(object).await
    }

    async fn write(&self, object: &ObjectRef, data: Vec<u8>) -> Result<(), StoreError> {
        (**self).write(object, data).await
    }
}
