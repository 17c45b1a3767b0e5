use async_trait::async_trait;
use placard_core::ObjectRef;
use std::path::{Component, Path, PathBuf};

use crate::store::{ObjectStore, StoreError};

/// Suffix of the hidden file a write is staged in before it is renamed into place.
pub const PARTIAL_SUFFIX: &str = ".part";

/// Stores each bucket as a directory under `root`.
/// Layout: `<root>/<bucket>/<name>`
///
/// Writes land in `.<file>.part` next to the target and are renamed over it,
/// so readers only ever see complete objects.
pub struct LocalObjectStore {
    root: PathBuf,
}

impl LocalObjectStore {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn bucket_dir(&self, bucket: &str) -> PathBuf {
        self.root.join(bucket)
    }

    /// Map an object to its path, refusing names that would escape the bucket.
    pub fn object_path(&self, object: &ObjectRef) -> Result<PathBuf, StoreError> {
        for part in [&object.bucket, &object.name] {
            let rel = Path::new(part.as_str());
            let normal = !part.is_empty()
                && rel.components().all(|c| matches!(c, Component::Normal(_)));
            if !normal {
                return Err(StoreError::InvalidName(part.clone()));
            }
        }
        Ok(self.root.join(&object.bucket).join(&object.name))
    }

    /// Inverse of [`object_path`](Self::object_path) for paths inside the root.
    /// Staging files of in-flight writes are not objects.
    pub fn object_for_path(&self, path: &Path) -> Option<ObjectRef> {
        if is_partial(path) {
            return None;
        }
        let rel = path.strip_prefix(&self.root).ok()?;
        let mut parts = rel.components();
        let bucket = parts.next()?.as_os_str().to_str()?.to_string();
        let name = parts.as_path().to_str()?.to_string();
        if name.is_empty() {
            return None;
        }
        Some(ObjectRef::new(bucket, name))
    }
}

fn partial_path(path: &Path) -> PathBuf {
    let file_name = path.file_name().unwrap_or_default().to_string_lossy();
    path.with_file_name(format!(".{file_name}{PARTIAL_SUFFIX}"))
}

fn is_partial(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with('.') && n.ends_with(PARTIAL_SUFFIX))
}

#[async_trait]
impl ObjectStore for LocalObjectStore {
    async fn read(&self, object: &ObjectRef) -> Result<Vec<u8>, StoreError> {
        let path = self.object_path(object)?;
        tokio::fs::read(&path).await.map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => StoreError::NotFound(object.clone()),
            _ => StoreError::Io { object: object.clone(), source: e },
        })
    }

    async fn write(&self, object: &ObjectRef, data: Vec<u8>) -> Result<(), StoreError> {
        let path = self.object_path(object)?;
        let io_err = |source: std::io::Error| StoreError::Io { object: object.clone(), source };
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(io_err)?;
        }
        let staging = partial_path(&path);
        tokio::fs::write(&staging, data).await.map_err(io_err)?;
        tokio::fs::rename(&staging, &path).await.map_err(io_err)?;
        tracing::debug!("Wrote {} ({})", object, path.display());
        Ok(())
    }
}
