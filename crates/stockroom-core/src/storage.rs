//! Storage backend abstraction for object storage (local disk, S3, memory).
//!
//! Stockroom keeps both its documents and its uploaded images in object
//! storage. This module defines the contract every backend implements:
//! - Conditional create (`DoesNotExist`) so identifiers are never silently reused
//! - Object metadata including `last_modified` and a version token
//! - Directory-style prefix listing
//!
//! Prefixes passed to [`StorageBackend::list`] are directory prefixes
//! (`categories/`), not arbitrary string prefixes.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use object_store::aws::AmazonS3Builder;
use object_store::local::LocalFileSystem;
use object_store::memory::InMemory;
use object_store::path::Path as StorePath;
use object_store::{ObjectStore, PutMode, PutOptions};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::error::{Error, Result};

/// Precondition for writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WritePrecondition {
    /// Write only if object does not exist.
    DoesNotExist,
    /// Write unconditionally.
    None,
}

/// Result of a conditional write.
#[derive(Debug, Clone)]
pub enum WriteResult {
    /// Write succeeded, returns new version token.
    Success {
        /// The new version token after the write.
        version: String,
    },
    /// Precondition failed, returns current version token.
    PreconditionFailed {
        /// The current version that caused the precondition to fail.
        current_version: String,
    },
}

/// Metadata about a stored object.
#[derive(Debug, Clone)]
pub struct ObjectMeta {
    /// Object path (key).
    pub path: String,
    /// Object size in bytes.
    pub size: u64,
    /// Opaque object version token.
    pub version: String,
    /// Last modification timestamp.
    pub last_modified: Option<DateTime<Utc>>,
    /// Entity tag for cache validation.
    pub etag: Option<String>,
}

/// Storage backend trait for object storage.
///
/// All storage backends (local filesystem, S3, memory) implement this trait.
#[async_trait]
pub trait StorageBackend: Send + Sync + 'static {
    /// Reads entire object.
    ///
    /// Returns `Error::NotFound` if object doesn't exist.
    async fn get(&self, path: &str) -> Result<Bytes>;

    /// Writes with optional precondition.
    ///
    /// Returns `WriteResult::PreconditionFailed` if precondition not met.
    /// Never returns error for precondition failure - that's a normal result.
    async fn put(
        &self,
        path: &str,
        data: Bytes,
        precondition: WritePrecondition,
    ) -> Result<WriteResult>;

    /// Deletes an object.
    ///
    /// Succeeds even if object doesn't exist (idempotent).
    async fn delete(&self, path: &str) -> Result<()>;

    /// Lists objects under the given directory prefix.
    ///
    /// Returns empty vec if no objects match.
    ///
    /// **Ordering**: Results are returned in arbitrary order that may vary between
    /// backends and invocations. Callers requiring deterministic order should sort
    /// the results.
    async fn list(&self, prefix: &str) -> Result<Vec<ObjectMeta>>;

    /// Gets object metadata without reading content.
    ///
    /// Returns `None` if object doesn't exist.
    async fn head(&self, path: &str) -> Result<Option<ObjectMeta>>;
}

/// In-memory storage backend for testing and debug runs.
///
/// Thread-safe via `RwLock`. Not suitable for production.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    objects: Arc<RwLock<HashMap<String, StoredObject>>>,
}

#[derive(Debug, Clone)]
struct StoredObject {
    data: Bytes,
    version: i64,
    last_modified: DateTime<Utc>,
}

impl StoredObject {
    fn meta(&self, path: &str) -> ObjectMeta {
        ObjectMeta {
            path: path.to_string(),
            size: self.data.len() as u64,
            version: self.version.to_string(),
            last_modified: Some(self.last_modified),
            etag: Some(format!("\"{}\"", self.version)),
        }
    }
}

impl MemoryBackend {
    /// Creates a new empty memory backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned() -> Error {
    Error::Internal {
        message: "lock poisoned".into(),
    }
}

#[async_trait]
impl StorageBackend for MemoryBackend {
    async fn get(&self, path: &str) -> Result<Bytes> {
        let objects = self.objects.read().map_err(|_| poisoned())?;

        objects
            .get(path)
            .map(|o| o.data.clone())
            .ok_or_else(|| Error::NotFound(format!("object not found: {path}")))
    }

    async fn put(
        &self,
        path: &str,
        data: Bytes,
        precondition: WritePrecondition,
    ) -> Result<WriteResult> {
        let mut objects = self.objects.write().map_err(|_| poisoned())?;

        let current = objects.get(path);
        if precondition == WritePrecondition::DoesNotExist {
            if let Some(obj) = current {
                return Ok(WriteResult::PreconditionFailed {
                    current_version: obj.version.to_string(),
                });
            }
        }

        let new_version = current.map_or(1, |o| o.version + 1);
        objects.insert(
            path.to_string(),
            StoredObject {
                data,
                version: new_version,
                last_modified: Utc::now(),
            },
        );
        drop(objects);

        Ok(WriteResult::Success {
            version: new_version.to_string(),
        })
    }

    async fn delete(&self, path: &str) -> Result<()> {
        self.objects.write().map_err(|_| poisoned())?.remove(path);
        Ok(())
    }

    async fn list(&self, prefix: &str) -> Result<Vec<ObjectMeta>> {
        let objects = self.objects.read().map_err(|_| poisoned())?;

        Ok(objects
            .iter()
            .filter(|(k, _)| k.starts_with(prefix))
            .map(|(path, obj)| obj.meta(path))
            .collect())
    }

    async fn head(&self, path: &str) -> Result<Option<ObjectMeta>> {
        let objects = self.objects.read().map_err(|_| poisoned())?;
        Ok(objects.get(path).map(|obj| obj.meta(path)))
    }
}

/// Storage backend over any [`object_store::ObjectStore`].
///
/// Used with a local directory for the document store and with an S3 bucket
/// for remote image uploads.
#[derive(Clone)]
pub struct ObjectStoreBackend {
    store: Arc<dyn ObjectStore>,
    description: String,
}

impl std::fmt::Debug for ObjectStoreBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectStoreBackend")
            .field("store", &self.description)
            .finish()
    }
}

impl ObjectStoreBackend {
    /// Wraps an existing object store.
    #[must_use]
    pub fn new(store: Arc<dyn ObjectStore>, description: impl Into<String>) -> Self {
        Self {
            store,
            description: description.into(),
        }
    }

    /// Creates a backend rooted at a local directory, creating it if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created or opened.
    pub fn local(root: impl AsRef<std::path::Path>) -> Result<Self> {
        let root = root.as_ref();
        std::fs::create_dir_all(root).map_err(|e| {
            Error::storage_with_source(format!("failed to create {}", root.display()), e)
        })?;
        let store = LocalFileSystem::new_with_prefix(root).map_err(|e| {
            Error::storage_with_source(format!("failed to open {}", root.display()), e)
        })?;
        Ok(Self::new(Arc::new(store), format!("file://{}", root.display())))
    }

    /// Creates a backend for an S3 bucket.
    ///
    /// Credentials are read from the standard `AWS_*` environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if the S3 client cannot be configured.
    pub fn s3(bucket: &str, region: &str) -> Result<Self> {
        let store = AmazonS3Builder::from_env()
            .with_bucket_name(bucket)
            .with_region(region)
            .build()
            .map_err(|e| Error::storage_with_source(format!("failed to configure s3://{bucket}"), e))?;
        Ok(Self::new(Arc::new(store), format!("s3://{bucket}")))
    }

    /// Creates a backend over the `object_store` in-memory implementation.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemory::new()), "memory://")
    }

    fn convert_meta(meta: object_store::ObjectMeta) -> ObjectMeta {
        let version = meta
            .version
            .clone()
            .or_else(|| meta.e_tag.clone())
            .unwrap_or_else(|| meta.last_modified.timestamp_micros().to_string());
        ObjectMeta {
            path: meta.location.to_string(),
            size: u64::try_from(meta.size).unwrap_or(u64::MAX),
            version,
            last_modified: Some(meta.last_modified),
            etag: meta.e_tag,
        }
    }

    fn map_error(&self, path: &str, err: object_store::Error) -> Error {
        match err {
            object_store::Error::NotFound { .. } => {
                Error::NotFound(format!("object not found: {path}"))
            }
            other => Error::storage_with_source(
                format!("{} operation on {path} failed", self.description),
                other,
            ),
        }
    }
}

#[async_trait]
impl StorageBackend for ObjectStoreBackend {
    async fn get(&self, path: &str) -> Result<Bytes> {
        let location = StorePath::from(path);
        let result = self
            .store
            .get(&location)
            .await
            .map_err(|e| self.map_error(path, e))?;
        result.bytes().await.map_err(|e| self.map_error(path, e))
    }

    async fn put(
        &self,
        path: &str,
        data: Bytes,
        precondition: WritePrecondition,
    ) -> Result<WriteResult> {
        let location = StorePath::from(path);
        let mode = match precondition {
            WritePrecondition::DoesNotExist => PutMode::Create,
            WritePrecondition::None => PutMode::Overwrite,
        };

        match self
            .store
            .put_opts(&location, data.into(), PutOptions::from(mode))
            .await
        {
            Ok(result) => Ok(WriteResult::Success {
                version: result.version.or(result.e_tag).unwrap_or_default(),
            }),
            Err(object_store::Error::AlreadyExists { .. } | object_store::Error::Precondition { .. }) => {
                let current_version = self
                    .head(path)
                    .await?
                    .map(|meta| meta.version)
                    .unwrap_or_default();
                Ok(WriteResult::PreconditionFailed { current_version })
            }
            Err(e) => Err(self.map_error(path, e)),
        }
    }

    async fn delete(&self, path: &str) -> Result<()> {
        let location = StorePath::from(path);
        match self.store.delete(&location).await {
            Ok(()) | Err(object_store::Error::NotFound { .. }) => Ok(()),
            Err(e) => Err(self.map_error(path, e)),
        }
    }

    async fn list(&self, prefix: &str) -> Result<Vec<ObjectMeta>> {
        let prefix_path = StorePath::from(prefix);
        let prefix_ref = if prefix.trim_matches('/').is_empty() {
            None
        } else {
            Some(&prefix_path)
        };

        let metas: Vec<object_store::ObjectMeta> = self
            .store
            .list(prefix_ref)
            .try_collect()
            .await
            .map_err(|e| self.map_error(prefix, e))?;

        Ok(metas.into_iter().map(Self::convert_meta).collect())
    }

    async fn head(&self, path: &str) -> Result<Option<ObjectMeta>> {
        let location = StorePath::from(path);
        match self.store.head(&location).await {
            Ok(meta) => Ok(Some(Self::convert_meta(meta))),
            Err(object_store::Error::NotFound { .. }) => Ok(None),
            Err(e) => Err(self.map_error(path, e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn exercise_backend(backend: &dyn StorageBackend) {
        let result = backend
            .put(
                "docs/a.json",
                Bytes::from("{\"a\":1}"),
                WritePrecondition::DoesNotExist,
            )
            .await
            .expect("put should succeed");
        assert!(matches!(result, WriteResult::Success { .. }));

        let result = backend
            .put(
                "docs/a.json",
                Bytes::from("{\"a\":2}"),
                WritePrecondition::DoesNotExist,
            )
            .await
            .expect("put should succeed");
        assert!(matches!(result, WriteResult::PreconditionFailed { .. }));

        backend
            .put("docs/b.json", Bytes::from("{}"), WritePrecondition::None)
            .await
            .expect("put should succeed");
        backend
            .put("other/c.json", Bytes::from("{}"), WritePrecondition::None)
            .await
            .expect("put should succeed");

        let stored = backend.get("docs/a.json").await.expect("get");
        assert_eq!(stored, Bytes::from("{\"a\":1}"));

        let mut listed: Vec<String> = backend
            .list("docs/")
            .await
            .expect("list")
            .into_iter()
            .map(|meta| meta.path)
            .collect();
        listed.sort();
        assert_eq!(listed, vec!["docs/a.json", "docs/b.json"]);

        let meta = backend
            .head("docs/b.json")
            .await
            .expect("head")
            .expect("object should exist");
        assert_eq!(meta.size, 2);
        assert!(meta.last_modified.is_some());

        backend.delete("docs/b.json").await.expect("delete");
        backend.delete("docs/b.json").await.expect("delete is idempotent");
        assert!(backend.head("docs/b.json").await.expect("head").is_none());
        assert!(matches!(
            backend.get("docs/b.json").await,
            Err(Error::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn memory_backend_contract() {
        exercise_backend(&MemoryBackend::new()).await;
    }

    #[tokio::test]
    async fn object_store_in_memory_contract() {
        exercise_backend(&ObjectStoreBackend::in_memory()).await;
    }

    #[tokio::test]
    async fn object_store_local_contract() {
        let dir = tempfile::tempdir().expect("tempdir");
        let backend = ObjectStoreBackend::local(dir.path().join("store")).expect("local backend");
        exercise_backend(&backend).await;
        assert!(dir.path().join("store/docs/a.json").exists());
    }

    #[tokio::test]
    async fn memory_versions_increase() {
        let backend = MemoryBackend::new();
        backend
            .put("v.txt", Bytes::from("1"), WritePrecondition::None)
            .await
            .unwrap();
        let result = backend
            .put("v.txt", Bytes::from("2"), WritePrecondition::None)
            .await
            .unwrap();
        assert!(matches!(result, WriteResult::Success { ref version } if version == "2"));
    }

    #[tokio::test]
    async fn list_on_empty_prefix_is_empty() {
        let backend = ObjectStoreBackend::in_memory();
        assert!(backend.list("categories/").await.unwrap().is_empty());
    }
}
