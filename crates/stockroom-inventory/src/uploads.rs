//! Item image uploads.
//!
//! An [`ImageStore`] is chosen once at startup: [`LocalImageStore`] writes
//! under a directory served at `/uploads/`, [`BucketImageStore`] writes into
//! an object-storage bucket and records its public URL. [`Uploads`] wraps the
//! chosen store with the file-type filter and key generation shared by both.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;

use stockroom_core::{StorageBackend, WritePrecondition};

use crate::error::{InventoryError, Result};

/// Content types accepted for item images.
pub const ALLOWED_IMAGE_TYPES: [&str; 2] = ["image/png", "image/jpeg"];

/// Message recorded when a file is rejected by type.
pub const REJECTED_TYPE_MESSAGE: &str = "Only .png and .jpeg images are allowed";

/// URL prefix under which locally stored uploads are served.
pub const LOCAL_URL_PREFIX: &str = "/uploads/";

/// A file received with a form submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    /// Client-supplied file name.
    pub file_name: String,
    /// Client-supplied content type.
    pub content_type: String,
    /// File body.
    pub data: Bytes,
}

/// Destination for accepted images.
#[async_trait]
pub trait ImageStore: Send + Sync + 'static {
    /// Stores `file` under `key` and returns the path to record on the item.
    async fn store(&self, key: &str, file: &UploadedFile) -> Result<String>;

    /// Removes the object stored under `key`. Missing objects are not an error.
    async fn remove(&self, key: &str) -> Result<()>;

    /// Human-readable description for logs.
    fn describe(&self) -> String;
}

/// Writes images into a local directory.
#[derive(Debug, Clone)]
pub struct LocalImageStore {
    dir: PathBuf,
}

impl LocalImageStore {
    /// Creates a store rooted at `dir`. The directory is created on first write.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait]
impl ImageStore for LocalImageStore {
    async fn store(&self, key: &str, file: &UploadedFile) -> Result<String> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| io_error(&self.dir, &e))?;
        let target = self.dir.join(key);
        tokio::fs::write(&target, &file.data)
            .await
            .map_err(|e| io_error(&target, &e))?;
        Ok(format!("{LOCAL_URL_PREFIX}{key}"))
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let target = self.dir.join(key);
        match tokio::fs::remove_file(&target).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(io_error(&target, &e)),
        }
    }

    fn describe(&self) -> String {
        format!("local:{}", self.dir.display())
    }
}

fn io_error(path: &std::path::Path, err: &std::io::Error) -> InventoryError {
    InventoryError::Storage {
        message: format!("upload I/O failed at {}: {err}", path.display()),
    }
}

/// Writes images into an object-storage bucket.
pub struct BucketImageStore {
    backend: Arc<dyn StorageBackend>,
    public_url: String,
}

impl BucketImageStore {
    /// Creates a store over `backend`, publishing objects under `public_url`.
    #[must_use]
    pub fn new(backend: Arc<dyn StorageBackend>, public_url: impl Into<String>) -> Self {
        let mut public_url = public_url.into();
        if !public_url.ends_with('/') {
            public_url.push('/');
        }
        Self {
            backend,
            public_url,
        }
    }
}

impl std::fmt::Debug for BucketImageStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BucketImageStore")
            .field("public_url", &self.public_url)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl ImageStore for BucketImageStore {
    async fn store(&self, key: &str, file: &UploadedFile) -> Result<String> {
        self.backend
            .put(key, file.data.clone(), WritePrecondition::None)
            .await?;
        Ok(format!("{}{key}", self.public_url))
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.backend.delete(key).await?;
        Ok(())
    }

    fn describe(&self) -> String {
        format!("bucket:{}", self.public_url)
    }
}

/// An image written by [`Uploads::save`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredImage {
    /// Generated object key.
    pub key: String,
    /// Path or URL recorded on the item.
    pub path: String,
}

/// Upload adapter: type filter plus collision-resistant naming over an
/// [`ImageStore`].
#[derive(Clone)]
pub struct Uploads {
    store: Arc<dyn ImageStore>,
}

impl std::fmt::Debug for Uploads {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Uploads")
            .field("store", &self.store.describe())
            .finish()
    }
}

impl Uploads {
    /// Wraps an image store.
    #[must_use]
    pub fn new(store: Arc<dyn ImageStore>) -> Self {
        Self { store }
    }

    /// Local-disk uploads under `dir`.
    #[must_use]
    pub fn local(dir: impl Into<PathBuf>) -> Self {
        Self::new(Arc::new(LocalImageStore::new(dir)))
    }

    /// Bucket uploads published under `public_url`.
    #[must_use]
    pub fn bucket(backend: Arc<dyn StorageBackend>, public_url: impl Into<String>) -> Self {
        Self::new(Arc::new(BucketImageStore::new(backend, public_url)))
    }

    /// Description of the underlying store.
    #[must_use]
    pub fn describe(&self) -> String {
        self.store.describe()
    }

    /// Checks the file type.
    ///
    /// # Errors
    ///
    /// Returns the user-facing rejection message for disallowed types.
    pub fn screen(file: &UploadedFile) -> std::result::Result<(), &'static str> {
        if is_allowed_image(&file.content_type) {
            Ok(())
        } else {
            Err(REJECTED_TYPE_MESSAGE)
        }
    }

    /// Stores an accepted file under a generated name.
    ///
    /// # Errors
    ///
    /// Returns an error if the store write fails.
    pub async fn save(&self, file: &UploadedFile) -> Result<StoredImage> {
        let key = generate_key(&file.file_name);
        let path = self.store.store(&key, file).await?;
        tracing::info!(key = %key, path = %path, bytes = file.data.len(), "stored upload");
        Ok(StoredImage { key, path })
    }

    /// Removes an image saved by [`Uploads::save`].
    ///
    /// # Errors
    ///
    /// Returns an error if the store delete fails.
    pub async fn discard(&self, image: &StoredImage) -> Result<()> {
        self.store.remove(&image.key).await?;
        tracing::info!(key = %image.key, "discarded upload");
        Ok(())
    }
}

/// Returns true if `content_type` is PNG or JPEG. Parameters are ignored.
#[must_use]
pub fn is_allowed_image(content_type: &str) -> bool {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    ALLOWED_IMAGE_TYPES.contains(&essence.as_str())
}

fn generate_key(file_name: &str) -> String {
    let millis = chrono::Utc::now().timestamp_millis();
    let suffix: u32 = rand::random();
    format!("{millis}-{suffix}-{}", sanitize_file_name(file_name))
}

fn sanitize_file_name(file_name: &str) -> String {
    let base = file_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim();
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "image".to_string()
    } else {
        cleaned.to_string()
    }
}
