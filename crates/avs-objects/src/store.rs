//! Object store trait and the local filesystem backend

use crate::error::ObjectResult;
use crate::path::ObjectPath;
use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

/// Fallback content type
pub const OCTET_STREAM: &str = "application/octet-stream";

/// Object bytes with their content type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub content_type: String,
    pub data: Bytes,
}

impl StoredObject {
    /// Create object
    #[inline]
    #[must_use]
    pub fn new(content_type: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            content_type: content_type.into(),
            data: data.into(),
        }
    }

    /// Size in bytes
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Blob storage addressed by [`ObjectPath`]
#[async_trait]
pub trait ObjectStore: Send + Sync + std::fmt::Debug {
    /// Write (or replace) an object
    async fn put(&self, path: &ObjectPath, object: StoredObject) -> ObjectResult<()>;

    /// Read an object
    async fn get(&self, path: &ObjectPath) -> ObjectResult<Option<StoredObject>>;

    /// Check whether an object exists
    async fn exists(&self, path: &ObjectPath) -> ObjectResult<bool>;
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Metadata {
    content_type: String,
}

/// Objects as files below a root directory
///
/// Bytes live under `<root>/data/<key>`, content types in a JSON sidecar
/// under `<root>/meta/<key>.json`.
#[derive(Debug, Clone)]
pub struct LocalObjectStore {
    root: PathBuf,
}

impl LocalObjectStore {
    /// Create a store rooted at `root` (created lazily)
    #[inline]
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root directory
    #[inline]
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn data_path(&self, path: &ObjectPath) -> PathBuf {
        path.to_fs_path(&self.root.join("data"))
    }

    fn meta_path(&self, path: &ObjectPath) -> PathBuf {
        let mut file = path.to_fs_path(&self.root.join("meta"));
        file.as_mut_os_string().push(".json");
        file
    }
}

/// Missing file, or a key that lands on or below something that is not one
pub(crate) fn is_missing(err: &std::io::Error) -> bool {
    matches!(
        err.kind(),
        ErrorKind::NotFound | ErrorKind::IsADirectory | ErrorKind::NotADirectory
    )
}

async fn write_file(file: &Path, contents: &[u8]) -> ObjectResult<()> {
    if let Some(parent) = file.parent() {
        fs::create_dir_all(parent).await?;
    }
    fs::write(file, contents).await?;
    Ok(())
}

#[async_trait]
impl ObjectStore for LocalObjectStore {
    async fn put(&self, path: &ObjectPath, object: StoredObject) -> ObjectResult<()> {
        let meta = serde_json::to_vec(&Metadata {
            content_type: object.content_type,
        })?;
        write_file(&self.data_path(path), &object.data).await?;
        write_file(&self.meta_path(path), &meta).await?;
        debug!(object = %path, bytes = object.data.len(), "Stored object");
        Ok(())
    }

    async fn get(&self, path: &ObjectPath) -> ObjectResult<Option<StoredObject>> {
        let data = match fs::read(self.data_path(path)).await {
            Ok(data) => data,
            Err(err) if is_missing(&err) => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        let content_type = match fs::read(self.meta_path(path)).await {
            Ok(raw) => serde_json::from_slice::<Metadata>(&raw)?.content_type,
            Err(err) if is_missing(&err) => OCTET_STREAM.to_string(),
            Err(err) => return Err(err.into()),
        };
        Ok(Some(StoredObject::new(content_type, data)))
    }

    async fn exists(&self, path: &ObjectPath) -> ObjectResult<bool> {
        match fs::metadata(self.data_path(path)).await {
            Ok(meta) => Ok(meta.is_file()),
            Err(err) if is_missing(&err) => Ok(false),
            Err(err) => Err(err.into()),
        }
    }
}
