//! Local filesystem implementation of `BaseMediaStore`.
//!
//! Every upload gets its own random directory, so two attachments with the
//! same file name never collide: `<root>/<uuid v4>/<file name>`. The storage
//! reference is the path relative to the root, which is also the path under
//! which the media is served publicly.

use anyhow::Result;
use async_trait::async_trait;
use bytes::Bytes;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;
use tokio::fs;
use uuid::Uuid;

use crate::kernel::BaseMediaStore;

#[derive(Debug, Error)]
pub enum MediaStoreError {
    #[error("invalid file name '{0}'")]
    InvalidFileName(String),

    #[error("invalid storage reference '{0}'")]
    InvalidReference(String),

    #[error("media I/O failed for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub struct LocalMediaStore {
    root: PathBuf,
}

impl LocalMediaStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map a storage reference to a path under the root, refusing anything
    /// that could escape it.
    pub fn resolve(&self, storage_ref: &str) -> Result<PathBuf, MediaStoreError> {
        let relative = Path::new(storage_ref);
        let safe = !storage_ref.is_empty()
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !safe {
            return Err(MediaStoreError::InvalidReference(storage_ref.to_string()));
        }
        Ok(self.root.join(relative))
    }

    async fn write(&self, path: &Path, data: &[u8]) -> Result<(), MediaStoreError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|source| MediaStoreError::Io {
                    path: parent.to_path_buf(),
                    source,
                })?;
        }
        fs::write(path, data).await.map_err(|source| MediaStoreError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Keep only the final path segment and drop characters that are awkward in
/// URLs and file systems.
fn sanitize_file_name(file_name: &str) -> Result<String, MediaStoreError> {
    let base = file_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default();
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
    let cleaned = cleaned.trim_start_matches('.').to_string();
    if cleaned.is_empty() {
        return Err(MediaStoreError::InvalidFileName(file_name.to_string()));
    }
    Ok(cleaned)
}

#[async_trait]
impl BaseMediaStore for LocalMediaStore {
    async fn save(&self, file_name: &str, data: Bytes) -> Result<String> {
        let name = sanitize_file_name(file_name)?;
        let storage_ref = format!("{}/{}", Uuid::new_v4(), name);
        let path = self.resolve(&storage_ref)?;

        self.write(&path, &data).await?;
        tracing::debug!(storage_ref = %storage_ref, bytes = data.len(), "Stored attachment");
        Ok(storage_ref)
    }

    async fn read(&self, storage_ref: &str) -> Result<Bytes> {
        let path = self.resolve(storage_ref)?;
        let data = fs::read(&path)
            .await
            .map_err(|source| MediaStoreError::Io { path, source })?;
        Ok(Bytes::from(data))
    }

    async fn save_derived(&self, source_ref: &str, extension: &str, data: Bytes) -> Result<String> {
        let source = Path::new(source_ref);
        let derived = source.with_extension(extension);
        let derived_ref = derived
            .to_str()
            .ok_or_else(|| MediaStoreError::InvalidReference(source_ref.to_string()))?
            .replace('\\', "/");
        let path = self.resolve(&derived_ref)?;

        self.write(&path, &data).await?;
        Ok(derived_ref)
    }

    async fn delete(&self, storage_ref: &str) -> Result<()> {
        let path = self.resolve(storage_ref)?;
        match fs::remove_file(&path).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(source) => return Err(MediaStoreError::Io { path, source }.into()),
        }
        // Upload directories hold a single object; drop the directory once empty.
        if let Some(parent) = path.parent().filter(|p| *p != self.root.as_path()) {
            let _ = fs::remove_dir(parent).await;
        }
        tracing::debug!(storage_ref = %storage_ref, "Deleted media");
        Ok(())
    }
}
