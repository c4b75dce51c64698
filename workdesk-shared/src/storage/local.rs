/// Local filesystem blob store
///
/// Blobs are plain files directly under the root directory. Staged removals
/// are renamed into `<root>/.trash/`, which lives on the same filesystem, so
/// staging and restoring are single `rename` calls.
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use super::{validate_stored_name, BlobStore, StagedBlob, StorageError, StorageResult};

const TRASH_DIR: &str = ".trash";

#[derive(Debug, Clone)]
pub struct LocalBlobStore {
    root: PathBuf,
}

impl LocalBlobStore {
    /// Opens a store rooted at `root`, creating the directory tree if needed
    pub async fn new(root: impl Into<PathBuf>) -> StorageResult<Self> {
        let root = root.into();
        fs::create_dir_all(root.join(TRASH_DIR)).await?;
        tracing::debug!(root = %root.display(), "Blob store ready");
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn blob_path(&self, name: &str) -> StorageResult<PathBuf> {
        validate_stored_name(name)?;
        Ok(self.root.join(name))
    }

    fn staged_path(&self, staged: &StagedBlob) -> StorageResult<PathBuf> {
        validate_stored_name(&staged.staged_key)?;
        Ok(self.root.join(TRASH_DIR).join(&staged.staged_key))
    }
}

/// Removes a partly written blob; returns whether the file is gone
async fn discard_partial(path: &Path, name: &str) -> bool {
    match fs::remove_file(path).await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(blob = %name, error = %e, "Failed to remove partly written blob");
            false
        }
    }
}

fn not_found_as<T>(err: std::io::Error, name: &str) -> StorageResult<T> {
    if err.kind() == ErrorKind::NotFound {
        Err(StorageError::NotFound(name.to_string()))
    } else {
        Err(StorageError::Io(err))
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn put(&self, name: &str, content: Bytes) -> StorageResult<()> {
        let path = self.blob_path(name)?;

        let mut file = match fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
        {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                return Err(StorageError::AlreadyExists(name.to_string()))
            }
            Err(e) => return Err(StorageError::Io(e)),
        };

        let written = async {
            file.write_all(&content).await?;
            file.sync_all().await
        }
        .await;

        if let Err(e) = written {
            drop(file);
            discard_partial(&path, name).await;
            return Err(StorageError::Io(e));
        }

        Ok(())
    }

    async fn get(&self, name: &str) -> StorageResult<Bytes> {
        let path = self.blob_path(name)?;
        match fs::read(&path).await {
            Ok(content) => Ok(Bytes::from(content)),
            Err(e) => not_found_as(e, name),
        }
    }

    async fn exists(&self, name: &str) -> StorageResult<bool> {
        let path = self.blob_path(name)?;
        match fs::metadata(&path).await {
            Ok(meta) => Ok(meta.is_file()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StorageError::Io(e)),
        }
    }

    async fn remove(&self, name: &str) -> StorageResult<()> {
        let path = self.blob_path(name)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) => not_found_as(e, name),
        }
    }

    async fn stage_removal(&self, name: &str) -> StorageResult<Option<StagedBlob>> {
        let path = self.blob_path(name)?;
        let staged = StagedBlob {
            name: name.to_string(),
            staged_key: format!("{}-{}", Uuid::new_v4().simple(), name),
        };
        let target = self.staged_path(&staged)?;

        match fs::rename(&path, &target).await {
            Ok(()) => Ok(Some(staged)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::Io(e)),
        }
    }

    async fn restore(&self, staged: &StagedBlob) -> StorageResult<()> {
        let from = self.staged_path(staged)?;
        let to = self.blob_path(&staged.name)?;
        match fs::rename(&from, &to).await {
            Ok(()) => Ok(()),
            Err(e) => not_found_as(e, &staged.name),
        }
    }

    async fn purge(&self, staged: &StagedBlob) -> StorageResult<()> {
        let path = self.staged_path(staged)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) => not_found_as(e, &staged.name),
        }
    }
}
