/// Attachment blob storage
///
/// Blobs live under a single storage root and are addressed only by their
/// system-generated stored name. Every name that reaches a [`BlobStore`] is
/// checked by [`validate_stored_name`] first, so nothing outside the root can
/// be named.
///
/// Deletion is two-phase so the service layer can keep blobs and metadata
/// consistent across a database transaction:
///
/// ```text
/// stage_removal(name) ── commit ok ──▶ purge(staged)
///        │
///        └──────────── commit failed ─▶ restore(staged)
/// ```

pub mod local;

use async_trait::async_trait;
use bytes::Bytes;

pub use local::LocalBlobStore;

/// Error type for blob storage
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Name could escape the storage root or contains disallowed characters
    #[error("Invalid stored name: {0}")]
    InvalidName(String),

    /// No blob under that name
    #[error("Blob not found: {0}")]
    NotFound(String),

    /// A blob with that name already exists
    #[error("Blob already exists: {0}")]
    AlreadyExists(String),

    /// Underlying filesystem error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// A blob moved aside pending the outcome of a transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedBlob {
    /// Name the blob had before staging
    pub name: String,

    /// Opaque location of the staged copy
    pub staged_key: String,
}

/// Storage backend for attachment bytes
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Writes a new blob; never overwrites an existing one
    async fn put(&self, name: &str, content: Bytes) -> StorageResult<()>;

    /// Reads a whole blob
    async fn get(&self, name: &str) -> StorageResult<Bytes>;

    async fn exists(&self, name: &str) -> StorageResult<bool>;

    /// Removes a blob immediately
    async fn remove(&self, name: &str) -> StorageResult<()>;

    /// Moves a blob aside so it can be restored or purged later
    ///
    /// Returns `None` when there was no blob under that name.
    async fn stage_removal(&self, name: &str) -> StorageResult<Option<StagedBlob>>;

    /// Puts a staged blob back under its original name
    async fn restore(&self, staged: &StagedBlob) -> StorageResult<()>;

    /// Permanently deletes a staged blob
    async fn purge(&self, staged: &StagedBlob) -> StorageResult<()>;
}

/// Checks that a stored name stays inside the storage root
///
/// Accepts only non-empty names made of `[A-Za-z0-9._-]` that are not `.`
/// or `..` and contain no `..` sequence.
pub fn validate_stored_name(name: &str) -> StorageResult<()> {
    let valid = !name.is_empty()
        && name != "."
        && !name.contains("..")
        && !name.starts_with('.')
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'));

    if valid {
        Ok(())
    } else {
        Err(StorageError::InvalidName(name.to_string()))
    }
}
