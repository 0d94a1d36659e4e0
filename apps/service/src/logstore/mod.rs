/// Append-only per-check result logs and their archives
pub mod file;

pub use file::FileLogStore;

use async_trait::async_trait;

use crate::error::LogStoreError;

#[async_trait]
pub trait LogStore: Send + Sync {
    /// Append one line to the active log `name`, creating it if needed
    async fn append(&self, name: &str, line: &str) -> Result<(), LogStoreError>;

    /// Active logs holding content that has not been archived yet
    async fn list_unrotated(&self) -> Result<Vec<String>, LogStoreError>;

    /// Compress the active content of `name` into a new archive and return its
    /// id, or `None` when there was nothing to archive
    async fn archive(&self, name: &str) -> Result<Option<String>, LogStoreError>;

    /// Truncate the active log `name`
    async fn reset(&self, name: &str) -> Result<(), LogStoreError>;

    /// Archive then reset `name`.
    ///
    /// Implementations shared with concurrent writers must override this so
    /// that no append can land between the two steps.
    async fn rotate(&self, name: &str) -> Result<Option<String>, LogStoreError> {
        let archived = self.archive(name).await?;
        if archived.is_some() {
            self.reset(name).await?;
        }
        Ok(archived)
    }
}
