use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use rand::Rng;
use serde_json::Value;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use super::{Collection, Storage, check_id};
use crate::error::StoreError;
use crate::locks::KeyedLocks;

const EXTENSION: &str = "json";

/// JSON documents laid out as `<root>/<collection>/<id>.json`
///
/// Writes to one record are serialized through a per-record lock, so an
/// update cannot bring back a record deleted through the same store. Writers
/// in other processes are not covered.
#[derive(Debug)]
pub struct FileStore {
    root: PathBuf,
    locks: KeyedLocks,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into(), locks: KeyedLocks::default() }
    }

    fn lock_key(collection: Collection, id: &str) -> String {
        format!("{}/{id}", collection.as_str())
    }

    fn collection_dir(&self, collection: Collection) -> PathBuf {
        self.root.join(collection.as_str())
    }

    fn record_path(&self, collection: Collection, id: &str) -> Result<PathBuf, StoreError> {
        check_id(id)?;
        Ok(self.collection_dir(collection).join(format!("{id}.{EXTENSION}")))
    }

    fn not_found(collection: Collection, id: &str) -> StoreError {
        StoreError::NotFound { collection: collection.as_str(), id: id.to_string() }
    }

    /// Write through a temp file so readers never observe a half-written record
    async fn write_atomic(path: &Path, record: &Value) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec(record)?;
        let suffix: u32 = rand::thread_rng().r#gen();
        let tmp = path.with_extension(format!("{EXTENSION}.{suffix:08x}.tmp"));

        fs::write(&tmp, &bytes).await?;
        if let Err(e) = fs::rename(&tmp, path).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(e.into());
        }
        Ok(())
    }
}

#[async_trait]
impl Storage for FileStore {
    async fn read(&self, collection: Collection, id: &str) -> Result<Value, StoreError> {
        let path = self.record_path(collection, id)?;
        let bytes = match fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Err(Self::not_found(collection, id)),
            Err(e) => return Err(e.into()),
        };
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn update(&self, collection: Collection, id: &str, record: &Value) -> Result<(), StoreError> {
        let path = self.record_path(collection, id)?;
        self.locks
            .with(&Self::lock_key(collection, id), async {
                if !fs::try_exists(&path).await? {
                    return Err(Self::not_found(collection, id));
                }
                Self::write_atomic(&path, record).await
            })
            .await
    }

    async fn list(&self, collection: Collection) -> Result<Vec<String>, StoreError> {
        let dir = self.collection_dir(collection);
        let mut entries = match fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("Collection directory {} does not exist yet", dir.display());
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        };

        let mut ids = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == EXTENSION) {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    ids.push(stem.to_string());
                }
            }
        }
        Ok(ids)
    }

    async fn create(&self, collection: Collection, id: &str, record: &Value) -> Result<(), StoreError> {
        let path = self.record_path(collection, id)?;
        let bytes = serde_json::to_vec(record)?;
        fs::create_dir_all(self.collection_dir(collection)).await?;

        self.locks
            .with(&Self::lock_key(collection, id), async {
                let mut file = match fs::OpenOptions::new().write(true).create_new(true).open(&path).await {
                    Ok(file) => file,
                    Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                        return Err(StoreError::AlreadyExists {
                            collection: collection.as_str(),
                            id: id.to_string(),
                        });
                    }
                    Err(e) => return Err(e.into()),
                };
                file.write_all(&bytes).await?;
                file.flush().await?;
                Ok::<_, StoreError>(())
            })
            .await
    }

    async fn delete(&self, collection: Collection, id: &str) -> Result<(), StoreError> {
        let path = self.record_path(collection, id)?;
        self.locks
            .with(&Self::lock_key(collection, id), async {
                match fs::remove_file(&path).await {
                    Ok(()) => Ok(()),
                    Err(e) if e.kind() == ErrorKind::NotFound => Err(Self::not_found(collection, id)),
                    Err(e) => Err(e.into()),
                }
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Arc;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_crud_round() {
        let dir = tempdir().unwrap();
        let store = FileStore::new(dir.path());

        assert!(store.list(Collection::Checks).await.unwrap().is_empty());

        store.create(Collection::Checks, "abc", &json!({ "state": "up" })).await.unwrap();
        assert!(matches!(
            store.create(Collection::Checks, "abc", &json!({})).await,
            Err(StoreError::AlreadyExists { .. })
        ));

        store.update(Collection::Checks, "abc", &json!({ "state": "down" })).await.unwrap();
        assert_eq!(store.read(Collection::Checks, "abc").await.unwrap()["state"], "down");
        assert_eq!(store.list(Collection::Checks).await.unwrap(), vec!["abc".to_string()]);
        assert!(store.list(Collection::Users).await.unwrap().is_empty());

        store.delete(Collection::Checks, "abc").await.unwrap();
        assert!(matches!(
            store.read(Collection::Checks, "abc").await,
            Err(StoreError::NotFound { collection: "checks", .. })
        ));
    }

    #[tokio::test]
    async fn test_update_requires_existing_record() {
        let dir = tempdir().unwrap();
        let store = FileStore::new(dir.path());

        let result = store.update(Collection::Checks, "missing", &json!({})).await;
        assert!(matches!(result, Err(StoreError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_ids_cannot_escape_the_root() {
        let dir = tempdir().unwrap();
        let store = FileStore::new(dir.path());

        for id in ["../etc/passwd", "a/b", "", "."] {
            assert!(matches!(store.read(Collection::Users, id).await, Err(StoreError::InvalidId(_))));
        }
    }

    #[tokio::test]
    async fn test_corrupt_record_is_a_serialization_error() {
        let dir = tempdir().unwrap();
        let store = FileStore::new(dir.path());
        std::fs::create_dir_all(dir.path().join("checks")).unwrap();
        std::fs::write(dir.path().join("checks/bad.json"), b"{not json").unwrap();

        assert!(matches!(
            store.read(Collection::Checks, "bad").await,
            Err(StoreError::Serialization(_))
        ));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_update_racing_delete_never_resurrects() {
        let dir = tempdir().unwrap();
        let store = Arc::new(FileStore::new(dir.path()));

        for round in 0..25 {
            let id = format!("rec{round}");
            store.create(Collection::Checks, &id, &json!({ "state": "up" })).await.unwrap();

            let updater = {
                let (store, id) = (Arc::clone(&store), id.clone());
                tokio::spawn(async move { store.update(Collection::Checks, &id, &json!({ "state": "down" })).await })
            };
            let deleter = {
                let (store, id) = (Arc::clone(&store), id.clone());
                tokio::spawn(async move { store.delete(Collection::Checks, &id).await })
            };

            let updated = updater.await.unwrap();
            deleter.await.unwrap().unwrap();
            assert!(matches!(updated, Ok(()) | Err(StoreError::NotFound { .. })));
            assert!(matches!(
                store.read(Collection::Checks, &id).await,
                Err(StoreError::NotFound { .. })
            ));
        }
        assert_eq!(store.locks.len().await, 0);
    }
}
